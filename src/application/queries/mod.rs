//! 应用层 - 查询（读操作）
//!
//! CQRS 查询侧：音色目录与口型映射

mod viseme_queries;
mod voice_queries;

pub mod handlers;

pub use viseme_queries::*;
pub use voice_queries::*;
