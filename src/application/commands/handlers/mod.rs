//! Command Handlers 实现
//!
//! 文本流水线与语音流水线的编排

mod speak_handlers;

pub use speak_handlers::*;

#[cfg(test)]
pub(crate) use speak_handlers::testing;
