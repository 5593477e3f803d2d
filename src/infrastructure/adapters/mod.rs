//! Infrastructure Adapters
//!
//! 六边形架构的适配器实现

pub mod fake;
pub mod http_client;
pub mod probe;
pub mod recognition;
pub mod synthesis;
pub mod translation;

pub use fake::*;
pub use http_client::{ProviderHttpClient, ProviderHttpConfig};
pub use probe::*;
pub use recognition::*;
pub use synthesis::*;
pub use translation::*;
