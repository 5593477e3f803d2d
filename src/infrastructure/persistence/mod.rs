//! Persistence Layer - 数据持久化
//!
//! Sled 对象存储与下载链接签名

pub mod sled;
pub mod url_signer;

pub use self::sled::SledObjectStorage;
pub use url_signer::{ObjectUrlSigner, SignatureError};
