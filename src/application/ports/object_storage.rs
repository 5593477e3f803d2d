//! Object Storage Port - 对象存储抽象
//!
//! 用于暂存待识别音频、读取识别结果、保存合成音频

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::domain::ObjectLocation;

/// 存储错误
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Invalid location: {0}")]
    InvalidLocation(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

/// 存储的对象
#[derive(Debug, Clone)]
pub struct StoredObject {
    pub data: Vec<u8>,
    pub content_type: String,
    pub etag: String,
}

/// Object Storage Port
#[async_trait]
pub trait ObjectStoragePort: Send + Sync {
    /// 写入对象，返回 ETag
    async fn put(
        &self,
        location: &ObjectLocation,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError>;

    async fn get(&self, location: &ObjectLocation) -> Result<StoredObject, StorageError>;

    /// 删除对象（不存在时不报错）
    async fn delete(&self, location: &ObjectLocation) -> Result<(), StorageError>;

    /// 生成带过期时间的下载 URL
    async fn presigned_get(
        &self,
        location: &ObjectLocation,
        ttl: Duration,
    ) -> Result<String, StorageError>;
}
