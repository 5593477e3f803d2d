//! Sled-based Object Storage Implementation
//!
//! 每个对象一条 bincode 记录，key 为 `obj:{bucket}/{key}`

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use sled::Db;
use std::path::Path;
use std::time::Duration;

use crate::application::ports::{ObjectStoragePort, StorageError, StoredObject};
use crate::domain::ObjectLocation;
use crate::infrastructure::persistence::url_signer::ObjectUrlSigner;

const KEY_PREFIX: &str = "obj:";

/// 内部对象记录
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ObjectRecord {
    data: Vec<u8>,
    content_type: String,
    etag: String,
    created_at: i64,
}

/// Sled 对象存储
pub struct SledObjectStorage {
    db: Db,
    signer: ObjectUrlSigner,
}

impl SledObjectStorage {
    pub fn open<P: AsRef<Path>>(path: P, signer: ObjectUrlSigner) -> Result<Self, StorageError> {
        let db = sled::open(path.as_ref()).map_err(|e| StorageError::BackendError(e.to_string()))?;

        tracing::info!(
            db_path = %path.as_ref().display(),
            objects = db.scan_prefix(KEY_PREFIX).count(),
            "SledObjectStorage initialized"
        );

        Ok(Self { db, signer })
    }

    fn db_key(location: &ObjectLocation) -> Result<String, StorageError> {
        location
            .validate()
            .map_err(StorageError::InvalidLocation)?;
        Ok(format!("{}{}/{}", KEY_PREFIX, location.bucket, location.key))
    }
}

#[async_trait]
impl ObjectStoragePort for SledObjectStorage {
    async fn put(
        &self,
        location: &ObjectLocation,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError> {
        let key = Self::db_key(location)?;
        let etag = format!("{:x}", md5::compute(&data));
        let size = data.len();

        let record = ObjectRecord {
            data,
            content_type: content_type.to_string(),
            etag: etag.clone(),
            created_at: Utc::now().timestamp(),
        };
        let bytes = bincode::serialize(&record)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;

        self.db
            .insert(key.as_bytes(), bytes)
            .map_err(|e| StorageError::BackendError(e.to_string()))?;

        tracing::debug!(location = %location, size, etag = %etag, "Object stored");

        Ok(etag)
    }

    async fn get(&self, location: &ObjectLocation) -> Result<StoredObject, StorageError> {
        let key = Self::db_key(location)?;
        let value = self
            .db
            .get(key.as_bytes())
            .map_err(|e| StorageError::BackendError(e.to_string()))?
            .ok_or_else(|| StorageError::NotFound(location.to_string()))?;

        let record: ObjectRecord = bincode::deserialize(&value)
            .map_err(|e| StorageError::SerializationError(e.to_string()))?;

        Ok(StoredObject {
            data: record.data,
            content_type: record.content_type,
            etag: record.etag,
        })
    }

    async fn delete(&self, location: &ObjectLocation) -> Result<(), StorageError> {
        let key = Self::db_key(location)?;
        self.db
            .remove(key.as_bytes())
            .map_err(|e| StorageError::BackendError(e.to_string()))?;
        Ok(())
    }

    async fn presigned_get(
        &self,
        location: &ObjectLocation,
        ttl: Duration,
    ) -> Result<String, StorageError> {
        Self::db_key(location)?;
        Ok(self.signer.sign(location, ttl))
    }
}
