//! In-Memory Object Storage - 基于 DashMap 的对象存储
//!
//! 进程重启后数据丢失，用于测试和 `storage.backend = "memory"`

use async_trait::async_trait;
use dashmap::DashMap;
use std::time::Duration;

use crate::application::ports::{ObjectStoragePort, StorageError, StoredObject};
use crate::domain::ObjectLocation;
use crate::infrastructure::persistence::ObjectUrlSigner;

pub struct InMemoryObjectStorage {
    objects: DashMap<(String, String), StoredObject>,
    signer: ObjectUrlSigner,
}

impl InMemoryObjectStorage {
    pub fn new(signer: ObjectUrlSigner) -> Self {
        Self {
            objects: DashMap::new(),
            signer,
        }
    }

    pub fn for_tests() -> Self {
        Self::new(ObjectUrlSigner::new("http://localhost", "test-secret"))
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    fn entry_key(location: &ObjectLocation) -> Result<(String, String), StorageError> {
        location
            .validate()
            .map_err(StorageError::InvalidLocation)?;
        Ok((location.bucket.clone(), location.key.clone()))
    }
}

#[async_trait]
impl ObjectStoragePort for InMemoryObjectStorage {
    async fn put(
        &self,
        location: &ObjectLocation,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError> {
        let key = Self::entry_key(location)?;
        let etag = format!("{:x}", md5::compute(&data));
        self.objects.insert(
            key,
            StoredObject {
                data,
                content_type: content_type.to_string(),
                etag: etag.clone(),
            },
        );
        Ok(etag)
    }

    async fn get(&self, location: &ObjectLocation) -> Result<StoredObject, StorageError> {
        let key = Self::entry_key(location)?;
        self.objects
            .get(&key)
            .map(|o| o.value().clone())
            .ok_or_else(|| StorageError::NotFound(location.to_string()))
    }

    async fn delete(&self, location: &ObjectLocation) -> Result<(), StorageError> {
        let key = Self::entry_key(location)?;
        self.objects.remove(&key);
        Ok(())
    }

    async fn presigned_get(
        &self,
        location: &ObjectLocation,
        ttl: Duration,
    ) -> Result<String, StorageError> {
        Self::entry_key(location)?;
        Ok(self.signer.sign(location, ttl))
    }
}
