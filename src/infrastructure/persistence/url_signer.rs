//! Object URL Signer - 对象存储的限时下载链接
//!
//! URL 形如 `{base_url}/api/objects/{bucket}/{key}?expires={unix}&sig={md5}`，
//! 签名为 md5("{secret}:{bucket}/{key}:{expires}")

use chrono::Utc;
use std::time::Duration;
use thiserror::Error;

use crate::domain::ObjectLocation;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SignatureError {
    #[error("Link expired")]
    Expired,

    #[error("Signature mismatch")]
    Mismatch,
}

#[derive(Debug, Clone)]
pub struct ObjectUrlSigner {
    base_url: String,
    secret: String,
}

impl ObjectUrlSigner {
    pub fn new(base_url: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            secret: secret.into(),
        }
    }

    /// 生成有效期为 `ttl` 的下载 URL
    pub fn sign(&self, location: &ObjectLocation, ttl: Duration) -> String {
        let ttl_secs = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
        let expires = Utc::now().timestamp().saturating_add(ttl_secs);
        self.sign_until(location, expires)
    }

    /// 生成在 `expires`（unix 秒）之前有效的下载 URL
    pub fn sign_until(&self, location: &ObjectLocation, expires: i64) -> String {
        format!(
            "{}/api/objects/{}/{}?expires={}&sig={}",
            self.base_url,
            location.bucket,
            location.key,
            expires,
            self.signature(location, expires)
        )
    }

    pub fn verify(
        &self,
        location: &ObjectLocation,
        expires: i64,
        signature: &str,
    ) -> Result<(), SignatureError> {
        let expected = self.signature(location, expires);
        if !constant_time_eq(expected.as_bytes(), signature.as_bytes()) {
            return Err(SignatureError::Mismatch);
        }
        if expires < Utc::now().timestamp() {
            return Err(SignatureError::Expired);
        }
        Ok(())
    }

    fn signature(&self, location: &ObjectLocation, expires: i64) -> String {
        let payload = format!(
            "{}:{}/{}:{}",
            self.secret, location.bucket, location.key, expires
        );
        format!("{:x}", md5::compute(payload.as_bytes()))
    }
}

/// 逐字节比较，耗时与首个差异位置无关
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
