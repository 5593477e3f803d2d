//! Object Location - 对象存储位置 (bucket + key)

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectLocation {
    pub bucket: String,
    pub key: String,
}

impl ObjectLocation {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// 校验 bucket/key 非空且 key 不含 `..` 路径段
    pub fn validate(&self) -> Result<(), String> {
        if self.bucket.trim().is_empty() {
            return Err("bucket cannot be empty".to_string());
        }
        if self.key.trim().is_empty() {
            return Err("key cannot be empty".to_string());
        }
        if self.key.split('/').any(|segment| segment == "..") {
            return Err(format!("invalid object key: {}", self.key));
        }
        Ok(())
    }

    /// key 的扩展名（小写）
    pub fn extension(&self) -> Option<String> {
        let file_name = self.key.rsplit('/').next()?;
        let (_, ext) = file_name.rsplit_once('.')?;
        if ext.is_empty() {
            None
        } else {
            Some(ext.to_lowercase())
        }
    }
}

impl std::fmt::Display for ObjectLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "store://{}/{}", self.bucket, self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let loc = ObjectLocation::new("audio", "tts/abc.mp3");
        assert_eq!(loc.to_string(), "store://audio/tts/abc.mp3");
    }

    #[test]
    fn test_extension() {
        assert_eq!(
            ObjectLocation::new("b", "uploads/clip.M4A").extension(),
            Some("m4a".to_string())
        );
        assert_eq!(ObjectLocation::new("b", "uploads/noext").extension(), None);
        assert_eq!(ObjectLocation::new("b", "dir.v2/noext").extension(), None);
    }

    #[test]
    fn test_validate() {
        assert!(ObjectLocation::new("b", "a/b.wav").validate().is_ok());
        assert!(ObjectLocation::new("", "a.wav").validate().is_err());
        assert!(ObjectLocation::new("b", " ").validate().is_err());
        assert!(ObjectLocation::new("b", "../etc/passwd").validate().is_err());
    }
}
