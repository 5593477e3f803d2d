//! Audio Probe Port - 音频信息探测
//!
//! 读取采样率、声道数与时长，不做转码

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Decoding error: {0}")]
    DecodingError(String),
}

/// 音频信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioInfo {
    pub sample_rate: u32,
    pub channels: u8,
    pub duration_ms: u64,
}

/// Audio Probe Port
pub trait AudioProbePort: Send + Sync {
    /// 探测音频信息
    ///
    /// `extension_hint` 为文件扩展名（如 "mp3"），可帮助格式识别
    fn probe(&self, data: &[u8], extension_hint: Option<&str>) -> Result<AudioInfo, ProbeError>;
}
