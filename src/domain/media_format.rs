//! Media Format - 识别服务接受的音频格式

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaFormat {
    Wav,
    Mp3,
    Mp4,
    Flac,
    Ogg,
    Amr,
}

impl MediaFormat {
    /// 从扩展名或格式名解析，`m4a` 视为 `mp4`
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim().trim_start_matches('.').to_lowercase().as_str() {
            "wav" => Some(Self::Wav),
            "mp3" => Some(Self::Mp3),
            "mp4" | "m4a" => Some(Self::Mp4),
            "flac" => Some(Self::Flac),
            "ogg" => Some(Self::Ogg),
            "amr" => Some(Self::Amr),
            _ => None,
        }
    }

    /// 推断格式：显式格式 > 文件扩展名 > wav
    pub fn infer(explicit: Option<&str>, file_name: Option<&str>) -> Result<Self, String> {
        if let Some(format) = explicit.filter(|f| !f.trim().is_empty()) {
            return Self::from_extension(format)
                .ok_or_else(|| format!("unsupported media format: {}", format));
        }

        let ext = file_name
            .and_then(|name| name.rsplit('/').next())
            .and_then(|name| name.rsplit_once('.'))
            .map(|(_, ext)| ext);

        match ext {
            Some(ext) => Self::from_extension(ext)
                .ok_or_else(|| format!("unsupported media format: {}", ext)),
            None => Ok(Self::Wav),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Wav => "wav",
            Self::Mp3 => "mp3",
            Self::Mp4 => "mp4",
            Self::Flac => "flac",
            Self::Ogg => "ogg",
            Self::Amr => "amr",
        }
    }

    pub fn content_type(&self) -> String {
        format!("audio/{}", self.as_str())
    }
}

impl std::fmt::Display for MediaFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
