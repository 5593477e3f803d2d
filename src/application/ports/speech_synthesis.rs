//! Speech Synthesis Port - 语音合成服务抽象
//!
//! 一次合成对应两次渲染：音频 + 语音标记（逐行 JSON）

use async_trait::async_trait;

use super::provider_error::ProviderError;
use crate::domain::voice::{QualityTier, Voice};

/// 合成请求（音频与标记共用）
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesisRequest {
    pub text: String,
    pub voice_id: String,
    pub tier: QualityTier,
    pub sample_rate_hz: u32,
}

impl SynthesisRequest {
    /// 同一请求改用另一质量等级
    pub fn at_tier(&self, tier: QualityTier) -> Self {
        Self {
            tier,
            ..self.clone()
        }
    }
}

/// 合成的音频
#[derive(Debug, Clone)]
pub struct SynthesizedAudio {
    pub bytes: Vec<u8>,
    /// MIME 类型，如 audio/mpeg
    pub mime: String,
}

/// 音色目录分页
#[derive(Debug, Clone, Default)]
pub struct VoicePage {
    pub voices: Vec<Voice>,
    pub next_page_token: Option<String>,
}

/// Speech Synthesis Port
#[async_trait]
pub trait SpeechSynthesisPort: Send + Sync {
    /// 获取一页音色目录
    async fn list_voices(&self, page_token: Option<&str>) -> Result<VoicePage, ProviderError>;

    /// 渲染音频
    async fn synthesize_audio(
        &self,
        request: &SynthesisRequest,
    ) -> Result<SynthesizedAudio, ProviderError>;

    /// 渲染语音标记（viseme + word），返回逐行 JSON
    async fn synthesize_marks(&self, request: &SynthesisRequest) -> Result<String, ProviderError>;

    /// 检查服务是否可用
    async fn health_check(&self) -> bool {
        true
    }
}
