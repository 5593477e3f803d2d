//! HTTP Speech Synthesizer - 调用语音合成网关
//!
//! 网关 API:
//! POST /v1/speech        → 音频字节
//! POST /v1/speech-marks  → 逐行 JSON 标记
//! GET  /v1/voices?page_token=  → 分页音色目录

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::application::ports::{
    ProviderError, SpeechSynthesisPort, SynthesisRequest, SynthesizedAudio, VoicePage,
};
use crate::domain::voice::{Gender, QualityTier, Voice};
use crate::infrastructure::adapters::http_client::ProviderHttpClient;

/// 合成请求体
#[derive(Debug, Serialize)]
struct SpeechBody<'a> {
    text: &'a str,
    voice_id: &'a str,
    engine: &'a str,
    sample_rate: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    output_format: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mark_types: Option<&'a [&'a str]>,
}

#[derive(Debug, Deserialize)]
struct VoicesResponse {
    #[serde(default)]
    voices: Vec<VoiceDto>,
    #[serde(default)]
    next_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VoiceDto {
    id: String,
    #[serde(default)]
    gender: String,
    #[serde(default)]
    language_code: Option<String>,
    #[serde(default)]
    additional_language_codes: Vec<String>,
    #[serde(default)]
    supported_engines: Vec<String>,
}

impl VoiceDto {
    fn into_voice(self) -> Voice {
        let mut voice = Voice::new(self.id, Gender::parse(&self.gender));
        for language in self
            .language_code
            .into_iter()
            .chain(self.additional_language_codes)
        {
            voice = voice.with_language(language);
        }
        for tier in self
            .supported_engines
            .iter()
            .filter_map(|e| QualityTier::parse(e))
        {
            voice = voice.with_tier(tier);
        }
        voice
    }
}

const MARK_TYPES: &[&str] = &["viseme", "word"];

/// 网关使用的引擎名
fn engine_name(tier: QualityTier) -> &'static str {
    match tier {
        QualityTier::Standard => "standard",
        QualityTier::Enhanced => "neural",
    }
}

pub struct HttpSpeechSynthesizer {
    http: ProviderHttpClient,
}

impl HttpSpeechSynthesizer {
    pub fn new(http: ProviderHttpClient) -> Self {
        Self { http }
    }
}

#[async_trait]
impl SpeechSynthesisPort for HttpSpeechSynthesizer {
    async fn list_voices(&self, page_token: Option<&str>) -> Result<VoicePage, ProviderError> {
        let query: Vec<(&str, &str)> = page_token.map(|t| ("page_token", t)).into_iter().collect();
        let response: VoicesResponse = self.http.get_json("/v1/voices", &query).await?;

        tracing::debug!(
            voices = response.voices.len(),
            has_more = response.next_token.is_some(),
            "Fetched voice catalog page"
        );

        Ok(VoicePage {
            voices: response.voices.into_iter().map(VoiceDto::into_voice).collect(),
            next_page_token: response.next_token.filter(|t| !t.is_empty()),
        })
    }

    async fn synthesize_audio(
        &self,
        request: &SynthesisRequest,
    ) -> Result<SynthesizedAudio, ProviderError> {
        let body = SpeechBody {
            text: &request.text,
            voice_id: &request.voice_id,
            engine: engine_name(request.tier),
            sample_rate: request.sample_rate_hz.to_string(),
            output_format: Some("mp3"),
            mark_types: None,
        };

        let (bytes, content_type) = self.http.post_bytes("/v1/speech", &body).await?;
        if bytes.is_empty() {
            return Err(ProviderError::InvalidResponse("empty audio stream".to_string()));
        }

        tracing::debug!(
            voice_id = %request.voice_id,
            audio_size = bytes.len(),
            "Synthesis audio received"
        );

        Ok(SynthesizedAudio {
            bytes,
            mime: content_type.unwrap_or_else(|| "audio/mpeg".to_string()),
        })
    }

    async fn synthesize_marks(&self, request: &SynthesisRequest) -> Result<String, ProviderError> {
        let body = SpeechBody {
            text: &request.text,
            voice_id: &request.voice_id,
            engine: engine_name(request.tier),
            sample_rate: request.sample_rate_hz.to_string(),
            output_format: Some("json"),
            mark_types: Some(MARK_TYPES),
        };

        let (bytes, _) = self.http.post_bytes("/v1/speech-marks", &body).await?;
        String::from_utf8(bytes).map_err(|e| ProviderError::InvalidResponse(e.to_string()))
    }

    async fn health_check(&self) -> bool {
        self.http.health("/health").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_voice_dto_conversion() {
        let json = r#"{
            "voices": [{
                "id": "Joanna",
                "gender": "Female",
                "language_code": "en-US",
                "additional_language_codes": ["en-GB"],
                "supported_engines": ["standard", "neural", "long-form"]
            }],
            "next_token": ""
        }"#;
        let response: VoicesResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.next_token.as_deref(), Some(""));

        let voice = response.voices.into_iter().next().unwrap().into_voice();
        assert_eq!(voice.id, "Joanna");
        assert_eq!(voice.gender, Gender::Female);
        assert!(voice.speaks("en-us"));
        assert!(voice.speaks("en-GB"));
        assert!(voice.supports(QualityTier::Enhanced));
        assert!(voice.supports(QualityTier::Standard));
    }

    #[test]
    fn test_engine_names() {
        assert_eq!(engine_name(QualityTier::Standard), "standard");
        assert_eq!(engine_name(QualityTier::Enhanced), "neural");
    }

    #[test]
    fn test_marks_body_shape() {
        let body = SpeechBody {
            text: "hi",
            voice_id: "Joanna",
            engine: "neural",
            sample_rate: "24000".into(),
            output_format: Some("json"),
            mark_types: Some(MARK_TYPES),
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["mark_types"], serde_json::json!(["viseme", "word"]));
        assert_eq!(value["sample_rate"], "24000");
    }
}
