//! Data Transfer Objects

use serde::{Deserialize, Serialize};

use crate::application::{
    AudioReference, LanguageResponse, PipelineResult, SpeakOptions, VisemeMapResponse,
    VoiceResponse,
};
use crate::domain::voice::{Gender, VoiceSelection};
use crate::domain::{MouthShape, TimelineEvent, VisemeTiming};

// ============================================================================
// 统一响应结构
// ============================================================================

/// 统一 API 响应格式
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub errno: i32,
    pub error: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 成功响应
    pub fn success(data: T) -> Self {
        Self {
            errno: 0,
            error: String::new(),
            data: Some(data),
        }
    }
}

// ============================================================================
// Speak DTOs
// ============================================================================

/// 两条流水线共用的可选参数
#[derive(Debug, Default, Deserialize)]
pub struct SpeakOptionsDto {
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub voice_id: Option<String>,
    #[serde(default)]
    pub require_enhanced: Option<bool>,
    #[serde(default)]
    pub sample_rate_hz: Option<u32>,
    #[serde(default)]
    pub style: Option<String>,
    #[serde(default)]
    pub include_raw_timeline: bool,
    #[serde(default)]
    pub include_transcript: bool,
}

impl From<SpeakOptionsDto> for SpeakOptions {
    fn from(dto: SpeakOptionsDto) -> Self {
        Self {
            gender: dto.gender.as_deref().and_then(parse_gender),
            voice_id: non_blank(dto.voice_id),
            require_enhanced: dto.require_enhanced,
            sample_rate_hz: dto.sample_rate_hz,
            style: non_blank(dto.style),
            include_raw_timeline: dto.include_raw_timeline,
            include_transcript: dto.include_transcript,
        }
    }
}

/// 无法识别的性别视为未指定
pub fn parse_gender(value: &str) -> Option<Gender> {
    match Gender::parse(value) {
        Gender::Unknown => None,
        gender => Some(gender),
    }
}

pub fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[derive(Debug, Deserialize)]
pub struct SpeakTextRequest {
    pub text: String,
    #[serde(default)]
    pub source_language: Option<String>,
    pub target_language: String,
    #[serde(flatten)]
    pub options: SpeakOptionsDto,
}

#[derive(Debug, Deserialize)]
pub struct SpeakVoiceStorageRequest {
    pub bucket: String,
    pub key: String,
    #[serde(default)]
    pub media_format: Option<String>,
    #[serde(default)]
    pub source_language: Option<String>,
    pub target_language: String,
    #[serde(flatten)]
    pub options: SpeakOptionsDto,
}

#[derive(Debug, Serialize)]
pub struct SpeakResponse {
    pub audio: AudioReference,
    pub audio_mime: String,
    pub timeline: Vec<TimelineEvent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_timeline: Option<String>,
    pub source_text: String,
    pub translated_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
    pub voice: VoiceSelection,
    pub sample_rate_hz: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

impl From<PipelineResult> for SpeakResponse {
    fn from(result: PipelineResult) -> Self {
        Self {
            audio: result.audio,
            audio_mime: result.audio_mime,
            timeline: result.timeline,
            raw_timeline: result.raw_timeline,
            source_text: result.source_text,
            translated_text: result.translated_text,
            transcript: result.transcript,
            voice: result.voice,
            sample_rate_hz: result.sample_rate_hz,
            duration_ms: result.duration_ms,
        }
    }
}

// ============================================================================
// Voice DTOs
// ============================================================================

#[derive(Debug, Default, Deserialize)]
pub struct ListVoicesParams {
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub enhanced: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct VoiceDto {
    pub id: String,
    pub gender: String,
    pub languages: Vec<String>,
    pub tiers: Vec<String>,
}

impl From<VoiceResponse> for VoiceDto {
    fn from(v: VoiceResponse) -> Self {
        Self {
            id: v.id,
            gender: v.gender,
            languages: v.languages,
            tiers: v.tiers,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct VoiceListResponse {
    pub voices: Vec<VoiceDto>,
    pub total: usize,
}

#[derive(Debug, Serialize)]
pub struct LanguageDto {
    pub locale: String,
    pub male: bool,
    pub female: bool,
    pub translatable: bool,
}

impl From<LanguageResponse> for LanguageDto {
    fn from(l: LanguageResponse) -> Self {
        Self {
            locale: l.locale,
            male: l.male,
            female: l.female,
            translatable: l.translatable,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LanguageListResponse {
    pub languages: Vec<LanguageDto>,
}

// ============================================================================
// Viseme DTOs
// ============================================================================

#[derive(Debug, Serialize)]
pub struct VisemeEntryDto {
    pub symbol: String,
    pub shape: MouthShape,
}

#[derive(Debug, Serialize)]
pub struct VisemeMapDto {
    pub mapping: Vec<VisemeEntryDto>,
    pub default_shape: MouthShape,
    pub timing: VisemeTiming,
}

impl From<VisemeMapResponse> for VisemeMapDto {
    fn from(r: VisemeMapResponse) -> Self {
        Self {
            mapping: r
                .mapping
                .into_iter()
                .map(|(symbol, shape)| VisemeEntryDto { symbol, shape })
                .collect(),
            default_shape: r.default_shape,
            timing: r.timing,
        }
    }
}

// ============================================================================
// Object DTOs
// ============================================================================

/// 预签名下载参数
#[derive(Debug, Deserialize)]
pub struct SignedObjectParams {
    pub expires: i64,
    pub sig: String,
}
