//! Speak Commands - 流水线命令
//!
//! - SpeakTextCommand: 文本 → 翻译 → 合成
//! - SpeakVoiceCommand: 语音 → 识别 → 翻译 → 合成

use serde::Serialize;

use crate::domain::voice::{Gender, VoiceSelection};
use crate::domain::{ObjectLocation, TimelineEvent};

/// 两条流水线共用的选项
#[derive(Debug, Clone, Default)]
pub struct SpeakOptions {
    /// 用户性别偏好
    pub gender: Option<Gender>,
    /// 指定音色（仅当目录中该语言存在时生效）
    pub voice_id: Option<String>,
    /// 是否要求 enhanced 等级，None 使用配置默认值
    pub require_enhanced: Option<bool>,
    /// 输出采样率，None 使用配置默认值
    pub sample_rate_hz: Option<u32>,
    /// 生成式翻译的风格提示
    pub style: Option<String>,
    /// 返回原始语音标记（调试）
    pub include_raw_timeline: bool,
    /// 返回转写文本
    pub include_transcript: bool,
}

/// 文本流水线命令
#[derive(Debug, Clone)]
pub struct SpeakTextCommand {
    pub text: String,
    /// 输入文本的区域代码
    pub source_language: Option<String>,
    /// 输出语音的区域代码
    pub target_language: String,
    pub options: SpeakOptions,
}

/// 语音输入来源
#[derive(Debug, Clone)]
pub enum VoiceSource {
    /// 已在对象存储中
    Stored {
        location: ObjectLocation,
        media_format: Option<String>,
    },
    /// 随请求上传
    Upload {
        data: Vec<u8>,
        file_name: Option<String>,
        media_format: Option<String>,
    },
}

/// 语音流水线命令
#[derive(Debug, Clone)]
pub struct SpeakVoiceCommand {
    pub source: VoiceSource,
    /// 录音的区域代码（同时作为识别语言提示）
    pub source_language: Option<String>,
    pub target_language: String,
    pub options: SpeakOptions,
}

/// 合成音频的交付方式
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum AudioReference {
    /// 已存储，附带限时下载 URL
    Stored { location: ObjectLocation, url: String },
    /// 已存储，同时内联 base64 数据
    Inline { location: ObjectLocation, base64: String },
}

impl AudioReference {
    pub fn location(&self) -> &ObjectLocation {
        match self {
            Self::Stored { location, .. } | Self::Inline { location, .. } => location,
        }
    }
}

/// 流水线结果
#[derive(Debug, Clone)]
pub struct PipelineResult {
    pub audio: AudioReference,
    pub audio_mime: String,
    pub timeline: Vec<TimelineEvent>,
    pub raw_timeline: Option<String>,
    pub source_text: String,
    pub translated_text: String,
    pub transcript: Option<String>,
    pub voice: VoiceSelection,
    pub sample_rate_hz: u32,
    pub duration_ms: Option<u64>,
}
