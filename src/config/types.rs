//! Configuration Types
//!
//! 定义所有配置结构体

use serde::Deserialize;
use std::path::PathBuf;

use crate::application::AudioDelivery;
use crate::domain::voice::default_near_locales;

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,

    /// 外部服务配置
    #[serde(default)]
    pub provider: ProviderConfig,

    #[serde(default)]
    pub translation: TranslationConfig,

    /// 音色目录与选择策略
    #[serde(default)]
    pub voice: VoiceConfig,

    #[serde(default)]
    pub transcription: TranscriptionConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub pipeline: PipelineConfig,

    #[serde(default)]
    pub log: LogConfig,
}

// ============================================================================
// Server
// ============================================================================

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,

    /// 公开访问的 Base URL（用于生成下载链接）
    /// 如果未设置，则使用 http://{host}:{port}
    #[serde(default)]
    pub base_url: Option<String>,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            base_url: None,
        }
    }
}

impl ServerConfig {
    /// 获取公开的 Base URL
    pub fn public_base_url(&self) -> String {
        self.base_url.clone().unwrap_or_else(|| {
            let host = if self.host == "0.0.0.0" {
                "localhost"
            } else {
                &self.host
            };
            format!("http://{}:{}", host, self.port)
        })
    }
}

// ============================================================================
// Provider
// ============================================================================

/// 外部服务实现
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    #[default]
    Http,
    /// 进程内确定性实现（开发与演示）
    Fake,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    #[serde(default)]
    pub kind: ProviderKind,

    /// 语音合成网关
    #[serde(default = "default_synthesis_url")]
    pub synthesis_url: String,

    /// 语音识别网关
    #[serde(default = "default_recognition_url")]
    pub recognition_url: String,

    /// 短语翻译服务
    #[serde(default = "default_translation_url")]
    pub translation_url: String,

    #[serde(default)]
    pub api_key: Option<String>,

    /// 请求超时时间（秒）
    #[serde(default = "default_provider_timeout")]
    pub timeout_secs: u64,

    /// 可重试错误的最大重试次数
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_synthesis_url() -> String {
    "http://localhost:9001".to_string()
}

fn default_recognition_url() -> String {
    "http://localhost:9002".to_string()
}

fn default_translation_url() -> String {
    "http://localhost:9003".to_string()
}

fn default_provider_timeout() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    2
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            kind: ProviderKind::default(),
            synthesis_url: default_synthesis_url(),
            recognition_url: default_recognition_url(),
            translation_url: default_translation_url(),
            api_key: None,
            timeout_secs: default_provider_timeout(),
            max_retries: default_max_retries(),
        }
    }
}

// ============================================================================
// Translation
// ============================================================================

/// 翻译后端
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranslationMode {
    /// 短语翻译服务
    #[default]
    Phrase,
    /// OpenAI 兼容的 chat completions
    Generative,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TranslationConfig {
    #[serde(default)]
    pub mode: TranslationMode,

    #[serde(default = "default_generative_url")]
    pub generative_url: String,

    #[serde(default = "default_model")]
    pub model: String,

    /// 未设置时使用 provider.api_key
    #[serde(default)]
    pub api_key: Option<String>,
}

fn default_generative_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            mode: TranslationMode::default(),
            generative_url: default_generative_url(),
            model: default_model(),
            api_key: None,
        }
    }
}

// ============================================================================
// Voice
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct VoiceConfig {
    /// 目录缓存有效期（秒）
    #[serde(default = "default_catalog_ttl")]
    pub catalog_ttl_secs: u64,

    #[serde(default = "default_male_voice")]
    pub male_default: String,

    #[serde(default = "default_female_voice")]
    pub female_default: String,

    /// 优先音色（靠前者优先）
    #[serde(default = "default_preferred")]
    pub preferred: Vec<String>,

    /// 邻近语言对
    #[serde(default = "default_near_locales")]
    pub near_locales: Vec<(String, String)>,

    #[serde(default = "default_require_enhanced")]
    pub require_enhanced: bool,

    #[serde(default = "default_sample_rate")]
    pub sample_rate_hz: u32,
}

fn default_catalog_ttl() -> u64 {
    3600
}

fn default_male_voice() -> String {
    "Matthew".to_string()
}

fn default_female_voice() -> String {
    "Joanna".to_string()
}

fn default_preferred() -> Vec<String> {
    ["Matthew", "Joanna", "Brian", "Emma", "Zhiyu", "Hiujin"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

fn default_require_enhanced() -> bool {
    true
}

fn default_sample_rate() -> u32 {
    24000
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            catalog_ttl_secs: default_catalog_ttl(),
            male_default: default_male_voice(),
            female_default: default_female_voice(),
            preferred: default_preferred(),
            near_locales: default_near_locales(),
            require_enhanced: default_require_enhanced(),
            sample_rate_hz: default_sample_rate(),
        }
    }
}

// ============================================================================
// Transcription
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct TranscriptionConfig {
    /// 暂存上传音频与识别结果的 bucket
    #[serde(default = "default_bucket")]
    pub bucket: String,

    #[serde(default = "default_staging_prefix")]
    pub staging_prefix: String,

    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,

    #[serde(default = "default_transcription_timeout")]
    pub timeout_secs: u64,

    /// 上传文件最大大小（字节）
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,

    /// 上传音频最大时长（秒），0 表示不限制
    #[serde(default = "default_max_audio_secs")]
    pub max_audio_secs: u64,
}

fn default_bucket() -> String {
    "avatar-audio-cache".to_string()
}

fn default_staging_prefix() -> String {
    "transcribe".to_string()
}

fn default_poll_interval() -> u64 {
    2000
}

fn default_transcription_timeout() -> u64 {
    60
}

fn default_max_upload_bytes() -> usize {
    10 * 1024 * 1024 // 10 MB
}

fn default_max_audio_secs() -> u64 {
    120
}

impl Default for TranscriptionConfig {
    fn default() -> Self {
        Self {
            bucket: default_bucket(),
            staging_prefix: default_staging_prefix(),
            poll_interval_ms: default_poll_interval(),
            timeout_secs: default_transcription_timeout(),
            max_upload_bytes: default_max_upload_bytes(),
            max_audio_secs: default_max_audio_secs(),
        }
    }
}

// ============================================================================
// Storage
// ============================================================================

/// 对象存储后端
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Sled,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    #[serde(default = "default_sled_path")]
    pub sled_path: PathBuf,

    /// 合成音频 bucket
    #[serde(default = "default_bucket")]
    pub audio_bucket: String,

    #[serde(default = "default_audio_prefix")]
    pub audio_prefix: String,

    /// 下载链接有效期（秒）
    #[serde(default = "default_presign_ttl")]
    pub presign_ttl_secs: u64,

    /// 下载链接签名密钥
    #[serde(default = "default_signing_secret")]
    pub signing_secret: String,
}

fn default_sled_path() -> PathBuf {
    PathBuf::from("data/objects.sled")
}

fn default_audio_prefix() -> String {
    "tts".to_string()
}

fn default_presign_ttl() -> u64 {
    3600
}

/// 出厂签名密钥，仅适用于 fake provider
pub const DEFAULT_SIGNING_SECRET: &str = "change-me";

fn default_signing_secret() -> String {
    DEFAULT_SIGNING_SECRET.to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            sled_path: default_sled_path(),
            audio_bucket: default_bucket(),
            audio_prefix: default_audio_prefix(),
            presign_ttl_secs: default_presign_ttl(),
            signing_secret: default_signing_secret(),
        }
    }
}

impl StorageConfig {
    /// 密钥为空或仍是出厂值
    pub fn has_weak_signing_secret(&self) -> bool {
        let secret = self.signing_secret.trim();
        secret.is_empty() || secret == DEFAULT_SIGNING_SECRET
    }
}

// ============================================================================
// Pipeline
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// 文本最大字符数
    #[serde(default = "default_max_text_chars")]
    pub max_text_chars: usize,

    /// 同时执行的流水线数
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    #[serde(default = "default_audio_delivery")]
    pub audio_delivery: AudioDelivery,
}

fn default_max_text_chars() -> usize {
    500
}

fn default_max_concurrent() -> usize {
    4
}

fn default_queue_capacity() -> usize {
    64
}

fn default_audio_delivery() -> AudioDelivery {
    AudioDelivery::Url
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_text_chars: default_max_text_chars(),
            max_concurrent: default_max_concurrent(),
            queue_capacity: default_queue_capacity(),
            audio_delivery: default_audio_delivery(),
        }
    }
}

// ============================================================================
// Log
// ============================================================================

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,

    /// 是否启用 JSON 格式
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.provider.kind, ProviderKind::Http);
        assert_eq!(config.voice.catalog_ttl_secs, 3600);
        assert_eq!(config.voice.male_default, "Matthew");
        assert_eq!(config.transcription.poll_interval_ms, 2000);
        assert_eq!(config.storage.audio_bucket, "avatar-audio-cache");
        assert_eq!(config.pipeline.max_text_chars, 500);
        assert_eq!(config.pipeline.audio_delivery, AudioDelivery::Url);
    }

    #[test]
    fn test_public_base_url() {
        let mut config = ServerConfig::default();
        assert_eq!(config.public_base_url(), "http://localhost:8080");

        config.base_url = Some("https://voice.example.com".to_string());
        assert_eq!(config.public_base_url(), "https://voice.example.com");
    }

    #[test]
    fn test_enums_deserialize_lowercase() {
        let config: PipelineConfig =
            serde_json::from_str(r#"{"audio_delivery":"inline"}"#).unwrap();
        assert_eq!(config.audio_delivery, AudioDelivery::Inline);

        let provider: ProviderConfig = serde_json::from_str(r#"{"kind":"fake"}"#).unwrap();
        assert_eq!(provider.kind, ProviderKind::Fake);
    }
}
