//! Configuration Loader
//!
//! 实现多源配置加载与合并逻辑
//!
//! 优先级（从高到低）：
//! 1. 环境变量
//! 2. 配置文件（config.toml / config.local.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::{AppConfig, ProviderKind, TranslationMode};

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 加载应用配置
///
/// # 环境变量示例
/// - `VOXBRIDGE_SERVER__PORT=8080`
/// - `VOXBRIDGE_PROVIDER__KIND=fake`
/// - `VOXBRIDGE_VOICE__CATALOG_TTL_SECS=600`
/// - `VOXBRIDGE_PIPELINE__AUDIO_DELIVERY=inline`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置，None 时搜索默认文件名
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    builder = builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 8080)?
        .set_default("provider.kind", "http")?
        .set_default("provider.timeout_secs", 30)?
        .set_default("provider.max_retries", 2)?
        .set_default("translation.mode", "phrase")?
        .set_default("voice.catalog_ttl_secs", 3600)?
        .set_default("voice.require_enhanced", true)?
        .set_default("voice.sample_rate_hz", 24000)?
        .set_default("transcription.poll_interval_ms", 2000)?
        .set_default("transcription.timeout_secs", 60)?
        .set_default("storage.backend", "sled")?
        .set_default("storage.presign_ttl_secs", 3600)?
        .set_default("pipeline.max_text_chars", 500)?
        .set_default("pipeline.max_concurrent", 4)?
        .set_default("pipeline.queue_capacity", 64)?
        .set_default("pipeline.audio_delivery", "url")?
        .set_default("log.level", "info")?
        .set_default("log.json", false)?;

    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 例如: VOXBRIDGE_PROVIDER__SYNTHESIS_URL=http://tts-gateway:9001
    builder = builder.add_source(
        Environment::with_prefix("VOXBRIDGE")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config.try_deserialize().map_err(|e| {
        ConfigError::ParseError(format!("Failed to deserialize config: {}", e))
    })?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
pub fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "Server port cannot be 0".to_string(),
        ));
    }

    if config.provider.kind == ProviderKind::Http {
        let urls = [
            ("provider.synthesis_url", &config.provider.synthesis_url),
            ("provider.recognition_url", &config.provider.recognition_url),
        ];
        for (name, url) in urls {
            if url.trim().is_empty() {
                return Err(ConfigError::ValidationError(format!(
                    "{} cannot be empty",
                    name
                )));
            }
        }

        let translation_url = match config.translation.mode {
            TranslationMode::Phrase => ("provider.translation_url", &config.provider.translation_url),
            TranslationMode::Generative => {
                ("translation.generative_url", &config.translation.generative_url)
            }
        };
        if translation_url.1.trim().is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "{} cannot be empty",
                translation_url.0
            )));
        }

        if config.storage.has_weak_signing_secret() {
            return Err(ConfigError::ValidationError(
                "storage.signing_secret must be set to a non-default value".to_string(),
            ));
        }
    }

    if config.transcription.poll_interval_ms == 0 {
        return Err(ConfigError::ValidationError(
            "Transcription poll interval cannot be 0".to_string(),
        ));
    }

    if config.transcription.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "Transcription timeout cannot be 0".to_string(),
        ));
    }

    if config.pipeline.max_text_chars == 0 {
        return Err(ConfigError::ValidationError(
            "Max text chars cannot be 0".to_string(),
        ));
    }

    if config.pipeline.max_concurrent == 0 {
        return Err(ConfigError::ValidationError(
            "Pipeline max_concurrent cannot be 0".to_string(),
        ));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}:{}", config.server.host, config.server.port);
    tracing::info!("Public Base URL: {}", config.server.public_base_url());
    tracing::info!("Provider: {:?}", config.provider.kind);
    if config.provider.kind == ProviderKind::Http {
        tracing::info!("Synthesis URL: {}", config.provider.synthesis_url);
        tracing::info!("Recognition URL: {}", config.provider.recognition_url);
    }
    tracing::info!("Translation: {:?}", config.translation.mode);
    tracing::info!("Catalog TTL: {}s", config.voice.catalog_ttl_secs);
    tracing::info!("Require Enhanced: {}", config.voice.require_enhanced);
    tracing::info!(
        "Transcription: poll {}ms, timeout {}s",
        config.transcription.poll_interval_ms,
        config.transcription.timeout_secs
    );
    tracing::info!("Storage: {:?}", config.storage.backend);
    tracing::info!(
        "Pipeline: {} concurrent, queue {}, delivery {:?}",
        config.pipeline.max_concurrent,
        config.pipeline.queue_capacity,
        config.pipeline.audio_delivery
    );
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}
