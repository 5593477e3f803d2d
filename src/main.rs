//! voxbridge - 多语言语音网关
//!
//! 文本/语音输入 → 识别 → 翻译 → 合成，返回音频与口型时间轴

use std::sync::Arc;
use std::time::Duration;

use voxbridge::application::{
    AudioProbePort, ObjectStoragePort, PipelineContext, PipelineSettings, SpeakTextHandler,
    SpeakVoiceHandler, SpeechRecognitionPort, SpeechSynthesisPort, SynthesisStage,
    TranscriptionSettings, TranscriptionStage, TranslationPort, TranslationStage,
    VoiceCatalogCache, VoiceSelector,
};
use voxbridge::config::{
    load_config, print_config, AppConfig, ProviderKind, StorageBackend, TranslationMode,
};
use voxbridge::domain::voice::VoiceSelectionPolicy;
use voxbridge::infrastructure::adapters::{
    FakeRecognizer, FakeSpeechSynthesizer, FakeTranslator, GenerativeTranslator, HttpRecognizer,
    HttpSpeechSynthesizer, PhraseTranslator, ProviderHttpClient, ProviderHttpConfig,
    RecognitionScript, SymphoniaAudioProbe,
};
use voxbridge::infrastructure::http::{AppState, HttpServer, ServerConfig};
use voxbridge::infrastructure::memory::InMemoryObjectStorage;
use voxbridge::infrastructure::persistence::{ObjectUrlSigner, SledObjectStorage};
use voxbridge::infrastructure::worker::{PipelineQueue, PipelineWorker, PipelineWorkerConfig};

/// 外部服务端口
struct Providers {
    synthesizer: Arc<dyn SpeechSynthesisPort>,
    recognizer: Arc<dyn SpeechRecognitionPort>,
    translator: Arc<dyn TranslationPort>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    init_tracing(&config);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "voxbridge starting");
    print_config(&config);

    if config.storage.has_weak_signing_secret() {
        tracing::warn!("storage.signing_secret is unset, download links can be forged");
    }

    let signer = ObjectUrlSigner::new(
        config.server.public_base_url(),
        config.storage.signing_secret.clone(),
    );
    let storage = build_storage(&config, signer.clone()).await?;
    let providers = build_providers(&config, storage.clone())?;

    // 音色目录缓存（查询与选择共享）
    let catalog = Arc::new(VoiceCatalogCache::new(
        providers.synthesizer.clone(),
        Duration::from_secs(config.voice.catalog_ttl_secs),
    ));
    let policy = VoiceSelectionPolicy {
        preferred: config.voice.preferred.clone(),
        near_locales: config.voice.near_locales.clone(),
        male_default: config.voice.male_default.clone(),
        female_default: config.voice.female_default.clone(),
    };
    let probe: Arc<dyn AudioProbePort> = Arc::new(SymphoniaAudioProbe::new());

    let context = Arc::new(PipelineContext {
        translation: TranslationStage::new(providers.translator.clone()),
        selector: VoiceSelector::new(catalog.clone(), policy),
        synthesis: SynthesisStage::new(providers.synthesizer.clone()),
        transcription: TranscriptionStage::new(
            providers.recognizer.clone(),
            storage.clone(),
            TranscriptionSettings {
                bucket: config.transcription.bucket.clone(),
                staging_prefix: config.transcription.staging_prefix.clone(),
                poll_interval: Duration::from_millis(config.transcription.poll_interval_ms),
                timeout: Duration::from_secs(config.transcription.timeout_secs),
            },
        ),
        storage: storage.clone(),
        probe: Some(probe),
        settings: PipelineSettings {
            max_text_chars: config.pipeline.max_text_chars,
            default_sample_rate_hz: config.voice.sample_rate_hz,
            require_enhanced_default: config.voice.require_enhanced,
            audio_bucket: config.storage.audio_bucket.clone(),
            audio_prefix: config.storage.audio_prefix.clone(),
            presign_ttl: Duration::from_secs(config.storage.presign_ttl_secs),
            delivery: config.pipeline.audio_delivery,
            max_audio_secs: config.transcription.max_audio_secs,
        },
    });

    // 创建并启动 PipelineWorker
    let (queue, receiver) = PipelineQueue::channel(config.pipeline.queue_capacity);
    let worker = PipelineWorker::new(
        PipelineWorkerConfig {
            max_concurrent: config.pipeline.max_concurrent,
        },
        receiver,
        Arc::new(SpeakTextHandler::new(context.clone())),
        Arc::new(SpeakVoiceHandler::new(context)),
    );
    tokio::spawn(worker.run());

    let state = AppState::new(
        queue,
        catalog,
        storage,
        providers.synthesizer,
        signer,
        config.transcription.max_upload_bytes,
    );

    // multipart 额外开销留出 1MB
    let server_config = ServerConfig::new(&config.server.host, config.server.port)
        .with_max_body_bytes(config.transcription.max_upload_bytes + 1024 * 1024);
    let server = HttpServer::new(server_config, state);

    server
        .run_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for ctrl-c");
                return;
            }
            tracing::info!("Received shutdown signal");
        })
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let log_filter = format!(
        "{},voxbridge={},tower_http=debug",
        config.log.level, config.log.level
    );
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter));

    if config.log.json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn build_storage(
    config: &AppConfig,
    signer: ObjectUrlSigner,
) -> anyhow::Result<Arc<dyn ObjectStoragePort>> {
    match config.storage.backend {
        StorageBackend::Sled => {
            if let Some(parent) = config.storage.sled_path.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            let storage = SledObjectStorage::open(&config.storage.sled_path, signer)?;
            tracing::info!(path = %config.storage.sled_path.display(), "Sled object storage opened");
            Ok(Arc::new(storage))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory object storage, objects are lost on restart");
            Ok(Arc::new(InMemoryObjectStorage::new(signer)))
        }
    }
}

fn build_providers(
    config: &AppConfig,
    storage: Arc<dyn ObjectStoragePort>,
) -> anyhow::Result<Providers> {
    if config.provider.kind == ProviderKind::Fake {
        tracing::warn!("Using in-process fake providers");
        return Ok(Providers {
            synthesizer: Arc::new(FakeSpeechSynthesizer::with_defaults()),
            recognizer: Arc::new(FakeRecognizer::new(
                storage,
                RecognitionScript::Complete {
                    transcript: "hello from voxbridge".to_string(),
                    after_polls: 1,
                },
            )),
            translator: Arc::new(FakeTranslator::new()),
        });
    }

    let provider = &config.provider;
    let http = |base_url: &str, api_key: Option<String>| {
        ProviderHttpClient::new(
            ProviderHttpConfig::new(base_url)
                .with_api_key(api_key)
                .with_timeout(Duration::from_secs(provider.timeout_secs))
                .with_max_retries(provider.max_retries),
        )
    };

    let synthesizer = HttpSpeechSynthesizer::new(http(
        &provider.synthesis_url,
        provider.api_key.clone(),
    )?);
    let recognizer = HttpRecognizer::new(http(&provider.recognition_url, provider.api_key.clone())?);

    let translator: Arc<dyn TranslationPort> = match config.translation.mode {
        TranslationMode::Phrase => Arc::new(PhraseTranslator::new(http(
            &provider.translation_url,
            provider.api_key.clone(),
        )?)),
        TranslationMode::Generative => {
            let api_key = config
                .translation
                .api_key
                .clone()
                .or_else(|| provider.api_key.clone());
            Arc::new(GenerativeTranslator::new(
                http(&config.translation.generative_url, api_key)?,
                config.translation.model.clone(),
            ))
        }
    };

    Ok(Providers {
        synthesizer: Arc::new(synthesizer),
        recognizer: Arc::new(recognizer),
        translator,
    })
}
