//! Speak Command Handlers - 流水线编排
//!
//! 文本流水线：校验 → 翻译 → 选音色 → 合成 → 存储 → 组装结果
//! 语音流水线：识别（转写必须非空）→ 之后同文本流水线
//!
//! 任一阶段失败立即终止，不做阶段级重试

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::application::commands::speak_commands::*;
use crate::application::error::PipelineError;
use crate::application::ports::{AudioProbePort, ObjectStoragePort};
use crate::application::stages::{
    SynthesisOutput, SynthesisStage, TranscriptionStage, TranslationStage, VoiceSelector,
};
use crate::domain::{MediaFormat, ObjectLocation};

/// 合成服务支持的输出采样率
pub const SUPPORTED_SAMPLE_RATES: &[u32] = &[8000, 16000, 22050, 24000];

/// 合成音频交付方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioDelivery {
    /// 限时下载 URL
    Url,
    /// 内联 base64
    Inline,
}

/// 流水线配置
#[derive(Debug, Clone)]
pub struct PipelineSettings {
    /// 文本最大字符数
    pub max_text_chars: usize,
    pub default_sample_rate_hz: u32,
    pub require_enhanced_default: bool,
    /// 合成音频存储 bucket
    pub audio_bucket: String,
    pub audio_prefix: String,
    pub presign_ttl: Duration,
    pub delivery: AudioDelivery,
    /// 上传音频最大时长（秒），0 表示不限制
    pub max_audio_secs: u64,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            max_text_chars: 500,
            default_sample_rate_hz: 24000,
            require_enhanced_default: true,
            audio_bucket: "avatar-audio-cache".to_string(),
            audio_prefix: "tts".to_string(),
            presign_ttl: Duration::from_secs(3600),
            delivery: AudioDelivery::Url,
            max_audio_secs: 120,
        }
    }
}

/// 两条流水线共享的阶段与依赖
pub struct PipelineContext {
    pub translation: TranslationStage,
    pub selector: VoiceSelector,
    pub synthesis: SynthesisStage,
    pub transcription: TranscriptionStage,
    pub storage: Arc<dyn ObjectStoragePort>,
    pub probe: Option<Arc<dyn AudioProbePort>>,
    pub settings: PipelineSettings,
}

impl PipelineContext {
    fn validate_common(
        &self,
        target_language: &str,
        options: &SpeakOptions,
    ) -> Result<u32, PipelineError> {
        if target_language.trim().is_empty() {
            return Err(PipelineError::validation("target language is required"));
        }

        let sample_rate = options
            .sample_rate_hz
            .unwrap_or(self.settings.default_sample_rate_hz);
        if !SUPPORTED_SAMPLE_RATES.contains(&sample_rate) {
            return Err(PipelineError::validation(format!(
                "unsupported sample rate: {} (supported: {:?})",
                sample_rate, SUPPORTED_SAMPLE_RATES
            )));
        }

        Ok(sample_rate)
    }

    /// 翻译之后的公共尾部：选音色 → 合成 → 存储 → 组装
    async fn speak(
        &self,
        source_text: String,
        source_language: Option<&str>,
        target_language: &str,
        options: &SpeakOptions,
        sample_rate_hz: u32,
        transcript: Option<String>,
    ) -> Result<PipelineResult, PipelineError> {
        let translated_text = self
            .translation
            .translate(
                &source_text,
                source_language,
                target_language,
                options.style.as_deref(),
            )
            .await?;

        let require_enhanced = options
            .require_enhanced
            .unwrap_or(self.settings.require_enhanced_default);
        let mut voice = self
            .selector
            .select(
                target_language,
                options.gender,
                options.voice_id.as_deref(),
                require_enhanced,
            )
            .await;

        let output = self
            .synthesis
            .synthesize(&translated_text, &voice.voice_id, voice.tier, sample_rate_hz)
            .await?;
        voice.tier = output.tier;

        let duration_ms = self.probe_duration(&output);
        let audio_mime = output.audio.mime.clone();
        let audio = self.persist(&output).await?;

        tracing::info!(
            location = %audio.location(),
            voice_id = %voice.voice_id,
            reason = voice.reason.as_str(),
            timeline_events = output.timeline.len(),
            "Pipeline completed"
        );

        Ok(PipelineResult {
            audio,
            audio_mime,
            timeline: output.timeline,
            raw_timeline: options.include_raw_timeline.then_some(output.raw_marks),
            source_text,
            translated_text,
            transcript,
            voice,
            sample_rate_hz,
            duration_ms,
        })
    }

    async fn persist(&self, output: &SynthesisOutput) -> Result<AudioReference, PipelineError> {
        let location = ObjectLocation::new(
            self.settings.audio_bucket.clone(),
            format!(
                "{}/{}.{}",
                self.settings.audio_prefix.trim_end_matches('/'),
                Uuid::new_v4().simple(),
                extension_for_mime(&output.audio.mime)
            ),
        );

        self.storage
            .put(&location, output.audio.bytes.clone(), &output.audio.mime)
            .await
            .map_err(|e| {
                tracing::error!(location = %location, error = %e, "Failed to store synthesized audio");
                PipelineError::from(e)
            })?;

        match self.settings.delivery {
            AudioDelivery::Url => {
                let url = self
                    .storage
                    .presigned_get(&location, self.settings.presign_ttl)
                    .await?;
                Ok(AudioReference::Stored { location, url })
            }
            AudioDelivery::Inline => Ok(AudioReference::Inline {
                location,
                base64: BASE64.encode(&output.audio.bytes),
            }),
        }
    }

    fn probe_duration(&self, output: &SynthesisOutput) -> Option<u64> {
        let probe = self.probe.as_ref()?;
        match probe.probe(&output.audio.bytes, Some(extension_for_mime(&output.audio.mime))) {
            Ok(info) => Some(info.duration_ms),
            Err(e) => {
                tracing::debug!(error = %e, "Could not probe synthesized audio");
                None
            }
        }
    }

    /// 上传音频的时长限制（无法探测的格式放行）
    fn check_upload_duration(&self, data: &[u8], format: MediaFormat) -> Result<(), PipelineError> {
        let Some(probe) = self.probe.as_ref() else {
            return Ok(());
        };
        if self.settings.max_audio_secs == 0 {
            return Ok(());
        }

        match probe.probe(data, Some(format.as_str())) {
            Ok(info) if info.duration_ms > self.settings.max_audio_secs * 1000 => {
                Err(PipelineError::validation(format!(
                    "audio too long: {}ms exceeds {}s",
                    info.duration_ms, self.settings.max_audio_secs
                )))
            }
            Ok(_) => Ok(()),
            Err(e) => {
                tracing::debug!(format = %format, error = %e, "Upload not probed");
                Ok(())
            }
        }
    }
}

fn extension_for_mime(mime: &str) -> &'static str {
    match mime.split(';').next().map(str::trim) {
        Some("audio/mpeg") | Some("audio/mp3") => "mp3",
        Some("audio/wav") | Some("audio/x-wav") | Some("audio/wave") => "wav",
        Some("audio/ogg") => "ogg",
        Some("audio/pcm") => "pcm",
        _ => "bin",
    }
}

/// SpeakText Handler - 文本流水线
pub struct SpeakTextHandler {
    context: Arc<PipelineContext>,
}

impl SpeakTextHandler {
    pub fn new(context: Arc<PipelineContext>) -> Self {
        Self { context }
    }

    pub async fn handle(&self, cmd: SpeakTextCommand) -> Result<PipelineResult, PipelineError> {
        let text = cmd.text.trim().to_string();
        if text.is_empty() {
            return Err(PipelineError::validation("text cannot be empty"));
        }
        let chars = text.chars().count();
        if chars > self.context.settings.max_text_chars {
            return Err(PipelineError::validation(format!(
                "text exceeds {} characters ({})",
                self.context.settings.max_text_chars, chars
            )));
        }

        let sample_rate = self
            .context
            .validate_common(&cmd.target_language, &cmd.options)?;

        tracing::info!(
            chars,
            source_language = ?cmd.source_language,
            target_language = %cmd.target_language,
            "Text pipeline started"
        );

        let transcript = cmd.options.include_transcript.then(|| text.clone());
        self.context
            .speak(
                text,
                cmd.source_language.as_deref(),
                &cmd.target_language,
                &cmd.options,
                sample_rate,
                transcript,
            )
            .await
    }
}

/// SpeakVoice Handler - 语音流水线
pub struct SpeakVoiceHandler {
    context: Arc<PipelineContext>,
}

impl SpeakVoiceHandler {
    pub fn new(context: Arc<PipelineContext>) -> Self {
        Self { context }
    }

    pub async fn handle(&self, cmd: SpeakVoiceCommand) -> Result<PipelineResult, PipelineError> {
        let sample_rate = self
            .context
            .validate_common(&cmd.target_language, &cmd.options)?;
        let hint = cmd.source_language.as_deref();

        let outcome = match cmd.source {
            VoiceSource::Stored {
                location,
                media_format,
            } => {
                let format = MediaFormat::infer(media_format.as_deref(), Some(&location.key))
                    .map_err(PipelineError::ValidationError)?;
                tracing::info!(source = %location, format = %format, "Voice pipeline started");
                self.context
                    .transcription
                    .transcribe_stored(&location, format, hint)
                    .await?
            }
            VoiceSource::Upload {
                data,
                file_name,
                media_format,
            } => {
                let format = MediaFormat::infer(media_format.as_deref(), file_name.as_deref())
                    .map_err(PipelineError::ValidationError)?;
                self.context.check_upload_duration(&data, format)?;
                tracing::info!(
                    bytes = data.len(),
                    format = %format,
                    "Voice pipeline started (upload)"
                );
                self.context
                    .transcription
                    .transcribe_upload(data, format, hint)
                    .await?
            }
        };

        if outcome.transcript.is_empty() {
            tracing::warn!(job_name = %outcome.job_name, "Recognition produced an empty transcript");
            return Err(PipelineError::RecognitionFailed(
                "empty transcript".to_string(),
            ));
        }

        let transcript = cmd
            .options
            .include_transcript
            .then(|| outcome.transcript.clone());
        self.context
            .speak(
                outcome.transcript,
                hint,
                &cmd.target_language,
                &cmd.options,
                sample_rate,
                transcript,
            )
            .await
    }
}

/// 基于 fake 服务的流水线装配，供各层测试复用
#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::application::stages::{TranscriptionSettings, VoiceCatalogCache};
    use crate::domain::voice::VoiceSelectionPolicy;
    use crate::infrastructure::adapters::{
        FakeRecognizer, FakeSpeechSynthesizer, FakeSpeechSynthesizerConfig, FakeTranslator,
        RecognitionScript, SymphoniaAudioProbe,
    };
    use crate::infrastructure::memory::InMemoryObjectStorage;

    pub struct Harness {
        pub context: Arc<PipelineContext>,
        pub synthesizer: Arc<FakeSpeechSynthesizer>,
        pub translator: Arc<FakeTranslator>,
        pub recognizer: Arc<FakeRecognizer>,
        pub storage: Arc<InMemoryObjectStorage>,
    }

    pub fn harness(script: RecognitionScript, delivery: AudioDelivery) -> Harness {
        let storage = Arc::new(InMemoryObjectStorage::for_tests());
        let synthesizer = Arc::new(FakeSpeechSynthesizer::new(
            FakeSpeechSynthesizerConfig::default(),
        ));
        let translator = Arc::new(FakeTranslator::new());
        let recognizer = Arc::new(FakeRecognizer::new(storage.clone(), script));

        let catalog = Arc::new(VoiceCatalogCache::with_default_ttl(synthesizer.clone()));
        let context = Arc::new(PipelineContext {
            translation: TranslationStage::new(translator.clone()),
            selector: VoiceSelector::new(catalog, VoiceSelectionPolicy::default()),
            synthesis: SynthesisStage::new(synthesizer.clone()),
            transcription: TranscriptionStage::new(
                recognizer.clone(),
                storage.clone(),
                TranscriptionSettings {
                    bucket: "audio".to_string(),
                    staging_prefix: "transcribe".to_string(),
                    poll_interval: Duration::from_millis(5),
                    timeout: Duration::from_millis(200),
                },
            ),
            storage: storage.clone(),
            probe: Some(Arc::new(SymphoniaAudioProbe::new())),
            settings: PipelineSettings {
                audio_bucket: "audio".to_string(),
                delivery,
                ..Default::default()
            },
        });

        Harness {
            context,
            synthesizer,
            translator,
            recognizer,
            storage,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::harness;
    use super::*;
    use crate::domain::timeline::MarkKind;
    use crate::domain::voice::{Gender, SelectionReason};
    use crate::infrastructure::adapters::RecognitionScript;

    fn text_command(text: &str, source: &str, target: &str) -> SpeakTextCommand {
        SpeakTextCommand {
            text: text.to_string(),
            source_language: Some(source.to_string()),
            target_language: target.to_string(),
            options: SpeakOptions::default(),
        }
    }

    #[tokio::test]
    async fn test_text_pipeline_same_language() {
        let h = harness(RecognitionScript::NeverFinish, AudioDelivery::Url);
        let handler = SpeakTextHandler::new(h.context.clone());

        let result = handler
            .handle(text_command("Good morning", "en-US", "en-US"))
            .await
            .unwrap();

        assert_eq!(h.translator.calls(), 0);
        assert_eq!(result.source_text, "Good morning");
        assert_eq!(result.translated_text, "Good morning");
        assert!(!result.timeline.is_empty());
        assert!(result.duration_ms.unwrap_or(0) > 0);
        assert_eq!(result.transcript, None);
        assert_eq!(result.raw_timeline, None);

        match &result.audio {
            AudioReference::Stored { location, url } => {
                assert!(!url.is_empty());
                assert!(location.key.starts_with("tts/"));
                assert!(h.storage.get(location).await.is_ok());
            }
            other => panic!("unexpected audio reference: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_text_pipeline_translates() {
        let h = harness(RecognitionScript::NeverFinish, AudioDelivery::Inline);
        let handler = SpeakTextHandler::new(h.context.clone());

        let mut cmd = text_command("Good morning", "en-US", "fr-FR");
        cmd.options.include_transcript = true;
        cmd.options.include_raw_timeline = true;
        let result = handler.handle(cmd).await.unwrap();

        assert_eq!(h.translator.calls(), 1);
        assert_eq!(result.translated_text, "[fr] Good morning");
        assert_eq!(result.transcript.as_deref(), Some("Good morning"));
        assert!(result.raw_timeline.is_some());
        assert!(matches!(result.audio, AudioReference::Inline { .. }));

        let synthesized = h.synthesizer.requests();
        assert!(synthesized.iter().all(|r| r.text == "[fr] Good morning"));
    }

    #[tokio::test]
    async fn test_text_validation() {
        let h = harness(RecognitionScript::NeverFinish, AudioDelivery::Url);
        let handler = SpeakTextHandler::new(h.context.clone());

        let err = handler
            .handle(text_command("   ", "en-US", "en-US"))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::ValidationError(_)));

        let long = "a".repeat(501);
        let err = handler
            .handle(text_command(&long, "en-US", "en-US"))
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::ValidationError(_)));

        let mut cmd = text_command("hi", "en-US", "en-US");
        cmd.options.sample_rate_hz = Some(44100);
        let err = handler.handle(cmd).await.unwrap_err();
        assert!(matches!(err, PipelineError::ValidationError(_)));

        assert_eq!(h.synthesizer.audio_calls(), 0);
    }

    #[tokio::test]
    async fn test_catalog_outage_falls_back_to_default_voice() {
        let h = harness(RecognitionScript::NeverFinish, AudioDelivery::Url);
        h.synthesizer.fail_catalog(true);
        let handler = SpeakTextHandler::new(h.context.clone());

        let mut cmd = text_command("Good morning", "en-US", "en-US");
        cmd.options.gender = Some(Gender::Male);
        let result = handler.handle(cmd).await.unwrap();

        assert_eq!(result.voice.voice_id, "Matthew");
        assert_eq!(result.voice.reason, SelectionReason::Fallback);
    }

    #[tokio::test]
    async fn test_voice_pipeline_empty_transcript_fails_early() {
        let h = harness(
            RecognitionScript::Complete {
                transcript: "".to_string(),
                after_polls: 1,
            },
            AudioDelivery::Url,
        );
        let handler = SpeakVoiceHandler::new(h.context.clone());

        let err = handler
            .handle(SpeakVoiceCommand {
                source: VoiceSource::Upload {
                    data: vec![0u8; 32],
                    file_name: Some("clip.wav".to_string()),
                    media_format: None,
                },
                source_language: Some("en-US".to_string()),
                target_language: "fr-FR".to_string(),
                options: SpeakOptions::default(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::RecognitionFailed(_)));
        assert_eq!(h.translator.calls(), 0);
        assert_eq!(h.synthesizer.audio_calls(), 0);
        assert_eq!(h.synthesizer.marks_calls(), 0);
    }

    #[tokio::test]
    async fn test_voice_pipeline_from_storage() {
        let h = harness(
            RecognitionScript::Complete {
                transcript: "hello there".to_string(),
                after_polls: 2,
            },
            AudioDelivery::Url,
        );
        let source = ObjectLocation::new("uploads", "clips/hello.m4a");
        h.storage.put(&source, vec![1, 2, 3], "audio/mp4").await.unwrap();

        let handler = SpeakVoiceHandler::new(h.context.clone());
        let mut options = SpeakOptions::default();
        options.include_transcript = true;
        let result = handler
            .handle(SpeakVoiceCommand {
                source: VoiceSource::Stored {
                    location: source.clone(),
                    media_format: None,
                },
                source_language: Some("en-US".to_string()),
                target_language: "es-ES".to_string(),
                options,
            })
            .await
            .unwrap();

        assert_eq!(result.transcript.as_deref(), Some("hello there"));
        assert_eq!(result.source_text, "hello there");
        assert_eq!(result.translated_text, "[es] hello there");
        assert!(result.timeline.iter().any(|e| e.kind == MarkKind::Viseme));

        let submitted = h.recognizer.last_request().unwrap();
        assert_eq!(submitted.media_format, MediaFormat::Mp4);
        assert!(h.storage.get(&source).await.is_ok());
    }

    #[tokio::test]
    async fn test_voice_pipeline_recognition_timeout() {
        let h = harness(RecognitionScript::NeverFinish, AudioDelivery::Url);
        let handler = SpeakVoiceHandler::new(h.context.clone());

        let err = handler
            .handle(SpeakVoiceCommand {
                source: VoiceSource::Upload {
                    data: vec![0u8; 32],
                    file_name: None,
                    media_format: Some("mp3".to_string()),
                },
                source_language: None,
                target_language: "en-US".to_string(),
                options: SpeakOptions::default(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::RecognitionTimedOut { .. }));
        assert_eq!(h.synthesizer.audio_calls(), 0);
    }

    #[tokio::test]
    async fn test_voice_pipeline_rejects_unknown_format() {
        let h = harness(RecognitionScript::NeverFinish, AudioDelivery::Url);
        let handler = SpeakVoiceHandler::new(h.context.clone());

        let err = handler
            .handle(SpeakVoiceCommand {
                source: VoiceSource::Upload {
                    data: vec![1],
                    file_name: Some("notes.txt".to_string()),
                    media_format: None,
                },
                source_language: None,
                target_language: "en-US".to_string(),
                options: SpeakOptions::default(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::ValidationError(_)));
        assert_eq!(h.recognizer.submit_calls(), 0);
    }

    #[test]
    fn test_extension_for_mime() {
        assert_eq!(extension_for_mime("audio/mpeg"), "mp3");
        assert_eq!(extension_for_mime("audio/wav; codecs=1"), "wav");
        assert_eq!(extension_for_mime("application/octet-stream"), "bin");
    }
}
