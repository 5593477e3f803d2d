//! Transcription Stage - 识别阶段
//!
//! 两种入口：
//! - `transcribe_stored`: 音频已在对象存储中
//! - `transcribe_upload`: 先上传为临时对象，任务结束后（任何结果）删除
//!
//! 提交任务后按固定间隔轮询，直到完成、失败或超时

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use uuid::Uuid;

use super::polling::{poll_until, PollOutcome};
use crate::application::error::PipelineError;
use crate::application::ports::{
    ObjectStoragePort, ProviderError, RecognitionJobReport, RecognitionJobRequest, RecognitionState,
    SpeechRecognitionPort,
};
use crate::domain::transcription::{
    default_result_key, output_prefix, parse_transcript_document, JobStatus, TranscriptionJob,
};
use crate::domain::{MediaFormat, ObjectLocation};

/// 识别阶段配置
#[derive(Debug, Clone)]
pub struct TranscriptionSettings {
    /// 暂存与结果所在 bucket
    pub bucket: String,
    /// 临时对象与结果的 key 前缀
    pub staging_prefix: String,
    pub poll_interval: Duration,
    pub timeout: Duration,
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            bucket: "avatar-audio-cache".to_string(),
            staging_prefix: "transcribe".to_string(),
            poll_interval: Duration::from_secs(2),
            timeout: Duration::from_secs(60),
        }
    }
}

/// 识别结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptionOutcome {
    pub job_name: String,
    /// 已去除首尾空白，可能为空
    pub transcript: String,
}

pub struct TranscriptionStage {
    recognizer: Arc<dyn SpeechRecognitionPort>,
    storage: Arc<dyn ObjectStoragePort>,
    settings: TranscriptionSettings,
}

impl TranscriptionStage {
    pub fn new(
        recognizer: Arc<dyn SpeechRecognitionPort>,
        storage: Arc<dyn ObjectStoragePort>,
        settings: TranscriptionSettings,
    ) -> Self {
        Self {
            recognizer,
            storage,
            settings,
        }
    }

    pub fn settings(&self) -> &TranscriptionSettings {
        &self.settings
    }

    /// 上传音频后识别，临时对象在返回前删除
    pub async fn transcribe_upload(
        &self,
        data: Vec<u8>,
        format: MediaFormat,
        language_hint: Option<&str>,
    ) -> Result<TranscriptionOutcome, PipelineError> {
        if data.is_empty() {
            return Err(PipelineError::validation("audio payload is empty"));
        }

        let staged = ObjectLocation::new(
            self.settings.bucket.clone(),
            format!(
                "{}/{}.{}",
                self.settings.staging_prefix.trim_end_matches('/'),
                Uuid::new_v4().simple(),
                format.as_str()
            ),
        );

        self.storage
            .put(&staged, data, &format.content_type())
            .await
            .map_err(|e| {
                tracing::error!(location = %staged, error = %e, "Failed to stage audio");
                PipelineError::StorageFailed(e.to_string())
            })?;

        tracing::debug!(location = %staged, "Audio staged for transcription");

        let result = self.transcribe_stored(&staged, format, language_hint).await;

        if let Err(e) = self.storage.delete(&staged).await {
            tracing::warn!(location = %staged, error = %e, "Failed to delete staged audio");
        }

        result
    }

    /// 识别已存储的音频
    pub async fn transcribe_stored(
        &self,
        source: &ObjectLocation,
        format: MediaFormat,
        language_hint: Option<&str>,
    ) -> Result<TranscriptionOutcome, PipelineError> {
        source.validate().map_err(PipelineError::ValidationError)?;

        let mut job = TranscriptionJob::new(source.clone(), language_hint.map(str::to_string));
        let request = RecognitionJobRequest {
            job_name: job.job_name().to_string(),
            media: source.clone(),
            media_format: format,
            language_hint: job.language_hint().map(str::to_string),
            output: ObjectLocation::new(
                self.settings.bucket.clone(),
                output_prefix(&self.settings.staging_prefix, job.job_name()),
            ),
        };

        let job_id = self.recognizer.submit_job(&request).await.map_err(|e| {
            tracing::error!(job_name = %job.job_name(), error = %e, "Failed to submit recognition job");
            PipelineError::RecognitionFailed(e.to_string())
        })?;

        tracing::info!(
            job_name = %job.job_name(),
            job_id = %job_id,
            source = %source,
            format = %format,
            "Recognition job submitted"
        );

        let recognizer = self.recognizer.clone();
        let tracked = Mutex::new(job);
        let polled = poll_until(self.settings.poll_interval, self.settings.timeout, || {
            let recognizer = recognizer.clone();
            let job_id = job_id.clone();
            let tracked = &tracked;
            async move {
                let report = recognizer.job_status(&job_id).await?;
                Ok::<_, ProviderError>(match report.state {
                    RecognitionState::Completed | RecognitionState::Failed => Some(report),
                    RecognitionState::InProgress => {
                        let mut job = tracked.lock().unwrap_or_else(PoisonError::into_inner);
                        mark_running(&mut job);
                        None
                    }
                    RecognitionState::Queued => None,
                })
            }
        })
        .await;
        let mut job = tracked.into_inner().unwrap_or_else(PoisonError::into_inner);

        let outcome = polled.map_err(|e| {
            tracing::error!(job_name = %job.job_name(), error = %e, "Failed to poll recognition job");
            PipelineError::RecognitionFailed(e.to_string())
        })?;

        match outcome {
            PollOutcome::Ready(report) if report.state == RecognitionState::Completed => {
                job.complete().map_err(|e| PipelineError::RecognitionFailed(e.to_string()))?;
                let transcript = self.fetch_transcript(&job, &report).await?;
                tracing::info!(
                    job_name = %job.job_name(),
                    transcript_chars = transcript.chars().count(),
                    "Recognition job completed"
                );
                Ok(TranscriptionOutcome {
                    job_name: job.job_name().to_string(),
                    transcript,
                })
            }
            PollOutcome::Ready(report) => {
                let reason = report
                    .failure_reason
                    .unwrap_or_else(|| "unknown failure".to_string());
                job.fail(reason.clone())
                    .map_err(|e| PipelineError::RecognitionFailed(e.to_string()))?;
                tracing::warn!(job_name = %job.job_name(), reason = %reason, "Recognition job failed");
                Err(PipelineError::RecognitionFailed(reason))
            }
            PollOutcome::TimedOut { waited, attempts } => {
                job.time_out()
                    .map_err(|e| PipelineError::RecognitionFailed(e.to_string()))?;
                tracing::warn!(
                    job_name = %job.job_name(),
                    waited_ms = waited.as_millis() as u64,
                    attempts,
                    "Recognition job timed out"
                );
                Err(PipelineError::RecognitionTimedOut {
                    job_name: job.job_name().to_string(),
                    waited_ms: waited.as_millis() as u64,
                })
            }
        }
    }

    async fn fetch_transcript(
        &self,
        job: &TranscriptionJob,
        report: &RecognitionJobReport,
    ) -> Result<String, PipelineError> {
        let location = report.result_location.clone().unwrap_or_else(|| {
            ObjectLocation::new(
                self.settings.bucket.clone(),
                default_result_key(&self.settings.staging_prefix, job.job_name()),
            )
        });

        let document = self.storage.get(&location).await.map_err(|e| {
            tracing::error!(location = %location, error = %e, "Failed to read transcript document");
            PipelineError::RecognitionFailed(format!("result document unavailable: {}", e))
        })?;

        parse_transcript_document(&document.data)
            .map_err(|e| PipelineError::RecognitionFailed(e.to_string()))
    }
}

/// 首次收到 InProgress 时任务进入 RUNNING
fn mark_running(job: &mut TranscriptionJob) {
    if job.status() != JobStatus::Submitted {
        return;
    }
    if let Err(e) = job.advance(JobStatus::Running) {
        tracing::warn!(job_name = %job.job_name(), error = %e, "Failed to mark job running");
        return;
    }
    tracing::debug!(job_name = %job.job_name(), "Recognition job running");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::adapters::{FakeRecognizer, RecognitionScript};
    use crate::infrastructure::memory::InMemoryObjectStorage;
    use async_trait::async_trait;

    fn settings() -> TranscriptionSettings {
        TranscriptionSettings {
            bucket: "audio".to_string(),
            staging_prefix: "transcribe".to_string(),
            poll_interval: Duration::from_millis(10),
            timeout: Duration::from_millis(300),
        }
    }

    fn stage(
        script: RecognitionScript,
    ) -> (TranscriptionStage, Arc<FakeRecognizer>, Arc<InMemoryObjectStorage>) {
        let storage = Arc::new(InMemoryObjectStorage::for_tests());
        let recognizer = Arc::new(FakeRecognizer::new(storage.clone(), script));
        let stage = TranscriptionStage::new(recognizer.clone(), storage.clone(), settings());
        (stage, recognizer, storage)
    }

    #[tokio::test]
    async fn test_upload_completes_and_cleans_up() {
        let (stage, recognizer, storage) = stage(RecognitionScript::Complete {
            transcript: "  good morning  ".to_string(),
            after_polls: 2,
        });

        let outcome = stage
            .transcribe_upload(vec![1, 2, 3], MediaFormat::Wav, Some("en-US"))
            .await
            .unwrap();

        assert_eq!(outcome.transcript, "good morning");
        assert!(outcome.job_name.starts_with("job-"));
        assert_eq!(recognizer.submit_calls(), 1);
        assert!(recognizer.status_calls() >= 2);

        let submitted = recognizer.last_request().unwrap();
        assert!(submitted.media.key.starts_with("transcribe/"));
        assert!(submitted.media.key.ends_with(".wav"));
        assert_eq!(submitted.language_hint.as_deref(), Some("en-US"));
        assert!(storage.get(&submitted.media).await.is_err());
    }

    #[tokio::test]
    async fn test_failed_job_cleans_up() {
        let (stage, recognizer, storage) = stage(RecognitionScript::Fail {
            reason: "unsupported audio".to_string(),
        });

        let err = stage
            .transcribe_upload(vec![1, 2, 3], MediaFormat::Mp3, None)
            .await
            .unwrap_err();

        match err {
            PipelineError::RecognitionFailed(reason) => assert_eq!(reason, "unsupported audio"),
            other => panic!("unexpected error: {:?}", other),
        }
        let submitted = recognizer.last_request().unwrap();
        assert!(storage.get(&submitted.media).await.is_err());
    }

    #[tokio::test]
    async fn test_timeout_is_bounded_and_cleans_up() {
        let (stage, recognizer, storage) = stage(RecognitionScript::NeverFinish);
        let started = std::time::Instant::now();

        let err = stage
            .transcribe_upload(vec![1, 2, 3], MediaFormat::Wav, None)
            .await
            .unwrap_err();

        let elapsed = started.elapsed();
        assert!(matches!(err, PipelineError::RecognitionTimedOut { .. }));
        assert!(elapsed >= Duration::from_millis(300));
        assert!(elapsed < Duration::from_millis(300 + 10 + 300));

        let submitted = recognizer.last_request().unwrap();
        assert!(storage.get(&submitted.media).await.is_err());
    }

    #[tokio::test]
    async fn test_stored_source_is_kept() {
        let (stage, _recognizer, storage) = stage(RecognitionScript::Complete {
            transcript: "hola".to_string(),
            after_polls: 1,
        });
        let source = ObjectLocation::new("uploads", "clips/a.wav");
        storage.put(&source, vec![9, 9], "audio/wav").await.unwrap();

        let outcome = stage
            .transcribe_stored(&source, MediaFormat::Wav, Some("es-ES"))
            .await
            .unwrap();

        assert_eq!(outcome.transcript, "hola");
        assert!(storage.get(&source).await.is_ok());
    }

    #[tokio::test]
    async fn test_empty_transcript_is_valid() {
        let (stage, _, _) = stage(RecognitionScript::Complete {
            transcript: "   ".to_string(),
            after_polls: 1,
        });

        let outcome = stage
            .transcribe_upload(vec![1], MediaFormat::Wav, None)
            .await
            .unwrap();
        assert_eq!(outcome.transcript, "");
    }

    #[tokio::test]
    async fn test_missing_source_fails() {
        let (stage, recognizer, _) = stage(RecognitionScript::Complete {
            transcript: "x".to_string(),
            after_polls: 1,
        });

        let err = stage
            .transcribe_stored(
                &ObjectLocation::new("uploads", "nope.wav"),
                MediaFormat::Wav,
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::RecognitionFailed(_)));
        assert_eq!(recognizer.status_calls(), 0);
    }

    #[tokio::test]
    async fn test_invalid_location_rejected() {
        let (stage, recognizer, _) = stage(RecognitionScript::NeverFinish);
        let err = stage
            .transcribe_stored(&ObjectLocation::new("", "a.wav"), MediaFormat::Wav, None)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::ValidationError(_)));
        assert_eq!(recognizer.submit_calls(), 0);
    }

    #[test]
    fn test_in_progress_marks_job_running_once() {
        let mut job = TranscriptionJob::new(ObjectLocation::new("audio", "a.wav"), None);
        assert_eq!(job.status(), JobStatus::Submitted);

        mark_running(&mut job);
        assert_eq!(job.status(), JobStatus::Running);

        mark_running(&mut job);
        assert_eq!(job.status(), JobStatus::Running);
        assert!(job.complete().is_ok());
        assert_eq!(job.status(), JobStatus::Completed);
    }

    #[tokio::test]
    async fn test_completes_after_in_progress_reports() {
        let (stage, recognizer, _) = stage(RecognitionScript::Complete {
            transcript: "bonjour".to_string(),
            after_polls: 3,
        });

        let outcome = stage
            .transcribe_upload(vec![1, 2], MediaFormat::Wav, Some("fr-FR"))
            .await
            .unwrap();

        assert_eq!(outcome.transcript, "bonjour");
        assert_eq!(recognizer.status_calls(), 3);
    }

    /// 提交成功，但状态查询迟迟不返回
    struct StalledRecognizer {
        delay: Duration,
    }

    #[async_trait]
    impl SpeechRecognitionPort for StalledRecognizer {
        async fn submit_job(&self, request: &RecognitionJobRequest) -> Result<String, ProviderError> {
            Ok(request.job_name.clone())
        }

        async fn job_status(&self, _job_id: &str) -> Result<RecognitionJobReport, ProviderError> {
            tokio::time::sleep(self.delay).await;
            Ok(RecognitionJobReport::new(RecognitionState::InProgress))
        }
    }

    #[tokio::test]
    async fn test_stalled_status_call_times_out_and_cleans_up() {
        let storage = Arc::new(InMemoryObjectStorage::for_tests());
        let recognizer = Arc::new(StalledRecognizer {
            delay: Duration::from_millis(800),
        });
        let stage = TranscriptionStage::new(
            recognizer,
            storage.clone(),
            TranscriptionSettings {
                poll_interval: Duration::from_millis(20),
                timeout: Duration::from_millis(100),
                ..settings()
            },
        );
        let started = std::time::Instant::now();

        let err = stage
            .transcribe_upload(vec![1, 2, 3], MediaFormat::Wav, None)
            .await
            .unwrap_err();

        let elapsed = started.elapsed();
        assert!(matches!(err, PipelineError::RecognitionTimedOut { .. }));
        assert!(elapsed < Duration::from_millis(100 + 20 + 150));
        assert!(storage.is_empty());
    }
}
