//! Fake Recognizer - 按脚本返回结果的识别服务
//!
//! 与真实服务一样从对象存储读取输入、把结果文档写回对象存储

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::application::ports::{
    ObjectStoragePort, ProviderError, RecognitionJobReport, RecognitionJobRequest,
    RecognitionState, SpeechRecognitionPort,
};
use crate::domain::ObjectLocation;

/// 任务脚本
#[derive(Debug, Clone)]
pub enum RecognitionScript {
    /// 第 `after_polls` 次查询时完成
    Complete { transcript: String, after_polls: usize },
    /// 第一次查询即失败
    Fail { reason: String },
    /// 永远处于进行中
    NeverFinish,
}

struct FakeJob {
    request: RecognitionJobRequest,
    polls: usize,
}

pub struct FakeRecognizer {
    storage: Arc<dyn ObjectStoragePort>,
    script: RecognitionScript,
    jobs: DashMap<String, FakeJob>,
    submit_calls: AtomicUsize,
    status_calls: AtomicUsize,
    last_request: Mutex<Option<RecognitionJobRequest>>,
}

impl FakeRecognizer {
    pub fn new(storage: Arc<dyn ObjectStoragePort>, script: RecognitionScript) -> Self {
        Self {
            storage,
            script,
            jobs: DashMap::new(),
            submit_calls: AtomicUsize::new(0),
            status_calls: AtomicUsize::new(0),
            last_request: Mutex::new(None),
        }
    }

    pub fn submit_calls(&self) -> usize {
        self.submit_calls.load(Ordering::SeqCst)
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<RecognitionJobRequest> {
        self.last_request.lock().ok().and_then(|r| r.clone())
    }

    async fn write_result(
        &self,
        request: &RecognitionJobRequest,
        transcript: &str,
    ) -> Result<ObjectLocation, ProviderError> {
        let location = ObjectLocation::new(
            request.output.bucket.clone(),
            format!("{}{}.json", request.output.key, request.job_name),
        );
        let document = json!({
            "jobName": request.job_name,
            "results": { "transcripts": [{ "transcript": transcript }] },
            "status": "COMPLETED",
        });

        self.storage
            .put(&location, document.to_string().into_bytes(), "application/json")
            .await
            .map_err(|e| ProviderError::service(500, e.to_string()))?;

        Ok(location)
    }
}

#[async_trait]
impl SpeechRecognitionPort for FakeRecognizer {
    async fn submit_job(&self, request: &RecognitionJobRequest) -> Result<String, ProviderError> {
        self.submit_calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_request.lock() {
            *last = Some(request.clone());
        }

        self.storage
            .get(&request.media)
            .await
            .map_err(|_| ProviderError::NotFound(format!("media not found: {}", request.media)))?;

        self.jobs.insert(
            request.job_name.clone(),
            FakeJob {
                request: request.clone(),
                polls: 0,
            },
        );

        Ok(request.job_name.clone())
    }

    async fn job_status(&self, job_id: &str) -> Result<RecognitionJobReport, ProviderError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);

        // 不跨 await 持有 DashMap 引用
        let (request, polls) = {
            let mut job = self
                .jobs
                .get_mut(job_id)
                .ok_or_else(|| ProviderError::NotFound(format!("job not found: {}", job_id)))?;
            job.polls += 1;
            (job.request.clone(), job.polls)
        };

        match &self.script {
            RecognitionScript::Complete {
                transcript,
                after_polls,
            } if polls >= *after_polls => {
                let location = self.write_result(&request, transcript).await?;
                Ok(RecognitionJobReport {
                    state: RecognitionState::Completed,
                    result_location: Some(location),
                    failure_reason: None,
                })
            }
            RecognitionScript::Complete { .. } | RecognitionScript::NeverFinish => {
                Ok(RecognitionJobReport::new(RecognitionState::InProgress))
            }
            RecognitionScript::Fail { reason } => Ok(RecognitionJobReport {
                state: RecognitionState::Failed,
                result_location: None,
                failure_reason: Some(reason.clone()),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::transcription::parse_transcript_document;
    use crate::domain::MediaFormat;
    use crate::infrastructure::memory::InMemoryObjectStorage;

    fn request(media: ObjectLocation) -> RecognitionJobRequest {
        RecognitionJobRequest {
            job_name: "job-1".to_string(),
            media,
            media_format: MediaFormat::Wav,
            language_hint: None,
            output: ObjectLocation::new("audio", "transcribe/job-1/"),
        }
    }

    #[tokio::test]
    async fn test_completes_after_scripted_polls() {
        let storage = Arc::new(InMemoryObjectStorage::for_tests());
        let media = ObjectLocation::new("audio", "in.wav");
        storage.put(&media, vec![1], "audio/wav").await.unwrap();

        let fake = FakeRecognizer::new(
            storage.clone(),
            RecognitionScript::Complete {
                transcript: "hello".to_string(),
                after_polls: 2,
            },
        );
        let job_id = fake.submit_job(&request(media)).await.unwrap();

        let first = fake.job_status(&job_id).await.unwrap();
        assert_eq!(first.state, RecognitionState::InProgress);

        let second = fake.job_status(&job_id).await.unwrap();
        assert_eq!(second.state, RecognitionState::Completed);

        let location = second.result_location.unwrap();
        assert_eq!(location.key, "transcribe/job-1/job-1.json");
        let doc = storage.get(&location).await.unwrap();
        assert_eq!(parse_transcript_document(&doc.data).unwrap(), "hello");
    }

    #[tokio::test]
    async fn test_missing_media_rejected() {
        let storage = Arc::new(InMemoryObjectStorage::for_tests());
        let fake = FakeRecognizer::new(storage, RecognitionScript::NeverFinish);

        let err = fake
            .submit_job(&request(ObjectLocation::new("audio", "missing.wav")))
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::NotFound(_)));
        assert_eq!(fake.submit_calls(), 1);
    }

    #[tokio::test]
    async fn test_unknown_job() {
        let storage = Arc::new(InMemoryObjectStorage::for_tests());
        let fake = FakeRecognizer::new(storage, RecognitionScript::NeverFinish);
        assert!(matches!(
            fake.job_status("nope").await,
            Err(ProviderError::NotFound(_))
        ));
    }
}
