//! HTTP Recognizer - 调用批量语音识别网关
//!
//! 网关 API:
//! POST /v1/transcription-jobs       → {"job_id": "..."}
//! GET  /v1/transcription-jobs/{id}  → {"status": "...", "transcript_location"?, "failure_reason"?}

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::application::ports::{
    ProviderError, RecognitionJobReport, RecognitionJobRequest, RecognitionState,
    SpeechRecognitionPort,
};
use crate::domain::ObjectLocation;
use crate::infrastructure::adapters::http_client::ProviderHttpClient;

#[derive(Debug, Serialize)]
struct SubmitBody<'a> {
    job_name: &'a str,
    media_uri: String,
    media_format: &'a str,
    /// 没有语言提示时由服务自动识别语言
    #[serde(skip_serializing_if = "Option::is_none")]
    language_code: Option<&'a str>,
    identify_language: bool,
    output_bucket: &'a str,
    output_key: &'a str,
}

#[derive(Debug, Deserialize)]
struct SubmitResponse {
    job_id: String,
}

#[derive(Debug, Deserialize)]
struct LocationDto {
    bucket: String,
    key: String,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    status: String,
    #[serde(default)]
    transcript_location: Option<LocationDto>,
    #[serde(default)]
    failure_reason: Option<String>,
}

fn parse_state(status: &str) -> Result<RecognitionState, ProviderError> {
    match status.to_ascii_uppercase().as_str() {
        "QUEUED" | "SUBMITTED" => Ok(RecognitionState::Queued),
        "IN_PROGRESS" | "RUNNING" => Ok(RecognitionState::InProgress),
        "COMPLETED" => Ok(RecognitionState::Completed),
        "FAILED" => Ok(RecognitionState::Failed),
        other => Err(ProviderError::InvalidResponse(format!(
            "unknown job status: {}",
            other
        ))),
    }
}

pub struct HttpRecognizer {
    http: ProviderHttpClient,
}

impl HttpRecognizer {
    pub fn new(http: ProviderHttpClient) -> Self {
        Self { http }
    }
}

#[async_trait]
impl SpeechRecognitionPort for HttpRecognizer {
    async fn submit_job(&self, request: &RecognitionJobRequest) -> Result<String, ProviderError> {
        let body = SubmitBody {
            job_name: &request.job_name,
            media_uri: request.media.to_string(),
            media_format: request.media_format.as_str(),
            language_code: request.language_hint.as_deref(),
            identify_language: request.language_hint.is_none(),
            output_bucket: &request.output.bucket,
            output_key: &request.output.key,
        };

        let response: SubmitResponse = self.http.post_json("/v1/transcription-jobs", &body).await?;
        Ok(response.job_id)
    }

    async fn job_status(&self, job_id: &str) -> Result<RecognitionJobReport, ProviderError> {
        let path = format!("/v1/transcription-jobs/{}", job_id);
        let response: StatusResponse = self.http.get_json(&path, &[]).await?;

        Ok(RecognitionJobReport {
            state: parse_state(&response.status)?,
            result_location: response
                .transcript_location
                .map(|l| ObjectLocation::new(l.bucket, l.key)),
            failure_reason: response.failure_reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MediaFormat;

    #[test]
    fn test_parse_state() {
        assert_eq!(parse_state("IN_PROGRESS").unwrap(), RecognitionState::InProgress);
        assert_eq!(parse_state("completed").unwrap(), RecognitionState::Completed);
        assert!(parse_state("PAUSED").is_err());
    }

    #[test]
    fn test_submit_body_without_hint_identifies_language() {
        let request = RecognitionJobRequest {
            job_name: "job-1".into(),
            media: ObjectLocation::new("audio", "transcribe/a.mp3"),
            media_format: MediaFormat::Mp3,
            language_hint: None,
            output: ObjectLocation::new("audio", "transcribe/job-1/"),
        };
        let body = SubmitBody {
            job_name: &request.job_name,
            media_uri: request.media.to_string(),
            media_format: request.media_format.as_str(),
            language_code: request.language_hint.as_deref(),
            identify_language: request.language_hint.is_none(),
            output_bucket: &request.output.bucket,
            output_key: &request.output.key,
        };
        let value = serde_json::to_value(&body).unwrap();
        assert_eq!(value["identify_language"], true);
        assert!(value.get("language_code").is_none());
        assert_eq!(value["media_uri"], "store://audio/transcribe/a.mp3");
    }

    #[test]
    fn test_status_response() {
        let json = r#"{"status":"COMPLETED","transcript_location":{"bucket":"b","key":"k.json"}}"#;
        let response: StatusResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.transcript_location.unwrap().key, "k.json");
    }
}
