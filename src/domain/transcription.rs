//! Transcription Job - 批量语音识别任务状态机
//!
//! ```text
//! SUBMITTED → RUNNING → COMPLETED
//!                    ↘ FAILED
//! SUBMITTED / RUNNING → TIMED_OUT（超过截止时间）
//! ```
//!
//! 终态不可再迁移

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::object_location::ObjectLocation;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TranscriptionError {
    #[error("Invalid job transition: {from} -> {to}")]
    InvalidTransition { from: JobStatus, to: JobStatus },

    #[error("Malformed transcript document: {0}")]
    MalformedResult(String),
}

/// 任务状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobStatus {
    Submitted,
    Running,
    Completed,
    Failed,
    TimedOut,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::TimedOut)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Submitted => "SUBMITTED",
            Self::Running => "RUNNING",
            Self::Completed => "COMPLETED",
            Self::Failed => "FAILED",
            Self::TimedOut => "TIMED_OUT",
        }
    }

    fn can_transition_to(&self, next: JobStatus) -> bool {
        matches!(
            (self, next),
            (Self::Submitted, Self::Running)
                | (Self::Running, Self::Running)
                | (Self::Running, Self::Completed)
                | (Self::Running, Self::Failed)
                | (Self::Submitted, Self::TimedOut)
                | (Self::Running, Self::TimedOut)
        )
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 生成唯一任务名
pub fn new_job_name() -> String {
    format!("job-{}", Uuid::new_v4().simple())
}

/// 识别任务
#[derive(Debug, Clone)]
pub struct TranscriptionJob {
    job_name: String,
    source: ObjectLocation,
    language_hint: Option<String>,
    status: JobStatus,
    failure_reason: Option<String>,
    created_at: DateTime<Utc>,
}

impl TranscriptionJob {
    pub fn new(source: ObjectLocation, language_hint: Option<String>) -> Self {
        Self {
            job_name: new_job_name(),
            source,
            language_hint,
            status: JobStatus::Submitted,
            failure_reason: None,
            created_at: Utc::now(),
        }
    }

    pub fn job_name(&self) -> &str {
        &self.job_name
    }

    pub fn source(&self) -> &ObjectLocation {
        &self.source
    }

    pub fn language_hint(&self) -> Option<&str> {
        self.language_hint.as_deref()
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn failure_reason(&self) -> Option<&str> {
        self.failure_reason.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// 迁移到下一个状态
    pub fn advance(&mut self, next: JobStatus) -> Result<(), TranscriptionError> {
        if !self.status.can_transition_to(next) {
            return Err(TranscriptionError::InvalidTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    /// 服务报告已完成（可能未观察到 RUNNING）
    pub fn complete(&mut self) -> Result<(), TranscriptionError> {
        self.ensure_running()?;
        self.advance(JobStatus::Completed)
    }

    pub fn fail(&mut self, reason: impl Into<String>) -> Result<(), TranscriptionError> {
        self.ensure_running()?;
        self.advance(JobStatus::Failed)?;
        self.failure_reason = Some(reason.into());
        Ok(())
    }

    pub fn time_out(&mut self) -> Result<(), TranscriptionError> {
        self.advance(JobStatus::TimedOut)
    }

    fn ensure_running(&mut self) -> Result<(), TranscriptionError> {
        if self.status == JobStatus::Submitted {
            self.advance(JobStatus::Running)?;
        }
        Ok(())
    }
}

/// 任务输出目录 `{prefix}/{job}/`
pub fn output_prefix(prefix: &str, job_name: &str) -> String {
    format!("{}/{}/", prefix.trim_end_matches('/'), job_name)
}

/// 默认结果文档 key `{prefix}/{job}/{job}.json`
pub fn default_result_key(prefix: &str, job_name: &str) -> String {
    format!("{}{}.json", output_prefix(prefix, job_name), job_name)
}

#[derive(Debug, Deserialize)]
struct TranscriptDocument {
    results: TranscriptResults,
}

#[derive(Debug, Deserialize)]
struct TranscriptResults {
    #[serde(default)]
    transcripts: Vec<TranscriptEntry>,
}

#[derive(Debug, Deserialize)]
struct TranscriptEntry {
    #[serde(default)]
    transcript: String,
}

/// 解析结果文档，取第一条转写并去除首尾空白
///
/// 没有转写条目时返回空字符串（合法结果）
pub fn parse_transcript_document(data: &[u8]) -> Result<String, TranscriptionError> {
    let document: TranscriptDocument = serde_json::from_slice(data)
        .map_err(|e| TranscriptionError::MalformedResult(e.to_string()))?;

    Ok(document
        .results
        .transcripts
        .into_iter()
        .next()
        .map(|t| t.transcript.trim().to_string())
        .unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> TranscriptionJob {
        TranscriptionJob::new(ObjectLocation::new("bucket", "transcribe/a.wav"), None)
    }

    #[test]
    fn test_job_names_unique() {
        let a = new_job_name();
        let b = new_job_name();
        assert!(a.starts_with("job-"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_happy_path() {
        let mut job = job();
        assert_eq!(job.status(), JobStatus::Submitted);
        job.advance(JobStatus::Running).unwrap();
        job.advance(JobStatus::Running).unwrap();
        job.complete().unwrap();
        assert_eq!(job.status(), JobStatus::Completed);
        assert!(job.status().is_terminal());
    }

    #[test]
    fn test_complete_from_submitted() {
        let mut job = job();
        job.complete().unwrap();
        assert_eq!(job.status(), JobStatus::Completed);
    }

    #[test]
    fn test_failure_keeps_reason() {
        let mut job = job();
        job.fail("unsupported media").unwrap();
        assert_eq!(job.status(), JobStatus::Failed);
        assert_eq!(job.failure_reason(), Some("unsupported media"));
    }

    #[test]
    fn test_terminal_states_are_final() {
        let mut job = job();
        job.time_out().unwrap();
        assert_eq!(job.status(), JobStatus::TimedOut);
        assert!(job.advance(JobStatus::Running).is_err());
        assert!(job.complete().is_err());

        let mut done = self::job();
        done.complete().unwrap();
        assert_eq!(
            done.time_out(),
            Err(TranscriptionError::InvalidTransition {
                from: JobStatus::Completed,
                to: JobStatus::TimedOut,
            })
        );
    }

    #[test]
    fn test_result_keys() {
        assert_eq!(output_prefix("transcribe", "job-1"), "transcribe/job-1/");
        assert_eq!(
            default_result_key("transcribe/", "job-1"),
            "transcribe/job-1/job-1.json"
        );
    }

    #[test]
    fn test_parse_transcript() {
        let doc = br#"{"results":{"transcripts":[{"transcript":"  hello world "},{"transcript":"ignored"}]}}"#;
        assert_eq!(parse_transcript_document(doc).unwrap(), "hello world");
    }

    #[test]
    fn test_parse_empty_transcripts() {
        let doc = br#"{"results":{"transcripts":[]}}"#;
        assert_eq!(parse_transcript_document(doc).unwrap(), "");
    }

    #[test]
    fn test_parse_malformed() {
        assert!(parse_transcript_document(b"{}").is_err());
        assert!(parse_transcript_document(b"garbage").is_err());
    }
}
