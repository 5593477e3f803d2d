//! 应用层错误定义
//!
//! 流水线的各阶段失败都会终止整个流水线，对外只暴露带阶段标签的摘要，
//! 外部服务的详细错误只写日志

use serde::Serialize;
use thiserror::Error;

use crate::application::ports::StorageError;

/// 流水线阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Validation,
    Transcription,
    Translation,
    Synthesis,
    Storage,
    Dispatch,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Transcription => "transcription",
            Self::Translation => "translation",
            Self::Synthesis => "synthesis",
            Self::Storage => "storage",
            Self::Dispatch => "dispatch",
        }
    }
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 流水线错误
#[derive(Debug, Error)]
pub enum PipelineError {
    /// 请求参数错误
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// 翻译服务失败
    #[error("Translation unavailable: {0}")]
    TranslationUnavailable(String),

    /// 识别失败（包括语音流水线中的空转写）
    #[error("Recognition failed: {0}")]
    RecognitionFailed(String),

    /// 识别超时
    #[error("Recognition timed out: job {job_name} after {waited_ms}ms")]
    RecognitionTimedOut { job_name: String, waited_ms: u64 },

    /// 合成失败
    #[error("Synthesis failed: {0}")]
    SynthesisFailed(String),

    /// 对象存储失败
    #[error("Storage failed: {0}")]
    StorageFailed(String),

    /// Worker 队列关闭或已满
    #[error("Pipeline unavailable: {0}")]
    Unavailable(String),
}

impl PipelineError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError(message.into())
    }

    pub fn stage(&self) -> PipelineStage {
        match self {
            Self::ValidationError(_) => PipelineStage::Validation,
            Self::TranslationUnavailable(_) => PipelineStage::Translation,
            Self::RecognitionFailed(_) | Self::RecognitionTimedOut { .. } => {
                PipelineStage::Transcription
            }
            Self::SynthesisFailed(_) => PipelineStage::Synthesis,
            Self::StorageFailed(_) => PipelineStage::Storage,
            Self::Unavailable(_) => PipelineStage::Dispatch,
        }
    }

    /// 对外暴露的错误摘要，不含外部服务细节
    pub fn public_message(&self) -> String {
        match self {
            Self::ValidationError(msg) => msg.clone(),
            Self::TranslationUnavailable(_) => "translation stage failed".to_string(),
            Self::RecognitionFailed(_) => "transcription stage failed".to_string(),
            Self::RecognitionTimedOut { .. } => "transcription stage timed out".to_string(),
            Self::SynthesisFailed(_) => "synthesis stage failed".to_string(),
            Self::StorageFailed(_) => "storage stage failed".to_string(),
            Self::Unavailable(_) => "pipeline is unavailable, retry later".to_string(),
        }
    }
}

impl From<StorageError> for PipelineError {
    fn from(err: StorageError) -> Self {
        Self::StorageFailed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_tags() {
        assert_eq!(
            PipelineError::validation("text too long").stage(),
            PipelineStage::Validation
        );
        assert_eq!(
            PipelineError::RecognitionTimedOut {
                job_name: "job-1".into(),
                waited_ms: 60_000,
            }
            .stage(),
            PipelineStage::Transcription
        );
        assert_eq!(
            PipelineError::from(StorageError::NotFound("x".into())).stage(),
            PipelineStage::Storage
        );
    }

    #[test]
    fn test_public_message_hides_provider_detail() {
        let err = PipelineError::SynthesisFailed("HTTP 500: secret upstream trace".into());
        assert_eq!(err.public_message(), "synthesis stage failed");
        assert!(err.to_string().contains("secret upstream trace"));
    }

    #[test]
    fn test_validation_message_is_public() {
        let err = PipelineError::validation("text exceeds 500 characters");
        assert_eq!(err.public_message(), "text exceeds 500 characters");
    }
}
