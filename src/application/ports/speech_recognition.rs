//! Speech Recognition Port - 批量语音识别服务抽象
//!
//! 服务从对象存储读取音频，并把结果文档写回对象存储

use async_trait::async_trait;

use super::provider_error::ProviderError;
use crate::domain::{MediaFormat, ObjectLocation};

/// 提交识别任务
#[derive(Debug, Clone)]
pub struct RecognitionJobRequest {
    /// 唯一任务名
    pub job_name: String,
    /// 输入音频位置
    pub media: ObjectLocation,
    pub media_format: MediaFormat,
    /// 语言提示（区域代码）
    pub language_hint: Option<String>,
    /// 结果输出位置（bucket + key 前缀）
    pub output: ObjectLocation,
}

/// 服务端任务状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecognitionState {
    Queued,
    InProgress,
    Completed,
    Failed,
}

/// 任务状态报告
#[derive(Debug, Clone)]
pub struct RecognitionJobReport {
    pub state: RecognitionState,
    /// 结果文档位置（未报告时使用默认位置）
    pub result_location: Option<ObjectLocation>,
    pub failure_reason: Option<String>,
}

impl RecognitionJobReport {
    pub fn new(state: RecognitionState) -> Self {
        Self {
            state,
            result_location: None,
            failure_reason: None,
        }
    }
}

/// Speech Recognition Port
#[async_trait]
pub trait SpeechRecognitionPort: Send + Sync {
    /// 提交任务，返回服务端任务 ID
    async fn submit_job(&self, request: &RecognitionJobRequest) -> Result<String, ProviderError>;

    /// 查询任务状态
    async fn job_status(&self, job_id: &str) -> Result<RecognitionJobReport, ProviderError>;
}
