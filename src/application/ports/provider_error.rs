//! Provider Error - 外部 AI 服务的统一错误

use thiserror::Error;

/// 外部服务错误
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProviderError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Service error (HTTP {status}): {message}")]
    ServiceError { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// 服务不接受请求的质量等级
    #[error("Quality tier rejected: {0}")]
    TierRejected(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl ProviderError {
    pub fn service(status: u16, message: impl Into<String>) -> Self {
        Self::ServiceError {
            status,
            message: message.into(),
        }
    }

    /// 是否值得重试（网络错误、超时、5xx、429）
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::NetworkError(_) | Self::Timeout => true,
            Self::ServiceError { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}
