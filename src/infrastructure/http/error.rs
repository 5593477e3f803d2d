//! HTTP Error Handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::application::{PipelineError, StorageError};

/// 统一错误响应格式
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub errno: i32,
    pub error: String,
    pub data: Option<()>,
}

impl ErrorResponse {
    pub fn new(errno: i32, error: impl Into<String>) -> Self {
        Self {
            errno,
            error: error.into(),
            data: None,
        }
    }
}

/// 错误码定义
pub mod errno {
    pub const BAD_REQUEST: i32 = 400;
    pub const FORBIDDEN: i32 = 403;
    pub const NOT_FOUND: i32 = 404;
    pub const INTERNAL_ERROR: i32 = 500;
    pub const SERVICE_UNAVAILABLE: i32 = 503;
    pub const GATEWAY_TIMEOUT: i32 = 504;
}

/// API 错误
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Forbidden(String),
    Internal(String),
    ServiceUnavailable(String),
    GatewayTimeout(String),
}

impl ApiError {
    pub fn errno(&self) -> i32 {
        match self {
            ApiError::NotFound(_) => errno::NOT_FOUND,
            ApiError::BadRequest(_) => errno::BAD_REQUEST,
            ApiError::Forbidden(_) => errno::FORBIDDEN,
            ApiError::Internal(_) => errno::INTERNAL_ERROR,
            ApiError::ServiceUnavailable(_) => errno::SERVICE_UNAVAILABLE,
            ApiError::GatewayTimeout(_) => errno::GATEWAY_TIMEOUT,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = self.errno();
        let response = match self {
            ApiError::NotFound(msg) => {
                tracing::warn!(errno = code, error = %msg, "Resource not found");
                ErrorResponse::new(code, msg)
            }
            ApiError::BadRequest(msg) => {
                tracing::warn!(errno = code, error = %msg, "Bad request");
                ErrorResponse::new(code, msg)
            }
            ApiError::Forbidden(msg) => {
                tracing::warn!(errno = code, error = %msg, "Forbidden");
                ErrorResponse::new(code, msg)
            }
            ApiError::Internal(msg) => {
                tracing::error!(errno = code, error = %msg, "Internal server error");
                ErrorResponse::new(code, msg)
            }
            ApiError::ServiceUnavailable(msg) => {
                tracing::error!(errno = code, error = %msg, "Service unavailable");
                ErrorResponse::new(code, msg)
            }
            ApiError::GatewayTimeout(msg) => {
                tracing::error!(errno = code, error = %msg, "Gateway timeout");
                ErrorResponse::new(code, msg)
            }
        };

        (StatusCode::OK, Json(response)).into_response()
    }
}

/// 流水线错误只返回带阶段标签的摘要，细节写日志
impl From<PipelineError> for ApiError {
    fn from(e: PipelineError) -> Self {
        let stage = e.stage();
        let message = e.public_message();

        match e {
            PipelineError::ValidationError(_) => ApiError::BadRequest(message),
            PipelineError::RecognitionTimedOut { .. } => {
                tracing::error!(stage = %stage, error = %e, "Pipeline failed");
                ApiError::GatewayTimeout(message)
            }
            PipelineError::StorageFailed(_) => {
                tracing::error!(stage = %stage, error = %e, "Pipeline failed");
                ApiError::Internal(message)
            }
            _ => {
                tracing::error!(stage = %stage, error = %e, "Pipeline failed");
                ApiError::ServiceUnavailable(message)
            }
        }
    }
}

impl From<StorageError> for ApiError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::NotFound(msg) => ApiError::NotFound(msg),
            StorageError::InvalidLocation(msg) => ApiError::BadRequest(msg),
            _ => ApiError::Internal(e.to_string()),
        }
    }
}
