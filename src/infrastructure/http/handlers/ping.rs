//! Ping / Health Handlers

use std::sync::Arc;

use axum::{extract::State, Json};
use serde::Serialize;

use crate::infrastructure::http::dto::ApiResponse;
use crate::infrastructure::http::state::AppState;

/// Ping 响应
#[derive(Serialize)]
pub struct PingResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Ping endpoint - 存活检查
pub async fn ping() -> Json<PingResponse> {
    Json(PingResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
pub struct HealthResponse {
    pub synthesis: bool,
}

/// 外部合成服务健康检查
pub async fn health(State(state): State<Arc<AppState>>) -> Json<ApiResponse<HealthResponse>> {
    let synthesis = state.synthesizer.health_check().await;
    if !synthesis {
        tracing::warn!("Synthesis provider health check failed");
    }
    Json(ApiResponse::success(HealthResponse { synthesis }))
}
