//! HTTP Routes
//!
//! API Endpoints:
//! - /api/ping                      GET   存活检查
//! - /api/health                    GET   外部合成服务健康检查
//! - /api/tts/speak/text            POST  文本 → 翻译 → 合成
//! - /api/tts/speak/voice-storage   POST  存储中的录音 → 识别 → 翻译 → 合成
//! - /api/tts/speak/voice           POST  上传录音（multipart）
//! - /api/tts/viseme-map            GET   口型映射与过渡参数
//! - /api/voice/list                GET   音色列表（?language=&enhanced=）
//! - /api/voice/languages           GET   支持的语言
//! - /api/objects/:bucket/*key      GET   预签名下载（?expires=&sig=）

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new().nest("/api", api_routes())
}

fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ping", get(handlers::ping))
        .route("/health", get(handlers::health))
        .nest("/tts", tts_routes())
        .nest("/voice", voice_routes())
        .route("/objects/:bucket/*key", get(handlers::get_object))
}

/// TTS 路由
fn tts_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/speak/text", post(handlers::speak_text))
        .route("/speak/voice-storage", post(handlers::speak_voice_storage))
        .route("/speak/voice", post(handlers::speak_voice))
        .route("/viseme-map", get(handlers::get_viseme_map))
}

/// Voice 路由
fn voice_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/list", get(handlers::list_voices))
        .route("/languages", get(handlers::list_languages))
}
