//! Voice Handlers
//!
//! 音色目录、支持语言与口型映射查询

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};

use crate::application::{GetVisemeMap, ListLanguages, ListVoices};
use crate::infrastructure::http::dto::{
    ApiResponse, LanguageListResponse, ListVoicesParams, VisemeMapDto, VoiceDto,
    VoiceListResponse,
};
use crate::infrastructure::http::state::AppState;

/// 列出音色，可按语言与 enhanced 等级过滤
pub async fn list_voices(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListVoicesParams>,
) -> Json<ApiResponse<VoiceListResponse>> {
    let query = ListVoices {
        language: params.language,
        require_enhanced: params.enhanced.unwrap_or(false),
    };

    let voices: Vec<VoiceDto> = state
        .list_voices_handler
        .handle(query)
        .await
        .into_iter()
        .map(Into::into)
        .collect();
    let total = voices.len();

    Json(ApiResponse::success(VoiceListResponse { voices, total }))
}

/// 目录中出现的语言及性别覆盖情况
pub async fn list_languages(
    State(state): State<Arc<AppState>>,
) -> Json<ApiResponse<LanguageListResponse>> {
    let languages = state
        .list_languages_handler
        .handle(ListLanguages)
        .await
        .into_iter()
        .map(Into::into)
        .collect();

    Json(ApiResponse::success(LanguageListResponse { languages }))
}

pub async fn get_viseme_map(State(state): State<Arc<AppState>>) -> Json<ApiResponse<VisemeMapDto>> {
    let map = state.viseme_map_handler.handle(GetVisemeMap);
    Json(ApiResponse::success(map.into()))
}
