//! Speak Handlers
//!
//! 文本流水线与语音流水线（对象存储 / 直接上传）

use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    Json,
};

use crate::application::{SpeakOptions, SpeakTextCommand, SpeakVoiceCommand, VoiceSource};
use crate::domain::ObjectLocation;
use crate::infrastructure::http::dto::{
    non_blank, parse_gender, ApiResponse, SpeakResponse, SpeakTextRequest,
    SpeakVoiceStorageRequest,
};
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 文本 → 翻译 → 合成
pub async fn speak_text(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SpeakTextRequest>,
) -> Result<Json<ApiResponse<SpeakResponse>>, ApiError> {
    let command = SpeakTextCommand {
        text: req.text,
        source_language: non_blank(req.source_language),
        target_language: req.target_language,
        options: req.options.into(),
    };

    let result = state.queue.speak_text(command).await?;
    Ok(Json(ApiResponse::success(result.into())))
}

/// 对象存储中的录音 → 识别 → 翻译 → 合成
pub async fn speak_voice_storage(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SpeakVoiceStorageRequest>,
) -> Result<Json<ApiResponse<SpeakResponse>>, ApiError> {
    let command = SpeakVoiceCommand {
        source: VoiceSource::Stored {
            location: ObjectLocation::new(req.bucket, req.key),
            media_format: non_blank(req.media_format),
        },
        source_language: non_blank(req.source_language),
        target_language: req.target_language,
        options: req.options.into(),
    };

    let result = state.queue.speak_voice(command).await?;
    Ok(Json(ApiResponse::success(result.into())))
}

/// 上传的录音 → 识别 → 翻译 → 合成
///
/// multipart 字段：file（必填）、target_language（必填）、source_language、
/// media_format、gender、voice_id、require_enhanced、sample_rate_hz、style、
/// include_raw_timeline、include_transcript
pub async fn speak_voice(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<ApiResponse<SpeakResponse>>, ApiError> {
    let mut data: Option<Vec<u8>> = None;
    let mut file_name: Option<String> = None;
    let mut media_format: Option<String> = None;
    let mut source_language: Option<String> = None;
    let mut target_language: Option<String> = None;
    let mut options = SpeakOptions::default();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        ApiError::BadRequest(format!("Failed to read multipart field: {}", e))
    })? {
        let field_name = field.name().unwrap_or_default().to_string();

        if field_name == "file" {
            file_name = field.file_name().map(|s| s.to_string());
            let bytes = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(format!("Failed to read audio file: {}", e)))?;
            if bytes.len() > state.max_upload_bytes {
                return Err(ApiError::BadRequest(format!(
                    "audio file too large: {} bytes (max {})",
                    bytes.len(),
                    state.max_upload_bytes
                )));
            }
            data = Some(bytes.to_vec());
            continue;
        }

        let value = field.text().await.map_err(|e| {
            ApiError::BadRequest(format!("Failed to read field {}: {}", field_name, e))
        })?;
        let value = value.trim().to_string();

        match field_name.as_str() {
            "target_language" => target_language = Some(value),
            "source_language" => source_language = Some(value),
            "media_format" => media_format = Some(value),
            "gender" => options.gender = parse_gender(&value),
            "voice_id" => options.voice_id = Some(value),
            "style" => options.style = Some(value),
            "require_enhanced" => options.require_enhanced = Some(parse_flag(&field_name, &value)?),
            "include_raw_timeline" => options.include_raw_timeline = parse_flag(&field_name, &value)?,
            "include_transcript" => options.include_transcript = parse_flag(&field_name, &value)?,
            "sample_rate_hz" => {
                let rate = value.parse::<u32>().map_err(|_| {
                    ApiError::BadRequest(format!("invalid sample_rate_hz: {}", value))
                })?;
                options.sample_rate_hz = Some(rate);
            }
            _ => {
                tracing::debug!(field = %field_name, "Ignoring unknown multipart field");
            }
        }
    }

    let data = data.ok_or_else(|| ApiError::BadRequest("Missing audio file".to_string()))?;
    let target_language = non_blank(target_language)
        .ok_or_else(|| ApiError::BadRequest("Missing target_language".to_string()))?;
    options.voice_id = non_blank(options.voice_id);
    options.style = non_blank(options.style);

    tracing::info!(
        bytes = data.len(),
        file_name = ?file_name,
        target = %target_language,
        "Received voice upload"
    );

    let command = SpeakVoiceCommand {
        source: VoiceSource::Upload {
            data,
            file_name,
            media_format: non_blank(media_format),
        },
        source_language: non_blank(source_language),
        target_language,
        options,
    };

    let result = state.queue.speak_voice(command).await?;
    Ok(Json(ApiResponse::success(result.into())))
}

fn parse_flag(name: &str, value: &str) -> Result<bool, ApiError> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" | "" => Ok(false),
        _ => Err(ApiError::BadRequest(format!("invalid {}: {}", name, value))),
    }
}
