//! Object Download Handler
//!
//! 校验预签名 URL 后返回对象内容

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::Response,
};

use crate::domain::ObjectLocation;
use crate::infrastructure::http::dto::SignedObjectParams;
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;
use crate::infrastructure::persistence::SignatureError;

pub async fn get_object(
    State(state): State<Arc<AppState>>,
    Path((bucket, key)): Path<(String, String)>,
    Query(params): Query<SignedObjectParams>,
) -> Result<Response, ApiError> {
    let location = ObjectLocation::new(bucket, key.trim_start_matches('/'));
    location.validate().map_err(ApiError::BadRequest)?;

    state
        .signer
        .verify(&location, params.expires, &params.sig)
        .map_err(|e| match e {
            SignatureError::Expired => ApiError::Forbidden("download link expired".to_string()),
            SignatureError::Mismatch => ApiError::Forbidden("invalid signature".to_string()),
        })?;

    let object = state.storage.get(&location).await?;

    tracing::debug!(location = %location, bytes = object.data.len(), "Serving object");

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, object.content_type)
        .header(header::CONTENT_LENGTH, object.data.len())
        .header(header::ETAG, format!("\"{}\"", object.etag))
        .body(Body::from(object.data))
        .map_err(|e| ApiError::Internal(format!("Failed to build response: {}", e)))
}
