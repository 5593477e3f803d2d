//! HTTP Middleware
//!
//! 请求耗时与状态码日志

use std::time::Instant;

use axum::{extract::Request, middleware::Next, response::Response};

/// 超过该耗时的请求记为慢请求
const SLOW_REQUEST_MS: u128 = 15_000;

/// 请求日志中间件
///
/// 4xx/5xx 状态码与慢请求记录日志。
/// 业务错误（errno != 0）在 ApiError::into_response() 中记录
pub async fn request_logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let started = Instant::now();

    let response = next.run(request).await;
    let status = response.status();
    let elapsed_ms = started.elapsed().as_millis();

    if status.is_server_error() {
        tracing::error!(
            method = %method,
            uri = %uri,
            status = status.as_u16(),
            elapsed_ms = elapsed_ms as u64,
            "HTTP server error"
        );
    } else if status.is_client_error() {
        tracing::warn!(
            method = %method,
            uri = %uri,
            status = status.as_u16(),
            elapsed_ms = elapsed_ms as u64,
            "HTTP client error"
        );
    } else if elapsed_ms >= SLOW_REQUEST_MS {
        tracing::warn!(
            method = %method,
            uri = %uri,
            elapsed_ms = elapsed_ms as u64,
            "Slow HTTP request"
        );
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{Request as HttpRequest, StatusCode},
        routing::get,
        Router,
    };
    use tower::util::ServiceExt;

    fn router() -> Router {
        Router::new()
            .route("/ok", get(|| async { "OK" }))
            .route("/missing", get(|| async { StatusCode::NOT_FOUND }))
            .route("/boom", get(|| async { StatusCode::BAD_GATEWAY }))
            .layer(axum::middleware::from_fn(request_logging_middleware))
    }

    async fn status_of(uri: &str) -> StatusCode {
        let request = HttpRequest::builder().uri(uri).body(Body::empty()).unwrap();
        router().oneshot(request).await.unwrap().status()
    }

    #[tokio::test]
    async fn test_status_passes_through() {
        assert_eq!(status_of("/ok").await, StatusCode::OK);
        assert_eq!(status_of("/missing").await, StatusCode::NOT_FOUND);
        assert_eq!(status_of("/boom").await, StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_unknown_route() {
        assert_eq!(status_of("/nowhere").await, StatusCode::NOT_FOUND);
    }
}
