//! Provider HTTP Client - 外部 AI 服务共用的 HTTP 客户端
//!
//! - Bearer 认证（可选）
//! - 请求超时
//! - 可重试错误按指数退避重试：base, 2*base, 4*base ...

use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::time::Duration;

use crate::application::ports::ProviderError;

/// 服务用来表示等级不支持的错误码
const TIER_NOT_SUPPORTED: &str = "tier_not_supported";

/// HTTP 客户端配置
#[derive(Debug, Clone)]
pub struct ProviderHttpConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub max_retries: u32,
    /// 首次重试前的等待时间
    pub backoff_base: Duration,
}

impl Default for ProviderHttpConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:9000".to_string(),
            api_key: None,
            timeout: Duration::from_secs(30),
            max_retries: 2,
            backoff_base: Duration::from_secs(1),
        }
    }
}

impl ProviderHttpConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        self.api_key = api_key.filter(|k| !k.trim().is_empty());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }
}

/// 服务返回的错误体
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// 外部服务 HTTP 客户端
pub struct ProviderHttpClient {
    client: Client,
    config: ProviderHttpConfig,
}

impl ProviderHttpClient {
    pub fn new(config: ProviderHttpConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ProviderError::NetworkError(e.to_string()))?;

        Ok(Self { client, config })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    /// GET 并解析 JSON
    pub async fn get_json<R>(&self, path: &str, query: &[(&str, &str)]) -> Result<R, ProviderError>
    where
        R: DeserializeOwned,
    {
        let url = self.url(path);
        let response = self
            .execute(|| self.client.get(&url).query(query))
            .await?;
        Self::read_json(response).await
    }

    /// POST JSON 并解析 JSON
    pub async fn post_json<T, R>(&self, path: &str, body: &T) -> Result<R, ProviderError>
    where
        T: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = self.url(path);
        let response = self.execute(|| self.client.post(&url).json(body)).await?;
        Self::read_json(response).await
    }

    /// POST JSON，返回原始字节与 Content-Type
    pub async fn post_bytes<T>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<(Vec<u8>, Option<String>), ProviderError>
    where
        T: Serialize + ?Sized,
    {
        let url = self.url(path);
        let response = self.execute(|| self.client.post(&url).json(body)).await?;

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("Failed to read body: {}", e)))?
            .to_vec();

        Ok((bytes, content_type))
    }

    /// 探测服务是否可用
    pub async fn health(&self, path: &str) -> bool {
        match self
            .client
            .get(self.url(path))
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    /// 发送请求，可重试错误按指数退避重试
    async fn execute<F>(&self, build: F) -> Result<Response, ProviderError>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut last_err = None;

        for attempt in 0..=self.config.max_retries {
            if attempt > 0 {
                let backoff = self.config.backoff_base * (1u32 << (attempt - 1).min(16));
                tokio::time::sleep(backoff).await;
            }

            match self.send_once(&build).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    tracing::warn!(
                        attempt = attempt + 1,
                        max_retries = self.config.max_retries,
                        error = %e,
                        "Provider request failed, retrying"
                    );
                    last_err = Some(e);
                }
                Err(e) => return Err(e),
            }
        }

        Err(last_err.unwrap_or_else(|| ProviderError::NetworkError("max retries exceeded".to_string())))
    }

    async fn send_once<F>(&self, build: &F) -> Result<Response, ProviderError>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut request = build();
        if let Some(api_key) = &self.config.api_key {
            request = request.bearer_auth(api_key);
        }

        let response = request.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        Err(classify_failure(status, &body))
    }

    async fn read_json<R: DeserializeOwned>(response: Response) -> Result<R, ProviderError> {
        let body = response
            .bytes()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("Failed to read body: {}", e)))?;
        serde_json::from_slice(&body).map_err(|e| ProviderError::InvalidResponse(e.to_string()))
    }
}

fn map_reqwest_error(e: reqwest::Error) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout
    } else if e.is_connect() {
        ProviderError::NetworkError(format!("Cannot connect to provider: {}", e))
    } else {
        ProviderError::NetworkError(e.to_string())
    }
}

/// 将非 2xx 响应映射为 ProviderError
fn classify_failure(status: StatusCode, body: &str) -> ProviderError {
    let parsed: Option<ErrorBody> = serde_json::from_str(body).ok();
    let message = parsed
        .as_ref()
        .and_then(|b| b.message.clone())
        .unwrap_or_else(|| body.to_string());

    let tier_rejected = parsed
        .as_ref()
        .and_then(|b| b.code.as_deref())
        .is_some_and(|code| code == TIER_NOT_SUPPORTED);

    match status {
        StatusCode::CONFLICT | StatusCode::UNPROCESSABLE_ENTITY if tier_rejected => {
            ProviderError::TierRejected(message)
        }
        StatusCode::NOT_FOUND => ProviderError::NotFound(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => ProviderError::Timeout,
        _ => ProviderError::service(status.as_u16(), message),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joining() {
        let client = ProviderHttpClient::new(ProviderHttpConfig::new("http://gw:9000/")).unwrap();
        assert_eq!(client.url("/v1/speech"), "http://gw:9000/v1/speech");
        assert_eq!(client.url("v1/voices"), "http://gw:9000/v1/voices");
    }

    #[test]
    fn test_blank_api_key_is_ignored() {
        let config = ProviderHttpConfig::new("http://gw").with_api_key(Some("  ".into()));
        assert!(config.api_key.is_none());
    }

    #[test]
    fn test_classify_tier_rejection() {
        let body = r#"{"code":"tier_not_supported","message":"neural unavailable"}"#;
        assert_eq!(
            classify_failure(StatusCode::UNPROCESSABLE_ENTITY, body),
            ProviderError::TierRejected("neural unavailable".into())
        );
        assert_eq!(
            classify_failure(StatusCode::CONFLICT, body),
            ProviderError::TierRejected("neural unavailable".into())
        );
    }

    #[test]
    fn test_classify_other_failures() {
        assert_eq!(
            classify_failure(StatusCode::NOT_FOUND, "no such job"),
            ProviderError::NotFound("no such job".into())
        );
        assert_eq!(
            classify_failure(StatusCode::UNPROCESSABLE_ENTITY, r#"{"code":"bad_text"}"#),
            ProviderError::service(422, r#"{"code":"bad_text"}"#)
        );
        assert!(classify_failure(StatusCode::BAD_GATEWAY, "").is_retryable());
        assert_eq!(
            classify_failure(StatusCode::GATEWAY_TIMEOUT, ""),
            ProviderError::Timeout
        );
    }

    #[tokio::test]
    async fn test_unreachable_provider_exhausts_retries() {
        let mut config = ProviderHttpConfig::new("http://127.0.0.1:1")
            .with_timeout(Duration::from_millis(200))
            .with_max_retries(1);
        config.backoff_base = Duration::from_millis(1);
        let client = ProviderHttpClient::new(config).unwrap();

        let err = client
            .get_json::<serde_json::Value>("/v1/voices", &[])
            .await
            .unwrap_err();
        assert!(err.is_retryable());
    }
}
