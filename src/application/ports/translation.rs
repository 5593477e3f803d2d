//! Translation Port - 文本翻译服务抽象

use async_trait::async_trait;

use super::provider_error::ProviderError;

/// 源语言未知时使用的代码
pub const AUTO_SOURCE: &str = "auto";

/// 翻译请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationRequest {
    pub text: String,
    /// 源语言代码或 "auto"
    pub source: String,
    pub target: String,
    /// 风格提示（仅生成式翻译使用）
    pub style: Option<String>,
}

/// Translation Port
#[async_trait]
pub trait TranslationPort: Send + Sync {
    async fn translate(&self, request: &TranslationRequest) -> Result<String, ProviderError>;
}
