//! Phrase Translator - 调用短语翻译服务
//!
//! POST /v1/translate {text, source_language, target_language} → {translated_text}

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::application::ports::{ProviderError, TranslationPort, TranslationRequest};
use crate::infrastructure::adapters::http_client::ProviderHttpClient;

#[derive(Debug, Serialize)]
struct TranslateBody<'a> {
    text: &'a str,
    source_language: &'a str,
    target_language: &'a str,
}

#[derive(Debug, Deserialize)]
struct TranslateResponse {
    translated_text: String,
}

pub struct PhraseTranslator {
    http: ProviderHttpClient,
}

impl PhraseTranslator {
    pub fn new(http: ProviderHttpClient) -> Self {
        Self { http }
    }
}

#[async_trait]
impl TranslationPort for PhraseTranslator {
    async fn translate(&self, request: &TranslationRequest) -> Result<String, ProviderError> {
        let body = TranslateBody {
            text: &request.text,
            source_language: &request.source,
            target_language: &request.target,
        };

        let response: TranslateResponse = self.http.post_json("/v1/translate", &body).await?;

        tracing::debug!(
            source = %request.source,
            target = %request.target,
            chars = response.translated_text.chars().count(),
            "Phrase translation completed"
        );

        Ok(response.translated_text)
    }
}
