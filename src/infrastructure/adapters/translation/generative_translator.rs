//! Generative Translator - 通过 OpenAI 兼容的 chat/completions 接口翻译
//!
//! 支持风格提示（如 "formal"、"casual"），短语翻译服务不支持

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::application::ports::{ProviderError, TranslationPort, TranslationRequest, AUTO_SOURCE};
use crate::infrastructure::adapters::http_client::ProviderHttpClient;

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    #[serde(default)]
    content: String,
}

pub struct GenerativeTranslator {
    http: ProviderHttpClient,
    model: String,
}

impl GenerativeTranslator {
    pub fn new(http: ProviderHttpClient, model: impl Into<String>) -> Self {
        Self {
            http,
            model: model.into(),
        }
    }

    fn system_prompt(request: &TranslationRequest) -> String {
        let source = if request.source == AUTO_SOURCE {
            "the detected source language".to_string()
        } else {
            format!("language code '{}'", request.source)
        };

        let mut prompt = format!(
            "Translate the user's message from {} into language code '{}'. \
             Reply with the translation only, without quotes or explanations.",
            source, request.target
        );
        if let Some(style) = &request.style {
            prompt.push_str(&format!(" Use a {} style.", style));
        }
        prompt
    }
}

#[async_trait]
impl TranslationPort for GenerativeTranslator {
    async fn translate(&self, request: &TranslationRequest) -> Result<String, ProviderError> {
        let body = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: Self::system_prompt(request),
                },
                ChatMessage {
                    role: "user",
                    content: request.text.clone(),
                },
            ],
            temperature: 0.2,
        };

        let response: ChatResponse = self.http.post_json("/chat/completions", &body).await?;
        let text = response
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ProviderError::InvalidResponse("empty completion".to_string()))?;

        tracing::debug!(
            model = %self.model,
            target = %request.target,
            style = ?request.style,
            "Generative translation completed"
        );

        Ok(text)
    }
}
