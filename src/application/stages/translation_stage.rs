//! Translation Stage - 翻译阶段
//!
//! 跳过策略：
//! - 空文本直接返回，不调用服务
//! - 目标语言不可翻译时原样返回
//! - 源语言与目标语言相同时原样返回

use std::sync::Arc;

use crate::application::error::PipelineError;
use crate::application::ports::{TranslationPort, TranslationRequest, AUTO_SOURCE};
use crate::domain::language::{is_translatable, to_translation_code};

pub struct TranslationStage {
    translator: Arc<dyn TranslationPort>,
}

impl TranslationStage {
    pub fn new(translator: Arc<dyn TranslationPort>) -> Self {
        Self { translator }
    }

    /// 翻译文本
    ///
    /// `source_locale` / `target_locale` 为区域代码（如 "en-US"）
    pub async fn translate(
        &self,
        text: &str,
        source_locale: Option<&str>,
        target_locale: &str,
        style: Option<&str>,
    ) -> Result<String, PipelineError> {
        if text.trim().is_empty() {
            return Ok(text.to_string());
        }

        let target = match to_translation_code(Some(target_locale)) {
            Some(code) if is_translatable(code) => code,
            _ => {
                tracing::debug!(
                    target_locale = %target_locale,
                    "Target language not translatable, passing text through"
                );
                return Ok(text.to_string());
            }
        };

        let source = to_translation_code(source_locale);
        if source == Some(target) {
            return Ok(text.to_string());
        }

        let request = TranslationRequest {
            text: text.to_string(),
            source: source.unwrap_or(AUTO_SOURCE).to_string(),
            target: target.to_string(),
            style: style
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        };

        match self.translator.translate(&request).await {
            Ok(translated) => {
                tracing::debug!(
                    source = %request.source,
                    target = %request.target,
                    input_chars = text.chars().count(),
                    output_chars = translated.chars().count(),
                    "Text translated"
                );
                Ok(translated)
            }
            Err(e) => {
                tracing::warn!(
                    source = %request.source,
                    target = %request.target,
                    error = %e,
                    "Translation provider failed"
                );
                Err(PipelineError::TranslationUnavailable(e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::adapters::FakeTranslator;

    fn stage() -> (TranslationStage, Arc<FakeTranslator>) {
        let translator = Arc::new(FakeTranslator::new());
        (TranslationStage::new(translator.clone()), translator)
    }

    #[tokio::test]
    async fn test_empty_text_skips_provider() {
        let (stage, translator) = stage();
        let out = stage.translate("", Some("en-US"), "fr-FR", None).await.unwrap();
        assert_eq!(out, "");
        assert_eq!(translator.calls(), 0);
    }

    #[tokio::test]
    async fn test_unsupported_target_returns_input() {
        let (stage, translator) = stage();
        let out = stage
            .translate("hello", Some("en-US"), "yue-HK", None)
            .await
            .unwrap();
        assert_eq!(out, "hello");

        let out = stage.translate("hello", None, "xx-XX", None).await.unwrap();
        assert_eq!(out, "hello");
        assert_eq!(translator.calls(), 0);
    }

    #[tokio::test]
    async fn test_same_language_skips_provider() {
        let (stage, translator) = stage();
        let out = stage
            .translate("Good morning", Some("en-US"), "en-GB", None)
            .await
            .unwrap();
        assert_eq!(out, "Good morning");
        assert_eq!(translator.calls(), 0);
    }

    #[tokio::test]
    async fn test_calls_provider_with_codes() {
        let (stage, translator) = stage();
        let out = stage
            .translate("Good morning", None, "fr-FR", Some("  formal "))
            .await
            .unwrap();
        assert_eq!(out, "[fr] Good morning");

        let request = translator.last_request().unwrap();
        assert_eq!(request.source, "auto");
        assert_eq!(request.target, "fr");
        assert_eq!(request.style.as_deref(), Some("formal"));
    }

    #[tokio::test]
    async fn test_provider_failure_maps_to_unavailable() {
        let (stage, translator) = stage();
        translator.fail(true);
        let err = stage
            .translate("Good morning", Some("en-US"), "de-DE", None)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::TranslationUnavailable(_)));
    }
}
