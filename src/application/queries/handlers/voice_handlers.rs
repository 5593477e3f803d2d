//! Voice Query Handlers

use std::sync::Arc;

use crate::application::queries::{ListLanguages, ListVoices};
use crate::application::stages::VoiceCatalogCache;
use crate::domain::language::{is_translatable, to_translation_code};
use crate::domain::voice::{LanguageAvailability, Voice};

// ============================================================================
// Response DTOs
// ============================================================================

/// 音色列表项
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceResponse {
    pub id: String,
    pub gender: String,
    pub languages: Vec<String>,
    pub tiers: Vec<String>,
}

impl From<Voice> for VoiceResponse {
    fn from(voice: Voice) -> Self {
        Self {
            id: voice.id,
            gender: voice.gender.as_str().to_string(),
            languages: voice.languages.into_iter().collect(),
            tiers: voice.tiers.iter().map(|t| t.as_str().to_string()).collect(),
        }
    }
}

/// 单个语言的支持情况
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageResponse {
    /// 区域代码（来自音色目录）
    pub locale: String,
    pub male: bool,
    pub female: bool,
    /// 该语言是否可作为翻译目标
    pub translatable: bool,
}

impl From<LanguageAvailability> for LanguageResponse {
    fn from(availability: LanguageAvailability) -> Self {
        let translatable = to_translation_code(Some(&availability.language))
            .is_some_and(is_translatable);
        Self {
            locale: availability.language,
            male: availability.male,
            female: availability.female,
            translatable,
        }
    }
}

// ============================================================================
// Handlers
// ============================================================================

/// ListVoices Handler
pub struct ListVoicesHandler {
    catalog: Arc<VoiceCatalogCache>,
}

impl ListVoicesHandler {
    pub fn new(catalog: Arc<VoiceCatalogCache>) -> Self {
        Self { catalog }
    }

    /// 目录不可用时返回空列表
    pub async fn handle(&self, query: ListVoices) -> Vec<VoiceResponse> {
        let language = query
            .language
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty());

        self.catalog
            .query(language, query.require_enhanced)
            .await
            .into_iter()
            .map(VoiceResponse::from)
            .collect()
    }
}

/// ListLanguages Handler
pub struct ListLanguagesHandler {
    catalog: Arc<VoiceCatalogCache>,
}

impl ListLanguagesHandler {
    pub fn new(catalog: Arc<VoiceCatalogCache>) -> Self {
        Self { catalog }
    }

    pub async fn handle(&self, _query: ListLanguages) -> Vec<LanguageResponse> {
        self.catalog
            .availability()
            .await
            .into_iter()
            .map(LanguageResponse::from)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::adapters::{FakeSpeechSynthesizer, FakeSpeechSynthesizerConfig};

    fn catalog() -> (Arc<VoiceCatalogCache>, Arc<FakeSpeechSynthesizer>) {
        let provider = Arc::new(FakeSpeechSynthesizer::new(
            FakeSpeechSynthesizerConfig::default(),
        ));
        (
            Arc::new(VoiceCatalogCache::with_default_ttl(provider.clone())),
            provider,
        )
    }

    #[tokio::test]
    async fn test_list_voices_filters() {
        let (catalog, _) = catalog();
        let handler = ListVoicesHandler::new(catalog);

        let gb = handler
            .handle(ListVoices {
                language: Some("en-GB".into()),
                require_enhanced: false,
            })
            .await;
        let ids: Vec<&str> = gb.iter().map(|v| v.id.as_str()).collect();
        assert!(ids.contains(&"Brian"));
        assert!(ids.contains(&"Emma"));
        assert!(gb.iter().all(|v| v.languages.contains(&"en-GB".to_string())));

        let all = handler.handle(ListVoices::default()).await;
        assert!(all.len() > gb.len());
    }

    #[tokio::test]
    async fn test_list_voices_enhanced_only() {
        let (catalog, _) = catalog();
        let handler = ListVoicesHandler::new(catalog);

        let voices = handler
            .handle(ListVoices {
                language: None,
                require_enhanced: true,
            })
            .await;
        assert!(!voices.is_empty());
        assert!(voices.iter().all(|v| v.tiers.contains(&"enhanced".to_string())));
    }

    #[tokio::test]
    async fn test_languages_report_gender_and_translation() {
        let (catalog, _) = catalog();
        let handler = ListLanguagesHandler::new(catalog);

        let languages = handler.handle(ListLanguages).await;
        let us = languages.iter().find(|l| l.locale == "en-US").unwrap();
        assert!(us.male && us.female);
        assert!(us.translatable);

        let gb = languages.iter().find(|l| l.locale == "en-GB").unwrap();
        assert!(gb.male && gb.female);
    }

    #[tokio::test]
    async fn test_outage_yields_empty_lists() {
        let (catalog, provider) = catalog();
        provider.fail_catalog(true);

        assert!(ListLanguagesHandler::new(catalog.clone())
            .handle(ListLanguages)
            .await
            .is_empty());
        assert!(ListVoicesHandler::new(catalog)
            .handle(ListVoices::default())
            .await
            .is_empty());
    }
}
