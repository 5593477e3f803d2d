//! Voice Selector - 基于目录缓存的音色选择

use std::sync::Arc;

use super::voice_catalog::VoiceCatalogCache;
use crate::domain::voice::{Gender, SelectionRequest, VoiceSelection, VoiceSelectionPolicy};

pub struct VoiceSelector {
    catalog: Arc<VoiceCatalogCache>,
    policy: VoiceSelectionPolicy,
}

impl VoiceSelector {
    pub fn new(catalog: Arc<VoiceCatalogCache>, policy: VoiceSelectionPolicy) -> Self {
        Self { catalog, policy }
    }

    pub fn catalog(&self) -> &Arc<VoiceCatalogCache> {
        &self.catalog
    }

    /// 选择音色，目录不可用时退回静态默认音色
    pub async fn select(
        &self,
        target_language: &str,
        gender: Option<Gender>,
        override_id: Option<&str>,
        require_enhanced: bool,
    ) -> VoiceSelection {
        let snapshot = self.catalog.snapshot().await;
        let request = SelectionRequest {
            target_language,
            gender,
            override_id,
            require_enhanced,
        };
        let selection = self.policy.select(&snapshot, &request);

        tracing::debug!(
            target_language = %target_language,
            voice_id = %selection.voice_id,
            tier = %selection.tier,
            reason = selection.reason.as_str(),
            catalog_size = snapshot.voices().len(),
            "Voice selected"
        );

        selection
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::voice::{QualityTier, SelectionReason};
    use crate::infrastructure::adapters::{FakeSpeechSynthesizer, FakeSpeechSynthesizerConfig};

    fn selector(provider: Arc<FakeSpeechSynthesizer>) -> VoiceSelector {
        let catalog = Arc::new(VoiceCatalogCache::with_default_ttl(provider));
        VoiceSelector::new(catalog, VoiceSelectionPolicy::default())
    }

    #[tokio::test]
    async fn test_catalog_outage_uses_gender_default() {
        let provider = Arc::new(FakeSpeechSynthesizer::new(FakeSpeechSynthesizerConfig::default()));
        provider.fail_catalog(true);
        let selector = selector(provider);

        let male = selector.select("en-US", Some(Gender::Male), None, true).await;
        assert_eq!(male.voice_id, "Matthew");
        assert_eq!(male.reason, SelectionReason::Fallback);

        let female = selector.select("en-US", Some(Gender::Female), None, true).await;
        assert_eq!(female.voice_id, "Joanna");
        assert_eq!(female.reason, SelectionReason::Fallback);
    }

    #[tokio::test]
    async fn test_selects_from_catalog() {
        let provider = Arc::new(FakeSpeechSynthesizer::new(FakeSpeechSynthesizerConfig::default()));
        let selector = selector(provider);

        let selection = selector.select("en-GB", Some(Gender::Female), None, true).await;
        assert_eq!(selection.voice_id, "Emma");
        assert_eq!(selection.tier, QualityTier::Enhanced);
        assert_eq!(selection.reason, SelectionReason::Preferred);
    }

    #[tokio::test]
    async fn test_override_must_match_language() {
        let provider = Arc::new(FakeSpeechSynthesizer::new(FakeSpeechSynthesizerConfig::default()));
        let selector = selector(provider);

        let accepted = selector.select("en-US", None, Some("Joanna"), false).await;
        assert_eq!(accepted.reason, SelectionReason::Override);

        let ignored = selector.select("en-US", None, Some("Zhiyu"), false).await;
        assert_ne!(ignored.voice_id, "Zhiyu");
    }
}
