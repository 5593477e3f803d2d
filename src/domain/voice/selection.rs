//! Voice Selection - 音色选择策略
//!
//! 纯函数：给定目录快照和请求，按顺序尝试各策略，第一个成功的结果生效。
//! 任何输入（包括空目录）都会得到可用的 (voice_id, tier)。

use serde::{Deserialize, Serialize};

use super::catalog::{CatalogSnapshot, Voice};
use super::value_objects::{Gender, QualityTier};

/// 选择原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SelectionReason {
    /// 调用方指定的音色
    Override,
    /// 优先列表中的音色
    Preferred,
    /// 目标语言下的其他音色
    AnyMatch,
    /// 降级结果（邻近语言之外的目录、等级降级或静态默认）
    Fallback,
}

impl SelectionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Override => "override",
            Self::Preferred => "preferred",
            Self::AnyMatch => "any-match",
            Self::Fallback => "fallback",
        }
    }
}

/// 选择结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VoiceSelection {
    pub voice_id: String,
    pub tier: QualityTier,
    pub reason: SelectionReason,
}

/// 选择请求
#[derive(Debug, Clone, Copy)]
pub struct SelectionRequest<'a> {
    pub target_language: &'a str,
    pub gender: Option<Gender>,
    pub override_id: Option<&'a str>,
    pub require_enhanced: bool,
}

impl<'a> SelectionRequest<'a> {
    pub fn new(target_language: &'a str) -> Self {
        Self {
            target_language,
            gender: None,
            override_id: None,
            require_enhanced: false,
        }
    }

    fn requested_tier(&self) -> QualityTier {
        if self.require_enhanced {
            QualityTier::Enhanced
        } else {
            QualityTier::Standard
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Strategy {
    Override,
    Ranked,
    StaticDefault,
}

const STRATEGIES: &[Strategy] = &[Strategy::Override, Strategy::Ranked, Strategy::StaticDefault];

/// 音色选择策略配置
#[derive(Debug, Clone)]
pub struct VoiceSelectionPolicy {
    /// 优先音色（靠前者优先）
    pub preferred: Vec<String>,
    /// 邻近语言对（双向）
    pub near_locales: Vec<(String, String)>,
    pub male_default: String,
    pub female_default: String,
}

impl Default for VoiceSelectionPolicy {
    fn default() -> Self {
        Self {
            preferred: ["Matthew", "Joanna", "Brian", "Emma", "Zhiyu", "Hiujin"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            near_locales: default_near_locales(),
            male_default: "Matthew".to_string(),
            female_default: "Joanna".to_string(),
        }
    }
}

/// 默认邻近语言对
pub fn default_near_locales() -> Vec<(String, String)> {
    [
        ("zh-CN", "zh-TW"),
        ("cmn-CN", "zh-CN"),
        ("en-US", "en-GB"),
        ("en-GB", "en-AU"),
        ("es-ES", "es-MX"),
        ("es-MX", "es-US"),
        ("pt-BR", "pt-PT"),
        ("fr-FR", "fr-CA"),
    ]
    .iter()
    .map(|(a, b)| (a.to_string(), b.to_string()))
    .collect()
}

impl VoiceSelectionPolicy {
    /// 选择音色，永不失败
    pub fn select(&self, snapshot: &CatalogSnapshot, request: &SelectionRequest<'_>) -> VoiceSelection {
        STRATEGIES
            .iter()
            .find_map(|strategy| self.apply(*strategy, snapshot, request))
            .unwrap_or_else(|| self.static_default(request))
    }

    fn apply(
        &self,
        strategy: Strategy,
        snapshot: &CatalogSnapshot,
        request: &SelectionRequest<'_>,
    ) -> Option<VoiceSelection> {
        match strategy {
            Strategy::Override => self.by_override(snapshot, request),
            Strategy::Ranked => self.by_rank(snapshot, request),
            Strategy::StaticDefault => Some(self.static_default(request)),
        }
    }

    fn by_override(
        &self,
        snapshot: &CatalogSnapshot,
        request: &SelectionRequest<'_>,
    ) -> Option<VoiceSelection> {
        let wanted = request.override_id?.trim();
        if wanted.is_empty() {
            return None;
        }

        let voice = snapshot
            .query(Some(request.target_language), false)
            .into_iter()
            .find(|v| v.id == wanted)?;

        Some(VoiceSelection {
            voice_id: voice.id.clone(),
            tier: tier_for(voice, request).unwrap_or_else(|| downgraded_tier(voice)),
            reason: SelectionReason::Override,
        })
    }

    fn by_rank(
        &self,
        snapshot: &CatalogSnapshot,
        request: &SelectionRequest<'_>,
    ) -> Option<VoiceSelection> {
        let (mut pool, outside_locale) = self.candidate_pool(snapshot, request.target_language);
        if pool.is_empty() {
            return None;
        }

        if let Some(gender @ (Gender::Male | Gender::Female)) = request.gender {
            if pool.iter().any(|v| v.gender == gender) {
                pool.retain(|v| v.gender == gender);
            }
        }

        pool.sort_by(|a, b| {
            self.rank(&a.id)
                .cmp(&self.rank(&b.id))
                .then_with(|| a.id.cmp(&b.id))
        });

        for voice in &pool {
            if let Some(tier) = tier_for(voice, request) {
                let reason = if outside_locale {
                    SelectionReason::Fallback
                } else if self.is_preferred(&voice.id) {
                    SelectionReason::Preferred
                } else {
                    SelectionReason::AnyMatch
                };
                return Some(VoiceSelection {
                    voice_id: voice.id.clone(),
                    tier,
                    reason,
                });
            }
        }

        // 无音色满足请求的等级：取最高优先级音色并降级
        let top = pool.first()?;
        Some(VoiceSelection {
            voice_id: top.id.clone(),
            tier: downgraded_tier(top),
            reason: SelectionReason::Fallback,
        })
    }

    /// 目标语言 → 邻近语言 → 全目录
    ///
    /// 返回候选集以及是否来自全目录
    fn candidate_pool<'s>(
        &self,
        snapshot: &'s CatalogSnapshot,
        target_language: &str,
    ) -> (Vec<&'s Voice>, bool) {
        for locale in self.expand_locales(target_language) {
            let voices = snapshot.query(Some(&locale), false);
            if !voices.is_empty() {
                return (voices, false);
            }
        }
        (snapshot.query(None, false), true)
    }

    fn expand_locales(&self, target_language: &str) -> Vec<String> {
        let mut locales = vec![target_language.to_string()];
        for (a, b) in &self.near_locales {
            let partner = if a.eq_ignore_ascii_case(target_language) {
                b
            } else if b.eq_ignore_ascii_case(target_language) {
                a
            } else {
                continue;
            };
            if !locales.iter().any(|l| l.eq_ignore_ascii_case(partner)) {
                locales.push(partner.clone());
            }
        }
        locales
    }

    fn rank(&self, voice_id: &str) -> usize {
        self.preferred
            .iter()
            .position(|p| p == voice_id)
            .unwrap_or(usize::MAX)
    }

    fn is_preferred(&self, voice_id: &str) -> bool {
        self.preferred.iter().any(|p| p == voice_id)
    }

    fn static_default(&self, request: &SelectionRequest<'_>) -> VoiceSelection {
        let voice_id = match request.gender {
            Some(Gender::Male) => self.male_default.clone(),
            _ => self.female_default.clone(),
        };
        VoiceSelection {
            voice_id,
            tier: request.requested_tier(),
            reason: SelectionReason::Fallback,
        }
    }
}

/// 音色在请求等级下可用的 tier
///
/// 要求 enhanced 时只接受 enhanced；否则优先 standard。
/// 未声明等级的音色视为支持 standard。
fn tier_for(voice: &Voice, request: &SelectionRequest<'_>) -> Option<QualityTier> {
    if request.require_enhanced {
        return voice
            .supports(QualityTier::Enhanced)
            .then_some(QualityTier::Enhanced);
    }
    if voice.tiers.is_empty() || voice.supports(QualityTier::Standard) {
        Some(QualityTier::Standard)
    } else {
        voice.tiers.iter().next().copied()
    }
}

fn downgraded_tier(voice: &Voice) -> QualityTier {
    if voice.tiers.is_empty() || voice.supports(QualityTier::Standard) {
        QualityTier::Standard
    } else {
        voice
            .tiers
            .iter()
            .next()
            .copied()
            .unwrap_or(QualityTier::Standard)
    }
}
