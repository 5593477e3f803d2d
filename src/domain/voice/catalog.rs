//! Voice Catalog - 音色目录快照
//!
//! 快照一经创建不再修改，刷新时整体替换

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use super::value_objects::{Gender, QualityTier};

/// 合成音色
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voice {
    pub id: String,
    pub gender: Gender,
    pub languages: BTreeSet<String>,
    pub tiers: BTreeSet<QualityTier>,
}

impl Voice {
    pub fn new(id: impl Into<String>, gender: Gender) -> Self {
        Self {
            id: id.into(),
            gender,
            languages: BTreeSet::new(),
            tiers: BTreeSet::new(),
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.languages.insert(language.into());
        self
    }

    pub fn with_tier(mut self, tier: QualityTier) -> Self {
        self.tiers.insert(tier);
        self
    }

    /// 语言匹配（大小写不敏感）
    pub fn speaks(&self, language: &str) -> bool {
        self.languages
            .iter()
            .any(|l| l.eq_ignore_ascii_case(language))
    }

    pub fn supports(&self, tier: QualityTier) -> bool {
        self.tiers.contains(&tier)
    }
}

/// 某语言下的性别可用性
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LanguageAvailability {
    pub language: String,
    pub male: bool,
    pub female: bool,
}

/// 音色目录快照
#[derive(Debug, Clone)]
pub struct CatalogSnapshot {
    voices: Vec<Voice>,
    fetched_at: DateTime<Utc>,
    ttl: Duration,
}

impl CatalogSnapshot {
    pub fn new(voices: Vec<Voice>, fetched_at: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            voices,
            fetched_at,
            ttl,
        }
    }

    /// 空目录（从未成功获取时使用），始终视为过期
    pub fn empty() -> Self {
        Self {
            voices: Vec::new(),
            fetched_at: DateTime::<Utc>::UNIX_EPOCH,
            ttl: Duration::ZERO,
        }
    }

    pub fn voices(&self) -> &[Voice] {
        &self.voices
    }

    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn is_empty(&self) -> bool {
        self.voices.is_empty()
    }

    /// 在 `now` 时刻是否已过期（`now >= fetched_at + ttl`）
    pub fn is_stale_at(&self, now: DateTime<Utc>) -> bool {
        match now.signed_duration_since(self.fetched_at).to_std() {
            Ok(age) => age >= self.ttl,
            // 时钟回拨
            Err(_) => false,
        }
    }

    pub fn find(&self, voice_id: &str) -> Option<&Voice> {
        self.voices.iter().find(|v| v.id == voice_id)
    }

    /// 按语言和/或质量等级过滤，结果按 (languages, gender, id) 排序
    pub fn query(&self, language: Option<&str>, require_enhanced: bool) -> Vec<&Voice> {
        let mut matched: Vec<&Voice> = self
            .voices
            .iter()
            .filter(|v| language.map_or(true, |lang| v.speaks(lang)))
            .filter(|v| !require_enhanced || v.supports(QualityTier::Enhanced))
            .collect();

        matched.sort_by(|a, b| {
            a.languages
                .cmp(&b.languages)
                .then_with(|| a.gender.as_str().cmp(b.gender.as_str()))
                .then_with(|| a.id.cmp(&b.id))
        });
        matched
    }

    /// 所有音色语言的有序并集
    pub fn languages(&self) -> Vec<String> {
        self.voices
            .iter()
            .flat_map(|v| v.languages.iter().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// 每种语言是否有男声/女声
    pub fn gender_availability(&self) -> Vec<LanguageAvailability> {
        let mut by_language: BTreeMap<&str, (bool, bool)> = BTreeMap::new();
        for voice in &self.voices {
            for language in &voice.languages {
                let entry = by_language.entry(language.as_str()).or_default();
                match voice.gender {
                    Gender::Male => entry.0 = true,
                    Gender::Female => entry.1 = true,
                    Gender::Unknown => {}
                }
            }
        }

        by_language
            .into_iter()
            .map(|(language, (male, female))| LanguageAvailability {
                language: language.to_string(),
                male,
                female,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_snapshot() -> CatalogSnapshot {
        CatalogSnapshot::new(
            vec![
                Voice::new("Matthew", Gender::Male)
                    .with_language("en-US")
                    .with_tier(QualityTier::Standard)
                    .with_tier(QualityTier::Enhanced),
                Voice::new("Joanna", Gender::Female)
                    .with_language("en-US")
                    .with_tier(QualityTier::Standard)
                    .with_tier(QualityTier::Enhanced),
                Voice::new("Ivy", Gender::Female)
                    .with_language("en-US")
                    .with_tier(QualityTier::Standard),
                Voice::new("Zhiyu", Gender::Female)
                    .with_language("cmn-CN")
                    .with_tier(QualityTier::Enhanced),
            ],
            Utc::now(),
            Duration::from_secs(3600),
        )
    }

    #[test]
    fn test_query_by_language_sorted() {
        let snapshot = sample_snapshot();
        let ids: Vec<&str> = snapshot
            .query(Some("en-US"), false)
            .iter()
            .map(|v| v.id.as_str())
            .collect();
        assert_eq!(ids, vec!["Ivy", "Joanna", "Matthew"]);
    }

    #[test]
    fn test_query_enhanced_only() {
        let snapshot = sample_snapshot();
        let ids: Vec<&str> = snapshot
            .query(Some("en-us"), true)
            .iter()
            .map(|v| v.id.as_str())
            .collect();
        assert_eq!(ids, vec!["Joanna", "Matthew"]);
    }

    #[test]
    fn test_query_without_language() {
        let snapshot = sample_snapshot();
        assert_eq!(snapshot.query(None, false).len(), 4);
        assert_eq!(snapshot.query(None, true).len(), 3);
    }

    #[test]
    fn test_staleness() {
        let fetched_at = Utc::now();
        let snapshot = CatalogSnapshot::new(Vec::new(), fetched_at, Duration::from_secs(60));
        assert!(!snapshot.is_stale_at(fetched_at + chrono::Duration::seconds(59)));
        assert!(snapshot.is_stale_at(fetched_at + chrono::Duration::seconds(60)));
        assert!(!snapshot.is_stale_at(fetched_at - chrono::Duration::seconds(5)));
    }

    #[test]
    fn test_empty_snapshot_always_stale() {
        let snapshot = CatalogSnapshot::empty();
        assert!(snapshot.is_empty());
        assert!(snapshot.is_stale_at(Utc::now()));
    }

    #[test]
    fn test_languages_and_availability() {
        let snapshot = sample_snapshot();
        assert_eq!(snapshot.languages(), vec!["cmn-CN", "en-US"]);

        let availability = snapshot.gender_availability();
        assert_eq!(
            availability,
            vec![
                LanguageAvailability {
                    language: "cmn-CN".to_string(),
                    male: false,
                    female: true,
                },
                LanguageAvailability {
                    language: "en-US".to_string(),
                    male: true,
                    female: true,
                },
            ]
        );
    }
}
