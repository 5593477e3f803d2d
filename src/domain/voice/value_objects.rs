//! Voice Context - Value Objects

use serde::{Deserialize, Serialize};

/// 音色性别
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Unknown,
}

impl Gender {
    /// 解析外部服务返回的性别字符串，未知值归为 `Unknown`
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "male" | "m" => Self::Male,
            "female" | "f" => Self::Female,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 合成质量等级
///
/// `Enhanced` 对应外部服务的 neural 引擎
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    Standard,
    Enhanced,
}

impl QualityTier {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "standard" => Some(Self::Standard),
            "enhanced" | "neural" => Some(Self::Enhanced),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Enhanced => "enhanced",
        }
    }
}

impl std::fmt::Display for QualityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gender_parse() {
        assert_eq!(Gender::parse("Male"), Gender::Male);
        assert_eq!(Gender::parse(" FEMALE "), Gender::Female);
        assert_eq!(Gender::parse("neutral"), Gender::Unknown);
        assert_eq!(Gender::parse(""), Gender::Unknown);
    }

    #[test]
    fn test_tier_parse() {
        assert_eq!(QualityTier::parse("neural"), Some(QualityTier::Enhanced));
        assert_eq!(QualityTier::parse("Standard"), Some(QualityTier::Standard));
        assert_eq!(QualityTier::parse("long-form"), None);
    }

    #[test]
    fn test_tier_serde() {
        let json = serde_json::to_string(&QualityTier::Enhanced).unwrap();
        assert_eq!(json, "\"enhanced\"");
    }
}
