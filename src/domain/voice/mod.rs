//! Voice Context - 音色限界上下文
//!
//! 职责:
//! - 合成音色目录快照
//! - 确定性的音色选择策略

mod catalog;
mod selection;
mod value_objects;

pub use catalog::{CatalogSnapshot, LanguageAvailability, Voice};
pub use selection::{
    default_near_locales, SelectionReason, SelectionRequest, VoiceSelection, VoiceSelectionPolicy,
};
pub use value_objects::{Gender, QualityTier};
