//! Pipeline Stages - 流水线各阶段
//!
//! 每个阶段只依赖端口，由命令处理器组合成完整流水线

mod polling;
mod synthesis_stage;
mod transcription_stage;
mod translation_stage;
mod voice_catalog;
mod voice_selector;

pub use polling::{poll_until, PollOutcome};
pub use synthesis_stage::{SynthesisOutput, SynthesisStage};
pub use transcription_stage::{TranscriptionOutcome, TranscriptionSettings, TranscriptionStage};
pub use translation_stage::TranslationStage;
pub use voice_catalog::{VoiceCatalogCache, DEFAULT_CATALOG_TTL};
pub use voice_selector::VoiceSelector;
