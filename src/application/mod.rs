//! 应用层 - 用例编排
//!
//! 包含：
//! - ports: 六边形架构端口定义（合成、识别、翻译、对象存储、音频探测）
//! - stages: 流水线各阶段
//! - commands: 文本/语音流水线命令及处理器
//! - queries: 音色目录与口型映射查询
//! - error: 应用层错误定义

pub mod commands;
pub mod error;
pub mod ports;
pub mod queries;
pub mod stages;

// Re-exports
pub use commands::{
    handlers::{
        AudioDelivery, PipelineContext, PipelineSettings, SpeakTextHandler, SpeakVoiceHandler,
    },
    AudioReference, PipelineResult, SpeakOptions, SpeakTextCommand, SpeakVoiceCommand,
    VoiceSource,
};

pub use error::{PipelineError, PipelineStage};

pub use ports::{
    AudioInfo, AudioProbePort, ObjectStoragePort, ProbeError, ProviderError,
    RecognitionJobReport, RecognitionJobRequest, RecognitionState, SpeechRecognitionPort,
    SpeechSynthesisPort, StorageError, StoredObject, SynthesisRequest, SynthesizedAudio,
    TranslationPort, TranslationRequest, VoicePage,
};

pub use queries::{
    handlers::{
        GetVisemeMapHandler, LanguageResponse, ListLanguagesHandler, ListVoicesHandler,
        VisemeMapResponse, VoiceResponse,
    },
    GetVisemeMap, ListLanguages, ListVoices,
};

pub use stages::{
    SynthesisStage, TranscriptionSettings, TranscriptionStage, TranslationStage,
    VoiceCatalogCache, VoiceSelector,
};
