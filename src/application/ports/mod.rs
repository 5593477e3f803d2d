//! Application Ports - 出站端口定义
//!
//! 定义应用层与基础设施层的抽象接口

mod audio_probe;
mod object_storage;
mod provider_error;
mod speech_recognition;
mod speech_synthesis;
mod translation;

pub use audio_probe::{AudioInfo, AudioProbePort, ProbeError};
pub use object_storage::{ObjectStoragePort, StorageError, StoredObject};
pub use provider_error::ProviderError;
pub use speech_recognition::{
    RecognitionJobReport, RecognitionJobRequest, RecognitionState, SpeechRecognitionPort,
};
pub use speech_synthesis::{SpeechSynthesisPort, SynthesisRequest, SynthesizedAudio, VoicePage};
pub use translation::{TranslationPort, TranslationRequest, AUTO_SOURCE};
