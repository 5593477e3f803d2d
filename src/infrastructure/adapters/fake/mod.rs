//! Fake Providers - 进程内的确定性外部服务
//!
//! 用于测试，同时作为 `provider.kind = "fake"` 的本地开发后端

mod recognizer;
mod synthesizer;
mod translator;

pub use recognizer::{FakeRecognizer, RecognitionScript};
pub use synthesizer::{FakeSpeechSynthesizer, FakeSpeechSynthesizerConfig};
pub use translator::FakeTranslator;
