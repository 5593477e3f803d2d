//! Synthesis Adapter - 语音合成网关客户端

mod http_synthesizer;

pub use http_synthesizer::HttpSpeechSynthesizer;
