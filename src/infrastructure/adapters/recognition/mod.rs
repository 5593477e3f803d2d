//! Recognition Adapter - 批量语音识别网关客户端

mod http_recognizer;

pub use http_recognizer::HttpRecognizer;
