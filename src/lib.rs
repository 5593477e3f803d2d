//! voxbridge - 多语言语音网关
//!
//! 架构设计: DDD + CQRS + Hexagonal Architecture
//!
//! 领域层 (domain/):
//! - Voice Context: 音色目录与选择策略
//! - Language / Timeline / Transcription
//!
//! 应用层 (application/):
//! - Ports: 合成、识别、翻译、对象存储、音频探测
//! - Stages: 流水线各阶段
//! - Commands: 文本与语音流水线
//! - Queries: 音色、语言与口型映射
//!
//! 基础设施层 (infrastructure/):
//! - HTTP: RESTful API
//! - Adapters: 外部服务 HTTP 客户端、fake 实现、音频探测
//! - Persistence / Memory: 对象存储
//! - Worker: PipelineWorker 后台执行

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
