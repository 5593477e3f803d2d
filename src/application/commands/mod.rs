//! 应用层 - 命令
//!
//! CQRS 命令侧：两条语音流水线

mod speak_commands;

pub mod handlers;

pub use speak_commands::*;
