//! Domain Layer - 领域层
//!
//! 包含:
//! - Voice Context: 音色目录与选择策略
//! - Language: 语言代码归一化
//! - Timeline: 口型/单词时间轴
//! - Transcription: 识别任务状态机

pub mod language;
pub mod media_format;
pub mod object_location;
pub mod timeline;
pub mod transcription;
pub mod voice;

pub use media_format::MediaFormat;
pub use object_location::ObjectLocation;
pub use timeline::{MarkKind, MouthShape, TimelineEvent, VisemeTiming};
pub use transcription::{JobStatus, TranscriptionError, TranscriptionJob};
