//! Worker Layer - Background Pipeline Processing
//!
//! 实现 PipelineWorker，在请求路径之外执行流水线

mod pipeline_worker;

pub use pipeline_worker::{PipelineJob, PipelineQueue, PipelineWorker, PipelineWorkerConfig};
