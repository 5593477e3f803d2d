//! Pipeline Worker - 后台流水线执行器
//!
//! HTTP 层通过 `PipelineQueue` 提交任务并等待 oneshot 回复，
//! Worker 从有界队列消费，用 semaphore 限制同时执行的流水线数

use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, Semaphore};

use crate::application::commands::handlers::{SpeakTextHandler, SpeakVoiceHandler};
use crate::application::commands::{PipelineResult, SpeakTextCommand, SpeakVoiceCommand};
use crate::application::error::PipelineError;

type Reply = oneshot::Sender<Result<PipelineResult, PipelineError>>;

/// 流水线任务
pub enum PipelineJob {
    Text { command: SpeakTextCommand, reply: Reply },
    Voice { command: SpeakVoiceCommand, reply: Reply },
}

impl PipelineJob {
    fn kind(&self) -> &'static str {
        match self {
            Self::Text { .. } => "text",
            Self::Voice { .. } => "voice",
        }
    }
}

/// 任务提交句柄
#[derive(Clone)]
pub struct PipelineQueue {
    sender: mpsc::Sender<PipelineJob>,
}

impl PipelineQueue {
    /// 创建队列，返回提交句柄与 Worker 使用的接收端
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<PipelineJob>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }

    pub async fn speak_text(
        &self,
        command: SpeakTextCommand,
    ) -> Result<PipelineResult, PipelineError> {
        let (reply, response) = oneshot::channel();
        self.submit(PipelineJob::Text { command, reply })?;
        Self::await_reply(response).await
    }

    pub async fn speak_voice(
        &self,
        command: SpeakVoiceCommand,
    ) -> Result<PipelineResult, PipelineError> {
        let (reply, response) = oneshot::channel();
        self.submit(PipelineJob::Voice { command, reply })?;
        Self::await_reply(response).await
    }

    /// 入队；队列已满或 Worker 已停止时立即失败
    fn submit(&self, job: PipelineJob) -> Result<(), PipelineError> {
        self.sender.try_send(job).map_err(|e| match e {
            mpsc::error::TrySendError::Full(job) => {
                tracing::warn!(kind = job.kind(), "Pipeline queue is full");
                PipelineError::Unavailable("queue is full".to_string())
            }
            mpsc::error::TrySendError::Closed(_) => {
                PipelineError::Unavailable("worker stopped".to_string())
            }
        })
    }

    async fn await_reply(
        response: oneshot::Receiver<Result<PipelineResult, PipelineError>>,
    ) -> Result<PipelineResult, PipelineError> {
        response
            .await
            .map_err(|_| PipelineError::Unavailable("job dropped by worker".to_string()))?
    }
}

/// Worker 配置
#[derive(Debug, Clone)]
pub struct PipelineWorkerConfig {
    /// 最大并发流水线数
    pub max_concurrent: usize,
}

impl Default for PipelineWorkerConfig {
    fn default() -> Self {
        Self { max_concurrent: 4 }
    }
}

/// 流水线 Worker
pub struct PipelineWorker {
    config: PipelineWorkerConfig,
    receiver: mpsc::Receiver<PipelineJob>,
    text_handler: Arc<SpeakTextHandler>,
    voice_handler: Arc<SpeakVoiceHandler>,
}

impl PipelineWorker {
    pub fn new(
        config: PipelineWorkerConfig,
        receiver: mpsc::Receiver<PipelineJob>,
        text_handler: Arc<SpeakTextHandler>,
        voice_handler: Arc<SpeakVoiceHandler>,
    ) -> Self {
        Self {
            config,
            receiver,
            text_handler,
            voice_handler,
        }
    }

    /// 启动 Worker，所有提交句柄释放后退出
    pub async fn run(mut self) {
        tracing::info!(
            max_concurrent = self.config.max_concurrent,
            "PipelineWorker started"
        );

        let semaphore = Arc::new(Semaphore::new(self.config.max_concurrent.max(1)));

        while let Some(job) = self.receiver.recv().await {
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    tracing::error!("Failed to acquire semaphore permit");
                    break;
                }
            };

            let text_handler = self.text_handler.clone();
            let voice_handler = self.voice_handler.clone();

            tokio::spawn(async move {
                let _permit = permit; // 持有 permit 直到流水线结束
                Self::process_job(job, &text_handler, &voice_handler).await;
            });
        }

        tracing::info!("PipelineWorker stopped");
    }

    async fn process_job(
        job: PipelineJob,
        text_handler: &SpeakTextHandler,
        voice_handler: &SpeakVoiceHandler,
    ) {
        let kind = job.kind();
        let started = std::time::Instant::now();

        let (result, reply) = match job {
            PipelineJob::Text { command, reply } => (text_handler.handle(command).await, reply),
            PipelineJob::Voice { command, reply } => (voice_handler.handle(command).await, reply),
        };

        match &result {
            Ok(_) => tracing::debug!(
                kind,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Pipeline job finished"
            ),
            Err(e) => tracing::warn!(
                kind,
                stage = %e.stage(),
                error = %e,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Pipeline job failed"
            ),
        }

        if reply.send(result).is_err() {
            tracing::debug!(kind, "Requester went away before the pipeline finished");
        }
    }
}
