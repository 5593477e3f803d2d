//! Application State
//!
//! 流水线通过 Worker 队列执行，查询直接走目录缓存

use std::sync::Arc;

use crate::application::{
    GetVisemeMapHandler, ListLanguagesHandler, ListVoicesHandler, ObjectStoragePort,
    SpeechSynthesisPort, VoiceCatalogCache,
};
use crate::infrastructure::persistence::ObjectUrlSigner;
use crate::infrastructure::worker::PipelineQueue;

/// 应用状态
pub struct AppState {
    // ========== Ports ==========
    pub storage: Arc<dyn ObjectStoragePort>,
    pub synthesizer: Arc<dyn SpeechSynthesisPort>,
    pub signer: ObjectUrlSigner,

    // ========== Commands ==========
    pub queue: PipelineQueue,

    // ========== Query Handlers ==========
    pub list_voices_handler: ListVoicesHandler,
    pub list_languages_handler: ListLanguagesHandler,
    pub viseme_map_handler: GetVisemeMapHandler,

    /// 上传音频的最大字节数
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn new(
        queue: PipelineQueue,
        catalog: Arc<VoiceCatalogCache>,
        storage: Arc<dyn ObjectStoragePort>,
        synthesizer: Arc<dyn SpeechSynthesisPort>,
        signer: ObjectUrlSigner,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            storage,
            synthesizer,
            signer,
            queue,
            list_voices_handler: ListVoicesHandler::new(catalog.clone()),
            list_languages_handler: ListLanguagesHandler::new(catalog),
            viseme_map_handler: GetVisemeMapHandler::new(),
            max_upload_bytes,
        }
    }
}
