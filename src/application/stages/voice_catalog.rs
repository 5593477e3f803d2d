//! Voice Catalog Cache - 进程级音色目录缓存
//!
//! - 快照缺失或过期时刷新一次（完整分页拉取）
//! - 刷新成功后整体替换快照；失败时沿用旧快照并吞掉错误
//! - 从未成功时返回空目录，而不是报错
//! - 刷新是 single-flight 的：并发请求只有一个会调用外部服务，
//!   其余等待并复用它的结果

use chrono::Utc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Mutex, RwLock};

use crate::application::ports::{ProviderError, SpeechSynthesisPort};
use crate::domain::voice::{CatalogSnapshot, LanguageAvailability, Voice};

/// 默认 TTL（1 小时）
pub const DEFAULT_CATALOG_TTL: Duration = Duration::from_secs(3600);

/// 分页上限，防止服务端循环返回同一 token
const MAX_PAGES: usize = 100;

/// 目录刷新错误（仅用于日志，不向外传播）
#[derive(Debug, Error)]
enum CatalogError {
    #[error("Catalog unavailable: {0}")]
    Unavailable(#[from] ProviderError),

    #[error("Catalog pagination exceeded {0} pages")]
    TooManyPages(usize),
}

/// 音色目录缓存
pub struct VoiceCatalogCache {
    provider: Arc<dyn SpeechSynthesisPort>,
    ttl: Duration,
    current: RwLock<Option<Arc<CatalogSnapshot>>>,
    refresh_gate: Mutex<()>,
    /// 已完成的刷新尝试次数（成功或失败）
    attempts: AtomicU64,
}

impl VoiceCatalogCache {
    pub fn new(provider: Arc<dyn SpeechSynthesisPort>, ttl: Duration) -> Self {
        Self {
            provider,
            ttl,
            current: RwLock::new(None),
            refresh_gate: Mutex::new(()),
            attempts: AtomicU64::new(0),
        }
    }

    pub fn with_default_ttl(provider: Arc<dyn SpeechSynthesisPort>) -> Self {
        Self::new(provider, DEFAULT_CATALOG_TTL)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// 获取当前快照，必要时刷新。永不失败
    pub async fn snapshot(&self) -> Arc<CatalogSnapshot> {
        if let Some(fresh) = self.fresh().await {
            return fresh;
        }

        let seen_attempts = self.attempts.load(Ordering::Acquire);
        let _gate = self.refresh_gate.lock().await;

        // 等锁期间已有其他调用完成刷新尝试，直接复用其结果
        if self.attempts.load(Ordering::Acquire) != seen_attempts {
            return self.current_or_empty().await;
        }
        if let Some(fresh) = self.fresh().await {
            return fresh;
        }

        let result = self.fetch_all().await;
        self.attempts.fetch_add(1, Ordering::AcqRel);

        match result {
            Ok(voices) => {
                let snapshot = Arc::new(CatalogSnapshot::new(voices, Utc::now(), self.ttl));
                tracing::info!(
                    voices = snapshot.voices().len(),
                    ttl_secs = self.ttl.as_secs(),
                    "Voice catalog refreshed"
                );
                *self.current.write().await = Some(snapshot.clone());
                snapshot
            }
            Err(e) => {
                let fallback = self.current_or_empty().await;
                tracing::warn!(
                    error = %e,
                    cached_voices = fallback.voices().len(),
                    "Voice catalog refresh failed, serving previous snapshot"
                );
                fallback
            }
        }
    }

    /// 按语言和等级查询音色
    pub async fn query(&self, language: Option<&str>, require_enhanced: bool) -> Vec<Voice> {
        self.snapshot()
            .await
            .query(language, require_enhanced)
            .into_iter()
            .cloned()
            .collect()
    }

    /// 目录中所有语言
    pub async fn languages(&self) -> Vec<String> {
        self.snapshot().await.languages()
    }

    /// 每种语言的男/女声可用性
    pub async fn availability(&self) -> Vec<LanguageAvailability> {
        self.snapshot().await.gender_availability()
    }

    async fn fresh(&self) -> Option<Arc<CatalogSnapshot>> {
        let guard = self.current.read().await;
        guard
            .as_ref()
            .filter(|s| !s.is_stale_at(Utc::now()))
            .cloned()
    }

    async fn current_or_empty(&self) -> Arc<CatalogSnapshot> {
        self.current
            .read()
            .await
            .clone()
            .unwrap_or_else(|| Arc::new(CatalogSnapshot::empty()))
    }

    async fn fetch_all(&self) -> Result<Vec<Voice>, CatalogError> {
        let mut voices = Vec::new();
        let mut token: Option<String> = None;

        for _ in 0..MAX_PAGES {
            let page = self.provider.list_voices(token.as_deref()).await?;
            voices.extend(page.voices);

            match page.next_page_token {
                Some(next) if !next.is_empty() => token = Some(next),
                _ => return Ok(voices),
            }
        }

        Err(CatalogError::TooManyPages(MAX_PAGES))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::adapters::{FakeSpeechSynthesizer, FakeSpeechSynthesizerConfig};

    fn fake() -> Arc<FakeSpeechSynthesizer> {
        Arc::new(FakeSpeechSynthesizer::new(FakeSpeechSynthesizerConfig::default()))
    }

    #[tokio::test]
    async fn test_fetches_all_pages_once() {
        let provider = fake();
        let total = provider.catalog().len();
        let cache = VoiceCatalogCache::with_default_ttl(provider.clone());

        let snapshot = cache.snapshot().await;
        assert_eq!(snapshot.voices().len(), total);
        let pages = provider.list_calls();
        assert!(pages > 1);

        // TTL 内不再刷新
        cache.snapshot().await;
        assert_eq!(provider.list_calls(), pages);
    }

    #[tokio::test]
    async fn test_failure_without_snapshot_yields_empty() {
        let provider = fake();
        provider.fail_catalog(true);
        let cache = VoiceCatalogCache::with_default_ttl(provider.clone());

        let snapshot = cache.snapshot().await;
        assert!(snapshot.is_empty());
    }

    #[tokio::test]
    async fn test_failure_keeps_stale_snapshot() {
        let provider = fake();
        let cache = VoiceCatalogCache::new(provider.clone(), Duration::ZERO);

        let first = cache.snapshot().await;
        assert!(!first.is_empty());

        provider.fail_catalog(true);
        let second = cache.snapshot().await;
        assert_eq!(second.voices(), first.voices());
        assert_eq!(second.fetched_at(), first.fetched_at());
    }

    #[tokio::test]
    async fn test_stale_snapshot_is_replaced() {
        let provider = fake();
        let cache = VoiceCatalogCache::new(provider.clone(), Duration::ZERO);

        let first = cache.snapshot().await;
        let second = cache.snapshot().await;
        assert!(second.fetched_at() >= first.fetched_at());
        assert!(!Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn test_concurrent_refresh_is_single_flight() {
        let provider = Arc::new(FakeSpeechSynthesizer::new(FakeSpeechSynthesizerConfig {
            page_size: 100,
            latency: Duration::from_millis(50),
            ..Default::default()
        }));
        let cache = Arc::new(VoiceCatalogCache::with_default_ttl(provider.clone()));

        let mut handles = Vec::new();
        for _ in 0..8 {
            let cache = cache.clone();
            handles.push(tokio::spawn(async move { cache.snapshot().await }));
        }
        for handle in handles {
            assert!(!handle.await.unwrap().is_empty());
        }

        assert_eq!(provider.list_calls(), 1);
    }

    #[tokio::test]
    async fn test_query_and_languages() {
        let cache = VoiceCatalogCache::with_default_ttl(fake());
        let us = cache.query(Some("en-US"), true).await;
        assert!(us.iter().all(|v| v.speaks("en-US")));
        assert!(!us.is_empty());

        let languages = cache.languages().await;
        assert!(languages.contains(&"en-US".to_string()));
        assert!(!cache.availability().await.is_empty());
    }
}
