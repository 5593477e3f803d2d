//! Fake Translator - 在文本前加上目标语言标签

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use crate::application::ports::{ProviderError, TranslationPort, TranslationRequest};

#[derive(Default)]
pub struct FakeTranslator {
    calls: AtomicUsize,
    fail: AtomicBool,
    last_request: Mutex<Option<TranslationRequest>>,
}

impl FakeTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<TranslationRequest> {
        self.last_request.lock().ok().and_then(|r| r.clone())
    }

    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl TranslationPort for FakeTranslator {
    async fn translate(&self, request: &TranslationRequest) -> Result<String, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.last_request.lock() {
            *last = Some(request.clone());
        }

        if self.fail.load(Ordering::SeqCst) {
            return Err(ProviderError::service(503, "fake translation outage"));
        }

        Ok(format!("[{}] {}", request.target, request.text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_tags_with_target() {
        let fake = FakeTranslator::new();
        let out = fake
            .translate(&TranslationRequest {
                text: "hi".into(),
                source: "en".into(),
                target: "de".into(),
                style: None,
            })
            .await
            .unwrap();
        assert_eq!(out, "[de] hi");
        assert_eq!(fake.calls(), 1);
        assert_eq!(fake.last_request().unwrap().source, "en");
    }
}
