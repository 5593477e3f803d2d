//! Fake Speech Synthesizer - 用于测试和本地开发的合成服务
//!
//! 不调用外部服务：
//! - 音频为按文本长度生成的静音 WAV
//! - 语音标记由文本逐字符推导（word + viseme，以 sil 结束）
//! - 音色目录来自配置，按 page_size 分页返回

use async_trait::async_trait;
use serde_json::json;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::application::ports::{
    ProviderError, SpeechSynthesisPort, SynthesisRequest, SynthesizedAudio, VoicePage,
};
use crate::domain::voice::{Gender, QualityTier, Voice};

/// Fake Synthesizer 配置
#[derive(Debug, Clone)]
pub struct FakeSpeechSynthesizerConfig {
    pub catalog: Vec<Voice>,
    /// 每页音色数
    pub page_size: usize,
    /// 模拟网络延迟
    pub latency: Duration,
    /// 为 false 时拒绝 enhanced 等级
    pub enhanced_available: bool,
    /// 每个字符的发音时长
    pub ms_per_char: u64,
}

impl Default for FakeSpeechSynthesizerConfig {
    fn default() -> Self {
        Self {
            catalog: default_catalog(),
            page_size: 2,
            latency: Duration::ZERO,
            enhanced_available: true,
            ms_per_char: 60,
        }
    }
}

fn default_catalog() -> Vec<Voice> {
    use QualityTier::{Enhanced, Standard};

    vec![
        Voice::new("Matthew", Gender::Male)
            .with_language("en-US")
            .with_tier(Standard)
            .with_tier(Enhanced),
        Voice::new("Joanna", Gender::Female)
            .with_language("en-US")
            .with_tier(Standard)
            .with_tier(Enhanced),
        Voice::new("Brian", Gender::Male)
            .with_language("en-GB")
            .with_tier(Standard)
            .with_tier(Enhanced),
        Voice::new("Emma", Gender::Female)
            .with_language("en-GB")
            .with_tier(Enhanced),
        Voice::new("Zhiyu", Gender::Female)
            .with_language("cmn-CN")
            .with_tier(Standard)
            .with_tier(Enhanced),
        Voice::new("Hiujin", Gender::Female)
            .with_language("yue-CN")
            .with_tier(Enhanced),
        Voice::new("Lea", Gender::Female)
            .with_language("fr-FR")
            .with_tier(Standard)
            .with_tier(Enhanced),
        Voice::new("Sergio", Gender::Male)
            .with_language("es-ES")
            .with_tier(Enhanced),
    ]
}

/// Fake Speech Synthesizer
pub struct FakeSpeechSynthesizer {
    config: FakeSpeechSynthesizerConfig,
    list_calls: AtomicUsize,
    audio_calls: AtomicUsize,
    marks_calls: AtomicUsize,
    fail_catalog: AtomicBool,
    fail_synthesis: AtomicBool,
    requests: Mutex<Vec<SynthesisRequest>>,
}

impl FakeSpeechSynthesizer {
    pub fn new(config: FakeSpeechSynthesizerConfig) -> Self {
        Self {
            config,
            list_calls: AtomicUsize::new(0),
            audio_calls: AtomicUsize::new(0),
            marks_calls: AtomicUsize::new(0),
            fail_catalog: AtomicBool::new(false),
            fail_synthesis: AtomicBool::new(false),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(FakeSpeechSynthesizerConfig::default())
    }

    pub fn catalog(&self) -> &[Voice] {
        &self.config.catalog
    }

    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn audio_calls(&self) -> usize {
        self.audio_calls.load(Ordering::SeqCst)
    }

    pub fn marks_calls(&self) -> usize {
        self.marks_calls.load(Ordering::SeqCst)
    }

    /// 已收到的音频渲染请求
    pub fn requests(&self) -> Vec<SynthesisRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    pub fn fail_catalog(&self, fail: bool) {
        self.fail_catalog.store(fail, Ordering::SeqCst);
    }

    pub fn fail_synthesis(&self, fail: bool) {
        self.fail_synthesis.store(fail, Ordering::SeqCst);
    }

    async fn simulate_latency(&self) {
        if !self.config.latency.is_zero() {
            tokio::time::sleep(self.config.latency).await;
        }
    }

    fn check_request(&self, request: &SynthesisRequest) -> Result<(), ProviderError> {
        if self.fail_synthesis.load(Ordering::SeqCst) {
            return Err(ProviderError::service(500, "fake synthesis failure"));
        }
        if request.tier == QualityTier::Enhanced && !self.config.enhanced_available {
            return Err(ProviderError::TierRejected(format!(
                "voice {} does not support enhanced",
                request.voice_id
            )));
        }
        Ok(())
    }

    fn duration_ms(&self, text: &str) -> u64 {
        (text.chars().count() as u64 * self.config.ms_per_char).max(100)
    }

    /// 生成逐行 JSON 标记
    fn render_marks(&self, text: &str) -> String {
        let step = self.config.ms_per_char;
        let mut lines = Vec::new();
        let mut time_ms = 0u64;
        let mut in_word = false;

        for (offset, c) in text.char_indices() {
            if c.is_whitespace() {
                in_word = false;
                time_ms += step;
                continue;
            }

            if !in_word {
                let word: String = text[offset..]
                    .chars()
                    .take_while(|c| !c.is_whitespace())
                    .collect();
                lines.push(json!({
                    "time": time_ms,
                    "type": "word",
                    "start": offset,
                    "end": offset + word.len(),
                    "value": word,
                }));
                in_word = true;
            }

            lines.push(json!({
                "time": time_ms,
                "type": "viseme",
                "value": viseme_for(c),
            }));
            time_ms += step;
        }

        lines.push(json!({
            "time": time_ms,
            "type": "viseme",
            "value": "sil",
        }));

        lines
            .iter()
            .map(|l| l.to_string())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// 字符对应的 viseme 符号（粗略）
fn viseme_for(c: char) -> &'static str {
    match c.to_ascii_lowercase() {
        'a' => "a",
        'e' => "e",
        'i' | 'y' => "i",
        'o' => "o",
        'u' | 'w' => "u",
        'p' | 'b' | 'm' => "p",
        'f' | 'v' => "f",
        't' | 'd' | 'n' | 'l' => "t",
        's' | 'z' => "s",
        'k' | 'g' | 'c' | 'q' | 'x' | 'h' => "k",
        'r' => "r",
        'j' => "S",
        c if c.is_alphanumeric() => "@",
        _ => "sil",
    }
}

/// 16-bit 单声道静音 WAV
fn silent_wav(sample_rate: u32, duration_ms: u64) -> Vec<u8> {
    let num_channels: u16 = 1;
    let bits_per_sample: u16 = 16;
    let num_samples = (sample_rate as u64 * duration_ms / 1000) as usize;

    let data_size = num_samples * (bits_per_sample as usize / 8) * num_channels as usize;
    let file_size = 36 + data_size;
    let byte_rate = sample_rate * num_channels as u32 * (bits_per_sample / 8) as u32;
    let block_align = num_channels * (bits_per_sample / 8);

    let mut wav = Vec::with_capacity(44 + data_size);
    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&(file_size as u32).to_le_bytes());
    wav.extend_from_slice(b"WAVE");

    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes()); // PCM
    wav.extend_from_slice(&num_channels.to_le_bytes());
    wav.extend_from_slice(&sample_rate.to_le_bytes());
    wav.extend_from_slice(&byte_rate.to_le_bytes());
    wav.extend_from_slice(&block_align.to_le_bytes());
    wav.extend_from_slice(&bits_per_sample.to_le_bytes());

    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&(data_size as u32).to_le_bytes());
    wav.resize(44 + data_size, 0);

    wav
}

#[async_trait]
impl SpeechSynthesisPort for FakeSpeechSynthesizer {
    async fn list_voices(&self, page_token: Option<&str>) -> Result<VoicePage, ProviderError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;

        if self.fail_catalog.load(Ordering::SeqCst) {
            return Err(ProviderError::NetworkError("fake catalog outage".to_string()));
        }

        let start = match page_token {
            Some(token) => token
                .parse::<usize>()
                .map_err(|_| ProviderError::InvalidResponse(format!("bad page token: {}", token)))?,
            None => 0,
        };
        let page_size = self.config.page_size.max(1);
        let end = (start + page_size).min(self.config.catalog.len());

        Ok(VoicePage {
            voices: self.config.catalog.get(start..end).unwrap_or_default().to_vec(),
            next_page_token: (end < self.config.catalog.len()).then(|| end.to_string()),
        })
    }

    async fn synthesize_audio(
        &self,
        request: &SynthesisRequest,
    ) -> Result<SynthesizedAudio, ProviderError> {
        self.audio_calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request.clone());
        }
        self.simulate_latency().await;
        self.check_request(request)?;

        tracing::debug!(
            voice_id = %request.voice_id,
            tier = %request.tier,
            "FakeSpeechSynthesizer: rendering silent audio"
        );

        Ok(SynthesizedAudio {
            bytes: silent_wav(request.sample_rate_hz, self.duration_ms(&request.text)),
            mime: "audio/wav".to_string(),
        })
    }

    async fn synthesize_marks(&self, request: &SynthesisRequest) -> Result<String, ProviderError> {
        self.marks_calls.fetch_add(1, Ordering::SeqCst);
        self.simulate_latency().await;
        self.check_request(request)?;

        Ok(self.render_marks(&request.text))
    }
}
