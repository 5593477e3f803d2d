//! Synthesis Stage - 合成阶段
//!
//! 对同一文本/音色/等级并发发起两次渲染（音频 + 语音标记），
//! 将标记归一化为时间轴。等级被拒绝时以 standard 重试一次

use std::sync::Arc;

use crate::application::error::PipelineError;
use crate::application::ports::{
    ProviderError, SpeechSynthesisPort, SynthesisRequest, SynthesizedAudio,
};
use crate::domain::timeline::{parse_speech_marks, TimelineEvent};
use crate::domain::voice::QualityTier;

/// 合成结果
#[derive(Debug, Clone)]
pub struct SynthesisOutput {
    pub audio: SynthesizedAudio,
    pub timeline: Vec<TimelineEvent>,
    /// 服务返回的原始标记（调试用）
    pub raw_marks: String,
    /// 实际使用的等级
    pub tier: QualityTier,
}

pub struct SynthesisStage {
    synthesizer: Arc<dyn SpeechSynthesisPort>,
}

impl SynthesisStage {
    pub fn new(synthesizer: Arc<dyn SpeechSynthesisPort>) -> Self {
        Self { synthesizer }
    }

    pub async fn synthesize(
        &self,
        text: &str,
        voice_id: &str,
        tier: QualityTier,
        sample_rate_hz: u32,
    ) -> Result<SynthesisOutput, PipelineError> {
        if text.trim().is_empty() {
            return Err(PipelineError::SynthesisFailed(
                "nothing to synthesize".to_string(),
            ));
        }

        let request = SynthesisRequest {
            text: text.to_string(),
            voice_id: voice_id.to_string(),
            tier,
            sample_rate_hz,
        };

        let (audio, marks, used_tier) = match self.render(&request).await {
            Ok((audio, marks)) => (audio, marks, tier),
            Err(ProviderError::TierRejected(reason)) if tier != QualityTier::Standard => {
                tracing::warn!(
                    voice_id = %voice_id,
                    tier = %tier,
                    reason = %reason,
                    "Quality tier rejected, retrying at standard"
                );
                let (audio, marks) = self
                    .render(&request.at_tier(QualityTier::Standard))
                    .await
                    .map_err(|e| Self::failure(voice_id, e))?;
                (audio, marks, QualityTier::Standard)
            }
            Err(e) => return Err(Self::failure(voice_id, e)),
        };

        if audio.bytes.is_empty() {
            return Err(PipelineError::SynthesisFailed(
                "provider returned empty audio".to_string(),
            ));
        }

        let timeline = parse_speech_marks(&marks);

        tracing::info!(
            voice_id = %voice_id,
            tier = %used_tier,
            audio_bytes = audio.bytes.len(),
            timeline_events = timeline.len(),
            "Speech synthesized"
        );

        Ok(SynthesisOutput {
            audio,
            timeline,
            raw_marks: marks,
            tier: used_tier,
        })
    }

    /// 并发渲染音频与标记，任一失败即失败
    async fn render(
        &self,
        request: &SynthesisRequest,
    ) -> Result<(SynthesizedAudio, String), ProviderError> {
        let (audio, marks) = tokio::join!(
            self.synthesizer.synthesize_audio(request),
            self.synthesizer.synthesize_marks(request),
        );
        Ok((audio?, marks?))
    }

    fn failure(voice_id: &str, err: ProviderError) -> PipelineError {
        tracing::error!(voice_id = %voice_id, error = %err, "Synthesis provider failed");
        PipelineError::SynthesisFailed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::timeline::MarkKind;
    use crate::infrastructure::adapters::{FakeSpeechSynthesizer, FakeSpeechSynthesizerConfig};

    fn stage(config: FakeSpeechSynthesizerConfig) -> (SynthesisStage, Arc<FakeSpeechSynthesizer>) {
        let fake = Arc::new(FakeSpeechSynthesizer::new(config));
        (SynthesisStage::new(fake.clone()), fake)
    }

    #[tokio::test]
    async fn test_renders_audio_and_timeline() {
        let (stage, fake) = stage(FakeSpeechSynthesizerConfig::default());
        let out = stage
            .synthesize("Good morning", "Joanna", QualityTier::Enhanced, 24000)
            .await
            .unwrap();

        assert!(!out.audio.bytes.is_empty());
        assert_eq!(out.tier, QualityTier::Enhanced);
        assert!(out.timeline.iter().any(|e| e.kind == MarkKind::Word));
        assert!(out.timeline.iter().any(|e| e.kind == MarkKind::Viseme));
        assert_eq!(fake.audio_calls(), 1);
        assert_eq!(fake.marks_calls(), 1);
    }

    #[tokio::test]
    async fn test_timeline_preserves_provider_order() {
        let (stage, _) = stage(FakeSpeechSynthesizerConfig::default());
        let out = stage
            .synthesize("hello there", "Joanna", QualityTier::Standard, 16000)
            .await
            .unwrap();

        let times: Vec<u64> = out.timeline.iter().map(|e| e.time_ms).collect();
        let mut sorted = times.clone();
        sorted.sort();
        assert_eq!(times, sorted);

        let visemes_in = out.raw_marks.matches("\"viseme\"").count();
        let visemes_out = out
            .timeline
            .iter()
            .filter(|e| e.kind == MarkKind::Viseme)
            .count();
        assert_eq!(visemes_in, visemes_out);
    }

    #[tokio::test]
    async fn test_tier_rejection_retries_at_standard() {
        let (stage, fake) = stage(FakeSpeechSynthesizerConfig {
            enhanced_available: false,
            ..Default::default()
        });
        let out = stage
            .synthesize("Good morning", "Joanna", QualityTier::Enhanced, 24000)
            .await
            .unwrap();

        assert_eq!(out.tier, QualityTier::Standard);
        assert_eq!(fake.audio_calls(), 2);
        assert_eq!(fake.marks_calls(), 2);
        assert!(fake
            .requests()
            .iter()
            .all(|r| r.voice_id == "Joanna" && r.text == "Good morning"));
    }

    #[tokio::test]
    async fn test_provider_failure() {
        let (stage, fake) = stage(FakeSpeechSynthesizerConfig::default());
        fake.fail_synthesis(true);
        let err = stage
            .synthesize("Good morning", "Joanna", QualityTier::Standard, 24000)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::SynthesisFailed(_)));
        assert_eq!(fake.audio_calls(), 1);
    }

    #[tokio::test]
    async fn test_blank_text_rejected_without_calls() {
        let (stage, fake) = stage(FakeSpeechSynthesizerConfig::default());
        let err = stage
            .synthesize("   ", "Joanna", QualityTier::Standard, 24000)
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::SynthesisFailed(_)));
        assert_eq!(fake.audio_calls(), 0);
    }
}
