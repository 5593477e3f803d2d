//! Symphonia Audio Probe - 基于 symphonia 的音频信息探测
//!
//! 只读取容器/帧信息，不解码样本：
//! - 容器给出总帧数时直接计算时长（WAV）
//! - 否则累加各数据包的帧数（MP3）

use std::io::Cursor;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::application::ports::{AudioInfo, AudioProbePort, ProbeError};

#[derive(Debug, Default, Clone, Copy)]
pub struct SymphoniaAudioProbe;

impl SymphoniaAudioProbe {
    pub fn new() -> Self {
        Self
    }
}

impl AudioProbePort for SymphoniaAudioProbe {
    fn probe(&self, data: &[u8], extension_hint: Option<&str>) -> Result<AudioInfo, ProbeError> {
        if data.is_empty() {
            return Err(ProbeError::UnsupportedFormat("empty payload".to_string()));
        }

        let cursor = Cursor::new(data.to_vec());
        let mss = MediaSourceStream::new(Box::new(cursor), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = extension_hint {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe()
            .format(
                &hint,
                mss,
                &FormatOptions::default(),
                &MetadataOptions::default(),
            )
            .map_err(|e| ProbeError::UnsupportedFormat(format!("Probe failed: {}", e)))?;

        let mut format = probed.format;

        let track = format
            .default_track()
            .ok_or_else(|| ProbeError::DecodingError("No audio track found".to_string()))?;
        let track_id = track.id;

        let sample_rate = track
            .codec_params
            .sample_rate
            .filter(|rate| *rate > 0)
            .ok_or_else(|| ProbeError::DecodingError("Unknown sample rate".to_string()))?;
        let channels = track
            .codec_params
            .channels
            .map(|c| c.count() as u8)
            .unwrap_or(1);

        let frames = match track.codec_params.n_frames {
            Some(frames) => frames,
            None => {
                let mut frames = 0u64;
                loop {
                    match format.next_packet() {
                        Ok(packet) if packet.track_id() == track_id => frames += packet.dur,
                        Ok(_) => continue,
                        Err(SymphoniaError::IoError(e))
                            if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                        {
                            break;
                        }
                        Err(e) => {
                            return Err(ProbeError::DecodingError(format!(
                                "Packet read error: {}",
                                e
                            )));
                        }
                    }
                }
                frames
            }
        };

        Ok(AudioInfo {
            sample_rate,
            channels,
            duration_ms: frames * 1000 / sample_rate as u64,
        })
    }
}
