//! Timeline - 口型/单词时间轴
//!
//! 外部合成服务返回逐行 JSON 的语音标记（speech marks），
//! 这里负责解析并将 viseme 符号映射为前端使用的口型

use serde::{Deserialize, Serialize};

/// 前端口型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MouthShape {
    Pp,
    Dd,
    ChShJh,
    Th,
    Ff,
    Kk,
    Ee,
    Rr,
    Ss,
    Uw,
    Ax,
    Aa,
    Eh,
    Ao,
    Ow,
    Ey,
    Uh,
    Sil,
    /// 未知符号的默认口型
    Rest,
}

impl MouthShape {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pp => "PP",
            Self::Dd => "DD",
            Self::ChShJh => "CH_SH_JH",
            Self::Th => "TH",
            Self::Ff => "FF",
            Self::Kk => "KK",
            Self::Ee => "EE",
            Self::Rr => "RR",
            Self::Ss => "SS",
            Self::Uw => "UW",
            Self::Ax => "AX",
            Self::Aa => "AA",
            Self::Eh => "EH",
            Self::Ao => "AO",
            Self::Ow => "OW",
            Self::Ey => "EY",
            Self::Uh => "UH",
            Self::Sil => "SIL",
            Self::Rest => "REST",
        }
    }
}

/// viseme 符号 → 口型（区分大小写）
pub const VISEME_TABLE: &[(&str, MouthShape)] = &[
    ("p", MouthShape::Pp),
    ("t", MouthShape::Dd),
    ("S", MouthShape::ChShJh),
    ("T", MouthShape::Th),
    ("f", MouthShape::Ff),
    ("k", MouthShape::Kk),
    ("i", MouthShape::Ee),
    ("r", MouthShape::Rr),
    ("s", MouthShape::Ss),
    ("u", MouthShape::Uw),
    ("@", MouthShape::Ax),
    ("a", MouthShape::Aa),
    ("e", MouthShape::Eh),
    ("o", MouthShape::Ao),
    ("O", MouthShape::Ow),
    ("E", MouthShape::Ey),
    ("U", MouthShape::Uh),
    ("sil", MouthShape::Sil),
];

/// 映射 viseme 符号，未知符号返回 `MouthShape::Rest`
pub fn map_viseme(symbol: &str) -> MouthShape {
    VISEME_TABLE
        .iter()
        .find(|(s, _)| *s == symbol)
        .map(|(_, shape)| *shape)
        .unwrap_or(MouthShape::Rest)
}

/// 标记类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkKind {
    Viseme,
    Word,
}

/// 时间轴事件
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineEvent {
    pub time_ms: u64,
    pub kind: MarkKind,
    /// 服务返回的原始值（viseme 符号或单词）
    pub value: String,
    /// 仅 viseme 事件有值
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shape: Option<MouthShape>,
}

/// 服务返回的单行标记
#[derive(Debug, Deserialize)]
struct RawMark {
    time: i64,
    #[serde(rename = "type")]
    kind: String,
    value: String,
}

/// 解析逐行 JSON 标记
///
/// 保持服务返回顺序；格式错误、时间为负或类型不支持的行被跳过
pub fn parse_speech_marks(payload: &str) -> Vec<TimelineEvent> {
    let mut events = Vec::new();
    let mut skipped = 0usize;

    for line in payload.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let raw: RawMark = match serde_json::from_str(line) {
            Ok(raw) => raw,
            Err(_) => {
                skipped += 1;
                continue;
            }
        };

        let Ok(time_ms) = u64::try_from(raw.time) else {
            skipped += 1;
            continue;
        };

        let event = match raw.kind.as_str() {
            "viseme" => TimelineEvent {
                time_ms,
                kind: MarkKind::Viseme,
                shape: Some(map_viseme(&raw.value)),
                value: raw.value,
            },
            "word" => TimelineEvent {
                time_ms,
                kind: MarkKind::Word,
                value: raw.value,
                shape: None,
            },
            // sentence / ssml 等标记不进入时间轴
            _ => continue,
        };
        events.push(event);
    }

    if skipped > 0 {
        tracing::debug!(skipped, "Skipped malformed speech mark lines");
    }

    events
}

/// 前端口型过渡参数
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisemeTiming {
    pub min_frame_ms: u32,
    pub clamp_lead_ms: u32,
    pub clamp_trail_ms: u32,
    pub blend_in: f32,
    pub blend_out: f32,
}

impl Default for VisemeTiming {
    fn default() -> Self {
        Self {
            min_frame_ms: 16,
            clamp_lead_ms: 80,
            clamp_trail_ms: 80,
            blend_in: 0.06,
            blend_out: 0.08,
        }
    }
}
