//! Viseme Query Handlers

use crate::application::queries::GetVisemeMap;
use crate::domain::timeline::{MouthShape, VisemeTiming, VISEME_TABLE};

/// viseme 映射响应
#[derive(Debug, Clone, PartialEq)]
pub struct VisemeMapResponse {
    /// (符号, 口型) 对，顺序同映射表
    pub mapping: Vec<(String, MouthShape)>,
    /// 未知符号使用的口型
    pub default_shape: MouthShape,
    pub timing: VisemeTiming,
}

/// GetVisemeMap Handler
#[derive(Debug, Default)]
pub struct GetVisemeMapHandler;

impl GetVisemeMapHandler {
    pub fn new() -> Self {
        Self
    }

    pub fn handle(&self, _query: GetVisemeMap) -> VisemeMapResponse {
        VisemeMapResponse {
            mapping: VISEME_TABLE
                .iter()
                .map(|(symbol, shape)| (symbol.to_string(), *shape))
                .collect(),
            default_shape: MouthShape::Rest,
            timing: VisemeTiming::default(),
        }
    }
}
