//! Viseme Queries - 口型映射查询

/// 获取 viseme 映射表与前端过渡参数
#[derive(Debug, Clone, Default)]
pub struct GetVisemeMap;
