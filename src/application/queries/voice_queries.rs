//! Voice Queries - 音色目录查询

/// 列出音色查询
#[derive(Debug, Clone, Default)]
pub struct ListVoices {
    /// 区域代码过滤，None 返回全部
    pub language: Option<String>,
    /// 只返回支持 enhanced 的音色
    pub require_enhanced: bool,
}

/// 列出支持的语言查询
#[derive(Debug, Clone, Default)]
pub struct ListLanguages;
