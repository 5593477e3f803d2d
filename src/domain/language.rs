//! Language Normalizer - 语言代码归一化
//!
//! 将合成/识别使用的区域代码（如 "en-US"）转换为翻译服务使用的语言代码（如 "en"）

/// 区域代码 → 翻译代码映射表
///
/// 表中未出现的代码按主子标签（primary subtag）再查一次
const LOCALE_TABLE: &[(&str, &str)] = &[
    ("en", "en"),
    ("en-us", "en"),
    ("en-gb", "en"),
    ("en-au", "en"),
    ("en-in", "en"),
    ("ms", "ms"),
    ("ms-my", "ms"),
    ("zh", "zh"),
    ("zh-cn", "zh"),
    ("zh-tw", "zh"),
    ("cmn", "zh"),
    ("cmn-cn", "zh"),
    ("yue", "yue"),
    ("yue-hk", "yue"),
    ("ja", "ja"),
    ("ja-jp", "ja"),
    ("ko", "ko"),
    ("ko-kr", "ko"),
    ("es", "es"),
    ("es-es", "es"),
    ("es-mx", "es"),
    ("es-us", "es"),
    ("fr", "fr"),
    ("fr-fr", "fr"),
    ("fr-ca", "fr"),
    ("it", "it"),
    ("it-it", "it"),
    ("pt", "pt"),
    ("pt-pt", "pt"),
    ("pt-br", "pt"),
    ("ru", "ru"),
    ("ru-ru", "ru"),
    ("de", "de"),
    ("de-de", "de"),
    ("hi", "hi"),
    ("hi-in", "hi"),
    ("ta", "ta"),
    ("ta-in", "ta"),
];

/// 翻译服务支持的目标语言
///
/// "yue" 可以归一化，但不在支持集合内
pub const TRANSLATABLE_CODES: &[&str] = &[
    "en", "ms", "zh", "ja", "ko", "es", "fr", "it", "pt", "ru", "de", "hi", "ta",
];

fn lookup(code: &str) -> Option<&'static str> {
    LOCALE_TABLE
        .iter()
        .find(|(locale, _)| *locale == code)
        .map(|(_, translated)| *translated)
}

/// 区域代码 → 翻译代码
///
/// 大小写与 `_`/`-` 分隔符不敏感；空值或未知代码返回 `None`，从不报错
pub fn to_translation_code(locale: Option<&str>) -> Option<&'static str> {
    let normalized = locale?.trim().replace('_', "-").to_lowercase();
    if normalized.is_empty() {
        return None;
    }

    if let Some(code) = lookup(&normalized) {
        return Some(code);
    }

    let primary = normalized.split('-').next()?;
    lookup(primary)
}

/// 目标代码是否可翻译
pub fn is_translatable(code: &str) -> bool {
    TRANSLATABLE_CODES.contains(&code)
}

/// 两个区域代码是否属于同一翻译语言
pub fn same_language(a: Option<&str>, b: Option<&str>) -> bool {
    match (to_translation_code(a), to_translation_code(b)) {
        (Some(x), Some(y)) => x == y,
        _ => false,
    }
}
