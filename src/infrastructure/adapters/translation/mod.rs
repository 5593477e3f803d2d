//! Translation Adapter - 短语翻译与生成式翻译

mod generative_translator;
mod phrase_translator;

pub use generative_translator::GenerativeTranslator;
pub use phrase_translator::PhraseTranslator;
