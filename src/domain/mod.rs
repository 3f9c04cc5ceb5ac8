//! 领域层
//!
//! Voice Context: 语音配置字符串解析与别名表

pub mod voice;

pub use voice::{split_persist_suffix, VoiceAliases, VoiceSpec};
