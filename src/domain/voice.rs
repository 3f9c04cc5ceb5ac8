//! Voice Context - 语音配置解析
//!
//! voice 字符串语法: `name[-rate][-pitch][-volume][+s]`
//! - `name`: 基础音色标识（字母、数字、下划线）
//! - 最多三个连字符分隔的非负整数，按位置解释为语速、音调、音量
//! - 尾部 `+s` 表示持久化输出，在其余解析之前剥离
//!
//! 解析是全函数：不匹配语法的字符串整体作为音色标识返回，绝不报错
//! （voice 字符串是配置数据，不是用户输入校验的对象）

use std::collections::HashMap;
use std::path::Path;

/// 持久化输出后缀
pub const PERSIST_SUFFIX: &str = "+s";

/// 解析后的语音配置
///
/// 每个数值覆盖项（如果存在）必须落在 `[0, max_param]` 内；
/// 越界的值被丢弃（视为缺省），不会导致整个请求失败
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoiceSpec {
    /// 基础音色标识
    pub base_voice: String,
    /// 语速覆盖
    pub rate: Option<u8>,
    /// 音调覆盖
    pub pitch: Option<u8>,
    /// 音量覆盖
    pub volume: Option<u8>,
    /// 是否持久化输出
    pub persist: bool,
}

/// 剥离尾部的持久化后缀
///
/// 返回 (剥离后的字符串, 是否带有后缀)
pub fn split_persist_suffix(raw: &str) -> (&str, bool) {
    match raw.strip_suffix(PERSIST_SUFFIX) {
        Some(stripped) => (stripped, true),
        None => (raw, false),
    }
}

impl VoiceSpec {
    /// 解析 voice 字符串
    ///
    /// 纯函数（除告警日志外无副作用）。越界数值逐个丢弃并告警；
    /// 开头不是标识符的字符串整体作为 `base_voice` 返回，无任何覆盖项
    pub fn parse(raw: &str, max_param: u8) -> Self {
        let (body, persist) = split_persist_suffix(raw);

        let base_len: usize = body
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric() || *c == '_')
            .map(char::len_utf8)
            .sum();

        if base_len == 0 {
            tracing::warn!(voice = %raw, "Voice string does not start with an identifier, using it verbatim");
            return Self {
                base_voice: body.to_string(),
                rate: None,
                pitch: None,
                volume: None,
                persist,
            };
        }

        let base_voice = body[..base_len].to_string();
        let mut rest = &body[base_len..];

        // 按位置解析最多三个 `-<digits>` 段
        let mut values: [Option<u8>; 3] = [None, None, None];
        for slot in values.iter_mut() {
            let Some(tail) = rest.strip_prefix('-') else {
                break;
            };
            let digit_len = tail.chars().take_while(|c| c.is_ascii_digit()).count();
            if digit_len == 0 {
                break;
            }
            let (digits, remaining) = tail.split_at(digit_len);
            rest = remaining;

            match digits.parse::<u8>() {
                Ok(value) if value <= max_param => *slot = Some(value),
                Ok(value) => {
                    tracing::warn!(
                        voice = %raw,
                        value,
                        bound = max_param,
                        "Voice parameter outside of bounds, ignoring adjustment"
                    );
                }
                Err(_) => {
                    tracing::warn!(
                        voice = %raw,
                        component = %digits,
                        "Voice parameter too large to parse, ignoring adjustment"
                    );
                }
            }
        }

        if !rest.is_empty() {
            tracing::debug!(voice = %raw, trailing = %rest, "Ignoring trailing voice string content");
        }

        Self {
            base_voice,
            rate: values[0],
            pitch: values[1],
            volume: values[2],
            persist,
        }
    }
}

/// 音色别名表
///
/// 从 JSON 文件加载的 `别名 → voice 字符串` 映射；
/// 文件缺失或格式错误时回退为空表，不影响启动
#[derive(Debug, Clone, Default)]
pub struct VoiceAliases {
    table: HashMap<String, String>,
}

impl VoiceAliases {
    pub fn from_table(table: HashMap<String, String>) -> Self {
        Self { table }
    }

    /// 从 JSON 文件加载别名表
    pub fn load(path: &Path) -> Self {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(_) => {
                tracing::warn!(path = %path.display(), "Voice alias file not found, using empty table");
                return Self::default();
            }
        };

        match serde_json::from_str::<HashMap<String, String>>(&content) {
            Ok(table) => {
                tracing::info!(path = %path.display(), entries = table.len(), "Loaded voice aliases");
                Self { table }
            }
            Err(e) => {
                tracing::error!(path = %path.display(), error = %e, "Malformed voice alias file, using empty table");
                Self::default()
            }
        }
    }

    /// 查找别名，未命中时原样返回输入
    pub fn resolve<'a>(&'a self, name: &'a str) -> &'a str {
        self.table.get(name).map(String::as_str).unwrap_or(name)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_full_voice_string() {
        let spec = VoiceSpec::parse("aiting-3-7-2", 10);
        assert_eq!(spec.base_voice, "aiting");
        assert_eq!(spec.rate, Some(3));
        assert_eq!(spec.pitch, Some(7));
        assert_eq!(spec.volume, Some(2));
        assert!(!spec.persist);
    }

    #[test]
    fn test_parse_bare_name() {
        let spec = VoiceSpec::parse("siqi", 10);
        assert_eq!(spec.base_voice, "siqi");
        assert_eq!(spec.rate, None);
        assert_eq!(spec.pitch, None);
        assert_eq!(spec.volume, None);
    }

    #[test]
    fn test_out_of_bounds_value_is_dropped() {
        // 99 超出上限，按位置消费但值被丢弃
        let spec = VoiceSpec::parse("aiting-99", 10);
        assert_eq!(spec.base_voice, "aiting");
        assert_eq!(spec.rate, None);
    }

    #[test]
    fn test_out_of_bounds_keeps_later_positions() {
        let spec = VoiceSpec::parse("aiting-99-3", 10);
        assert_eq!(spec.rate, None);
        assert_eq!(spec.pitch, Some(3));
    }

    #[test]
    fn test_huge_value_is_dropped() {
        // u8 放不下的数值与越界同样处理
        let spec = VoiceSpec::parse("siqi-1000", 10);
        assert_eq!(spec.rate, None);
    }

    #[test]
    fn test_persist_suffix() {
        let spec = VoiceSpec::parse("siqi+s", 10);
        assert_eq!(spec.base_voice, "siqi");
        assert!(spec.persist);

        let spec = VoiceSpec::parse("siqi-4-6+s", 10);
        assert_eq!(spec.rate, Some(4));
        assert_eq!(spec.pitch, Some(6));
        assert!(spec.persist);
    }

    #[test]
    fn test_unrecognized_string_falls_through() {
        let spec = VoiceSpec::parse("中文音色", 10);
        assert_eq!(spec.base_voice, "中文音色");
        assert_eq!(spec.rate, None);
        assert!(!spec.persist);
    }

    #[test]
    fn test_empty_string_is_total() {
        let spec = VoiceSpec::parse("", 10);
        assert_eq!(spec.base_voice, "");
        assert_eq!(spec.rate, None);
    }

    #[test]
    fn test_trailing_garbage_is_ignored() {
        let spec = VoiceSpec::parse("siqi-4-abc", 10);
        assert_eq!(spec.base_voice, "siqi");
        assert_eq!(spec.rate, Some(4));
        assert_eq!(spec.pitch, None);
    }

    #[test]
    fn test_underscore_names() {
        let spec = VoiceSpec::parse("zhifeng_emo-2", 10);
        assert_eq!(spec.base_voice, "zhifeng_emo");
        assert_eq!(spec.rate, Some(2));
    }

    #[test]
    fn test_split_persist_suffix() {
        assert_eq!(split_persist_suffix("siqi+s"), ("siqi", true));
        assert_eq!(split_persist_suffix("siqi"), ("siqi", false));
    }

    #[test]
    fn test_aliases_resolve() {
        let mut table = HashMap::new();
        table.insert("custom".to_string(), "siqi-5-5-5".to_string());
        let aliases = VoiceAliases::from_table(table);

        assert_eq!(aliases.resolve("custom"), "siqi-5-5-5");
        assert_eq!(aliases.resolve("unknown"), "unknown");
    }

    #[test]
    fn test_aliases_missing_file() {
        let aliases = VoiceAliases::load(Path::new("/nonexistent/voice_mappings.json"));
        assert!(aliases.is_empty());
    }

    #[test]
    fn test_aliases_malformed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{not-json").unwrap();

        let aliases = VoiceAliases::load(file.path());
        assert!(aliases.is_empty());
    }

    #[test]
    fn test_aliases_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(br#"{"siqi": "siqi", "custom": "aiting-3"}"#)
            .unwrap();

        let aliases = VoiceAliases::load(file.path());
        assert_eq!(aliases.len(), 2);
        assert_eq!(aliases.resolve("custom"), "aiting-3");
    }
}
