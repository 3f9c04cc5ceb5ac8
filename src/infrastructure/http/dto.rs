//! HTTP DTO
//!
//! OpenAI 风格的语音合成请求体。未知字段一律忽略（兼容各类客户端
//! 附带的 model 等参数）

use serde::Deserialize;

/// POST /v1/audio/speech 请求体
#[derive(Debug, Deserialize)]
pub struct SpeechRequestDto {
    /// 要合成的文本；缺失或空白按 400 处理
    pub input: Option<String>,

    /// voice 字符串（别名、参数覆盖、持久化后缀）
    #[serde(default)]
    pub voice: Option<String>,

    /// 输出格式（mp3/aac/wav/opus/flac）
    #[serde(default)]
    pub response_format: Option<String>,

    /// 请求级语速默认值，仅在 voice 字符串未携带语速时生效
    #[serde(default)]
    pub speed: Option<f32>,
}

impl SpeechRequestDto {
    /// 把浮点 speed 归一到语音参数的整数域
    pub fn speed_as_rate(&self, max_param: u8) -> Option<u8> {
        self.speed
            .map(|s| s.round().clamp(0.0, max_param as f32) as u8)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_fields_are_ignored() {
        let dto: SpeechRequestDto = serde_json::from_str(
            r#"{"input": "你好", "model": "tts-1", "voice": "siqi", "stream": true}"#,
        )
        .unwrap();
        assert_eq!(dto.input.as_deref(), Some("你好"));
        assert_eq!(dto.voice.as_deref(), Some("siqi"));
    }

    #[test]
    fn test_speed_is_rounded_and_clamped() {
        let dto: SpeechRequestDto = serde_json::from_str(r#"{"input": "x", "speed": 4.6}"#).unwrap();
        assert_eq!(dto.speed_as_rate(10), Some(5));

        let dto: SpeechRequestDto = serde_json::from_str(r#"{"input": "x", "speed": 99.0}"#).unwrap();
        assert_eq!(dto.speed_as_rate(10), Some(10));

        let dto: SpeechRequestDto = serde_json::from_str(r#"{"input": "x"}"#).unwrap();
        assert_eq!(dto.speed_as_rate(10), None);
    }
}
