//! Transcoder Port - 音频转码抽象
//!
//! 定义外部编码器的抽象接口与输出格式表

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// 转码错误
#[derive(Debug, Error)]
pub enum TranscodeError {
    /// 编码器非零退出，携带捕获的诊断输出
    #[error("encoder failed: {0}")]
    EncoderFailed(String),

    /// 无法启动编码器进程
    #[error("io error: {0}")]
    Io(String),

    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// 音频输出格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    /// 后端原生格式，不转码
    #[default]
    Mp3,
    Aac,
    Wav,
    Opus,
    Flac,
}

/// 格式档案：编码器名、容器名、有损格式的固定码率
///
/// 单表驱动转码参数，每个格式一条记录
#[derive(Debug, Clone, Copy)]
pub struct FormatProfile {
    pub codec: &'static str,
    pub container: &'static str,
    /// 有损格式的目标码率；无损/PCM 不传码率参数
    pub bitrate: Option<&'static str>,
}

impl AudioFormat {
    /// 查询格式档案
    pub fn profile(&self) -> FormatProfile {
        match self {
            AudioFormat::Mp3 => FormatProfile {
                codec: "libmp3lame",
                container: "mp3",
                bitrate: Some("192k"),
            },
            AudioFormat::Aac => FormatProfile {
                codec: "aac",
                container: "mp4",
                bitrate: Some("192k"),
            },
            AudioFormat::Wav => FormatProfile {
                codec: "pcm_s16le",
                container: "wav",
                bitrate: None,
            },
            AudioFormat::Opus => FormatProfile {
                codec: "libopus",
                container: "ogg",
                bitrate: Some("192k"),
            },
            AudioFormat::Flac => FormatProfile {
                codec: "flac",
                container: "flac",
                bitrate: None,
            },
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Aac => "aac",
            AudioFormat::Wav => "wav",
            AudioFormat::Opus => "opus",
            AudioFormat::Flac => "flac",
        }
    }

    /// HTTP 响应的 MIME 类型
    pub fn mime_type(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "audio/mpeg",
            AudioFormat::Aac => "audio/aac",
            AudioFormat::Wav => "audio/wav",
            AudioFormat::Opus => "audio/ogg",
            AudioFormat::Flac => "audio/flac",
        }
    }
}

impl std::fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.extension())
    }
}

impl std::str::FromStr for AudioFormat {
    type Err = TranscodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mp3" => Ok(AudioFormat::Mp3),
            "aac" => Ok(AudioFormat::Aac),
            "wav" => Ok(AudioFormat::Wav),
            "opus" => Ok(AudioFormat::Opus),
            "flac" => Ok(AudioFormat::Flac),
            _ => Err(TranscodeError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// Transcoder Port
///
/// 外部编码器的抽象接口
#[async_trait]
pub trait TranscoderPort: Send + Sync {
    /// 编码器是否可用（廉价能力探测）
    async fn available(&self) -> bool;

    /// 把 `source` 转码为 `target` 格式写到 `destination`
    ///
    /// 调用是阻塞式的（等待子进程退出），两路输出流都被捕获
    async fn transcode(
        &self,
        source: &Path,
        target: AudioFormat,
        destination: &Path,
    ) -> Result<(), TranscodeError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_format_round_trip() {
        for name in ["mp3", "aac", "wav", "opus", "flac"] {
            let format = AudioFormat::from_str(name).unwrap();
            assert_eq!(format.to_string(), name);
        }
        assert!(AudioFormat::from_str("pcm").is_err());
    }

    #[test]
    fn test_lossless_profiles_carry_no_bitrate() {
        assert_eq!(AudioFormat::Wav.profile().bitrate, None);
        assert_eq!(AudioFormat::Flac.profile().bitrate, None);
        assert_eq!(AudioFormat::Opus.profile().bitrate, Some("192k"));
    }

    #[test]
    fn test_aac_uses_mp4_container() {
        let profile = AudioFormat::Aac.profile();
        assert_eq!(profile.codec, "aac");
        assert_eq!(profile.container, "mp4");
    }

    #[test]
    fn test_mime_types() {
        assert_eq!(AudioFormat::Mp3.mime_type(), "audio/mpeg");
        assert_eq!(AudioFormat::Opus.mime_type(), "audio/ogg");
    }
}
