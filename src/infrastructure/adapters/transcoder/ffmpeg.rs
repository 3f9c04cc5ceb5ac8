//! FFmpeg Transcoder - 外部编码器实现
//!
//! 实现 TranscoderPort trait，调用 ffmpeg 子进程完成容器/编码转换。
//! 调用是阻塞式的（等待子进程退出），两路输出流都被捕获；
//! 非零退出作为硬失败，携带捕获的 stderr

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

use crate::application::ports::{AudioFormat, TranscodeError, TranscoderPort};

/// FFmpeg 转码器
pub struct FfmpegTranscoder {
    binary: PathBuf,
}

impl FfmpegTranscoder {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// 构造一次调用的参数列表
    ///
    /// 有损格式带固定码率，PCM/无损不传码率参数；`-y` 强制覆盖目标
    fn build_args(source: &Path, target: AudioFormat, destination: &Path) -> Vec<String> {
        let profile = target.profile();
        let mut args = vec![
            "-i".to_string(),
            source.to_string_lossy().into_owned(),
            "-c:a".to_string(),
            profile.codec.to_string(),
        ];
        if let Some(bitrate) = profile.bitrate {
            args.push("-b:a".to_string());
            args.push(bitrate.to_string());
        }
        args.push("-f".to_string());
        args.push(profile.container.to_string());
        args.push("-y".to_string());
        args.push(destination.to_string_lossy().into_owned());
        args
    }
}

impl Default for FfmpegTranscoder {
    fn default() -> Self {
        Self::new("ffmpeg")
    }
}

#[async_trait]
impl TranscoderPort for FfmpegTranscoder {
    async fn available(&self) -> bool {
        Command::new(&self.binary)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|status| status.success())
            .unwrap_or(false)
    }

    async fn transcode(
        &self,
        source: &Path,
        target: AudioFormat,
        destination: &Path,
    ) -> Result<(), TranscodeError> {
        let args = Self::build_args(source, target, destination);
        tracing::debug!(binary = %self.binary.display(), args = ?args, "Running encoder");

        let output = Command::new(&self.binary)
            .args(&args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| TranscodeError::Io(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            return Err(TranscodeError::EncoderFailed(stderr));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wav_args_have_no_bitrate_flag() {
        let args = FfmpegTranscoder::build_args(
            Path::new("/tmp/in.mp3"),
            AudioFormat::Wav,
            Path::new("/tmp/out.wav"),
        );
        assert!(args.contains(&"pcm_s16le".to_string()));
        assert!(!args.contains(&"-b:a".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("/tmp/out.wav"));
    }

    #[test]
    fn test_lossy_args_carry_fixed_bitrate() {
        let args = FfmpegTranscoder::build_args(
            Path::new("/tmp/in.mp3"),
            AudioFormat::Aac,
            Path::new("/tmp/out.aac"),
        );
        let bitrate_pos = args.iter().position(|a| a == "-b:a").unwrap();
        assert_eq!(args[bitrate_pos + 1], "192k");
        // AAC 封装在 mp4 容器中
        let container_pos = args.iter().position(|a| a == "-f").unwrap();
        assert_eq!(args[container_pos + 1], "mp4");
    }

    #[test]
    fn test_overwrite_flag_present() {
        let args = FfmpegTranscoder::build_args(
            Path::new("/tmp/in.mp3"),
            AudioFormat::Opus,
            Path::new("/tmp/out.opus"),
        );
        assert!(args.contains(&"-y".to_string()));
    }

    #[tokio::test]
    async fn test_missing_binary_is_unavailable() {
        let transcoder = FfmpegTranscoder::new("/nonexistent/ffmpeg");
        assert!(!transcoder.available().await);
    }

    #[tokio::test]
    async fn test_missing_binary_fails_transcode_with_io() {
        let transcoder = FfmpegTranscoder::new("/nonexistent/ffmpeg");
        let err = transcoder
            .transcode(
                Path::new("/tmp/in.mp3"),
                AudioFormat::Wav,
                Path::new("/tmp/out.wav"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, TranscodeError::Io(_)));
    }
}
