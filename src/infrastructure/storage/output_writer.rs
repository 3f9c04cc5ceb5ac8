//! Output Writer - 持久化输出实现
//!
//! 实现 OutputStorePort trait。持久文件名由净化后的音色标识、
//! 秒级时间戳与格式扩展名确定；总是复制而非移动，源文件的清理
//! 预约与持久化结果互不影响

use async_trait::async_trait;
use id3::TagLike;
use std::path::{Path, PathBuf};

use crate::application::ports::{AudioFormat, OutputStorePort, PersistError};

/// 持久化输出写入器
pub struct OutputWriter {
    output_dir: PathBuf,
}

impl OutputWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn build_file_name(voice_id: &str, format: AudioFormat, transcoded: bool) -> String {
        let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
        // 未转码时内容仍是后端原生 mp3
        let extension = if transcoded {
            format.extension()
        } else {
            AudioFormat::Mp3.extension()
        };
        format!("{}_{}.{}", voice_id.replace('-', "_"), timestamp, extension)
    }
}

#[async_trait]
impl OutputStorePort for OutputWriter {
    async fn persist(
        &self,
        source: &Path,
        text: &str,
        voice_id: &str,
        format: AudioFormat,
        transcoded: bool,
    ) -> Result<PathBuf, PersistError> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| PersistError::Io(e.to_string()))?;

        let destination = self
            .output_dir
            .join(Self::build_file_name(voice_id, format, transcoded));

        tokio::fs::copy(source, &destination)
            .await
            .map_err(|e| PersistError::Copy(e.to_string()))?;

        // 仅未转码的 mp3 嵌入标题；标签失败不影响持久化结果
        if format == AudioFormat::Mp3 && !transcoded {
            if let Err(e) = embed_title(&destination, text) {
                tracing::warn!(
                    path = %destination.display(),
                    error = %e,
                    "Failed to embed title tag"
                );
            }
        }

        tracing::info!(path = %destination.display(), "Persisted audio file");
        Ok(destination)
    }
}

/// 把原始文本写入 ID3 标题标签
fn embed_title(path: &Path, title: &str) -> Result<(), id3::Error> {
    let mut tag = id3::Tag::read_from_path(path).unwrap_or_default();
    tag.set_title(title);
    tag.write_to_path(path, id3::Version::Id3v24)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_persist_copies_instead_of_moving() {
        let src_dir = tempdir().unwrap();
        let out_dir = tempdir().unwrap();
        let source = src_dir.path().join("tts-a.mp3");
        tokio::fs::write(&source, b"fake mp3 bytes").await.unwrap();

        let writer = OutputWriter::new(out_dir.path());
        let saved = writer
            .persist(&source, "测试文本", "siqi", AudioFormat::Mp3, false)
            .await
            .unwrap();

        assert!(saved.exists());
        // 源文件原样保留，清理仍由登记表负责
        assert!(source.exists());
        assert_eq!(saved.extension().and_then(|e| e.to_str()), Some("mp3"));
    }

    #[tokio::test]
    async fn test_file_name_sanitizes_voice_id() {
        let name = OutputWriter::build_file_name("zhifeng-emo", AudioFormat::Mp3, false);
        assert!(name.starts_with("zhifeng_emo_"));
        assert!(name.ends_with(".mp3"));
    }

    #[tokio::test]
    async fn test_untranscoded_persist_keeps_mp3_extension() {
        // 编码器缺失的降级路径：请求 wav 但内容仍是 mp3
        let name = OutputWriter::build_file_name("siqi", AudioFormat::Wav, false);
        assert!(name.ends_with(".mp3"));

        let name = OutputWriter::build_file_name("siqi", AudioFormat::Wav, true);
        assert!(name.ends_with(".wav"));
    }

    #[tokio::test]
    async fn test_missing_source_is_copy_error() {
        let out_dir = tempdir().unwrap();
        let writer = OutputWriter::new(out_dir.path());

        let err = writer
            .persist(
                Path::new("/nonexistent/tts-a.mp3"),
                "text",
                "siqi",
                AudioFormat::Mp3,
                false,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, PersistError::Copy(_)));
    }

    #[test]
    fn test_embed_title_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a.mp3");
        std::fs::write(&path, b"\xff\xfb\x90\x00fakeframes").unwrap();

        embed_title(&path, "你好世界").unwrap();

        let tag = id3::Tag::read_from_path(&path).unwrap();
        assert_eq!(tag.title(), Some("你好世界"));
    }
}
