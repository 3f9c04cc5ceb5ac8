//! Output Store Port - 持久化输出抽象

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::AudioFormat;

/// 持久化错误
///
/// 持久化失败不会使整个请求失败：调用方记录日志后仍返回临时产物
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("failed to copy artifact: {0}")]
    Copy(String),

    #[error("io error: {0}")]
    Io(String),
}

/// Output Store Port
///
/// 把最终产物复制（绝不移动）到持久目录，可选地嵌入元数据
#[async_trait]
pub trait OutputStorePort: Send + Sync {
    /// 持久化一个产物，返回持久文件路径
    ///
    /// `transcoded` 标记 `source` 是否为转码结果；
    /// 未转码的 mp3 输出会把原始文本嵌入为标题标签（失败仅记日志）
    async fn persist(
        &self,
        source: &Path,
        text: &str,
        voice_id: &str,
        format: AudioFormat,
        transcoded: bool,
    ) -> Result<PathBuf, PersistError>;
}
