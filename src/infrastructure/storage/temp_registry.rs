//! Temp File Registry - 临时文件登记与延迟清理
//!
//! 实现 ArtifactRegistryPort trait。登记句柄只发消息，路径集合由常驻
//! 的 CleanupWorker 独占持有（单任务修改，无锁）。worker 在启动时
//! spawn 一次，管线的临时运行时退出后清理任务照常执行
//!
//! 清理算法：等待固定延迟后尝试删除；失败则按同样延迟重试至上限；
//! 重试耗尽记泄漏日志并停止追踪（登记表追踪已知的临时文件，
//! 不承诺删除一定成功）。删除已不存在的文件视为成功

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;

use crate::application::ports::ArtifactRegistryPort;

/// 临时文件名前缀，启动清扫按它识别本服务的遗留文件
pub const TEMP_FILE_PREFIX: &str = "tts-";

/// 清理配置
#[derive(Debug, Clone, Copy)]
pub struct CleanupConfig {
    /// 删除重试次数
    pub retries: u32,
    /// 每次尝试前的等待时长
    pub delay: Duration,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            retries: 3,
            delay: Duration::from_secs(30),
        }
    }
}

#[derive(Debug)]
enum RegistryCommand {
    /// 登记一个新产生的临时文件
    Register(PathBuf),
    /// 预约延迟清理
    ScheduleCleanup(PathBuf),
    /// 清理结束（成功或重试耗尽），停止追踪
    Forget(PathBuf),
}

/// 临时文件登记句柄
///
/// 廉价克隆；跨线程、跨运行时安全（无界通道，发送不需要调度器）
#[derive(Clone)]
pub struct TempFileRegistry {
    sender: mpsc::UnboundedSender<RegistryCommand>,
}

impl TempFileRegistry {
    /// 创建登记句柄与配套的清理 worker
    ///
    /// worker 需要由调用方 spawn 到常驻运行时上
    pub fn new(config: CleanupConfig) -> (Self, CleanupWorker) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let registry = Self {
            sender: sender.clone(),
        };
        let worker = CleanupWorker {
            config,
            sender,
            receiver,
            tracked: HashSet::new(),
        };
        (registry, worker)
    }
}

impl ArtifactRegistryPort for TempFileRegistry {
    fn register(&self, path: &Path) {
        let _ = self
            .sender
            .send(RegistryCommand::Register(path.to_path_buf()));
    }

    fn schedule_cleanup(&self, path: &Path) {
        let _ = self
            .sender
            .send(RegistryCommand::ScheduleCleanup(path.to_path_buf()));
    }
}

/// 清理 Worker
///
/// 独占持有追踪集合；每个清理预约 spawn 一个延迟任务，任务结束后
/// 通过 Forget 消息回写追踪状态
pub struct CleanupWorker {
    config: CleanupConfig,
    sender: mpsc::UnboundedSender<RegistryCommand>,
    receiver: mpsc::UnboundedReceiver<RegistryCommand>,
    tracked: HashSet<PathBuf>,
}

impl CleanupWorker {
    /// 启动 worker
    pub async fn run(mut self) {
        tracing::info!(
            retries = self.config.retries,
            delay_secs = self.config.delay.as_secs_f64(),
            "Cleanup worker started"
        );

        while let Some(command) = self.receiver.recv().await {
            match command {
                RegistryCommand::Register(path) => {
                    tracing::debug!(path = %path.display(), "Registered temp file");
                    self.tracked.insert(path);
                }
                RegistryCommand::ScheduleCleanup(path) => {
                    let config = self.config;
                    let sender = self.sender.clone();
                    tokio::spawn(async move {
                        delete_with_retries(&path, config).await;
                        let _ = sender.send(RegistryCommand::Forget(path));
                    });
                }
                RegistryCommand::Forget(path) => {
                    self.tracked.remove(&path);
                    tracing::debug!(
                        path = %path.display(),
                        tracked = self.tracked.len(),
                        "Stopped tracking temp file"
                    );
                }
            }
        }

        tracing::info!("Cleanup worker stopped");
    }
}

/// 延迟删除一个路径，带重试
///
/// 文件已不存在视为成功（幂等）
async fn delete_with_retries(path: &Path, config: CleanupConfig) {
    for attempt in 1..=config.retries {
        tokio::time::sleep(config.delay).await;

        match tokio::fs::remove_file(path).await {
            Ok(()) => {
                tracing::debug!(path = %path.display(), attempt, "Deleted temp file");
                return;
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Temp file already gone");
                return;
            }
            Err(e) => {
                tracing::error!(
                    path = %path.display(),
                    attempt,
                    error = %e,
                    "Failed to delete temp file"
                );
            }
        }
    }

    // 泄漏已上报，不再追踪，避免集合无限增长
    tracing::error!(
        path = %path.display(),
        retries = config.retries,
        "Leaking temp file after exhausting retries"
    );
}

/// 启动时清扫遗留的临时文件
///
/// 进程内的登记表开机总是空的，跨重启的孤儿文件通过扫描
/// 本服务专属的临时目录识别（`tts-` 前缀）
pub async fn purge_orphaned(temp_dir: &Path) -> std::io::Result<usize> {
    let mut purged = 0usize;
    let mut entries = tokio::fs::read_dir(temp_dir).await?;

    while let Some(entry) = entries.next_entry().await? {
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if !name.starts_with(TEMP_FILE_PREFIX) {
            continue;
        }
        match tokio::fs::remove_file(entry.path()).await {
            Ok(()) => {
                tracing::info!(path = %entry.path().display(), "Purged orphaned temp file");
                purged += 1;
            }
            Err(e) => {
                tracing::error!(path = %entry.path().display(), error = %e, "Failed to purge temp file");
            }
        }
    }

    Ok(purged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn fast_config() -> CleanupConfig {
        CleanupConfig {
            retries: 3,
            delay: Duration::from_millis(10),
        }
    }

    #[tokio::test]
    async fn test_scheduled_file_is_eventually_deleted() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("tts-a.mp3");
        tokio::fs::write(&path, b"audio").await.unwrap();

        let (registry, worker) = TempFileRegistry::new(fast_config());
        tokio::spawn(worker.run());

        registry.register(&path);
        registry.schedule_cleanup(&path);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_missing_file_cleanup_is_idempotent() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("tts-missing.mp3");

        let (registry, worker) = TempFileRegistry::new(fast_config());
        tokio::spawn(worker.run());

        registry.schedule_cleanup(&missing);

        // 不存在的文件视为删除成功，worker 继续处理后续预约
        let real = dir.path().join("tts-b.mp3");
        tokio::fs::write(&real, b"audio").await.unwrap();
        registry.schedule_cleanup(&real);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!real.exists());
    }

    #[tokio::test]
    async fn test_undeletable_path_is_leaked_not_retried_forever() {
        let dir = tempdir().unwrap();
        // 目录无法用 remove_file 删除，模拟持续失败
        let stubborn = dir.path().join("tts-dir");
        tokio::fs::create_dir(&stubborn).await.unwrap();

        let (registry, worker) = TempFileRegistry::new(fast_config());
        tokio::spawn(worker.run());

        registry.register(&stubborn);
        registry.schedule_cleanup(&stubborn);

        tokio::time::sleep(Duration::from_millis(150)).await;
        // 重试耗尽后路径仍在（泄漏已上报），worker 未被卡死
        assert!(stubborn.exists());

        let follow_up = dir.path().join("tts-c.mp3");
        tokio::fs::write(&follow_up, b"audio").await.unwrap();
        registry.schedule_cleanup(&follow_up);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(!follow_up.exists());
    }

    #[tokio::test]
    async fn test_purge_orphaned_only_touches_prefixed_files() {
        let dir = tempdir().unwrap();
        let orphan = dir.path().join("tts-orphan.mp3");
        let other = dir.path().join("keep.mp3");
        tokio::fs::write(&orphan, b"x").await.unwrap();
        tokio::fs::write(&other, b"x").await.unwrap();

        let purged = purge_orphaned(dir.path()).await.unwrap();
        assert_eq!(purged, 1);
        assert!(!orphan.exists());
        assert!(other.exists());
    }
}
