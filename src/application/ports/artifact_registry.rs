//! Artifact Registry Port - 临时文件登记抽象
//!
//! 管线产生的每个临时文件都要登记，并在请求结束后预约清理；
//! 清理是 fire-and-forget 的，绝不能拖慢请求路径

use std::path::Path;

/// Artifact Registry Port
///
/// 实现方保证：预约过清理的路径最终被删除或作为泄漏上报
pub trait ArtifactRegistryPort: Send + Sync {
    /// 登记一个新产生的临时文件
    fn register(&self, path: &Path);

    /// 预约延迟清理（不阻塞调用方）
    fn schedule_cleanup(&self, path: &Path);
}
