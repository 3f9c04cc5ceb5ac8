//! 应用层错误定义
//!
//! 管线内部的各类失败在此归一为单一的合成失败类型；
//! `kind()` 给路由层提供稳定的分类标识，无需解析错误文案

use thiserror::Error;

use super::ports::{BackendError, TranscodeError};

/// 合成失败
#[derive(Debug, Error)]
pub enum SynthesisError {
    /// 远程后端失败（HTTP 状态、结果码、响应缺字段等）
    #[error("speech backend failed: {0}")]
    Backend(BackendError),

    /// 轮询达到上限
    #[error("synthesis timed out: {0}")]
    Timeout(BackendError),

    /// 编码器非零退出
    #[error("transcoding failed: {0}")]
    Transcode(#[from] TranscodeError),

    /// 管线自身的内部错误（线程/调度器构建失败等）
    #[error("internal error: {0}")]
    Internal(String),
}

impl SynthesisError {
    /// 稳定的分类标识
    pub fn kind(&self) -> &'static str {
        match self {
            SynthesisError::Backend(_) => "backend",
            SynthesisError::Timeout(_) => "timeout",
            SynthesisError::Transcode(_) => "transcode",
            SynthesisError::Internal(_) => "internal",
        }
    }
}

impl From<BackendError> for SynthesisError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::DeadlineExceeded(_) => SynthesisError::Timeout(err),
            _ => SynthesisError::Backend(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_deadline_maps_to_timeout_kind() {
        let err: SynthesisError = BackendError::DeadlineExceeded(Duration::from_secs(60)).into();
        assert_eq!(err.kind(), "timeout");
    }

    #[test]
    fn test_http_maps_to_backend_kind() {
        let err: SynthesisError = BackendError::Http { status: 502 }.into();
        assert_eq!(err.kind(), "backend");
    }
}
