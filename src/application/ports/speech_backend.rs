//! Speech Backend Port - 远程语音合成后端抽象
//!
//! 定义两阶段合成协议的抽象接口，具体实现在 infrastructure/adapters 层

use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// 后端错误
#[derive(Debug, Error)]
pub enum BackendError {
    /// 任一步骤（发起、轮询、下载）返回非 2xx 状态
    #[error("backend returned HTTP {status}")]
    Http { status: u16 },

    /// 后端返回既非成功也非延迟处理的结果码
    #[error("backend error {code}: {message}")]
    Service { code: String, message: String },

    /// 响应缺少必需字段
    #[error("backend response missing field: {0}")]
    MissingField(&'static str),

    /// 响应无法解析
    #[error("invalid backend response: {0}")]
    InvalidResponse(String),

    /// 网络错误（连接失败、单次请求超时等）
    #[error("network error: {0}")]
    Network(String),

    /// 轮询达到上限仍未完成
    ///
    /// 与其他远程错误区分，便于可观测性分类
    #[error("synthesis task did not complete within {0:?}")]
    DeadlineExceeded(Duration),

    /// 写出音频文件失败
    #[error("io error: {0}")]
    Io(String),
}

/// 合成任务
///
/// 每次请求解析完成后的后端输入：默认值已套用，数值参数均为具体值
#[derive(Debug, Clone)]
pub struct SynthesisJob {
    /// 要合成的文本
    pub text: String,
    /// 基础音色标识
    pub voice: String,
    /// 语速
    pub rate: u8,
    /// 音调
    pub pitch: u8,
    /// 音量
    pub volume: u8,
    /// 情感
    pub emotion: String,
    /// 凭证：同时作为设备标识与访问令牌传给后端
    pub credential: String,
}

/// Speech Backend Port
///
/// 远程语音合成服务的抽象接口
#[async_trait]
pub trait SpeechBackendPort: Send + Sync {
    /// 执行合成并把音频写到 `destination`
    ///
    /// 成功时 `destination` 必定存在且内容完整；失败时返回分类错误，
    /// 绝不返回带有不一致内容的部分文件
    async fn synthesize(&self, job: &SynthesisJob, destination: &Path) -> Result<(), BackendError>;
}
