//! Speakgate - 语音合成网关
//!
//! 把文本交给远程合成后端生成音频，按需转码与持久化，
//! 保证所有临时产物最终被清理
//!
//! 领域层 (domain/):
//! - Voice: voice 字符串解析与别名表
//!
//! 应用层 (application/):
//! - Ports: 端口定义（SpeechBackend, Transcoder, ArtifactRegistry, OutputStore）
//! - Pipeline: 合成管线（解析 → 合成 → 转码 → 持久化 → 清理预约）
//! - Facade: 阻塞调用桥（自有调度器 / 隔离工作线程两条显式路径）
//!
//! 基础设施层 (infrastructure/):
//! - Adapters: 两阶段协议的 HTTP 合成客户端、ffmpeg 转码器
//! - Storage: 临时文件登记/延迟清理 worker、持久化输出
//! - HTTP: RESTful API（OpenAI 风格的 /v1/audio/speech）

pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::{load_config, AppConfig};
