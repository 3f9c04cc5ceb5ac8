//! 应用层
//!
//! - Ports: 端口定义（SpeechBackend, Transcoder, ArtifactRegistry, OutputStore）
//! - Pipeline: 合成管线（解析 → 合成 → 转码 → 持久化 → 清理预约）
//! - Facade: 阻塞调用桥

pub mod error;
pub mod facade;
pub mod pipeline;
pub mod ports;

pub use error::SynthesisError;
pub use facade::BlockingFacade;
pub use pipeline::{SpeechPipeline, SpeechRequest, VoiceDefaults};
