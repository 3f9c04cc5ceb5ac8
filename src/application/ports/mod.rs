//! Ports - 端口定义
//!
//! 应用层抽象接口，具体实现在 infrastructure 层

pub mod artifact_registry;
pub mod output_store;
pub mod speech_backend;
pub mod transcoder;

pub use artifact_registry::ArtifactRegistryPort;
pub use output_store::{OutputStorePort, PersistError};
pub use speech_backend::{BackendError, SpeechBackendPort, SynthesisJob};
pub use transcoder::{AudioFormat, FormatProfile, TranscodeError, TranscoderPort};
