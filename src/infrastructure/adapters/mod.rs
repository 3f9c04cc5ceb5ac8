//! 适配器层

pub mod transcoder;
pub mod tts;

pub use transcoder::FfmpegTranscoder;
pub use tts::{HudunSpeechClient, SpeechClientConfig};
