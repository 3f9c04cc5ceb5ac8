//! TTS 适配器
//!
//! 远程合成后端的 HTTP 实现

pub mod hudun_client;

pub use hudun_client::{HudunSpeechClient, SpeechClientConfig};
