//! 转码适配器
//!
//! 外部 ffmpeg 编码器实现

pub mod ffmpeg;

pub use ffmpeg::FfmpegTranscoder;
