//! 基础设施层
//!
//! - Adapters: 远程合成客户端、ffmpeg 转码器
//! - Storage: 临时文件登记/清理、持久化输出
//! - HTTP: RESTful API

pub mod adapters;
pub mod http;
pub mod storage;
