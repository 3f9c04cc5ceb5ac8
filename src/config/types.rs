//! Configuration Types

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::application::ports::AudioFormat;

/// 应用主配置
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// 服务器配置
    #[serde(default)]
    pub server: ServerConfig,

    /// 远程合成后端配置
    #[serde(default)]
    pub backend: BackendConfig,

    /// 语音参数配置
    #[serde(default)]
    pub voice: VoiceConfig,

    /// 音频输出配置
    #[serde(default)]
    pub audio: AudioConfig,

    /// 存储配置
    #[serde(default)]
    pub storage: StorageConfig,

    /// 临时文件清理配置
    #[serde(default)]
    pub cleanup: CleanupConfig,

    /// 日志配置
    #[serde(default)]
    pub log: LogConfig,
}

/// 服务器配置
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址
    #[serde(default = "default_host")]
    pub host: String,

    /// 监听端口
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5050
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl ServerConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 远程合成后端配置
#[derive(Debug, Clone, Deserialize)]
pub struct BackendConfig {
    /// 后端基础 URL
    #[serde(default = "default_backend_url")]
    pub url: String,

    /// 单次请求超时（秒）
    #[serde(default = "default_backend_timeout")]
    pub timeout_secs: u64,

    /// 轮询间隔（秒）
    #[serde(default = "default_poll_interval")]
    pub poll_interval_secs: u64,

    /// 轮询次数上限
    #[serde(default = "default_poll_attempts")]
    pub poll_max_attempts: u32,
}

fn default_backend_url() -> String {
    "https://user.api.hudunsoft.com".to_string()
}

fn default_backend_timeout() -> u64 {
    10
}

fn default_poll_interval() -> u64 {
    5
}

fn default_poll_attempts() -> u32 {
    12
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: default_backend_url(),
            timeout_secs: default_backend_timeout(),
            poll_interval_secs: default_poll_interval(),
            poll_max_attempts: default_poll_attempts(),
        }
    }
}

/// 语音参数配置
#[derive(Debug, Clone, Deserialize)]
pub struct VoiceConfig {
    /// 默认音色
    #[serde(default = "default_voice")]
    pub default_voice: String,

    /// 默认语速
    #[serde(default = "default_param")]
    pub default_rate: u8,

    /// 默认音调
    #[serde(default = "default_param")]
    pub default_pitch: u8,

    /// 默认音量
    #[serde(default = "default_param")]
    pub default_volume: u8,

    /// 数值参数的有效上限
    #[serde(default = "default_max_param")]
    pub max_param: u8,

    /// 别名表文件路径
    #[serde(default = "default_aliases_path")]
    pub aliases_path: PathBuf,
}

fn default_voice() -> String {
    "siqi".to_string()
}

fn default_param() -> u8 {
    5
}

fn default_max_param() -> u8 {
    10
}

fn default_aliases_path() -> PathBuf {
    PathBuf::from("voice_mappings.json")
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            default_voice: default_voice(),
            default_rate: default_param(),
            default_pitch: default_param(),
            default_volume: default_param(),
            max_param: default_max_param(),
            aliases_path: default_aliases_path(),
        }
    }
}

/// 音频输出配置
#[derive(Debug, Clone, Deserialize)]
pub struct AudioConfig {
    /// 默认输出格式
    /// 可选: mp3, aac, wav, opus, flac
    #[serde(default)]
    pub default_format: AudioFormat,

    /// ffmpeg 可执行文件
    #[serde(default = "default_ffmpeg")]
    pub ffmpeg_binary: PathBuf,
}

fn default_ffmpeg() -> PathBuf {
    PathBuf::from("ffmpeg")
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            default_format: AudioFormat::default(),
            ffmpeg_binary: default_ffmpeg(),
        }
    }
}

/// 存储配置
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// 持久化输出目录
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// 临时文件目录（本服务专属，启动时清扫）
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("tts_output")
}

fn default_temp_dir() -> PathBuf {
    PathBuf::from("data/tmp")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            temp_dir: default_temp_dir(),
        }
    }
}

/// 临时文件清理配置
#[derive(Debug, Clone, Deserialize)]
pub struct CleanupConfig {
    /// 删除重试次数
    #[serde(default = "default_cleanup_retries")]
    pub retries: u32,

    /// 每次尝试前的等待（秒）
    #[serde(default = "default_cleanup_delay")]
    pub delay_secs: u64,
}

fn default_cleanup_retries() -> u32 {
    3
}

fn default_cleanup_delay() -> u64 {
    30
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            retries: default_cleanup_retries(),
            delay_secs: default_cleanup_delay(),
        }
    }
}

impl CleanupConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.delay_secs)
    }
}

/// 日志配置
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}
