//! Configuration Loader
//!
//! 多源配置加载与合并
//!
//! 优先级（从高到低）：
//! 1. 环境变量（前缀 `SPEAKGATE_`，层级分隔符 `__`）
//! 2. 配置文件（config.toml 或 config.local.toml）
//! 3. 默认值

use config::{Config, ConfigError as ConfigCrateError, Environment, File};
use std::path::Path;
use thiserror::Error;

use super::types::AppConfig;

/// 配置加载错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

impl From<ConfigCrateError> for ConfigError {
    fn from(err: ConfigCrateError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

/// 配置文件搜索路径
const CONFIG_FILE_NAMES: &[&str] = &["config", "config.local"];

/// 加载应用配置
///
/// # 环境变量示例
/// - `SPEAKGATE_SERVER__PORT=8080`
/// - `SPEAKGATE_BACKEND__URL=https://backend.example.com`
/// - `SPEAKGATE_STORAGE__OUTPUT_DIR=/data/tts_output`
pub fn load_config() -> Result<AppConfig, ConfigError> {
    load_config_from_path(None)
}

/// 从指定路径加载配置
pub fn load_config_from_path(config_path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let mut builder = Config::builder();

    // 1. 默认值（最低优先级）
    builder = builder
        .set_default("server.host", "0.0.0.0")?
        .set_default("server.port", 5050)?
        .set_default("backend.url", "https://user.api.hudunsoft.com")?
        .set_default("backend.timeout_secs", 10)?
        .set_default("backend.poll_interval_secs", 5)?
        .set_default("backend.poll_max_attempts", 12)?
        .set_default("voice.default_voice", "siqi")?
        .set_default("voice.default_rate", 5)?
        .set_default("voice.default_pitch", 5)?
        .set_default("voice.default_volume", 5)?
        .set_default("voice.max_param", 10)?
        .set_default("voice.aliases_path", "voice_mappings.json")?
        .set_default("audio.default_format", "mp3")?
        .set_default("audio.ffmpeg_binary", "ffmpeg")?
        .set_default("storage.output_dir", "tts_output")?
        .set_default("storage.temp_dir", "data/tmp")?
        .set_default("cleanup.retries", 3)?
        .set_default("cleanup.delay_secs", 30)?
        .set_default("log.level", "info")?;

    // 2. 配置文件（如果存在）
    if let Some(path) = config_path {
        builder = builder.add_source(File::from(path).required(true));
    } else {
        for name in CONFIG_FILE_NAMES {
            builder = builder.add_source(File::with_name(name).required(false));
        }
    }

    // 3. 环境变量（最高优先级）
    builder = builder.add_source(
        Environment::with_prefix("SPEAKGATE")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let config = builder.build()?;

    let app_config: AppConfig = config
        .try_deserialize()
        .map_err(|e| ConfigError::ParseError(format!("Failed to deserialize config: {}", e)))?;

    validate_config(&app_config)?;

    Ok(app_config)
}

/// 验证配置有效性
fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "Server port cannot be 0".to_string(),
        ));
    }

    if config.backend.url.is_empty() {
        return Err(ConfigError::ValidationError(
            "Backend URL cannot be empty".to_string(),
        ));
    }

    if config.backend.poll_max_attempts == 0 {
        return Err(ConfigError::ValidationError(
            "Polling attempt count cannot be 0".to_string(),
        ));
    }

    if config.voice.max_param == 0 {
        return Err(ConfigError::ValidationError(
            "Voice parameter bound cannot be 0".to_string(),
        ));
    }

    Ok(())
}

/// 打印配置信息（用于启动时日志）
pub fn print_config(config: &AppConfig) {
    tracing::info!("=== Application Configuration ===");
    tracing::info!("Server: {}", config.server.addr());
    tracing::info!("Backend URL: {}", config.backend.url);
    tracing::info!(
        "Backend Polling: {} attempts x {}s",
        config.backend.poll_max_attempts,
        config.backend.poll_interval_secs
    );
    tracing::info!("Default Voice: {}", config.voice.default_voice);
    tracing::info!("Default Format: {}", config.audio.default_format);
    tracing::info!("Output Directory: {:?}", config.storage.output_dir);
    tracing::info!("Temp Directory: {:?}", config.storage.temp_dir);
    tracing::info!(
        "Cleanup: {} retries x {}s",
        config.cleanup.retries,
        config.cleanup.delay_secs
    );
    tracing::info!("Log Level: {}", config.log.level);
    tracing::info!("=================================");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_passes_for_default_config() {
        let config = AppConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validation_error_for_zero_port() {
        let mut config = AppConfig::default();
        config.server.port = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_empty_backend_url() {
        let mut config = AppConfig::default();
        config.backend.url = String::new();
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validation_error_for_zero_poll_attempts() {
        let mut config = AppConfig::default();
        config.backend.poll_max_attempts = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_load_from_explicit_file() {
        let mut file = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .unwrap();
        use std::io::Write;
        file.write_all(b"[server]\nport = 9090\n\n[voice]\ndefault_voice = \"aiting\"\n")
            .unwrap();

        let config = load_config_from_path(Some(file.path())).unwrap();
        assert_eq!(config.server.port, 9090);
        assert_eq!(config.voice.default_voice, "aiting");
        // 未覆盖的键保持默认
        assert_eq!(config.backend.poll_max_attempts, 12);
    }
}
