//! Speakgate - 语音合成网关

use std::sync::Arc;
use std::time::Duration;

use speakgate::application::{BlockingFacade, SpeechPipeline, VoiceDefaults};
use speakgate::config::{load_config, print_config};
use speakgate::domain::voice::VoiceAliases;
use speakgate::infrastructure::adapters::{
    FfmpegTranscoder, HudunSpeechClient, SpeechClientConfig,
};
use speakgate::infrastructure::http::state::RequestDefaults;
use speakgate::infrastructure::http::{AppState, HttpServer, ServerConfig};
use speakgate::infrastructure::storage::{
    purge_orphaned, CleanupConfig, OutputWriter, TempFileRegistry,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载配置（优先级：环境变量 > 配置文件 > 默认值）
    let config = load_config().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))?;

    // 初始化日志
    let log_filter = format!("{},speakgate={}", config.log.level, config.log.level);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_filter)),
        )
        .init();

    tracing::info!("Speakgate - 语音合成网关");
    print_config(&config);

    // 确保数据目录存在
    tokio::fs::create_dir_all(&config.storage.output_dir).await?;
    tokio::fs::create_dir_all(&config.storage.temp_dir).await?;

    // 清扫上次运行遗留的临时文件
    match purge_orphaned(&config.storage.temp_dir).await {
        Ok(0) => {}
        Ok(purged) => tracing::info!(purged, "Purged orphaned temp files"),
        Err(e) => tracing::error!(error = %e, "Failed to purge temp directory"),
    }

    // 创建临时文件登记表与清理 worker
    let (registry, cleanup_worker) = TempFileRegistry::new(CleanupConfig {
        retries: config.cleanup.retries,
        delay: config.cleanup.delay(),
    });
    tokio::spawn(cleanup_worker.run());

    // 创建远程合成客户端
    let client_config = SpeechClientConfig {
        base_url: config.backend.url.clone(),
        timeout: Duration::from_secs(config.backend.timeout_secs),
        poll_interval: Duration::from_secs(config.backend.poll_interval_secs),
        poll_max_attempts: config.backend.poll_max_attempts,
    };
    let backend = Arc::new(
        HudunSpeechClient::new(client_config)
            .map_err(|e| anyhow::anyhow!("Failed to build speech client: {}", e))?,
    );

    // 创建 ffmpeg 转码器与持久化写入器
    let transcoder = Arc::new(FfmpegTranscoder::new(&config.audio.ffmpeg_binary));
    let output_writer = Arc::new(OutputWriter::new(&config.storage.output_dir));

    // 加载音色别名表
    let aliases = VoiceAliases::load(&config.voice.aliases_path);

    // 组装管线与门面
    let pipeline = Arc::new(SpeechPipeline::new(
        backend,
        transcoder,
        output_writer,
        Arc::new(registry),
        aliases,
        VoiceDefaults {
            rate: config.voice.default_rate,
            pitch: config.voice.default_pitch,
            volume: config.voice.default_volume,
            max_param: config.voice.max_param,
        },
        config.storage.temp_dir.clone(),
    ));
    let facade = BlockingFacade::new(pipeline);

    // 创建 HTTP 服务器
    let server_config = ServerConfig::new(&config.server.host, config.server.port);
    let state = AppState::new(
        facade,
        RequestDefaults {
            voice: config.voice.default_voice.clone(),
            format: config.audio.default_format,
            max_param: config.voice.max_param,
        },
    );

    let server = HttpServer::new(server_config, state);

    tracing::info!("Starting HTTP server...");

    // 启动服务器（带优雅关闭）
    server
        .run_with_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for ctrl-c");
            }
            tracing::info!("Received shutdown signal");
        })
        .await?;

    tracing::info!("Server shutdown complete");

    Ok(())
}
