//! Speech Pipeline - 合成管线
//!
//! 单次请求的完整流程：解析 voice 字符串 → 远程合成到临时文件 →
//! （目标格式不同则）转码 → （要求持久化则）落盘 → 无条件预约所有
//! 临时文件的清理。临时文件的清理在成功与失败路径上都会被预约

use std::path::{Path, PathBuf};
use std::sync::Arc;
use uuid::Uuid;

use crate::application::error::SynthesisError;
use crate::application::ports::{
    ArtifactRegistryPort, AudioFormat, OutputStorePort, SpeechBackendPort, SynthesisJob,
    TranscoderPort,
};
use crate::domain::voice::{VoiceAliases, VoiceSpec};

/// 默认情感
const DEFAULT_EMOTION: &str = "neutral";

/// 一次入站调用
///
/// 由路由层构造，归属于本次管线调用，请求间不共享
#[derive(Debug, Clone)]
pub struct SpeechRequest {
    /// 要合成的文本
    pub text: String,
    /// 原始 voice 字符串（可能带别名、参数覆盖、持久化后缀）
    pub voice: String,
    /// 凭证：透传给后端，兼作设备标识与访问令牌
    pub credential: String,
    /// 情感
    pub emotion: String,
    /// 请求的输出格式
    pub format: AudioFormat,
    /// 请求级语速默认值，仅在 voice 字符串未携带语速时生效
    pub speed: Option<u8>,
}

impl SpeechRequest {
    pub fn new(
        text: impl Into<String>,
        voice: impl Into<String>,
        credential: impl Into<String>,
        format: AudioFormat,
    ) -> Self {
        Self {
            text: text.into(),
            voice: voice.into(),
            credential: credential.into(),
            emotion: DEFAULT_EMOTION.to_string(),
            format,
            speed: None,
        }
    }

    pub fn with_speed(mut self, speed: Option<u8>) -> Self {
        self.speed = speed;
        self
    }
}

/// 语音参数默认值与上限
#[derive(Debug, Clone, Copy)]
pub struct VoiceDefaults {
    pub rate: u8,
    pub pitch: u8,
    pub volume: u8,
    /// 数值参数的有效上限
    pub max_param: u8,
}

impl Default for VoiceDefaults {
    fn default() -> Self {
        Self {
            rate: 5,
            pitch: 5,
            volume: 5,
            max_param: 10,
        }
    }
}

/// 合成管线
pub struct SpeechPipeline {
    backend: Arc<dyn SpeechBackendPort>,
    transcoder: Arc<dyn TranscoderPort>,
    output_store: Arc<dyn OutputStorePort>,
    registry: Arc<dyn ArtifactRegistryPort>,
    aliases: VoiceAliases,
    defaults: VoiceDefaults,
    temp_dir: PathBuf,
}

impl SpeechPipeline {
    pub fn new(
        backend: Arc<dyn SpeechBackendPort>,
        transcoder: Arc<dyn TranscoderPort>,
        output_store: Arc<dyn OutputStorePort>,
        registry: Arc<dyn ArtifactRegistryPort>,
        aliases: VoiceAliases,
        defaults: VoiceDefaults,
        temp_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            backend,
            transcoder,
            output_store,
            registry,
            aliases,
            defaults,
            temp_dir: temp_dir.into(),
        }
    }

    /// 执行一次合成
    ///
    /// 返回音频文件路径（持久化成功时为持久路径，否则为临时路径），
    /// 或归一化的合成失败。本次调用产生的每个临时文件，无论成败，
    /// 都在返回前预约了清理
    pub async fn generate(&self, request: SpeechRequest) -> Result<PathBuf, SynthesisError> {
        let mut ephemeral: Vec<PathBuf> = Vec::new();
        let result = self.run(&request, &mut ephemeral).await;

        for path in &ephemeral {
            self.registry.schedule_cleanup(path);
        }

        if let Err(ref e) = result {
            tracing::error!(kind = e.kind(), error = %e, "Speech generation failed");
        }
        result
    }

    async fn run(
        &self,
        request: &SpeechRequest,
        ephemeral: &mut Vec<PathBuf>,
    ) -> Result<PathBuf, SynthesisError> {
        // 持久化后缀在别名解析之前剥离：`custom+s` 先取 `custom` 的别名
        let (stripped, persist_flag) = crate::domain::voice::split_persist_suffix(&request.voice);
        let resolved = self.aliases.resolve(stripped);
        let spec = VoiceSpec::parse(resolved, self.defaults.max_param);
        let persist = persist_flag || spec.persist;

        let job = self.build_job(request, &spec);
        tracing::debug!(
            voice = %job.voice,
            rate = job.rate,
            pitch = job.pitch,
            volume = job.volume,
            persist,
            "Parsed voice configuration"
        );

        // 主产物：后端总是产出 mp3
        let raw_path = self.fresh_temp_path(AudioFormat::Mp3);
        self.registry.register(&raw_path);
        ephemeral.push(raw_path.clone());

        self.backend.synthesize(&job, &raw_path).await?;
        tracing::info!(path = %raw_path.display(), "Synthesized audio");

        // 目标格式不同才转码；编码器缺失时降级为透传
        let (final_path, transcoded) = self
            .transcode_if_needed(&raw_path, request.format, ephemeral)
            .await?;

        if persist {
            match self
                .output_store
                .persist(
                    &final_path,
                    &request.text,
                    &spec.base_voice,
                    request.format,
                    transcoded,
                )
                .await
            {
                Ok(saved) => return Ok(saved),
                Err(e) => {
                    // 持久化失败不致命：临时产物仍是有效结果
                    tracing::error!(error = %e, "Failed to persist audio, returning ephemeral file");
                }
            }
        }

        Ok(final_path)
    }

    fn build_job(&self, request: &SpeechRequest, spec: &VoiceSpec) -> SynthesisJob {
        SynthesisJob {
            text: request.text.clone(),
            voice: spec.base_voice.clone(),
            rate: spec
                .rate
                .or(request.speed)
                .unwrap_or(self.defaults.rate),
            pitch: spec.pitch.unwrap_or(self.defaults.pitch),
            volume: spec.volume.unwrap_or(self.defaults.volume),
            emotion: request.emotion.clone(),
            credential: request.credential.clone(),
        }
    }

    async fn transcode_if_needed(
        &self,
        raw_path: &Path,
        target: AudioFormat,
        ephemeral: &mut Vec<PathBuf>,
    ) -> Result<(PathBuf, bool), SynthesisError> {
        if target == AudioFormat::Mp3 {
            return Ok((raw_path.to_path_buf(), false));
        }

        if !self.transcoder.available().await {
            // 已知的降级：调用方拿到的编码与请求的容器不符
            tracing::warn!(
                target = %target,
                "Encoder not available, returning untranscoded audio"
            );
            return Ok((raw_path.to_path_buf(), false));
        }

        let out_path = self.fresh_temp_path(target);
        self.registry.register(&out_path);
        ephemeral.push(out_path.clone());

        self.transcoder
            .transcode(raw_path, target, &out_path)
            .await?;
        tracing::info!(path = %out_path.display(), target = %target, "Transcoded audio");

        Ok((out_path, true))
    }

    fn fresh_temp_path(&self, format: AudioFormat) -> PathBuf {
        self.temp_dir
            .join(format!("tts-{}.{}", Uuid::new_v4(), format.extension()))
    }
}
