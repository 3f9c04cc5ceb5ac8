//! Hudun Speech Client - 远程合成后端的两阶段协议实现
//!
//! 实现 SpeechBackendPort trait，通过 HTTP 调用远程合成服务
//!
//! 协议:
//! 1. 表单 POST /v1/alivoice/texttoaudio，响应 JSON
//!    `{code, data: {is_complete?, file_link?, task_id?}, message?}`。
//!    `code == 0` 且 `is_complete` 带 `file_link` ⇒ 立即成功；
//!    `code == 2105` 带 `task_id` ⇒ 延迟处理，进入轮询
//! 2. 轮询 POST /v1/alivoice/textTaskInfo，固定间隔、固定次数上限，
//!    首次出现 `code == 0 && is_complete && file_link` 即成功；
//!    达到上限按超时失败
//! 3. GET `file_link` 下载音频，流式写入目标路径
//!
//! `code` 字段在线上同时出现数字与字符串两种形态，按 untagged 解析

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;

use crate::application::ports::{BackendError, SpeechBackendPort, SynthesisJob};

/// 协议常量：标识客户端身份的固定字段
const CLIENT: &str = "web";
const SOURCE: &str = "335";
const SOFT_VERSION: &str = "V4.4.0.0";
/// 后端产出格式固定为 mp3，容器转换在本地完成
const BACKEND_FORMAT: &str = "mp3";
const BG_ID: &str = "0";
const BG_VOLUME: &str = "5";
/// 标题取文本前若干字符
const TITLE_CHARS: usize = 10;

/// 远程合成客户端配置
#[derive(Debug, Clone)]
pub struct SpeechClientConfig {
    /// 后端基础 URL
    pub base_url: String,
    /// 单次请求超时
    pub timeout: Duration,
    /// 轮询间隔
    pub poll_interval: Duration,
    /// 轮询次数上限
    pub poll_max_attempts: u32,
}

impl Default for SpeechClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://user.api.hudunsoft.com".to_string(),
            timeout: Duration::from_secs(10),
            poll_interval: Duration::from_secs(5),
            poll_max_attempts: 12,
        }
    }
}

impl SpeechClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// 轮询上限对应的总等待时长
    pub fn poll_deadline(&self) -> Duration {
        self.poll_interval * self.poll_max_attempts
    }
}

/// 后端结果码，线上同时存在数字与字符串形态
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
enum ResultCode {
    Number(i64),
    Text(String),
}

impl ResultCode {
    fn as_i64(&self) -> Option<i64> {
        match self {
            ResultCode::Number(n) => Some(*n),
            ResultCode::Text(s) => s.parse().ok(),
        }
    }

    fn is_success(&self) -> bool {
        self.as_i64() == Some(0)
    }

    /// 延迟处理：合成转入后台任务
    fn is_deferred(&self) -> bool {
        self.as_i64() == Some(2105)
    }
}

impl std::fmt::Display for ResultCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResultCode::Number(n) => write!(f, "{}", n),
            ResultCode::Text(s) => write!(f, "{}", s),
        }
    }
}

#[derive(Debug, Deserialize)]
struct BackendResponse {
    code: ResultCode,
    #[serde(default)]
    data: Option<BackendPayload>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct BackendPayload {
    #[serde(default)]
    is_complete: bool,
    #[serde(default)]
    file_link: Option<String>,
    #[serde(default)]
    task_id: Option<String>,
}

impl BackendPayload {
    fn completed_link(&self) -> Option<&str> {
        if !self.is_complete {
            return None;
        }
        self.file_link.as_deref().filter(|link| !link.is_empty())
    }
}

/// 远程合成客户端
pub struct HudunSpeechClient {
    client: Client,
    config: SpeechClientConfig,
}

impl HudunSpeechClient {
    pub fn new(config: SpeechClientConfig) -> Result<Self, BackendError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| BackendError::Network(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn initiate_url(&self) -> String {
        format!("{}/v1/alivoice/texttoaudio", self.config.base_url)
    }

    fn task_url(&self) -> String {
        format!("{}/v1/alivoice/textTaskInfo", self.config.base_url)
    }

    fn initiate_form(job: &SynthesisJob) -> Vec<(&'static str, String)> {
        let title: String = job.text.chars().take(TITLE_CHARS).collect();
        vec![
            ("client", CLIENT.to_string()),
            ("source", SOURCE.to_string()),
            ("soft_version", SOFT_VERSION.to_string()),
            ("device_id", job.credential.clone()),
            ("text", job.text.clone()),
            ("bgid", BG_ID.to_string()),
            ("bg_volume", BG_VOLUME.to_string()),
            ("format", BACKEND_FORMAT.to_string()),
            ("voice", job.voice.clone()),
            ("volume", job.volume.to_string()),
            ("speech_rate", job.rate.to_string()),
            ("pitch_rate", job.pitch.to_string()),
            ("title", title),
            ("token", job.credential.clone()),
            ("bg_url", String::new()),
            ("emotion", job.emotion.clone()),
        ]
    }

    fn poll_form(job: &SynthesisJob, task_id: &str) -> Vec<(&'static str, String)> {
        vec![
            ("client", CLIENT.to_string()),
            ("source", SOURCE.to_string()),
            ("soft_version", SOFT_VERSION.to_string()),
            ("device_id", job.credential.clone()),
            ("taskId", task_id.to_string()),
        ]
    }

    /// 发起合成，返回下载链接（可能经过轮询）
    async fn initiate(&self, job: &SynthesisJob) -> Result<String, BackendError> {
        tracing::debug!(
            url = %self.initiate_url(),
            voice = %job.voice,
            text_len = job.text.len(),
            "Sending synthesis request"
        );

        let response = self
            .client
            .post(self.initiate_url())
            .form(&Self::initiate_form(job))
            .send()
            .await
            .map_err(map_request_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Http {
                status: status.as_u16(),
            });
        }

        let body: BackendResponse = response
            .json()
            .await
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))?;

        if body.code.is_deferred() {
            let task_id = body
                .data
                .as_ref()
                .and_then(|d| d.task_id.clone())
                .ok_or(BackendError::MissingField("task_id"))?;
            tracing::debug!(task_id = %task_id, "Synthesis deferred, polling task status");
            return self.poll_task(job, &task_id).await;
        }

        if !body.code.is_success() {
            return Err(BackendError::Service {
                code: body.code.to_string(),
                message: body
                    .message
                    .unwrap_or_else(|| "unknown backend error".to_string()),
            });
        }

        let payload = body.data.ok_or(BackendError::MissingField("data"))?;
        match payload.completed_link() {
            Some(link) => Ok(link.to_string()),
            None => Err(BackendError::MissingField("file_link")),
        }
    }

    /// 轮询后台任务直到完成或达到上限
    async fn poll_task(&self, job: &SynthesisJob, task_id: &str) -> Result<String, BackendError> {
        let form = Self::poll_form(job, task_id);

        for attempt in 1..=self.config.poll_max_attempts {
            let response = self
                .client
                .post(self.task_url())
                .form(&form)
                .send()
                .await
                .map_err(map_request_error)?;

            let status = response.status();
            if !status.is_success() {
                return Err(BackendError::Http {
                    status: status.as_u16(),
                });
            }

            let body: BackendResponse = response
                .json()
                .await
                .map_err(|e| BackendError::InvalidResponse(e.to_string()))?;

            if body.code.is_success() {
                if let Some(link) = body.data.as_ref().and_then(BackendPayload::completed_link) {
                    tracing::debug!(task_id = %task_id, attempt, "Synthesis task completed");
                    return Ok(link.to_string());
                }
            }

            if attempt < self.config.poll_max_attempts {
                tokio::time::sleep(self.config.poll_interval).await;
            }
        }

        Err(BackendError::DeadlineExceeded(self.config.poll_deadline()))
    }

    /// 下载音频，流式写入目标路径
    ///
    /// 仅在确认 2xx 后才开始写文件
    async fn download(&self, url: &str, destination: &Path) -> Result<(), BackendError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(map_request_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(BackendError::Http {
                status: status.as_u16(),
            });
        }

        let mut file = tokio::fs::File::create(destination)
            .await
            .map_err(|e| BackendError::Io(e.to_string()))?;

        let mut stream = response.bytes_stream();
        let mut written = 0usize;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| BackendError::Network(e.to_string()))?;
            file.write_all(&chunk)
                .await
                .map_err(|e| BackendError::Io(e.to_string()))?;
            written += chunk.len();
        }
        file.flush()
            .await
            .map_err(|e| BackendError::Io(e.to_string()))?;

        tracing::info!(
            path = %destination.display(),
            bytes = written,
            "Downloaded synthesized audio"
        );
        Ok(())
    }
}

fn map_request_error(e: reqwest::Error) -> BackendError {
    if e.is_connect() {
        BackendError::Network(format!("cannot connect to speech backend: {}", e))
    } else {
        BackendError::Network(e.to_string())
    }
}

#[async_trait]
impl SpeechBackendPort for HudunSpeechClient {
    async fn synthesize(&self, job: &SynthesisJob, destination: &Path) -> Result<(), BackendError> {
        let file_link = self.initiate(job).await?;
        self.download(&file_link, destination).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = SpeechClientConfig::default();
        assert_eq!(config.base_url, "https://user.api.hudunsoft.com");
        assert_eq!(config.poll_max_attempts, 12);
        assert_eq!(config.poll_deadline(), Duration::from_secs(60));
    }

    #[test]
    fn test_result_code_accepts_both_shapes() {
        let numeric: ResultCode = serde_json::from_str("0").unwrap();
        assert!(numeric.is_success());

        let text: ResultCode = serde_json::from_str("\"2105\"").unwrap();
        assert!(text.is_deferred());

        let other: ResultCode = serde_json::from_str("\"4002\"").unwrap();
        assert!(!other.is_success());
        assert!(!other.is_deferred());
        assert_eq!(other.to_string(), "4002");
    }

    #[test]
    fn test_completed_link_requires_nonempty() {
        let payload = BackendPayload {
            is_complete: true,
            file_link: Some(String::new()),
            task_id: None,
        };
        assert_eq!(payload.completed_link(), None);

        let payload = BackendPayload {
            is_complete: false,
            file_link: Some("https://x/a.mp3".to_string()),
            task_id: None,
        };
        assert_eq!(payload.completed_link(), None);
    }

    #[test]
    fn test_initiate_form_truncates_title_by_chars() {
        let job = SynthesisJob {
            text: "这是一个很长的测试文本超过十个字符".to_string(),
            voice: "siqi".to_string(),
            rate: 5,
            pitch: 5,
            volume: 5,
            emotion: "neutral".to_string(),
            credential: "key".to_string(),
        };
        let form = HudunSpeechClient::initiate_form(&job);
        let title = &form.iter().find(|(k, _)| *k == "title").unwrap().1;
        assert_eq!(title.chars().count(), 10);
    }
}
