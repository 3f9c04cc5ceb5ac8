//! Speech Handler
//!
//! POST /v1/audio/speech 的处理逻辑：校验 Bearer 凭证与请求体，
//! 在阻塞线程上驱动门面（凭证原样透传给后端，兼作设备标识与令牌），
//! 成功后以对应 MIME 类型返回音频字节

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::Response,
    Json,
};
use std::str::FromStr;
use std::sync::Arc;

use crate::application::ports::AudioFormat;
use crate::application::SpeechRequest;
use crate::infrastructure::http::dto::SpeechRequestDto;
use crate::infrastructure::http::error::ApiError;
use crate::infrastructure::http::state::AppState;

/// 提取 Bearer 凭证
fn extract_bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

pub async fn synthesize_speech(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(dto): Json<SpeechRequestDto>,
) -> Result<Response, ApiError> {
    let credential = extract_bearer(&headers).ok_or_else(|| {
        ApiError::Unauthorized("Missing API key in Authorization header".to_string())
    })?;

    let text = dto
        .input
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .ok_or_else(|| ApiError::BadRequest("Missing 'input' in request body".to_string()))?;

    let format = match dto.response_format.as_deref() {
        Some(name) => AudioFormat::from_str(name)
            .map_err(|_| ApiError::BadRequest(format!("Unsupported response_format: {}", name)))?,
        None => state.defaults.format,
    };

    let voice = dto
        .voice
        .clone()
        .unwrap_or_else(|| state.defaults.voice.clone());
    let speed = dto.speed_as_rate(state.defaults.max_param);

    let request = SpeechRequest::new(text, voice, credential, format).with_speed(speed);

    // 门面是阻塞入口，放到阻塞线程上驱动，避免占住工作线程
    let facade = state.facade.clone();
    let path = tokio::task::spawn_blocking(move || facade.generate_speech(request))
        .await
        .map_err(|e| ApiError::Internal(format!("pipeline task panicked: {}", e)))??;

    let audio = tokio::fs::read(&path)
        .await
        .map_err(|e| ApiError::Internal(format!("failed to read audio file: {}", e)))?;

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, format.mime_type())
        .header(header::CONTENT_LENGTH, audio.len())
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=speech.{}", format.extension()),
        )
        .body(Body::from(audio))
        .map_err(|e| ApiError::Internal(e.to_string()))
}
