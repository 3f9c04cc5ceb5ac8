//! HTTP Routes
//!
//! API Endpoints:
//! - /v1/audio/speech  POST  语音合成（OpenAI 风格）
//! - /audio/speech     POST  同上（无前缀别名）
//! - /health           GET   存活探针

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/v1/audio/speech", post(handlers::synthesize_speech))
        .route("/audio/speech", post(handlers::synthesize_speech))
        .route("/health", get(handlers::health))
}
