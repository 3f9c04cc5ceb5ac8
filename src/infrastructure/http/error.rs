//! HTTP Error Handling

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::application::SynthesisError;

/// 统一错误响应格式
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<&'static str>,
}

/// API 错误
#[derive(Debug)]
pub enum ApiError {
    /// 请求体缺失/非法字段
    BadRequest(String),
    /// 缺失或畸形的 Bearer 凭证
    Unauthorized(String),
    /// 管线失败，携带分类标识供客户端与日志使用
    Synthesis {
        kind: &'static str,
        message: String,
    },
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest(msg) => {
                tracing::warn!(error = %msg, "Bad request");
                (
                    StatusCode::BAD_REQUEST,
                    ErrorResponse {
                        error: msg,
                        kind: None,
                    },
                )
            }
            ApiError::Unauthorized(msg) => {
                tracing::warn!(error = %msg, "Unauthorized request");
                (
                    StatusCode::UNAUTHORIZED,
                    ErrorResponse {
                        error: msg,
                        kind: None,
                    },
                )
            }
            ApiError::Synthesis { kind, message } => {
                tracing::error!(kind, error = %message, "Synthesis failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error: message,
                        kind: Some(kind),
                    },
                )
            }
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorResponse {
                        error: msg,
                        kind: None,
                    },
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<SynthesisError> for ApiError {
    fn from(e: SynthesisError) -> Self {
        ApiError::Synthesis {
            kind: e.kind(),
            message: e.to_string(),
        }
    }
}
