//! Health Handler

use axum::Json;
use serde_json::{json, Value};

/// 存活探针
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
