use axum::Json;
use serde_json::{json, Value};

pub async fn health_check() -> Json<Value> {
    Json(json!({ "status": "UP" }))
}

pub async fn readiness_check() -> Json<Value> {
    Json(json!({ "status": "READY" }))
}
