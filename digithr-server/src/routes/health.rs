//! Liveness probe

use axum::Json;
use chrono::Utc;
use digithr_core::time::format_instant;
use serde_json::{json, Value};

/// GET /api/healthz
pub async fn healthz() -> Json<Value> {
    Json(json!({ "ok": true, "time": format_instant(&Utc::now()) }))
}
