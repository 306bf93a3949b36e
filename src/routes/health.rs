//! # routes::health

use axum::{response::IntoResponse, Json};
use chrono::Utc;
use serde_json::json;

// ─── GET /health ──────────────────────────────────────────────────────────────

/// Liveness probe for load balancers and EA connectivity checks.
pub async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status":    "ok",
        "timestamp": Utc::now().to_rfc3339(),
    }))
}
