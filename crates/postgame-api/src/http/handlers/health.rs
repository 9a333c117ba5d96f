//! Liveness check.

use axum::Json;
use serde_json::{Value, json};

/// GET /health - fixed healthy status, no state consulted.
pub async fn health_check() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}
