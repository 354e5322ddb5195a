use std::sync::Arc;

use axum::{Extension, Json};
use engine_session::Supervisor;
use serde_json::{json, Value as JsonValue};

/// GET /health
pub async fn health_check(Extension(supervisor): Extension<Arc<Supervisor>>) -> Json<JsonValue> {
    Json(json!({
        "status": "ok",
        "engineSessions": supervisor.live_sessions().await,
    }))
}
