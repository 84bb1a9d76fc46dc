use axum::extract::State;
use axum::Json;
use serde_json::json;

use super::AppState;

/// Liveness check. Always 200.
pub async fn health_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "OK",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "uptime_secs": state.start_time.elapsed().as_secs(),
    }))
}
