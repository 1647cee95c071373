//! Health check endpoint

use axum::Json;
use axum::extract::State;
use http::StatusCode;

use crate::state::AppState;

pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<serde_json::Value>) {
    let (status, code) = match state.store.health_check().await {
        Ok(()) => ("ok", StatusCode::OK),
        Err(e) => {
            tracing::error!(error = %e, "Store health check failed");
            ("degraded", StatusCode::SERVICE_UNAVAILABLE)
        }
    };

    (
        code,
        Json(serde_json::json!({
            "status": status,
            "service": "lokal-cloud",
            "version": env!("CARGO_PKG_VERSION"),
            "store": state.store.backend_name(),
            "git_hash": option_env!("GIT_HASH").unwrap_or("dev"),
        })),
    )
}
