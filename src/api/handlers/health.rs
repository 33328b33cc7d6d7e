use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::AppState;

/// Liveness plus a database round-trip. Unreachable storage reports 503
/// so an orchestrator can restart or reroute before scoring degrades.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    match sqlx::query("SELECT 1").execute(&state.db).await {
        Ok(_) => (
            StatusCode::OK,
            Json(json!({ "status": "healthy", "service": "asi-engine" })),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "Health check could not reach the database");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unhealthy", "db": "unreachable" })),
            )
        }
    }
}
