use axum::extract::State;
use axum::Json;

use crate::db::golden_repo;
use crate::models::GoldenShadowSignal;
use crate::AppState;

use super::ApiResponse;

const RECENT_LIMIT: i64 = 100;

/// Golden-shadow signals still awaiting an outcome.
pub async fn pending(
    State(state): State<AppState>,
) -> Json<ApiResponse<Vec<GoldenShadowSignal>>> {
    match golden_repo::list_pending(&state.db).await {
        Ok(signals) => Json(ApiResponse::ok(signals)),
        Err(e) => Json(ApiResponse::err(e)),
    }
}

/// Recent golden-shadow signals regardless of outcome, newest first.
pub async fn recent(
    State(state): State<AppState>,
) -> Json<ApiResponse<Vec<GoldenShadowSignal>>> {
    match golden_repo::list_recent(&state.db, RECENT_LIMIT).await {
        Ok(signals) => Json(ApiResponse::ok(signals)),
        Err(e) => Json(ApiResponse::err(e)),
    }
}
