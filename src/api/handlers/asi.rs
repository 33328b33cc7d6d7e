use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;

use crate::db::asset_repo;
use crate::engine::AsiScores;
use crate::errors::AppError;
use crate::services::evaluation::compute_asi;
use crate::AppState;

use super::ApiResponse;

/// Multi-horizon ASI for one asset, computed from the score store as of
/// the request instant. Horizons without fresh data read as null with
/// an INSUFFICIENT status, never a default score.
pub async fn get_asi(
    State(state): State<AppState>,
    Path(asset_id): Path<String>,
) -> Result<Json<ApiResponse<AsiScores>>, AppError> {
    if asset_repo::get_snapshot(&state.db, &asset_id).await?.is_none() {
        return Err(AppError::NotFound(format!("unknown asset {asset_id}")));
    }

    let scores = compute_asi(&state.db, &state.config, &asset_id, Utc::now())
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    Ok(Json(ApiResponse::ok(scores)))
}
