use axum::extract::{Path, State};
use axum::Json;

use crate::db::divergence_repo;
use crate::errors::AppError;
use crate::models::IntentDivergenceLog;
use crate::AppState;

use super::ApiResponse;

/// Latest divergence evaluation for one asset.
pub async fn latest(
    State(state): State<AppState>,
    Path(asset_id): Path<String>,
) -> Result<Json<ApiResponse<IntentDivergenceLog>>, AppError> {
    let log = divergence_repo::get_latest(&state.db, &asset_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("no divergence evaluation for {asset_id}")))?;

    Ok(Json(ApiResponse::ok(log)))
}
