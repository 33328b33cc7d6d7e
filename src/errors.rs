use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

/// Engine-level failure taxonomy. Component-local failures never halt a
/// batch: the worst outcome for one asset is a skipped cycle.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A required input is missing or stale beyond its budget.
    /// Propagated as a null score plus a data_status flag, never as an
    /// abort of the whole pass.
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    /// An upstream feed delivered a self-contradictory row; the affected
    /// score is treated as insufficient for this cycle.
    #[error("inconsistent input: {0}")]
    InconsistentInput(String),

    /// The optional narrative service failed or timed out. Scoring
    /// proceeds with a null insight.
    #[error("external service unavailable: {0}")]
    ExternalServiceUnavailable(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Internal(e) => {
                tracing::error!("Internal error: {e:?}");
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".into())
            }
        };

        (
            status,
            Json(ErrorBody {
                success: false,
                error: message,
            }),
        )
            .into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Internal(e.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_classes_name_their_cause() {
        let missing = EngineError::InsufficientData("no fresh sentiment for bitcoin".into());
        assert_eq!(
            missing.to_string(),
            "insufficient data: no fresh sentiment for bitcoin"
        );

        let corrupt =
            EngineError::InconsistentInput("negative on-chain flow magnitude for bitcoin".into());
        assert_eq!(
            corrupt.to_string(),
            "inconsistent input: negative on-chain flow magnitude for bitcoin"
        );

        let down = EngineError::ExternalServiceUnavailable("price feed: timeout".into());
        assert_eq!(
            down.to_string(),
            "external service unavailable: price feed: timeout"
        );
    }
}
