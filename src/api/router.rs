use axum::routing::get;
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers;
use crate::AppState;

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::metrics::render))
        .route("/api/assets/:asset_id/asi", get(handlers::asi::get_asi))
        .route(
            "/api/assets/:asset_id/divergence",
            get(handlers::divergence::latest),
        )
        .route("/api/signals/pending", get(handlers::signals::pending))
        .route("/api/signals", get(handlers::signals::recent))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
