use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{race, scoring, shared::AppState};

/// Builds the HTTP API with all routes attached to the given state
pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/api/pagespeed", post(scoring::fetch_scores))
        .route("/api/results", post(race::submit_race))
        .route("/api/leaderboard", get(race::get_leaderboard))
        .route("/api/share/:token", get(race::get_shared_race))
        .route("/api/stats", get(race::get_public_stats))
        .route("/api/admin/stats", get(race::get_admin_stats))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}
