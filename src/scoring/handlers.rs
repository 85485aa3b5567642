use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Deserialize;
use tracing::{info, instrument};

use super::{fetch_all, SiteScore};
use crate::race::recorder::MAX_PARTICIPANTS;
use crate::shared::{AppError, AppState};

/// Request payload for scoring candidate sites
#[derive(Debug, Deserialize)]
pub struct ScoreRequest {
    pub urls: Vec<String>,
}

/// HTTP handler for fetching performance scores
///
/// POST /api/pagespeed
/// Always answers with one entry per requested URL, in order
#[instrument(name = "fetch_scores", skip(state, payload))]
pub async fn fetch_scores(
    State(state): State<AppState>,
    payload: Result<Json<ScoreRequest>, JsonRejection>,
) -> Result<Json<Vec<SiteScore>>, AppError> {
    let Json(request) = payload?;
    if request.urls.is_empty() || request.urls.len() > MAX_PARTICIPANTS {
        return Err(AppError::BadRequest(format!(
            "expected 1 to {MAX_PARTICIPANTS} URLs, got {}",
            request.urls.len()
        )));
    }

    let results = fetch_all(state.score_fetcher.as_ref(), &request.urls).await;
    let failed = results.iter().filter(|r| r.error.is_some()).count();
    info!(failed, "Scores fetched");

    Ok(Json(results))
}
