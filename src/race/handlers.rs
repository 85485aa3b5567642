use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::HeaderMap,
    Json,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use super::{
    leaderboard::LeaderboardAggregator,
    models::{LeaderboardEntry, PublicRaceView, RequesterMeta},
    recorder::{NewRace, RaceRecorder},
    repository::RaceRecordStore,
    share::ShareResolver,
    stats::{is_admin_token, AdminStats, PublicStats, RaceStatsService},
    types::{AdminStatsQuery, SubmitRaceRequest, SubmitRaceResponse},
    RaceError,
};
use crate::shared::{AppError, AppState};

fn record_store(state: &AppState) -> RaceRecordStore {
    RaceRecordStore::new(Arc::clone(&state.store))
}

/// Reads diagnostics from the incoming request headers
fn requester_meta(headers: &HeaderMap) -> RequesterMeta {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string)
    };

    let ip_address = header("x-forwarded-for")
        .and_then(|forwarded| forwarded.split(',').next().map(|ip| ip.trim().to_string()))
        .filter(|ip| !ip.is_empty())
        .unwrap_or_else(|| "unknown".to_string());

    RequesterMeta {
        user_agent: header("user-agent").unwrap_or_else(|| "unknown".to_string()),
        ip_address: Some(ip_address),
        referrer: header("referer"),
    }
}

/// HTTP handler for storing a finished race
///
/// POST /api/results
/// Returns the internal id and the public share id
#[instrument(name = "submit_race", skip(state, headers, payload))]
pub async fn submit_race(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<SubmitRaceRequest>, JsonRejection>,
) -> Result<Json<SubmitRaceResponse>, AppError> {
    let Json(request) = payload?;
    let winner_index = usize::try_from(request.winner_index).map_err(|_| {
        RaceError::Validation(format!(
            "winner index {} must not be negative",
            request.winner_index
        ))
    })?;

    let recorder = RaceRecorder::new(record_store(&state));
    let record = recorder
        .record(NewRace {
            participants: request.urls,
            scores: request.scores,
            winner_index,
            requester: Some(requester_meta(&headers)),
        })
        .await?;

    Ok(Json(SubmitRaceResponse {
        success: true,
        id: record.id,
        share_id: record.share_token,
    }))
}

/// HTTP handler for the site leaderboard
///
/// GET /api/leaderboard
#[instrument(name = "get_leaderboard", skip(state))]
pub async fn get_leaderboard(
    State(state): State<AppState>,
) -> Result<Json<Vec<LeaderboardEntry>>, AppError> {
    let aggregator =
        LeaderboardAggregator::new(record_store(&state), state.config.leaderboard_scan_limit);
    Ok(Json(aggregator.compute().await?))
}

/// HTTP handler for a shared race
///
/// GET /api/share/:token
#[instrument(name = "get_shared_race", skip(state))]
pub async fn get_shared_race(
    State(state): State<AppState>,
    Path(token): Path<String>,
) -> Result<Json<PublicRaceView>, AppError> {
    let resolver = ShareResolver::new(record_store(&state), state.config.share_scan_limit);
    resolver
        .resolve(&token)
        .await?
        .map(Json)
        .ok_or_else(|| AppError::NotFound("Race result not found".to_string()))
}

/// HTTP handler for the public race counter
///
/// GET /api/stats
#[instrument(name = "get_public_stats", skip(state))]
pub async fn get_public_stats(
    State(state): State<AppState>,
) -> Result<Json<PublicStats>, AppError> {
    let service = RaceStatsService::new(record_store(&state));
    Ok(Json(service.public_stats().await?))
}

/// HTTP handler for admin statistics, gated by the shared admin token
///
/// GET /api/admin/stats?token=...
#[instrument(name = "get_admin_stats", skip(state, query))]
pub async fn get_admin_stats(
    State(state): State<AppState>,
    Query(query): Query<AdminStatsQuery>,
) -> Result<Json<AdminStats>, AppError> {
    if !is_admin_token(state.config.admin_token.as_deref(), query.token.as_deref()) {
        warn!("Rejected admin stats request");
        return Err(AppError::Unauthorized("Unauthorized".to_string()));
    }

    let service = RaceStatsService::new(record_store(&state));
    let stats = service
        .admin_stats(state.config.admin_top_limit, state.config.admin_recent_limit)
        .await?;

    info!(total_races = stats.total_races, "Served admin stats");
    Ok(Json(stats))
}
