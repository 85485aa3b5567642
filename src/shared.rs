use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use std::sync::Arc;
use thiserror::Error;
use tracing::error;

use crate::config::AppConfig;
use crate::race::RaceError;
use crate::scoring::ScoreFetcher;
use crate::store::KeyValueStore;

/// Shared application state containing all dependencies
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn KeyValueStore>,
    pub score_fetcher: Arc<dyn ScoreFetcher>,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        score_fetcher: Arc<dyn ScoreFetcher>,
        config: AppConfig,
    ) -> Self {
        Self {
            store,
            score_fetcher,
            config: Arc::new(config),
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Storage failure: {0}")]
    StorageFailure(String),
}

impl From<RaceError> for AppError {
    fn from(err: RaceError) -> Self {
        match err {
            RaceError::Validation(msg) => AppError::BadRequest(msg),
            RaceError::InvalidShareToken(msg) => AppError::BadRequest(msg),
            RaceError::Storage(err) => AppError::StorageFailure(err.to_string()),
            RaceError::Encoding(err) => AppError::StorageFailure(err.to_string()),
            RaceError::ShareTokenExhausted { attempts } => AppError::StorageFailure(format!(
                "no unused share token after {attempts} attempts"
            )),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::StorageFailure(msg) => {
                error!(error = %msg, "Storage failure");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to access race storage".to_string(),
                )
            }
        };

        let body = Json(json!({
            "error": error_message
        }));

        (status, body).into_response()
    }
}
