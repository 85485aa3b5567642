use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum RaceError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid share token: {0}")]
    InvalidShareToken(String),

    #[error("Storage failure: {0}")]
    Storage(#[from] StoreError),

    #[error("Could not encode race record: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("No unused share token after {attempts} attempts")]
    ShareTokenExhausted { attempts: usize },
}
