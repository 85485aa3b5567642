use serde::{Deserialize, Serialize};

/// Request payload for storing a finished race
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRaceRequest {
    #[serde(alias = "participants")]
    pub urls: Vec<String>,
    pub scores: Vec<f64>,
    pub winner_index: i64,
}

/// Response for a stored race
#[derive(Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRaceResponse {
    pub success: bool,
    pub id: String,
    pub share_id: String,
}

/// Query string for the admin stats endpoint
#[derive(Debug, Deserialize)]
pub struct AdminStatsQuery {
    pub token: Option<String>,
}
