use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

/// Storage keys shared by the recorder, aggregator and resolvers
pub mod keys {
    /// Integer counter of all recorded races
    pub const RACE_COUNT: &str = "race:count";
    /// Race ids, most recent first
    pub const RACE_IDS: &str = "race:ids";
    /// Ranked set of site -> number of races entered
    pub const SITE_USAGE: &str = "race:urls:usage";
    /// Ranked set of site -> number of races won
    pub const SITE_WINS: &str = "race:wins";

    pub fn race(id: &str) -> String {
        format!("race:{id}")
    }

    pub fn share(token: &str) -> String {
        format!("race:share:{token}")
    }
}

/// Diagnostics captured from the submitting request. Never exposed publicly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequesterMeta {
    pub user_agent: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referrer: Option<String>,
}

/// One completed race, immutable once stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RaceRecord {
    pub id: String,
    #[serde(rename = "shareId")]
    pub share_token: String,
    /// Epoch milliseconds
    pub timestamp: i64,
    #[serde(rename = "urls")]
    pub participants: Vec<String>,
    pub scores: Vec<f64>,
    pub winner_index: usize,
    #[serde(flatten)]
    pub requester: Option<RequesterMeta>,
}

#[derive(Debug, Error, PartialEq)]
pub enum RecordDecodeError {
    #[error("missing field {0}")]
    MissingField(&'static str),

    #[error("invalid field {field}: {reason}")]
    InvalidField { field: &'static str, reason: String },
}

impl RaceRecord {
    /// Creates a record stamped with a fresh id and the current time
    pub fn new(
        share_token: String,
        participants: Vec<String>,
        scores: Vec<f64>,
        winner_index: usize,
        requester: Option<RequesterMeta>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().simple().to_string(),
            share_token,
            timestamp: Utc::now().timestamp_millis(),
            participants,
            scores,
            winner_index,
            requester,
        }
    }

    /// Flattens the record into hash fields; lists are stored as JSON arrays
    pub fn to_hash_fields(&self) -> Result<Vec<(String, String)>, serde_json::Error> {
        let mut fields = vec![
            ("id".to_string(), self.id.clone()),
            ("shareId".to_string(), self.share_token.clone()),
            ("timestamp".to_string(), self.timestamp.to_string()),
            ("urls".to_string(), serde_json::to_string(&self.participants)?),
            ("scores".to_string(), serde_json::to_string(&self.scores)?),
            ("winnerIndex".to_string(), self.winner_index.to_string()),
        ];

        if let Some(meta) = &self.requester {
            fields.push(("userAgent".to_string(), meta.user_agent.clone()));
            if let Some(ip) = &meta.ip_address {
                fields.push(("ipAddress".to_string(), ip.clone()));
            }
            if let Some(referrer) = &meta.referrer {
                fields.push(("referrer".to_string(), referrer.clone()));
            }
        }

        Ok(fields)
    }

    /// Rebuilds a record from its stored hash fields
    pub fn from_hash_fields(fields: &HashMap<String, String>) -> Result<Self, RecordDecodeError> {
        let required = |name: &'static str| {
            fields
                .get(name)
                .ok_or(RecordDecodeError::MissingField(name))
        };
        let invalid = |field: &'static str, reason: String| RecordDecodeError::InvalidField {
            field,
            reason,
        };

        let timestamp = required("timestamp")?
            .parse::<i64>()
            .map_err(|e| invalid("timestamp", e.to_string()))?;
        let participants: Vec<String> = serde_json::from_str(required("urls")?)
            .map_err(|e| invalid("urls", e.to_string()))?;
        let scores: Vec<f64> = serde_json::from_str(required("scores")?)
            .map_err(|e| invalid("scores", e.to_string()))?;
        let winner_index = required("winnerIndex")?
            .parse::<usize>()
            .map_err(|e| invalid("winnerIndex", e.to_string()))?;

        let requester = fields.get("userAgent").map(|user_agent| RequesterMeta {
            user_agent: user_agent.clone(),
            ip_address: fields.get("ipAddress").cloned(),
            referrer: fields.get("referrer").cloned(),
        });

        Ok(Self {
            id: required("id")?.clone(),
            share_token: required("shareId")?.clone(),
            timestamp,
            participants,
            scores,
            winner_index,
            requester,
        })
    }

    /// Score at the given position, 0 when the stored lists disagree in length
    pub fn score_at(&self, index: usize) -> f64 {
        self.scores.get(index).copied().unwrap_or(0.0)
    }

    pub fn winner(&self) -> Option<&str> {
        self.participants.get(self.winner_index).map(String::as_str)
    }

    pub fn to_public_view(&self) -> PublicRaceView {
        PublicRaceView {
            timestamp: self.timestamp,
            participants: self.participants.clone(),
            scores: self.scores.clone(),
            winner_index: self.winner_index,
            share_token: self.share_token.clone(),
        }
    }
}

/// Shareable view of a race, without internal id or requester metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicRaceView {
    pub timestamp: i64,
    #[serde(rename = "urls")]
    pub participants: Vec<String>,
    pub scores: Vec<f64>,
    pub winner_index: usize,
    #[serde(rename = "shareId")]
    pub share_token: String,
}

/// Per-site summary derived from race history on every request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    #[serde(rename = "url")]
    pub site: String,
    #[serde(rename = "score")]
    pub best_score: f64,
    pub total_races: u64,
    pub wins: u64,
    pub last_raced: i64,
}
