use chrono::Utc;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;
use tracing::{info, instrument};

use super::{models::RaceRecord, repository::RaceRecordStore, RaceError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicStats {
    pub total_races: u64,
    /// Epoch milliseconds when the stats were read
    pub timestamp: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteUsage {
    pub url: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStats {
    pub total_races: u64,
    pub top_urls: Vec<SiteUsage>,
    /// Full records, requester metadata included
    pub recent_races: Vec<RaceRecord>,
}

/// Read-only aggregate counters over race history
pub struct RaceStatsService {
    records: RaceRecordStore,
}

impl RaceStatsService {
    pub fn new(records: RaceRecordStore) -> Self {
        Self { records }
    }

    #[instrument(skip(self))]
    pub async fn public_stats(&self) -> Result<PublicStats, RaceError> {
        Ok(PublicStats {
            total_races: self.records.race_count().await?,
            timestamp: Utc::now().timestamp_millis(),
        })
    }

    #[instrument(skip(self))]
    pub async fn admin_stats(
        &self,
        top_limit: usize,
        recent_limit: usize,
    ) -> Result<AdminStats, RaceError> {
        let (total_races, top_sites, recent_ids) = tokio::try_join!(
            self.records.race_count(),
            self.records.top_sites_by_usage(top_limit),
            self.records.recent_race_ids(recent_limit),
        )?;

        let loaded = futures::future::try_join_all(
            recent_ids.iter().map(|id| self.records.load_record(id)),
        )
        .await?;
        let recent_races: Vec<RaceRecord> = loaded.into_iter().flatten().collect();

        info!(
            total_races,
            top_sites = top_sites.len(),
            recent = recent_races.len(),
            "Admin stats gathered"
        );

        Ok(AdminStats {
            total_races,
            top_urls: top_sites
                .into_iter()
                .map(|(url, count)| SiteUsage { url, count })
                .collect(),
            recent_races,
        })
    }
}

/// True only when an admin token is configured and the caller sent the same one
pub fn is_admin_token(configured: Option<&str>, provided: Option<&str>) -> bool {
    match (configured, provided) {
        (Some(expected), Some(given)) => {
            !expected.is_empty() && bool::from(expected.as_bytes().ct_eq(given.as_bytes()))
        }
        _ => false,
    }
}
