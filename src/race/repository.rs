use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

use super::{
    models::{keys, RaceRecord},
    RaceError,
};
use crate::store::{KeyValueStore, StoreError};

/// Persistent race history laid out over a generic key-value store
///
/// Owns the key layout; callers never build keys themselves. Every method
/// is a single store command except `load_record`'s decode step.
#[derive(Clone)]
pub struct RaceRecordStore {
    store: Arc<dyn KeyValueStore>,
}

impl RaceRecordStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Claims a share token for a race id. Returns false when the token is taken.
    pub async fn reserve_share_token(&self, token: &str, race_id: &str) -> Result<bool, RaceError> {
        Ok(self
            .store
            .set_if_absent(&keys::share(token), race_id)
            .await?)
    }

    pub async fn race_id_for_share_token(&self, token: &str) -> Result<Option<String>, RaceError> {
        Ok(self.store.get(&keys::share(token)).await?)
    }

    pub async fn save_record(&self, record: &RaceRecord) -> Result<(), RaceError> {
        let fields = record.to_hash_fields()?;
        self.store
            .hset_multiple(&keys::race(&record.id), &fields)
            .await?;
        Ok(())
    }

    pub async fn append_race_id(&self, race_id: &str) -> Result<(), RaceError> {
        self.store.lpush(keys::RACE_IDS, race_id).await?;
        Ok(())
    }

    pub async fn increment_race_count(&self) -> Result<i64, RaceError> {
        Ok(self.store.incr(keys::RACE_COUNT).await?)
    }

    pub async fn increment_site_usage(&self, site: &str) -> Result<(), RaceError> {
        self.store.zincrby(keys::SITE_USAGE, site, 1.0).await?;
        Ok(())
    }

    pub async fn increment_site_wins(&self, site: &str) -> Result<(), RaceError> {
        self.store.zincrby(keys::SITE_WINS, site, 1.0).await?;
        Ok(())
    }

    /// Total races recorded, 0 before the first race
    pub async fn race_count(&self) -> Result<u64, RaceError> {
        match self.store.get(keys::RACE_COUNT).await? {
            None => Ok(0),
            Some(value) => value.parse::<u64>().map_err(|_| {
                RaceError::Storage(StoreError::WrongType {
                    key: keys::RACE_COUNT.to_string(),
                    expected: "an integer",
                })
            }),
        }
    }

    /// Up to `limit` race ids, most recent first
    pub async fn recent_race_ids(&self, limit: usize) -> Result<Vec<String>, RaceError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let stop = isize::try_from(limit - 1).unwrap_or(isize::MAX);
        Ok(self.store.lrange(keys::RACE_IDS, 0, stop).await?)
    }

    /// Loads one race. Missing or undecodable records come back as `None`.
    #[instrument(skip(self))]
    pub async fn load_record(&self, race_id: &str) -> Result<Option<RaceRecord>, RaceError> {
        let fields = self.store.hgetall(&keys::race(race_id)).await?;
        if fields.is_empty() {
            debug!(race_id, "Race record not found");
            return Ok(None);
        }

        match RaceRecord::from_hash_fields(&fields) {
            Ok(record) => Ok(Some(record)),
            Err(err) => {
                warn!(race_id, error = %err, "Skipping unreadable race record");
                Ok(None)
            }
        }
    }

    /// Win counts keyed by normalized site
    pub async fn win_counts(&self) -> Result<HashMap<String, u64>, RaceError> {
        let ranked = self
            .store
            .zrange_with_scores(keys::SITE_WINS, 0, -1, false)
            .await?;
        Ok(ranked
            .into_iter()
            .map(|(site, wins)| (site, count_from_score(wins)))
            .collect())
    }

    /// Most used sites, highest usage first
    pub async fn top_sites_by_usage(&self, limit: usize) -> Result<Vec<(String, u64)>, RaceError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let stop = isize::try_from(limit - 1).unwrap_or(isize::MAX);
        let ranked = self
            .store
            .zrange_with_scores(keys::SITE_USAGE, 0, stop, true)
            .await?;
        Ok(ranked
            .into_iter()
            .map(|(site, uses)| (site, count_from_score(uses)))
            .collect())
    }
}

fn count_from_score(score: f64) -> u64 {
    if score.is_finite() && score > 0.0 {
        score.round() as u64
    } else {
        0
    }
}
