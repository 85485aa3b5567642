use tracing::{debug, info, instrument};

use super::{
    models::{PublicRaceView, RaceRecord},
    repository::RaceRecordStore,
    RaceError,
};

/// Shortest share token accepted for lookup
pub const MIN_SHARE_TOKEN_LENGTH: usize = 4;

/// Finds a race by its public share token
///
/// Looks in the token index first. Races without an index entry are found
/// by scanning the most recent `scan_limit` races, so older unindexed races
/// are unreachable.
pub struct ShareResolver {
    records: RaceRecordStore,
    scan_limit: usize,
}

impl ShareResolver {
    pub fn new(records: RaceRecordStore, scan_limit: usize) -> Self {
        Self {
            records,
            scan_limit,
        }
    }

    #[instrument(skip(self))]
    pub async fn resolve(&self, token: &str) -> Result<Option<PublicRaceView>, RaceError> {
        if token.chars().count() < MIN_SHARE_TOKEN_LENGTH {
            return Err(RaceError::InvalidShareToken(format!(
                "share tokens have at least {MIN_SHARE_TOKEN_LENGTH} characters"
            )));
        }

        let found = match self.lookup_indexed(token).await? {
            Some(record) => Some(record),
            None => self.scan_recent(token).await?,
        };

        match &found {
            Some(record) => info!(race_id = %record.id, "Resolved share token"),
            None => debug!("No race for share token"),
        }

        Ok(found.map(|record| record.to_public_view()))
    }

    async fn lookup_indexed(&self, token: &str) -> Result<Option<RaceRecord>, RaceError> {
        let Some(race_id) = self.records.race_id_for_share_token(token).await? else {
            return Ok(None);
        };

        Ok(self
            .records
            .load_record(&race_id)
            .await?
            .filter(|record| record.share_token == token))
    }

    async fn scan_recent(&self, token: &str) -> Result<Option<RaceRecord>, RaceError> {
        let race_ids = self.records.recent_race_ids(self.scan_limit).await?;
        debug!(candidates = race_ids.len(), "Scanning recent races for share token");

        for race_id in &race_ids {
            if let Some(record) = self.records.load_record(race_id).await? {
                if record.share_token == token {
                    return Ok(Some(record));
                }
            }
        }

        Ok(None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::race::models::keys;
    use crate::store::{InMemoryStore, KeyValueStore};
    use std::sync::Arc;

    async fn store_unindexed(store: &InMemoryStore, id: &str, token: &str) {
        let record = RaceRecord {
            id: id.to_string(),
            share_token: token.to_string(),
            timestamp: 42,
            participants: vec!["a.com".to_string(), "b.com".to_string()],
            scores: vec![10.0, 20.0],
            winner_index: 1,
            requester: None,
        };
        store
            .hset_multiple(&keys::race(id), &record.to_hash_fields().unwrap())
            .await
            .unwrap();
        store.lpush(keys::RACE_IDS, id).await.unwrap();
    }

    #[tokio::test]
    async fn short_tokens_are_rejected_without_store_access() {
        let store = Arc::new(InMemoryStore::new());
        let resolver = ShareResolver::new(RaceRecordStore::new(store.clone()), 1000);

        for token in ["", "a", "abc"] {
            assert!(matches!(
                resolver.resolve(token).await,
                Err(RaceError::InvalidShareToken(_))
            ));
        }
        assert_eq!(store.operation_count(), 0);
    }

    #[tokio::test]
    async fn falls_back_to_scanning_unindexed_races() {
        let store = Arc::new(InMemoryStore::new());
        store_unindexed(&store, "old", "legacy1").await;
        store_unindexed(&store, "new", "other1").await;
        let resolver = ShareResolver::new(RaceRecordStore::new(store.clone()), 1000);

        let view = resolver.resolve("legacy1").await.unwrap().unwrap();
        assert_eq!(view.share_token, "legacy1");
        assert_eq!(view.timestamp, 42);
        assert!(resolver.resolve("nothere").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn scan_stops_at_the_limit() {
        let store = Arc::new(InMemoryStore::new());
        store_unindexed(&store, "oldest", "deep01").await;
        store_unindexed(&store, "middle", "mid001").await;
        store_unindexed(&store, "newest", "top001").await;
        let resolver = ShareResolver::new(RaceRecordStore::new(store.clone()), 2);

        assert!(resolver.resolve("mid001").await.unwrap().is_some());
        assert!(resolver.resolve("deep01").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn ignores_index_entries_pointing_at_other_tokens() {
        let store = Arc::new(InMemoryStore::new());
        store_unindexed(&store, "race-1", "real01").await;
        store.set(&keys::share("fake01"), "race-1").await.unwrap();
        let resolver = ShareResolver::new(RaceRecordStore::new(store.clone()), 1000);

        assert!(resolver.resolve("fake01").await.unwrap().is_none());
    }
}
