use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use siterace::{InMemoryStore, KeyValueStore, ScoreError, ScoreFetcher, StoreError};

// ============================================================================
// Mock Infrastructure
// ============================================================================

/// Store that accepts a fixed number of writes and then fails every write
pub struct FlakyStore {
    inner: Arc<InMemoryStore>,
    writes_allowed: usize,
    writes_seen: AtomicUsize,
}

impl FlakyStore {
    pub fn failing_after(writes_allowed: usize) -> Self {
        Self {
            inner: Arc::new(InMemoryStore::new()),
            writes_allowed,
            writes_seen: AtomicUsize::new(0),
        }
    }

    pub fn inner(&self) -> Arc<InMemoryStore> {
        self.inner.clone()
    }

    fn check_write(&self) -> Result<(), StoreError> {
        let seen = self.writes_seen.fetch_add(1, Ordering::SeqCst);
        if seen >= self.writes_allowed {
            return Err(StoreError::Connection("connection reset".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FlakyStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.check_write()?;
        self.inner.set(key, value).await
    }

    async fn set_if_absent(&self, key: &str, value: &str) -> Result<bool, StoreError> {
        self.check_write()?;
        self.inner.set_if_absent(key, value).await
    }

    async fn incr(&self, key: &str) -> Result<i64, StoreError> {
        self.check_write()?;
        self.inner.incr(key).await
    }

    async fn lpush(&self, key: &str, value: &str) -> Result<usize, StoreError> {
        self.check_write()?;
        self.inner.lpush(key, value).await
    }

    async fn lrange(
        &self,
        key: &str,
        start: isize,
        stop: isize,
    ) -> Result<Vec<String>, StoreError> {
        self.inner.lrange(key, start, stop).await
    }

    async fn hset_multiple(
        &self,
        key: &str,
        fields: &[(String, String)],
    ) -> Result<(), StoreError> {
        self.check_write()?;
        self.inner.hset_multiple(key, fields).await
    }

    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>, StoreError> {
        self.inner.hgetall(key).await
    }

    async fn zincrby(&self, key: &str, member: &str, delta: f64) -> Result<f64, StoreError> {
        self.check_write()?;
        self.inner.zincrby(key, member, delta).await
    }

    async fn zrange_with_scores(
        &self,
        key: &str,
        start: isize,
        stop: isize,
        rev: bool,
    ) -> Result<Vec<(String, f64)>, StoreError> {
        self.inner.zrange_with_scores(key, start, stop, rev).await
    }
}

/// Score fetcher answering from a fixed table; unknown sites fail
pub struct StaticScoreFetcher {
    scores: HashMap<String, f64>,
}

impl StaticScoreFetcher {
    pub fn new(scores: &[(&str, f64)]) -> Self {
        Self {
            scores: scores
                .iter()
                .map(|(site, score)| (site.to_string(), *score))
                .collect(),
        }
    }
}

#[async_trait]
impl ScoreFetcher for StaticScoreFetcher {
    async fn fetch_score(&self, site: &str) -> Result<f64, ScoreError> {
        self.scores
            .get(site)
            .copied()
            .ok_or(ScoreError::MissingScore)
    }
}
