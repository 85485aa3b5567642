// Public API - what other modules can use
pub use errors::StoreError;
pub use memory::InMemoryStore;
pub use redis_store::RedisStore;

// Internal modules
mod errors;
mod memory;
mod redis_store;

use async_trait::async_trait;
use std::collections::HashMap;

/// Generic key-value store capability shared by every race component.
///
/// Mirrors the subset of Redis commands the game needs. Each call is
/// expected to be atomic per key; nothing spans keys.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Sets the key only when it does not exist yet. Returns true if the value was written.
    async fn set_if_absent(&self, key: &str, value: &str) -> Result<bool, StoreError>;

    async fn incr(&self, key: &str) -> Result<i64, StoreError>;

    /// Pushes to the front of the list, returns the new length
    async fn lpush(&self, key: &str, value: &str) -> Result<usize, StoreError>;

    /// Inclusive range, negative indices count from the end (`0, -1` is the whole list)
    async fn lrange(&self, key: &str, start: isize, stop: isize)
        -> Result<Vec<String>, StoreError>;

    async fn hset_multiple(&self, key: &str, fields: &[(String, String)])
        -> Result<(), StoreError>;
    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>, StoreError>;

    /// Increments a ranked-set member, returns its new score
    async fn zincrby(&self, key: &str, member: &str, delta: f64) -> Result<f64, StoreError>;

    /// Members with scores in rank order; `rev` ranks highest score first
    async fn zrange_with_scores(
        &self,
        key: &str,
        start: isize,
        stop: isize,
        rev: bool,
    ) -> Result<Vec<(String, f64)>, StoreError>;
}

/// Resolves Redis-style inclusive `start..=stop` indices against a length.
/// Returns `None` when the range selects nothing.
pub(crate) fn resolve_range(len: usize, start: isize, stop: isize) -> Option<(usize, usize)> {
    if len == 0 {
        return None;
    }
    let len = len as isize;
    let start = if start < 0 { (len + start).max(0) } else { start };
    let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };

    if start > stop || start >= len || stop < 0 {
        return None;
    }
    Some((start as usize, stop as usize))
}
