use async_trait::async_trait;
use redis::{
    aio::{ConnectionManager, ConnectionManagerConfig},
    AsyncCommands, Client,
};
use std::collections::HashMap;
use tracing::{info, instrument};

use super::{KeyValueStore, StoreError};

/// Redis-backed KeyValueStore
///
/// Wraps a `ConnectionManager`, which reconnects on its own and is cheap to
/// clone per command.
#[derive(Clone)]
pub struct RedisStore {
    connection: ConnectionManager,
}

impl RedisStore {
    /// Opens a managed connection to the given redis:// URL
    #[instrument(skip(redis_url))]
    pub async fn connect(redis_url: &str) -> Result<Self, StoreError> {
        let config = ConnectionManagerConfig::new().set_number_of_retries(1);

        let client =
            Client::open(redis_url).map_err(|e| StoreError::Connection(e.to_string()))?;
        let connection = client.get_connection_manager_with_config(config).await?;

        info!("Connected to Redis");
        Ok(Self { connection })
    }

    fn conn(&self) -> ConnectionManager {
        self.connection.clone()
    }
}

#[async_trait]
impl KeyValueStore for RedisStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let value: Option<String> = self.conn().get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let _: () = self.conn().set(key, value).await?;
        Ok(())
    }

    async fn set_if_absent(&self, key: &str, value: &str) -> Result<bool, StoreError> {
        let written: bool = self.conn().set_nx(key, value).await?;
        Ok(written)
    }

    async fn incr(&self, key: &str) -> Result<i64, StoreError> {
        let value: i64 = self.conn().incr(key, 1).await?;
        Ok(value)
    }

    async fn lpush(&self, key: &str, value: &str) -> Result<usize, StoreError> {
        let len: usize = self.conn().lpush(key, value).await?;
        Ok(len)
    }

    async fn lrange(
        &self,
        key: &str,
        start: isize,
        stop: isize,
    ) -> Result<Vec<String>, StoreError> {
        let values: Vec<String> = self.conn().lrange(key, start, stop).await?;
        Ok(values)
    }

    async fn hset_multiple(
        &self,
        key: &str,
        fields: &[(String, String)],
    ) -> Result<(), StoreError> {
        let _: () = self.conn().hset_multiple(key, fields).await?;
        Ok(())
    }

    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>, StoreError> {
        let hash: HashMap<String, String> = self.conn().hgetall(key).await?;
        Ok(hash)
    }

    async fn zincrby(&self, key: &str, member: &str, delta: f64) -> Result<f64, StoreError> {
        let score: f64 = self.conn().zincr(key, member, delta).await?;
        Ok(score)
    }

    async fn zrange_with_scores(
        &self,
        key: &str,
        start: isize,
        stop: isize,
        rev: bool,
    ) -> Result<Vec<(String, f64)>, StoreError> {
        let ranked: Vec<(String, f64)> = if rev {
            self.conn().zrevrange_withscores(key, start, stop).await?
        } else {
            self.conn().zrange_withscores(key, start, stop).await?
        };
        Ok(ranked)
    }
}
