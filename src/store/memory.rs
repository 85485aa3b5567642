use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use super::{resolve_range, KeyValueStore, StoreError};

#[derive(Debug, Clone)]
enum Value {
    Text(String),
    List(VecDeque<String>),
    Hash(HashMap<String, String>),
    Ranked(HashMap<String, f64>),
}

/// In-memory implementation of KeyValueStore for development and testing
///
/// Follows Redis semantics for every command it supports, including
/// wrong-type errors. Data is lost when the process exits.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    entries: RwLock<HashMap<String, Value>>,
    operations: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of store commands issued so far (reads and writes)
    pub fn operation_count(&self) -> usize {
        self.operations.load(Ordering::SeqCst)
    }

    /// Number of keys currently held
    pub async fn key_count(&self) -> usize {
        self.entries.read().await.len()
    }

    fn track(&self) {
        self.operations.fetch_add(1, Ordering::SeqCst);
    }
}

fn wrong_type(key: &str, expected: &'static str) -> StoreError {
    StoreError::WrongType {
        key: key.to_string(),
        expected,
    }
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.track();
        match self.entries.read().await.get(key) {
            None => Ok(None),
            Some(Value::Text(text)) => Ok(Some(text.clone())),
            Some(_) => Err(wrong_type(key, "a string")),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.track();
        self.entries
            .write()
            .await
            .insert(key.to_string(), Value::Text(value.to_string()));
        Ok(())
    }

    async fn set_if_absent(&self, key: &str, value: &str) -> Result<bool, StoreError> {
        self.track();
        let mut entries = self.entries.write().await;
        if entries.contains_key(key) {
            return Ok(false);
        }
        entries.insert(key.to_string(), Value::Text(value.to_string()));
        Ok(true)
    }

    #[instrument(skip(self))]
    async fn incr(&self, key: &str) -> Result<i64, StoreError> {
        self.track();
        let mut entries = self.entries.write().await;
        let current = match entries.get(key) {
            None => 0,
            Some(Value::Text(text)) => text
                .parse::<i64>()
                .map_err(|_| wrong_type(key, "an integer"))?,
            Some(_) => return Err(wrong_type(key, "a string")),
        };

        let next = current + 1;
        entries.insert(key.to_string(), Value::Text(next.to_string()));
        debug!(key, value = next, "Incremented counter in memory");
        Ok(next)
    }

    async fn lpush(&self, key: &str, value: &str) -> Result<usize, StoreError> {
        self.track();
        let mut entries = self.entries.write().await;
        let entry = entries
            .entry(key.to_string())
            .or_insert_with(|| Value::List(VecDeque::new()));

        match entry {
            Value::List(list) => {
                list.push_front(value.to_string());
                Ok(list.len())
            }
            _ => Err(wrong_type(key, "a list")),
        }
    }

    async fn lrange(
        &self,
        key: &str,
        start: isize,
        stop: isize,
    ) -> Result<Vec<String>, StoreError> {
        self.track();
        let entries = self.entries.read().await;
        let list = match entries.get(key) {
            None => return Ok(Vec::new()),
            Some(Value::List(list)) => list,
            Some(_) => return Err(wrong_type(key, "a list")),
        };

        Ok(match resolve_range(list.len(), start, stop) {
            Some((from, to)) => list.range(from..=to).cloned().collect(),
            None => Vec::new(),
        })
    }

    async fn hset_multiple(
        &self,
        key: &str,
        fields: &[(String, String)],
    ) -> Result<(), StoreError> {
        self.track();
        let mut entries = self.entries.write().await;
        let entry = entries
            .entry(key.to_string())
            .or_insert_with(|| Value::Hash(HashMap::new()));

        match entry {
            Value::Hash(hash) => {
                for (field, value) in fields {
                    hash.insert(field.clone(), value.clone());
                }
                Ok(())
            }
            _ => Err(wrong_type(key, "a hash")),
        }
    }

    async fn hgetall(&self, key: &str) -> Result<HashMap<String, String>, StoreError> {
        self.track();
        match self.entries.read().await.get(key) {
            None => Ok(HashMap::new()),
            Some(Value::Hash(hash)) => Ok(hash.clone()),
            Some(_) => Err(wrong_type(key, "a hash")),
        }
    }

    async fn zincrby(&self, key: &str, member: &str, delta: f64) -> Result<f64, StoreError> {
        self.track();
        let mut entries = self.entries.write().await;
        let entry = entries
            .entry(key.to_string())
            .or_insert_with(|| Value::Ranked(HashMap::new()));

        match entry {
            Value::Ranked(members) => {
                let score = members.entry(member.to_string()).or_insert(0.0);
                *score += delta;
                Ok(*score)
            }
            _ => Err(wrong_type(key, "a ranked set")),
        }
    }

    async fn zrange_with_scores(
        &self,
        key: &str,
        start: isize,
        stop: isize,
        rev: bool,
    ) -> Result<Vec<(String, f64)>, StoreError> {
        self.track();
        let entries = self.entries.read().await;
        let members = match entries.get(key) {
            None => return Ok(Vec::new()),
            Some(Value::Ranked(members)) => members,
            Some(_) => return Err(wrong_type(key, "a ranked set")),
        };

        // Redis orders equal scores lexicographically by member
        let mut ranked: Vec<(String, f64)> = members
            .iter()
            .map(|(member, score)| (member.clone(), *score))
            .collect();
        ranked.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        if rev {
            ranked.reverse();
        }

        Ok(match resolve_range(ranked.len(), start, stop) {
            Some((from, to)) => ranked[from..=to].to_vec(),
            None => Vec::new(),
        })
    }
}
