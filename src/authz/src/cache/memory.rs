//! In-process cache store with per-entry TTL

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::store::CacheStore;
use crate::error::CacheStoreError;

/// Stored value with TTL
#[derive(Debug, Clone)]
struct StoredValue {
    bytes: Vec<u8>,
    stored_at: Instant,
    ttl: Duration,
}

impl StoredValue {
    fn new(bytes: Vec<u8>, ttl: Duration) -> Self {
        Self {
            bytes,
            stored_at: Instant::now(),
            ttl,
        }
    }

    fn is_expired(&self) -> bool {
        self.stored_at.elapsed() > self.ttl
    }
}

/// Cache store kept in a concurrent map
///
/// Suitable for a single process and for tests. Expired entries are dropped
/// lazily on read, or eagerly with [`MemoryCacheStore::cleanup_expired`].
#[derive(Debug, Clone, Default)]
pub struct MemoryCacheStore {
    entries: Arc<DashMap<String, StoredValue>>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries, including expired ones not yet dropped
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether a live (unexpired) entry exists for `key`
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries
            .get(key)
            .map(|entry| !entry.is_expired())
            .unwrap_or(false)
    }

    /// Removes expired entries
    pub fn cleanup_expired(&self) {
        self.entries.retain(|_, entry| !entry.is_expired());
    }
}

#[async_trait]
impl CacheStore for MemoryCacheStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheStoreError> {
        if let Some(entry) = self.entries.get(key) {
            if !entry.is_expired() {
                return Ok(Some(entry.bytes.clone()));
            }
        } else {
            return Ok(None);
        }

        // Expired: drop it unless a fresh value was written meanwhile
        self.entries.remove_if(key, |_, entry| entry.is_expired());
        Ok(None)
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheStoreError> {
        self.entries.insert(key.to_string(), StoredValue::new(value, ttl));
        Ok(())
    }

    async fn unlink(&self, keys: &[String]) -> Result<u64, CacheStoreError> {
        let removed = keys
            .iter()
            .filter(|key| self.entries.remove(key.as_str()).is_some())
            .count();
        Ok(removed as u64)
    }
}
