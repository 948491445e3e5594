//! Cache store contract and value codecs

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::error::CacheStoreError;

/// Type alias for a shared cache store
pub type CacheStoreRef = Arc<dyn CacheStore>;

/// Generic keyed byte store with TTL and explicit deletion
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Fetch a value. `Ok(None)` is a miss; `Err` is a store failure.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheStoreError>;

    /// Store a value that expires after `ttl`
    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheStoreError>;

    /// Delete keys, returning how many existed. Missing keys are not an error.
    async fn unlink(&self, keys: &[String]) -> Result<u64, CacheStoreError>;
}

/// Value encoding used for cache entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Codec {
    /// Compact binary encoding
    #[default]
    Bincode,
    /// Human-readable encoding, handy when inspecting the store by hand
    Json,
}

impl Codec {
    pub fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, CacheStoreError> {
        match self {
            Codec::Bincode => {
                bincode::serialize(value).map_err(|e| CacheStoreError::serialization(e.to_string()))
            }
            Codec::Json => {
                serde_json::to_vec(value).map_err(|e| CacheStoreError::serialization(e.to_string()))
            }
        }
    }

    pub fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, CacheStoreError> {
        match self {
            Codec::Bincode => bincode::deserialize(bytes)
                .map_err(|e| CacheStoreError::serialization(e.to_string())),
            Codec::Json => serde_json::from_slice(bytes)
                .map_err(|e| CacheStoreError::serialization(e.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_garbage_is_serialization_error() {
        for codec in [Codec::Bincode, Codec::Json] {
            let result: Result<Vec<String>, _> = codec.decode(&[0xff, 0x00, 0x13]);
            assert!(matches!(result, Err(CacheStoreError::Serialization(_))));
        }
    }

    #[test]
    fn test_bincode_is_more_compact_than_json() {
        let ids: Vec<String> = (0..50).map(|i| format!("hub-{}", i)).collect();

        let binary = Codec::Bincode.encode(&ids).unwrap();
        let json = Codec::Json.encode(&ids).unwrap();

        assert!(binary.len() < json.len());
        let back: Vec<String> = Codec::Bincode.decode(&binary).unwrap();
        assert_eq!(back, ids);
    }
}
