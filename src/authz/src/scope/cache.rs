//! Cache-aside tenant scope lookup

use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info};

use super::types::TenantScope;
use crate::cache::{CacheStoreRef, Codec};
use crate::client::ScopeClientRef;
use crate::config::CacheSection;
use crate::error::Result;
use crate::types::ResourceKind;

/// Default scope entry lifetime (one day)
pub const DEFAULT_SCOPE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Counters for one scope cache
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeCacheStats {
    /// Reads answered from the store
    pub hits: u64,
    /// Reads that had to go to the owning service
    pub misses: u64,
    /// Entries written after a successful fetch
    pub populations: u64,
    /// Explicit deletions
    pub invalidations: u64,
}

impl ScopeCacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

type InflightMap = DashMap<String, Arc<Mutex<()>>>;

/// Shared population lock for one key.
///
/// Dropping it, including when the owning `get` is cancelled, removes the
/// map entry once no other caller holds the lock.
struct InflightLock<'a> {
    inflight: &'a InflightMap,
    key: &'a str,
    lock: Arc<Mutex<()>>,
}

impl<'a> InflightLock<'a> {
    fn acquire(inflight: &'a InflightMap, key: &'a str) -> Self {
        let lock = inflight
            .entry(key.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        Self { inflight, key, lock }
    }
}

impl Drop for InflightLock<'_> {
    fn drop(&mut self) {
        // Two references left: the map's and ours
        self.inflight
            .remove_if(self.key, |_, lock| Arc::strong_count(lock) == 2);
    }
}

/// Per-tenant resource ID cache for one resource kind
///
/// Reads go to the store first; on a miss the owning service is asked and the
/// answer is written back with the configured TTL. Store and service failures
/// are returned as-is; a failed read never falls back to an older value.
///
/// With single-flight enabled, concurrent misses for the same tenant wait for
/// one fetch instead of each calling the owning service.
pub struct TenantScopeCache {
    kind: ResourceKind,
    store: CacheStoreRef,
    client: ScopeClientRef,
    codec: Codec,
    ttl: Duration,
    namespace: Option<String>,
    /// Per-key population locks, present when single-flight is on
    inflight: Option<Arc<InflightMap>>,
    stats: Arc<DashMap<&'static str, u64>>,
}

impl TenantScopeCache {
    /// Creates a cache with the default TTL, codec and no namespace
    pub fn new(kind: ResourceKind, store: CacheStoreRef, client: ScopeClientRef) -> Self {
        Self {
            kind,
            store,
            client,
            codec: Codec::default(),
            ttl: DEFAULT_SCOPE_TTL,
            namespace: None,
            inflight: None,
            stats: Arc::new(DashMap::new()),
        }
    }

    /// Creates a cache from a configuration section
    pub fn from_config(
        kind: ResourceKind,
        store: CacheStoreRef,
        client: ScopeClientRef,
        section: &CacheSection,
    ) -> Self {
        Self::new(kind, store, client)
            .with_ttl(section.ttl())
            .with_codec(section.codec)
            .with_namespace(section.namespace.clone())
            .with_single_flight(section.single_flight)
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_codec(mut self, codec: Codec) -> Self {
        self.codec = codec;
        self
    }

    /// Prefix keys with a service namespace. Empty or `None` means no prefix.
    pub fn with_namespace(mut self, namespace: Option<String>) -> Self {
        self.namespace = namespace.filter(|ns| !ns.is_empty());
        self
    }

    pub fn with_single_flight(mut self, enabled: bool) -> Self {
        self.inflight = enabled.then(|| Arc::new(DashMap::new()));
        self
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    #[cfg(test)]
    pub(crate) fn inflight_keys(&self) -> usize {
        self.inflight.as_ref().map_or(0, |inflight| inflight.len())
    }

    /// Store key for a tenant's scope
    pub fn cache_key(&self, tenant_id: &str) -> String {
        match &self.namespace {
            Some(ns) => format!("{}:{}{}", ns, self.kind.cache_key_prefix(), tenant_id),
            None => format!("{}{}", self.kind.cache_key_prefix(), tenant_id),
        }
    }

    /// Resource IDs owned by `tenant_id`
    pub async fn get(&self, tenant_id: &str) -> Result<Vec<String>> {
        let key = self.cache_key(tenant_id);

        if let Some(scope) = self.lookup(&key).await? {
            self.increment_stat("hits");
            debug!("Scope cache hit: {}", key);
            return Ok(scope.resource_ids);
        }

        self.increment_stat("misses");
        debug!("Scope cache miss: {}", key);

        match &self.inflight {
            Some(inflight) => {
                let flight = InflightLock::acquire(inflight, &key);
                let _held = flight.lock.lock().await;

                // Another caller may have populated while we waited
                match self.lookup(&key).await? {
                    Some(scope) => Ok(scope.resource_ids),
                    None => self.populate(tenant_id, &key).await,
                }
            }
            None => self.populate(tenant_id, &key).await,
        }
    }

    /// Drop a tenant's cached scope. Missing entries are not an error.
    pub async fn invalidate(&self, tenant_id: &str) -> Result<()> {
        let key = self.cache_key(tenant_id);
        let removed = self.store.unlink(&[key.clone()]).await?;

        self.increment_stat("invalidations");
        info!("Invalidated {} scope for tenant {} ({} removed)", self.kind, tenant_id, removed);
        Ok(())
    }

    /// Snapshot of the cache counters
    pub fn stats(&self) -> ScopeCacheStats {
        ScopeCacheStats {
            hits: self.get_stat("hits"),
            misses: self.get_stat("misses"),
            populations: self.get_stat("populations"),
            invalidations: self.get_stat("invalidations"),
        }
    }

    async fn lookup(&self, key: &str) -> Result<Option<TenantScope>> {
        match self.store.get(key).await? {
            Some(bytes) => Ok(Some(self.codec.decode(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn populate(&self, tenant_id: &str, key: &str) -> Result<Vec<String>> {
        let ids = self.client.tenant_resource_ids(tenant_id).await?;
        let scope = TenantScope::new(self.kind, tenant_id, ids);

        let bytes = self.codec.encode(&scope)?;
        self.store.set(key, bytes, self.ttl).await?;

        self.increment_stat("populations");
        debug!(
            "Populated {} scope for tenant {} ({} ids)",
            self.kind,
            tenant_id,
            scope.resource_ids.len()
        );
        Ok(scope.resource_ids)
    }

    fn increment_stat(&self, key: &'static str) {
        *self.stats.entry(key).or_insert(0) += 1;
    }

    fn get_stat(&self, key: &'static str) -> u64 {
        self.stats.get(key).map(|v| *v).unwrap_or(0)
    }
}

impl std::fmt::Debug for TenantScopeCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TenantScopeCache")
            .field("kind", &self.kind)
            .field("codec", &self.codec)
            .field("ttl", &self.ttl)
            .field("namespace", &self.namespace)
            .field("single_flight", &self.inflight.is_some())
            .finish()
    }
}
