//! Tenant scope caching
//!
//! A tenant scope is the list of resource IDs (hubs or sellers) a tenant owns.
//! [`TenantScopeCache`] keeps one entry per tenant in a [`CacheStore`] and
//! falls back to the owning service on a miss.
//!
//! # Examples
//!
//! ```
//! use std::sync::Arc;
//! use ims_authz::cache::MemoryCacheStore;
//! use ims_authz::client::StaticScopeClient;
//! use ims_authz::scope::TenantScopeCache;
//! use ims_authz::types::ResourceKind;
//!
//! # tokio_test::block_on(async {
//! let client = StaticScopeClient::new().with_tenant("t1", ["h1", "h2"]);
//! let cache = TenantScopeCache::new(
//!     ResourceKind::Hub,
//!     Arc::new(MemoryCacheStore::new()),
//!     Arc::new(client),
//! );
//!
//! assert_eq!(cache.get("t1").await.unwrap(), vec!["h1", "h2"]);
//! assert_eq!(cache.cache_key("t1"), "tenant_hubs_t1");
//! # });
//! ```
//!
//! [`CacheStore`]: crate::cache::CacheStore

mod types;
mod cache;


pub use types::TenantScope;
pub use cache::{ScopeCacheStats, TenantScopeCache, DEFAULT_SCOPE_TTL};
