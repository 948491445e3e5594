//! Key/value cache stores backing the tenant scope caches
//!
//! The store is opaque: it holds encoded bytes with a TTL and knows nothing
//! about tenants. Encoding is chosen with [`Codec`].

mod store;
mod memory;
#[cfg(feature = "redis")]
mod redis;

pub use store::{CacheStore, CacheStoreRef, Codec};
pub use memory::MemoryCacheStore;
#[cfg(feature = "redis")]
pub use self::redis::RedisCacheStore;
