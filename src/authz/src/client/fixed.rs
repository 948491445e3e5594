//! Scope client backed by a fixed tenant table

use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::ScopeClient;
use crate::error::ScopeClientError;

/// Scope client answering from an in-process table
///
/// Unknown tenants own nothing. Useful for local runs, tests and benchmarks.
#[derive(Debug, Clone, Default)]
pub struct StaticScopeClient {
    tenants: Arc<DashMap<String, Vec<String>>>,
    calls: Arc<AtomicUsize>,
}

impl StaticScopeClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style helper to seed a tenant
    pub fn with_tenant<I, S>(self, tenant_id: &str, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_tenant(tenant_id, ids);
        self
    }

    /// Replace the IDs owned by a tenant
    pub fn set_tenant<I, S>(&self, tenant_id: &str, ids: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tenants
            .insert(tenant_id.to_string(), ids.into_iter().map(Into::into).collect());
    }

    /// Number of lookups served so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ScopeClient for StaticScopeClient {
    async fn tenant_resource_ids(&self, tenant_id: &str) -> Result<Vec<String>, ScopeClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .tenants
            .get(tenant_id)
            .map(|ids| ids.clone())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_client() {
        let client = StaticScopeClient::new().with_tenant("t1", ["h1", "h2"]);

        assert_eq!(client.tenant_resource_ids("t1").await.unwrap(), vec!["h1", "h2"]);
        assert!(client.tenant_resource_ids("t2").await.unwrap().is_empty());
        assert_eq!(client.calls(), 2);

        client.set_tenant("t1", ["h3"]);
        assert_eq!(client.tenant_resource_ids("t1").await.unwrap(), vec!["h3"]);
    }
}
