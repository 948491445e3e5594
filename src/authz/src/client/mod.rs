//! Clients for the services that own tenant resources
//!
//! A [`ScopeClient`] answers one question: which resource IDs belong to a
//! tenant. The scope caches call it on a miss.

mod http;
mod fixed;

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::ScopeClientError;

pub use fixed::StaticScopeClient;
pub use http::{HttpHubScopeClient, HttpSellerScopeClient, SellerFilters};

/// Type alias for a shared scope client
pub type ScopeClientRef = Arc<dyn ScopeClient>;

/// Source of truth for the resource IDs owned by a tenant
#[async_trait]
pub trait ScopeClient: Send + Sync {
    async fn tenant_resource_ids(&self, tenant_id: &str) -> Result<Vec<String>, ScopeClientError>;
}
