//! # IMS Tenant Access Control
//!
//! Tenant-scoped authorization for inventory requests. A request may only
//! reference hubs and sellers that belong to the caller's tenant and that the
//! caller's rules grant.
//!
//! ## Components
//!
//! - **Scope caches** ([`scope::TenantScopeCache`]): per-tenant hub and seller
//!   ID lists, cache-aside over a [`cache::CacheStore`] with a one-day TTL
//! - **Scope clients** ([`client::ScopeClient`]): the owning services, asked
//!   on a cache miss
//! - **Rules** ([`rules::RuleEvaluator`]): the caller's entitlements
//! - **Controller** ([`engine::AccessController`]): fail-fast validation and
//!   resolution of the effective ID filter for a request
//! - **Guard** ([`engine::ScopeGuard`]): request-body checks for
//!   inter-service calls
//!
//! ## Example
//!
//! ```rust
//! use std::sync::Arc;
//! use ims_authz::cache::MemoryCacheStore;
//! use ims_authz::client::StaticScopeClient;
//! use ims_authz::engine::{AccessController, RequestScope};
//! use ims_authz::rules::{Condition, ConditionEvaluator, Rule, RuleGroup, RuleName};
//! use ims_authz::scope::TenantScopeCache;
//! use ims_authz::types::{CallerIdentity, ResourceKind};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(MemoryCacheStore::new());
//!     let hubs = StaticScopeClient::new().with_tenant("acme", ["h1", "h2"]);
//!     let sellers = StaticScopeClient::new().with_tenant("acme", ["s1"]);
//!
//!     let controller = AccessController::new(
//!         Arc::new(TenantScopeCache::new(ResourceKind::Hub, store.clone(), Arc::new(hubs))),
//!         Arc::new(TenantScopeCache::new(ResourceKind::Seller, store, Arc::new(sellers))),
//!         Arc::new(ConditionEvaluator::new()),
//!     );
//!
//!     let caller = CallerIdentity::new(
//!         "alice",
//!         "acme",
//!         RuleGroup::new(vec![Rule::new(RuleName::UserHub, vec![Condition::equals(["h1"])])]),
//!     );
//!
//!     let mut scope = RequestScope::new();
//!     let permitted = controller
//!         .validate_and_set_hub_ids(&caller, "acme", &["h1".to_string()], &mut scope)
//!         .await?;
//!
//!     assert!(permitted);
//!     assert_eq!(scope.query_params()["hub_ids"], vec!["h1"]);
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod client;
pub mod config;
pub mod engine;
pub mod error;
pub mod rules;
pub mod scope;
pub mod types;

pub use config::AccessConfig;
pub use engine::{AccessController, AccessDecision, RequestScope, ScopeGuard};
pub use error::{AccessError, Result};
pub use scope::TenantScopeCache;
pub use types::{CallerIdentity, ResolvedIds, ResourceKind};
