//! Tenant-scoped access controller
//!
//! Combines each tenant's scope (what the tenant owns) with the caller's rules
//! (what the caller may touch) to decide whether a request may reference a
//! set of hub or seller IDs, and to resolve the effective ID filter for it.

pub mod decision;
pub mod guard;
pub mod metrics;

pub use decision::{AccessDecision, RequestScope};
pub use guard::{AccessControlled, GuardError, RequestBody, ScopeGuard};
pub use metrics::{AccessMetrics, MetricsCollector};

use anyhow::Context;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

use crate::cache::{CacheStoreRef, MemoryCacheStore};
use crate::client::{HttpHubScopeClient, HttpSellerScopeClient};
use crate::config::AccessConfig;
use crate::error::{AccessError, Result};
use crate::rules::RuleEvaluatorRef;
use crate::scope::TenantScopeCache;
use crate::types::{dedup_ids, CallerIdentity, ResourceKind};

/// Validates requested resource IDs against tenant scope and caller rules
///
/// Checks are fail-fast: IDs are visited in request order and the first one
/// outside the tenant's scope, or not granted by the caller's rule, ends the
/// check with `Ok(false)`. Errors end it immediately as well.
pub struct AccessController {
    hub_scope: Arc<TenantScopeCache>,
    seller_scope: Arc<TenantScopeCache>,
    evaluator: RuleEvaluatorRef,
    metrics: Arc<MetricsCollector>,
}

impl AccessController {
    pub fn new(
        hub_scope: Arc<TenantScopeCache>,
        seller_scope: Arc<TenantScopeCache>,
        evaluator: RuleEvaluatorRef,
    ) -> Self {
        Self {
            hub_scope,
            seller_scope,
            evaluator,
            metrics: Arc::new(MetricsCollector::new()),
        }
    }

    /// Wire a controller from configuration: cache store, HTTP scope clients
    /// and both scope caches
    pub async fn from_config(
        config: &AccessConfig,
        evaluator: RuleEvaluatorRef,
    ) -> anyhow::Result<Self> {
        config.validate()?;
        let store = build_store(config).await?;

        let hub_client = HttpHubScopeClient::from_config(&config.hub_client)
            .context("Failed to build hub scope client")?;
        let seller_client = HttpSellerScopeClient::from_config(&config.seller_client)
            .context("Failed to build seller scope client")?;

        let hub_scope = TenantScopeCache::from_config(
            ResourceKind::Hub,
            store.clone(),
            Arc::new(hub_client),
            &config.cache,
        );
        let seller_scope = TenantScopeCache::from_config(
            ResourceKind::Seller,
            store,
            Arc::new(seller_client),
            &config.cache,
        );

        info!(
            "AccessController initialized with ttl={}s, single_flight={}, redis={}",
            config.cache.ttl_secs,
            config.cache.single_flight,
            config.redis.is_some()
        );

        Ok(Self::new(Arc::new(hub_scope), Arc::new(seller_scope), evaluator))
    }

    /// Scope cache for a resource kind
    pub fn scope(&self, kind: ResourceKind) -> &Arc<TenantScopeCache> {
        match kind {
            ResourceKind::Hub => &self.hub_scope,
            ResourceKind::Seller => &self.seller_scope,
        }
    }

    /// Check that every requested ID belongs to the tenant and is granted to
    /// the caller. An empty request is permitted without any lookup.
    pub async fn validate(
        &self,
        kind: ResourceKind,
        identity: &CallerIdentity,
        tenant_id: &str,
        requested: &[String],
    ) -> Result<bool> {
        let started = Instant::now();
        let result = self.check(kind, identity, tenant_id, requested).await;

        match &result {
            Ok(permitted) => self.metrics.record_decision(*permitted),
            Err(_) => self.metrics.record_error(),
        }
        self.metrics.record_latency(started.elapsed());

        result
    }

    pub async fn validate_hub_ids(
        &self,
        identity: &CallerIdentity,
        tenant_id: &str,
        hub_ids: &[String],
    ) -> Result<bool> {
        self.validate(ResourceKind::Hub, identity, tenant_id, hub_ids).await
    }

    pub async fn validate_seller_ids(
        &self,
        identity: &CallerIdentity,
        tenant_id: &str,
        seller_ids: &[String],
    ) -> Result<bool> {
        self.validate(ResourceKind::Seller, identity, tenant_id, seller_ids)
            .await
    }

    /// Validate and work out the effective ID set for the request.
    ///
    /// With no requested IDs the caller's own grant applies (unrestricted for a
    /// wildcard rule). Otherwise the requested IDs are narrowed to the grant.
    pub async fn resolve(
        &self,
        kind: ResourceKind,
        identity: &CallerIdentity,
        tenant_id: &str,
        requested: &[String],
    ) -> Result<AccessDecision> {
        if requested.is_empty() {
            let granted = identity.rule_group.granted_ids(kind.rule_name())?;
            return Ok(AccessDecision::permit(granted));
        }

        if !self.validate(kind, identity, tenant_id, requested).await? {
            return Ok(AccessDecision::deny());
        }

        let granted = identity.rule_group.granted_ids(kind.rule_name())?;
        Ok(AccessDecision::permit(granted.restrict_to(requested)))
    }

    /// Resolve, then attach the effective set to `scope` when permitted
    pub async fn validate_and_set(
        &self,
        kind: ResourceKind,
        identity: &CallerIdentity,
        tenant_id: &str,
        requested: &[String],
        scope: &mut RequestScope,
    ) -> Result<bool> {
        let decision = self.resolve(kind, identity, tenant_id, requested).await?;
        if decision.permitted {
            scope.set(kind, decision.resolved_ids);
        }
        Ok(decision.permitted)
    }

    pub async fn validate_and_set_hub_ids(
        &self,
        identity: &CallerIdentity,
        tenant_id: &str,
        hub_ids: &[String],
        scope: &mut RequestScope,
    ) -> Result<bool> {
        self.validate_and_set(ResourceKind::Hub, identity, tenant_id, hub_ids, scope)
            .await
    }

    pub async fn validate_and_set_seller_ids(
        &self,
        identity: &CallerIdentity,
        tenant_id: &str,
        seller_ids: &[String],
        scope: &mut RequestScope,
    ) -> Result<bool> {
        self.validate_and_set(ResourceKind::Seller, identity, tenant_id, seller_ids, scope)
            .await
    }

    /// Check a single ID: it must belong to the tenant and be granted to the
    /// caller. Both conditions are evaluated.
    pub async fn validate_one(
        &self,
        kind: ResourceKind,
        identity: &CallerIdentity,
        tenant_id: &str,
        id: &str,
    ) -> Result<bool> {
        if tenant_id.is_empty() {
            return Err(AccessError::MissingTenant);
        }

        let owned = self.scope(kind).get(tenant_id).await?;
        let is_member = owned.iter().any(|owned_id| owned_id == id);

        let attributes = HashMap::from([(kind.attribute_key().to_string(), id.to_string())]);
        let granted = self
            .evaluator
            .rule_valid(&identity.rule_group, &attributes, &[kind.rule_name()])?;

        Ok(is_member && granted)
    }

    /// Whether the caller's rule for `kind` grants every ID
    pub fn has_unrestricted_access(
        &self,
        kind: ResourceKind,
        identity: &CallerIdentity,
    ) -> Result<bool> {
        Ok(identity.rule_group.has_wildcard(kind.rule_name())?)
    }

    /// Validate the hub and seller IDs referenced by a payload.
    ///
    /// IDs are de-duplicated first. Both checks run unless one fails with an
    /// error; the payload is permitted only if both pass.
    pub async fn validate_payload(
        &self,
        identity: &CallerIdentity,
        tenant_id: &str,
        payload: &dyn AccessControlled,
    ) -> Result<bool> {
        let hub_ids = dedup_ids(payload.hub_ids());
        let seller_ids = dedup_ids(payload.seller_ids());

        let hubs_ok = self.validate_hub_ids(identity, tenant_id, &hub_ids).await?;
        let sellers_ok = self
            .validate_seller_ids(identity, tenant_id, &seller_ids)
            .await?;

        Ok(hubs_ok && sellers_ok)
    }

    /// Snapshot of access check metrics
    pub fn metrics(&self) -> AccessMetrics {
        self.metrics.snapshot()
    }

    pub fn export_prometheus(&self) -> String {
        self.metrics.export_prometheus()
    }

    async fn check(
        &self,
        kind: ResourceKind,
        identity: &CallerIdentity,
        tenant_id: &str,
        requested: &[String],
    ) -> Result<bool> {
        if requested.is_empty() {
            return Ok(true);
        }
        if tenant_id.is_empty() {
            return Err(AccessError::MissingTenant);
        }

        let owned = self.scope(kind).get(tenant_id).await?;
        let owned: HashSet<&str> = owned.iter().map(String::as_str).collect();
        let rule_names = [kind.rule_name()];

        for id in requested {
            if !owned.contains(id.as_str()) {
                debug!("{} {} not owned by tenant {}", kind, id, tenant_id);
                return Ok(false);
            }

            let attributes = HashMap::from([(kind.attribute_key().to_string(), id.clone())]);
            if !self
                .evaluator
                .rule_valid(&identity.rule_group, &attributes, &rule_names)?
            {
                debug!("{} {} not granted to user {}", kind, id, identity.user_id);
                return Ok(false);
            }
        }

        Ok(true)
    }
}

async fn build_store(config: &AccessConfig) -> anyhow::Result<CacheStoreRef> {
    match &config.redis {
        #[cfg(feature = "redis")]
        Some(redis) => {
            let store = crate::cache::RedisCacheStore::connect(&redis.url)
                .await
                .context("Failed to connect Redis cache store")?;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "redis"))]
        Some(_) => {
            anyhow::bail!("Redis cache store configured but the `redis` feature is disabled")
        }
        None => Ok(Arc::new(MemoryCacheStore::new())),
    }
}
