//! Cached tenant scope record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{ResourceKind, TenantId};

/// Resource IDs owned by a tenant, as last reported by the owning service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantScope {
    /// Kind of resource listed
    pub resource_kind: ResourceKind,
    /// Owning tenant
    pub tenant_id: TenantId,
    /// Resource IDs in the order the owning service returned them
    pub resource_ids: Vec<String>,
    /// When the entry was fetched
    pub populated_at: DateTime<Utc>,
}

impl TenantScope {
    pub fn new(
        resource_kind: ResourceKind,
        tenant_id: impl Into<TenantId>,
        resource_ids: Vec<String>,
    ) -> Self {
        Self {
            resource_kind,
            tenant_id: tenant_id.into(),
            resource_ids,
            populated_at: Utc::now(),
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.resource_ids.iter().any(|owned| owned == id)
    }

    pub fn is_empty(&self) -> bool {
        self.resource_ids.is_empty()
    }
}
