//! Access decisions and the per-request scope they are attached to

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::types::{ResolvedIds, ResourceKind};

/// Outcome of a resolve-and-attach check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessDecision {
    /// Whether every requested ID was granted
    pub permitted: bool,

    /// Effective IDs the request may touch; only meaningful when permitted
    pub resolved_ids: ResolvedIds,
}

impl AccessDecision {
    pub fn permit(resolved_ids: ResolvedIds) -> Self {
        Self {
            permitted: true,
            resolved_ids,
        }
    }

    pub fn deny() -> Self {
        Self {
            permitted: false,
            resolved_ids: ResolvedIds::Enumerated(BTreeSet::new()),
        }
    }
}

/// Resolved ID sets carried by one request
///
/// Keyed by the resource kind's scope key (`hub_ids`, `seller_ids`). A missing
/// entry and an `Unrestricted` entry both mean "no filter".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestScope {
    entries: BTreeMap<String, ResolvedIds>,
}

impl RequestScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a resolved set, replacing any earlier one for the same kind
    pub fn set(&mut self, kind: ResourceKind, ids: ResolvedIds) {
        self.entries.insert(kind.scope_key().to_string(), ids);
    }

    pub fn get(&self, kind: ResourceKind) -> Option<&ResolvedIds> {
        self.entries.get(kind.scope_key())
    }

    /// IDs downstream queries must filter on, or `None` for no filter
    pub fn filter(&self, kind: ResourceKind) -> Option<&BTreeSet<String>> {
        self.get(kind).and_then(ResolvedIds::as_filter)
    }

    pub fn is_unrestricted(&self, kind: ResourceKind) -> bool {
        self.filter(kind).is_none()
    }

    /// Query parameters for downstream services
    ///
    /// Only enumerated entries are emitted, so an unrestricted kind sends no
    /// parameter at all. An empty enumerated set is sent as an empty list.
    pub fn query_params(&self) -> BTreeMap<String, Vec<String>> {
        self.entries
            .iter()
            .filter_map(|(key, ids)| {
                ids.as_filter()
                    .map(|ids| (key.clone(), ids.iter().cloned().collect()))
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
