//! Core access control types

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::rules::{RuleGroup, RuleName};

/// Tenant identifier
pub type TenantId = String;

/// Well-known request scope key for resolved hub IDs
pub const HUB_IDS_KEY: &str = "hub_ids";

/// Well-known request scope key for resolved seller IDs
pub const SELLER_IDS_KEY: &str = "seller_ids";

/// Kind of tenant-owned resource guarded by access control
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Hub,
    Seller,
}

impl ResourceKind {
    /// Prefix of the cache key holding a tenant's scope for this kind
    pub fn cache_key_prefix(self) -> &'static str {
        match self {
            ResourceKind::Hub => "tenant_hubs_",
            ResourceKind::Seller => "tenant_sellers_",
        }
    }

    /// Attribute name handed to the rule evaluator
    pub fn attribute_key(self) -> &'static str {
        match self {
            ResourceKind::Hub => "hub_id",
            ResourceKind::Seller => "seller_id",
        }
    }

    /// Rule that carries the caller's grant for this kind
    pub fn rule_name(self) -> RuleName {
        match self {
            ResourceKind::Hub => RuleName::UserHub,
            ResourceKind::Seller => RuleName::Seller,
        }
    }

    /// Key under which the resolved IDs are exposed to downstream queries
    pub fn scope_key(self) -> &'static str {
        match self {
            ResourceKind::Hub => HUB_IDS_KEY,
            ResourceKind::Seller => SELLER_IDS_KEY,
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceKind::Hub => write!(f, "hub"),
            ResourceKind::Seller => write!(f, "seller"),
        }
    }
}

/// Effective set of resource IDs a caller may touch
///
/// `Unrestricted` means "no filter". It is deliberately distinct from an empty
/// `Enumerated` set, which means "nothing".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResolvedIds {
    Unrestricted,
    Enumerated(BTreeSet<String>),
}

impl ResolvedIds {
    /// Build an enumerated set from any iterator of IDs
    pub fn enumerated<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ResolvedIds::Enumerated(ids.into_iter().map(Into::into).collect())
    }

    pub fn is_unrestricted(&self) -> bool {
        matches!(self, ResolvedIds::Unrestricted)
    }

    /// Whether `id` falls inside this set
    pub fn allows(&self, id: &str) -> bool {
        match self {
            ResolvedIds::Unrestricted => true,
            ResolvedIds::Enumerated(ids) => ids.contains(id),
        }
    }

    /// IDs to filter on, or `None` when no filter applies
    pub fn as_filter(&self) -> Option<&BTreeSet<String>> {
        match self {
            ResolvedIds::Unrestricted => None,
            ResolvedIds::Enumerated(ids) => Some(ids),
        }
    }

    /// Narrow this grant to the IDs a caller explicitly asked for.
    ///
    /// An unrestricted grant keeps the requested IDs verbatim; an enumerated
    /// grant keeps only the requested IDs it contains.
    pub fn restrict_to(&self, requested: &[String]) -> ResolvedIds {
        match self {
            ResolvedIds::Unrestricted => ResolvedIds::enumerated(requested.iter().cloned()),
            ResolvedIds::Enumerated(granted) => ResolvedIds::Enumerated(
                requested
                    .iter()
                    .filter(|id| granted.contains(id.as_str()))
                    .cloned()
                    .collect(),
            ),
        }
    }
}

/// Authenticated caller, as produced by the upstream identity resolver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallerIdentity {
    /// User identifier
    pub user_id: String,

    /// Tenant the caller acts for
    pub tenant_id: TenantId,

    /// Caller's entitlements
    #[serde(default)]
    pub rule_group: RuleGroup,
}

impl CallerIdentity {
    pub fn new(
        user_id: impl Into<String>,
        tenant_id: impl Into<TenantId>,
        rule_group: RuleGroup,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            tenant_id: tenant_id.into(),
            rule_group,
        }
    }
}

/// Remove duplicate IDs, keeping first occurrences in order
pub fn dedup_ids<I, S>(ids: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut seen = std::collections::HashSet::new();
    ids.into_iter()
        .map(Into::into)
        .filter(|id| seen.insert(id.clone()))
        .collect()
}
