//! Error types for tenant-scoped access control

use thiserror::Error;

use crate::rules::RuleName;

/// Cache store failures (a miss is not an error)
#[derive(Debug, Error)]
pub enum CacheStoreError {
    /// Backend unreachable or command failed
    #[error("Cache backend error: {0}")]
    Backend(String),

    /// Value could not be encoded or decoded
    #[error("Cache serialization error: {0}")]
    Serialization(String),
}

impl CacheStoreError {
    pub fn backend<S: Into<String>>(msg: S) -> Self {
        CacheStoreError::Backend(msg.into())
    }

    pub fn serialization<S: Into<String>>(msg: S) -> Self {
        CacheStoreError::Serialization(msg.into())
    }
}

/// Failures talking to the service that owns a tenant's resources
#[derive(Debug, Error)]
pub enum ScopeClientError {
    /// Transport-level failure (connect, timeout, TLS)
    #[error("Scope service unavailable: {0}")]
    Unavailable(String),

    /// Downstream answered with a non-success status
    #[error("Scope service returned {status}: {message}")]
    Status { status: u16, message: String },

    /// Downstream body did not have the expected shape
    #[error("Scope service response invalid: {0}")]
    Decode(String),

    /// Base URL or tenant ID cannot form a request URL
    #[error("Scope service URL invalid: {0}")]
    InvalidUrl(String),
}

impl ScopeClientError {
    pub fn unavailable<S: Into<String>>(msg: S) -> Self {
        ScopeClientError::Unavailable(msg.into())
    }

    pub fn decode<S: Into<String>>(msg: S) -> Self {
        ScopeClientError::Decode(msg.into())
    }

    pub fn invalid_url<S: Into<String>>(msg: S) -> Self {
        ScopeClientError::InvalidUrl(msg.into())
    }
}

/// Rule evaluation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuleError {
    /// None of the requested rule names exist on the caller
    #[error("Scope rule not found: {0}")]
    RuleNotFound(RuleName),

    /// Evaluator could not reach a decision
    #[error("Rule evaluation failed: {0}")]
    Evaluation(String),
}

/// Access control errors
///
/// A denial is never an error: it is reported as `Ok(false)`.
#[derive(Debug, Error)]
pub enum AccessError {
    /// Cache store failure
    #[error(transparent)]
    Store(#[from] CacheStoreError),

    /// Scope service failure
    #[error(transparent)]
    ScopeClient(#[from] ScopeClientError),

    /// Rule evaluation failure
    #[error(transparent)]
    Rule(#[from] RuleError),

    /// No caller identity was supplied
    #[error("User details not found")]
    MissingIdentity,

    /// No tenant was supplied
    #[error("Tenant not found")]
    MissingTenant,
}

impl AccessError {
    /// True when the caller context was incomplete (as opposed to a downstream
    /// failure). Callers map this to a precondition failure, not a denial.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            AccessError::MissingIdentity
                | AccessError::MissingTenant
                | AccessError::Rule(RuleError::RuleNotFound(_))
        )
    }

    /// True when a downstream dependency (store or scope service) failed
    pub fn is_downstream(&self) -> bool {
        matches!(self, AccessError::Store(_) | AccessError::ScopeClient(_))
    }
}

/// Result type for access control operations
pub type Result<T> = std::result::Result<T, AccessError>;
