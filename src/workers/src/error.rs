//! Worker error types

use ims_authz::AccessError;
use thiserror::Error;

/// Worker errors
#[derive(Debug, Error)]
pub enum WorkerError {
    /// Cache invalidation failed; the message should be retried
    #[error(transparent)]
    Access(#[from] AccessError),

    /// No listener registered under this subscription name
    #[error("Unknown subscription: {0}")]
    UnknownSubscription(String),

    /// A listener is already registered under this subscription name
    #[error("Subscription already registered: {0}")]
    DuplicateSubscription(String),

    /// Worker configuration failed validation
    #[error("Invalid worker configuration: {0}")]
    Config(String),

    /// Handler failure not covered above
    #[error("Handler error: {0}")]
    Handler(String),
}

impl WorkerError {
    pub fn handler<S: Into<String>>(msg: S) -> Self {
        WorkerError::Handler(msg.into())
    }
}

/// Result type for worker operations
pub type Result<T> = std::result::Result<T, WorkerError>;
