//! Request-level access guard for inter-service calls

use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

use super::AccessController;
use crate::error::AccessError;
use crate::types::{dedup_ids, CallerIdentity};

/// Request payload that references hubs and/or sellers
pub trait AccessControlled: Send + Sync {
    fn hub_ids(&self) -> Vec<String> {
        Vec::new()
    }

    fn seller_ids(&self) -> Vec<String> {
        Vec::new()
    }
}

/// Body of an incoming request, as seen by the guard
#[derive(Clone, Copy)]
pub enum RequestBody<'a> {
    /// No body
    Empty,
    /// Body that does not reference access-controlled resources
    Opaque,
    /// Body exposing its hub and seller IDs
    Controlled(&'a dyn AccessControlled),
}

/// Reasons a request is rejected by the guard
#[derive(Debug, Error)]
pub enum GuardError {
    /// Enforcement is on and the body cannot be checked
    #[error("Invalid request")]
    InvalidRequest,

    #[error("Hub not valid")]
    HubNotValid,

    #[error("Seller not valid")]
    SellerNotValid,

    /// Caller context missing or a downstream failure
    #[error(transparent)]
    Access(#[from] AccessError),
}

/// Checks request bodies against the caller's tenant scope before dispatch
#[derive(Clone)]
pub struct ScopeGuard {
    controller: Arc<AccessController>,
    enforce: bool,
}

impl ScopeGuard {
    /// `enforce` rejects bodies that do not expose their IDs
    pub fn new(controller: Arc<AccessController>, enforce: bool) -> Self {
        Self { controller, enforce }
    }

    pub fn enforce(&self) -> bool {
        self.enforce
    }

    /// Validate a request body. Hubs are checked before sellers and the first
    /// failing check decides the error.
    pub async fn check_request(
        &self,
        identity: Option<&CallerIdentity>,
        tenant_id: Option<&str>,
        body: RequestBody<'_>,
    ) -> Result<(), GuardError> {
        let payload = match body {
            RequestBody::Empty => return Ok(()),
            RequestBody::Opaque if self.enforce => {
                warn!("Rejecting request without access-controlled body");
                return Err(GuardError::InvalidRequest);
            }
            RequestBody::Opaque => return Ok(()),
            RequestBody::Controlled(payload) => payload,
        };

        let identity = identity.ok_or(AccessError::MissingIdentity)?;
        let tenant_id = tenant_id
            .filter(|tenant| !tenant.is_empty())
            .ok_or(AccessError::MissingTenant)?;

        let hub_ids = dedup_ids(payload.hub_ids());
        if !self
            .controller
            .validate_hub_ids(identity, tenant_id, &hub_ids)
            .await?
        {
            return Err(GuardError::HubNotValid);
        }

        let seller_ids = dedup_ids(payload.seller_ids());
        if !self
            .controller
            .validate_seller_ids(identity, tenant_id, &seller_ids)
            .await?
        {
            return Err(GuardError::SellerNotValid);
        }

        Ok(())
    }
}
