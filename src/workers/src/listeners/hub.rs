//! Hub update listener

use async_trait::async_trait;
use ims_authz::TenantScopeCache;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error};

use crate::error::Result;
use crate::handler::MessageHandler;
use crate::message::Message;

/// Emitted by the hub service when a hub changes
pub const HUB_UPDATE_EVENT: &str = "hubs.update.event";

/// Hub event payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HubEvent {
    #[serde(default)]
    pub id: u64,
    pub tenant_id: String,
}

/// Invalidates a tenant's hub scope on hub updates
pub struct HubInvalidationListener {
    hub_scope: Arc<TenantScopeCache>,
}

impl HubInvalidationListener {
    pub fn new(hub_scope: Arc<TenantScopeCache>) -> Self {
        Self { hub_scope }
    }

    pub fn is_recognized(event: &str) -> bool {
        event == HUB_UPDATE_EVENT
    }
}

#[async_trait]
impl MessageHandler for HubInvalidationListener {
    async fn process(&self, message: &Message) -> Result<()> {
        match message.event() {
            Some(event) if Self::is_recognized(event) => {}
            other => {
                debug!("Ignoring hub message with event {:?}", other);
                return Ok(());
            }
        }

        let payload: HubEvent = match serde_json::from_slice(&message.value) {
            Ok(payload) => payload,
            Err(e) => {
                error!("Failed to decode hub update event: {}", e);
                return Ok(());
            }
        };

        self.hub_scope.invalidate(&payload.tenant_id).await?;
        debug!("Hub {} updated, invalidated tenant {}", payload.id, payload.tenant_id);
        Ok(())
    }
}
