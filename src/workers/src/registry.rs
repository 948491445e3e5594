//! Listener registry keyed by subscription name

use ims_authz::{AccessController, ResourceKind};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

use crate::config::WorkerConfig;
use crate::error::{Result, WorkerError};
use crate::handler::MessageHandlerRef;
use crate::listeners::{HubInvalidationListener, SellerInvalidationListener};

/// Default subscription for hub events
pub const HUB_UPDATE_SUBSCRIPTION: &str = "hubUpdate";

/// Default subscription for seller events
pub const SELLER_UPDATE_SUBSCRIPTION: &str = "sellerUpdate";

/// Maps subscription names to their handlers
#[derive(Clone, Default)]
pub struct ListenerRegistry {
    listeners: BTreeMap<String, MessageHandlerRef>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        subscription: impl Into<String>,
        handler: MessageHandlerRef,
    ) -> Result<()> {
        let subscription = subscription.into();
        if self.listeners.contains_key(&subscription) {
            return Err(WorkerError::DuplicateSubscription(subscription));
        }

        info!("Registered listener for subscription {}", subscription);
        self.listeners.insert(subscription, handler);
        Ok(())
    }

    pub fn get(&self, subscription: &str) -> Option<MessageHandlerRef> {
        self.listeners.get(subscription).cloned()
    }

    pub fn subscriptions(&self) -> impl Iterator<Item = &str> {
        self.listeners.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

/// Register the hub and seller invalidation listeners against the
/// controller's scope caches, under the configured subscription names
pub fn register_invalidation_listeners(
    registry: &mut ListenerRegistry,
    config: &WorkerConfig,
    controller: &AccessController,
) -> Result<()> {
    let hub_scope = controller.scope(ResourceKind::Hub).clone();
    let seller_scope = controller.scope(ResourceKind::Seller).clone();

    registry.register(
        config.hub_update.name.clone(),
        Arc::new(HubInvalidationListener::new(hub_scope)),
    )?;
    registry.register(
        config.seller_update.name.clone(),
        Arc::new(SellerInvalidationListener::new(seller_scope)),
    )?;
    Ok(())
}
