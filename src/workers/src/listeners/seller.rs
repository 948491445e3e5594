//! Seller lifecycle listener

use async_trait::async_trait;
use ims_authz::TenantScopeCache;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error};

use crate::error::Result;
use crate::handler::MessageHandler;
use crate::message::Message;

pub const SELLER_CREATE_EVENT: &str = "seller.create.event";
pub const SELLER_UPDATE_EVENT: &str = "seller.update.event";
pub const SELLER_INACTIVE_EVENT: &str = "seller.inactive.event";

/// Seller event payload; seller tenants are numeric
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellerEvent {
    #[serde(default)]
    pub id: u64,
    pub tenant_id: u64,
}

/// Invalidates a tenant's seller scope on seller lifecycle events
///
/// Only seller creation is recognized by default. Update and inactivation
/// events can be opted into with [`SellerInvalidationListener::with_events`].
pub struct SellerInvalidationListener {
    seller_scope: Arc<TenantScopeCache>,
    recognized: HashSet<String>,
}

impl SellerInvalidationListener {
    pub fn new(seller_scope: Arc<TenantScopeCache>) -> Self {
        Self::with_events(seller_scope, [SELLER_CREATE_EVENT])
    }

    pub fn with_events<I, S>(seller_scope: Arc<TenantScopeCache>, events: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            seller_scope,
            recognized: events.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_recognized(&self, event: &str) -> bool {
        self.recognized.contains(event)
    }
}

#[async_trait]
impl MessageHandler for SellerInvalidationListener {
    async fn process(&self, message: &Message) -> Result<()> {
        match message.event() {
            Some(event) if self.is_recognized(event) => {}
            other => {
                debug!("Ignoring seller message with event {:?}", other);
                return Ok(());
            }
        }

        let payload: SellerEvent = match serde_json::from_slice(&message.value) {
            Ok(payload) => payload,
            Err(e) => {
                error!("Failed to decode seller event: {}", e);
                return Ok(());
            }
        };

        let tenant_id = payload.tenant_id.to_string();
        self.seller_scope.invalidate(&tenant_id).await?;
        debug!("Seller {} changed, invalidated tenant {}", payload.id, tenant_id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ims_authz::cache::MemoryCacheStore;
    use ims_authz::client::StaticScopeClient;
    use ims_authz::types::ResourceKind;
    use tracing_test::traced_test;

    fn seller_scope(client: &StaticScopeClient) -> Arc<TenantScopeCache> {
        Arc::new(TenantScopeCache::new(
            ResourceKind::Seller,
            Arc::new(MemoryCacheStore::new()),
            Arc::new(client.clone()),
        ))
    }

    fn seller_message(event: &str) -> Message {
        Message::new("sellers", br#"{"id": 5, "tenant_id": 42}"#.to_vec()).with_event(event)
    }

    #[tokio::test]
    async fn test_seller_create_invalidates_decimal_tenant() {
        let client = StaticScopeClient::new().with_tenant("42", ["s1"]);
        let scope = seller_scope(&client);
        let listener = SellerInvalidationListener::new(scope.clone());

        scope.get("42").await.unwrap();
        listener.process(&seller_message(SELLER_CREATE_EVENT)).await.unwrap();
        scope.get("42").await.unwrap();

        assert_eq!(client.calls(), 2);
    }

    #[tokio::test]
    async fn test_update_and_inactive_not_recognized_by_default() {
        let client = StaticScopeClient::new().with_tenant("42", ["s1"]);
        let scope = seller_scope(&client);
        let listener = SellerInvalidationListener::new(scope.clone());

        scope.get("42").await.unwrap();
        listener.process(&seller_message(SELLER_UPDATE_EVENT)).await.unwrap();
        listener.process(&seller_message(SELLER_INACTIVE_EVENT)).await.unwrap();
        scope.get("42").await.unwrap();

        assert_eq!(client.calls(), 1);
    }

    #[tokio::test]
    async fn test_opt_in_events() {
        let client = StaticScopeClient::new().with_tenant("42", ["s1"]);
        let scope = seller_scope(&client);
        let listener = SellerInvalidationListener::with_events(
            scope.clone(),
            [SELLER_CREATE_EVENT, SELLER_UPDATE_EVENT, SELLER_INACTIVE_EVENT],
        );

        assert!(listener.is_recognized(SELLER_INACTIVE_EVENT));
        listener.process(&seller_message(SELLER_UPDATE_EVENT)).await.unwrap();
        assert_eq!(scope.stats().invalidations, 1);
    }

    #[tokio::test]
    #[traced_test]
    async fn test_malformed_payload_is_logged_and_swallowed() {
        let client = StaticScopeClient::new();
        let scope = seller_scope(&client);
        let listener = SellerInvalidationListener::new(scope.clone());

        let message = Message::new("sellers", b"not json".to_vec()).with_event(SELLER_CREATE_EVENT);
        listener.process(&message).await.unwrap();

        assert!(logs_contain("Failed to decode seller event"));
        assert_eq!(scope.stats().invalidations, 0);
    }
}
