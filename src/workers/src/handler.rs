//! Message handler contract

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::Result;
use crate::message::Message;

/// Type alias for a shared handler
pub type MessageHandlerRef = Arc<dyn MessageHandler>;

/// Processes messages from one subscription
///
/// Returning `Err` asks the worker to retry the message. Handlers must be
/// idempotent: delivery is at-least-once.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn process(&self, message: &Message) -> Result<()>;
}
