//! # IMS Scope Invalidation Workers
//!
//! Background listeners that keep the tenant scope caches fresh. Hub and
//! seller services publish domain events; each recognized event drops the
//! affected tenant's cached scope so the next access check refetches it.
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use ims_authz::{AccessConfig, AccessController};
//! use ims_authz::rules::ConditionEvaluator;
//! use ims_workers::{
//!     register_invalidation_listeners, ListenerRegistry, WorkerConfig, WorkerServer,
//! };
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let access = AccessConfig::load("access.toml")?;
//!     let evaluator = Arc::new(ConditionEvaluator::new());
//!     let controller = AccessController::from_config(&access, evaluator).await?;
//!
//!     let config = WorkerConfig::load("workers.toml")?;
//!     let mut registry = ListenerRegistry::new();
//!     register_invalidation_listeners(&mut registry, &config, &controller)?;
//!
//!     let mut server = WorkerServer::new(registry, config)?;
//!     let _senders = server.start_all()?;
//!     // hand the senders to the message transport ...
//!
//!     server.shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod handler;
pub mod listeners;
pub mod message;
pub mod registry;
pub mod server;

pub use config::WorkerConfig;
pub use error::{Result, WorkerError};
pub use handler::{MessageHandler, MessageHandlerRef};
pub use message::{Message, EVENT_HEADER};
pub use registry::{register_invalidation_listeners, ListenerRegistry};
pub use server::{WorkerServer, WorkerStats};
