//! Worker configuration

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::registry::{HUB_UPDATE_SUBSCRIPTION, SELLER_UPDATE_SUBSCRIPTION};

/// Invalidation worker configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerConfig {
    #[serde(default = "default_hub_update")]
    pub hub_update: SubscriptionSection,

    #[serde(default = "default_seller_update")]
    pub seller_update: SubscriptionSection,

    #[serde(default)]
    pub retry: RetrySection,
}

/// One message subscription
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubscriptionSection {
    /// Name the listener is registered under
    pub name: String,

    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Buffered messages before the transport is back-pressured
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

impl SubscriptionSection {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            enabled: true,
            channel_capacity: default_channel_capacity(),
        }
    }
}

/// Retry policy for failed messages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySection {
    /// Attempts per message, including the first
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    /// Base delay; attempt `n` waits `n * backoff_ms`
    #[serde(default = "default_backoff_ms")]
    pub backoff_ms: u64,
}

impl RetrySection {
    pub fn backoff(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.backoff_ms.saturating_mul(attempt as u64))
    }
}

impl Default for RetrySection {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_ms: default_backoff_ms(),
        }
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            hub_update: default_hub_update(),
            seller_update: default_seller_update(),
            retry: RetrySection::default(),
        }
    }
}

fn default_true() -> bool { true }
fn default_channel_capacity() -> usize { 1024 }
fn default_max_attempts() -> u32 { 3 }
fn default_backoff_ms() -> u64 { 200 }

fn default_hub_update() -> SubscriptionSection {
    SubscriptionSection::new(HUB_UPDATE_SUBSCRIPTION)
}

fn default_seller_update() -> SubscriptionSection {
    SubscriptionSection::new(SELLER_UPDATE_SUBSCRIPTION)
}

impl WorkerConfig {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())
            .context("Failed to read worker configuration")?;

        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: WorkerConfig = toml::from_str(contents)
            .context("Failed to parse worker configuration")?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.retry.max_attempts == 0 {
            anyhow::bail!("retry.max_attempts must be at least 1");
        }

        for subscription in self.subscriptions() {
            if subscription.name.is_empty() {
                anyhow::bail!("Subscription name must not be empty");
            }
            if subscription.channel_capacity == 0 {
                anyhow::bail!("{}: channel_capacity must be greater than zero", subscription.name);
            }
        }

        if self.hub_update.name == self.seller_update.name {
            anyhow::bail!("Subscription names must be distinct");
        }

        Ok(())
    }

    pub fn subscriptions(&self) -> [&SubscriptionSection; 2] {
        [&self.hub_update, &self.seller_update]
    }

    /// Settings for the subscription called `name`
    pub fn subscription(&self, name: &str) -> Option<&SubscriptionSection> {
        self.subscriptions().into_iter().find(|s| s.name == name)
    }
}
