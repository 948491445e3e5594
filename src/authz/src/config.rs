//! Access control configuration

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::cache::Codec;

/// Access control configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessConfig {
    #[serde(default)]
    pub cache: CacheSection,

    /// Shared Redis store; the in-process store is used when absent
    #[serde(default)]
    pub redis: Option<RedisSection>,

    /// Hub service client
    pub hub_client: ClientSection,

    /// Seller service client
    pub seller_client: ClientSection,
}

/// Tenant scope cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSection {
    /// Entry lifetime in seconds
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,

    /// Key prefix shared by every entry this service writes
    #[serde(default)]
    pub namespace: Option<String>,

    #[serde(default)]
    pub codec: Codec,

    /// Collapse concurrent misses for one tenant into a single fetch
    #[serde(default)]
    pub single_flight: bool,
}

impl CacheSection {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for CacheSection {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            namespace: None,
            codec: Codec::default(),
            single_flight: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisSection {
    /// e.g. `redis://127.0.0.1:6379/0`
    pub url: String,
}

/// HTTP scope client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientSection {
    pub base_url: String,

    /// Request path; `{tenant_id}` is substituted
    pub path: String,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl ClientSection {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn default_ttl_secs() -> u64 { 24 * 60 * 60 }
fn default_timeout_ms() -> u64 { 5000 }

impl AccessConfig {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())
            .context("Failed to read access control configuration")?;

        Self::from_toml(&contents)
    }

    /// Parse configuration from TOML text
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: AccessConfig = toml::from_str(contents)
            .context("Failed to parse access control configuration")?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.cache.ttl_secs == 0 {
            anyhow::bail!("Cache TTL must be greater than zero");
        }

        let clients = [
            ("hub_client", &self.hub_client),
            ("seller_client", &self.seller_client),
        ];
        for (name, client) in clients {
            if client.base_url.is_empty() {
                anyhow::bail!("{}: base_url must be set", name);
            }
            if !client.path.contains("{tenant_id}") {
                anyhow::bail!("{}: path must contain {{tenant_id}}", name);
            }
            if client.timeout_ms == 0 {
                anyhow::bail!("{}: timeout_ms must be greater than zero", name);
            }
        }

        if let Some(redis) = &self.redis {
            if !redis.url.starts_with("redis://") && !redis.url.starts_with("rediss://") {
                anyhow::bail!("Redis url must use the redis:// or rediss:// scheme");
            }
        }

        Ok(())
    }
}
