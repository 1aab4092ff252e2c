// Redis connection configuration

use crate::constants::DEFAULT_CONNECTION_TIMEOUT_MS;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Connection settings for `HookedConnection::connect`
///
/// The database is selected through the URL path (`redis://host:6379/2`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    /// Redis connection URL (e.g., "redis://localhost:6379")
    #[serde(default)]
    pub redis_url: Option<String>,

    /// Connection timeout in milliseconds (default: 5000 = 5 seconds)
    #[serde(default = "default_connection_timeout_ms")]
    pub connection_timeout_ms: u64,
}

impl RedisConfig {
    pub fn connection_timeout(&self) -> Duration {
        Duration::from_millis(self.connection_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), String> {
        if let Some(url) = &self.redis_url {
            if !(url.starts_with("redis://")
                || url.starts_with("rediss://")
                || url.starts_with("unix://")
                || url.starts_with("redis+unix://"))
            {
                return Err(format!("redis_url '{}' is not a Redis URL", url));
            }
        }

        if self.connection_timeout_ms == 0 {
            return Err("connection_timeout_ms must be greater than 0".to_string());
        }

        Ok(())
    }
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            redis_url: None,
            connection_timeout_ms: default_connection_timeout_ms(),
        }
    }
}

fn default_connection_timeout_ms() -> u64 {
    DEFAULT_CONNECTION_TIMEOUT_MS
}
