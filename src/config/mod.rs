// Configuration module

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::observability::threshold::{global_slow_threshold, SlowThreshold};
use crate::observability::ObservabilityConfig;

pub mod redis;

pub use self::redis::RedisConfig;

/// Hook configuration loaded from YAML
///
/// ```yaml
/// redis:
///   redis_url: "redis://localhost:6379"
/// observability:
///   slow_call:
///     threshold_ms: 100
///   tracing:
///     enabled: false
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HookConfig {
    #[serde(default)]
    pub redis: RedisConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Errors raised while loading or validating a `HookConfig`
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Environment variable '{0}' is referenced but not set")]
    MissingEnvVar(String),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Validation(String),
}

impl HookConfig {
    /// Parse YAML after replacing `${VAR_NAME}` with environment values
    pub fn from_yaml_with_env(yaml: &str) -> Result<Self, ConfigError> {
        let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
            .map_err(|e| ConfigError::Validation(e.to_string()))?;

        // Every referenced variable must exist before anything is substituted
        for caps in re.captures_iter(yaml) {
            let var_name = &caps[1];
            if std::env::var(var_name).is_err() {
                return Err(ConfigError::MissingEnvVar(var_name.to_string()));
            }
        }

        let substituted = re.replace_all(yaml, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_default()
        });

        Ok(serde_yaml::from_str(&substituted)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let yaml = std::fs::read_to_string(path)?;
        Self::from_yaml_with_env(&yaml)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.observability.slow_call.threshold_ms == 0 {
            return Err(ConfigError::Validation(
                "slow_call.threshold_ms must be greater than 0".to_string(),
            ));
        }

        self.redis.validate().map_err(ConfigError::Validation)?;
        self.observability
            .tracing
            .validate()
            .map_err(ConfigError::Validation)?;

        Ok(())
    }

    /// Configured slow threshold
    pub fn slow_threshold(&self) -> Duration {
        self.observability.slow_call.threshold()
    }

    /// Store the configured threshold into the process-wide setting
    pub fn apply(&self) {
        self.apply_to(global_slow_threshold());
    }

    /// Store the configured threshold into `setting`
    pub fn apply_to(&self, setting: &SlowThreshold) {
        let threshold = self.slow_threshold();
        setting.store(threshold);
        tracing::info!(
            threshold_ms = threshold.as_millis() as u64,
            "Slow call threshold updated"
        );
    }
}
