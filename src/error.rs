// Error types module

use crate::config::ConfigError;
use crate::observability::TracingError;

/// Top-level error for hooked Redis calls
///
/// Only two things can fail a hooked call: the tracer refusing to start a
/// span during the `before` stage, or the Redis command itself. The `after`
/// stage of the duration hook never produces an error.
#[derive(Debug, thiserror::Error)]
pub enum HookError {
    /// Span start failure, forwarded verbatim from the tracer
    #[error(transparent)]
    Tracing(#[from] TracingError),

    /// Error returned by the Redis client
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Config file could not be loaded or failed validation
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Invalid connection settings (missing or malformed URL)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Connecting to Redis did not finish in time
    #[error("Timed out connecting to Redis after {0}ms")]
    ConnectTimeout(u64),
}
