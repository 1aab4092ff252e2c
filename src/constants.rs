// Constants module - centralized default values for the hook
//
// Defaults live here so the config layer, the hook and the tests agree on
// the same numbers.

use std::time::Duration;

// =============================================================================
// Hook defaults
// =============================================================================

/// Span name used for every command and pipeline, independent of the command
pub const PROTOCOL_NAME: &str = "redis";

/// Marker token at the start of every slow-command warning
pub const SLOW_MARKER: &str = "slowcall";

/// Default slow threshold in milliseconds
pub const DEFAULT_SLOW_THRESHOLD_MS: u64 = 100;

/// Default slow threshold
pub const DEFAULT_SLOW_THRESHOLD: Duration = Duration::from_millis(DEFAULT_SLOW_THRESHOLD_MS);

// =============================================================================
// Redis defaults
// =============================================================================

/// Default connection timeout in milliseconds
pub const DEFAULT_CONNECTION_TIMEOUT_MS: u64 = 5000;

// =============================================================================
// Tracing defaults
// =============================================================================

/// Default service name reported to the tracing backend
pub const DEFAULT_SERVICE_NAME: &str = "redis-duration-hook";

/// Default sampling ratio (sample everything)
pub const DEFAULT_SAMPLING_RATIO: f64 = 1.0;
