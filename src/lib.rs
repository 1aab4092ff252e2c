// Redis Duration Hook Library
//
// Times every Redis command and pipeline, wraps each call in a span, and
// logs a `slowcall` warning for calls that reach the slow threshold.

pub mod config;
pub mod constants;
pub mod context;
pub mod error;
pub mod hook;
pub mod logging;
pub mod observability;

#[cfg(test)]
mod test_support;

pub use config::{ConfigError, HookConfig, RedisConfig};
pub use context::{Context, ContextKey};
pub use error::HookError;
pub use hook::command::Command;
pub use hook::{DurationHook, HookedConnection, ProcessHook};
pub use observability::{set_slow_threshold, slow_threshold};
