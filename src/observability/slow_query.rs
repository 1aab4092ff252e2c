//! Slow Call Logging Module
//!
//! Emits one warning per Redis command (or pipeline) whose measured duration
//! reaches the slow threshold. The line is greppable by its `slowcall` marker
//! and carries the duration, the rendered command(s) and, when the call was
//! traced, the trace and span identifiers.
//!
//! # Example output
//!
//! ```text
//! WARN redis_duration_hook::observability::slow_query: slowcall on executing duration=101.2ms duration_ms=101 threshold_ms=100 command=SET foo bar trace=4bf92f3577b34da6a3ce929d0e0e4736 span=00f067aa0ba902b7
//! ```

use crate::constants::SLOW_MARKER;
use crate::observability::span::CommandSpan;
use crate::observability::threshold::{global_slow_threshold, SlowThreshold};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Slow call logger bound to a threshold setting
#[derive(Debug, Clone)]
pub struct SlowCallLogger {
    threshold: Arc<SlowThreshold>,
}

impl SlowCallLogger {
    /// Create a logger reading `threshold` on every check
    pub fn new(threshold: Arc<SlowThreshold>) -> Self {
        Self { threshold }
    }

    /// Logger reading the process-wide threshold
    pub fn global() -> Self {
        Self::new(Arc::clone(global_slow_threshold()))
    }

    /// Get the current threshold
    pub fn threshold(&self) -> Duration {
        self.threshold.load()
    }

    /// Log the call if `elapsed` reaches the threshold
    ///
    /// The threshold is loaded exactly once per call. `command` is only
    /// formatted on the slow path. Returns whether a line was emitted.
    pub fn log_if_slow(
        &self,
        elapsed: Duration,
        command: &dyn fmt::Display,
        span: Option<&dyn CommandSpan>,
    ) -> bool {
        let threshold = self.threshold.load();
        if elapsed < threshold {
            return false;
        }

        log_slow_call(elapsed, threshold, command, span);
        true
    }
}

impl Default for SlowCallLogger {
    fn default() -> Self {
        Self::global()
    }
}

fn log_slow_call(
    elapsed: Duration,
    threshold: Duration,
    command: &dyn fmt::Display,
    span: Option<&dyn CommandSpan>,
) {
    let duration_ms = elapsed.as_millis() as u64;
    let threshold_ms = threshold.as_millis() as u64;

    match span.map(|span| span.ids()) {
        Some((trace_id, span_id)) => {
            tracing::warn!(
                duration = ?elapsed,
                duration_ms,
                threshold_ms,
                command = %command,
                trace = %trace_id,
                span = %span_id,
                "{} on executing",
                SLOW_MARKER
            );
        }
        None => {
            tracing::warn!(
                duration = ?elapsed,
                duration_ms,
                threshold_ms,
                command = %command,
                "{} on executing",
                SLOW_MARKER
            );
        }
    }
}
