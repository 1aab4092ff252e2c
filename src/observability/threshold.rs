// Slow threshold setting
//
// Process-wide duration read on every `after` stage and written by
// configuration or admin code. Stored as nanoseconds in an atomic so the hot
// path never takes a lock.

use crate::constants::DEFAULT_SLOW_THRESHOLD;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

/// Atomically readable and writable duration
#[derive(Debug)]
pub struct SlowThreshold {
    nanos: AtomicU64,
}

impl SlowThreshold {
    pub const fn new(threshold: Duration) -> Self {
        Self {
            nanos: AtomicU64::new(to_nanos(threshold)),
        }
    }

    /// Current threshold
    pub fn load(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::Relaxed))
    }

    /// Replace the threshold; applies to every `after` stage that has not
    /// loaded it yet
    pub fn store(&self, threshold: Duration) {
        self.nanos.store(to_nanos(threshold), Ordering::Relaxed);
    }

    /// Restore the default threshold
    pub fn reset(&self) {
        self.store(DEFAULT_SLOW_THRESHOLD);
    }
}

impl Default for SlowThreshold {
    fn default() -> Self {
        Self::new(DEFAULT_SLOW_THRESHOLD)
    }
}

// Durations past u64::MAX nanoseconds (~584 years) saturate.
const fn to_nanos(threshold: Duration) -> u64 {
    let nanos = threshold.as_nanos();
    if nanos > u64::MAX as u128 {
        u64::MAX
    } else {
        nanos as u64
    }
}

static SLOW_THRESHOLD: OnceLock<Arc<SlowThreshold>> = OnceLock::new();

/// The process-wide threshold shared by hooks created with the default setting
pub fn global_slow_threshold() -> &'static Arc<SlowThreshold> {
    SLOW_THRESHOLD.get_or_init(|| Arc::new(SlowThreshold::default()))
}

/// Current process-wide slow threshold
pub fn slow_threshold() -> Duration {
    global_slow_threshold().load()
}

/// Set the process-wide slow threshold
pub fn set_slow_threshold(threshold: Duration) {
    global_slow_threshold().store(threshold);
}
