// Log capture for tests
//
// Compiled into the unit tests through `lib.rs` and into the integration
// tests through a `#[path]` module, since `#[cfg(test)]` items of the library
// are not visible from `tests/`. Each crate uses a different subset.
#![allow(dead_code)]

use parking_lot::Mutex;
use std::io;
use std::sync::Arc;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::EnvFilter;

/// In-memory sink for a scoped fmt subscriber
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock()).into_owned()
    }

    /// Lines carrying the slow-call marker
    pub fn slow_lines(&self) -> Vec<String> {
        self.contents()
            .lines()
            .filter(|line| line.contains("slowcall"))
            .map(str::to_string)
            .collect()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn subscriber(buffer: &LogBuffer) -> impl tracing::Subscriber + Send + Sync {
    let writer = buffer.clone();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("redis_duration_hook=trace"))
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .without_time()
        .finish()
}

/// Run `f` with a thread-local subscriber and keep what this crate logged
pub fn capture<R>(f: impl FnOnce() -> R) -> (R, LogBuffer) {
    let buffer = LogBuffer::default();
    let result = tracing::subscriber::with_default(subscriber(&buffer), f);
    (result, buffer)
}

/// Like [`capture`], returning the output as text
pub fn capture_logs<R>(f: impl FnOnce() -> R) -> (R, String) {
    let (result, buffer) = capture(f);
    (result, buffer.contents())
}

/// Install a capturing subscriber on this thread until the guard drops
///
/// For async tests on the current-thread runtime.
pub fn install() -> (DefaultGuard, LogBuffer) {
    let buffer = LogBuffer::default();
    let guard = tracing::subscriber::set_default(subscriber(&buffer));
    (guard, buffer)
}
