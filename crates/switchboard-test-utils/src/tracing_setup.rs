//! Tracing for tests.
//!
//! [`init_test_tracing`] routes events to the libtest writer (filtered by
//! `RUST_LOG`, default `warn`). [`capture_logs`] installs a thread-local
//! [`LogCollector`] so a test can assert on what was logged.

use switchboard_core::{LogCollector, LogReader};
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Install the global test subscriber. Later calls are no-ops.
pub fn init_test_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init();
}

/// Capture events on the current thread until the guard drops.
///
/// Only sees events from the calling thread, so use it with
/// `#[tokio::test]` (current-thread runtime).
pub fn capture_logs(capacity: usize) -> (LogReader, DefaultGuard) {
    let collector = LogCollector::new(capacity);
    let reader = collector.reader();
    let guard = tracing_subscriber::registry().with(collector).set_default();
    (reader, guard)
}
