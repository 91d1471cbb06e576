//! Captured tracing output for test runs

use tracing_subscriber::EnvFilter;

/// Route engine logs through the test harness writer.
///
/// The filter comes from `RUST_LOG` and defaults to `info`, so
/// `RUST_LOG=filemodel_core=debug cargo test` shows each cache hit, stub and
/// write next to the failing test. Only the first call in a process installs
/// a subscriber.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_test_writer()
        .compact()
        .try_init();
}
