//! Tracing setup for host applications and tests.
//!
//! The library itself only emits `tracing` events; hosts decide where
//! they go. This module provides a minimal subscriber initializer so
//! binaries and tests don't have to wire one up by hand.

use tracing_subscriber::EnvFilter;

/// Initialize a global fmt subscriber honoring `RUST_LOG`.
///
/// Safe to call more than once; later calls are no-ops.
pub fn init() {
    init_with_filter("info");
}

/// Initialize with an explicit default filter, still overridable via
/// the `RUST_LOG` environment variable.
pub fn init_with_filter(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}
