//! `preorder-observability` — process-wide tracing/logging setup.
//!
//! Host adapters call [`init`] once at startup; library crates only emit
//! through `tracing` macros and never install subscribers themselves.

use tracing_subscriber::EnvFilter;

/// Initialize tracing with the default `info` filter.
///
/// Safe to call multiple times; subsequent calls are no-ops.
pub fn init() {
    init_with_filter("info");
}

/// Initialize tracing, using `default_filter` when `RUST_LOG` is unset.
pub fn init_with_filter(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .compact()
        .with_target(true)
        .try_init();
}
