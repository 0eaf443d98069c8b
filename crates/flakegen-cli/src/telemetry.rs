//! Logging setup for the `flakegen` binary.
//!
//! - Filtering comes from `RUST_LOG`, defaulting to `info`.
//! - Output goes to stderr so stdout carries nothing but IDs.
//! - Library events (clock regressions, node-id derivation) flow through the
//!   same subscriber.

use tracing_subscriber::{EnvFilter, fmt};

/// Installs the global `tracing` subscriber.
///
/// A subscriber that is already installed wins; the error is ignored.
pub fn init_tracing() {
    let _ = fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
