//! Process-wide log setup.
//!
//! Everything logs through `tracing`; records emitted with the `log` facade
//! (the database layer) are bridged into the same subscriber.

use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Filter used when `RUST_LOG` is unset or unparsable.
pub const DEFAULT_FILTER: &str = "info";

/// Install the global subscriber, reading the filter from `RUST_LOG`.
///
/// Calling it again is harmless; only the first subscriber is kept.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .try_init();
}
