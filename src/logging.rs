//! Diagnostic logging setup for the binary.
//!
//! Library code only emits `tracing` events; the binary installs one fmt
//! subscriber writing to stderr so stdout stays clean for command output.

use crate::config::LogLevel;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Level after applying `--verbose` occurrences on top of the configured one.
pub fn effective_level(configured: LogLevel, verbose: u8) -> LogLevel {
    (0..verbose).fold(configured, |level, _| level.louder())
}

/// Install the stderr subscriber.
///
/// Returns `false` when a global subscriber was already installed.
pub fn init(level: LogLevel) -> bool {
    let filter = EnvFilter::new(format!("exforge={}", level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init()
        .is_ok()
}
