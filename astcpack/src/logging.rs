//! Logging setup for binaries and hosts.
//!
//! The library only emits `tracing` events; installing a subscriber is left
//! to whoever owns the process. [`init`] installs a formatter writing to
//! stderr, filtered by `RUST_LOG` when set.

use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is not set.
pub const DEFAULT_FILTER: &str = "astcpack=info";

/// Filter used when `RUST_LOG` is not set and verbose output is requested.
pub const VERBOSE_FILTER: &str = "astcpack=debug";

/// A global subscriber could not be installed.
#[derive(Debug, Error)]
#[error("Failed to initialize logging: {0}")]
pub struct LoggingError(String);

/// Filter directive to fall back on.
pub fn default_directive(verbose: bool) -> &'static str {
    if verbose {
        VERBOSE_FILTER
    } else {
        DEFAULT_FILTER
    }
}

/// Install the global stderr subscriber.
pub fn init(verbose: bool) -> Result<(), LoggingError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|e| LoggingError(e.to_string()))
}
