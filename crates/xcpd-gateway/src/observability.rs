//! Tracing setup for the gateway.
//!
//! The level filter sits behind a reload layer so `[logging].level` can be
//! changed while the gateway runs. `RUST_LOG`, when set, takes precedence at
//! startup.

use std::sync::OnceLock;

use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*, reload};

use crate::config::LoggingConfig;

static FILTER_HANDLE: OnceLock<reload::Handle<EnvFilter, Registry>> = OnceLock::new();

/// Installs the global subscriber described by `logging`.
///
/// Returns `false` when another subscriber is already installed.
pub fn init_from_config(logging: &LoggingConfig) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));
    let (filter, handle) = reload::Layer::new(filter);

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_thread_names(true))
        .try_init()
        .is_ok();
    if installed {
        let _ = FILTER_HANDLE.set(handle);
    }
    installed
}

/// Replaces the active level filter.
///
/// Returns `false` before [`init_from_config`] has installed a subscriber or
/// when `level` is not a valid filter directive.
pub fn apply_logging_level(level: &str) -> bool {
    let Some(handle) = FILTER_HANDLE.get() else {
        return false;
    };
    match EnvFilter::try_new(level) {
        Ok(filter) => handle.reload(filter).is_ok(),
        Err(e) => {
            tracing::warn!(level, error = %e, "ignoring invalid logging level");
            false
        }
    }
}
