//! Log setup for the `onos-sync` daemon.
//!
//! Logging starts at `info` before the config file is read, then switches to
//! `[logging] level` from `onos-sync.toml` (or `ONOS_SYNC__LOGGING__LEVEL`).
//! A `RUST_LOG` in the environment overrides both.

use std::sync::OnceLock;

use tracing_subscriber::filter::ParseError;
use tracing_subscriber::{EnvFilter, Registry, fmt, prelude::*, reload};

/// HTTP client internals stay at `warn` whatever level the synchronizer runs at.
const QUIET_DEPENDENCIES: &[&str] = &["hyper=warn", "hyper_util=warn", "reqwest=warn", "h2=warn"];

static FILTER_HANDLE: OnceLock<reload::Handle<EnvFilter, Registry>> = OnceLock::new();

/// Filter for `level`, e.g. `debug` or `onos_sync_reconciler=trace,info`.
pub fn daemon_filter(level: &str) -> Result<EnvFilter, ParseError> {
    let mut directives = vec![level.trim()];
    directives.extend_from_slice(QUIET_DEPENDENCIES);
    EnvFilter::try_new(directives.join(","))
}

fn rust_log_filter() -> Option<EnvFilter> {
    std::env::var_os("RUST_LOG")?;
    EnvFilter::try_from_default_env().ok()
}

pub fn init_tracing() {
    let filter = rust_log_filter()
        .or_else(|| daemon_filter("info").ok())
        .unwrap_or_else(|| EnvFilter::new("info"));

    let (filter, handle) = reload::Layer::new(filter);
    let _ = FILTER_HANDLE.set(handle);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .try_init();
}

/// Switches to the configured level. Keeps the current filter when
/// `RUST_LOG` is set or `level` does not parse.
pub fn apply_logging_level(level: &str) {
    if std::env::var_os("RUST_LOG").is_some() {
        return;
    }
    let filter = match daemon_filter(level) {
        Ok(filter) => filter,
        Err(e) => {
            tracing::warn!(level, error = %e, "Invalid logging level, keeping the current one");
            return;
        }
    };
    if let Some(handle) = FILTER_HANDLE.get() {
        if handle.reload(filter).is_err() {
            tracing::warn!(level, "Log filter could not be reloaded");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_daemon_filter_keeps_http_internals_quiet() {
        let filter = daemon_filter("debug").unwrap().to_string();
        assert!(filter.contains("debug"));
        assert!(filter.contains("hyper=warn"));
        assert!(filter.contains("reqwest=warn"));
    }

    #[test]
    fn test_daemon_filter_accepts_per_crate_directives() {
        let filter = daemon_filter(" onos_sync_reconciler=trace,info ").unwrap().to_string();
        assert!(filter.contains("onos_sync_reconciler=trace"));
    }

    #[test]
    fn test_daemon_filter_rejects_garbage() {
        assert!(daemon_filter("onos_sync_reconciler=loud").is_err());
    }
}
