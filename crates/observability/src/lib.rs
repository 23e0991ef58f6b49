//! Tracing/logging setup shared by the platform's binaries.

use tracing_subscriber::EnvFilter;

/// Default directives when `RUST_LOG` is unset. Per-statement query logs
/// from sqlx drown out the auth flow at `info`, so they are capped at `warn`.
const DEFAULT_DIRECTIVES: &str = "info,sqlx=warn,hyper=warn";

/// Initialize process-wide tracing.
///
/// Safe to call multiple times; subsequent calls are no-ops. Filtering is
/// driven by `RUST_LOG`, with sensible per-crate defaults otherwise. Output
/// is flattened JSON, one record per line.
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVES));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .flatten_event(true)
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false)
        .try_init();
}
