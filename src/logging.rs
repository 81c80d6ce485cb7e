//! Tracing setup for embedding hosts.

use tracing_subscriber::EnvFilter;

/// Initialize console logging. Level defaults to `info`, overridable via
/// `RUST_LOG`. Safe to call once per process; subsequent calls are no-ops.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .try_init();
}
