//! Tracing setup.
//!
//! Console-only structured logging; there is no collector in this system.
//!
//! # Configuration
//!
//! - `RUST_LOG`: log filter (default: `info`)

use tracing_subscriber::EnvFilter;

/// Initialize the tracing subscriber.
///
/// Safe to call once at startup; a second call is ignored so tests that
/// race on initialization do not panic.
pub fn init_telemetry() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .try_init();
}
