//! Diagnostic logging.
//!
//! Stdout carries the judge protocol, so every log line goes to stderr.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber.
///
/// Reads `RUST_LOG`; defaults to `warn` if unset. Compact format on
/// stderr. Does nothing if a subscriber is already installed.
///
/// ```bash
/// RUST_LOG=cordon_engine=info cordon < judge_pipe
/// ```
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).compact())
        .try_init();
}
