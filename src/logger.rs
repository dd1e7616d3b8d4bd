//! # Logging
//!
//! Installs the `tracing` subscriber used by the command line tool. The library itself only emits
//! events and never installs a subscriber.

use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt::{self, format::FmtSpan}, EnvFilter};

/// Initialise logging from `RUST_LOG`, defaulting to `info`.
///
/// At debug level span close events are logged too, which reports the duration of each pipeline
/// run.
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let is_debug = env_filter.to_string().contains("debug")
        || env_filter.to_string().contains("trace");

    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_timer(fmt::time::uptime())
        .with_span_events(if is_debug {
            FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}
