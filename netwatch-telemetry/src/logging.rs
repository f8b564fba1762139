//! ## netwatch-telemetry::logging
//! **Logging setup and delivery-failure reporting**
//!
//! One `init()` at process start wires the fmt subscriber; `RUST_LOG`
//! overrides the default `info` filter. Both delivery paths out of the
//! agent are best-effort, so failed hand-offs are reported through
//! `delivery_failure` — these warnings are the only trace a lost record
//! leaves besides the failure counters.

use tracing_subscriber::{fmt, EnvFilter};

pub struct EventLogger;

impl EventLogger {
    /// Installs the process-wide subscriber. Call once, before any
    /// other component logs.
    pub fn init() {
        fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            )
            .with_thread_names(true)
            .init()
    }

    /// Records records lost on a downstream hand-off: the sink they
    /// were bound for, how many went with them, and what the transport
    /// said.
    pub fn delivery_failure(sink: &str, records: usize, error: impl std::fmt::Display) {
        tracing::warn!(%sink, records, error = %error, "delivery failed, records dropped");
    }
}
