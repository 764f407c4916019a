// Path: crates/conduit-telemetry/src/init.rs
//! Initializes the `tracing` subscriber used for human-facing diagnostic
//! logs (separate from the structured [`crate::sinks::TelemetrySink`]
//! path).

use tracing_subscriber::{fmt, EnvFilter};

/// Installs a `tracing-subscriber` fmt layer driven by `RUST_LOG` (falling
/// back to `info` when unset). Call once from each binary's `main`.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).with_target(true).init();
}
