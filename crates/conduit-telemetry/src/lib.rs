// Path: crates/conduit-telemetry/src/lib.rs
//! Structured telemetry for Conduit services, kept deliberately separate
//! from `tracing`: `tracing` carries human-facing diagnostic logs, while
//! [`sinks::TelemetrySink`] carries the one-record-per-RPC structured frame
//! (`method`, `client`, `latency_ms`, `status`) that a deployment's metrics
//! backend consumes. Every RPC handler emits exactly one record on every
//! exit path, including failure.

pub mod init;
pub mod record;
pub mod sinks;

pub use record::TelemetryRecord;
pub use sinks::{emit, NopSink, TelemetrySink, SINK};
