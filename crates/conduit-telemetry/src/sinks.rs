// Path: crates/conduit-telemetry/src/sinks.rs
//! A single pluggable sink for structured telemetry records, decoupling
//! the RPC handlers from whatever backend a deployment wires up
//! (Prometheus, a log aggregator, a no-op for tests).

use once_cell::sync::OnceCell;

use crate::record::TelemetryRecord;

/// Receives one [`TelemetryRecord`] per completed RPC.
///
/// `record` MUST NOT block the calling RPC; implementations that forward to
/// a slow backend should buffer internally or drop under load rather than
/// stalling the handler that emitted the record.
pub trait TelemetrySink: Send + Sync + std::fmt::Debug {
    fn record(&self, record: &TelemetryRecord);
}

/// The default sink: discards every record. Used in tests and whenever a
/// deployment has not initialized a real backend.
#[derive(Debug, Clone, Copy)]
pub struct NopSink;

impl TelemetrySink for NopSink {
    fn record(&self, _record: &TelemetryRecord) {}
}

/// A lazily-initialized static reference to the global `TelemetrySink`.
pub static SINK: OnceCell<&'static dyn TelemetrySink> = OnceCell::new();
static NOP_SINK: NopSink = NopSink;

/// Installs the process-wide telemetry sink. Intended to be called once at
/// startup from `conduit-node`; a second call is a no-op and returns
/// `Err(())` with the rejected reference dropped.
pub fn init_sink(sink: &'static dyn TelemetrySink) -> Result<(), ()> {
    SINK.set(sink).map_err(|_| ())
}

/// Emits `record` to the configured sink, or silently drops it if no sink
/// has been installed.
pub fn emit(record: TelemetryRecord) {
    SINK.get().copied().unwrap_or(&NOP_SINK).record(&record);
}
