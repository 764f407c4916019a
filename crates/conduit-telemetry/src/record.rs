// Path: crates/conduit-telemetry/src/record.rs
//! The structured record emitted by [`crate::sinks::emit`] on every RPC
//! exit path.

/// A single telemetry record for one completed (or failed) RPC.
///
/// Spec requires at minimum `method`, `client`, `latency_ms`, `status`;
/// `extra` carries any deployment-specific keyed fields beyond those four
/// (e.g. a tool name, a topic) without widening the core schema.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryRecord {
    pub method: String,
    pub client: String,
    pub latency_ms: u64,
    pub status: String,
    pub extra: Vec<(String, String)>,
}

impl TelemetryRecord {
    pub fn new(method: impl Into<String>, client: impl Into<String>, latency_ms: u64, status: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            client: client.into(),
            latency_ms,
            status: status.into(),
            extra: Vec::new(),
        }
    }

    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.extra.push((key.into(), value.into()));
        self
    }
}
