// Path: crates/conduit-registry/src/store.rs
//! The endpoint directory: a guarded map owned exclusively by the
//! Registry, mutated only by register (idempotent overwrite) and
//! deregistration.

use conduit_types::now_unix_ms;
use dashmap::DashMap;

/// A recorded endpoint: a provider's declared name, reachable address, and
/// capability set.
#[derive(Debug, Clone)]
pub struct EndpointRecord {
    pub server_name: String,
    pub transport_address: String,
    pub capabilities: Vec<String>,
    pub registered_at: u64,
}

/// The Registry's endpoint map, keyed by unique `server_name`.
#[derive(Default)]
pub struct EndpointStore {
    endpoints: DashMap<String, EndpointRecord>,
}

impl EndpointStore {
    pub fn new() -> Self {
        Self { endpoints: DashMap::new() }
    }

    /// Inserts or overwrites the record for `server_name`. Re-registering
    /// the same name is an idempotent overwrite, not an error.
    pub fn register(&self, server_name: String, transport_address: String, capabilities: Vec<String>) {
        self.endpoints.insert(
            server_name.clone(),
            EndpointRecord { server_name, transport_address, capabilities, registered_at: now_unix_ms() },
        );
    }

    pub fn deregister(&self, server_name: &str) -> bool {
        self.endpoints.remove(server_name).is_some()
    }

    /// Returns every recorded endpoint as an owned snapshot, for callers
    /// that then apply the capability-filter and audience checks
    /// themselves (kept out of the store so the store has no dependency on
    /// the wildcard-matching or capability crates).
    pub fn snapshot(&self) -> Vec<EndpointRecord> {
        self.endpoints.iter().map(|entry| entry.value().clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.endpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.endpoints.is_empty()
    }
}
