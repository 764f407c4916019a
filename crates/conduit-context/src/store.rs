// Path: crates/conduit-context/src/store.rs
//! The external key/value source `RequestContext` falls back to on a
//! cache miss. The core crate treats this as an opaque collaborator;
//! `InMemoryContextStore` is the in-memory reference backend deployments
//! replace with a real data source.

use std::collections::BTreeMap;

use async_trait::async_trait;
use conduit_types::ConduitError;
use dashmap::DashMap;

/// A context value as returned by the backing store, before the service
/// stamps on a retrieval timestamp.
#[derive(Debug, Clone)]
pub struct ContextValue {
    pub serialized_value: Vec<u8>,
    pub metadata: Vec<String>,
}

/// The backing key/value lookup `RequestContext` consults on a cache miss.
#[async_trait]
pub trait ContextStore: Send + Sync {
    async fn get(&self, context_key: &str, parameters: &BTreeMap<String, String>) -> Result<ContextValue, ConduitError>;
}

/// An in-memory reference implementation, seeded with fixed entries.
/// Parameters are accepted but do not affect which value is returned —
/// a real backend would incorporate them into its own lookup.
#[derive(Default)]
pub struct InMemoryContextStore {
    entries: DashMap<String, ContextValue>,
}

impl InMemoryContextStore {
    pub fn new() -> Self {
        Self { entries: DashMap::new() }
    }

    pub fn seed(&self, context_key: impl Into<String>, serialized_value: impl Into<Vec<u8>>, metadata: Vec<String>) {
        self.entries.insert(context_key.into(), ContextValue { serialized_value: serialized_value.into(), metadata });
    }
}

#[async_trait]
impl ContextStore for InMemoryContextStore {
    async fn get(&self, context_key: &str, _parameters: &BTreeMap<String, String>) -> Result<ContextValue, ConduitError> {
        self.entries
            .get(context_key)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| ConduitError::Internal(format!("no context entry for key '{context_key}'")))
    }
}
