// Path: crates/conduit-context/src/lib.rs
//! The ContextTool service: context retrieval, telemetry fan-out,
//! multimodal echo/transform, and tool dispatch, each framed by
//! authorization plus caching/breaker middleware where it applies.

pub mod service;
pub mod store;
pub mod telemetry_stream;
pub mod tools;

pub use service::ContextToolService;
pub use store::{ContextStore, ContextValue, InMemoryContextStore};
pub use telemetry_stream::{SubscriptionHandle, TelemetryStreams};
pub use tools::{ComputePricingHandler, ToolHandler, ToolRegistry};
