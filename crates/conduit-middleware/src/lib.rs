// Path: crates/conduit-middleware/src/lib.rs
//! Shared per-service middleware: a TTL cache, a circuit breaker, and
//! deadline enforcement, all safe for concurrent access from many RPC
//! workers at once.

pub mod breaker;
pub mod cache;
pub mod deadline;

pub use breaker::CircuitBreaker;
pub use cache::TtlCache;
pub use deadline::{parse_grpc_timeout, with_deadline};
