// Path: crates/conduit-capability/src/lib.rs
//! Capability-token issuance, verification, and delegation — the
//! authorization layer every RPC handler on the Registry, ContextTool, and
//! EventBus services runs before admitting a call.

pub mod delegation;
pub mod error;
pub mod guard;
pub mod token;

pub use delegation::{DelegationClaims, DelegationProof};
pub use error::TokenError;
pub use guard::authorize;
pub use token::{CapabilityClaims, CapabilityToken, SharedSigner};
