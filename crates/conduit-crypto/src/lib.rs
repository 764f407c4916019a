// Path: crates/conduit-crypto/src/lib.rs
//! Signing and verification for Conduit capability tokens.
//!
//! Spec §6 fixes the wire token format but leaves the signature scheme
//! "opaque but fixed per deployment", explicitly allowing "deployments MAY
//! substitute an asymmetric scheme without changing the verification
//! interface". We model that as a single [`TokenSigner`] trait object; the
//! capability module (`conduit-capability`) never matches on which concrete
//! algorithm is in use.

pub mod error;
pub mod sign;

pub use error::SignatureError;
pub use sign::TokenSigner;
