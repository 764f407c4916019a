// Path: crates/conduit-crypto/src/sign/mod.rs
//! Signing algorithms. Each submodule implements [`TokenSigner`] for one
//! concrete scheme; deployments pick one at construction time and hand a
//! `Arc<dyn TokenSigner>` to every service, mirroring how the teacher's
//! `ioi-crypto::sign` module hosts one submodule per algorithm
//! (`eddsa`, `dilithium`, `bls`) behind a shared signing interface.

pub mod ed25519;
pub mod hmac;

use crate::error::SignatureError;

/// A pluggable signer/verifier for capability-token payloads.
///
/// Implementations MUST be safe to share across threads: every service
/// holds its signer behind an `Arc<dyn TokenSigner>`.
pub trait TokenSigner: Send + Sync + std::fmt::Debug {
    /// Signs `payload`, returning an opaque signature byte string.
    ///
    /// Fails with [`SignatureError::NoSigningKey`] for a verify-only
    /// implementation (e.g. [`ed25519::Ed25519Verifier`]) — never panics, so
    /// a deployment that mistakenly wires one in as an issuing signer gets a
    /// typed error instead of a crashed worker.
    fn sign(&self, payload: &[u8]) -> Result<Vec<u8>, SignatureError>;

    /// Verifies that `signature` is a valid signature of `payload`.
    fn verify(&self, payload: &[u8], signature: &[u8]) -> Result<(), SignatureError>;
}

pub use ed25519::Ed25519Signer;
pub use hmac::HmacSha256Signer;
