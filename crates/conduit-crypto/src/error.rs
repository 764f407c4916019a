// Path: crates/conduit-crypto/src/error.rs
use thiserror::Error;

/// Errors produced while signing or verifying a token payload. Note this is
/// distinct from `conduit_types::ConduitError::Unauthenticated`: the
/// capability module maps a `SignatureError` into that variant at the
/// point it becomes a verification failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SignatureError {
    #[error("signature does not match payload")]
    Mismatch,
    #[error("signature is malformed: {0}")]
    Malformed(String),
    #[error("signer holds no signing key: {0}")]
    NoSigningKey(String),
}
