// Path: crates/conduit-capability/src/error.rs
use conduit_types::{ConduitError, ErrorCode};
use thiserror::Error;

/// Failures while verifying a capability token or a delegation proof.
///
/// Every variant is fatal to the enclosing RPC; `From<TokenError> for
/// ConduitError` maps each one onto the `Unauthenticated` family so call
/// sites never need to match on `TokenError` directly.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("token signature is invalid")]
    InvalidSignature,
    #[error("token is malformed: {0}")]
    Malformed(String),
    #[error("delegation proof invalid: {0}")]
    InvalidDelegation(String),
    #[error("could not sign token: {0}")]
    SigningFailed(String),
}

impl ErrorCode for TokenError {
    fn code(&self) -> &'static str {
        match self {
            TokenError::Expired => "TOKEN_EXPIRED",
            TokenError::InvalidSignature => "TOKEN_INVALID_SIGNATURE",
            TokenError::Malformed(_) => "TOKEN_MALFORMED",
            TokenError::InvalidDelegation(_) => "TOKEN_INVALID_DELEGATION",
            TokenError::SigningFailed(_) => "TOKEN_SIGNING_FAILED",
        }
    }
}

impl From<TokenError> for ConduitError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::SigningFailed(msg) => ConduitError::Internal(msg),
            other => ConduitError::Unauthenticated(other.to_string()),
        }
    }
}
