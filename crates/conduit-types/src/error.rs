// Path: crates/conduit-types/src/error.rs
//! The error taxonomy shared by every Conduit RPC handler.

use thiserror::Error;

/// A trait for assigning a stable, machine-readable string code to an error,
/// independent of its `Display` message, for log and metric correlation.
pub trait ErrorCode {
    /// Returns the unique, stable string identifier for this error variant.
    fn code(&self) -> &'static str;
}

/// The cross-cutting error type surfaced by the capability module and every
/// RPC handler. Maps directly onto the status categories in spec §6/§7:
/// `Unauthenticated`, `PermissionDenied`, `InvalidArgument`, `Unavailable`,
/// `Internal`, and client cancellation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConduitError {
    /// The presented token failed signature verification or has expired.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    /// The token is valid but lacks the required capability or audience.
    #[error("permission denied: {0}")]
    PermissionDenied(String),

    /// A required field or piece of request metadata was missing or malformed.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The circuit breaker is open, or the downstream backend is unreachable.
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// The backing store or a handler failed unexpectedly.
    #[error("internal error: {0}")]
    Internal(String),

    /// The caller cancelled the call or its deadline expired.
    #[error("cancelled: {0}")]
    Cancelled(String),
}

impl ErrorCode for ConduitError {
    fn code(&self) -> &'static str {
        match self {
            Self::Unauthenticated(_) => "UNAUTHENTICATED",
            Self::PermissionDenied(_) => "PERMISSION_DENIED",
            Self::InvalidArgument(_) => "INVALID_ARGUMENT",
            Self::Unavailable(_) => "UNAVAILABLE",
            Self::Internal(_) => "INTERNAL",
            Self::Cancelled(_) => "CANCELLED",
        }
    }
}

impl From<ConduitError> for tonic::Status {
    fn from(err: ConduitError) -> Self {
        let code = match &err {
            ConduitError::Unauthenticated(_) => tonic::Code::Unauthenticated,
            ConduitError::PermissionDenied(_) => tonic::Code::PermissionDenied,
            ConduitError::InvalidArgument(_) => tonic::Code::InvalidArgument,
            ConduitError::Unavailable(_) => tonic::Code::Unavailable,
            ConduitError::Internal(_) => tonic::Code::Internal,
            ConduitError::Cancelled(_) => tonic::Code::Cancelled,
        };
        tonic::Status::new(code, err.to_string())
    }
}

/// Whether an error kind contributes to a circuit breaker's failure count
/// (spec §7: authentication/authorization/cancellation failures do not trip
/// the breaker; transient backend failures and handler panics do).
impl ConduitError {
    pub fn trips_breaker(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Internal(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_errors_do_not_trip_breaker() {
        assert!(!ConduitError::Unauthenticated("bad sig".into()).trips_breaker());
        assert!(!ConduitError::PermissionDenied("missing scope".into()).trips_breaker());
        assert!(!ConduitError::Cancelled("client went away".into()).trips_breaker());
    }

    #[test]
    fn backend_errors_trip_breaker() {
        assert!(ConduitError::Unavailable("breaker open".into()).trips_breaker());
        assert!(ConduitError::Internal("store panicked".into()).trips_breaker());
    }

    #[test]
    fn status_codes_map_correctly() {
        let status: tonic::Status = ConduitError::PermissionDenied("x".into()).into();
        assert_eq!(status.code(), tonic::Code::PermissionDenied);
    }
}
