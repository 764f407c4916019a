// Path: crates/conduit-capability/src/guard.rs
//! The common authorization frame every RPC handler on the Registry,
//! ContextTool, and EventBus runs: decode the wire token, verify it,
//! then check capability and audience. Kept here so all three services
//! apply exactly the same rule rather than re-deriving it per crate.

use conduit_crypto::TokenSigner;
use conduit_types::ConduitError;

use crate::token::{CapabilityClaims, CapabilityToken};

/// Decodes and verifies `token_wire`, then requires both a capability and
/// an audience match. Returns the verified claims on success.
///
/// Verification failures surface as `Unauthenticated`; a valid token
/// lacking the required capability or audience surfaces as
/// `PermissionDenied` — the two failure modes spec §4.A/§7 keep distinct.
pub fn authorize(
    token_wire: &str,
    signer: &dyn TokenSigner,
    required_capability: &str,
    required_audience: &str,
) -> Result<CapabilityClaims, ConduitError> {
    let token = CapabilityToken::decode(token_wire).map_err(|e| ConduitError::Unauthenticated(e.to_string()))?;
    let claims = token.verify(signer).map_err(|e| ConduitError::Unauthenticated(e.to_string()))?;

    if !claims.has_capability(required_capability) {
        return Err(ConduitError::PermissionDenied(format!(
            "token for '{}' lacks capability '{required_capability}'",
            claims.sub
        )));
    }
    if !claims.has_audience(required_audience) {
        return Err(ConduitError::PermissionDenied(format!(
            "token for '{}' lacks audience '{required_audience}'",
            claims.sub
        )));
    }
    Ok(claims)
}
