// Path: crates/conduit-capability/src/delegation.rs
//! Delegation proofs: a signed nested assertion letting one agent act on
//! behalf of another, scoped to a subset of the delegator's own holdings.

use base64::Engine;
use conduit_crypto::TokenSigner;
use conduit_types::{now_unix_secs, wildcard_match};
use serde::{Deserialize, Serialize};

use crate::error::TokenError;
use crate::token::CapabilityClaims;

/// The claims carried by a delegation proof.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DelegationClaims {
    pub delegator: String,
    pub delegatee: String,
    pub delegated_capabilities: Vec<String>,
    pub expires_at: u64,
}

/// A signed delegation proof accompanying a primary token on calls made on
/// behalf of another agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelegationProof {
    pub claims: DelegationClaims,
    #[serde(with = "hex::serde")]
    pub signature: Vec<u8>,
}

impl DelegationProof {
    pub fn issue(
        signer: &dyn TokenSigner,
        delegator: impl Into<String>,
        delegatee: impl Into<String>,
        delegated_capabilities: Vec<String>,
        expires_at: u64,
    ) -> Result<Self, TokenError> {
        let claims = DelegationClaims {
            delegator: delegator.into(),
            delegatee: delegatee.into(),
            delegated_capabilities,
            expires_at,
        };
        let payload = serde_json::to_vec(&claims).expect("DelegationClaims always serializes");
        let signature = signer.sign(&payload).map_err(|e| TokenError::SigningFailed(e.to_string()))?;
        Ok(Self { claims, signature })
    }

    /// Verifies this proof's signature and attenuation against
    /// `primary_claims`, the claims of the token it accompanies.
    ///
    /// A delegated scope is valid only if some capability held by the
    /// primary token implies it under the shared wildcard rule — the proof
    /// cannot grant a scope the primary token itself does not carry.
    pub fn verify(
        &self,
        signer: &dyn TokenSigner,
        primary_claims: &CapabilityClaims,
    ) -> Result<(), TokenError> {
        let payload = serde_json::to_vec(&self.claims).expect("DelegationClaims always serializes");
        signer
            .verify(&payload, &self.signature)
            .map_err(|_| TokenError::InvalidSignature)?;

        if self.claims.delegator != primary_claims.sub {
            return Err(TokenError::InvalidDelegation(format!(
                "proof delegator '{}' does not match token subject '{}'",
                self.claims.delegator, primary_claims.sub
            )));
        }

        for scope in &self.claims.delegated_capabilities {
            let implied = primary_claims
                .capabilities
                .iter()
                .any(|held| wildcard_match(held, scope));
            if !implied {
                return Err(TokenError::InvalidDelegation(format!(
                    "delegated scope '{scope}' is not implied by any capability the delegator holds"
                )));
            }
        }

        if now_unix_secs() > self.claims.expires_at {
            return Err(TokenError::InvalidDelegation("delegation proof expired".into()));
        }

        Ok(())
    }

    /// Encodes this proof as the base64url string carried in the
    /// `agent_delegation_proof` wire field.
    pub fn encode(&self) -> String {
        let bytes = serde_json::to_vec(self).expect("DelegationProof always serializes");
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
    }

    /// Decodes a proof previously produced by [`Self::encode`].
    pub fn decode(wire: &str) -> Result<Self, TokenError> {
        let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(wire)
            .map_err(|e| TokenError::Malformed(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| TokenError::Malformed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use conduit_crypto::sign::HmacSha256Signer;
    use conduit_types::now_unix_secs;

    fn signer() -> HmacSha256Signer {
        HmacSha256Signer::new(b"test-secret".to_vec())
    }

    fn primary() -> CapabilityClaims {
        CapabilityClaims {
            sub: "agent-root".into(),
            capabilities: vec!["tool:*".into()],
            aud: vec!["ContextServer".into()],
            iat: 0,
            exp: u64::MAX,
        }
    }

    #[test]
    fn delegation_within_subset_is_valid() {
        let signer = signer();
        let proof = DelegationProof::issue(
            &signer,
            "agent-root",
            "agent-child",
            vec!["tool:enhance_image".into()],
            now_unix_secs() + 60,
        )
        .unwrap();
        assert!(proof.verify(&signer, &primary()).is_ok());
    }

    #[test]
    fn delegation_outside_subset_is_rejected() {
        let signer = signer();
        let narrow_primary = CapabilityClaims {
            capabilities: vec!["tool:enhance_image".into()],
            ..primary()
        };
        let proof = DelegationProof::issue(
            &signer,
            "agent-root",
            "agent-child",
            vec!["tool:sql_query".into()],
            now_unix_secs() + 60,
        )
        .unwrap();
        assert!(proof.verify(&signer, &narrow_primary).is_err());
    }

    #[test]
    fn delegator_mismatch_is_rejected() {
        let signer = signer();
        let proof = DelegationProof::issue(
            &signer,
            "someone-else",
            "agent-child",
            vec!["tool:enhance_image".into()],
            now_unix_secs() + 60,
        )
        .unwrap();
        assert!(proof.verify(&signer, &primary()).is_err());
    }

    #[test]
    fn expired_proof_is_rejected() {
        let signer = signer();
        let proof = DelegationProof::issue(
            &signer,
            "agent-root",
            "agent-child",
            vec!["tool:enhance_image".into()],
            0,
        )
        .unwrap();
        assert!(proof.verify(&signer, &primary()).is_err());
    }
}
