// Path: crates/conduit-capability/src/token.rs
//! Capability tokens: immutable signed assertions bearing a subject, a
//! scope set, an audience set, and a validity window.

use std::sync::Arc;

use base64::Engine;
use conduit_crypto::TokenSigner;
use conduit_types::{now_unix_secs, wildcard_match};
use serde::{Deserialize, Serialize};

use crate::error::TokenError;

/// The claims carried by a capability token, once verified.
///
/// Field names mirror the wire schema (`sub`, `capabilities`, `aud`, `iat`,
/// `exp`) rather than more Rust-idiomatic names, since these are exactly
/// the JSON keys signed over and transmitted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CapabilityClaims {
    pub sub: String,
    pub capabilities: Vec<String>,
    pub aud: Vec<String>,
    pub iat: u64,
    pub exp: u64,
}

impl CapabilityClaims {
    /// True iff some held capability matches `required` under the
    /// project-wide wildcard rule (`c == required`, or `c` contains `*`
    /// and `required` starts with the prefix before it).
    pub fn has_capability(&self, required: &str) -> bool {
        self.capabilities.iter().any(|c| wildcard_match(c, required))
    }

    /// True iff some held audience entry matches `target` under the same
    /// wildcard rule.
    pub fn has_audience(&self, target: &str) -> bool {
        self.aud.iter().any(|a| wildcard_match(a, target))
    }
}

/// A signed capability token: a [`CapabilityClaims`] payload plus the
/// signature over its canonical JSON encoding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapabilityToken {
    pub claims: CapabilityClaims,
    #[serde(with = "hex::serde")]
    pub signature: Vec<u8>,
}

impl CapabilityToken {
    /// Signs and issues a new token. Pure with respect to process state
    /// beyond reading the current clock.
    ///
    /// Fails with [`TokenError::SigningFailed`] if `signer` holds no signing
    /// key (a verify-only signer mistakenly wired in to issue tokens).
    pub fn issue(
        signer: &dyn TokenSigner,
        subject: impl Into<String>,
        capabilities: Vec<String>,
        audience: Vec<String>,
        ttl_secs: u64,
    ) -> Result<Self, TokenError> {
        let now = now_unix_secs();
        let claims = CapabilityClaims {
            sub: subject.into(),
            capabilities,
            aud: audience,
            iat: now,
            exp: now + ttl_secs,
        };
        let payload = canonical_payload(&claims);
        let signature = signer.sign(&payload).map_err(|e| TokenError::SigningFailed(e.to_string()))?;
        Ok(Self { claims, signature })
    }

    /// Verifies the token's signature and expiry, returning the validated
    /// claims on success.
    pub fn verify(&self, signer: &dyn TokenSigner) -> Result<CapabilityClaims, TokenError> {
        let payload = canonical_payload(&self.claims);
        signer
            .verify(&payload, &self.signature)
            .map_err(|_| TokenError::InvalidSignature)?;

        if self.claims.sub.is_empty() {
            return Err(TokenError::Malformed("missing sub".into()));
        }

        if now_unix_secs() > self.claims.exp {
            return Err(TokenError::Expired);
        }

        Ok(self.claims.clone())
    }

    /// Encodes this token as the base64url string carried in wire fields
    /// like `registration_token`/`requester_token`/`capability_token`.
    pub fn encode(&self) -> String {
        let bytes = serde_json::to_vec(self).expect("CapabilityToken always serializes");
        base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
    }

    /// Decodes a token previously produced by [`Self::encode`].
    pub fn decode(wire: &str) -> Result<Self, TokenError> {
        let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(wire)
            .map_err(|e| TokenError::Malformed(e.to_string()))?;
        serde_json::from_slice(&bytes).map_err(|e| TokenError::Malformed(e.to_string()))
    }
}

/// The canonical byte encoding signed over for a set of claims: fixed-field
/// order JSON, independent of struct field declaration order in memory,
/// since `serde_json` preserves struct field order for non-`Map` types.
fn canonical_payload(claims: &CapabilityClaims) -> Vec<u8> {
    serde_json::to_vec(claims).expect("CapabilityClaims always serializes")
}

/// A convenience alias for the common case of holding a signer behind an
/// `Arc` shared across service handlers.
pub type SharedSigner = Arc<dyn TokenSigner>;

#[cfg(test)]
mod tests {
    use super::*;
    use conduit_crypto::sign::HmacSha256Signer;

    fn signer() -> HmacSha256Signer {
        HmacSha256Signer::new(b"test-secret".to_vec())
    }

    #[test]
    fn issued_token_verifies() {
        let signer = signer();
        let token = CapabilityToken::issue(
            &signer,
            "agent-1",
            vec!["db:inventory:read".into()],
            vec!["ContextServer".into()],
            300,
        )
        .unwrap();
        let claims = token.verify(&signer).expect("valid token");
        assert_eq!(claims.sub, "agent-1");
    }

    #[test]
    fn expired_token_is_rejected() {
        let signer = signer();
        let token = CapabilityToken::issue(&signer, "agent-1", vec![], vec![], 0).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(1100));
        assert_eq!(token.verify(&signer), Err(TokenError::Expired));
    }

    #[test]
    fn tampered_signature_is_rejected() {
        let signer = signer();
        let mut token = CapabilityToken::issue(&signer, "agent-1", vec![], vec![], 300).unwrap();
        token.signature[0] ^= 0xFF;
        assert_eq!(token.verify(&signer), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn wrong_signer_key_is_rejected() {
        let a = signer();
        let b = HmacSha256Signer::new(b"other-secret".to_vec());
        let token = CapabilityToken::issue(&a, "agent-1", vec![], vec![], 300).unwrap();
        assert_eq!(token.verify(&b), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn has_capability_matches_suffix_wildcard() {
        let claims = CapabilityClaims {
            sub: "agent-1".into(),
            capabilities: vec!["event:publish:inventory:*".into()],
            aud: vec![],
            iat: 0,
            exp: u64::MAX,
        };
        assert!(claims.has_capability("event:publish:inventory:low_stock"));
        assert!(!claims.has_capability("event:publish:other:low_stock"));
    }

    #[test]
    fn has_audience_matches_exact() {
        let claims = CapabilityClaims {
            sub: "agent-1".into(),
            capabilities: vec![],
            aud: vec!["RegistryServer".into()],
            iat: 0,
            exp: u64::MAX,
        };
        assert!(claims.has_audience("RegistryServer"));
        assert!(!claims.has_audience("EventBusServer"));
    }
}
