// Path: crates/conduit-crypto/src/sign/hmac.rs
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::TokenSigner;
use crate::error::SignatureError;

type HmacSha256 = Hmac<Sha256>;

/// The default [`TokenSigner`]: a shared-secret HMAC-SHA256 MAC.
///
/// This is the scheme every deployment gets out of the box; it requires no
/// key distribution beyond the shared secret itself, which is the right
/// default for a single-operator fabric. Multi-party deployments that need
/// third parties to verify tokens without holding the signing secret should
/// use [`super::Ed25519Signer`] instead.
pub struct HmacSha256Signer {
    key: Vec<u8>,
}

impl HmacSha256Signer {
    pub fn new(key: impl Into<Vec<u8>>) -> Self {
        Self { key: key.into() }
    }
}

impl std::fmt::Debug for HmacSha256Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HmacSha256Signer").field("key", &"<redacted>").finish()
    }
}

impl TokenSigner for HmacSha256Signer {
    fn sign(&self, payload: &[u8]) -> Result<Vec<u8>, SignatureError> {
        let mut mac = HmacSha256::new_from_slice(&self.key).expect("HMAC accepts keys of any length");
        mac.update(payload);
        Ok(mac.finalize().into_bytes().to_vec())
    }

    fn verify(&self, payload: &[u8], signature: &[u8]) -> Result<(), SignatureError> {
        let expected = self.sign(payload)?;
        if expected.len() != signature.len() {
            return Err(SignatureError::Mismatch);
        }
        if expected.ct_eq(signature).into() {
            Ok(())
        } else {
            Err(SignatureError::Mismatch)
        }
    }
}
