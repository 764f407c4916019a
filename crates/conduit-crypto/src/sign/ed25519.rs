// Path: crates/conduit-crypto/src/sign/ed25519.rs
use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};

use super::TokenSigner;
use crate::error::SignatureError;

/// An asymmetric alternative to [`super::HmacSha256Signer`], for deployments
/// where a third party must be able to verify tokens without holding the
/// secret that issues them. Grounded on the `CapabilityToken` signing style
/// in the `clasp-caps` reference crate, which signs with an
/// `ed25519_dalek::SigningKey` and verifies with the paired
/// `VerifyingKey`.
pub struct Ed25519Signer {
    signing_key: SigningKey,
}

impl Ed25519Signer {
    pub fn new(signing_key: SigningKey) -> Self {
        Self { signing_key }
    }

    pub fn generate(csprng: &mut (impl rand::CryptoRng + rand::RngCore)) -> Self {
        Self { signing_key: SigningKey::generate(csprng) }
    }

    pub fn verifying_key(&self) -> VerifyingKey {
        self.signing_key.verifying_key()
    }
}

impl std::fmt::Debug for Ed25519Signer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ed25519Signer")
            .field("verifying_key", &hex::encode(self.signing_key.verifying_key().as_bytes()))
            .finish()
    }
}

impl TokenSigner for Ed25519Signer {
    fn sign(&self, payload: &[u8]) -> Result<Vec<u8>, SignatureError> {
        Ok(self.signing_key.sign(payload).to_bytes().to_vec())
    }

    fn verify(&self, payload: &[u8], signature: &[u8]) -> Result<(), SignatureError> {
        let sig_bytes: [u8; 64] = signature
            .try_into()
            .map_err(|_| SignatureError::Malformed("ed25519 signature must be 64 bytes".into()))?;
        let sig = Signature::from_bytes(&sig_bytes);
        self.signing_key
            .verifying_key()
            .verify(payload, &sig)
            .map_err(|_| SignatureError::Mismatch)
    }
}

/// A verify-only counterpart for processes that hold only the public key.
pub struct Ed25519Verifier {
    verifying_key: VerifyingKey,
}

impl Ed25519Verifier {
    pub fn new(verifying_key: VerifyingKey) -> Self {
        Self { verifying_key }
    }
}

impl std::fmt::Debug for Ed25519Verifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ed25519Verifier")
            .field("verifying_key", &hex::encode(self.verifying_key.as_bytes()))
            .finish()
    }
}

impl TokenSigner for Ed25519Verifier {
    fn sign(&self, _payload: &[u8]) -> Result<Vec<u8>, SignatureError> {
        Err(SignatureError::NoSigningKey(
            "Ed25519Verifier holds no signing key; construct an Ed25519Signer to issue tokens".into(),
        ))
    }

    fn verify(&self, payload: &[u8], signature: &[u8]) -> Result<(), SignatureError> {
        let sig_bytes: [u8; 64] = signature
            .try_into()
            .map_err(|_| SignatureError::Malformed("ed25519 signature must be 64 bytes".into()))?;
        let sig = Signature::from_bytes(&sig_bytes);
        self.verifying_key
            .verify(payload, &sig)
            .map_err(|_| SignatureError::Mismatch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::OsRng;

    #[test]
    fn round_trips() {
        let signer = Ed25519Signer::generate(&mut OsRng);
        let sig = signer.sign(b"hello").unwrap();
        assert!(signer.verify(b"hello", &sig).is_ok());
    }

    #[test]
    fn verifier_checks_without_signing_key() {
        let signer = Ed25519Signer::generate(&mut OsRng);
        let sig = signer.sign(b"hello").unwrap();
        let verifier = Ed25519Verifier::new(signer.verifying_key());
        assert!(verifier.verify(b"hello", &sig).is_ok());
        assert!(verifier.verify(b"goodbye", &sig).is_err());
    }

    #[test]
    fn rejects_tampered_payload() {
        let signer = Ed25519Signer::generate(&mut OsRng);
        let sig = signer.sign(b"hello").unwrap();
        assert!(signer.verify(b"goodbye", &sig).is_err());
    }

    #[test]
    fn verify_only_signer_returns_an_error_instead_of_panicking() {
        let signer = Ed25519Signer::generate(&mut OsRng);
        let verifier = Ed25519Verifier::new(signer.verifying_key());
        assert_eq!(
            verifier.sign(b"hello"),
            Err(SignatureError::NoSigningKey(
                "Ed25519Verifier holds no signing key; construct an Ed25519Signer to issue tokens".into()
            ))
        );
    }
}
