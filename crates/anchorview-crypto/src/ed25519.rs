//! Ed25519 reporter keys and recoverable report signatures.
//!
//! Reporters sign the domain-separated [`report_digest`](crate::blake3::report_digest)
//! of each message. Ed25519 cannot recover a key from a signature alone, so a
//! [`RecoverableSignature`] carries the public key beside the signature:
//! recovery verifies the pair and reduces the key to its address.
//!
//! Wire form: `public_key (32) || signature (64)`.

use ed25519_dalek::{Signer, Verifier};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::{CryptoError, Result, ADDRESS_LEN};

/// Encoded length of a [`RecoverableSignature`].
pub const RECOVERABLE_SIGNATURE_LEN: usize = 96;

/// An Ed25519 signing key (private key).
pub struct SigningKey {
    inner: ed25519_dalek::SigningKey,
}

impl Clone for SigningKey {
    fn clone(&self) -> Self {
        Self {
            inner: ed25519_dalek::SigningKey::from_bytes(&self.inner.to_bytes()),
        }
    }
}

impl Drop for SigningKey {
    fn drop(&mut self) {
        let mut bytes = self.inner.to_bytes();
        bytes.zeroize();
    }
}

/// An Ed25519 verification key (public key).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyingKey {
    inner: ed25519_dalek::VerifyingKey,
}

/// An Ed25519 signature.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signature {
    inner: ed25519_dalek::Signature,
}

/// A signature bundled with the key that produced it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecoverableSignature {
    pub public_key: VerifyingKey,
    pub signature: Signature,
}

/// A reporter keypair.
pub struct KeyPair {
    pub signing_key: SigningKey,
    pub verifying_key: VerifyingKey,
}

impl SigningKey {
    /// Generate a new random signing key.
    pub fn generate() -> Self {
        let mut csprng = rand::rngs::OsRng;
        Self {
            inner: ed25519_dalek::SigningKey::generate(&mut csprng),
        }
    }

    /// Create a signing key from raw bytes.
    pub fn from_bytes(bytes: &[u8; 32]) -> Self {
        Self {
            inner: ed25519_dalek::SigningKey::from_bytes(bytes),
        }
    }

    /// Get the raw bytes of this signing key.
    pub fn to_bytes(&self) -> [u8; 32] {
        self.inner.to_bytes()
    }

    /// Get the corresponding verifying key.
    pub fn verifying_key(&self) -> VerifyingKey {
        VerifyingKey {
            inner: self.inner.verifying_key(),
        }
    }

    /// Sign raw bytes.
    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature {
            inner: self.inner.sign(message),
        }
    }

    /// Sign the report digest of `message` and attach the public key.
    pub fn sign_report(&self, message: &[u8]) -> RecoverableSignature {
        let digest = crate::blake3::report_digest(message);
        RecoverableSignature {
            public_key: self.verifying_key(),
            signature: self.sign(&digest),
        }
    }
}

impl VerifyingKey {
    /// Create a verifying key from raw bytes.
    pub fn from_bytes(bytes: &[u8; 32]) -> Result<Self> {
        let inner = ed25519_dalek::VerifyingKey::from_bytes(bytes)
            .map_err(|e| CryptoError::InvalidInput(e.to_string()))?;
        Ok(Self { inner })
    }

    /// Get the raw bytes of this verifying key.
    pub fn to_bytes(&self) -> [u8; 32] {
        self.inner.to_bytes()
    }

    /// Get the raw bytes as a slice.
    pub fn as_bytes(&self) -> &[u8; 32] {
        self.inner.as_bytes()
    }

    /// Verify a signature on a message.
    pub fn verify(&self, message: &[u8], signature: &Signature) -> Result<()> {
        self.inner
            .verify(message, &signature.inner)
            .map_err(|_| CryptoError::SignatureVerification)
    }

    /// Address of this key.
    pub fn address(&self) -> [u8; ADDRESS_LEN] {
        crate::blake3::address_from_key(self.as_bytes())
    }
}

impl Signature {
    /// Create a signature from raw bytes.
    pub fn from_bytes(bytes: &[u8; 64]) -> Self {
        Self {
            inner: ed25519_dalek::Signature::from_bytes(bytes),
        }
    }

    /// Get the raw bytes of this signature.
    pub fn to_bytes(&self) -> [u8; 64] {
        self.inner.to_bytes()
    }
}

impl RecoverableSignature {
    /// Decode from the 96-byte wire form.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != RECOVERABLE_SIGNATURE_LEN {
            return Err(CryptoError::InvalidSignatureLength {
                expected: RECOVERABLE_SIGNATURE_LEN,
                actual: bytes.len(),
            });
        }
        let mut key = [0u8; 32];
        key.copy_from_slice(&bytes[..32]);
        let mut sig = [0u8; 64];
        sig.copy_from_slice(&bytes[32..]);
        Ok(Self {
            public_key: VerifyingKey::from_bytes(&key)?,
            signature: Signature::from_bytes(&sig),
        })
    }

    /// Encode to the 96-byte wire form.
    pub fn to_bytes(&self) -> [u8; RECOVERABLE_SIGNATURE_LEN] {
        let mut out = [0u8; RECOVERABLE_SIGNATURE_LEN];
        out[..32].copy_from_slice(self.public_key.as_bytes());
        out[32..].copy_from_slice(&self.signature.to_bytes());
        out
    }

    /// Hex encoding of the wire form.
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }
}

impl KeyPair {
    /// Generate a new random Ed25519 keypair.
    pub fn generate() -> Self {
        let signing_key = SigningKey::generate();
        let verifying_key = signing_key.verifying_key();
        Self {
            signing_key,
            verifying_key,
        }
    }

    /// Create a keypair from a signing key's raw bytes.
    pub fn from_bytes(secret: &[u8; 32]) -> Self {
        let signing_key = SigningKey::from_bytes(secret);
        let verifying_key = signing_key.verifying_key();
        Self {
            signing_key,
            verifying_key,
        }
    }

    /// Address of the public half.
    pub fn address(&self) -> [u8; ADDRESS_LEN] {
        self.verifying_key.address()
    }
}

/// Recover the signer address of `message` from a wire-form signature.
///
/// # Errors
///
/// - [`CryptoError::InvalidSignatureLength`] if `signature` is not 96 bytes
/// - [`CryptoError::InvalidInput`] if the embedded public key is malformed
/// - [`CryptoError::SignatureVerification`] if the signature does not verify
pub fn recover(message: &[u8], signature: &[u8]) -> Result<[u8; ADDRESS_LEN]> {
    let recoverable = RecoverableSignature::from_slice(signature)?;
    let digest = crate::blake3::report_digest(message);
    recoverable
        .public_key
        .verify(&digest, &recoverable.signature)?;
    Ok(recoverable.public_key.address())
}

impl std::fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SigningKey")
            .field("public", &self.verifying_key())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_verify_roundtrip() {
        let kp = KeyPair::generate();
        let msg = b"anchorview test";
        let sig = kp.signing_key.sign(msg);
        assert!(kp.verifying_key.verify(msg, &sig).is_ok());
        assert!(kp.verifying_key.verify(b"wrong message", &sig).is_err());
    }

    #[test]
    fn test_recover_returns_signer_address() {
        let kp = KeyPair::generate();
        let msg = b"{\"kind\":\"prices\",\"timestamp\":1,\"key\":\"ETH\",\"value\":2}";
        let sig = kp.signing_key.sign_report(msg);
        let address = recover(msg, &sig.to_bytes()).expect("recover");
        assert_eq!(address, kp.address());
    }

    #[test]
    fn test_recover_rejects_tampered_message() {
        let kp = KeyPair::generate();
        let sig = kp.signing_key.sign_report(b"original");
        let err = recover(b"tampered", &sig.to_bytes()).unwrap_err();
        assert!(matches!(err, CryptoError::SignatureVerification));
    }

    #[test]
    fn test_recover_rejects_swapped_key() {
        // A valid signature paired with someone else's key must not verify.
        let kp1 = KeyPair::generate();
        let kp2 = KeyPair::generate();
        let mut sig = kp1.signing_key.sign_report(b"rotate");
        sig.public_key = kp2.verifying_key.clone();
        let err = recover(b"rotate", &sig.to_bytes()).unwrap_err();
        assert!(matches!(err, CryptoError::SignatureVerification));
    }

    #[test]
    fn test_recover_rejects_short_signature() {
        let err = recover(b"msg", &[0u8; 64]).unwrap_err();
        assert!(matches!(
            err,
            CryptoError::InvalidSignatureLength { expected: 96, actual: 64 }
        ));
    }

    #[test]
    fn test_recoverable_signature_wire_roundtrip() {
        let kp = KeyPair::generate();
        let sig = kp.signing_key.sign_report(b"test");
        let restored = RecoverableSignature::from_slice(&sig.to_bytes()).expect("decode");
        assert_eq!(sig, restored);
        assert_eq!(sig.to_hex().len(), RECOVERABLE_SIGNATURE_LEN * 2);
    }

    #[test]
    fn test_deterministic_key_derivation() {
        let seed = hex_literal::hex!(
            "9d61b19deffd5a60ba844af492ec2cc44449c5697b326919703bac031cae7f60"
        );
        let kp1 = KeyPair::from_bytes(&seed);
        let kp2 = KeyPair::from_bytes(&seed);
        assert_eq!(kp1.address(), kp2.address());

        let kp3 = KeyPair::from_bytes(&[43u8; 32]);
        assert_ne!(kp1.address(), kp3.address());
    }
}
