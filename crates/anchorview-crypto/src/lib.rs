//! # anchorview-crypto
//!
//! Cryptographic primitives used by the anchorview price oracle.
//!
//! ## Modules
//!
//! - [`blake3`]: Symbol fingerprints, report digests and address derivation
//! - [`ed25519`]: Ed25519 reporter keys and recoverable report signatures

pub mod blake3;
pub mod ed25519;

/// Length of a reporter address in bytes.
pub const ADDRESS_LEN: usize = 20;

/// Error types for cryptographic operations.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// Ed25519 signature verification failed.
    #[error("signature verification failed")]
    SignatureVerification,

    /// Invalid key length.
    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    /// Invalid signature encoding.
    #[error("invalid signature length: expected {expected}, got {actual}")]
    InvalidSignatureLength { expected: usize, actual: usize },

    /// Invalid input data.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, CryptoError>;
