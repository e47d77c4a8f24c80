//! Domain-separated BLAKE3 hashing.
//!
//! Three uses share this module, kept apart by BLAKE3's mode flags:
//!
//! - [`symbol_hash`]: plain content hash of a display symbol
//! - [`report_digest`]: derive-key mode over a signed report body
//! - [`address_from_key`]: plain hash of a public key, truncated to an address

use crate::ADDRESS_LEN;

/// Registered context strings.
pub mod contexts {
    pub const REPORT_DIGEST: &str = "anchorview v1 report-digest";

    /// All registered context strings. Used for validation.
    pub const ALL_CONTEXTS: &[&str] = &[REPORT_DIGEST];
}

/// Compute BLAKE3 hash of the input data.
pub fn hash(data: &[u8]) -> [u8; 32] {
    *::blake3::hash(data).as_bytes()
}

/// Derive a key using BLAKE3's built-in key derivation mode.
///
/// # Arguments
///
/// * `context` - A registered context string (must start with "anchorview v1 ")
/// * `key_material` - The input key material
pub fn derive_key(context: &str, key_material: &[u8]) -> [u8; 32] {
    let mut out = [0u8; 32];
    let mut hasher = ::blake3::Hasher::new_derive_key(context);
    hasher.update(key_material);
    let hash = hasher.finalize();
    out.copy_from_slice(hash.as_bytes());
    out
}

/// Verify that a context string is registered.
pub fn is_registered_context(context: &str) -> bool {
    contexts::ALL_CONTEXTS.contains(&context)
}

/// Fingerprint of an asset's display symbol.
///
/// `symbol_hash = BLAKE3::hash(utf8(symbol))`
pub fn symbol_hash(symbol: &str) -> [u8; 32] {
    hash(symbol.as_bytes())
}

/// Digest that reporter signatures are computed over.
///
/// `digest = BLAKE3::derive_key("anchorview v1 report-digest", message)`
pub fn report_digest(message: &[u8]) -> [u8; 32] {
    derive_key(contexts::REPORT_DIGEST, message)
}

/// Reduce a 32-byte public key to a 20-byte address.
///
/// `address = BLAKE3::hash(public_key)[:20]`
pub fn address_from_key(public_key: &[u8; 32]) -> [u8; ADDRESS_LEN] {
    let digest = hash(public_key);
    let mut out = [0u8; ADDRESS_LEN];
    out.copy_from_slice(&digest[..ADDRESS_LEN]);
    out
}
