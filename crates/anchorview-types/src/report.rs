//! Signed reporter messages.
//!
//! A price report is the JSON encoding of a [`PriceMessage`]. The control
//! message that invalidates a reporter is the JSON string `"rotate"`.

use serde::{Deserialize, Serialize};

/// Kind tag carried by every price report.
pub const PRICES_KIND: &str = "prices";

/// Payload of the reporter self-invalidation message.
pub const ROTATE_MESSAGE: &str = "rotate";

/// Body of a signed price report.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceMessage {
    pub kind: String,
    pub timestamp: u64,
    /// Symbol the price is for.
    pub key: String,
    /// Price in the quote denomination.
    pub value: u64,
}

impl PriceMessage {
    /// Build a `prices` report.
    pub fn prices(timestamp: u64, key: &str, value: u64) -> Self {
        Self {
            kind: PRICES_KIND.to_string(),
            timestamp,
            key: key.to_string(),
            value,
        }
    }

    /// Canonical bytes that get signed.
    pub fn encode(&self) -> Vec<u8> {
        // Serializing a struct of strings and integers cannot fail.
        serde_json::to_vec(self).unwrap_or_default()
    }

    pub fn decode(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }
}

/// Canonical bytes of the rotate control message.
pub fn encode_rotate() -> Vec<u8> {
    serde_json::to_vec(ROTATE_MESSAGE).unwrap_or_default()
}

/// A stored report as read back from an observation store.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportedPrice {
    pub price: u64,
    pub timestamp: u64,
}
