//! Signature recovery and the signed observation store.
//!
//! Anyone may submit signed reports. The store keeps the newest report per
//! `(signer, symbol)` without checking either against the oracle's configs;
//! the oracle later reads back only what its configured reporter signed.

use std::collections::HashMap;
use std::sync::Arc;

use anchorview_crypto::CryptoError;
use anchorview_types::report::{PriceMessage, ReportedPrice, PRICES_KIND};
use anchorview_types::{fmt_address, Address};

use crate::{OracleError, Result};

/// Reports dated further than this into the future are ignored.
pub const MAX_FUTURE_DRIFT_SECS: u64 = 60 * 60;

/// Recovers the address that signed a message.
pub trait SignatureRecovery: Send + Sync {
    fn recover(&self, message: &[u8], signature: &[u8]) -> Result<Address>;
}

/// Ed25519 recovery over the report digest.
#[derive(Debug, Clone, Copy, Default)]
pub struct Ed25519Recovery;

impl SignatureRecovery for Ed25519Recovery {
    fn recover(&self, message: &[u8], signature: &[u8]) -> Result<Address> {
        anchorview_crypto::ed25519::recover(message, signature).map_err(|e| match e {
            CryptoError::InvalidSignatureLength { .. } | CryptoError::InvalidInput(_) => {
                OracleError::Report(format!("malformed signature: {e}"))
            }
            _ => OracleError::Unauthorized(format!("signature does not verify: {e}")),
        })
    }
}

/// Store of signed price reports.
pub trait ObservationStore: Send + Sync {
    /// Decode a signed report and recover its signer without storing it.
    fn check(&self, message: &[u8], signature: &[u8]) -> Result<Address>;

    /// Record a signed report and return its signer.
    fn put(&mut self, message: &[u8], signature: &[u8], now: u64) -> Result<Address>;

    /// Latest report by `origin` for `symbol`.
    fn get(&self, origin: &Address, symbol: &str) -> Option<ReportedPrice>;
}

/// In-memory observation store.
pub struct SignedPriceStore {
    recovery: Arc<dyn SignatureRecovery>,
    reports: HashMap<(Address, String), ReportedPrice>,
}

impl SignedPriceStore {
    pub fn new(recovery: Arc<dyn SignatureRecovery>) -> Self {
        Self {
            recovery,
            reports: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    fn open(&self, message: &[u8], signature: &[u8]) -> Result<(PriceMessage, Address)> {
        let report = PriceMessage::decode(message)
            .map_err(|e| OracleError::Report(format!("undecodable price message: {e}")))?;
        if report.kind != PRICES_KIND {
            return Err(OracleError::Report(format!(
                "unexpected message kind {:?}",
                report.kind
            )));
        }
        let signer = self.recovery.recover(message, signature)?;
        Ok((report, signer))
    }
}

impl ObservationStore for SignedPriceStore {
    fn check(&self, message: &[u8], signature: &[u8]) -> Result<Address> {
        self.open(message, signature).map(|(_, signer)| signer)
    }

    fn put(&mut self, message: &[u8], signature: &[u8], now: u64) -> Result<Address> {
        let (report, signer) = self.open(message, signature)?;

        let key = (signer, report.key);
        let prior = self.reports.get(&key).map_or(0, |r| r.timestamp);
        let horizon = now.saturating_add(MAX_FUTURE_DRIFT_SECS);
        if prior < report.timestamp && report.timestamp < horizon {
            tracing::debug!(
                signer = %fmt_address(&signer),
                symbol = %key.1,
                timestamp = report.timestamp,
                "report stored"
            );
            self.reports.insert(
                key,
                ReportedPrice {
                    price: report.value,
                    timestamp: report.timestamp,
                },
            );
        } else {
            tracing::debug!(
                signer = %fmt_address(&signer),
                symbol = %key.1,
                timestamp = report.timestamp,
                "report ignored: not newer or too far ahead"
            );
        }
        Ok(signer)
    }

    fn get(&self, origin: &Address, symbol: &str) -> Option<ReportedPrice> {
        self.reports.get(&(*origin, symbol.to_string())).copied()
    }
}
