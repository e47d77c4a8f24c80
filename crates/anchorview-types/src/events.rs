//! Events emitted by the oracle core.
//!
//! The core appends events to its log as operations complete; the daemon
//! drains the log and forwards events to subscribers.

use serde::{Deserialize, Serialize};
use serde_with::serde_as;

use crate::Address;

/// Which value an official price update stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateOrigin {
    /// The reporter's price, accepted within the anchor band.
    Reporter,
    /// The anchor price, substituted because the reporter is invalidated
    /// or the asset is anchor-priced.
    Anchor,
}

/// All oracle events.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "event")]
pub enum OracleEvent {
    PriceUpdated {
        symbol: String,
        #[serde_as(as = "serde_with::DisplayFromStr")]
        price: u128,
        timestamp: u64,
        origin: UpdateOrigin,
    },
    /// Reported price fell outside the anchor band and was not stored.
    PriceGuarded {
        symbol: String,
        #[serde_as(as = "serde_with::DisplayFromStr")]
        reporter: u128,
        #[serde_as(as = "serde_with::DisplayFromStr")]
        anchor: u128,
    },
    AnchorPriceUpdated {
        symbol: String,
        #[serde_as(as = "serde_with::DisplayFromStr")]
        anchor_price: u128,
        window_start: u64,
        now: u64,
    },
    WindowUpdated {
        #[serde_as(as = "serde_with::hex::Hex")]
        asset: Address,
        old_timestamp: u64,
        new_timestamp: u64,
    },
    ReporterInvalidated {
        #[serde_as(as = "serde_with::hex::Hex")]
        reporter: Address,
    },
    ConfigRegistered {
        index: usize,
        symbol: String,
        #[serde_as(as = "serde_with::hex::Hex")]
        asset: Address,
        replaced: bool,
    },
    AdminChanged {
        #[serde_as(as = "serde_with::hex::Hex")]
        old_admin: Address,
        #[serde_as(as = "serde_with::hex::Hex")]
        new_admin: Address,
    },
}

impl OracleEvent {
    /// Event name as used on the wire.
    pub fn name(&self) -> &'static str {
        match self {
            OracleEvent::PriceUpdated { .. } => "PriceUpdated",
            OracleEvent::PriceGuarded { .. } => "PriceGuarded",
            OracleEvent::AnchorPriceUpdated { .. } => "AnchorPriceUpdated",
            OracleEvent::WindowUpdated { .. } => "WindowUpdated",
            OracleEvent::ReporterInvalidated { .. } => "ReporterInvalidated",
            OracleEvent::ConfigRegistered { .. } => "ConfigRegistered",
            OracleEvent::AdminChanged { .. } => "AdminChanged",
        }
    }
}
