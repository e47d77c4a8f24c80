//! Token configuration.
//!
//! [`TokenConfig`] is the validated, runtime form: its [`PriceSource`] carries
//! only the fields each source needs. [`TokenConfigEntry`] is the flat form
//! read from config files and RPC requests; it can express invalid
//! combinations and must be validated before registration.

use serde::{Deserialize, Serialize};
use serde_with::serde_as;

use crate::{Address, SymbolHash, BASE_ASSET};

/// How an asset's anchor price is sampled from its market.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnchorKind {
    /// Time-weighted average over the lagging accumulator window.
    #[default]
    Cumulative,
    /// Current reserve ratio. No window state.
    Spot,
}

/// The market an asset is anchored to.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorSpec {
    #[serde_as(as = "serde_with::hex::Hex")]
    pub market: Address,
    /// The asset is the market's token1, so the token1 accumulator applies.
    pub reversed: bool,
    #[serde(default)]
    pub kind: AnchorKind,
}

/// Where an asset's price comes from.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceSource {
    /// Constant price already in the quote denomination.
    FixedBase {
        #[serde_as(as = "serde_with::DisplayFromStr")]
        price: u128,
    },
    /// Constant amount of the base asset, converted at the base asset's price.
    FixedQuote {
        #[serde_as(as = "serde_with::DisplayFromStr")]
        price: u128,
    },
    /// Signed reporter price, accepted only within tolerance of the anchor.
    Reporter { anchor: AnchorSpec },
    /// Anchor price alone.
    Twap { anchor: AnchorSpec },
}

impl PriceSource {
    /// Anchor market, for sources that derive price dynamically.
    pub fn anchor(&self) -> Option<&AnchorSpec> {
        match self {
            PriceSource::Reporter { anchor } | PriceSource::Twap { anchor } => Some(anchor),
            PriceSource::FixedBase { .. } | PriceSource::FixedQuote { .. } => None,
        }
    }

    /// Flat kind of this source.
    pub fn kind(&self) -> PriceSourceKind {
        match self {
            PriceSource::FixedBase { .. } => PriceSourceKind::FixedBase,
            PriceSource::FixedQuote { .. } => PriceSourceKind::FixedQuote,
            PriceSource::Reporter { .. } => PriceSourceKind::Reporter,
            PriceSource::Twap { .. } => PriceSourceKind::Twap,
        }
    }
}

/// Flat price-source discriminant used by [`TokenConfigEntry`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceSourceKind {
    FixedBase,
    FixedQuote,
    Reporter,
    Twap,
}

impl PriceSourceKind {
    /// Whether this source needs an anchor market.
    pub fn requires_anchor(self) -> bool {
        matches!(self, PriceSourceKind::Reporter | PriceSourceKind::Twap)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PriceSourceKind::FixedBase => "fixed_base",
            PriceSourceKind::FixedQuote => "fixed_quote",
            PriceSourceKind::Reporter => "reporter",
            PriceSourceKind::Twap => "twap",
        }
    }
}

impl std::fmt::Display for PriceSourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validated pricing metadata for one asset.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenConfig {
    #[serde_as(as = "serde_with::hex::Hex")]
    pub asset: Address,
    #[serde_as(as = "Option<serde_with::hex::Hex>")]
    pub wrapper: Option<Address>,
    pub symbol: String,
    #[serde_as(as = "serde_with::hex::Hex")]
    pub symbol_hash: SymbolHash,
    /// `10^decimals` of the asset.
    #[serde_as(as = "serde_with::DisplayFromStr")]
    pub base_unit: u128,
    pub source: PriceSource,
}

impl TokenConfig {
    /// Whether this config describes the base asset.
    pub fn is_base_asset(&self) -> bool {
        self.asset == BASE_ASSET
    }
}

/// Flat token configuration as written in config files.
///
/// Integers wider than 64 bits are written as decimal strings.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenConfigEntry {
    #[serde_as(as = "serde_with::hex::Hex")]
    pub asset: Address,
    #[serde_as(as = "Option<serde_with::hex::Hex>")]
    pub wrapper: Option<Address>,
    pub symbol: String,
    #[serde_as(as = "serde_with::DisplayFromStr")]
    pub base_unit: u128,
    pub price_source: PriceSourceKind,
    #[serde_as(as = "serde_with::DisplayFromStr")]
    #[serde(default)]
    pub fixed_price: u128,
    #[serde_as(as = "Option<serde_with::hex::Hex>")]
    pub anchor_market: Option<Address>,
    #[serde(default)]
    pub anchor_reversed: bool,
    #[serde(default)]
    pub anchor_kind: AnchorKind,
}

impl From<&TokenConfig> for TokenConfigEntry {
    fn from(config: &TokenConfig) -> Self {
        let (fixed_price, anchor) = match &config.source {
            PriceSource::FixedBase { price } | PriceSource::FixedQuote { price } => (*price, None),
            PriceSource::Reporter { anchor } | PriceSource::Twap { anchor } => (0, Some(anchor)),
        };
        Self {
            asset: config.asset,
            wrapper: config.wrapper,
            symbol: config.symbol.clone(),
            base_unit: config.base_unit,
            price_source: config.source.kind(),
            fixed_price,
            anchor_market: anchor.map(|a| a.market),
            anchor_reversed: anchor.is_some_and(|a| a.reversed),
            anchor_kind: anchor.map(|a| a.kind).unwrap_or_default(),
        }
    }
}
