//! Integration test fixtures for the anchorview oracle.
//!
//! The scenarios under `tests/` drive a [`PriceOracle`] wired to in-memory
//! collaborators: an [`InMemoryMarket`] the test moves by hand, a
//! [`SignedPriceStore`] fed with Ed25519 reports and a [`StaticDirectory`].
//!
//! Run all integration tests:
//! ```sh
//! cargo test -p anchorview-integration-tests
//! ```
//!
//! Market fixtures:
//!
//! | Market | token0 | token1 | Reserves | Price |
//! |---|---|---|---|---|
//! | `ETH_MARKET` | ETH | USDC | 1000 ETH / 2,000,000 USDC | $2000 |
//! | `BTC_MARKET` | BTC | ETH | 100 BTC / 2000 ETH | 20 ETH |

use std::sync::Arc;

use anchorview_crypto::ed25519::KeyPair;
use anchorview_oracle::config::OracleConfig;
use anchorview_oracle::directory::StaticDirectory;
use anchorview_oracle::fixed_point::Accumulator;
use anchorview_oracle::market::{InMemoryMarket, MarketSnapshot};
use anchorview_oracle::reporter::{Ed25519Recovery, SignedPriceStore};
use anchorview_oracle::{Capabilities, PriceOracle, Result};
use anchorview_types::events::OracleEvent;
use anchorview_types::report::PriceMessage;
use anchorview_types::token::{AnchorKind, PriceSourceKind, TokenConfigEntry};
use anchorview_types::{Address, BASE_ASSET};

/// Simulated start time for deterministic testing.
pub const START: u64 = 1_700_000_000;
pub const PERIOD: u64 = 30 * 60;

pub const ETH_UNIT: u128 = 1_000_000_000_000_000_000;
pub const BTC_UNIT: u128 = 100_000_000;
pub const USDC_UNIT: u128 = 1_000_000;

pub const BTC: Address = [0xb1; 20];
pub const USDC: Address = [0xc1; 20];
pub const ETH_WRAPPER: Address = [0xe2; 20];
pub const BTC_WRAPPER: Address = [0xb2; 20];
pub const ETH_MARKET: Address = [0x01; 20];
pub const BTC_MARKET: Address = [0x02; 20];

/// $2000 at six decimals.
pub const ETH_PRICE: u128 = 2_000_000_000;
/// $40,000 at six decimals: 20 ETH at [`ETH_PRICE`].
pub const BTC_ANCHOR: u128 = 40_000_000_000;

/// An oracle with its collaborators and keys.
pub struct Harness {
    pub oracle: PriceOracle,
    pub market: Arc<InMemoryMarket>,
    pub directory: Arc<StaticDirectory>,
    pub reporter: KeyPair,
    pub admin: KeyPair,
}

impl Harness {
    /// Build the oracle over [`fixture_market`] from `tokens`, with
    /// `configure` applied to the default settings.
    pub fn new(tokens: Vec<TokenConfigEntry>, configure: impl FnOnce(&mut OracleConfig)) -> Result<Self> {
        Self::with_market(fixture_market()?, tokens, configure)
    }

    /// Like [`Harness::new`] over a caller-prepared market table.
    pub fn with_market(
        market: Arc<InMemoryMarket>,
        tokens: Vec<TokenConfigEntry>,
        configure: impl FnOnce(&mut OracleConfig),
    ) -> Result<Self> {
        let reporter = KeyPair::generate();
        let admin = KeyPair::generate();

        let directory = Arc::new(
            StaticDirectory::new()
                .with_asset(BASE_ASSET, "ETH", 18)
                .with_asset(BTC, "BTC", 8)
                .with_asset(USDC, "USDC", 6)
                .with_market(ETH_MARKET, BASE_ASSET, USDC)
                .with_market(BTC_MARKET, BTC, BASE_ASSET)
                .with_wrapper(ETH_WRAPPER, BASE_ASSET)
                .with_wrapper(BTC_WRAPPER, BTC),
        );

        let mut config = OracleConfig::new(reporter.address(), admin.address());
        config.anchor_period = PERIOD;
        config.tokens = tokens;
        configure(&mut config);

        let recovery = Arc::new(Ed25519Recovery);
        let mut oracle = PriceOracle::new(
            &config,
            Capabilities {
                market: market.clone(),
                store: Box::new(SignedPriceStore::new(recovery.clone())),
                recovery,
                directory: directory.clone(),
            },
            START,
        )?;
        // Registration events are not part of any scenario.
        oracle.take_events();

        Ok(Self {
            oracle,
            market,
            directory,
            reporter,
            admin,
        })
    }

    /// A report signed by the configured reporter.
    pub fn report(&self, timestamp: u64, symbol: &str, price: u64) -> (Vec<u8>, Vec<u8>) {
        signed_report(&self.reporter, timestamp, symbol, price)
    }

    /// Post one report per `(symbol, price)` at `now` and validate them all.
    pub fn post(&mut self, now: u64, prices: &[(&str, u64)]) -> Result<Vec<OracleEvent>> {
        let mut messages = Vec::new();
        let mut signatures = Vec::new();
        for (symbol, price) in prices {
            let (message, signature) = self.report(now, symbol, *price);
            messages.push(message);
            signatures.push(signature);
        }
        let symbols: Vec<String> = prices.iter().map(|(s, _)| s.to_string()).collect();
        self.oracle.post_prices(&messages, &signatures, &symbols, now)?;
        Ok(self.oracle.take_events())
    }
}

/// Both fixture markets, last written at [`START`].
pub fn fixture_market() -> Result<Arc<InMemoryMarket>> {
    let market = Arc::new(InMemoryMarket::new());
    market.set_snapshot(ETH_MARKET, snapshot(1_000 * ETH_UNIT, 2_000_000 * USDC_UNIT, START))?;
    market.set_snapshot(BTC_MARKET, snapshot(100 * BTC_UNIT, 2_000 * ETH_UNIT, START))?;
    Ok(market)
}

pub fn snapshot(reserve0: u128, reserve1: u128, last_update: u64) -> MarketSnapshot {
    MarketSnapshot {
        cumulative0: Accumulator::ZERO,
        cumulative1: Accumulator::ZERO,
        reserve0,
        reserve1,
        last_update,
    }
}

pub fn signed_report(signer: &KeyPair, timestamp: u64, symbol: &str, price: u64) -> (Vec<u8>, Vec<u8>) {
    let message = PriceMessage::prices(timestamp, symbol, price).encode();
    let signature = signer.signing_key.sign_report(&message).to_bytes().to_vec();
    (message, signature)
}

/// ETH priced by the reporter, anchored to the ETH/USDC market.
pub fn eth_reporter() -> TokenConfigEntry {
    TokenConfigEntry {
        asset: BASE_ASSET,
        wrapper: Some(ETH_WRAPPER),
        symbol: "ETH".to_string(),
        base_unit: ETH_UNIT,
        price_source: PriceSourceKind::Reporter,
        fixed_price: 0,
        anchor_market: Some(ETH_MARKET),
        anchor_reversed: false,
        anchor_kind: AnchorKind::Cumulative,
    }
}

/// ETH at a constant quote price.
pub fn eth_fixed(price: u128) -> TokenConfigEntry {
    TokenConfigEntry {
        price_source: PriceSourceKind::FixedBase,
        fixed_price: price,
        anchor_market: None,
        ..eth_reporter()
    }
}

/// BTC priced by the reporter, anchored to the BTC/ETH market.
pub fn btc_reporter() -> TokenConfigEntry {
    TokenConfigEntry {
        asset: BTC,
        wrapper: Some(BTC_WRAPPER),
        symbol: "BTC".to_string(),
        base_unit: BTC_UNIT,
        price_source: PriceSourceKind::Reporter,
        fixed_price: 0,
        anchor_market: Some(BTC_MARKET),
        anchor_reversed: false,
        anchor_kind: AnchorKind::Cumulative,
    }
}

/// USDC pinned at $1.
pub fn usdc_fixed() -> TokenConfigEntry {
    TokenConfigEntry {
        asset: USDC,
        wrapper: None,
        symbol: "USDC".to_string(),
        base_unit: USDC_UNIT,
        price_source: PriceSourceKind::FixedBase,
        fixed_price: USDC_UNIT,
        anchor_market: None,
        anchor_reversed: false,
        anchor_kind: AnchorKind::Cumulative,
    }
}

pub fn has_event(events: &[OracleEvent], name: &str) -> bool {
    events.iter().any(|e| e.name() == name)
}
