//! The price oracle facade.
//!
//! [`PriceOracle`] owns every piece of oracle state: the config registry, the
//! anchor windows, the official prices and the reporter breaker. All state
//! changes go through its methods, one at a time; callers get copies back.
//!
//! ## Write paths
//!
//! - [`PriceOracle::post_prices`] stores signed reports, then validates the
//!   configured reporter's prices against their anchors.
//! - [`PriceOracle::refresh_twap_prices`] stores anchor prices for
//!   anchor-only assets.
//! - [`PriceOracle::invalidate_reporter`] trips the breaker for good.
//!
//! ## Read paths
//!
//! - [`PriceOracle::price`] and [`PriceOracle::price_by_asset`] return the
//!   official price of a symbol or an asset.
//! - [`PriceOracle::price_for_consumer`] resolves a wrapper and rescales
//!   for consumers.

use std::collections::HashMap;
use std::sync::Arc;

use anchorview_crypto::blake3::symbol_hash;
use anchorview_types::events::{OracleEvent, UpdateOrigin};
use anchorview_types::report::{ReportedPrice, ROTATE_MESSAGE};
use anchorview_types::token::{AnchorKind, PriceSource, TokenConfig, TokenConfigEntry};
use anchorview_types::{fmt_address, Address, BASE_ASSET, CONSUMER_PAR_PRICE, ONE_HUNDRED_PERCENT};
use ethnum::U256;
use tracing::{info, warn};

use crate::anchor::{compute_anchor_price, AnchorContext, AnchorPrice};
use crate::circuit_breaker::{ReporterBreaker, StalenessGuard};
use crate::config::OracleConfig;
use crate::denomination::{base_to_quote, consumer_price};
use crate::directory::AssetDirectory;
use crate::market::{current_cumulative_price, MarketSource};
use crate::registry::{validate_entry, ConfigRegistry, Registration};
use crate::reporter::{ObservationStore, SignatureRecovery};
use crate::twap::{Window, WindowAccumulator};
use crate::{OracleError, Result};

/// External collaborators injected at construction.
pub struct Capabilities {
    pub market: Arc<dyn MarketSource>,
    pub store: Box<dyn ObservationStore>,
    pub recovery: Arc<dyn SignatureRecovery>,
    pub directory: Arc<dyn AssetDirectory>,
}

/// Last validated price of an asset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OfficialPrice {
    pub price: u128,
    pub timestamp: u64,
}

/// Inclusive bounds on `anchor / reported`, as 18-decimal mantissas.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnchorBounds {
    lower: u128,
    upper: u128,
}

impl AnchorBounds {
    /// `100% ± tolerance`. The upper bound saturates and the lower bound
    /// never drops below 1.
    pub fn from_tolerance(tolerance: u128) -> Self {
        let upper = ONE_HUNDRED_PERCENT.saturating_add(tolerance);
        let lower = if tolerance < ONE_HUNDRED_PERCENT {
            ONE_HUNDRED_PERCENT - tolerance
        } else {
            1
        };
        Self { lower, upper }
    }

    pub fn lower(&self) -> u128 {
        self.lower
    }

    pub fn upper(&self) -> u128 {
        self.upper
    }

    /// Whether `reported` lies close enough to `anchor`.
    pub fn contains(&self, reported: u128, anchor: u128) -> bool {
        if reported == 0 {
            return false;
        }
        // u128 × 1e18 always fits 256 bits.
        let ratio = U256::new(anchor) * U256::new(ONE_HUNDRED_PERCENT) / U256::new(reported);
        ratio >= U256::new(self.lower) && ratio <= U256::new(self.upper)
    }
}

/// Point-in-time summary of oracle settings and state.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OracleStatus {
    pub reporter: Address,
    pub admin: Address,
    pub reporter_invalidated: bool,
    pub public_mode: bool,
    pub config_count: usize,
    pub anchor_period: u64,
    pub bounds: AnchorBounds,
    pub max_staleness: Option<u64>,
}

/// Anchored price oracle.
///
/// Windows and official prices belong to the asset, not the symbol: two
/// configs sharing a symbol never share state.
pub struct PriceOracle {
    registry: ConfigRegistry,
    windows: WindowAccumulator,
    prices: HashMap<Address, OfficialPrice>,
    breaker: ReporterBreaker,
    bounds: AnchorBounds,
    staleness: StalenessGuard,
    reporter: Address,
    admin: Address,
    public_mode: bool,
    base_asset_at_par: bool,
    market: Arc<dyn MarketSource>,
    store: Box<dyn ObservationStore>,
    recovery: Arc<dyn SignatureRecovery>,
    directory: Arc<dyn AssetDirectory>,
    events: Vec<OracleEvent>,
}

impl PriceOracle {
    /// Build an oracle and register the configured tokens.
    ///
    /// Initial tokens are trusted as given; public-mode checks apply only to
    /// later registrations.
    ///
    /// # Errors
    ///
    /// - [`OracleError::InvalidConfig`] if a token entry or the window period
    ///   is invalid
    /// - [`OracleError::Conflict`] if two tokens collide
    /// - [`OracleError::Market`] if an anchor market cannot be seeded
    pub fn new(config: &OracleConfig, capabilities: Capabilities, now: u64) -> Result<Self> {
        let mut oracle = Self {
            registry: ConfigRegistry::new(config.registry_policy()),
            windows: WindowAccumulator::new(config.anchor_period)?,
            prices: HashMap::new(),
            breaker: ReporterBreaker::new(),
            bounds: AnchorBounds::from_tolerance(config.anchor_tolerance),
            staleness: StalenessGuard::new(config.max_staleness),
            reporter: config.reporter,
            admin: config.admin,
            public_mode: config.public_mode,
            base_asset_at_par: config.base_asset_at_par,
            market: capabilities.market,
            store: capabilities.store,
            recovery: capabilities.recovery,
            directory: capabilities.directory,
            events: Vec::new(),
        };

        let configs = config
            .tokens
            .iter()
            .map(validate_entry)
            .collect::<Result<Vec<_>>>()?;
        oracle.apply_registration(configs, now)?;

        info!(
            reporter = %fmt_address(&oracle.reporter),
            tokens = oracle.registry.len(),
            anchor_period = config.anchor_period,
            "price oracle initialized"
        );
        Ok(oracle)
    }

    // ------------------------------------------------------------------
    // Administration
    // ------------------------------------------------------------------

    /// Register or replace token configs as one batch.
    ///
    /// Only the admin may register unless the oracle is public, in which case
    /// anyone may, but every entry must match the asset directory.
    ///
    /// # Errors
    ///
    /// - [`OracleError::Unauthorized`] if `caller` is not the admin of a
    ///   private oracle
    /// - [`OracleError::InvalidConfig`] if an entry is invalid
    /// - [`OracleError::Conflict`] if the registry policy refuses an entry
    /// - [`OracleError::Market`] if a new anchor cannot be seeded
    pub fn register_configs(
        &mut self,
        caller: &Address,
        entries: &[TokenConfigEntry],
        now: u64,
    ) -> Result<Vec<Registration>> {
        if !self.public_mode && *caller != self.admin {
            return Err(OracleError::Unauthorized(format!(
                "{} is not the admin",
                fmt_address(caller)
            )));
        }
        let configs = entries
            .iter()
            .map(validate_entry)
            .collect::<Result<Vec<_>>>()?;
        if self.public_mode {
            for config in &configs {
                self.check_public(config)?;
            }
        }
        self.apply_registration(configs, now)
    }

    /// Hand the admin role to `new_admin`.
    pub fn change_admin(&mut self, caller: &Address, new_admin: Address) -> Result<()> {
        if *caller != self.admin {
            return Err(OracleError::Unauthorized(format!(
                "{} is not the admin",
                fmt_address(caller)
            )));
        }
        let old_admin = std::mem::replace(&mut self.admin, new_admin);
        info!(
            old_admin = %fmt_address(&old_admin),
            new_admin = %fmt_address(&new_admin),
            "admin changed"
        );
        self.events.push(OracleEvent::AdminChanged { old_admin, new_admin });
        Ok(())
    }

    fn apply_registration(&mut self, configs: Vec<TokenConfig>, now: u64) -> Result<Vec<Registration>> {
        // Read every market before touching any state.
        let mut seeds = Vec::new();
        for config in &configs {
            if let Some(anchor) = config.source.anchor() {
                if anchor.kind == AnchorKind::Cumulative {
                    let snapshot = self.market.snapshot(&anchor.market)?;
                    let acc = current_cumulative_price(&snapshot, anchor.reversed, now);
                    seeds.push((config.asset, acc));
                }
            }
        }
        let summaries: Vec<(String, Address)> = configs
            .iter()
            .map(|c| (c.symbol.clone(), c.asset))
            .collect();

        let registrations = self.registry.register(configs)?;

        // A replaced config starts over: no inherited price or window.
        for (registration, (_, asset)) in registrations.iter().zip(&summaries) {
            if registration.replaced {
                self.prices.remove(asset);
                self.windows.remove(asset);
            }
        }
        for (asset, acc) in seeds {
            self.windows.seed(asset, now, acc);
        }
        for (registration, (symbol, asset)) in registrations.iter().zip(summaries) {
            info!(
                index = registration.index,
                symbol = %symbol,
                replaced = registration.replaced,
                "token config registered"
            );
            self.events.push(OracleEvent::ConfigRegistered {
                index: registration.index,
                symbol,
                asset,
                replaced: registration.replaced,
            });
        }
        Ok(registrations)
    }

    fn check_public(&self, config: &TokenConfig) -> Result<()> {
        let invalid = |reason: &str| OracleError::InvalidConfig(format!("{}: {reason}", config.symbol));

        let anchor = config
            .source
            .anchor()
            .ok_or_else(|| invalid("fixed prices cannot be registered publicly"))?;

        let symbol = self
            .directory
            .symbol(&config.asset)
            .ok_or_else(|| invalid("unknown asset"))?;
        if symbol != config.symbol {
            return Err(invalid("symbol does not match the asset"));
        }
        let decimals = self
            .directory
            .decimals(&config.asset)
            .ok_or_else(|| invalid("unknown asset decimals"))?;
        let unit = 10u128
            .checked_pow(u32::from(decimals))
            .ok_or_else(|| invalid("asset decimals out of range"))?;
        if unit != config.base_unit {
            return Err(invalid("base unit does not match the asset's decimals"));
        }

        let (token0, token1) = self
            .directory
            .market_pair(&anchor.market)
            .ok_or_else(|| invalid("unknown anchor market"))?;
        if token0 != config.asset && token1 != config.asset {
            return Err(invalid("anchor market does not trade the asset"));
        }
        if !config.is_base_asset() {
            let counter = if token0 == config.asset { token1 } else { token0 };
            if counter != BASE_ASSET {
                return Err(invalid("anchor market must pair the asset with the base asset"));
            }
        }
        if anchor.reversed != (token1 == config.asset) {
            return Err(invalid("anchor direction does not match the market's token order"));
        }

        if let Some(wrapper) = &config.wrapper {
            if self.directory.underlying(wrapper) != Some(config.asset) {
                return Err(invalid("wrapper does not wrap the asset"));
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Write paths
    // ------------------------------------------------------------------

    /// Store signed reports, then validate the reporter's prices for
    /// `symbols` against their anchors.
    ///
    /// Reports are stored whoever signed them. Only the configured
    /// reporter's latest report is read back for validation; a symbol it
    /// never reported is validated as price zero and therefore guarded.
    /// Every report is decoded and its signer recovered before any is
    /// stored, so one malformed report stores none of them.
    ///
    /// # Errors
    ///
    /// - [`OracleError::Report`] if `messages` and `signatures` differ in
    ///   length or a report is malformed
    /// - [`OracleError::NotFound`] if a symbol or the base asset has no config
    /// - [`OracleError::InvalidPriceSource`] if a symbol is not
    ///   reporter-priced
    /// - anchor errors from [`compute_anchor_price`]
    ///
    /// A failure while validating leaves official prices and windows as
    /// they were.
    pub fn post_prices(
        &mut self,
        messages: &[Vec<u8>],
        signatures: &[Vec<u8>],
        symbols: &[String],
        now: u64,
    ) -> Result<()> {
        if messages.len() != signatures.len() {
            return Err(OracleError::Report(format!(
                "{} messages but {} signatures",
                messages.len(),
                signatures.len()
            )));
        }
        for (message, signature) in messages.iter().zip(signatures) {
            self.store.check(message, signature)?;
        }
        for (message, signature) in messages.iter().zip(signatures) {
            self.store.put(message, signature, now)?;
        }
        if symbols.is_empty() {
            return Ok(());
        }

        self.transact(|oracle| {
            let base = oracle.base_anchor(now)?;
            let mut anchors = HashMap::new();
            for symbol in symbols {
                let config = oracle.registry.get_by_symbol(&symbol_hash(symbol))?.clone();
                if !matches!(config.source, PriceSource::Reporter { .. }) {
                    return Err(OracleError::InvalidPriceSource {
                        symbol: config.symbol,
                        reason: "only reporter prices get posted",
                    });
                }
                let reported = oracle
                    .store
                    .get(&oracle.reporter, &config.symbol)
                    .unwrap_or_default();
                let anchor = oracle.anchor_for(&config, &base, now, &mut anchors)?;
                oracle.settle(&config, reported, anchor);
            }
            Ok(())
        })
    }

    /// Store the anchor price of each anchor-only asset in `symbols`.
    ///
    /// # Errors
    ///
    /// - [`OracleError::NotFound`] if a symbol or the base asset has no config
    /// - [`OracleError::InvalidPriceSource`] if a symbol is not anchor-priced
    /// - anchor errors from [`compute_anchor_price`]
    pub fn refresh_twap_prices(&mut self, symbols: &[String], now: u64) -> Result<()> {
        if symbols.is_empty() {
            return Ok(());
        }
        self.transact(|oracle| {
            let base = oracle.base_anchor(now)?;
            let mut anchors = HashMap::new();
            for symbol in symbols {
                let config = oracle.registry.get_by_symbol(&symbol_hash(symbol))?.clone();
                if !matches!(config.source, PriceSource::Twap { .. }) {
                    return Err(OracleError::InvalidPriceSource {
                        symbol: config.symbol,
                        reason: "only anchor-sourced prices get refreshed",
                    });
                }
                let anchor = oracle.anchor_for(&config, &base, now, &mut anchors)?;
                oracle.store_price(&config, anchor.price, now, UpdateOrigin::Anchor);
            }
            Ok(())
        })
    }

    /// Trip the breaker with the reporter's signed `"rotate"` message.
    ///
    /// # Errors
    ///
    /// - [`OracleError::Unauthorized`] unless the message is the rotate
    ///   message and was signed by the configured reporter
    pub fn invalidate_reporter(&mut self, message: &[u8], signature: &[u8]) -> Result<()> {
        let signer = self
            .recovery
            .recover(message, signature)
            .map_err(|e| OracleError::Unauthorized(format!("invalidation not signed: {e}")))?;
        let is_rotate = serde_json::from_slice::<String>(message).is_ok_and(|m| m == ROTATE_MESSAGE);
        if !is_rotate {
            return Err(OracleError::Unauthorized("invalidation message must be rotate".to_string()));
        }
        if signer != self.reporter {
            return Err(OracleError::Unauthorized(format!(
                "invalidation signed by {}, not the reporter",
                fmt_address(&signer)
            )));
        }

        self.breaker.trip();
        self.events.push(OracleEvent::ReporterInvalidated {
            reporter: self.reporter,
        });
        Ok(())
    }

    /// Run `f`, restoring windows, prices and events if it fails.
    fn transact<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let windows = self.windows.clone();
        let prices = self.prices.clone();
        let events = self.events.len();
        let result = f(self);
        if result.is_err() {
            self.windows = windows;
            self.prices = prices;
            self.events.truncate(events);
        }
        result
    }

    /// Base/quote rate and the base asset's config.
    fn base_anchor(&mut self, now: u64) -> Result<(TokenConfig, AnchorPrice)> {
        let base = self.registry.get_by_asset(&BASE_ASSET)?.clone();
        let anchor = match base.source {
            PriceSource::FixedBase { price } => AnchorPrice {
                price,
                window_start: now,
                midpoint: now,
            },
            PriceSource::FixedQuote { .. } => {
                return Err(OracleError::InvalidPriceSource {
                    symbol: base.symbol,
                    reason: "the base asset cannot be priced in itself",
                })
            }
            PriceSource::Reporter { .. } | PriceSource::Twap { .. } => {
                self.compute_anchor(&base, now, base.base_unit, base.base_unit)?
            }
        };
        Ok((base, anchor))
    }

    /// Anchor of `config`, computed at most once per call.
    fn anchor_for(
        &mut self,
        config: &TokenConfig,
        base: &(TokenConfig, AnchorPrice),
        now: u64,
        anchors: &mut HashMap<Address, AnchorPrice>,
    ) -> Result<AnchorPrice> {
        let (base_config, base_anchor) = base;
        if config.is_base_asset() {
            return Ok(*base_anchor);
        }
        if let Some(anchor) = anchors.get(&config.asset) {
            return Ok(*anchor);
        }
        let anchor = self.compute_anchor(config, now, base_anchor.price, base_config.base_unit)?;
        anchors.insert(config.asset, anchor);
        Ok(anchor)
    }

    fn compute_anchor(
        &mut self,
        config: &TokenConfig,
        now: u64,
        conversion_factor: u128,
        base_asset_base_unit: u128,
    ) -> Result<AnchorPrice> {
        let mut ctx = AnchorContext {
            windows: &mut self.windows,
            market: self.market.as_ref(),
            events: &mut self.events,
        };
        compute_anchor_price(&mut ctx, config, now, conversion_factor, base_asset_base_unit)
    }

    /// Decide between the reported price, the anchor, and nothing.
    fn settle(&mut self, config: &TokenConfig, reported: ReportedPrice, anchor: AnchorPrice) {
        if self.breaker.is_tripped() {
            self.store_price(config, anchor.price, anchor.midpoint, UpdateOrigin::Anchor);
        } else if self.bounds.contains(u128::from(reported.price), anchor.price) {
            self.store_price(
                config,
                u128::from(reported.price),
                reported.timestamp,
                UpdateOrigin::Reporter,
            );
        } else {
            warn!(
                symbol = %config.symbol,
                reported = reported.price,
                anchor = anchor.price,
                "reported price outside anchor bounds"
            );
            self.events.push(OracleEvent::PriceGuarded {
                symbol: config.symbol.clone(),
                reporter: u128::from(reported.price),
                anchor: anchor.price,
            });
        }
    }

    fn store_price(&mut self, config: &TokenConfig, price: u128, timestamp: u64, origin: UpdateOrigin) {
        self.prices
            .insert(config.asset, OfficialPrice { price, timestamp });
        info!(symbol = %config.symbol, price, timestamp, ?origin, "price updated");
        self.events.push(OracleEvent::PriceUpdated {
            symbol: config.symbol.clone(),
            price,
            timestamp,
            origin,
        });
    }

    // ------------------------------------------------------------------
    // Read paths
    // ------------------------------------------------------------------

    /// Official price of `symbol` in the quote denomination.
    ///
    /// # Errors
    ///
    /// - [`OracleError::NotFound`] if the symbol has no config
    /// - [`OracleError::StaleOrMissing`] if no price has been stored yet
    /// - [`OracleError::Stale`] if the stored price is too old
    pub fn price(&self, symbol: &str, now: u64) -> Result<u128> {
        let config = self.registry.get_by_symbol(&symbol_hash(symbol))?;
        self.config_price(config, now)
    }

    /// Official price of `asset`, falling back to the asset it wraps.
    ///
    /// # Errors
    ///
    /// As [`PriceOracle::price`].
    pub fn price_by_asset(&self, asset: &Address, now: u64) -> Result<u128> {
        let config = match self.registry.get_by_asset(asset) {
            Ok(config) => config,
            Err(_) => self.registry.get_by_wrapper(asset, self.directory.as_ref())?,
        };
        self.config_price(config, now)
    }

    /// Official price of the config's asset.
    pub fn config_price(&self, config: &TokenConfig, now: u64) -> Result<u128> {
        match &config.source {
            PriceSource::FixedBase { price } => Ok(*price),
            PriceSource::FixedQuote { price } => {
                let (base_price, base_unit) = self.base_price(now)?;
                base_to_quote(*price, base_price, base_unit)
            }
            PriceSource::Reporter { .. } | PriceSource::Twap { .. } => self.stored_price(config, now),
        }
    }

    /// Price for consumers holding `wrapper`, scaled to
    /// `price * 1e30 / base_unit`.
    ///
    /// # Errors
    ///
    /// - [`OracleError::NotFound`] if the wrapper resolves to no config
    /// - read errors from [`PriceOracle::price`]
    /// - [`OracleError::ArithmeticOverflow`] if rescaling overflows
    pub fn price_for_consumer(&self, wrapper: &Address, now: u64) -> Result<u128> {
        let config = self.registry.get_by_wrapper(wrapper, self.directory.as_ref())?;
        if config.is_base_asset() && self.base_asset_at_par {
            return Ok(CONSUMER_PAR_PRICE);
        }
        let price = self.config_price(config, now)?;
        consumer_price(price, config.base_unit)
    }

    fn stored_price(&self, config: &TokenConfig, now: u64) -> Result<u128> {
        let stored = self
            .prices
            .get(&config.asset)
            .ok_or_else(|| OracleError::StaleOrMissing(format!("no price for {}", config.symbol)))?;
        self.staleness.check(stored.timestamp, now)?;
        Ok(stored.price)
    }

    fn base_price(&self, now: u64) -> Result<(u128, u128)> {
        let base = self
            .registry
            .get_by_asset(&BASE_ASSET)
            .map_err(|_| OracleError::StaleOrMissing("no base asset config".to_string()))?;
        let price = match &base.source {
            PriceSource::FixedBase { price } => *price,
            PriceSource::FixedQuote { .. } => {
                return Err(OracleError::InvalidPriceSource {
                    symbol: base.symbol.clone(),
                    reason: "the base asset cannot be priced in itself",
                })
            }
            PriceSource::Reporter { .. } | PriceSource::Twap { .. } => self.stored_price(base, now)?,
        };
        Ok((price, base.base_unit))
    }

    /// Whether `reported` is within the configured tolerance of `anchor`.
    pub fn is_within_anchor(&self, reported: u128, anchor: u128) -> bool {
        self.bounds.contains(reported, anchor)
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn token_config(&self, index: usize) -> Result<TokenConfig> {
        self.registry.get(index).cloned()
    }

    pub fn token_config_by_asset(&self, asset: &Address) -> Result<TokenConfig> {
        self.registry.get_by_asset(asset).cloned()
    }

    pub fn token_config_by_symbol(&self, symbol: &str) -> Result<TokenConfig> {
        self.registry.get_by_symbol(&symbol_hash(symbol)).cloned()
    }

    pub fn token_config_by_wrapper(&self, wrapper: &Address) -> Result<TokenConfig> {
        self.registry
            .get_by_wrapper(wrapper, self.directory.as_ref())
            .cloned()
    }

    /// Stored price of the asset currently registered under `symbol`.
    pub fn official_price(&self, symbol: &str) -> Option<OfficialPrice> {
        let config = self.registry.get_by_symbol(&symbol_hash(symbol)).ok()?;
        self.prices.get(&config.asset).copied()
    }

    pub fn official_price_by_asset(&self, asset: &Address) -> Option<OfficialPrice> {
        self.prices.get(asset).copied()
    }

    /// Anchor window of the asset currently registered under `symbol`.
    pub fn window(&self, symbol: &str) -> Option<Window> {
        let config = self.registry.get_by_symbol(&symbol_hash(symbol)).ok()?;
        self.windows.window(&config.asset)
    }

    pub fn window_by_asset(&self, asset: &Address) -> Option<Window> {
        self.windows.window(asset)
    }

    pub fn reporter(&self) -> Address {
        self.reporter
    }

    pub fn admin(&self) -> Address {
        self.admin
    }

    pub fn reporter_invalidated(&self) -> bool {
        self.breaker.is_tripped()
    }

    pub fn status(&self) -> OracleStatus {
        OracleStatus {
            reporter: self.reporter,
            admin: self.admin,
            reporter_invalidated: self.breaker.is_tripped(),
            public_mode: self.public_mode,
            config_count: self.registry.len(),
            anchor_period: self.windows.period(),
            bounds: self.bounds,
            max_staleness: self.staleness.threshold(),
        }
    }

    /// Drain the events emitted since the last call.
    pub fn take_events(&mut self) -> Vec<OracleEvent> {
        std::mem::take(&mut self.events)
    }
}
