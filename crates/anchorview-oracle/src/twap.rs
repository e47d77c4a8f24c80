//! Lagging two-observation accumulator window.
//!
//! Each accumulator-anchored asset keeps an `old` and a `new` observation of
//! its market's cumulative price. A poke rolls `new` down to `old` and takes
//! a fresh `new` only once at least one window period has passed since the
//! last roll, so the averaged span `now - old.timestamp` always lies in
//! `[period, 2 * period)` after warm-up:
//!
//! ```text
//!   old ─────────── new ─────── now
//!   |<-- >= period -->|<-- < period -->|
//! ```
//!
//! The TWAP is then `(acc(now) - acc(old)) / (now - old.timestamp)`.

use std::collections::HashMap;

use anchorview_types::events::OracleEvent;
use anchorview_types::token::TokenConfig;
use anchorview_types::Address;

use crate::fixed_point::Accumulator;
use crate::market::{current_cumulative_price, MarketSource};
use crate::{OracleError, Result};

/// One sample of a market accumulator.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Observation {
    pub timestamp: u64,
    pub acc: Accumulator,
}

/// The old/new observation pair of one asset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Window {
    pub old: Observation,
    pub new: Observation,
}

impl Window {
    /// Midpoint of the window, used to timestamp anchor-substituted prices.
    pub fn midpoint(&self) -> u64 {
        self.old.timestamp + (self.new.timestamp - self.old.timestamp) / 2
    }
}

/// Result of a poke.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Poke {
    /// Cumulative price as of `now`.
    pub now_acc: Accumulator,
    /// Start of the window being averaged.
    pub old: Observation,
    /// Whether the window rolled forward.
    pub advanced: bool,
}

/// Windows of every accumulator-anchored asset, keyed by asset.
#[derive(Clone, Debug)]
pub struct WindowAccumulator {
    period: u64,
    windows: HashMap<Address, Window>,
}

impl WindowAccumulator {
    /// Create an accumulator with the given minimum window span in seconds.
    ///
    /// # Errors
    ///
    /// - [`OracleError::InvalidConfig`] if `period` is zero
    pub fn new(period: u64) -> Result<Self> {
        if period == 0 {
            return Err(OracleError::InvalidConfig(
                "anchor window period must be non-zero".to_string(),
            ));
        }
        Ok(Self {
            period,
            windows: HashMap::new(),
        })
    }

    pub fn period(&self) -> u64 {
        self.period
    }

    /// Start a window with both observations at `(now, acc)`.
    ///
    /// Re-seeding an existing window restarts it.
    pub fn seed(&mut self, asset: Address, now: u64, acc: Accumulator) {
        let observation = Observation { timestamp: now, acc };
        self.windows.insert(
            asset,
            Window {
                old: observation,
                new: observation,
            },
        );
    }

    pub fn window(&self, asset: &Address) -> Option<Window> {
        self.windows.get(asset).copied()
    }

    /// Forget the window of `asset`.
    pub fn remove(&mut self, asset: &Address) -> Option<Window> {
        self.windows.remove(asset)
    }

    /// Roll the window of `asset` given the cumulative price at `now`.
    ///
    /// # Errors
    ///
    /// - [`OracleError::NotFound`] if the asset has no window
    pub fn advance(
        &mut self,
        asset: &Address,
        now: u64,
        cumulative: Accumulator,
        events: &mut Vec<OracleEvent>,
    ) -> Result<Poke> {
        let period = self.period;
        let window = self
            .windows
            .get_mut(asset)
            .ok_or_else(|| OracleError::NotFound("no anchor window for asset".to_string()))?;

        let elapsed = now.saturating_sub(window.new.timestamp);
        let advanced = elapsed >= period;
        if advanced {
            window.old = window.new;
            window.new = Observation {
                timestamp: now,
                acc: cumulative,
            };
            tracing::debug!(
                old_timestamp = window.old.timestamp,
                new_timestamp = now,
                "anchor window advanced"
            );
            events.push(OracleEvent::WindowUpdated {
                asset: *asset,
                old_timestamp: window.old.timestamp,
                new_timestamp: now,
            });
        }

        Ok(Poke {
            now_acc: cumulative,
            old: window.old,
            advanced,
        })
    }

    /// Read the config's market and roll its window.
    ///
    /// # Errors
    ///
    /// - [`OracleError::InvalidPriceSource`] if the config has no anchor
    /// - [`OracleError::Market`] if the market cannot be read
    /// - [`OracleError::NotFound`] if the asset has no window
    pub fn poke(
        &mut self,
        market: &dyn MarketSource,
        config: &TokenConfig,
        now: u64,
        events: &mut Vec<OracleEvent>,
    ) -> Result<Poke> {
        let anchor = config.source.anchor().ok_or_else(|| OracleError::InvalidPriceSource {
            symbol: config.symbol.clone(),
            reason: "an anchor market is required",
        })?;
        let snapshot = market.snapshot(&anchor.market)?;
        let cumulative = current_cumulative_price(&snapshot, anchor.reversed, now);
        self.advance(&config.asset, now, cumulative, events)
    }
}
