//! Market accumulator source.
//!
//! A market is a two-token pool exposing one cumulative price per ordering
//! direction: `cumulative0` accumulates the price of token0 in token1 and
//! `cumulative1` the reverse. Pools only write their accumulators when they
//! trade, so [`current_cumulative_price`] extends a stale sample to `now`
//! with the price implied by the current reserves.

use std::collections::HashMap;
use std::sync::RwLock;

use anchorview_types::{fmt_address, Address};

use crate::fixed_point::{Accumulator, Uq112x112};
use crate::{OracleError, Result};

/// One read of a market's state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MarketSnapshot {
    pub cumulative0: Accumulator,
    pub cumulative1: Accumulator,
    pub reserve0: u128,
    pub reserve1: u128,
    /// Timestamp the accumulators were last written at.
    pub last_update: u64,
}

/// Source of market snapshots.
pub trait MarketSource: Send + Sync {
    /// Read the current state of `market`.
    fn snapshot(&self, market: &Address) -> Result<MarketSnapshot>;
}

/// Cumulative price of the anchored asset as of `now`.
///
/// `reversed` selects `cumulative1` (the asset is token1). When the snapshot
/// predates `now` and the asset's own reserve is non-zero, the counterfactual
/// `price × (now - last_update)` is added so the result does not depend on
/// when the pool last traded.
///
/// Reserves are assumed to fit 112 bits, as pool reserves do. An empty own
/// reserve or wider reserves leave the sampled accumulator unextended.
pub fn current_cumulative_price(snapshot: &MarketSnapshot, reversed: bool, now: u64) -> Accumulator {
    let (cumulative, reserve_self, reserve_other) = if reversed {
        (snapshot.cumulative1, snapshot.reserve1, snapshot.reserve0)
    } else {
        (snapshot.cumulative0, snapshot.reserve0, snapshot.reserve1)
    };

    if now <= snapshot.last_update {
        return cumulative;
    }
    match Uq112x112::fraction(reserve_other, reserve_self) {
        Some(price) => cumulative.wrapping_add(price.accumulate(now - snapshot.last_update)),
        None => {
            tracing::debug!(
                reserve_self,
                reserve_other,
                "reserves yield no price; accumulator not extended"
            );
            cumulative
        }
    }
}

/// Spot price of the anchored asset in its counter token.
pub fn spot_price(snapshot: &MarketSnapshot, reversed: bool) -> Result<Uq112x112> {
    let (reserve_self, reserve_other) = if reversed {
        (snapshot.reserve1, snapshot.reserve0)
    } else {
        (snapshot.reserve0, snapshot.reserve1)
    };
    Uq112x112::fraction(reserve_other, reserve_self)
        .ok_or_else(|| OracleError::Market("reserves do not yield a spot price".to_string()))
}

/// In-memory markets, fed by whoever observes the real pools.
#[derive(Debug, Default)]
pub struct InMemoryMarket {
    snapshots: RwLock<HashMap<Address, MarketSnapshot>>,
}

impl InMemoryMarket {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stored snapshot for `market`.
    ///
    /// # Errors
    ///
    /// [`OracleError::Market`] if the market state is poisoned.
    pub fn set_snapshot(&self, market: Address, snapshot: MarketSnapshot) -> Result<()> {
        let mut snapshots = self
            .snapshots
            .write()
            .map_err(|_| OracleError::Market("market state poisoned".to_string()))?;
        snapshots.insert(market, snapshot);
        Ok(())
    }

    /// Advance a market as if it traded at its current reserves until `now`,
    /// then optionally move the reserves.
    pub fn advance(&self, market: &Address, now: u64, reserves: Option<(u128, u128)>) -> Result<()> {
        let mut snapshots = self
            .snapshots
            .write()
            .map_err(|_| OracleError::Market("market state poisoned".to_string()))?;
        let snapshot = snapshots
            .get_mut(market)
            .ok_or_else(|| OracleError::Market(format!("unknown market {}", fmt_address(market))))?;
        snapshot.cumulative0 = current_cumulative_price(snapshot, false, now);
        snapshot.cumulative1 = current_cumulative_price(snapshot, true, now);
        snapshot.last_update = snapshot.last_update.max(now);
        if let Some((reserve0, reserve1)) = reserves {
            snapshot.reserve0 = reserve0;
            snapshot.reserve1 = reserve1;
        }
        Ok(())
    }
}

impl MarketSource for InMemoryMarket {
    fn snapshot(&self, market: &Address) -> Result<MarketSnapshot> {
        let snapshots = self
            .snapshots
            .read()
            .map_err(|_| OracleError::Market("market state poisoned".to_string()))?;
        snapshots
            .get(market)
            .copied()
            .ok_or_else(|| OracleError::Market(format!("unknown market {}", fmt_address(market))))
    }
}
