//! Anchor price strategies and unit conversion.
//!
//! An anchor strategy samples a 112.112 average price of the asset in its
//! market's counter token. The shared scaling step then turns that average
//! into an official-price mantissa:
//!
//! ```text
//! raw    = decode112with18(average)
//! anchor = raw * conversion_factor * base_unit / base_asset_base_unit / 1e18
//! ```
//!
//! For the base asset the conversion factor is its own base unit, giving the
//! base/quote rate. Every other asset is cross-priced with the base anchor as
//! conversion factor.

use anchorview_types::events::OracleEvent;
use anchorview_types::token::{AnchorKind, AnchorSpec, TokenConfig};
use anchorview_types::EXP_SCALE;
use ethnum::U256;

use crate::fixed_point::{checked_mul, narrow, Uq112x112};
use crate::market::{spot_price, MarketSource};
use crate::twap::WindowAccumulator;
use crate::{OracleError, Result};

/// One averaged sample from an anchor market.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnchorSample {
    pub average: Uq112x112,
    /// Start of the averaged span.
    pub window_start: u64,
    /// Timestamp to record when the sample replaces a reporter price.
    pub midpoint: u64,
}

/// A computed anchor price.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AnchorPrice {
    pub price: u128,
    pub window_start: u64,
    pub midpoint: u64,
}

/// State and collaborators an anchor strategy may use.
pub struct AnchorContext<'a> {
    pub windows: &'a mut WindowAccumulator,
    pub market: &'a dyn MarketSource,
    pub events: &'a mut Vec<OracleEvent>,
}

/// Samples an average price from an anchor market.
pub trait AnchorStrategy: Send + Sync {
    fn sample(
        &self,
        ctx: &mut AnchorContext<'_>,
        config: &TokenConfig,
        anchor: &AnchorSpec,
        now: u64,
    ) -> Result<AnchorSample>;
}

/// Time-weighted average over the lagging accumulator window.
#[derive(Debug, Clone, Copy, Default)]
pub struct TwapAnchor;

impl AnchorStrategy for TwapAnchor {
    fn sample(
        &self,
        ctx: &mut AnchorContext<'_>,
        config: &TokenConfig,
        _anchor: &AnchorSpec,
        now: u64,
    ) -> Result<AnchorSample> {
        let poke = ctx.windows.poke(ctx.market, config, now, ctx.events)?;
        if now <= poke.old.timestamp {
            return Err(OracleError::ImpossibleTime {
                now,
                window_start: poke.old.timestamp,
            });
        }
        let average = Uq112x112::average(poke.now_acc, poke.old.acc, now - poke.old.timestamp)?;
        let midpoint = ctx
            .windows
            .window(&config.asset)
            .map_or(now, |window| window.midpoint());
        Ok(AnchorSample {
            average,
            window_start: poke.old.timestamp,
            midpoint,
        })
    }
}

/// Current reserve ratio. Keeps no window state.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpotAnchor;

impl AnchorStrategy for SpotAnchor {
    fn sample(
        &self,
        ctx: &mut AnchorContext<'_>,
        _config: &TokenConfig,
        anchor: &AnchorSpec,
        now: u64,
    ) -> Result<AnchorSample> {
        let snapshot = ctx.market.snapshot(&anchor.market)?;
        Ok(AnchorSample {
            average: spot_price(&snapshot, anchor.reversed)?,
            window_start: now,
            midpoint: now,
        })
    }
}

/// Strategy for an anchor kind.
pub fn strategy_for(kind: AnchorKind) -> &'static dyn AnchorStrategy {
    match kind {
        AnchorKind::Cumulative => &TwapAnchor,
        AnchorKind::Spot => &SpotAnchor,
    }
}

/// Scale a sampled average into an official-price mantissa.
///
/// # Errors
///
/// - [`OracleError::ArithmeticOverflow`] if a product overflows 256 bits,
///   the result does not fit `u128`, or `base_asset_base_unit` is zero
pub fn scale_average(
    average: Uq112x112,
    conversion_factor: u128,
    base_unit: u128,
    base_asset_base_unit: u128,
) -> Result<u128> {
    let raw = average.decode112with18();
    let unscaled = checked_mul(raw, U256::new(conversion_factor), "anchor conversion")?;
    let scaled = checked_mul(unscaled, U256::new(base_unit), "anchor base unit scaling")?;
    let price = scaled
        .checked_div(U256::new(base_asset_base_unit))
        .ok_or(OracleError::ArithmeticOverflow("anchor division by zero base unit"))?
        / U256::new(EXP_SCALE);
    narrow(price, "anchor price")
}

/// Compute the anchor price of `config`.
///
/// # Errors
///
/// - [`OracleError::InvalidPriceSource`] if the config has no anchor market
/// - [`OracleError::ImpossibleTime`] if the window does not precede `now`
/// - [`OracleError::ArithmeticOverflow`] if scaling overflows
/// - [`OracleError::Market`] if the market cannot be read
pub fn compute_anchor_price(
    ctx: &mut AnchorContext<'_>,
    config: &TokenConfig,
    now: u64,
    conversion_factor: u128,
    base_asset_base_unit: u128,
) -> Result<AnchorPrice> {
    let anchor = config.source.anchor().ok_or_else(|| OracleError::InvalidPriceSource {
        symbol: config.symbol.clone(),
        reason: "an anchor market is required",
    })?;
    let sample = strategy_for(anchor.kind).sample(ctx, config, anchor, now)?;
    let price = scale_average(sample.average, conversion_factor, config.base_unit, base_asset_base_unit)?;

    tracing::debug!(
        symbol = %config.symbol,
        anchor_price = price,
        window_start = sample.window_start,
        "anchor price computed"
    );
    ctx.events.push(OracleEvent::AnchorPriceUpdated {
        symbol: config.symbol.clone(),
        anchor_price: price,
        window_start: sample.window_start,
        now,
    });

    Ok(AnchorPrice {
        price,
        window_start: sample.window_start,
        midpoint: sample.midpoint,
    })
}

#[cfg(test)]
mod tests {
    use anchorview_types::token::PriceSource;

    use super::*;
    use crate::fixed_point::Accumulator;
    use crate::market::{InMemoryMarket, MarketSnapshot};

    const ETH_UNIT: u128 = 1_000_000_000_000_000_000;
    const PERIOD: u64 = 1800;
    const START: u64 = 1_000_000;
    const MARKET: [u8; 20] = [7u8; 20];

    fn config(kind: AnchorKind, base_unit: u128) -> TokenConfig {
        TokenConfig {
            asset: [1u8; 20],
            wrapper: None,
            symbol: "BTC".to_string(),
            symbol_hash: [1u8; 32],
            base_unit,
            source: PriceSource::Reporter {
                anchor: AnchorSpec {
                    market: MARKET,
                    reversed: false,
                    kind,
                },
            },
        }
    }

    fn market(reserve0: u128, reserve1: u128) -> InMemoryMarket {
        let market = InMemoryMarket::new();
        market.set_snapshot(
            MARKET,
            MarketSnapshot {
                cumulative0: Accumulator::ZERO,
                cumulative1: Accumulator::ZERO,
                reserve0,
                reserve1,
                last_update: START,
            },
        )
        .expect("set");
        market
    }

    #[test]
    fn test_scale_average_base_asset() {
        // One wei buys 2e-9 of a 6-decimal stablecoin: $2000 per ETH.
        let average = Uq112x112::fraction(2_000_000_000_000, 1_000 * ETH_UNIT).expect("fraction");
        let raw = average.decode112with18();
        let price = scale_average(average, ETH_UNIT, ETH_UNIT, ETH_UNIT).expect("scale");
        assert_eq!(U256::new(price), raw);
        assert!((1_999_999_000..=2_000_001_000).contains(&price));
    }

    #[test]
    fn test_scale_average_cross_asset() {
        // 1 BTC (8 decimals) = 20 ETH, ETH at $2000.
        let average = Uq112x112::fraction(20 * ETH_UNIT, 100_000_000).expect("fraction");
        let price = scale_average(average, 2_000_000_000, 100_000_000, ETH_UNIT).expect("scale");
        let expected = average.decode112with18() * U256::new(2_000_000_000) * U256::new(100_000_000)
            / U256::new(ETH_UNIT)
            / U256::new(EXP_SCALE);
        assert_eq!(U256::new(price), expected);
        assert!((39_999_000_000..=40_001_000_000).contains(&price));
    }

    #[test]
    fn test_scale_average_overflow() {
        let average = Uq112x112::fraction(u128::MAX >> 16, 1).expect("fraction");
        let err = scale_average(average, u128::MAX, u128::MAX, 1).unwrap_err();
        assert!(matches!(err, OracleError::ArithmeticOverflow(_)));
    }

    #[test]
    fn test_twap_anchor_over_window() {
        let market = market(1, 4);
        let config = config(AnchorKind::Cumulative, ETH_UNIT);
        let mut windows = WindowAccumulator::new(PERIOD).expect("window");
        windows.seed(config.asset, START, Accumulator::ZERO);
        let mut events = Vec::new();
        let mut ctx = AnchorContext {
            windows: &mut windows,
            market: &market,
            events: &mut events,
        };

        let anchor = compute_anchor_price(&mut ctx, &config, START + PERIOD, ETH_UNIT, ETH_UNIT)
            .expect("anchor");
        let four = Uq112x112::fraction(4, 1).expect("fraction");
        assert_eq!(U256::new(anchor.price), four.decode112with18());
        assert_eq!(anchor.window_start, START);
        assert_eq!(anchor.midpoint, START + PERIOD / 2);
        assert!(matches!(events.last(), Some(OracleEvent::AnchorPriceUpdated { .. })));
    }

    #[test]
    fn test_twap_anchor_impossible_time() {
        let market = market(1, 4);
        let config = config(AnchorKind::Cumulative, ETH_UNIT);
        let mut windows = WindowAccumulator::new(PERIOD).expect("window");
        windows.seed(config.asset, START, Accumulator::ZERO);
        let mut events = Vec::new();
        let mut ctx = AnchorContext {
            windows: &mut windows,
            market: &market,
            events: &mut events,
        };

        let err = compute_anchor_price(&mut ctx, &config, START, ETH_UNIT, ETH_UNIT).unwrap_err();
        assert!(matches!(
            err,
            OracleError::ImpossibleTime { now: START, window_start: START }
        ));
    }

    #[test]
    fn test_spot_anchor_ignores_window() {
        let market = market(2, 10);
        let config = config(AnchorKind::Spot, ETH_UNIT);
        let mut windows = WindowAccumulator::new(PERIOD).expect("window");
        let mut events = Vec::new();
        let mut ctx = AnchorContext {
            windows: &mut windows,
            market: &market,
            events: &mut events,
        };

        let anchor = compute_anchor_price(&mut ctx, &config, START, ETH_UNIT, ETH_UNIT).expect("anchor");
        let five = Uq112x112::fraction(10, 2).expect("fraction");
        assert_eq!(U256::new(anchor.price), five.decode112with18());
        assert_eq!(anchor.midpoint, START);
        assert!(windows.window(&config.asset).is_none());
    }

    #[test]
    fn test_fixed_source_has_no_anchor() {
        let market = market(1, 1);
        let mut config = config(AnchorKind::Cumulative, ETH_UNIT);
        config.source = PriceSource::FixedBase { price: 1 };
        let mut windows = WindowAccumulator::new(PERIOD).expect("window");
        let mut events = Vec::new();
        let mut ctx = AnchorContext {
            windows: &mut windows,
            market: &market,
            events: &mut events,
        };
        let err = compute_anchor_price(&mut ctx, &config, START, ETH_UNIT, ETH_UNIT).unwrap_err();
        assert!(matches!(err, OracleError::InvalidPriceSource { .. }));
    }
}
