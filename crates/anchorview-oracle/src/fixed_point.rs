//! 112.112 fixed point and 224-bit wraparound accumulators.
//!
//! Pool accumulators sum `price × seconds` as unsigned 224-bit counters that
//! wrap on overflow. Differences between two samples are taken modulo
//! `2^224`, which is correct as long as the counter advances by less than
//! `2^224` between the samples. A single anchor window is far too short for
//! that to happen with any realistic price, but nothing here can detect it.
//!
//! ```text
//! average = (acc_now - acc_old) mod 2^224 / (t_now - t_old)      // 112.112
//! mantissa_18 = average / (2^112 / 1e18)                          // decode112with18
//! ```

use ethnum::U256;

use crate::{OracleError, Result};

/// Fractional bits of the 112.112 format.
pub const RESOLUTION: u32 = 112;

/// Width of pool accumulators in bits.
pub const ACCUMULATOR_BITS: u32 = 224;

/// `2^224 - 1`.
pub const ACCUMULATOR_MASK: U256 = U256::from_words(u128::MAX >> 32, u128::MAX);

/// `2^112 / 1e18`, truncated. Dividing a 112.112 value by this yields an
/// 18-decimal mantissa.
pub const Q112_PER_EXP: u128 = 5_192_296_858_534_827;

/// A 224-bit wraparound cumulative price.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Accumulator(U256);

impl Accumulator {
    pub const ZERO: Accumulator = Accumulator(U256::ZERO);

    /// Wrap `value` into the accumulator range.
    pub fn new(value: U256) -> Self {
        Self(value & ACCUMULATOR_MASK)
    }

    pub fn from_u128(value: u128) -> Self {
        Self(U256::new(value))
    }

    pub fn value(&self) -> U256 {
        self.0
    }

    /// `(self + delta) mod 2^224`.
    pub fn wrapping_add(self, delta: U256) -> Self {
        Self::new(self.0.wrapping_add(delta))
    }

    /// `(self - earlier) mod 2^224`. Underflow is expected when the counter
    /// wrapped between the two samples.
    pub fn wrapping_sub(self, earlier: Accumulator) -> U256 {
        self.0.wrapping_sub(earlier.0) & ACCUMULATOR_MASK
    }
}

impl std::fmt::Display for Accumulator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unsigned 112.112 fixed-point number.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Uq112x112(U256);

impl Uq112x112 {
    /// Interpret the low 224 bits of `raw` as a 112.112 value.
    pub fn from_raw(raw: U256) -> Self {
        Self(raw & ACCUMULATOR_MASK)
    }

    pub fn raw(&self) -> U256 {
        self.0
    }

    /// `numerator / denominator` as 112.112. `None` for a zero denominator or
    /// a quotient that does not fit 224 bits.
    pub fn fraction(numerator: u128, denominator: u128) -> Option<Self> {
        if denominator == 0 {
            return None;
        }
        let shifted = U256::new(numerator) << RESOLUTION;
        let quotient = shifted / U256::new(denominator);
        if quotient > ACCUMULATOR_MASK {
            return None;
        }
        Some(Self(quotient))
    }

    /// Time-weighted average between two accumulator samples.
    ///
    /// Division truncates toward zero. `elapsed` must be non-zero; callers
    /// reject empty windows before averaging.
    pub fn average(now: Accumulator, old: Accumulator, elapsed: u64) -> Result<Self> {
        if elapsed == 0 {
            return Err(OracleError::ArithmeticOverflow("division by zero elapsed time"));
        }
        Ok(Self(now.wrapping_sub(old) / U256::from(elapsed)))
    }

    /// Accumulated value of holding this price for `seconds`, before wrapping.
    pub fn accumulate(&self, seconds: u64) -> U256 {
        self.0.wrapping_mul(U256::from(seconds))
    }

    /// Decode into an 18-decimal mantissa.
    pub fn decode112with18(&self) -> U256 {
        self.0 / U256::new(Q112_PER_EXP)
    }
}

/// Overflow-checked multiplication.
pub fn checked_mul(a: U256, b: U256, what: &'static str) -> Result<U256> {
    a.checked_mul(b).ok_or(OracleError::ArithmeticOverflow(what))
}

/// Narrow to `u128`, failing instead of truncating.
pub fn narrow(value: U256, what: &'static str) -> Result<u128> {
    let (high, low) = value.into_words();
    if high != 0 {
        return Err(OracleError::ArithmeticOverflow(what));
    }
    Ok(low)
}
