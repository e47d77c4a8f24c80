//! Price denomination conversions.
//!
//! Official prices carry [`PRICE_DECIMALS`](anchorview_types::PRICE_DECIMALS)
//! decimals of the quote denomination per whole asset. Consumers want a
//! mantissa that, multiplied by an amount in the asset's native units, gives
//! the quote value at 36 decimals:
//!
//! ```text
//! consumer_price = price * 1e30 / base_unit
//! ```
//!
//! Every conversion multiplies before it divides and fails on overflow.

use anchorview_types::CONSUMER_SCALE;
use ethnum::U256;

use crate::fixed_point::{checked_mul, narrow};
use crate::{OracleError, Result};

/// Rescale an official price for consumers.
///
/// # Errors
///
/// - [`OracleError::ArithmeticOverflow`] if the result does not fit `u128`
///   or `base_unit` is zero
pub fn consumer_price(price: u128, base_unit: u128) -> Result<u128> {
    let scaled = checked_mul(U256::new(price), U256::new(CONSUMER_SCALE), "consumer price scaling")?;
    let result = scaled
        .checked_div(U256::new(base_unit))
        .ok_or(OracleError::ArithmeticOverflow("consumer price division by zero base unit"))?;
    narrow(result, "consumer price")
}

/// Convert an amount of the base asset into the quote denomination at the
/// base asset's price.
///
/// `amount` is in base-asset native units; `base_price` is the quote price
/// of one whole base asset.
pub fn base_to_quote(amount: u128, base_price: u128, base_asset_base_unit: u128) -> Result<u128> {
    let value = checked_mul(U256::new(amount), U256::new(base_price), "fixed quote conversion")?;
    let result = value
        .checked_div(U256::new(base_asset_base_unit))
        .ok_or(OracleError::ArithmeticOverflow("fixed quote division by zero base unit"))?;
    narrow(result, "fixed quote price")
}
