//! # anchorview-types
//!
//! Shared domain types used across the anchorview workspace.
//!
//! Prices are integer mantissas. Official prices are quoted in a USD-like
//! denomination with [`PRICE_DECIMALS`] decimals; the base asset is the pivot
//! every other anchor is cross-priced through.

pub mod events;
pub mod report;
pub mod token;

/// Asset, market, wrapper and reporter handles.
pub type Address = [u8; 20];
/// BLAKE3 fingerprint of a display symbol.
pub type SymbolHash = [u8; 32];

/// The null handle. Never a valid asset or market.
pub const ZERO_ADDRESS: Address = [0u8; 20];

/// Sentinel handle standing for the base asset itself.
pub const BASE_ASSET: Address = [0xee; 20];

/// Decimals carried by official prices.
pub const PRICE_DECIMALS: u32 = 6;

/// `10^PRICE_DECIMALS`.
pub const PRICE_SCALE: u128 = 1_000_000;

/// 18-decimal fixed-point one.
pub const EXP_SCALE: u128 = 1_000_000_000_000_000_000;

/// 100% as an 18-decimal mantissa. Anchor ratios and tolerances use this scale.
pub const ONE_HUNDRED_PERCENT: u128 = EXP_SCALE;

/// Consumer-facing scale: `price * CONSUMER_SCALE / base_unit` keeps
/// `price × native units` at 36 decimals of the quote denomination.
pub const CONSUMER_SCALE: u128 = 1_000_000_000_000_000_000_000_000_000_000;

/// Consumer price of the base asset when it is held at par.
pub const CONSUMER_PAR_PRICE: u128 = EXP_SCALE;

/// Render a handle as lowercase hex for logs and errors.
pub fn fmt_address(address: &Address) -> String {
    let mut out = String::with_capacity(2 + address.len() * 2);
    out.push_str("0x");
    for byte in address {
        out.push_str(&format!("{byte:02x}"));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scales_consistent() {
        assert_eq!(PRICE_SCALE, 10u128.pow(PRICE_DECIMALS));
        assert_eq!(CONSUMER_SCALE, 10u128.pow(36 - PRICE_DECIMALS));
        assert_eq!(ONE_HUNDRED_PERCENT, 10u128.pow(18));
    }

    #[test]
    fn test_fmt_address() {
        assert_eq!(
            fmt_address(&BASE_ASSET),
            "0xeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeeee"
        );
        assert!(fmt_address(&ZERO_ADDRESS).ends_with("00"));
    }
}
