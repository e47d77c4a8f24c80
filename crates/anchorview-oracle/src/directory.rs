//! Externally observable asset facts.
//!
//! The oracle consults an [`AssetDirectory`] to resolve wrapper handles and,
//! in public mode, to check submitted configs against what the assets and
//! markets actually are.

use std::collections::HashMap;
use std::sync::RwLock;

use anchorview_types::Address;

/// Read-only facts about assets and markets.
pub trait AssetDirectory: Send + Sync {
    /// Display symbol of `asset`.
    fn symbol(&self, asset: &Address) -> Option<String>;

    /// Decimal places of `asset`.
    fn decimals(&self, asset: &Address) -> Option<u8>;

    /// `(token0, token1)` of a two-token market.
    fn market_pair(&self, market: &Address) -> Option<(Address, Address)>;

    /// Underlying asset of a wrapper handle.
    fn underlying(&self, wrapper: &Address) -> Option<Address>;
}

#[derive(Debug, Default)]
struct Facts {
    symbols: HashMap<Address, String>,
    decimals: HashMap<Address, u8>,
    pairs: HashMap<Address, (Address, Address)>,
    underlying: HashMap<Address, Address>,
}

/// In-memory directory filled at startup.
#[derive(Debug, Default)]
pub struct StaticDirectory {
    facts: RwLock<Facts>,
}

impl StaticDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an asset's symbol and decimals.
    pub fn with_asset(self, asset: Address, symbol: &str, decimals: u8) -> Self {
        self.add_asset(asset, symbol, decimals);
        self
    }

    pub fn with_market(self, market: Address, token0: Address, token1: Address) -> Self {
        self.add_market(market, token0, token1);
        self
    }

    pub fn with_wrapper(self, wrapper: Address, underlying: Address) -> Self {
        self.add_wrapper(wrapper, underlying);
        self
    }

    pub fn add_asset(&self, asset: Address, symbol: &str, decimals: u8) {
        if let Ok(mut facts) = self.facts.write() {
            facts.symbols.insert(asset, symbol.to_string());
            facts.decimals.insert(asset, decimals);
        }
    }

    pub fn add_market(&self, market: Address, token0: Address, token1: Address) {
        if let Ok(mut facts) = self.facts.write() {
            facts.pairs.insert(market, (token0, token1));
        }
    }

    pub fn add_wrapper(&self, wrapper: Address, underlying: Address) {
        if let Ok(mut facts) = self.facts.write() {
            facts.underlying.insert(wrapper, underlying);
        }
    }
}

impl AssetDirectory for StaticDirectory {
    fn symbol(&self, asset: &Address) -> Option<String> {
        self.facts.read().ok()?.symbols.get(asset).cloned()
    }

    fn decimals(&self, asset: &Address) -> Option<u8> {
        self.facts.read().ok()?.decimals.get(asset).copied()
    }

    fn market_pair(&self, market: &Address) -> Option<(Address, Address)> {
        self.facts.read().ok()?.pairs.get(market).copied()
    }

    fn underlying(&self, wrapper: &Address) -> Option<Address> {
        self.facts.read().ok()?.underlying.get(wrapper).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_directory_lookups() {
        let directory = StaticDirectory::new()
            .with_asset([1u8; 20], "BTC", 8)
            .with_market([2u8; 20], [1u8; 20], [3u8; 20])
            .with_wrapper([4u8; 20], [1u8; 20]);

        assert_eq!(directory.symbol(&[1u8; 20]).as_deref(), Some("BTC"));
        assert_eq!(directory.decimals(&[1u8; 20]), Some(8));
        assert_eq!(directory.market_pair(&[2u8; 20]), Some(([1u8; 20], [3u8; 20])));
        assert_eq!(directory.underlying(&[4u8; 20]), Some([1u8; 20]));
        assert_eq!(directory.symbol(&[9u8; 20]), None);
    }

    #[test]
    fn test_add_after_construction() {
        let directory = StaticDirectory::new();
        assert_eq!(directory.underlying(&[4u8; 20]), None);
        directory.add_wrapper([4u8; 20], [5u8; 20]);
        assert_eq!(directory.underlying(&[4u8; 20]), Some([5u8; 20]));
    }
}
