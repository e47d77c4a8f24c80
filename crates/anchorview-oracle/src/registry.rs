//! Token configuration registry.
//!
//! Configs live in an ordered arena and are indexed by asset, symbol
//! fingerprint and wrapper. The arena and the index maps change together:
//! a batch is staged on a copy and swapped in only once every config in it
//! has been accepted, so readers never see half a batch.

use std::collections::HashMap;

use anchorview_crypto::blake3::symbol_hash;
use anchorview_types::token::{AnchorSpec, PriceSource, PriceSourceKind, TokenConfig, TokenConfigEntry};
use anchorview_types::{fmt_address, Address, SymbolHash, ZERO_ADDRESS};

use crate::directory::AssetDirectory;
use crate::{OracleError, Result};

/// Rules for registering over existing configs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RegistryPolicy {
    /// Replace an existing config for the same asset in place.
    pub allow_overwrite: bool,
    /// Refuse a symbol fingerprint already owned by another asset.
    pub unique_symbols: bool,
}

impl Default for RegistryPolicy {
    fn default() -> Self {
        Self {
            allow_overwrite: false,
            unique_symbols: true,
        }
    }
}

/// Outcome of registering one config.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Registration {
    pub index: usize,
    /// An existing config for the asset was replaced.
    pub replaced: bool,
}

/// Ordered config arena with O(1) side indexes.
#[derive(Clone, Debug, Default)]
pub struct ConfigRegistry {
    policy: RegistryPolicy,
    configs: Vec<TokenConfig>,
    by_asset: HashMap<Address, usize>,
    by_symbol: HashMap<SymbolHash, usize>,
    by_wrapper: HashMap<Address, usize>,
}

impl ConfigRegistry {
    pub fn new(policy: RegistryPolicy) -> Self {
        Self {
            policy,
            ..Self::default()
        }
    }

    pub fn policy(&self) -> RegistryPolicy {
        self.policy
    }

    pub fn len(&self) -> usize {
        self.configs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.configs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TokenConfig> {
        self.configs.iter()
    }

    /// Register a batch of validated configs.
    ///
    /// Either every config is applied or none is.
    ///
    /// # Errors
    ///
    /// - [`OracleError::Conflict`] if an asset, symbol or wrapper is already
    ///   taken and the policy forbids replacing it
    pub fn register(&mut self, configs: Vec<TokenConfig>) -> Result<Vec<Registration>> {
        let mut staged = self.clone();
        let mut registrations = Vec::with_capacity(configs.len());
        for config in configs {
            registrations.push(staged.insert(config)?);
        }
        *self = staged;
        Ok(registrations)
    }

    fn insert(&mut self, config: TokenConfig) -> Result<Registration> {
        let existing = self.by_asset.get(&config.asset).copied();
        if existing.is_some() && !self.policy.allow_overwrite {
            return Err(OracleError::Conflict(format!(
                "asset {} is already configured",
                fmt_address(&config.asset)
            )));
        }
        let index = existing.unwrap_or(self.configs.len());

        if let Some(&owner) = self.by_symbol.get(&config.symbol_hash) {
            if owner != index && self.policy.unique_symbols {
                return Err(OracleError::Conflict(format!(
                    "symbol {} is already configured",
                    config.symbol
                )));
            }
        }
        if let Some(wrapper) = &config.wrapper {
            if let Some(&owner) = self.by_wrapper.get(wrapper) {
                if owner != index {
                    return Err(OracleError::Conflict(format!(
                        "wrapper {} is already configured",
                        fmt_address(wrapper)
                    )));
                }
            }
        }

        if let Some(old) = existing.and_then(|i| self.configs.get(i)) {
            let (old_hash, old_wrapper) = (old.symbol_hash, old.wrapper);
            if self.by_symbol.get(&old_hash) == Some(&index) {
                self.by_symbol.remove(&old_hash);
            }
            if let Some(wrapper) = old_wrapper {
                self.by_wrapper.remove(&wrapper);
            }
        }

        self.by_asset.insert(config.asset, index);
        self.by_symbol.insert(config.symbol_hash, index);
        if let Some(wrapper) = config.wrapper {
            self.by_wrapper.insert(wrapper, index);
        }
        match self.configs.get_mut(index) {
            Some(slot) => *slot = config,
            None => self.configs.push(config),
        }

        Ok(Registration {
            index,
            replaced: existing.is_some(),
        })
    }

    /// # Errors
    ///
    /// - [`OracleError::NotFound`] if `index` is out of range
    pub fn get(&self, index: usize) -> Result<&TokenConfig> {
        self.configs
            .get(index)
            .ok_or_else(|| OracleError::NotFound(format!("no config at index {index}")))
    }

    pub fn get_by_asset(&self, asset: &Address) -> Result<&TokenConfig> {
        self.by_asset
            .get(asset)
            .and_then(|&i| self.configs.get(i))
            .ok_or_else(|| OracleError::NotFound(format!("no config for asset {}", fmt_address(asset))))
    }

    pub fn get_by_symbol(&self, symbol_hash: &SymbolHash) -> Result<&TokenConfig> {
        self.by_symbol
            .get(symbol_hash)
            .and_then(|&i| self.configs.get(i))
            .ok_or_else(|| OracleError::NotFound("no config for symbol".to_string()))
    }

    /// Resolve a consumer-facing wrapper handle.
    ///
    /// A wrapper with no direct config is resolved to its underlying asset
    /// through `directory`, then looked up by asset.
    pub fn get_by_wrapper(&self, wrapper: &Address, directory: &dyn AssetDirectory) -> Result<&TokenConfig> {
        if let Some(config) = self.by_wrapper.get(wrapper).and_then(|&i| self.configs.get(i)) {
            return Ok(config);
        }
        match directory.underlying(wrapper) {
            Some(underlying) => self.get_by_asset(&underlying),
            None => Err(OracleError::NotFound(format!(
                "no config for wrapper {}",
                fmt_address(wrapper)
            ))),
        }
    }
}

/// Check a flat entry and convert it into a [`TokenConfig`].
///
/// # Errors
///
/// - [`OracleError::InvalidConfig`] if the entry breaks a config invariant
pub fn validate_entry(entry: &TokenConfigEntry) -> Result<TokenConfig> {
    let invalid = |reason: &str| OracleError::InvalidConfig(format!("{}: {reason}", entry.symbol));

    if entry.symbol.is_empty() {
        return Err(OracleError::InvalidConfig("symbol must not be empty".to_string()));
    }
    if entry.base_unit == 0 {
        return Err(invalid("base unit must be positive"));
    }

    let market = entry.anchor_market.filter(|market| *market != ZERO_ADDRESS);
    let requires_anchor = entry.price_source.requires_anchor();
    if requires_anchor && market.is_none() {
        return Err(invalid("an anchor market is required"));
    }
    if !requires_anchor && market.is_some() {
        return Err(invalid("fixed prices take no anchor market"));
    }
    if requires_anchor && entry.fixed_price != 0 {
        return Err(invalid("fixed price must be zero for dynamic sources"));
    }

    let anchor = market.map(|market| AnchorSpec {
        market,
        reversed: entry.anchor_reversed,
        kind: entry.anchor_kind,
    });
    let source = match (entry.price_source, anchor) {
        (PriceSourceKind::FixedBase, _) => PriceSource::FixedBase {
            price: entry.fixed_price,
        },
        (PriceSourceKind::FixedQuote, _) => PriceSource::FixedQuote {
            price: entry.fixed_price,
        },
        (PriceSourceKind::Reporter, Some(anchor)) => PriceSource::Reporter { anchor },
        (PriceSourceKind::Twap, Some(anchor)) => PriceSource::Twap { anchor },
        (_, None) => return Err(invalid("an anchor market is required")),
    };

    let config = TokenConfig {
        asset: entry.asset,
        wrapper: entry.wrapper,
        symbol: entry.symbol.clone(),
        symbol_hash: symbol_hash(&entry.symbol),
        base_unit: entry.base_unit,
        source,
    };
    if config.is_base_asset() && matches!(config.source, PriceSource::FixedQuote { .. }) {
        return Err(invalid("the base asset cannot be priced in itself"));
    }
    Ok(config)
}
