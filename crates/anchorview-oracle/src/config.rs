//! Oracle configuration.
//!
//! Read from the `[oracle]` table of the daemon's TOML file, or built
//! directly by embedders and tests.

use std::path::Path;

use anchorview_types::token::TokenConfigEntry;
use anchorview_types::{Address, ZERO_ADDRESS};
use serde::{Deserialize, Serialize};
use serde_with::serde_as;

use crate::registry::RegistryPolicy;
use crate::{OracleError, Result};

/// Everything a [`PriceOracle`](crate::PriceOracle) is constructed from.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleConfig {
    /// Address of the trusted reporter.
    #[serde_as(as = "serde_with::hex::Hex")]
    pub reporter: Address,
    /// Address allowed to register configs and change the admin.
    #[serde_as(as = "serde_with::hex::Hex")]
    #[serde(default = "default_admin")]
    pub admin: Address,
    /// Allowed deviation of the anchor ratio from 100%, 18-decimal mantissa.
    #[serde_as(as = "serde_with::DisplayFromStr")]
    #[serde(default = "default_anchor_tolerance")]
    pub anchor_tolerance: u128,
    /// Minimum seconds an anchor window spans before it advances.
    #[serde(default = "default_anchor_period")]
    pub anchor_period: u64,
    /// Refuse stored prices older than this many seconds.
    #[serde(default)]
    pub max_staleness: Option<u64>,
    /// Accept configs from anyone, validated against asset facts.
    #[serde(default)]
    pub public_mode: bool,
    #[serde(default)]
    pub allow_overwrite: bool,
    #[serde(default = "default_true")]
    pub unique_symbols: bool,
    /// Price the base asset at exactly 1.0 for consumers.
    #[serde(default = "default_true")]
    pub base_asset_at_par: bool,
    #[serde(default)]
    pub tokens: Vec<TokenConfigEntry>,
}

fn default_admin() -> Address {
    ZERO_ADDRESS
}

fn default_anchor_tolerance() -> u128 {
    // 20%
    200_000_000_000_000_000
}

fn default_anchor_period() -> u64 {
    30 * 60
}

fn default_true() -> bool {
    true
}

impl OracleConfig {
    /// A config with defaults and no tokens.
    pub fn new(reporter: Address, admin: Address) -> Self {
        Self {
            reporter,
            admin,
            anchor_tolerance: default_anchor_tolerance(),
            anchor_period: default_anchor_period(),
            max_staleness: None,
            public_mode: false,
            allow_overwrite: false,
            unique_symbols: true,
            base_asset_at_par: true,
            tokens: Vec::new(),
        }
    }

    pub fn registry_policy(&self) -> RegistryPolicy {
        RegistryPolicy {
            allow_overwrite: self.allow_overwrite,
            unique_symbols: self.unique_symbols,
        }
    }

    /// Parse from TOML text.
    ///
    /// # Errors
    ///
    /// - [`OracleError::InvalidConfig`] if the text does not parse
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| OracleError::InvalidConfig(e.to_string()))
    }

    /// Load from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            OracleError::InvalidConfig(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&content)
    }
}
