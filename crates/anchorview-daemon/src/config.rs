//! Daemon configuration file.
//!
//! One TOML file carries the daemon settings, the oracle settings with its
//! initial tokens, the static asset directory and the initial market
//! snapshots the anchors are seeded from.

use std::path::PathBuf;

use anchorview_oracle::config::OracleConfig;
use anchorview_oracle::directory::StaticDirectory;
use anchorview_oracle::fixed_point::Accumulator;
use anchorview_oracle::market::{InMemoryMarket, MarketSnapshot};
use anchorview_types::Address;
use anyhow::Context;
use ethnum::U256;
use serde::{Deserialize, Serialize};
use serde_with::serde_as;

/// Complete daemon configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Process settings.
    #[serde(default)]
    pub daemon: DaemonSettings,
    /// Oracle settings and initial tokens.
    pub oracle: OracleConfig,
    /// Static asset facts used by public registration and wrapper lookup.
    #[serde(default)]
    pub directory: DirectoryConfig,
    /// Initial market snapshots.
    #[serde(default)]
    pub markets: Vec<MarketSeed>,
}

/// Process settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonSettings {
    /// Data directory. Empty = platform default.
    #[serde(default)]
    pub data_dir: String,
    /// Socket path. Empty = $data_dir/anchorview.sock.
    #[serde(default)]
    pub socket_path: String,
    /// Log level: "debug" | "info" | "warn" | "error".
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Events buffered per subscriber before it starts lagging.
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
    /// Let clients pass `now` with a request instead of using the wall clock.
    /// Meant for replays and tests.
    #[serde(default)]
    pub allow_time_override: bool,
}

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetFact {
    #[serde_as(as = "serde_with::hex::Hex")]
    pub address: Address,
    pub symbol: String,
    pub decimals: u8,
}

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairFact {
    #[serde_as(as = "serde_with::hex::Hex")]
    pub market: Address,
    #[serde_as(as = "serde_with::hex::Hex")]
    pub token0: Address,
    #[serde_as(as = "serde_with::hex::Hex")]
    pub token1: Address,
}

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WrapperFact {
    #[serde_as(as = "serde_with::hex::Hex")]
    pub wrapper: Address,
    #[serde_as(as = "serde_with::hex::Hex")]
    pub underlying: Address,
}

/// Asset directory contents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DirectoryConfig {
    #[serde(default)]
    pub assets: Vec<AssetFact>,
    #[serde(default)]
    pub pairs: Vec<PairFact>,
    #[serde(default)]
    pub wrappers: Vec<WrapperFact>,
}

/// Initial state of one market. Cumulatives are decimal strings since they
/// run up to 224 bits.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSeed {
    #[serde_as(as = "serde_with::hex::Hex")]
    pub market: Address,
    #[serde_as(as = "serde_with::DisplayFromStr")]
    pub reserve0: u128,
    #[serde_as(as = "serde_with::DisplayFromStr")]
    pub reserve1: u128,
    #[serde(default = "default_cumulative")]
    pub cumulative0: String,
    #[serde(default = "default_cumulative")]
    pub cumulative1: String,
    /// 0 = daemon start time.
    #[serde(default)]
    pub last_update: u64,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_event_buffer() -> usize {
    1000
}

fn default_cumulative() -> String {
    "0".to_string()
}

impl Default for DaemonSettings {
    fn default() -> Self {
        Self {
            data_dir: String::new(),
            socket_path: String::new(),
            log_level: default_log_level(),
            event_buffer: default_event_buffer(),
            allow_time_override: false,
        }
    }
}

/// Parse a decimal accumulator value.
pub fn parse_accumulator(value: &str) -> anyhow::Result<Accumulator> {
    let raw = U256::from_str_radix(value.trim(), 10)
        .with_context(|| format!("invalid cumulative price {value:?}"))?;
    Ok(Accumulator::new(raw))
}

impl MarketSeed {
    /// Snapshot to install, stamped at `now` unless the seed says otherwise.
    pub fn snapshot(&self, now: u64) -> anyhow::Result<MarketSnapshot> {
        Ok(MarketSnapshot {
            cumulative0: parse_accumulator(&self.cumulative0)?,
            cumulative1: parse_accumulator(&self.cumulative1)?,
            reserve0: self.reserve0,
            reserve1: self.reserve1,
            last_update: if self.last_update == 0 { now } else { self.last_update },
        })
    }
}

impl DirectoryConfig {
    pub fn build(&self) -> StaticDirectory {
        let directory = StaticDirectory::new();
        for asset in &self.assets {
            directory.add_asset(asset.address, &asset.symbol, asset.decimals);
        }
        for pair in &self.pairs {
            directory.add_market(pair.market, pair.token0, pair.token1);
        }
        for wrapper in &self.wrappers {
            directory.add_wrapper(wrapper.wrapper, wrapper.underlying);
        }
        directory
    }
}

impl DaemonConfig {
    /// Load configuration from `$ANCHORVIEW_CONFIG` or the data directory.
    ///
    /// Unlike most settings the oracle table has no usable default, so a
    /// missing file is an error.
    pub fn load() -> anyhow::Result<Self> {
        let config_path = Self::config_path();
        let content = std::fs::read_to_string(&config_path)
            .with_context(|| format!("cannot read config {}", config_path.display()))?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: DaemonConfig = toml::from_str(content)?;
        if config.daemon.event_buffer == 0 {
            anyhow::bail!("daemon.event_buffer must be positive");
        }
        Ok(config)
    }

    /// Build the market table from the configured seeds.
    pub fn seed_markets(&self, now: u64) -> anyhow::Result<InMemoryMarket> {
        let market = InMemoryMarket::new();
        for seed in &self.markets {
            market.set_snapshot(seed.market, seed.snapshot(now)?)?;
        }
        Ok(market)
    }

    /// Get the data directory path.
    pub fn data_dir(&self) -> PathBuf {
        if self.daemon.data_dir.is_empty() {
            default_data_dir()
        } else {
            PathBuf::from(&self.daemon.data_dir)
        }
    }

    pub fn socket_path(&self) -> PathBuf {
        if self.daemon.socket_path.is_empty() {
            self.data_dir().join("anchorview.sock")
        } else {
            PathBuf::from(&self.daemon.socket_path)
        }
    }

    fn config_path() -> PathBuf {
        if let Ok(path) = std::env::var("ANCHORVIEW_CONFIG") {
            return PathBuf::from(path);
        }
        default_data_dir().join("config.toml")
    }
}

fn default_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("ANCHORVIEW_DATA_DIR") {
        return PathBuf::from(dir);
    }
    std::env::var("HOME")
        .map(|h| PathBuf::from(h).join(".anchorview"))
        .unwrap_or_else(|_| PathBuf::from("/tmp/anchorview"))
}
