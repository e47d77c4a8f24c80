//! # anchorview-oracle
//!
//! Anchored price oracle.
//!
//! A signed reporter price is trusted only while it stays within a tolerance
//! band around an anchor price: a time-weighted average computed from a
//! liquidity pool's cumulative price accumulator. Prices outside the band are
//! guarded, and once the reporter invalidates itself the anchor is used for
//! good.
//!
//! ## Modules
//!
//! - [`fixed_point`]: 112.112 fixed point and 224-bit wraparound arithmetic
//! - [`registry`]: Token configuration registry
//! - [`market`]: Market accumulator source
//! - [`twap`]: Lagging two-observation accumulator window
//! - [`anchor`]: Anchor price strategies and unit conversion
//! - [`reporter`]: Signature recovery and the signed observation store
//! - [`circuit_breaker`]: Reporter circuit breaker and staleness guard
//! - [`directory`]: Externally observable asset facts
//! - [`denomination`]: Consumer-facing price scaling
//! - [`config`]: Oracle configuration
//! - [`oracle`]: The [`PriceOracle`](oracle::PriceOracle) facade

pub mod anchor;
pub mod circuit_breaker;
pub mod config;
pub mod denomination;
pub mod directory;
pub mod fixed_point;
pub mod market;
pub mod oracle;
pub mod registry;
pub mod reporter;
pub mod twap;

pub use oracle::{Capabilities, PriceOracle};

/// Error types for oracle operations.
#[derive(Debug, thiserror::Error)]
pub enum OracleError {
    /// A token configuration or oracle setting breaks an invariant.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// A config already exists for the asset or symbol and may not be replaced.
    #[error("conflict: {0}")]
    Conflict(String),

    /// No config or state for the requested key.
    #[error("not found: {0}")]
    NotFound(String),

    /// The operation does not apply to the config's price source.
    #[error("invalid price source for {symbol}: {reason}")]
    InvalidPriceSource {
        /// Symbol of the offending config.
        symbol: String,
        /// What the operation required.
        reason: &'static str,
    },

    /// A checked multiplication or narrowing overflowed.
    #[error("arithmetic overflow: {0}")]
    ArithmeticOverflow(&'static str),

    /// Time did not advance across an anchor window.
    #[error("impossible time: now {now} must come after window start {window_start}")]
    ImpossibleTime {
        /// Current timestamp.
        now: u64,
        /// Start of the window being averaged.
        window_start: u64,
    },

    /// Caller or signer is not authorized.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// No price has been stored yet.
    #[error("price missing: {0}")]
    StaleOrMissing(String),

    /// The stored price is older than the staleness bound.
    #[error("price is stale: last update {last_update}, current {current}, threshold {threshold}")]
    Stale {
        /// Timestamp of the stored price.
        last_update: u64,
        /// Current timestamp.
        current: u64,
        /// Staleness threshold in seconds.
        threshold: u64,
    },

    /// An external market could not be read.
    #[error("market error: {0}")]
    Market(String),

    /// A signed report could not be decoded or stored.
    #[error("report error: {0}")]
    Report(String),
}

/// Convenience result type for oracle operations.
pub type Result<T> = std::result::Result<T, OracleError>;
