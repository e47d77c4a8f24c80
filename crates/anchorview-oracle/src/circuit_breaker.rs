//! Reporter circuit breaker and staleness guard.
//!
//! ## Reporter breaker
//!
//! The breaker is one-way: once the reporter invalidates itself it is never
//! trusted again, and every reporter-sourced asset is priced from its anchor.
//! There is no resume.
//!
//! ## Staleness
//!
//! When a maximum staleness is configured, a stored price older than the
//! threshold is refused at read time. Staleness is a data check against the
//! caller's clock; nothing is scheduled.

use crate::{OracleError, Result};

/// Set-once flag distrusting the configured reporter.
#[derive(Debug, Clone, Default)]
pub struct ReporterBreaker {
    tripped: bool,
}

impl ReporterBreaker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Trip the breaker. Tripping again has no further effect.
    pub fn trip(&mut self) {
        if !self.tripped {
            tracing::warn!("circuit breaker: reporter invalidated, anchoring all reporter prices");
        }
        self.tripped = true;
    }

    pub fn is_tripped(&self) -> bool {
        self.tripped
    }
}

/// Optional bound on the age of stored prices.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StalenessGuard {
    threshold: Option<u64>,
}

impl StalenessGuard {
    /// Create a guard. `None` disables staleness checks.
    pub fn new(threshold: Option<u64>) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> Option<u64> {
        self.threshold
    }

    /// Whether a price stored at `last_update` is stale at `current_time`.
    pub fn is_stale(&self, last_update: u64, current_time: u64) -> bool {
        self.threshold
            .is_some_and(|threshold| current_time.saturating_sub(last_update) > threshold)
    }

    /// # Errors
    ///
    /// - [`OracleError::Stale`] if the price is older than the threshold
    pub fn check(&self, last_update: u64, current_time: u64) -> Result<()> {
        match self.threshold {
            Some(threshold) if self.is_stale(last_update, current_time) => Err(OracleError::Stale {
                last_update,
                current: current_time,
                threshold,
            }),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const THRESHOLD: u64 = 3600;

    #[test]
    fn test_breaker_starts_open() {
        assert!(!ReporterBreaker::new().is_tripped());
    }

    #[test]
    fn test_breaker_is_permanent() {
        let mut breaker = ReporterBreaker::new();
        breaker.trip();
        assert!(breaker.is_tripped());
        breaker.trip();
        assert!(breaker.is_tripped());
    }

    #[test]
    fn test_disabled_guard_never_stale() {
        let guard = StalenessGuard::new(None);
        assert!(!guard.is_stale(0, u64::MAX));
        assert!(guard.check(0, u64::MAX).is_ok());
    }

    #[test]
    fn test_not_stale_within_threshold() {
        let guard = StalenessGuard::new(Some(THRESHOLD));
        assert!(!guard.is_stale(1000, 1000 + THRESHOLD));
        assert!(guard.check(1000, 1000 + THRESHOLD).is_ok());
    }

    #[test]
    fn test_stale_after_threshold() {
        let guard = StalenessGuard::new(Some(THRESHOLD));
        let err = guard.check(1000, 1000 + THRESHOLD + 1).unwrap_err();
        assert!(matches!(
            err,
            OracleError::Stale {
                last_update: 1000,
                current: 4601,
                threshold: THRESHOLD,
            }
        ));
    }

    #[test]
    fn test_clock_behind_price_is_not_stale() {
        let guard = StalenessGuard::new(Some(THRESHOLD));
        assert!(!guard.is_stale(5000, 1000));
    }
}
