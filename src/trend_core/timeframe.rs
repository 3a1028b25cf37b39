//! Historical baseline prices for timeframe comparisons
//!
//! The analyzer ranks symbols not only against the previous snapshot but
//! also against older baselines ("one_week", "two_week", ...). Baselines come
//! from an external collaborator behind the `BaselineProvider` trait; the
//! analyzer treats any error as "no baselines this cycle".

use super::types::{PriceBatch, PriceQuote};
use std::collections::HashMap;
use std::sync::RwLock;

#[derive(Debug, Clone, PartialEq)]
pub enum BaselineError {
    UnknownTimeframe(String),
    Unavailable(String),
}

impl std::fmt::Display for BaselineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BaselineError::UnknownTimeframe(tf) => write!(f, "Unknown timeframe: {}", tf),
            BaselineError::Unavailable(msg) => write!(f, "Baseline unavailable: {}", msg),
        }
    }
}

impl std::error::Error for BaselineError {}

/// Source of historical snapshots keyed by timeframe name
pub trait BaselineProvider: Send + Sync {
    /// Baseline quote per symbol for `timeframe`; absent symbols have no baseline
    fn baseline_prices(&self, timeframe: &str) -> Result<PriceBatch, BaselineError>;
}

/// In-memory baselines, replaced wholesale per timeframe
#[derive(Debug, Default)]
pub struct SnapshotBaselineProvider {
    snapshots: RwLock<HashMap<String, PriceBatch>>,
}

impl SnapshotBaselineProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshots(snapshots: HashMap<String, PriceBatch>) -> Self {
        Self {
            snapshots: RwLock::new(snapshots),
        }
    }

    /// Replace the snapshot for `timeframe`
    pub fn set_snapshot(&self, timeframe: &str, batch: PriceBatch) {
        let mut snapshots = match self.snapshots.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        snapshots.insert(timeframe.to_string(), batch);
    }

    pub fn set_price(&self, timeframe: &str, symbol: &str, quote: PriceQuote) {
        let mut snapshots = match self.snapshots.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        snapshots
            .entry(timeframe.to_string())
            .or_default()
            .insert(symbol.to_string(), quote);
    }
}

impl BaselineProvider for SnapshotBaselineProvider {
    fn baseline_prices(&self, timeframe: &str) -> Result<PriceBatch, BaselineError> {
        let snapshots = self
            .snapshots
            .read()
            .map_err(|_| BaselineError::Unavailable("snapshot lock poisoned".to_string()))?;

        snapshots
            .get(timeframe)
            .cloned()
            .ok_or_else(|| BaselineError::UnknownTimeframe(timeframe.to_string()))
    }
}

/// Percentage change of `current` against a baseline quote.
///
/// `None` when the baseline has no price or a non-positive one, or when the
/// change is not finite.
pub fn change_against_baseline(current: f64, baseline: Option<&PriceQuote>) -> Option<f64> {
    let base = baseline?.price?;
    if base <= 0.0 {
        return None;
    }
    Some((current - base) / base * 100.0).filter(|change| change.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_provider() {
        let provider = SnapshotBaselineProvider::new();
        provider.set_price("one_week", "AAPL", PriceQuote::new(100.0, 1));

        let batch = provider.baseline_prices("one_week").unwrap();
        assert_eq!(batch["AAPL"].price, Some(100.0));

        assert_eq!(
            provider.baseline_prices("two_week"),
            Err(BaselineError::UnknownTimeframe("two_week".to_string()))
        );
    }

    #[test]
    fn test_set_snapshot_replaces() {
        let provider = SnapshotBaselineProvider::new();
        provider.set_price("day", "A", PriceQuote::new(1.0, 1));

        let mut fresh = PriceBatch::new();
        fresh.insert("B".to_string(), PriceQuote::new(2.0, 2));
        provider.set_snapshot("day", fresh);

        let batch = provider.baseline_prices("day").unwrap();
        assert!(!batch.contains_key("A"));
        assert!(batch.contains_key("B"));
    }

    #[test]
    fn test_change_against_baseline() {
        let base = PriceQuote::new(50.0, 1);
        assert_eq!(change_against_baseline(75.0, Some(&base)), Some(50.0));
        assert_eq!(change_against_baseline(75.0, None), None);
        assert_eq!(change_against_baseline(75.0, Some(&PriceQuote::default())), None);
        assert_eq!(change_against_baseline(75.0, Some(&PriceQuote::new(0.0, 1))), None);
        assert_eq!(change_against_baseline(75.0, Some(&PriceQuote::new(-3.0, 1))), None);
        assert_eq!(change_against_baseline(f64::NAN, Some(&base)), None);
        assert_eq!(change_against_baseline(75.0, Some(&PriceQuote::new(f64::NAN, 1))), None);
    }
}
