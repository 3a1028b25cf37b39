//! Breakout detection against the windowed average price

use super::window::PriceStats;
use serde::Serialize;

/// Default deviation from the window average that counts as a breakout
pub const DEFAULT_BREAKOUT_THRESHOLD_PCT: f64 = 5.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BreakoutType {
    Upward,
    Downward,
}

impl BreakoutType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BreakoutType::Upward => "upward",
            BreakoutType::Downward => "downward",
        }
    }
}

/// Window stats of a symbol in breakout, with direction and magnitude
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakoutEntry {
    #[serde(flatten)]
    pub stats: PriceStats,
    pub breakout_type: BreakoutType,
    /// Distance of the current price from the window average, in percent
    pub breakout_pct: f64,
}

pub struct BreakoutDetector {
    threshold_pct: f64,
}

impl BreakoutDetector {
    pub fn new(threshold_pct: f64) -> Self {
        Self { threshold_pct }
    }

    pub fn with_defaults() -> Self {
        Self::new(DEFAULT_BREAKOUT_THRESHOLD_PCT)
    }

    pub fn threshold_pct(&self) -> f64 {
        self.threshold_pct
    }

    /// Classify one symbol's window
    ///
    /// # Signals
    /// - **upward**: current > avg * (1 + threshold/100)
    /// - **downward**: current < avg * (1 - threshold/100)
    ///
    /// A zero average never breaks out.
    pub fn detect(&self, stats: &PriceStats) -> Option<BreakoutEntry> {
        let avg = stats.avg_price;
        if avg == 0.0 {
            return None;
        }

        let current = stats.current_price;
        let factor = self.threshold_pct / 100.0;

        let (breakout_type, breakout_pct) = if current > avg * (1.0 + factor) {
            (BreakoutType::Upward, (current - avg) / avg * 100.0)
        } else if current < avg * (1.0 - factor) {
            (BreakoutType::Downward, (avg - current) / avg * 100.0)
        } else {
            return None;
        };

        Some(BreakoutEntry {
            stats: stats.clone(),
            breakout_type,
            breakout_pct,
        })
    }

    /// Every breakout among `stats`, largest |breakout_pct| first
    pub fn detect_all<'a, I>(&self, stats: I) -> Vec<BreakoutEntry>
    where
        I: IntoIterator<Item = &'a PriceStats>,
    {
        let mut breakouts: Vec<BreakoutEntry> =
            stats.into_iter().filter_map(|s| self.detect(s)).collect();
        breakouts.sort_by(|a, b| b.breakout_pct.abs().total_cmp(&a.breakout_pct.abs()));
        breakouts
    }
}
