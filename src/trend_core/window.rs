//! Per-symbol sliding windows of recent price observations
//!
//! Each tracked symbol owns a ring buffer of at most `window_size`
//! observations; appending to a full buffer drops the oldest point.
//! Derived statistics are recomputed from the buffer on demand.

use super::types::{current_timestamp, PriceBatch};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, VecDeque};

/// Points needed before momentum is computed
const MOMENTUM_LOOKBACK: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PricePoint {
    pub price: f64,
    pub timestamp: i64,
}

/// Metric a window ranking can be ordered by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MetricField {
    PctChange,
    Momentum,
    Volatility,
    CurrentPrice,
    StartPrice,
    AvgPrice,
    MaxPrice,
    MinPrice,
}

impl MetricField {
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricField::PctChange => "pct_change",
            MetricField::Momentum => "momentum",
            MetricField::Volatility => "volatility",
            MetricField::CurrentPrice => "current_price",
            MetricField::StartPrice => "start_price",
            MetricField::AvgPrice => "avg_price",
            MetricField::MaxPrice => "max_price",
            MetricField::MinPrice => "min_price",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pct_change" => Some(MetricField::PctChange),
            "momentum" => Some(MetricField::Momentum),
            "volatility" => Some(MetricField::Volatility),
            "current_price" => Some(MetricField::CurrentPrice),
            "start_price" => Some(MetricField::StartPrice),
            "avg_price" => Some(MetricField::AvgPrice),
            "max_price" => Some(MetricField::MaxPrice),
            "min_price" => Some(MetricField::MinPrice),
            _ => None,
        }
    }
}

/// Statistics over a window holding at least two observations.
///
/// `pct_change` and `momentum` are `None` when their base price is zero.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceStats {
    pub symbol: String,
    pub window_size: usize,
    pub current_price: f64,
    pub start_price: f64,
    pub max_price: f64,
    pub min_price: f64,
    pub avg_price: f64,
    pub pct_change: Option<f64>,
    /// Population standard deviation of buffered prices
    pub volatility: f64,
    pub momentum: Option<f64>,
    pub timestamp: i64,
}

impl PriceStats {
    pub fn get(&self, field: MetricField) -> Option<f64> {
        match field {
            MetricField::PctChange => self.pct_change,
            MetricField::Momentum => self.momentum,
            MetricField::Volatility => Some(self.volatility),
            MetricField::CurrentPrice => Some(self.current_price),
            MetricField::StartPrice => Some(self.start_price),
            MetricField::AvgPrice => Some(self.avg_price),
            MetricField::MaxPrice => Some(self.max_price),
            MetricField::MinPrice => Some(self.min_price),
        }
    }

    /// Ranking value; absent metrics rank as 0
    pub fn rank_value(&self, field: MetricField) -> f64 {
        self.get(field).unwrap_or(0.0)
    }
}

/// Result of `SlidingWindow::calculate_metrics` for a tracked, non-empty window
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum WindowMetrics {
    /// Only one observation buffered; excluded from rankings
    InsufficientData {
        symbol: String,
        window_size: usize,
        insufficient_data: bool,
    },
    Complete(PriceStats),
}

impl WindowMetrics {
    pub fn symbol(&self) -> &str {
        match self {
            WindowMetrics::InsufficientData { symbol, .. } => symbol,
            WindowMetrics::Complete(stats) => &stats.symbol,
        }
    }

    pub fn window_size(&self) -> usize {
        match self {
            WindowMetrics::InsufficientData { window_size, .. } => *window_size,
            WindowMetrics::Complete(stats) => stats.window_size,
        }
    }

    pub fn insufficient_data(&self) -> bool {
        matches!(self, WindowMetrics::InsufficientData { .. })
    }

    pub fn stats(&self) -> Option<&PriceStats> {
        match self {
            WindowMetrics::InsufficientData { .. } => None,
            WindowMetrics::Complete(stats) => Some(stats),
        }
    }

    pub fn into_stats(self) -> Option<PriceStats> {
        match self {
            WindowMetrics::InsufficientData { .. } => None,
            WindowMetrics::Complete(stats) => Some(stats),
        }
    }
}

/// Percentage change from `base` to `price`, absent for a zero base
pub fn percent_change(base: f64, price: f64) -> Option<f64> {
    if base == 0.0 {
        None
    } else {
        Some((price - base) / base * 100.0)
    }
}

#[derive(Debug, Clone)]
pub struct SlidingWindow {
    window_size: usize,
    /// Tracked symbols in registration order
    symbols: Vec<String>,
    windows: HashMap<String, VecDeque<PricePoint>>,
}

impl SlidingWindow {
    /// # Panics
    /// Panics if window_size is 0.
    pub fn new(window_size: usize) -> Self {
        assert!(window_size > 0, "SlidingWindow window_size must be > 0");
        Self {
            window_size,
            symbols: Vec::new(),
            windows: HashMap::new(),
        }
    }

    pub fn new_with_symbols<I, S>(window_size: usize, symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut window = Self::new(window_size);
        for symbol in symbols {
            let symbol: String = symbol.into();
            window.add_symbol(&symbol);
        }
        window
    }

    pub fn window_size(&self) -> usize {
        self.window_size
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn tracked_count(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_tracked(&self, symbol: &str) -> bool {
        self.windows.contains_key(symbol)
    }

    pub fn add_symbol(&mut self, symbol: &str) {
        if !self.windows.contains_key(symbol) {
            self.windows
                .insert(symbol.to_string(), VecDeque::with_capacity(self.window_size));
            self.symbols.push(symbol.to_string());
        }
    }

    /// Stop tracking `symbol`, dropping its buffered observations
    pub fn remove_symbol(&mut self, symbol: &str) {
        if self.windows.remove(symbol).is_some() {
            self.symbols.retain(|s| s != symbol);
        }
    }

    /// Append an observation, registering the symbol if unseen
    pub fn update(&mut self, symbol: &str, price: f64, timestamp: Option<i64>) {
        let timestamp = timestamp.unwrap_or_else(current_timestamp);
        self.add_symbol(symbol);

        if let Some(window) = self.windows.get_mut(symbol) {
            if window.len() >= self.window_size {
                window.pop_front();
            }
            window.push_back(PricePoint { price, timestamp });
        }
    }

    /// Apply `update` for every quote carrying a price
    pub fn update_batch(&mut self, batch: &PriceBatch) {
        for (symbol, quote) in batch {
            if let Some(price) = quote.price {
                self.update(symbol, price, quote.timestamp);
            }
        }
    }

    /// Buffered observations, oldest first
    pub fn get_window(&self, symbol: &str) -> Vec<PricePoint> {
        self.windows
            .get(symbol)
            .map(|window| window.iter().copied().collect())
            .unwrap_or_default()
    }

    /// `None` for an untracked or empty window
    pub fn calculate_metrics(&self, symbol: &str) -> Option<WindowMetrics> {
        let window = self.windows.get(symbol)?;
        let latest = window.back()?;

        if window.len() < 2 {
            return Some(WindowMetrics::InsufficientData {
                symbol: symbol.to_string(),
                window_size: window.len(),
                insufficient_data: true,
            });
        }

        let count = window.len();
        let current_price = latest.price;
        let start_price = window[0].price;

        let mut max_price = f64::NEG_INFINITY;
        let mut min_price = f64::INFINITY;
        let mut sum = 0.0;
        for point in window {
            max_price = max_price.max(point.price);
            min_price = min_price.min(point.price);
            sum += point.price;
        }
        let avg_price = sum / count as f64;

        let variance = window
            .iter()
            .map(|p| (p.price - avg_price).powi(2))
            .sum::<f64>()
            / count as f64;

        let momentum = if count >= MOMENTUM_LOOKBACK {
            percent_change(window[count - MOMENTUM_LOOKBACK].price, current_price)
        } else {
            Some(0.0)
        };

        Some(WindowMetrics::Complete(PriceStats {
            symbol: symbol.to_string(),
            window_size: count,
            current_price,
            start_price,
            max_price,
            min_price,
            avg_price,
            pct_change: percent_change(start_price, current_price),
            volatility: variance.sqrt(),
            momentum,
            timestamp: latest.timestamp,
        }))
    }

    /// Metrics for every tracked symbol that has at least one observation
    pub fn calculate_all_metrics(&self) -> BTreeMap<String, WindowMetrics> {
        self.symbols
            .iter()
            .filter_map(|symbol| {
                self.calculate_metrics(symbol)
                    .map(|metrics| (symbol.clone(), metrics))
            })
            .collect()
    }

    /// Complete stats only, in registration order
    ///
    /// Performer queries sort stably, so tied metrics keep this order.
    pub fn rankable_stats(&self) -> Vec<PriceStats> {
        self.symbols
            .iter()
            .filter_map(|symbol| self.calculate_metrics(symbol))
            .filter_map(WindowMetrics::into_stats)
            .collect()
    }

    /// Highest `n` symbols by `metric`
    pub fn get_top_performers(&self, n: usize, metric: MetricField) -> Vec<PriceStats> {
        let mut stats = self.rankable_stats();
        stats.sort_by(|a, b| b.rank_value(metric).total_cmp(&a.rank_value(metric)));
        stats.truncate(n);
        stats
    }

    /// Lowest `n` symbols by `metric`
    pub fn get_bottom_performers(&self, n: usize, metric: MetricField) -> Vec<PriceStats> {
        let mut stats = self.rankable_stats();
        stats.sort_by(|a, b| a.rank_value(metric).total_cmp(&b.rank_value(metric)));
        stats.truncate(n);
        stats
    }
}
