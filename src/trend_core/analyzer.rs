//! Trend analyzer - orchestration of ranking heaps and sliding windows
//!
//! One `update` call:
//!
//! ```text
//! (symbol, current, previous, timestamp)
//!     ↓
//! pct_change vs previous ──→ default gainers (max) / losers (min)
//!     ↓
//! SlidingWindow::update(symbol, current)
//!     ↓
//! per timeframe: pct_change vs baseline ──→ timeframe gainers / losers
//! ```
//!
//! Queries (rankings, window metrics, breakouts, summary report) only read
//! state; nothing is pushed outward.

use super::detector::{BreakoutDetector, BreakoutEntry, DEFAULT_BREAKOUT_THRESHOLD_PCT};
use super::ranking::{BoundedRankingHeap, Polarity, RankedEntry, RestoreStrategy};
use super::timeframe::{change_against_baseline, BaselineError, BaselineProvider};
use super::types::{current_timestamp, PriceBatch};
use super::window::{MetricField, PriceStats, SlidingWindow, WindowMetrics};
use crate::config::AnalyzerConfig;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Entries per section of a summary report
pub const DEFAULT_REPORT_SIZE: usize = 5;

/// Most recent per-update values for a symbol
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickerSnapshot {
    pub symbol: String,
    pub current_price: f64,
    pub previous_price: Option<f64>,
    pub pct_change: f64,
    pub timestamp: i64,
}

/// A gainers/losers heap pair
#[derive(Debug, Clone)]
pub struct TimeframeRankings {
    pub gainers: BoundedRankingHeap,
    pub losers: BoundedRankingHeap,
    pub last_update: Option<i64>,
}

impl TimeframeRankings {
    pub fn new(capacity: usize, strategy: RestoreStrategy) -> Self {
        Self {
            gainers: BoundedRankingHeap::with_strategy(Polarity::Max, capacity, strategy),
            losers: BoundedRankingHeap::with_strategy(Polarity::Min, capacity, strategy),
            last_update: None,
        }
    }

    fn push(&mut self, symbol: &str, value: f64, timestamp: i64) {
        self.gainers.push(symbol, value, timestamp);
        self.losers.push(symbol, value, timestamp);
        self.last_update = Some(timestamp);
    }

    fn remove(&mut self, symbol: &str) -> bool {
        let gainer = self.gainers.remove(symbol);
        let loser = self.losers.remove(symbol);
        gainer || loser
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SummaryReport {
    pub timestamp: i64,
    /// `timestamp` as `%Y-%m-%d %H:%M:%S` (UTC)
    pub datetime: String,
    /// Timeframe the gainers/losers were taken from; `None` = default pair
    pub timeframe: Option<String>,
    pub top_gainers: Vec<RankedEntry>,
    pub top_losers: Vec<RankedEntry>,
    pub momentum_stocks: Vec<PriceStats>,
    pub volatile_stocks: Vec<PriceStats>,
    pub breakouts: Vec<BreakoutEntry>,
}

pub struct TrendAnalyzer {
    max_size: usize,
    strategy: RestoreStrategy,

    /// Rankings against the previous snapshot
    default_rankings: TimeframeRankings,

    /// Rankings against historical baselines, by timeframe name
    timeframe_rankings: BTreeMap<String, TimeframeRankings>,

    sliding_window: SlidingWindow,

    current_metrics: HashMap<String, TickerSnapshot>,

    last_update: Option<i64>,

    baseline_provider: Option<Arc<dyn BaselineProvider>>,

    breakout_threshold_pct: f64,
    report_size: usize,

    /// Timestamp function (for testing with mock time)
    now_fn: Box<dyn Fn() -> i64 + Send + Sync>,
}

impl TrendAnalyzer {
    /// Analyzer with only the default heap pair
    ///
    /// # Panics
    /// Panics if `max_size` or `window_size` is 0.
    pub fn new(max_size: usize, window_size: usize) -> Self {
        Self {
            max_size,
            strategy: RestoreStrategy::default(),
            default_rankings: TimeframeRankings::new(max_size, RestoreStrategy::default()),
            timeframe_rankings: BTreeMap::new(),
            sliding_window: SlidingWindow::new(window_size),
            current_metrics: HashMap::new(),
            last_update: None,
            baseline_provider: None,
            breakout_threshold_pct: DEFAULT_BREAKOUT_THRESHOLD_PCT,
            report_size: DEFAULT_REPORT_SIZE,
            now_fn: Box::new(current_timestamp),
        }
    }

    pub fn from_config(config: &AnalyzerConfig) -> Self {
        let mut analyzer = Self::new(config.max_heap_size, config.window_size)
            .with_timeframes(config.timeframes.iter().map(String::as_str));
        analyzer.breakout_threshold_pct = config.breakout_threshold_pct;
        analyzer.report_size = config.report_size;
        analyzer
    }

    /// Add a gainers/losers pair per timeframe name (duplicates ignored)
    pub fn with_timeframes<'a, I>(mut self, timeframes: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let (capacity, strategy) = (self.max_size, self.strategy);
        for name in timeframes {
            self.timeframe_rankings
                .entry(name.to_string())
                .or_insert_with(|| TimeframeRankings::new(capacity, strategy));
        }
        self
    }

    pub fn with_baseline_provider(mut self, provider: Arc<dyn BaselineProvider>) -> Self {
        self.baseline_provider = Some(provider);
        self
    }

    pub fn with_timestamp_fn(mut self, now_fn: Box<dyn Fn() -> i64 + Send + Sync>) -> Self {
        self.now_fn = now_fn;
        self
    }

    /// Switch every heap to `strategy`. Only valid before the first update.
    pub fn with_restore_strategy(mut self, strategy: RestoreStrategy) -> Self {
        self.strategy = strategy;
        self.default_rankings = TimeframeRankings::new(self.max_size, strategy);
        for rankings in self.timeframe_rankings.values_mut() {
            *rankings = TimeframeRankings::new(self.max_size, strategy);
        }
        self
    }

    pub fn with_breakout_threshold(mut self, threshold_pct: f64) -> Self {
        self.breakout_threshold_pct = threshold_pct;
        self
    }

    pub fn with_report_size(mut self, report_size: usize) -> Self {
        self.report_size = report_size;
        self
    }

    /// Ingest one observation
    ///
    /// `pct_change` is 0 unless `previous_price` is present and positive.
    /// Baselines are fetched from the provider for every configured
    /// timeframe; prefer `update_batch` to fetch them once per cycle.
    pub fn update(
        &mut self,
        symbol: &str,
        current_price: f64,
        previous_price: Option<f64>,
        timestamp: Option<i64>,
    ) {
        let baselines = self.fetch_baselines();
        self.apply_update(symbol, current_price, previous_price, timestamp, &baselines);
    }

    /// Ingest every symbol in `price_data` that carries a price.
    ///
    /// Symbols are applied in sorted order so ties and `last_update` do not
    /// depend on map iteration order.
    pub fn update_batch(&mut self, price_data: &PriceBatch, previous_data: Option<&PriceBatch>) {
        let baselines = self.fetch_baselines();

        let mut symbols: Vec<&String> = price_data.keys().collect();
        symbols.sort();

        let mut applied = 0usize;
        for symbol in symbols {
            let quote = &price_data[symbol];
            let current_price = match quote.price {
                Some(price) => price,
                None => continue,
            };

            let previous_price = previous_data
                .and_then(|previous| previous.get(symbol))
                .and_then(|q| q.price);

            self.apply_update(symbol, current_price, previous_price, quote.timestamp, &baselines);
            applied += 1;
        }

        log::debug!(
            "Applied {} of {} quotes ({} timeframe baselines)",
            applied,
            price_data.len(),
            baselines.len()
        );
    }

    fn fetch_baselines(&self) -> HashMap<String, PriceBatch> {
        let mut baselines = HashMap::new();
        let provider = match &self.baseline_provider {
            Some(provider) => provider,
            None => return baselines,
        };

        for timeframe in self.timeframe_rankings.keys() {
            match provider.baseline_prices(timeframe) {
                Ok(batch) => {
                    baselines.insert(timeframe.clone(), batch);
                }
                Err(e @ BaselineError::UnknownTimeframe(_)) => {
                    log::debug!("No baselines for timeframe '{}': {}", timeframe, e);
                }
                Err(e) => {
                    log::warn!("⚠️  No baselines for timeframe '{}': {}", timeframe, e);
                }
            }
        }

        baselines
    }

    fn apply_update(
        &mut self,
        symbol: &str,
        current_price: f64,
        previous_price: Option<f64>,
        timestamp: Option<i64>,
        baselines: &HashMap<String, PriceBatch>,
    ) {
        let timestamp = timestamp.unwrap_or_else(|| (self.now_fn)());

        let pct_change = match previous_price {
            Some(previous) if previous > 0.0 => (current_price - previous) / previous * 100.0,
            _ => 0.0,
        };
        let pct_change = if pct_change.is_finite() { pct_change } else { 0.0 };

        self.default_rankings.push(symbol, pct_change, timestamp);
        self.sliding_window.update(symbol, current_price, Some(timestamp));

        self.current_metrics.insert(
            symbol.to_string(),
            TickerSnapshot {
                symbol: symbol.to_string(),
                current_price,
                previous_price,
                pct_change,
                timestamp,
            },
        );

        for (timeframe, rankings) in self.timeframe_rankings.iter_mut() {
            let batch = match baselines.get(timeframe) {
                Some(batch) => batch,
                None => continue,
            };
            if let Some(change) = change_against_baseline(current_price, batch.get(symbol)) {
                rankings.push(symbol, change, timestamp);
            }
        }

        self.last_update = Some(timestamp);
    }

    /// Drop `symbol` from every heap, the window and the snapshot map
    pub fn remove_symbol(&mut self, symbol: &str) -> bool {
        let mut removed = self.default_rankings.remove(symbol);
        for rankings in self.timeframe_rankings.values_mut() {
            removed |= rankings.remove(symbol);
        }
        removed |= self.sliding_window.is_tracked(symbol);
        self.sliding_window.remove_symbol(symbol);
        removed |= self.current_metrics.remove(symbol).is_some();
        removed
    }

    /// Heap pair for `timeframe`; unknown or absent names map to the default pair
    fn rankings_for(&self, timeframe: Option<&str>) -> &TimeframeRankings {
        timeframe
            .and_then(|name| self.timeframe_rankings.get(name))
            .unwrap_or(&self.default_rankings)
    }

    pub fn get_top_gainers(&self, n: Option<usize>, timeframe: Option<&str>) -> Vec<RankedEntry> {
        self.rankings_for(timeframe).gainers.get_top(n)
    }

    pub fn get_top_losers(&self, n: Option<usize>, timeframe: Option<&str>) -> Vec<RankedEntry> {
        self.rankings_for(timeframe).losers.get_top(n)
    }

    pub fn get_momentum_stocks(&self, n: usize) -> Vec<PriceStats> {
        self.sliding_window.get_top_performers(n, MetricField::Momentum)
    }

    pub fn get_highest_volatility(&self, n: usize) -> Vec<PriceStats> {
        self.sliding_window.get_top_performers(n, MetricField::Volatility)
    }

    pub fn get_top_performers(&self, n: usize, metric: MetricField) -> Vec<PriceStats> {
        self.sliding_window.get_top_performers(n, metric)
    }

    pub fn get_bottom_performers(&self, n: usize, metric: MetricField) -> Vec<PriceStats> {
        self.sliding_window.get_bottom_performers(n, metric)
    }

    pub fn calculate_metrics(&self, symbol: &str) -> Option<WindowMetrics> {
        self.sliding_window.calculate_metrics(symbol)
    }

    /// Symbols trading outside ±`threshold_pct` of their window average
    pub fn detect_breakouts(&self, threshold_pct: f64) -> Vec<BreakoutEntry> {
        let stats = self.sliding_window.rankable_stats();
        BreakoutDetector::new(threshold_pct).detect_all(&stats)
    }

    pub fn generate_summary_report(&self, timeframe: Option<&str>) -> SummaryReport {
        let timestamp = self.last_update.unwrap_or_else(|| (self.now_fn)());
        let datetime = chrono::DateTime::from_timestamp(timestamp, 0)
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_default();

        let timeframe = timeframe
            .filter(|name| self.timeframe_rankings.contains_key(*name))
            .map(str::to_string);

        let n = self.report_size;
        let mut breakouts = self.detect_breakouts(self.breakout_threshold_pct);
        breakouts.truncate(n);

        SummaryReport {
            timestamp,
            datetime,
            top_gainers: self.get_top_gainers(Some(n), timeframe.as_deref()),
            top_losers: self.get_top_losers(Some(n), timeframe.as_deref()),
            timeframe,
            momentum_stocks: self.get_momentum_stocks(n),
            volatile_stocks: self.get_highest_volatility(n),
            breakouts,
        }
    }

    pub fn current_metrics(&self) -> &HashMap<String, TickerSnapshot> {
        &self.current_metrics
    }

    pub fn snapshot(&self, symbol: &str) -> Option<&TickerSnapshot> {
        self.current_metrics.get(symbol)
    }

    pub fn last_update(&self) -> Option<i64> {
        self.last_update
    }

    pub fn timeframe_last_update(&self, timeframe: &str) -> Option<i64> {
        self.timeframe_rankings
            .get(timeframe)
            .and_then(|rankings| rankings.last_update)
    }

    pub fn timeframes(&self) -> Vec<&str> {
        self.timeframe_rankings.keys().map(String::as_str).collect()
    }

    pub fn sliding_window(&self) -> &SlidingWindow {
        &self.sliding_window
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }
}
