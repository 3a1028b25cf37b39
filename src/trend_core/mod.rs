//! Trend Core - In-process price trend analytics
//!
//! This module ranks symbols by percentage change and tracks rolling
//! per-symbol statistics from periodic price snapshots.
//!
//! # Architecture
//!
//! ```text
//! PriceSource (JSONL replay, external fetchers) → PriceBatch
//!     ↓
//! TrendAnalyzer::update_batch (previous snapshot + timeframe baselines)
//!     ↓
//! BoundedRankingHeap pairs (default + one per timeframe)   SlidingWindow
//!     ↓                                                       ↓
//! get_top_gainers / get_top_losers         window metrics, BreakoutDetector
//!     ↓
//! SummaryReport
//! ```
//!
//! The core never blocks on I/O. Baseline lookups go through the
//! `BaselineProvider` seam and any failure degrades to "no baseline".

pub mod analyzer;
pub mod detector;
pub mod ingestion;
pub mod ranking;
pub mod source;
pub mod timeframe;
pub mod types;
pub mod window;

pub use analyzer::{SummaryReport, TickerSnapshot, TimeframeRankings, TrendAnalyzer, DEFAULT_REPORT_SIZE};
pub use detector::{BreakoutDetector, BreakoutEntry, BreakoutType, DEFAULT_BREAKOUT_THRESHOLD_PCT};
pub use ingestion::{analyzer_ingestion_task, shared, spawn_ingestion, AnalyzerMessage, SharedAnalyzer};
pub use ranking::{BoundedRankingHeap, Polarity, RankedEntry, RestoreStrategy};
pub use source::{JsonlSnapshotSource, PriceSource};
pub use timeframe::{BaselineError, BaselineProvider, SnapshotBaselineProvider};
pub use types::{parse_snapshot_line, PriceBatch, PriceQuote, SnapshotError};
pub use window::{MetricField, PricePoint, PriceStats, SlidingWindow, WindowMetrics};
