//! Trend Replay Binary - Feeds recorded price snapshots through the analyzer
//!
//! Reads one `PriceBatch` per JSONL line, applies each line against the
//! previous one, and prints the final summary report as JSON on stdout.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release --bin trend_replay -- data/snapshots.jsonl
//! ```
//!
//! ## Environment Variables
//!
//! - TREND_SNAPSHOT_PATH - Snapshot file when no argument is given (default: data/snapshots.jsonl)
//! - TREND_BASELINE_PATH - Optional JSON file `{timeframe: {symbol: {price, timestamp}}}`
//! - TREND_REPORT_EVERY - Log an interim summary every N snapshots (default: 10)
//! - TREND_REPORT_TIMEFRAME - Timeframe used for report rankings (optional)
//! - TREND_MAX_HEAP_SIZE, TREND_WINDOW_SIZE, TREND_TIMEFRAMES,
//!   TREND_BREAKOUT_THRESHOLD_PCT, TREND_REPORT_SIZE, TREND_CHANNEL_BUFFER
//! - RUST_LOG - Logging level (optional, default: info)

use std::collections::HashMap;
use std::env;
use std::sync::Arc;
use trendflow::trend_core::{
    shared, spawn_ingestion, AnalyzerMessage, JsonlSnapshotSource, PriceBatch, PriceSource,
    SnapshotBaselineProvider, SummaryReport,
};
use trendflow::{AnalyzerConfig, TrendAnalyzer};

fn load_baselines(path: &str) -> Result<SnapshotBaselineProvider, Box<dyn std::error::Error>> {
    let contents = std::fs::read_to_string(path)?;
    let snapshots: HashMap<String, PriceBatch> = serde_json::from_str(&contents)?;
    Ok(SnapshotBaselineProvider::from_snapshots(snapshots))
}

fn log_report(report: &SummaryReport) {
    log::info!("📊 Summary at {}", report.datetime);
    if let Some(timeframe) = &report.timeframe {
        log::info!("   Timeframe: {}", timeframe);
    }
    for entry in &report.top_gainers {
        log::info!("   ▲ {:<8} {:>8.2}%", entry.symbol, entry.value);
    }
    for entry in &report.top_losers {
        log::info!("   ▼ {:<8} {:>8.2}%", entry.symbol, entry.value);
    }
    for breakout in &report.breakouts {
        log::info!(
            "   🚨 {} {} breakout {:.2}%",
            breakout.stats.symbol,
            breakout.breakout_type.as_str(),
            breakout.breakout_pct
        );
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let config = AnalyzerConfig::from_env()?;

    let snapshot_path = env::args()
        .nth(1)
        .or_else(|| env::var("TREND_SNAPSHOT_PATH").ok())
        .unwrap_or_else(|| "data/snapshots.jsonl".to_string());
    let report_every: usize = env::var("TREND_REPORT_EVERY")
        .ok()
        .and_then(|s| s.parse().ok())
        .filter(|n| *n > 0)
        .unwrap_or(10);
    let report_timeframe = env::var("TREND_REPORT_TIMEFRAME").ok();

    log::info!("🚀 Starting Trend Replay");
    log::info!("   Snapshots: {}", snapshot_path);
    log::info!("   Heap size: {}", config.max_heap_size);
    log::info!("   Window size: {}", config.window_size);
    log::info!("   Timeframes: {:?}", config.timeframes);
    log::info!("   Breakout threshold: {}%", config.breakout_threshold_pct);

    let mut analyzer = TrendAnalyzer::from_config(&config);
    if let Ok(path) = env::var("TREND_BASELINE_PATH") {
        let provider = load_baselines(&path)?;
        log::info!("   Baselines: {}", path);
        analyzer = analyzer.with_baseline_provider(Arc::new(provider));
    }

    let analyzer = shared(analyzer);
    let (tx, ingestion) = spawn_ingestion(analyzer.clone(), config.channel_buffer);

    let mut source = JsonlSnapshotSource::open(&snapshot_path).await?;
    log::info!("✅ Opened {} source", source.source_type());

    let mut sent = 0usize;
    while let Some(batch) = source.next_snapshot().await? {
        tx.send(AnalyzerMessage::Snapshot(batch)).await?;
        sent += 1;

        if sent % report_every == 0 {
            let report = analyzer
                .read()
                .await
                .generate_summary_report(report_timeframe.as_deref());
            log_report(&report);
        }
    }

    tx.send(AnalyzerMessage::Shutdown).await?;
    let applied = ingestion.await?;
    log::info!(
        "🏁 Replay finished: {} snapshots applied, {} malformed lines skipped",
        applied,
        source.skipped()
    );

    let report = analyzer
        .read()
        .await
        .generate_summary_report(report_timeframe.as_deref());
    log_report(&report);
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
