//! Single-writer ingestion over a shared analyzer
//!
//! Snapshots arrive through a channel and are applied by one background
//! task holding the write lock for the duration of a batch. Readers take
//! the read lock, so a query never observes a half-applied batch.

use super::analyzer::TrendAnalyzer;
use super::types::PriceBatch;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tokio::task::JoinHandle;

pub type SharedAnalyzer = Arc<RwLock<TrendAnalyzer>>;

/// Message sent through the channel from a snapshot driver to the ingestion task
#[derive(Debug, Clone)]
pub enum AnalyzerMessage {
    /// Current prices; compared against the previous `Snapshot`
    Snapshot(PriceBatch),
    /// Current prices with an explicit comparison snapshot; `current`
    /// becomes the base for the next `Snapshot`
    Batch {
        current: PriceBatch,
        previous: Option<PriceBatch>,
    },
    Shutdown,
}

pub fn shared(analyzer: TrendAnalyzer) -> SharedAnalyzer {
    Arc::new(RwLock::new(analyzer))
}

/// Background task that receives snapshots and applies them to the analyzer
///
/// Returns the number of batches applied.
pub async fn analyzer_ingestion_task(
    mut receiver: mpsc::Receiver<AnalyzerMessage>,
    analyzer: SharedAnalyzer,
) -> usize {
    log::info!("Analyzer ingestion task started");

    let mut previous: Option<PriceBatch> = None;
    let mut applied = 0usize;

    while let Some(message) = receiver.recv().await {
        match message {
            AnalyzerMessage::Snapshot(current) => {
                let mut analyzer = analyzer.write().await;
                analyzer.update_batch(&current, previous.as_ref());
                drop(analyzer);
                previous = Some(current);
                applied += 1;
            }
            AnalyzerMessage::Batch { current, previous: explicit } => {
                let mut analyzer = analyzer.write().await;
                analyzer.update_batch(&current, explicit.as_ref());
                drop(analyzer);
                previous = Some(current);
                applied += 1;
            }
            AnalyzerMessage::Shutdown => {
                log::info!("Analyzer ingestion received shutdown signal");
                break;
            }
        }
    }

    log::info!("Analyzer ingestion task stopped after {} batches", applied);
    applied
}

/// Spawn the ingestion task, returning its sender and handle
pub fn spawn_ingestion(
    analyzer: SharedAnalyzer,
    buffer: usize,
) -> (mpsc::Sender<AnalyzerMessage>, JoinHandle<usize>) {
    let (tx, rx) = mpsc::channel(buffer);
    let handle = tokio::spawn(analyzer_ingestion_task(rx, analyzer));
    (tx, handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trend_core::types::PriceQuote;

    fn snapshot(entries: &[(&str, f64, i64)]) -> PriceBatch {
        entries
            .iter()
            .map(|(symbol, price, ts)| (symbol.to_string(), PriceQuote::new(*price, *ts)))
            .collect()
    }

    #[tokio::test]
    async fn test_snapshots_compare_against_previous() {
        let analyzer = shared(TrendAnalyzer::new(5, 10));
        let (tx, handle) = spawn_ingestion(analyzer.clone(), 4);

        tx.send(AnalyzerMessage::Snapshot(snapshot(&[("A", 100.0, 1), ("B", 50.0, 1)])))
            .await
            .unwrap();
        tx.send(AnalyzerMessage::Snapshot(snapshot(&[("A", 110.0, 2), ("B", 40.0, 2)])))
            .await
            .unwrap();
        tx.send(AnalyzerMessage::Shutdown).await.unwrap();

        assert_eq!(handle.await.unwrap(), 2);

        let analyzer = analyzer.read().await;
        let gainers = analyzer.get_top_gainers(None, None);
        assert_eq!(gainers[0].symbol, "A");
        assert!((gainers[0].value - 10.0).abs() < 1e-9);
        assert_eq!(analyzer.get_top_losers(Some(1), None)[0].symbol, "B");
        assert_eq!(analyzer.last_update(), Some(2));
    }

    #[tokio::test]
    async fn test_explicit_batch_and_channel_close() {
        let analyzer = shared(TrendAnalyzer::new(5, 10));
        let (tx, handle) = spawn_ingestion(analyzer.clone(), 4);

        tx.send(AnalyzerMessage::Batch {
            current: snapshot(&[("A", 90.0, 7)]),
            previous: Some(snapshot(&[("A", 100.0, 6)])),
        })
        .await
        .unwrap();
        drop(tx);

        assert_eq!(handle.await.unwrap(), 1);
        let analyzer = analyzer.read().await;
        assert_eq!(analyzer.snapshot("A").map(|s| s.pct_change), Some(-10.0));
    }

    #[tokio::test]
    async fn test_snapshot_after_batch_compares_against_batch() {
        let analyzer = shared(TrendAnalyzer::new(5, 10));
        let (tx, handle) = spawn_ingestion(analyzer.clone(), 4);

        tx.send(AnalyzerMessage::Snapshot(snapshot(&[("A", 50.0, 1)])))
            .await
            .unwrap();
        tx.send(AnalyzerMessage::Batch {
            current: snapshot(&[("A", 100.0, 2)]),
            previous: None,
        })
        .await
        .unwrap();
        tx.send(AnalyzerMessage::Snapshot(snapshot(&[("A", 120.0, 3)])))
            .await
            .unwrap();
        tx.send(AnalyzerMessage::Shutdown).await.unwrap();

        assert_eq!(handle.await.unwrap(), 3);
        let analyzer = analyzer.read().await;
        let snapshot = analyzer.snapshot("A").unwrap();
        assert_eq!(snapshot.previous_price, Some(100.0));
        assert_eq!(snapshot.pct_change, 20.0);
    }
}
