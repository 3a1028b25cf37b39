//! Integration tests for the snapshot → analyzer → report flow
//!
//! Key integration points tested:
//! - JSONL snapshot source feeding the ingestion channel
//! - Timeframe baselines from a provider alongside the default rankings
//! - Breakout and momentum queries over the shared analyzer
//! - Summary report serialization

#[cfg(test)]
mod trend_pipeline_tests {
    use std::io::Write;
    use std::sync::Arc;
    use trendflow::trend_core::{
        shared, spawn_ingestion, AnalyzerMessage, BreakoutType, JsonlSnapshotSource, PriceBatch,
        PriceQuote, PriceSource, SnapshotBaselineProvider,
    };
    use trendflow::TrendAnalyzer;

    fn snapshot_line(prices: &[(&str, f64)], timestamp: i64) -> String {
        let entries: Vec<String> = prices
            .iter()
            .map(|(symbol, price)| {
                format!(r#""{}":{{"price":{},"timestamp":{}}}"#, symbol, price, timestamp)
            })
            .collect();
        format!("{{{}}}", entries.join(","))
    }

    #[tokio::test]
    async fn test_replay_file_through_ingestion() {
        // Test: JSONL file → source → channel → analyzer → report
        let mut file = tempfile::NamedTempFile::new().unwrap();
        let rounds: [[(&str, f64); 3]; 6] = [
            [("AAPL", 100.0), ("TSLA", 200.0), ("NVDA", 50.0)],
            [("AAPL", 101.0), ("TSLA", 198.0), ("NVDA", 50.5)],
            [("AAPL", 102.0), ("TSLA", 196.0), ("NVDA", 50.0)],
            [("AAPL", 101.5), ("TSLA", 194.0), ("NVDA", 50.2)],
            [("AAPL", 102.5), ("TSLA", 190.0), ("NVDA", 50.1)],
            [("AAPL", 125.0), ("TSLA", 150.0), ("NVDA", 50.3)],
        ];
        for (i, round) in rounds.iter().enumerate() {
            writeln!(file, "{}", snapshot_line(round, 1_700_000_000 + i as i64 * 60)).unwrap();
        }
        file.flush().unwrap();

        let analyzer = shared(TrendAnalyzer::new(2, 5));
        let (tx, handle) = spawn_ingestion(analyzer.clone(), 2);

        let mut source = JsonlSnapshotSource::open(file.path()).await.unwrap();
        while let Some(batch) = source.next_snapshot().await.unwrap() {
            tx.send(AnalyzerMessage::Snapshot(batch)).await.unwrap();
        }
        tx.send(AnalyzerMessage::Shutdown).await.unwrap();
        assert_eq!(handle.await.unwrap(), 6);

        let analyzer = analyzer.read().await;

        // Last cycle: AAPL +21.95%, NVDA +0.4%, TSLA -21.05%
        let gainers = analyzer.get_top_gainers(None, None);
        assert_eq!(gainers[0].symbol, "AAPL");
        assert_eq!(gainers[1].symbol, "NVDA");
        assert_eq!(analyzer.get_top_losers(Some(1), None)[0].symbol, "TSLA");

        // Window of 5 drops the first round
        let aapl = analyzer.sliding_window().get_window("AAPL");
        assert_eq!(aapl.len(), 5);
        assert_eq!(aapl[0].price, 101.0);

        let breakouts = analyzer.detect_breakouts(5.0);
        let kinds: Vec<(&str, BreakoutType)> = breakouts
            .iter()
            .map(|b| (b.stats.symbol.as_str(), b.breakout_type))
            .collect();
        assert!(kinds.contains(&("AAPL", BreakoutType::Upward)));
        assert!(kinds.contains(&("TSLA", BreakoutType::Downward)));
        assert!(!kinds.iter().any(|(s, _)| *s == "NVDA"));

        let report = analyzer.generate_summary_report(None);
        assert_eq!(report.timestamp, 1_700_000_300);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["top_gainers"][0]["symbol"], "AAPL");
        assert!(json["breakouts"].as_array().unwrap().len() >= 2);
    }

    #[tokio::test]
    async fn test_timeframe_rankings_with_provider() {
        // Test: baselines feed their own heap pair, independent of the default pair
        let provider = Arc::new(SnapshotBaselineProvider::new());
        provider.set_price("one_week", "AAPL", PriceQuote::new(80.0, 1));
        provider.set_price("one_week", "TSLA", PriceQuote::new(250.0, 1));
        provider.set_price("two_week", "TSLA", PriceQuote::new(100.0, 1));

        let analyzer = TrendAnalyzer::new(5, 10)
            .with_timeframes(["one_week", "two_week"])
            .with_baseline_provider(provider.clone());
        let analyzer = shared(analyzer);
        let (tx, handle) = spawn_ingestion(analyzer.clone(), 4);

        let current: PriceBatch = [("AAPL", PriceQuote::new(100.0, 10)), ("TSLA", PriceQuote::new(200.0, 10))]
            .into_iter()
            .map(|(s, q)| (s.to_string(), q))
            .collect();
        tx.send(AnalyzerMessage::Snapshot(current)).await.unwrap();
        drop(tx);
        handle.await.unwrap();

        let analyzer = analyzer.read().await;

        let week = analyzer.get_top_gainers(None, Some("one_week"));
        assert_eq!(week.len(), 2);
        assert_eq!(week[0].symbol, "AAPL");
        assert_eq!(week[0].value, 25.0);
        assert_eq!(week[1].value, -20.0);

        let fortnight = analyzer.get_top_gainers(None, Some("two_week"));
        assert_eq!(fortnight.len(), 1);
        assert_eq!(fortnight[0].value, 100.0);

        // No previous snapshot: default pair ranks everything at zero
        assert!(analyzer.get_top_gainers(None, None).iter().all(|e| e.value == 0.0));

        let report = analyzer.generate_summary_report(Some("one_week"));
        assert_eq!(report.timeframe.as_deref(), Some("one_week"));
        assert_eq!(report.top_losers[0].symbol, "TSLA");
    }
}
