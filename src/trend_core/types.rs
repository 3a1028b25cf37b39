//! Price snapshot input model and JSONL snapshot parsing

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// One observation for a symbol as delivered by the data source.
///
/// Both fields are optional on the wire: a null price is skipped by the
/// analyzer, and a missing timestamp is replaced with "now".
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PriceQuote {
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub timestamp: Option<i64>,
}

impl PriceQuote {
    pub fn new(price: f64, timestamp: i64) -> Self {
        Self {
            price: Some(price),
            timestamp: Some(timestamp),
        }
    }

    pub fn price_only(price: f64) -> Self {
        Self {
            price: Some(price),
            timestamp: None,
        }
    }
}

/// Mapping of symbol -> quote for a single fetch cycle
pub type PriceBatch = HashMap<String, PriceQuote>;

#[derive(Debug)]
pub enum SnapshotError {
    Io(std::io::Error),
    Parse(serde_json::Error),
}

impl From<std::io::Error> for SnapshotError {
    fn from(err: std::io::Error) -> Self {
        SnapshotError::Io(err)
    }
}

impl From<serde_json::Error> for SnapshotError {
    fn from(err: serde_json::Error) -> Self {
        SnapshotError::Parse(err)
    }
}

impl std::fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SnapshotError::Io(e) => write!(f, "IO error: {}", e),
            SnapshotError::Parse(e) => write!(f, "Snapshot parse error: {}", e),
        }
    }
}

impl std::error::Error for SnapshotError {}

/// Parse one JSONL line of the form `{"AAPL": {"price": 1.0, "timestamp": 2}, ...}`
pub fn parse_snapshot_line(line: &str) -> Result<PriceBatch, SnapshotError> {
    let batch: PriceBatch = serde_json::from_str(line)?;
    Ok(batch)
}

/// Helper to get current Unix timestamp
pub fn current_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}
