//! Pull sources of current-price snapshots
//!
//! The analyzer never fetches data itself. A `PriceSource` hands out one
//! `PriceBatch` per cycle; the driver decides when to ask.

use super::types::{parse_snapshot_line, PriceBatch, SnapshotError};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader, Lines};

/// Backend trait for snapshot sources
#[async_trait]
pub trait PriceSource: Send {
    /// Next snapshot, or `None` once the source is exhausted
    async fn next_snapshot(&mut self) -> Result<Option<PriceBatch>, SnapshotError>;

    /// Get source type for logging
    fn source_type(&self) -> &'static str;
}

/// Replays snapshots from a JSONL file, one `PriceBatch` per line
pub struct JsonlSnapshotSource {
    path: PathBuf,
    lines: Lines<BufReader<File>>,
    line_number: usize,
    skipped: usize,
}

impl JsonlSnapshotSource {
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).await?;

        Ok(Self {
            path,
            lines: BufReader::new(file).lines(),
            line_number: 0,
            skipped: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Malformed lines skipped so far
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

#[async_trait]
impl PriceSource for JsonlSnapshotSource {
    async fn next_snapshot(&mut self) -> Result<Option<PriceBatch>, SnapshotError> {
        while let Some(line) = self.lines.next_line().await? {
            self.line_number += 1;
            if line.trim().is_empty() {
                continue;
            }

            match parse_snapshot_line(&line) {
                Ok(batch) => return Ok(Some(batch)),
                Err(e) => {
                    self.skipped += 1;
                    log::warn!(
                        "⚠️  Skipping malformed snapshot at {}:{}: {}",
                        self.path.display(),
                        self.line_number,
                        e
                    );
                }
            }
        }

        Ok(None)
    }

    fn source_type(&self) -> &'static str {
        "jsonl"
    }
}
