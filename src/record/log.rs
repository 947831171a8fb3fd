//! Fixation log file — incremental append during capture, bulk read for
//! aggregation.

use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;

use super::{FixationRecord, RecordError};

/// Append-only fixation log.
///
/// Each record is written and flushed as soon as it is built so a crash or
/// presence loss loses at most the fixation in flight.
pub struct FixationLog {
    path: PathBuf,
    file: File,
    written: u64,
}

impl FixationLog {
    /// Open `path` for appending, creating it if missing.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, RecordError> {
        let path = path.into();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        tracing::info!(path = %path.display(), "fixation log opened");
        Ok(Self {
            path,
            file,
            written: 0,
        })
    }

    /// Create a timestamped log (`fixation_data_<unix-seconds>.csv`) in `dir`.
    pub async fn create_in(dir: &Path) -> Result<Self, RecordError> {
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        Self::open(dir.join(format!("fixation_data_{secs}.csv"))).await
    }

    pub async fn append(&mut self, record: &FixationRecord) -> Result<(), RecordError> {
        self.file.write_all(record.to_string().as_bytes()).await?;
        self.file.flush().await?;
        self.written += 1;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Records appended through this handle.
    pub fn written(&self) -> u64 {
        self.written
    }
}

/// Read every parsable record from a log, in file order.
///
/// Malformed lines are logged and skipped; blank lines are ignored. Invalid
/// records (zero tracker start) are returned as-is and left for the
/// aggregator to drop.
pub async fn read_records(path: &Path) -> Result<Vec<FixationRecord>, RecordError> {
    let content = tokio::fs::read_to_string(path).await?;

    let mut records = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match FixationRecord::parse_line(line, idx + 1) {
            Ok(record) => records.push(record),
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "skipping log line"),
        }
    }

    tracing::debug!(path = %path.display(), records = records.len(), "fixation log read");
    Ok(records)
}
