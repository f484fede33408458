//! File-based statistics source.
//!
//! Re-reads a JSON document of device counters on every call.

use std::fs;
use std::path::{Path, PathBuf};

use diskperf_types::CounterSnapshot;

use super::{DeviceStats, DeviceStatsSource};
use crate::StatsError;

/// A source that reads counters from a JSON file kept current by an
/// external collector.
///
/// The file maps device identities to counter snapshots:
///
/// ```json
/// {
///   "/dev/sda": {
///     "timestamp_ns": 1000000000,
///     "read_bytes": 41943040,
///     "write_bytes": 0,
///     "read_busy_ns": 250000000,
///     "write_busy_ns": 0,
///     "queue_length": 1
///   }
/// }
/// ```
///
/// The file is read in full on each call, so a collector that rewrites it
/// between ticks is picked up without any notification.
#[derive(Debug)]
pub struct FileSource {
    path: PathBuf,
    description: String,
    separate_busy: bool,
}

impl FileSource {
    /// Create a new file source for the given path.
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let description = format!("file: {}", path.display());
        Self {
            path,
            description,
            separate_busy: true,
        }
    }

    /// Declare whether the collector reports read and write busy time
    /// separately. Defaults to `true`.
    pub fn with_separate_busy(mut self, separate_busy: bool) -> Self {
        self.separate_busy = separate_busy;
        self
    }

    /// Returns the path being read.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_stats(&self) -> Result<DeviceStats, StatsError> {
        let content = fs::read_to_string(&self.path)?;
        Ok(serde_json::from_str(&content)?)
    }
}

impl DeviceStatsSource for FileSource {
    fn read(&mut self, device: &str) -> Result<CounterSnapshot, StatsError> {
        self.read_stats()?
            .remove(device)
            .ok_or_else(|| StatsError::NotFound(device.to_string()))
    }

    fn supports_separate_busy(&self) -> bool {
        self.separate_busy
    }

    fn check_availability(&mut self) -> Result<(), StatsError> {
        fs::metadata(&self.path)
            .map(|_| ())
            .map_err(|e| StatsError::Unsupported(format!("{}: {}", self.path.display(), e)))
    }

    fn description(&self) -> &str {
        &self.description
    }
}
