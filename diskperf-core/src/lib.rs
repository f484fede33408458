//! # diskperf-core
//!
//! Sampling engine for block device I/O monitoring.
//!
//! Given a source of cumulative device counters, diskperf-core takes a
//! snapshot every refresh period, turns the differences between
//! consecutive snapshots into transfer rates (MB/s) and busy-time
//! percentages, and normalizes them into bar fractions for display.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use diskperf_core::{FileSource, Monitor, MonitorConfig, Output};
//!
//! #[tokio::main]
//! async fn main() {
//!     let source = FileSource::new("/run/diskperf/stats.json");
//!     let (output, mut rx) = Output::channel(16);
//!
//!     let handle = Monitor::new(source)
//!         .output(output)
//!         .start(MonitorConfig::new("/dev/sda"));
//!
//!     while let Some(event) = rx.recv().await {
//!         println!("{event:?}");
//!     }
//!
//!     handle.shutdown().await.unwrap();
//! }
//! ```
//!
//! ## Sources
//!
//! - [`FileSource`]: a JSON document of counters, re-read every tick
//! - [`ChannelSource`]: counters pushed in-process over a watch channel
//! - [`ScriptedSource`]: a fixed sequence of results, for tests
//!
//! ## Outputs
//!
//! - `Output::Stdout` - one JSON line per update
//! - `Output::file(path)` - the latest update as a JSON file
//! - `Output::channel(buffer)` - [`MonitorEvent`]s for an in-process consumer

mod error;
mod monitor;
mod output;
mod sampler;
mod source;

pub use error::{MonitorError, StatsError};
pub use monitor::{Monitor, MonitorConfig, MonitorHandle, DEFAULT_PERIOD_MS, MAX_DEVICE_CHARS};
pub use output::{MonitorEvent, Output, Update};
pub use sampler::{clamp_fraction, Deltas, Metrics, Sample, Sampler, SlotValues};
pub use source::{ChannelSource, DeviceStats, DeviceStatsSource, FileSource, ScriptedSource};

// Re-export types for convenience
pub use diskperf_types as types;
