//! # diskperf-types
//!
//! Core types for block device performance sampling. This crate defines the
//! data exchanged between a device statistics source, the sampling engine in
//! `diskperf-core`, and whatever presents the result (a terminal, a panel
//! applet, a JSON file).
//!
//! ## Features
//!
//! - `serde`: JSON/TOML/etc. serialization via serde
//!
//! ## Example
//!
//! ```rust
//! use diskperf_types::{CounterSnapshot, DisplayConfig, MetricMode, MetricSlot};
//!
//! let snapshot = CounterSnapshot::at(1_000_000_000)
//!     .reads(41_943_040, 250_000_000)
//!     .writes(0, 0)
//!     .queue_length(1);
//! assert!(snapshot.busy_available());
//!
//! let config = DisplayConfig::default().mode(MetricMode::BusyTime);
//! assert_eq!(config.visible_slots(), vec![MetricSlot::Combined]);
//! ```

mod color;
mod config;
mod payload;
mod snapshot;

pub use color::*;
pub use config::*;
pub use payload::*;
pub use snapshot::*;

/// Conversion factor from bytes per nanosecond to megabytes per second.
pub const BYTES_PER_NS_TO_MB_PER_S: f64 = 1_000_000_000.0 / (1024.0 * 1024.0);
