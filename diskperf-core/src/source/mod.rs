//! Device statistics source abstraction.
//!
//! A source hands out one immutable [`CounterSnapshot`] of a device's
//! cumulative counters per call. How the counters are obtained (a kernel
//! interface, a collector process, a test script) is up to the
//! implementation.

mod channel;
mod file;
mod scripted;

pub use channel::ChannelSource;
pub use file::FileSource;
pub use scripted::ScriptedSource;

use std::collections::BTreeMap;
use std::fmt::Debug;

use diskperf_types::CounterSnapshot;

use crate::StatsError;

/// Counter snapshots keyed by device identity.
///
/// This is the document a [`FileSource`] reads and the value a
/// [`ChannelSource`] receives.
pub type DeviceStats = BTreeMap<String, CounterSnapshot>;

/// Trait for reading cumulative counters of a block device.
///
/// # Example
///
/// ```
/// use diskperf_core::{DeviceStatsSource, ScriptedSource};
/// use diskperf_types::CounterSnapshot;
///
/// let mut source = ScriptedSource::new(vec![Ok(CounterSnapshot::at(1))]);
/// let snapshot = source.read("/dev/sda").unwrap();
/// assert_eq!(snapshot.timestamp_ns, 1);
/// ```
pub trait DeviceStatsSource: Send + Debug {
    /// Read a fresh snapshot of the device's counters.
    ///
    /// All counters of one snapshot must be consistent with each other.
    /// Errors are reported, never panicked.
    fn read(&mut self, device: &str) -> Result<CounterSnapshot, StatsError>;

    /// Whether read and write busy times are reported separately.
    ///
    /// Sources that only know a combined busy time put it in the read busy
    /// counter and return `false`.
    fn supports_separate_busy(&self) -> bool {
        true
    }

    /// Probe whether extended statistics exist at all.
    ///
    /// Called once before the first tick. [`StatsError::Unsupported`] stops
    /// the monitor for good; other errors are logged and sampling proceeds.
    fn check_availability(&mut self) -> Result<(), StatsError> {
        Ok(())
    }

    /// Returns a human-readable description of the source.
    fn description(&self) -> &str;
}

impl<S: DeviceStatsSource + ?Sized> DeviceStatsSource for Box<S> {
    fn read(&mut self, device: &str) -> Result<CounterSnapshot, StatsError> {
        (**self).read(device)
    }

    fn supports_separate_busy(&self) -> bool {
        (**self).supports_separate_busy()
    }

    fn check_availability(&mut self) -> Result<(), StatsError> {
        (**self).check_availability()
    }

    fn description(&self) -> &str {
        (**self).description()
    }
}
