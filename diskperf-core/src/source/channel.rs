//! Channel-based statistics source.
//!
//! Receives device counters via a tokio watch channel. Useful when the
//! counters are collected elsewhere in the process (or pushed over a
//! network) rather than read on demand.

use diskperf_types::CounterSnapshot;
use tokio::sync::watch;

use super::{DeviceStats, DeviceStatsSource};
use crate::StatsError;

/// A source that serves the latest counters published on a channel.
///
/// Reading does not consume anything: if nothing new was published since
/// the last tick, the same snapshot is returned again and the sampler
/// treats it as a zero-length interval.
///
/// # Example
///
/// ```
/// use diskperf_core::{ChannelSource, DeviceStatsSource};
/// use diskperf_types::CounterSnapshot;
///
/// let (tx, mut source) = ChannelSource::create("collector");
/// tx.send_modify(|stats| {
///     stats.insert("/dev/sda".to_string(), CounterSnapshot::at(5));
/// });
///
/// assert_eq!(source.read("/dev/sda").unwrap().timestamp_ns, 5);
/// ```
#[derive(Debug)]
pub struct ChannelSource {
    receiver: watch::Receiver<DeviceStats>,
    description: String,
    separate_busy: bool,
}

impl ChannelSource {
    /// Create a new channel source.
    ///
    /// # Arguments
    ///
    /// * `receiver` - The receiving end of a watch channel
    /// * `source_description` - Where the counters come from
    pub fn new(receiver: watch::Receiver<DeviceStats>, source_description: &str) -> Self {
        Self {
            receiver,
            description: format!("channel: {}", source_description),
            separate_busy: true,
        }
    }

    /// Create a channel pair for publishing counters to a `ChannelSource`.
    pub fn create(source_description: &str) -> (watch::Sender<DeviceStats>, Self) {
        let (tx, rx) = watch::channel(DeviceStats::new());
        (tx, Self::new(rx, source_description))
    }

    /// Declare whether the publisher reports read and write busy time
    /// separately. Defaults to `true`.
    pub fn with_separate_busy(mut self, separate_busy: bool) -> Self {
        self.separate_busy = separate_busy;
        self
    }
}

impl DeviceStatsSource for ChannelSource {
    fn read(&mut self, device: &str) -> Result<CounterSnapshot, StatsError> {
        if self.receiver.has_changed().is_err() {
            return Err(StatsError::Disconnected);
        }
        self.receiver
            .borrow_and_update()
            .get(device)
            .copied()
            .ok_or_else(|| StatsError::NotFound(device.to_string()))
    }

    fn supports_separate_busy(&self) -> bool {
        self.separate_busy
    }

    fn description(&self) -> &str {
        &self.description
    }
}
