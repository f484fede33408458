//! Scripted statistics source.
//!
//! Plays back a fixed sequence of read results. Used to drive the monitor
//! in tests and benchmarks without a real device.

use std::collections::VecDeque;

use diskperf_types::CounterSnapshot;

use super::DeviceStatsSource;
use crate::StatsError;

/// A source that returns queued results in order.
///
/// Once the queue is empty every read fails with
/// [`StatsError::Disconnected`]. Each read records the device it was asked
/// for, so tests can check what the monitor requested.
#[derive(Debug)]
pub struct ScriptedSource {
    script: VecDeque<Result<CounterSnapshot, StatsError>>,
    requests: Vec<String>,
    separate_busy: bool,
    availability: Option<StatsError>,
}

impl ScriptedSource {
    /// Create a source that plays back `script`.
    pub fn new(script: impl IntoIterator<Item = Result<CounterSnapshot, StatsError>>) -> Self {
        Self {
            script: script.into_iter().collect(),
            requests: Vec::new(),
            separate_busy: true,
            availability: None,
        }
    }

    /// Append one result to the end of the script.
    pub fn push(&mut self, result: Result<CounterSnapshot, StatsError>) {
        self.script.push_back(result);
    }

    /// Declare whether read and write busy time are reported separately.
    pub fn with_separate_busy(mut self, separate_busy: bool) -> Self {
        self.separate_busy = separate_busy;
        self
    }

    /// Make the availability probe fail with `err`.
    pub fn unavailable(mut self, err: StatsError) -> Self {
        self.availability = Some(err);
        self
    }

    /// Devices requested so far, in order.
    pub fn requests(&self) -> &[String] {
        &self.requests
    }

    /// Number of results still queued.
    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl Default for ScriptedSource {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl DeviceStatsSource for ScriptedSource {
    fn read(&mut self, device: &str) -> Result<CounterSnapshot, StatsError> {
        self.requests.push(device.to_string());
        self.script.pop_front().unwrap_or(Err(StatsError::Disconnected))
    }

    fn supports_separate_busy(&self) -> bool {
        self.separate_busy
    }

    fn check_availability(&mut self) -> Result<(), StatsError> {
        match &self.availability {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn description(&self) -> &str {
        "scripted"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plays_back_in_order_then_disconnects() {
        let mut source = ScriptedSource::new(vec![
            Ok(CounterSnapshot::at(1)),
            Err(StatsError::Os(5)),
            Ok(CounterSnapshot::at(3)),
        ]);

        assert_eq!(source.read("/dev/sda").unwrap().timestamp_ns, 1);
        assert_eq!(source.read("/dev/sda"), Err(StatsError::Os(5)));
        assert_eq!(source.read("/dev/sdb").unwrap().timestamp_ns, 3);
        assert_eq!(source.read("/dev/sdb"), Err(StatsError::Disconnected));

        assert_eq!(source.requests(), ["/dev/sda", "/dev/sda", "/dev/sdb", "/dev/sdb"]);
        assert_eq!(source.remaining(), 0);
    }

    #[test]
    fn availability_is_configurable() {
        let mut ok = ScriptedSource::new(vec![]);
        assert!(ok.check_availability().is_ok());

        let mut broken = ScriptedSource::new(vec![]).unavailable(StatsError::Unsupported("x".into()));
        assert_eq!(
            broken.check_availability(),
            Err(StatsError::Unsupported("x".into()))
        );
    }

    #[test]
    fn push_extends_script() {
        let mut source = ScriptedSource::default();
        source.push(Ok(CounterSnapshot::at(9)));
        assert_eq!(source.read("/dev/sda").unwrap().timestamp_ns, 9);
    }
}
