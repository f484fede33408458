//! Counter snapshot - one reading of a device's cumulative statistics.

/// A point-in-time reading of a block device's cumulative I/O counters.
///
/// All counters are cumulative since the device (or its statistics) were
/// initialized and wrap at the platform counter width. Busy times may be
/// missing on some platforms; that is signalled by the absence of a queue
/// length rather than by zeroed busy counters.
///
/// # Example
///
/// ```rust
/// use diskperf_types::CounterSnapshot;
///
/// let snapshot = CounterSnapshot::at(2_000_000_000)
///     .reads(1024, 10_000)
///     .writes(2048, 20_000);
///
/// assert_eq!(snapshot.total_bytes(), 3072);
/// assert!(!snapshot.busy_available());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CounterSnapshot {
    /// Monotonic capture time in nanoseconds.
    pub timestamp_ns: u64,

    /// Cumulative bytes read.
    pub read_bytes: u64,

    /// Cumulative bytes written.
    pub write_bytes: u64,

    /// Cumulative time spent servicing reads, in nanoseconds.
    #[cfg_attr(feature = "serde", serde(default))]
    pub read_busy_ns: u64,

    /// Cumulative time spent servicing writes, in nanoseconds.
    #[cfg_attr(feature = "serde", serde(default))]
    pub write_busy_ns: u64,

    /// Number of requests in flight when the snapshot was taken.
    ///
    /// `None` means the source could not report busy times for this
    /// snapshot; the busy counters must then be ignored.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub queue_length: Option<u64>,
}

impl CounterSnapshot {
    /// Create an empty snapshot captured at `timestamp_ns`.
    pub fn at(timestamp_ns: u64) -> Self {
        Self {
            timestamp_ns,
            ..Self::default()
        }
    }

    /// Set the cumulative read counters.
    pub fn reads(mut self, bytes: u64, busy_ns: u64) -> Self {
        self.read_bytes = bytes;
        self.read_busy_ns = busy_ns;
        self
    }

    /// Set the cumulative write counters.
    pub fn writes(mut self, bytes: u64, busy_ns: u64) -> Self {
        self.write_bytes = bytes;
        self.write_busy_ns = busy_ns;
        self
    }

    /// Set the queue length, marking busy times as available.
    pub fn queue_length(mut self, queue_length: u64) -> Self {
        self.queue_length = Some(queue_length);
        self
    }

    /// Whether the busy-time counters of this snapshot carry data.
    pub fn busy_available(&self) -> bool {
        self.queue_length.is_some()
    }

    /// Cumulative bytes transferred in both directions.
    pub fn total_bytes(&self) -> u64 {
        self.read_bytes.wrapping_add(self.write_bytes)
    }
}
