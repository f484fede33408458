//! Delta computation and normalization of cumulative device counters.
//!
//! ```text
//! CounterSnapshot (cumulative)
//!        │
//!        ▼
//! Deltas::between(previous, snapshot)      wrapping subtraction
//!        │
//!        ▼
//! Metrics::from_deltas()                   MB/s and busy %
//!        │
//!        ├──▶ Metrics::select(config)      bar fractions in [0, 1]
//!        │
//!        └──▶ Metrics::summary(label)      rounded tooltip figures
//! ```

use diskperf_types::{
    CounterSnapshot, DisplayConfig, DisplayPayload, MetricMode, Summary, BUSY_UNAVAILABLE,
    BYTES_PER_NS_TO_MB_PER_S,
};
use tracing::{debug, warn};

/// A value for each of the read, write and combined slots.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SlotValues {
    pub read: f64,
    pub write: f64,
    pub combined: f64,
}

impl SlotValues {
    fn map(self, f: impl Fn(f64) -> f64) -> Self {
        Self {
            read: f(self.read),
            write: f(self.write),
            combined: f(self.combined),
        }
    }
}

/// Counter differences between two snapshots of the same device.
///
/// Byte and busy deltas use wrapping arithmetic: a counter that went
/// backwards (reset, device swap) shows up as a very large delta.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deltas {
    pub interval_ns: u64,
    pub read_bytes: u64,
    pub write_bytes: u64,
    pub read_busy_ns: u64,
    pub write_busy_ns: u64,
}

impl Deltas {
    /// Deltas from `previous` to `next`.
    ///
    /// Returns `None` unless `next` was captured strictly after `previous`.
    pub fn between(previous: &CounterSnapshot, next: &CounterSnapshot) -> Option<Self> {
        let interval_ns = next.timestamp_ns.checked_sub(previous.timestamp_ns)?;
        if interval_ns == 0 {
            return None;
        }
        Some(Self {
            interval_ns,
            read_bytes: next.read_bytes.wrapping_sub(previous.read_bytes),
            write_bytes: next.write_bytes.wrapping_sub(previous.write_bytes),
            read_busy_ns: next.read_busy_ns.wrapping_sub(previous.read_busy_ns),
            write_busy_ns: next.write_busy_ns.wrapping_sub(previous.write_busy_ns),
        })
    }

    /// Whether any byte or busy counter decreased and wrapped.
    pub fn wrapped(previous: &CounterSnapshot, next: &CounterSnapshot) -> bool {
        next.read_bytes < previous.read_bytes
            || next.write_bytes < previous.write_bytes
            || next.read_busy_ns < previous.read_busy_ns
            || next.write_busy_ns < previous.write_busy_ns
    }
}

/// Rates and busy percentages derived from one set of deltas.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Metrics {
    /// Transfer rates in MB/s.
    pub throughput_mb_s: SlotValues,
    /// Busy percentages, each at most 100. All zero without busy data.
    pub busy_pct: SlotValues,
    /// Whether the new snapshot carried busy data.
    pub busy_available: bool,
    /// Whether the source reports read and write busy time separately.
    pub separate_busy: bool,
}

impl Metrics {
    /// Convert deltas into rates and percentages.
    pub fn from_deltas(deltas: &Deltas, busy_available: bool, separate_busy: bool) -> Self {
        let interval = deltas.interval_ns as f64;
        let rate = |bytes: u64| bytes as f64 * BYTES_PER_NS_TO_MB_PER_S / interval;

        let throughput_mb_s = SlotValues {
            read: rate(deltas.read_bytes),
            write: rate(deltas.write_bytes),
            combined: rate(deltas.read_bytes.wrapping_add(deltas.write_bytes)),
        };

        let busy_pct = if busy_available {
            let pct = |busy_ns: u64| 100.0 * busy_ns as f64 / interval;
            SlotValues {
                read: pct(deltas.read_busy_ns),
                write: pct(deltas.write_busy_ns),
                combined: pct(deltas.read_busy_ns.wrapping_add(deltas.write_busy_ns)),
            }
            // Only capped from above; a negative value is passed through.
            .map(|v| if v > 100.0 { 100.0 } else { v })
        } else {
            SlotValues::default()
        };

        Self {
            throughput_mb_s,
            busy_pct,
            busy_available,
            separate_busy,
        }
    }

    /// The bar fractions for the configured mode.
    pub fn select(&self, config: &DisplayConfig) -> DisplayPayload {
        let scaled = match config.metric_mode {
            MetricMode::Throughput => {
                let ceiling = f64::from(config.max_throughput_mb_s.max(1));
                self.throughput_mb_s.map(|v| v / ceiling)
            }
            MetricMode::BusyTime => self.busy_pct.map(|v| v / 100.0),
        }
        .map(clamp_fraction);

        DisplayPayload {
            mode: config.metric_mode,
            read: scaled.read,
            write: scaled.write,
            combined: scaled.combined,
        }
    }

    /// Rounded figures for the tooltip.
    pub fn summary(&self, label: &str) -> Summary {
        let busy = |v: f64, available: bool| {
            if available {
                round_half_away(v) as i64
            } else {
                BUSY_UNAVAILABLE
            }
        };
        let per_side = self.busy_available && self.separate_busy;

        Summary {
            label: label.to_string(),
            read_mb_s: round_half_away(self.throughput_mb_s.read) as u64,
            write_mb_s: round_half_away(self.throughput_mb_s.write) as u64,
            total_mb_s: round_half_away(self.throughput_mb_s.combined) as u64,
            read_busy_pct: busy(self.busy_pct.read, per_side),
            write_busy_pct: busy(self.busy_pct.write, per_side),
            total_busy_pct: busy(self.busy_pct.combined, self.busy_available),
        }
    }
}

/// Clamp into `[0.0, 1.0]`. NaN becomes `0.0`.
pub fn clamp_fraction(v: f64) -> f64 {
    if v > 1.0 {
        1.0
    } else if v >= 0.0 {
        v
    } else {
        0.0
    }
}

fn round_half_away(v: f64) -> f64 {
    v.round()
}

/// Everything one successful tick produces.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub payload: DisplayPayload,
    pub summary: Summary,
    pub metrics: Metrics,
    pub interval_ns: u64,
}

/// Holds the previous snapshot and turns each new one into a [`Sample`].
///
/// A sampler belongs to one monitoring session of one device. Dropping it
/// (or calling [`Sampler::reset`]) forgets the baseline; the next ingest is
/// then a bootstrap tick again.
///
/// # Example
///
/// ```rust
/// use diskperf_core::Sampler;
/// use diskperf_types::{CounterSnapshot, DisplayConfig};
///
/// let mut sampler = Sampler::new(true);
/// let config = DisplayConfig::default();
///
/// // The first snapshot only establishes the baseline.
/// assert!(sampler.ingest(CounterSnapshot::at(0), &config).is_none());
///
/// // 20 MiB in one second against a 40 MB/s ceiling.
/// let next = CounterSnapshot::at(1_000_000_000).reads(20 * 1024 * 1024, 0);
/// let sample = sampler.ingest(next, &config).unwrap();
/// assert_eq!(sample.payload.read, 0.5);
/// assert_eq!(sample.summary.read_mb_s, 20);
/// ```
#[derive(Debug, Clone)]
pub struct Sampler {
    previous: Option<CounterSnapshot>,
    separate_busy: bool,
}

impl Sampler {
    /// Create an empty sampler.
    ///
    /// `separate_busy` is the source's capability to report read and write
    /// busy time independently.
    pub fn new(separate_busy: bool) -> Self {
        Self {
            previous: None,
            separate_busy,
        }
    }

    /// The current baseline, if any.
    pub fn previous(&self) -> Option<&CounterSnapshot> {
        self.previous.as_ref()
    }

    /// Whether read and write busy times are reported separately.
    pub fn separate_busy(&self) -> bool {
        self.separate_busy
    }

    /// Forget the baseline.
    pub fn reset(&mut self) {
        self.previous = None;
    }

    /// Feed one snapshot.
    ///
    /// Returns `None` on the bootstrap tick and whenever no time elapsed
    /// since the baseline. A snapshot with the same timestamp as the
    /// baseline is dropped and the baseline kept, so the next tick is
    /// measured against the original reading. A snapshot from before the
    /// baseline replaces it without producing a sample.
    pub fn ingest(&mut self, snapshot: CounterSnapshot, config: &DisplayConfig) -> Option<Sample> {
        let Some(previous) = self.previous else {
            self.previous = Some(snapshot);
            return None;
        };

        if snapshot.timestamp_ns < previous.timestamp_ns {
            warn!(
                previous_ns = previous.timestamp_ns,
                timestamp_ns = snapshot.timestamp_ns,
                "Snapshot timestamp went backwards, rebasing"
            );
            self.previous = Some(snapshot);
            return None;
        }

        let Some(deltas) = Deltas::between(&previous, &snapshot) else {
            debug!(timestamp_ns = snapshot.timestamp_ns, "Zero interval, sample dropped");
            return None;
        };

        if Deltas::wrapped(&previous, &snapshot) {
            warn!("Device counters decreased, rates for this tick will spike");
        }

        let metrics = Metrics::from_deltas(&deltas, snapshot.busy_available(), self.separate_busy);
        let payload = metrics.select(config);
        let summary = metrics.summary(&config.device_label);

        self.previous = Some(snapshot);

        Some(Sample {
            payload,
            summary,
            metrics,
            interval_ns: deltas.interval_ns,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diskperf_types::MetricSlot;

    const SECOND: u64 = 1_000_000_000;
    const MIB: u64 = 1024 * 1024;

    fn throughput(max: u32) -> DisplayConfig {
        DisplayConfig::default().max_throughput(max)
    }

    fn busy() -> DisplayConfig {
        DisplayConfig::default().mode(MetricMode::BusyTime)
    }

    fn bootstrapped(first: CounterSnapshot, config: &DisplayConfig) -> Sampler {
        let mut sampler = Sampler::new(true);
        assert!(sampler.ingest(first, config).is_none());
        sampler
    }

    #[test]
    fn first_ingest_is_bootstrap() {
        let config = throughput(40);
        let mut sampler = Sampler::new(true);

        let snapshot = CounterSnapshot::at(123).reads(u64::MAX, u64::MAX).queue_length(9);
        assert!(sampler.ingest(snapshot, &config).is_none());
        assert_eq!(sampler.previous(), Some(&snapshot));
    }

    #[test]
    fn bootstrap_after_reset() {
        let config = throughput(40);
        let mut sampler = bootstrapped(CounterSnapshot::at(0), &config);

        sampler.reset();
        assert!(sampler.previous().is_none());
        assert!(sampler
            .ingest(CounterSnapshot::at(SECOND).reads(MIB, 0), &config)
            .is_none());
    }

    #[test]
    fn forty_megabytes_at_ceiling_forty() {
        let config = throughput(40);
        let mut sampler = bootstrapped(CounterSnapshot::at(0), &config);

        let sample = sampler
            .ingest(CounterSnapshot::at(SECOND).reads(41_943_040, 0), &config)
            .unwrap();

        assert_eq!(sample.payload.combined, 1.0);
        assert_eq!(sample.payload.read, 1.0);
        assert_eq!(sample.payload.write, 0.0);
        assert_eq!(sample.summary.read_mb_s, 40);
        assert_eq!(sample.summary.write_mb_s, 0);
        assert_eq!(sample.summary.total_mb_s, 40);
    }

    #[test]
    fn forty_megabytes_at_ceiling_eighty() {
        let config = throughput(80);
        let mut sampler = bootstrapped(CounterSnapshot::at(0), &config);

        let sample = sampler
            .ingest(CounterSnapshot::at(SECOND).reads(41_943_040, 0), &config)
            .unwrap();

        assert_eq!(sample.payload.read, 0.5);
        assert_eq!(sample.payload.combined, 0.5);
    }

    #[test]
    fn busy_over_interval_clamps_to_full_bar() {
        let config = busy();
        let mut sampler = bootstrapped(CounterSnapshot::at(0).queue_length(0), &config);

        let next = CounterSnapshot::at(SECOND)
            .reads(0, 1_500_000_000)
            .queue_length(2);
        let sample = sampler.ingest(next, &config).unwrap();

        assert_eq!(sample.metrics.busy_pct.read, 100.0);
        assert_eq!(sample.payload.read, 1.0);
        assert_eq!(sample.summary.read_busy_pct, 100);
    }

    #[test]
    fn busy_percentages_are_capped_per_slot() {
        let config = busy();
        let mut sampler = bootstrapped(CounterSnapshot::at(0).queue_length(0), &config);

        let next = CounterSnapshot::at(SECOND)
            .reads(0, 300_000_000)
            .writes(0, 900_000_000)
            .queue_length(0);
        let sample = sampler.ingest(next, &config).unwrap();

        assert!((sample.metrics.busy_pct.read - 30.0).abs() < 1e-9);
        assert!((sample.metrics.busy_pct.write - 90.0).abs() < 1e-9);
        assert_eq!(sample.metrics.busy_pct.combined, 100.0);
        assert_eq!(sample.summary.read_busy_pct, 30);
        assert_eq!(sample.summary.write_busy_pct, 90);
        assert_eq!(sample.summary.total_busy_pct, 100);
    }

    #[test]
    fn missing_busy_data_reports_zero_and_sentinel() {
        let config = busy();
        let mut sampler = bootstrapped(CounterSnapshot::at(0), &config);

        let next = CounterSnapshot::at(SECOND).reads(MIB, 800_000_000);
        let sample = sampler.ingest(next, &config).unwrap();

        assert_eq!(sample.metrics.busy_pct, SlotValues::default());
        for slot in MetricSlot::ALL {
            assert_eq!(sample.payload.fraction(slot), 0.0);
            assert_eq!(sample.summary.busy(slot), BUSY_UNAVAILABLE);
        }
    }

    #[test]
    fn combined_busy_only_source_keeps_total() {
        let config = busy();
        let mut sampler = Sampler::new(false);
        assert!(sampler
            .ingest(CounterSnapshot::at(0).queue_length(0), &config)
            .is_none());

        let next = CounterSnapshot::at(SECOND)
            .reads(0, 250_000_000)
            .queue_length(1);
        let sample = sampler.ingest(next, &config).unwrap();

        assert_eq!(sample.summary.read_busy_pct, BUSY_UNAVAILABLE);
        assert_eq!(sample.summary.write_busy_pct, BUSY_UNAVAILABLE);
        assert_eq!(sample.summary.total_busy_pct, 25);
        assert_eq!(sample.payload.combined, 0.25);
    }

    #[test]
    fn zero_interval_keeps_original_baseline() {
        let config = throughput(40);
        let baseline = CounterSnapshot::at(SECOND).reads(10 * MIB, 0);
        let mut sampler = bootstrapped(baseline, &config);

        let duplicate = CounterSnapshot::at(SECOND).reads(30 * MIB, 0);
        assert!(sampler.ingest(duplicate, &config).is_none());
        assert_eq!(sampler.previous(), Some(&baseline));

        // Measured against the original 10 MiB baseline, not the duplicate.
        let next = CounterSnapshot::at(2 * SECOND).reads(30 * MIB, 0);
        let sample = sampler.ingest(next, &config).unwrap();
        assert_eq!(sample.summary.read_mb_s, 20);
        assert_eq!(sample.interval_ns, SECOND);
    }

    #[test]
    fn repeated_identical_timestamps_never_produce_payload() {
        let config = throughput(40);
        let mut sampler = bootstrapped(CounterSnapshot::at(7), &config);

        for i in 0..10 {
            let s = CounterSnapshot::at(7).reads(i * MIB, i).queue_length(i);
            assert!(sampler.ingest(s, &config).is_none());
        }
    }

    #[test]
    fn backwards_timestamp_rebases() {
        let config = throughput(40);
        let mut sampler = bootstrapped(CounterSnapshot::at(5 * SECOND), &config);

        let earlier = CounterSnapshot::at(SECOND).reads(MIB, 0);
        assert!(sampler.ingest(earlier, &config).is_none());
        assert_eq!(sampler.previous(), Some(&earlier));

        let next = CounterSnapshot::at(2 * SECOND).reads(5 * MIB, 0);
        let sample = sampler.ingest(next, &config).unwrap();
        assert_eq!(sample.summary.read_mb_s, 4);
    }

    #[test]
    fn counter_decrease_wraps_to_spike() {
        let config = throughput(40);
        let mut sampler = bootstrapped(CounterSnapshot::at(0).reads(10 * MIB, 0), &config);

        let sample = sampler
            .ingest(CounterSnapshot::at(SECOND).reads(MIB, 0), &config)
            .unwrap();

        assert!(sample.metrics.throughput_mb_s.read > 1e9);
        assert_eq!(sample.payload.read, 1.0);
        assert!(sample.summary.read_mb_s > 1_000_000_000);
        assert_eq!(sampler.previous().unwrap().read_bytes, MIB);
    }

    #[test]
    fn rates_are_bounded_by_raw_delta() {
        let config = throughput(995);
        let cases = [
            (SECOND, 0u64, 0u64),
            (SECOND / 2, 3 * MIB, 7 * MIB),
            (3 * SECOND, 123_456_789, 1),
            (1, 1, 0),
        ];

        for (interval, rbytes, wbytes) in cases {
            let mut sampler = bootstrapped(CounterSnapshot::at(SECOND), &config);
            let next = CounterSnapshot::at(SECOND + interval).reads(rbytes, 0).writes(wbytes, 0);
            let sample = sampler.ingest(next, &config).unwrap();
            let rates = sample.metrics.throughput_mb_s;

            let bound = |bytes: u64| bytes as f64 * BYTES_PER_NS_TO_MB_PER_S / interval as f64;
            assert!(rates.read >= 0.0 && rates.read <= bound(rbytes) * (1.0 + 1e-12));
            assert!(rates.write >= 0.0 && rates.write <= bound(wbytes) * (1.0 + 1e-12));
            assert!(rates.combined <= bound(rbytes + wbytes) * (1.0 + 1e-12));
        }
    }

    #[test]
    fn mode_switch_only_changes_selection() {
        let first = CounterSnapshot::at(0).queue_length(0);
        let next = CounterSnapshot::at(SECOND)
            .reads(10 * MIB, 400_000_000)
            .writes(30 * MIB, 100_000_000)
            .queue_length(4);

        let mut a = bootstrapped(first, &throughput(40));
        let mut b = bootstrapped(first, &busy());

        let by_rate = a.ingest(next, &throughput(40)).unwrap();
        let by_busy = b.ingest(next, &busy()).unwrap();

        assert_eq!(by_rate.metrics, by_busy.metrics);
        assert_eq!(by_rate.summary, by_busy.summary);
        assert_eq!(by_rate.payload.read, 0.25);
        assert_eq!(by_rate.payload.write, 0.75);
        assert_eq!(by_rate.payload.combined, 1.0);
        assert!((by_busy.payload.read - 0.4).abs() < 1e-9);
        assert!((by_busy.payload.write - 0.1).abs() < 1e-9);
        assert!((by_busy.payload.combined - 0.5).abs() < 1e-9);
    }

    #[test]
    fn config_is_read_on_every_call() {
        let mut sampler = bootstrapped(CounterSnapshot::at(0), &throughput(40));

        let s1 = sampler
            .ingest(CounterSnapshot::at(SECOND).reads(20 * MIB, 0), &throughput(40))
            .unwrap();
        let s2 = sampler
            .ingest(CounterSnapshot::at(2 * SECOND).reads(40 * MIB, 0), &throughput(80))
            .unwrap();

        assert_eq!(s1.payload.read, 0.5);
        assert_eq!(s2.payload.read, 0.25);
    }

    #[test]
    fn summary_rounds_half_away_from_zero() {
        let config = throughput(40);
        let mut sampler = bootstrapped(CounterSnapshot::at(0), &config);

        // 2.5 MiB and 1.4 MiB in one second
        let next = CounterSnapshot::at(SECOND)
            .reads(5 * MIB / 2, 0)
            .writes(14 * MIB / 10, 0);
        let sample = sampler.ingest(next, &config).unwrap();

        assert_eq!(sample.summary.read_mb_s, 3);
        assert_eq!(sample.summary.write_mb_s, 1);
        assert_eq!(sample.summary.total_mb_s, 4);
    }

    #[test]
    fn summary_carries_label() {
        let config = throughput(40).label("nvme0");
        let mut sampler = bootstrapped(CounterSnapshot::at(0), &config);
        let sample = sampler.ingest(CounterSnapshot::at(SECOND), &config).unwrap();
        assert_eq!(sample.summary.label, "nvme0");
    }

    #[test]
    fn clamping_law() {
        assert_eq!(clamp_fraction(1.5), 1.0);
        assert_eq!(clamp_fraction(f64::INFINITY), 1.0);
        assert_eq!(clamp_fraction(-0.2), 0.0);
        assert_eq!(clamp_fraction(f64::NAN), 0.0);
        assert_eq!(clamp_fraction(0.3), 0.3);
    }

    #[test]
    fn zero_ceiling_does_not_divide_by_zero() {
        let mut config = throughput(40);
        config.max_throughput_mb_s = 0;
        let mut sampler = bootstrapped(CounterSnapshot::at(0), &config);

        let sample = sampler
            .ingest(CounterSnapshot::at(SECOND).reads(MIB / 2, 0), &config)
            .unwrap();
        assert_eq!(sample.payload.read, 0.5);
    }
}
