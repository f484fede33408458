//! The periodic monitor loop.
//!
//! A [`Monitor`] owns one source, one [`Sampler`] and a set of outputs. Each
//! tick it reads the current [`MonitorConfig`], samples the device and emits
//! an [`Update`]. The loop sleeps for the configured period after the work
//! is done, so a slow source stretches the interval instead of piling up
//! ticks.

use std::time::Duration;

use diskperf_types::{normalize_period_ms, truncate_label, DisplayConfig};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::output::{Output, Update};
use crate::sampler::Sampler;
use crate::source::DeviceStatsSource;
use crate::{MonitorError, StatsError};

/// Longest device identity kept, in characters.
pub const MAX_DEVICE_CHARS: usize = 63;

/// Default refresh period in milliseconds.
pub const DEFAULT_PERIOD_MS: u64 = 500;

/// Everything the loop reads at the start of a tick.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitorConfig {
    /// Device identity handed to the source.
    pub device: String,
    /// Refresh period in milliseconds.
    pub period_ms: u64,
    pub display: DisplayConfig,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            device: "/dev/sda".to_string(),
            period_ms: DEFAULT_PERIOD_MS,
            display: DisplayConfig::default(),
        }
    }
}

impl MonitorConfig {
    /// Create a configuration for `device` with default display settings.
    pub fn new(device: &str) -> Self {
        Self {
            device: device.to_string(),
            ..Self::default()
        }
        .normalized()
    }

    /// Set the refresh period, rounded to the accepted grid.
    pub fn period(mut self, period_ms: u64) -> Self {
        self.period_ms = normalize_period_ms(period_ms);
        self
    }

    /// Set the display configuration.
    pub fn display(mut self, display: DisplayConfig) -> Self {
        self.display = display;
        self
    }

    /// Bring every field onto its accepted grid.
    pub fn normalized(mut self) -> Self {
        self.device = self.device.chars().take(MAX_DEVICE_CHARS).collect();
        self.period_ms = normalize_period_ms(self.period_ms);
        self.display.device_label = truncate_label(&self.display.device_label);
        let ceiling = self.display.max_throughput_mb_s;
        self.display = self.display.max_throughput(ceiling);
        self
    }

    /// The refresh period as a [`Duration`].
    pub fn period_duration(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }
}

/// Samples one device through a [`DeviceStatsSource`].
#[derive(Debug)]
pub struct Monitor<S> {
    source: S,
    sampler: Sampler,
    device: Option<String>,
    outputs: Vec<Output>,
    failures: u32,
}

impl<S: DeviceStatsSource> Monitor<S> {
    /// Create a monitor with no outputs.
    pub fn new(source: S) -> Self {
        let sampler = Sampler::new(source.supports_separate_busy());
        Self {
            source,
            sampler,
            device: None,
            outputs: Vec::new(),
            failures: 0,
        }
    }

    /// Add an output destination.
    pub fn output(mut self, output: Output) -> Self {
        self.outputs.push(output);
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn sampler(&self) -> &Sampler {
        &self.sampler
    }

    /// Run the source's availability probe.
    ///
    /// Only [`StatsError::Unsupported`] is fatal. Anything else may clear up
    /// later and is left to the per-tick error handling.
    pub fn check_availability(&mut self) -> Result<(), MonitorError> {
        match self.source.check_availability() {
            Ok(()) => Ok(()),
            Err(err) if !err.is_transient() => {
                error!(source = self.source.description(), error = %err, "Device statistics unavailable");
                Err(MonitorError::Unsupported(err))
            }
            Err(err) => {
                warn!(source = self.source.description(), error = %err, "Availability probe failed");
                Ok(())
            }
        }
    }

    /// Run one tick against `config`.
    ///
    /// Returns `None` when the tick produced no sample: a failed read, the
    /// first reading of a device, or a zero-length interval.
    pub fn tick(&mut self, config: &MonitorConfig) -> Option<Update> {
        if self.device.as_deref() != Some(config.device.as_str()) {
            if let Some(previous) = &self.device {
                info!(from = %previous, to = %config.device, "Device changed, resetting baseline");
            }
            self.sampler.reset();
            self.device = Some(config.device.clone());
        }

        let snapshot = match self.source.read(&config.device) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                self.record_failure(&config.device, &err);
                return None;
            }
        };

        if self.failures > 0 {
            info!(device = %config.device, failures = self.failures, "Device statistics recovered");
            self.failures = 0;
        }

        let display = config.display.effective(self.sampler.separate_busy());
        let sample = self.sampler.ingest(snapshot, &display)?;

        Some(Update {
            device: config.device.clone(),
            config: display,
            payload: sample.payload,
            summary: sample.summary,
        })
    }

    fn record_failure(&mut self, device: &str, err: &StatsError) {
        self.failures = self.failures.saturating_add(1);
        if self.failures == 1 {
            warn!(device, error = %err, "Failed to read device statistics, skipping tick");
        } else {
            debug!(device, error = %err, failures = self.failures, "Device statistics still unavailable");
        }
    }

    /// Run the loop until `stop` turns true or its sender goes away.
    ///
    /// The configuration is read fresh at the start of every tick, and the
    /// period for the following sleep is read again once the tick is done.
    pub async fn run(
        mut self,
        mut config: watch::Receiver<MonitorConfig>,
        mut stop: watch::Receiver<bool>,
    ) -> Result<(), MonitorError> {
        if let Err(err) = self.check_availability() {
            let message = err.to_string();
            for output in &self.outputs {
                output.report(&message).await;
            }
            return Err(err);
        }

        info!(source = self.source.description(), "Monitor started");

        loop {
            if *stop.borrow() {
                break;
            }

            let current = config.borrow_and_update().clone();
            if let Some(update) = self.tick(&current) {
                for output in &self.outputs {
                    if let Err(e) = output.emit(&update).await {
                        warn!(error = %e, "Failed to emit update");
                    }
                }
            }

            let period = config.borrow().period_duration();
            let sleep = tokio::time::sleep(period);
            tokio::pin!(sleep);

            let stopped = loop {
                tokio::select! {
                    _ = &mut sleep => break false,
                    res = stop.changed() => {
                        if res.is_err() || *stop.borrow() {
                            break true;
                        }
                    }
                }
            };
            if stopped {
                break;
            }
        }

        info!("Monitor stopped");
        Ok(())
    }
}

impl<S: DeviceStatsSource + 'static> Monitor<S> {
    /// Spawn the loop on the current tokio runtime.
    ///
    /// Returns a handle for changing the configuration and stopping the loop.
    pub fn start(self, config: MonitorConfig) -> MonitorHandle {
        let (config_tx, config_rx) = watch::channel(config.normalized());
        let (stop_tx, stop_rx) = watch::channel(false);

        let task = tokio::spawn(self.run(config_rx, stop_rx));

        MonitorHandle {
            config_tx,
            stop_tx,
            task,
        }
    }
}

/// Handle to a running monitor.
#[derive(Debug)]
pub struct MonitorHandle {
    config_tx: watch::Sender<MonitorConfig>,
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<Result<(), MonitorError>>,
}

impl MonitorHandle {
    /// Replace the configuration. The next tick uses it.
    pub fn update_config(&self, config: MonitorConfig) {
        self.config_tx.send_replace(config.normalized());
    }

    /// Edit the configuration in place. The next tick uses the result.
    pub fn modify_config(&self, modify: impl FnOnce(&mut MonitorConfig)) {
        self.config_tx.send_modify(|config| {
            modify(config);
            *config = config.clone().normalized();
        });
    }

    /// The configuration the next tick will use.
    pub fn config(&self) -> MonitorConfig {
        self.config_tx.borrow().clone()
    }

    /// Whether the loop has ended.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Ask the loop to stop after the current tick.
    pub fn stop(&self) {
        let _ = self.stop_tx.send(true);
    }

    /// Wait for the loop to end.
    pub async fn join(self) -> Result<(), MonitorError> {
        match self.task.await {
            Ok(result) => result,
            Err(e) => Err(MonitorError::Task(e.to_string())),
        }
    }

    /// Stop the loop and wait for it to end.
    pub async fn shutdown(self) -> Result<(), MonitorError> {
        self.stop();
        self.join().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::MonitorEvent;
    use crate::source::ScriptedSource;
    use diskperf_types::{CounterSnapshot, MetricMode, BUSY_UNAVAILABLE};

    const SECOND: u64 = 1_000_000_000;
    const MIB: u64 = 1024 * 1024;

    fn at(secs: u64, read_mib: u64) -> Result<CounterSnapshot, StatsError> {
        Ok(CounterSnapshot::at(secs * SECOND)
            .reads(read_mib * MIB, secs * SECOND / 4)
            .writes(0, 0)
            .queue_length(0))
    }

    #[test]
    fn config_normalizes_fields() {
        let long_device = "d".repeat(100);
        let mut config = MonitorConfig::new(&long_device).period(120);
        config.display.device_label = "a-very-long-device-label".to_string();
        config.display.max_throughput_mb_s = 2000;
        let config = config.normalized();

        assert_eq!(config.device.chars().count(), MAX_DEVICE_CHARS);
        assert_eq!(config.period_ms, 100);
        assert_eq!(config.display.device_label, "a-very-long-dev");
        assert_eq!(config.display.max_throughput_mb_s, 995);
        assert_eq!(config.period_duration(), Duration::from_millis(100));
    }

    #[test]
    fn default_config() {
        let config = MonitorConfig::default();
        assert_eq!(config.device, "/dev/sda");
        assert_eq!(config.period_ms, 500);
        assert_eq!(config.display, DisplayConfig::default());
    }

    #[test]
    fn tick_bootstraps_then_produces_updates() {
        let source = ScriptedSource::new(vec![at(0, 0), at(1, 20)]);
        let mut monitor = Monitor::new(source);
        let config = MonitorConfig::new("/dev/sda");

        assert!(monitor.tick(&config).is_none());
        let update = monitor.tick(&config).unwrap();

        assert_eq!(update.device, "/dev/sda");
        assert_eq!(update.payload.read, 0.5);
        assert_eq!(update.summary.read_mb_s, 20);
        assert_eq!(update.summary.read_busy_pct, 25);
        assert_eq!(update.config, config.display);
    }

    #[test]
    fn failed_read_keeps_baseline() {
        let source = ScriptedSource::new(vec![at(0, 0), Err(StatsError::Os(5)), at(2, 40)]);
        let mut monitor = Monitor::new(source);
        let config = MonitorConfig::new("/dev/sda");

        assert!(monitor.tick(&config).is_none());
        assert!(monitor.tick(&config).is_none());
        assert_eq!(monitor.sampler().previous().map(|s| s.timestamp_ns), Some(0));

        // 40 MiB over the two seconds since the original baseline
        let update = monitor.tick(&config).unwrap();
        assert_eq!(update.summary.read_mb_s, 20);
    }

    #[test]
    fn device_change_resets_baseline() {
        let source = ScriptedSource::new(vec![at(0, 0), at(1, 10), at(2, 500), at(3, 510)]);
        let mut monitor = Monitor::new(source);
        let sda = MonitorConfig::new("/dev/sda");
        let sdb = MonitorConfig::new("/dev/sdb");

        assert!(monitor.tick(&sda).is_none());
        assert!(monitor.tick(&sda).is_some());

        // First reading of the new device only establishes a baseline
        assert!(monitor.tick(&sdb).is_none());
        let update = monitor.tick(&sdb).unwrap();
        assert_eq!(update.device, "/dev/sdb");
        assert_eq!(update.summary.read_mb_s, 10);

        assert_eq!(
            monitor.source().requests(),
            ["/dev/sda", "/dev/sda", "/dev/sdb", "/dev/sdb"]
        );
    }

    #[test]
    fn busy_mode_forced_combined_without_separate_busy() {
        let source = ScriptedSource::new(vec![at(0, 0), at(1, 0)]).with_separate_busy(false);
        let mut monitor = Monitor::new(source);
        let mut config = MonitorConfig::new("/dev/sda");
        config.display = config.display.mode(MetricMode::BusyTime).combined(false);

        monitor.tick(&config);
        let update = monitor.tick(&config).unwrap();

        assert!(update.config.combine_read_write);
        assert_eq!(update.summary.total_busy_pct, 25);
        assert_eq!(update.summary.read_busy_pct, BUSY_UNAVAILABLE);
        assert_eq!(update.summary.write_busy_pct, BUSY_UNAVAILABLE);
    }

    #[test]
    fn probe_unsupported_is_fatal() {
        let source = ScriptedSource::new(vec![]).unavailable(StatsError::Unsupported("none".into()));
        let mut monitor = Monitor::new(source);
        assert!(matches!(
            monitor.check_availability(),
            Err(MonitorError::Unsupported(_))
        ));
    }

    #[test]
    fn probe_transient_error_is_not_fatal() {
        let source = ScriptedSource::new(vec![]).unavailable(StatsError::Os(13));
        let mut monitor = Monitor::new(source);
        assert!(monitor.check_availability().is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn run_reports_fatal_and_returns_error() {
        let source = ScriptedSource::new(vec![at(0, 0)]).unavailable(StatsError::Unsupported("none".into()));
        let (output, mut rx) = Output::channel(4);
        let handle = Monitor::new(source).output(output).start(MonitorConfig::default());

        match rx.recv().await {
            Some(MonitorEvent::Fatal(msg)) => assert!(msg.contains("will not work")),
            other => panic!("expected fatal event, got {other:?}"),
        }
        assert!(matches!(handle.join().await, Err(MonitorError::Unsupported(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn run_emits_updates_and_applies_new_config() {
        let source = ScriptedSource::new(vec![at(0, 0), at(1, 20), at(2, 40)]);
        let (output, mut rx) = Output::channel(4);
        let handle = Monitor::new(source).output(output).start(MonitorConfig::default());

        let first = match rx.recv().await {
            Some(MonitorEvent::Update(update)) => update,
            other => panic!("expected update, got {other:?}"),
        };
        assert_eq!(first.payload.mode, MetricMode::Throughput);
        assert_eq!(first.payload.read, 0.5);

        handle.modify_config(|config| config.display.metric_mode = MetricMode::BusyTime);

        let second = match rx.recv().await {
            Some(MonitorEvent::Update(update)) => update,
            other => panic!("expected update, got {other:?}"),
        };
        assert_eq!(second.payload.mode, MetricMode::BusyTime);
        assert_eq!(second.payload.read, 0.25);

        assert!(handle.shutdown().await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn run_sleeps_for_configured_period() {
        let source = ScriptedSource::new(vec![at(0, 0), at(1, 0), at(2, 0), at(3, 0)]);
        let (output, mut rx) = Output::channel(4);
        let handle = Monitor::new(source)
            .output(output)
            .start(MonitorConfig::default().period(1000));

        let started = tokio::time::Instant::now();
        rx.recv().await;
        assert_eq!(started.elapsed(), Duration::from_millis(1000));

        // The sleep already scheduled keeps its period
        handle.update_config(MonitorConfig::default().period(250));
        rx.recv().await;
        assert_eq!(started.elapsed(), Duration::from_millis(2000));

        rx.recv().await;
        assert_eq!(started.elapsed(), Duration::from_millis(2250));

        handle.stop();
        assert!(handle.join().await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn stop_before_first_tick() {
        let source = ScriptedSource::new(vec![at(0, 0)]);
        let handle = Monitor::new(source).start(MonitorConfig::default());
        handle.stop();
        assert!(handle.join().await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn handle_normalizes_updates() {
        let handle = Monitor::new(ScriptedSource::default()).start(MonitorConfig::default());
        let mut config = MonitorConfig::default();
        config.period_ms = 10;
        handle.update_config(config);
        assert_eq!(handle.config().period_ms, 50);

        handle.modify_config(|c| c.display.max_throughput_mb_s = 1000);
        assert_eq!(handle.config().display.max_throughput_mb_s, 995);
        assert!(handle.shutdown().await.is_ok());
    }
}
