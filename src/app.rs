//! Application state for the terminal view.

use std::time::{Duration, Instant};

use diskperf_core::{MonitorConfig, MonitorEvent, Update};
use diskperf_types::{normalize_max_throughput, BarOrder, MetricMode, THROUGHPUT_STEP_MB_S};

use crate::ui::Theme;

/// How long a status message stays visible.
const STATUS_MESSAGE_TTL: Duration = Duration::from_secs(3);

/// Period step used by the `[` and `]` keys, in milliseconds.
const PERIOD_KEY_STEP_MS: i64 = 50;

/// Main application state.
///
/// The app owns the configuration the user edits. Edits mark it dirty and
/// the main loop forwards it to the running monitor with
/// [`App::take_config_change`].
pub struct App {
    pub running: bool,
    pub show_help: bool,

    pub config: MonitorConfig,
    config_dirty: bool,

    /// The latest update from the monitor.
    pub latest: Option<Update>,
    pub last_update: Option<Instant>,
    /// Set when the monitor stopped for good.
    pub fatal: Option<String>,
    pub source_description: String,

    pub theme: Theme,

    // Status message (temporary feedback)
    pub status_message: Option<(String, Instant)>,
}

impl App {
    pub fn new(config: MonitorConfig, source_description: &str, theme: Theme) -> Self {
        Self {
            running: true,
            show_help: false,
            config,
            config_dirty: false,
            latest: None,
            last_update: None,
            fatal: None,
            source_description: source_description.to_string(),
            theme,
            status_message: None,
        }
    }

    pub fn quit(&mut self) {
        self.running = false;
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    /// Take in an event from the monitor.
    pub fn handle_event(&mut self, event: MonitorEvent) {
        match event {
            MonitorEvent::Update(update) => {
                self.latest = Some(update);
                self.last_update = Some(Instant::now());
            }
            MonitorEvent::Fatal(message) => {
                self.fatal = Some(message);
            }
        }
    }

    /// Switch between throughput and busy time.
    pub fn toggle_mode(&mut self) {
        let mode = match self.config.display.metric_mode {
            MetricMode::Throughput => MetricMode::BusyTime,
            MetricMode::BusyTime => MetricMode::Throughput,
        };
        self.config.display.metric_mode = mode;
        self.set_status_message(format!("Showing {}", mode.label()));
        self.mark_dirty();
    }

    /// Switch between one combined bar and separate read/write bars.
    pub fn toggle_combined(&mut self) {
        self.config.display.combine_read_write = !self.config.display.combine_read_write;
        self.mark_dirty();
    }

    /// Swap the read and write bars.
    pub fn toggle_order(&mut self) {
        self.config.display.bar_order = match self.config.display.bar_order {
            BarOrder::ReadWrite => BarOrder::WriteRead,
            BarOrder::WriteRead => BarOrder::ReadWrite,
        };
        self.mark_dirty();
    }

    pub fn toggle_label(&mut self) {
        self.config.display.show_label = !self.config.display.show_label;
        self.mark_dirty();
    }

    /// Move the throughput ceiling by `steps` grid steps.
    pub fn adjust_ceiling(&mut self, steps: i64) {
        let current = i64::from(self.config.display.max_throughput_mb_s);
        let target = current + steps * i64::from(THROUGHPUT_STEP_MB_S);
        self.config.display.max_throughput_mb_s = normalize_max_throughput(target);
        self.set_status_message(format!(
            "Ceiling {} MB/s",
            self.config.display.max_throughput_mb_s
        ));
        self.mark_dirty();
    }

    /// Move the refresh period by `steps` grid steps.
    pub fn adjust_period(&mut self, steps: i64) {
        let current = i64::try_from(self.config.period_ms).unwrap_or(i64::MAX);
        let target = current.saturating_add(steps * PERIOD_KEY_STEP_MS).max(0);
        self.config = self.config.clone().period(target.unsigned_abs());
        self.set_status_message(format!("Refresh every {} ms", self.config.period_ms));
        self.mark_dirty();
    }

    fn mark_dirty(&mut self) {
        self.config_dirty = true;
    }

    /// The edited configuration, once per edit batch.
    pub fn take_config_change(&mut self) -> Option<MonitorConfig> {
        if std::mem::take(&mut self.config_dirty) {
            Some(self.config.clone())
        } else {
            None
        }
    }

    /// Set a temporary status message.
    pub fn set_status_message(&mut self, message: String) {
        self.status_message = Some((message, Instant::now()));
    }

    /// The status message, if it hasn't expired.
    pub fn status_message(&self) -> Option<&str> {
        self.status_message
            .as_ref()
            .filter(|(_, at)| at.elapsed() < STATUS_MESSAGE_TTL)
            .map(|(msg, _)| msg.as_str())
    }

    /// Time since the last update.
    pub fn since_update(&self) -> Option<Duration> {
        self.last_update.map(|at| at.elapsed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use diskperf_types::{DisplayConfig, DisplayPayload, Summary};

    fn app() -> App {
        App::new(MonitorConfig::default(), "test", Theme::dark())
    }

    #[test]
    fn starts_clean() {
        let mut app = app();
        assert!(app.running);
        assert!(app.latest.is_none());
        assert!(app.take_config_change().is_none());
    }

    #[test]
    fn edits_are_taken_once() {
        let mut app = app();
        app.toggle_mode();
        app.toggle_combined();

        let change = app.take_config_change().unwrap();
        assert_eq!(change.display.metric_mode, MetricMode::BusyTime);
        assert!(!change.display.combine_read_write);
        assert!(app.take_config_change().is_none());
    }

    #[test]
    fn ceiling_stays_on_grid() {
        let mut app = app();
        app.adjust_ceiling(1);
        assert_eq!(app.config.display.max_throughput_mb_s, 45);
        assert_eq!(app.status_message(), Some("Ceiling 45 MB/s"));

        app.adjust_ceiling(-100);
        assert_eq!(app.config.display.max_throughput_mb_s, 5);

        app.adjust_ceiling(1000);
        assert_eq!(app.config.display.max_throughput_mb_s, 995);
    }

    #[test]
    fn period_stays_on_grid() {
        let mut app = app();
        app.adjust_period(2);
        assert_eq!(app.config.period_ms, 600);

        app.adjust_period(-100);
        assert_eq!(app.config.period_ms, 50);
    }

    #[test]
    fn order_and_label_toggle() {
        let mut app = app();
        app.toggle_order();
        assert_eq!(app.config.display.bar_order, BarOrder::WriteRead);
        app.toggle_order();
        assert_eq!(app.config.display.bar_order, BarOrder::ReadWrite);

        app.toggle_label();
        assert!(!app.config.display.show_label);
        assert!(app.take_config_change().is_some());
    }

    #[test]
    fn monitor_events_update_state() {
        let mut app = app();
        let update = Update {
            device: "/dev/sda".to_string(),
            config: DisplayConfig::default(),
            payload: DisplayPayload::default(),
            summary: Summary::default(),
        };

        app.handle_event(MonitorEvent::Update(update.clone()));
        assert_eq!(app.latest, Some(update));
        assert!(app.since_update().is_some());

        app.handle_event(MonitorEvent::Fatal("gone".to_string()));
        assert_eq!(app.fatal.as_deref(), Some("gone"));
    }
}
