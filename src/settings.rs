//! Layered settings for the monitor.
//!
//! Settings are merged from, lowest to highest priority:
//!
//! 1. built-in defaults,
//! 2. an optional TOML file,
//! 3. `DISKPERF_*` environment variables (`DISKPERF_COLORS__READ` for
//!    nested keys),
//! 4. command line flags, applied as [`Overrides`].
//!
//! # Example file
//!
//! ```toml
//! device = "/dev/nvme0n1"
//! label = "nvme"
//! period_ms = 1000
//! mode = "busy_time"
//! combined = false
//! order = "write_read"
//! stats_file = "/run/diskperf/stats.json"
//!
//! [colors]
//! read = "#3366FF"
//! ```

use std::path::{Path, PathBuf};

use config::{Config, Environment, File};
use diskperf_core::MonitorConfig;
use diskperf_types::{
    normalize_max_throughput, BarColor, BarColors, BarOrder, DisplayConfig, MetricMode,
    ParseColorError,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "DISKPERF";

/// Errors raised while loading settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to load settings: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid color for `colors.{key}`: {source}")]
    InvalidColor {
        key: &'static str,
        #[source]
        source: ParseColorError,
    },
}

/// Bar colors as written in settings, `#RRGGBB`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorSettings {
    pub read: String,
    pub write: String,
    pub combined: String,
}

impl Default for ColorSettings {
    fn default() -> Self {
        let colors = BarColors::default();
        Self {
            read: colors.read.to_string(),
            write: colors.write.to_string(),
            combined: colors.combined.to_string(),
        }
    }
}

impl ColorSettings {
    fn parse(&self) -> Result<BarColors, SettingsError> {
        let parse = |key: &'static str, value: &str| {
            value
                .parse::<BarColor>()
                .map_err(|source| SettingsError::InvalidColor { key, source })
        };
        Ok(BarColors {
            read: parse("read", &self.read)?,
            write: parse("write", &self.write)?,
            combined: parse("combined", &self.combined)?,
        })
    }
}

/// Everything the binary can be configured with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Device identity, e.g. `/dev/sda`.
    pub device: String,
    pub label: String,
    pub show_label: bool,
    pub period_ms: u64,
    pub mode: MetricMode,
    pub max_throughput_mb_s: i64,
    pub combined: bool,
    pub order: BarOrder,
    pub colors: ColorSettings,
    /// JSON document of device counters kept current by a collector.
    pub stats_file: PathBuf,
    /// Whether the collector reports read and write busy time separately.
    pub separate_busy: bool,
}

impl Default for Settings {
    fn default() -> Self {
        let display = DisplayConfig::default();
        let monitor = MonitorConfig::default();
        Self {
            device: monitor.device,
            label: display.device_label,
            show_label: display.show_label,
            period_ms: monitor.period_ms,
            mode: display.metric_mode,
            max_throughput_mb_s: i64::from(display.max_throughput_mb_s),
            combined: display.combine_read_write,
            order: display.bar_order,
            colors: ColorSettings::default(),
            stats_file: PathBuf::from("/run/diskperf/stats.json"),
            separate_busy: true,
        }
    }
}

/// Values given on the command line. `None` leaves the merged value alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Overrides {
    pub device: Option<String>,
    pub label: Option<String>,
    pub hide_label: bool,
    pub period_ms: Option<u64>,
    pub mode: Option<MetricMode>,
    pub max_throughput_mb_s: Option<i64>,
    pub split: bool,
    pub order: Option<BarOrder>,
    pub stats_file: Option<PathBuf>,
}

impl Settings {
    /// Load settings from defaults, `path`, the environment and `overrides`.
    pub fn load(path: Option<&Path>, overrides: &Overrides) -> Result<Self, SettingsError> {
        Self::load_with_prefix(path, ENV_PREFIX, overrides)
    }

    fn load_with_prefix(
        path: Option<&Path>,
        env_prefix: &str,
        overrides: &Overrides,
    ) -> Result<Self, SettingsError> {
        let mut builder = Config::builder().add_source(Config::try_from(&Settings::default())?);
        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }
        let config = builder
            .add_source(
                Environment::with_prefix(env_prefix)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let mut settings: Settings = config.try_deserialize()?;
        settings.apply(overrides);
        Ok(settings)
    }

    /// Apply command line values on top of the merged settings.
    pub fn apply(&mut self, overrides: &Overrides) {
        if let Some(device) = &overrides.device {
            self.device = device.clone();
        }
        if let Some(label) = &overrides.label {
            self.label = label.clone();
        }
        if overrides.hide_label {
            self.show_label = false;
        }
        if let Some(period_ms) = overrides.period_ms {
            self.period_ms = period_ms;
        }
        if let Some(mode) = overrides.mode {
            self.mode = mode;
        }
        if let Some(mb_s) = overrides.max_throughput_mb_s {
            self.max_throughput_mb_s = mb_s;
        }
        if overrides.split {
            self.combined = false;
        }
        if let Some(order) = overrides.order {
            self.order = order;
        }
        if let Some(stats_file) = &overrides.stats_file {
            self.stats_file = stats_file.clone();
        }
    }

    /// The normalized monitor configuration these settings describe.
    pub fn monitor_config(&self) -> Result<MonitorConfig, SettingsError> {
        let mut display = DisplayConfig::default()
            .mode(self.mode)
            .combined(self.combined)
            .label(&self.label)
            .order(self.order);
        display.max_throughput_mb_s = normalize_max_throughput(self.max_throughput_mb_s);
        display.show_label = self.show_label;
        display.colors = self.colors.parse()?;

        Ok(MonitorConfig::new(&self.device)
            .period(self.period_ms)
            .display(display))
    }
}
