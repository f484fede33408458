//! Display configuration consumed by the sampler on every tick.

use crate::{BarColors, MetricSlot};

/// Lowest accepted throughput ceiling in MB/s.
pub const MIN_MAX_THROUGHPUT_MB_S: u32 = 5;

/// Highest accepted throughput ceiling in MB/s.
pub const MAX_MAX_THROUGHPUT_MB_S: u32 = 995;

/// Granularity of the throughput ceiling in MB/s.
pub const THROUGHPUT_STEP_MB_S: u32 = 5;

/// Granularity (and minimum) of the sampling period in milliseconds.
pub const PERIOD_STEP_MS: u64 = 50;

/// Maximum number of characters kept from a device label.
pub const MAX_LABEL_CHARS: usize = 15;

/// Which statistic drives the bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum MetricMode {
    /// Megabytes transferred per second, relative to a configured ceiling.
    #[default]
    Throughput,
    /// Percentage of the interval the device spent busy.
    BusyTime,
}

impl MetricMode {
    /// Returns the display label for this mode.
    pub fn label(&self) -> &'static str {
        match self {
            MetricMode::Throughput => "I/O transfer",
            MetricMode::BusyTime => "Busy time",
        }
    }
}

/// Order of the read and write bars when they are not combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum BarOrder {
    #[default]
    ReadWrite,
    WriteRead,
}

/// User-facing display settings.
///
/// The sampler reads this fresh on every call; nothing here is cached
/// between ticks. Only `metric_mode` and `max_throughput_mb_s` influence
/// the computed fractions, the rest is layout for the presentation side.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DisplayConfig {
    pub metric_mode: MetricMode,
    pub combine_read_write: bool,
    /// Normalization ceiling for throughput mode, in MB/s.
    pub max_throughput_mb_s: u32,
    pub device_label: String,
    pub show_label: bool,
    pub bar_order: BarOrder,
    pub colors: BarColors,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            metric_mode: MetricMode::Throughput,
            combine_read_write: true,
            max_throughput_mb_s: 40,
            device_label: "sda".to_string(),
            show_label: true,
            bar_order: BarOrder::ReadWrite,
            colors: BarColors::default(),
        }
    }
}

impl DisplayConfig {
    /// Set the metric mode.
    pub fn mode(mut self, mode: MetricMode) -> Self {
        self.metric_mode = mode;
        self
    }

    /// Combine read and write into a single bar, or split them.
    pub fn combined(mut self, combined: bool) -> Self {
        self.combine_read_write = combined;
        self
    }

    /// Set the throughput ceiling, normalized to the accepted grid.
    pub fn max_throughput(mut self, mb_s: u32) -> Self {
        self.max_throughput_mb_s = normalize_max_throughput(i64::from(mb_s));
        self
    }

    /// Set the device label, truncated to [`MAX_LABEL_CHARS`].
    pub fn label(mut self, label: &str) -> Self {
        self.device_label = truncate_label(label);
        self
    }

    /// Set the bar order.
    pub fn order(mut self, order: BarOrder) -> Self {
        self.bar_order = order;
        self
    }

    /// The configuration as it applies to a source with the given
    /// busy-time capability.
    ///
    /// Busy time cannot be shown per direction when the source only reports
    /// a combined figure, so busy-time mode is forced onto a single bar.
    pub fn effective(&self, separate_busy: bool) -> DisplayConfig {
        let mut config = self.clone();
        if config.metric_mode == MetricMode::BusyTime && !separate_busy {
            config.combine_read_write = true;
        }
        config
    }

    /// The bar slots a presentation should show, in layout order.
    pub fn visible_slots(&self) -> Vec<MetricSlot> {
        if self.combine_read_write {
            return vec![MetricSlot::Combined];
        }
        match self.bar_order {
            BarOrder::ReadWrite => vec![MetricSlot::Read, MetricSlot::Write],
            BarOrder::WriteRead => vec![MetricSlot::Write, MetricSlot::Read],
        }
    }
}

/// Round a throughput ceiling to the nearest multiple of 5 MB/s within
/// `[5, 995]`.
pub fn normalize_max_throughput(mb_s: i64) -> u32 {
    let step = i64::from(THROUGHPUT_STEP_MB_S);
    let rounded = mb_s.max(0).saturating_add(step / 2) / step * step;
    rounded.clamp(
        i64::from(MIN_MAX_THROUGHPUT_MB_S),
        i64::from(MAX_MAX_THROUGHPUT_MB_S),
    ) as u32
}

/// Round a sampling period to the nearest multiple of 50 ms, never below 50.
pub fn normalize_period_ms(period_ms: u64) -> u64 {
    let rounded = period_ms.saturating_add(PERIOD_STEP_MS / 2) / PERIOD_STEP_MS * PERIOD_STEP_MS;
    rounded.max(PERIOD_STEP_MS)
}

/// Keep at most [`MAX_LABEL_CHARS`] characters of a label.
pub fn truncate_label(label: &str) -> String {
    label.chars().take(MAX_LABEL_CHARS).collect()
}
