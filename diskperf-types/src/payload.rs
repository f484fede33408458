//! Sampler output: bar fractions and the periodic summary.

use core::fmt;

use crate::MetricMode;

/// Value reported for a busy-time field the source cannot provide.
pub const BUSY_UNAVAILABLE: i64 = -1;

/// One of the three metrics every tick computes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum MetricSlot {
    Read,
    Write,
    /// Read and write together.
    Combined,
}

impl MetricSlot {
    /// All slots, in payload order.
    pub const ALL: [MetricSlot; 3] = [MetricSlot::Read, MetricSlot::Write, MetricSlot::Combined];

    /// Returns the display label for this slot.
    pub fn label(&self) -> &'static str {
        match self {
            MetricSlot::Read => "Read",
            MetricSlot::Write => "Write",
            MetricSlot::Combined => "Total",
        }
    }
}

/// Renderer-ready bar fractions for one tick.
///
/// Every slot is always computed and always within `[0.0, 1.0]`; which of
/// them a presentation shows depends on
/// [`DisplayConfig::visible_slots`](crate::DisplayConfig::visible_slots).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DisplayPayload {
    /// The statistic the fractions were derived from.
    pub mode: MetricMode,
    pub read: f64,
    pub write: f64,
    pub combined: f64,
}

impl DisplayPayload {
    /// The fraction for a slot.
    pub fn fraction(&self, slot: MetricSlot) -> f64 {
        match slot {
            MetricSlot::Read => self.read,
            MetricSlot::Write => self.write,
            MetricSlot::Combined => self.combined,
        }
    }
}

/// Rounded figures for the tooltip of one tick.
///
/// Busy fields hold [`BUSY_UNAVAILABLE`] when the source cannot report
/// them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Summary {
    pub label: String,
    pub read_mb_s: u64,
    pub write_mb_s: u64,
    pub total_mb_s: u64,
    pub read_busy_pct: i64,
    pub write_busy_pct: i64,
    pub total_busy_pct: i64,
}

impl Summary {
    /// Rounded throughput for a slot, in MB/s.
    pub fn throughput(&self, slot: MetricSlot) -> u64 {
        match slot {
            MetricSlot::Read => self.read_mb_s,
            MetricSlot::Write => self.write_mb_s,
            MetricSlot::Combined => self.total_mb_s,
        }
    }

    /// Rounded busy percentage for a slot, or [`BUSY_UNAVAILABLE`].
    pub fn busy(&self, slot: MetricSlot) -> i64 {
        match slot {
            MetricSlot::Read => self.read_busy_pct,
            MetricSlot::Write => self.write_busy_pct,
            MetricSlot::Combined => self.total_busy_pct,
        }
    }

    /// The multi-line tooltip text.
    pub fn tooltip_text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.label)?;
        writeln!(f, "----------------")?;
        writeln!(f, "I/O    (MB/s)")?;
        writeln!(f, "  Read :{:>3}", self.read_mb_s)?;
        writeln!(f, "  Write :{:>3}", self.write_mb_s)?;
        writeln!(f, "  Total :{:>3}", self.total_mb_s)?;
        writeln!(f, "Busy time (%)")?;
        writeln!(f, "  Read : {:>3}", self.read_busy_pct)?;
        writeln!(f, "  Write : {:>3}", self.write_busy_pct)?;
        write!(f, "  Total : {:>3}", self.total_busy_pct)
    }
}
