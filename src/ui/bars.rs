//! The bar gauges, one per visible metric slot.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    text::Span,
    widgets::{Block, Borders, Gauge, Paragraph},
    Frame,
};

use diskperf_core::{clamp_fraction, Update};
use diskperf_types::{MetricMode, MetricSlot, BUSY_UNAVAILABLE};

use crate::app::App;

/// Render the bars for the latest update.
pub fn render(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(app.theme.dim.fg(app.theme.border))
        .title(Span::styled(
            format!(" {} ", app.config.display.metric_mode.label()),
            app.theme.header,
        ));

    let Some(update) = &app.latest else {
        let waiting = Paragraph::new("Waiting for data...")
            .style(app.theme.dim)
            .block(block);
        frame.render_widget(waiting, area);
        return;
    };

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let slots = update.config.visible_slots();
    let rows = Layout::vertical(slots.iter().map(|_| Constraint::Length(1))).split(inner);

    for (slot, row) in slots.iter().zip(rows.iter()) {
        let color = update.config.colors.get(*slot);
        let gauge = Gauge::default()
            .gauge_style(app.theme.bar_style(color))
            .ratio(clamp_fraction(update.payload.fraction(*slot)))
            .label(bar_label(update, *slot));
        frame.render_widget(gauge, *row);
    }
}

/// The text drawn over a bar, e.g. `Read 20 MB/s`.
pub fn bar_label(update: &Update, slot: MetricSlot) -> String {
    match update.payload.mode {
        MetricMode::Throughput => format!(
            "{} {} MB/s",
            slot.label(),
            update.summary.throughput(slot)
        ),
        MetricMode::BusyTime => match update.summary.busy(slot) {
            BUSY_UNAVAILABLE => format!("{} n/a", slot.label()),
            pct => format!("{} {}%", slot.label(), pct),
        },
    }
}

/// Height needed to show the bars of `app`, borders included.
pub fn height(app: &App) -> u16 {
    let slots = app
        .latest
        .as_ref()
        .map(|update| update.config.visible_slots().len())
        .unwrap_or(1);
    u16::try_from(slots).unwrap_or(u16::MAX).saturating_add(2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use diskperf_types::{DisplayConfig, DisplayPayload, Summary};

    fn update(mode: MetricMode) -> Update {
        Update {
            device: "/dev/sda".to_string(),
            config: DisplayConfig::default().mode(mode),
            payload: DisplayPayload {
                mode,
                read: 0.5,
                write: 0.0,
                combined: 0.5,
            },
            summary: Summary {
                label: "sda".to_string(),
                read_mb_s: 20,
                write_mb_s: 0,
                total_mb_s: 20,
                read_busy_pct: BUSY_UNAVAILABLE,
                write_busy_pct: BUSY_UNAVAILABLE,
                total_busy_pct: 37,
            },
        }
    }

    #[test]
    fn throughput_labels() {
        let update = update(MetricMode::Throughput);
        assert_eq!(bar_label(&update, MetricSlot::Read), "Read 20 MB/s");
        assert_eq!(bar_label(&update, MetricSlot::Combined), "Total 20 MB/s");
    }

    #[test]
    fn busy_labels_mark_unavailable() {
        let update = update(MetricMode::BusyTime);
        assert_eq!(bar_label(&update, MetricSlot::Combined), "Total 37%");
        assert_eq!(bar_label(&update, MetricSlot::Write), "Write n/a");
    }
}
