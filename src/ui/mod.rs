//! Terminal rendering using ratatui.
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │ header: label, device, source            │
//! │ bars:   one gauge per visible slot       │
//! │ summary: the tooltip text                │
//! │ status bar: last update, key hints       │
//! └──────────────────────────────────────────┘
//! ```

pub mod bars;
mod theme;

pub use theme::{bar_color, Theme};

use ratatui::{
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::app::App;

/// Render the whole view.
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    let chunks = Layout::vertical([
        Constraint::Length(1),                 // Header
        Constraint::Length(bars::height(app)), // Bars
        Constraint::Min(3),                    // Summary
        Constraint::Length(1),                 // Status bar
    ])
    .split(area);

    render_header(frame, app, chunks[0]);

    if let Some(message) = &app.fatal {
        render_fatal(frame, app, message, chunks[1].union(chunks[2]));
    } else {
        bars::render(frame, app, chunks[1]);
        render_summary(frame, app, chunks[2]);
    }

    render_status_bar(frame, app, chunks[3]);

    if app.show_help {
        render_help(frame, app, area);
    }
}

/// Render the header with the device and where the counters come from.
fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let display = &app.config.display;
    let mut spans = vec![Span::styled(" DISKPERF ", app.theme.header), Span::raw("│ ")];
    if display.show_label {
        spans.push(Span::styled(
            format!("{} ", display.device_label),
            Style::default().add_modifier(Modifier::BOLD),
        ));
    }
    spans.push(Span::raw(format!("{} │ ", app.config.device)));
    spans.push(Span::styled(app.source_description.clone(), app.theme.dim));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

/// Render the summary text of the latest update.
fn render_summary(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(app.theme.border_type)
        .border_style(Style::default().fg(app.theme.border))
        .title(" Summary ");

    let text = app
        .latest
        .as_ref()
        .map(|update| update.summary.tooltip_text())
        .unwrap_or_default();

    frame.render_widget(Paragraph::new(text).block(block), area);
}

fn render_fatal(frame: &mut Frame, app: &App, message: &str, area: Rect) {
    let paragraph = Paragraph::new(message.to_string())
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .style(
            Style::default()
                .fg(app.theme.critical)
                .add_modifier(Modifier::BOLD),
        )
        .block(Block::default().borders(Borders::ALL).border_type(app.theme.border_type));
    frame.render_widget(paragraph, area);
}

/// Render the status bar at the bottom.
///
/// Shows: a status message or time since the last update, and key hints.
fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let left = if let Some(message) = app.status_message() {
        message.to_string()
    } else if let Some(age) = app.since_update() {
        format!("Updated {:.1}s ago", age.as_secs_f64())
    } else {
        "No data yet".to_string()
    };

    let line = Line::from(vec![
        Span::raw(format!(" {} │ ", left)),
        Span::styled("m", Style::default().fg(app.theme.highlight)),
        Span::raw(" mode "),
        Span::styled("c", Style::default().fg(app.theme.highlight)),
        Span::raw(" combine "),
        Span::styled("?", Style::default().fg(app.theme.highlight)),
        Span::raw(" help "),
        Span::styled("q", Style::default().fg(app.theme.highlight)),
        Span::raw(" quit"),
    ]);
    frame.render_widget(Paragraph::new(line).style(app.theme.dim), area);
}

/// Render the help overlay listing every key binding.
fn render_help(frame: &mut Frame, app: &App, area: Rect) {
    let bindings = [
        ("m", "toggle throughput / busy time"),
        ("c", "combine or split read and write"),
        ("o", "swap read and write bars"),
        ("l", "show or hide the label"),
        ("+ / -", "raise or lower the ceiling by 5 MB/s"),
        ("] / [", "slow down or speed up refresh by 50 ms"),
        ("q / Esc", "quit"),
    ];

    let lines: Vec<Line> = bindings
        .iter()
        .map(|(key, what)| {
            Line::from(vec![
                Span::styled(format!("{:>8}  ", key), Style::default().fg(app.theme.highlight)),
                Span::raw(*what),
            ])
        })
        .collect();

    let width = area.width.min(56);
    let height = area.height.min(lines.len() as u16 + 2);
    let popup = Rect::new(
        area.x + (area.width - width) / 2,
        area.y + (area.height - height) / 2,
        width,
        height,
    );

    frame.render_widget(Clear, popup);
    frame.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(app.theme.border_type)
                .title(" Keys "),
        ),
        popup,
    );
}
