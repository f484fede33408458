use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::app::App;

/// Poll for events with a timeout
pub fn poll_event(timeout: Duration) -> Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}

/// Handle a key event
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    if key.kind == KeyEventKind::Release {
        return;
    }

    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.quit();
        return;
    }

    // If help is shown, any key closes it
    if app.show_help {
        app.show_help = false;
        return;
    }

    match key.code {
        // Quit
        KeyCode::Char('q') | KeyCode::Esc => app.quit(),

        // Help
        KeyCode::Char('?') => app.toggle_help(),

        // Display settings
        KeyCode::Char('m') => app.toggle_mode(),
        KeyCode::Char('c') => app.toggle_combined(),
        KeyCode::Char('o') => app.toggle_order(),
        KeyCode::Char('l') => app.toggle_label(),

        // Throughput ceiling
        KeyCode::Char('+') | KeyCode::Char('=') => app.adjust_ceiling(1),
        KeyCode::Char('-') => app.adjust_ceiling(-1),

        // Refresh period
        KeyCode::Char(']') => app.adjust_period(1),
        KeyCode::Char('[') => app.adjust_period(-1),

        _ => {}
    }
}
