//! # diskperf
//!
//! A terminal monitor for block device throughput and busy time.
//!
//! The sampling itself lives in [`diskperf_core`]; this crate adds layered
//! settings, the interactive terminal view and the command line binary.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │  settings ──▶ MonitorConfig ──▶ Monitor (tokio task)          │
//! │                    ▲                 │                        │
//! │                    │ update_config   │ MonitorEvent           │
//! │                    │                 ▼                        │
//! │               events ◀── keys ──  app ──▶ ui ──▶ Terminal     │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! - **[`settings`]**: defaults, TOML file, `DISKPERF_*` environment and
//!   command line flags merged into a [`diskperf_core::MonitorConfig`]
//! - **[`app`]**: view state and the configuration the user edits live
//! - **[`events`]**: key bindings
//! - **[`ui`]**: rendering with ratatui
//!
//! ## Usage
//!
//! ```bash
//! # Watch /dev/sda, reading counters from a collector's JSON file
//! diskperf --stats-file /run/diskperf/stats.json --device /dev/sda
//!
//! # Print one JSON update per tick instead of drawing
//! diskperf --headless --mode busy-time
//! ```
//!
//! ### As a library
//!
//! ```
//! use diskperf::{App, Theme};
//! use diskperf_core::MonitorConfig;
//!
//! let mut app = App::new(MonitorConfig::new("/dev/sdb"), "channel: demo", Theme::dark());
//! app.toggle_mode();
//! assert!(app.take_config_change().is_some());
//! ```
//!
//! ### Feeding the view from a monitor
//!
//! ```no_run
//! use diskperf::{App, Theme};
//! use diskperf_core::{ChannelSource, Monitor, MonitorConfig, Output};
//!
//! # tokio_test::block_on(async {
//! let (tx, source) = ChannelSource::create("demo");
//! let (output, mut rx) = Output::channel(16);
//! let config = MonitorConfig::new("/dev/sda");
//! let handle = Monitor::new(source).output(output).start(config.clone());
//!
//! let mut app = App::new(config, "channel: demo", Theme::dark());
//! if let Some(event) = rx.recv().await {
//!     app.handle_event(event);
//! }
//!
//! drop(tx);
//! handle.shutdown().await.unwrap();
//! # });
//! ```

pub mod app;
pub mod events;
pub mod settings;
pub mod ui;

// Re-export main types for convenience
pub use app::App;
pub use settings::{Overrides, Settings, SettingsError};
pub use ui::Theme;
