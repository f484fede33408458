use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use crossterm::{
    event::Event,
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::{mpsc, watch};
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use diskperf::{events, ui, App, Overrides, Settings, Theme};
use diskperf_core::{
    DeviceStatsSource, FileSource, Monitor, MonitorConfig, MonitorEvent, MonitorHandle, Output,
};
use diskperf_types::{BarOrder, MetricMode};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Throughput,
    BusyTime,
}

impl From<ModeArg> for MetricMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Throughput => MetricMode::Throughput,
            ModeArg::BusyTime => MetricMode::BusyTime,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OrderArg {
    ReadWrite,
    WriteRead,
}

impl From<OrderArg> for BarOrder {
    fn from(order: OrderArg) -> Self {
        match order {
            OrderArg::ReadWrite => BarOrder::ReadWrite,
            OrderArg::WriteRead => BarOrder::WriteRead,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "diskperf")]
#[command(about = "Terminal monitor for block device throughput and busy time")]
struct Args {
    /// Path to a TOML settings file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Device to monitor (e.g. /dev/sda)
    #[arg(short, long)]
    device: Option<String>,

    /// JSON file of device counters written by a collector
    #[arg(short = 'f', long)]
    stats_file: Option<PathBuf>,

    /// Label shown next to the bars (at most 15 characters)
    #[arg(long)]
    label: Option<String>,

    /// Don't show the label
    #[arg(long)]
    hide_label: bool,

    /// Refresh period in milliseconds (rounded to 50)
    #[arg(short, long)]
    period: Option<u64>,

    /// Statistic to display
    #[arg(short, long, value_enum)]
    mode: Option<ModeArg>,

    /// Throughput that fills a bar, in MB/s (rounded to 5, 5..=995)
    #[arg(long)]
    max_throughput: Option<i64>,

    /// Separate read and write bars
    #[arg(long)]
    split: bool,

    /// Order of separate bars
    #[arg(long, value_enum)]
    order: Option<OrderArg>,

    /// Print one JSON update per tick instead of drawing
    #[arg(long)]
    headless: bool,

    /// Also write the latest update to this JSON file
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Write logs to this file (logs go to stderr only in headless mode)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Args {
    fn overrides(&self) -> Overrides {
        Overrides {
            device: self.device.clone(),
            label: self.label.clone(),
            hide_label: self.hide_label,
            period_ms: self.period,
            mode: self.mode.map(Into::into),
            max_throughput_mb_s: self.max_throughput,
            split: self.split,
            order: self.order.map(Into::into),
            stats_file: self.stats_file.clone(),
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.log_file.as_deref(), args.headless)?;

    let settings = Settings::load(args.config.as_deref(), &args.overrides())?;
    let config = settings.monitor_config()?;

    let source = FileSource::new(&settings.stats_file).with_separate_busy(settings.separate_busy);
    let source_description = source.description().to_string();
    info!(source = %source_description, device = %config.device, "Starting diskperf");

    let mut monitor = Monitor::new(source);
    if let Some(path) = &args.output {
        monitor = monitor.output(Output::file(path));
    }

    if args.headless {
        run_headless(monitor.output(Output::Stdout), config)
    } else {
        run_tui(monitor, config, &source_description)
    }
}

/// Install the tracing subscriber.
///
/// The terminal view owns stdout and stderr, so without a log file it only
/// logs in headless mode.
fn init_logging(log_file: Option<&Path>, headless: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match log_file {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("Failed to create log file {}", path.display()))?;
            tracing_subscriber::registry()
                .with(filter)
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_writer(Mutex::new(file)),
                )
                .init();
        }
        None if headless => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
                .init();
        }
        None => {}
    }
    Ok(())
}

/// Run without drawing until interrupted or the monitor gives up.
fn run_headless(monitor: Monitor<FileSource>, config: MonitorConfig) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;

    rt.block_on(async move {
        let (_config_tx, config_rx) = watch::channel(config);
        let (stop_tx, stop_rx) = watch::channel(false);

        let run = monitor.run(config_rx, stop_rx);
        tokio::pin!(run);

        tokio::select! {
            res = &mut run => res?,
            res = tokio::signal::ctrl_c() => {
                res?;
                info!("Interrupted, stopping");
                let _ = stop_tx.send(true);
                run.await?;
            }
        }
        Ok::<_, anyhow::Error>(())
    })
}

/// Run the terminal view with the monitor in the background
fn run_tui(monitor: Monitor<FileSource>, config: MonitorConfig, source_description: &str) -> Result<()> {
    let rt = tokio::runtime::Runtime::new()?;
    let (output, mut rx) = Output::channel(16);
    let handle = {
        let _guard = rt.enter();
        monitor.output(output).start(config.clone())
    };

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Setup panic hook to restore terminal
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic);
    }));

    let mut app = App::new(config, source_description, Theme::auto_detect());

    // Run the main loop
    let result = run_app(&mut terminal, &mut app, &mut rx, &handle);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    rt.block_on(handle.shutdown())?;
    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    rx: &mut mpsc::Receiver<MonitorEvent>,
    handle: &MonitorHandle,
) -> Result<()> {
    while app.running {
        while let Ok(event) = rx.try_recv() {
            app.handle_event(event);
        }

        if let Some(config) = app.take_config_change() {
            handle.update_config(config);
        }

        terminal.draw(|frame| ui::render(frame, app))?;

        // Poll for events with a short timeout
        if let Some(Event::Key(key)) = events::poll_event(Duration::from_millis(100))? {
            events::handle_key_event(app, key);
        }
    }

    Ok(())
}
