//! Output backends for emitting display updates.

use std::path::PathBuf;

use diskperf_types::{DisplayConfig, DisplayPayload, Summary};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;

/// What the presentation needs to redraw after one tick.
///
/// `config` is the effective configuration the payload was computed with,
/// so a renderer never has to guess which slots to show.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Update {
    pub device: String,
    pub config: DisplayConfig,
    pub payload: DisplayPayload,
    pub summary: Summary,
}

impl Update {
    /// The update as one newline-terminated line of JSON.
    pub fn to_json_line(&self) -> serde_json::Result<String> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}

/// Events delivered through [`Output::Channel`].
#[derive(Debug, Clone, PartialEq)]
pub enum MonitorEvent {
    /// A tick produced a new sample.
    Update(Update),
    /// The monitor stopped for good; the message is meant for the user.
    Fatal(String),
}

/// Output destination for updates.
#[derive(Debug)]
pub enum Output {
    /// Write each update to stdout as one line of JSON.
    Stdout,

    /// Write the latest update to a JSON file.
    ///
    /// The file is overwritten with each update.
    File(PathBuf),

    /// Send updates through a channel.
    ///
    /// Use `Output::channel()` to create this variant and get the receiver.
    Channel(mpsc::Sender<MonitorEvent>),
}

impl Output {
    /// Create a file output.
    ///
    /// # Example
    ///
    /// ```rust
    /// use diskperf_core::Output;
    ///
    /// let output = Output::file("diskperf.json");
    /// ```
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Output::File(path.into())
    }

    /// Create a channel output and return both the output and receiver.
    ///
    /// # Example
    ///
    /// ```rust
    /// use diskperf_core::Output;
    ///
    /// let (output, mut rx) = Output::channel(16);
    ///
    /// // Later, receive events
    /// // while let Some(event) = rx.recv().await { ... }
    /// ```
    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<MonitorEvent>) {
        let (tx, rx) = mpsc::channel(buffer);
        (Output::Channel(tx), rx)
    }

    /// Emit an update to this output.
    pub async fn emit(&self, update: &Update) -> std::io::Result<()> {
        match self {
            Output::Stdout => {
                let line = update.to_json_line()?;
                let mut stdout = tokio::io::stdout();
                stdout.write_all(line.as_bytes()).await?;
                stdout.flush().await?;
            }
            Output::File(path) => {
                let json = serde_json::to_string_pretty(update)?;
                tokio::fs::write(path, json).await?;
            }
            Output::Channel(tx) => {
                // Don't block the timer if the consumer lags behind
                let _ = tx.try_send(MonitorEvent::Update(update.clone()));
            }
        }
        Ok(())
    }

    /// Report a fatal condition to this output.
    ///
    /// Stdout and file outputs have no user to talk to; the monitor logs the
    /// message anyway.
    pub async fn report(&self, message: &str) {
        if let Output::Channel(tx) = self {
            let _ = tx.send(MonitorEvent::Fatal(message.to_string())).await;
        }
    }
}
