//! Round publication sinks.
//!
//! Delivery is fire-and-forget: the scan loop hands a round to the sink and
//! moves on. No acknowledgment is awaited and nothing is retried: a slow or
//! vanished consumer costs a dropped round, never a stalled scan.

use std::io::Write;
use std::sync::Mutex;
use tagscan_core::InventoryRound;
use tokio::sync::mpsc;
use tracing::debug;

/// Consumer of published rounds.
pub trait RoundSink: Send + Sync {
    /// Publish one completed round. Must not block the scan loop on a slow
    /// consumer and must not fail the round.
    async fn publish(&self, round: &InventoryRound);
}

/// Sink that forwards rounds over a bounded channel.
///
/// Backpressure drops the round rather than delaying the next cycle.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<InventoryRound>,
}

impl ChannelSink {
    /// Create a sink and the receiving end for the consumer.
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<InventoryRound>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self { tx }, rx)
    }
}

impl RoundSink for ChannelSink {
    async fn publish(&self, round: &InventoryRound) {
        match self.tx.try_send(round.clone()) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(dropped)) => {
                debug!(round = %dropped.round, "consumer backlogged; round dropped");
            }
            Err(mpsc::error::TrySendError::Closed(dropped)) => {
                debug!(round = %dropped.round, "consumer gone; round dropped");
            }
        }
    }
}

/// Sink that writes each round as one JSON line.
///
/// The record shape matches the published round event: round number, sorted
/// EPC list, timestamp.
pub struct JsonLineSink<W: Write + Send> {
    writer: Mutex<W>,
}

impl<W: Write + Send> JsonLineSink<W> {
    /// Wrap a writer.
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }
}

impl JsonLineSink<std::io::Stdout> {
    /// JSON lines to standard output.
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write + Send> RoundSink for JsonLineSink<W> {
    async fn publish(&self, round: &InventoryRound) {
        let line = match serde_json::to_string(round) {
            Ok(line) => line,
            Err(error) => {
                debug!(%error, "round serialization failed");
                return;
            }
        };
        let mut writer = match self.writer.lock() {
            Ok(writer) => writer,
            Err(_) => return,
        };
        if let Err(error) = writeln!(writer, "{line}") {
            debug!(%error, "round write failed");
        }
    }
}
