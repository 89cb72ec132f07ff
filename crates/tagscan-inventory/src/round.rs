//! Inventory-round coordinator.
//!
//! One round is: write the fixed poll command, accumulate every chunk the
//! connection delivers until the collection window elapses, then parse the
//! whole buffer and return the deduplicated EPC set.
//!
//! The window is a single deadline computed immediately after the write
//! succeeds. Two triggers end collection: the deadline check that runs on
//! every chunk arrival, and a hard stop at `window + grace` that fires even
//! if the connection stops delivering data entirely. Both routes converge on
//! the same parse step, so finishing is effectively idempotent: exactly one
//! parse per round, whichever trigger fires first.

use bytes::BytesMut;
use std::collections::BTreeSet;
use std::time::Duration;
use tagscan_core::{
    Epc, Error, Result,
    constants::{CHUNK_WAIT_MS, DEFAULT_WINDOW_MS, POLL_COMMAND, WINDOW_GRACE_MS},
};
use tagscan_link::{LinkHandle, ReaderPort};
use tagscan_protocol::{FrameSplitter, decode_frame};
use tokio::time::Instant;
use tracing::trace;

/// Timing configuration for one inventory round.
#[derive(Debug, Clone)]
pub struct InventoryConfig {
    /// Collection window, measured from the completed poll write.
    pub window: Duration,

    /// Grace margin past the window before the hard stop fires.
    pub grace: Duration,

    /// Upper bound on a single chunk wait.
    pub chunk_wait: Duration,
}

impl Default for InventoryConfig {
    fn default() -> Self {
        Self {
            window: Duration::from_millis(DEFAULT_WINDOW_MS),
            grace: Duration::from_millis(WINDOW_GRACE_MS),
            chunk_wait: Duration::from_millis(CHUNK_WAIT_MS),
        }
    }
}

/// Run one inventory round against the borrowed connection.
///
/// The handle borrow ends when this function returns; nothing of the round
/// outlives it. Exactly one reader is draining the connection at a time.
///
/// # Errors
/// - `Error::WriteFailed` if the poll command could not be sent; the round
///   fails immediately, no partial window is attempted.
/// - `Error::LinkClosed` / `Error::Disconnected` if the connection was torn
///   down or vanished mid-round.
pub async fn collect_round<P: ReaderPort>(
    handle: &LinkHandle<P>,
    config: &InventoryConfig,
) -> Result<BTreeSet<Epc>> {
    handle.write_all(&POLL_COMMAND).await.map_err(|err| match err {
        Error::LinkClosed { .. } | Error::Disconnected { .. } => err,
        other => Error::write_failed(other.to_string()),
    })?;

    let deadline = Instant::now() + config.window;
    let hard_stop = deadline + config.grace;
    let mut raw = BytesMut::new();

    loop {
        match tokio::time::timeout_at(hard_stop, handle.read_chunk(config.chunk_wait)).await {
            Ok(Ok(chunk)) => {
                raw.extend_from_slice(&chunk);
                if Instant::now() >= deadline {
                    break;
                }
            }
            Ok(Err(err)) => return Err(err),
            // The wire went quiet past the window; force the finish.
            Err(_elapsed) => break,
        }
    }

    let epcs = parse_round_buffer(&raw);
    trace!(bytes = raw.len(), unique = epcs.len(), "round buffer parsed");
    Ok(epcs)
}

/// Split and decode a full round buffer into a deduplicated EPC set.
///
/// Reading equality is EPC-string equality; antenna and CRC differences
/// never produce duplicates.
fn parse_round_buffer(raw: &[u8]) -> BTreeSet<Epc> {
    FrameSplitter::new(raw)
        .filter_map(decode_frame)
        .map(|reading| reading.into_epc())
        .collect()
}
