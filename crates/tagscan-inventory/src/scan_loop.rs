//! The scan loop: repeated inventory cycles against whatever connection the
//! link manager currently exposes.
//!
//! Each cycle borrows the live handle, runs one collection round, filters
//! the result through the blacklist, classifies it for health accounting,
//! publishes it, and schedules the next cycle after a fixed inter-round
//! delay. A failed cycle (write failure, stale handle from a concurrent
//! switch, vanished device) is logged and retried after a longer delay;
//! the loop never terminates on a round failure.
//!
//! Round ids are issued strictly in increasing order, one per cycle,
//! successful or not: the id advances only after the cycle has completed
//! its publish-or-log step, so no id is ever skipped or reused.

use crate::blacklist::Blacklist;
use crate::round::{InventoryConfig, collect_round};
use crate::sink::RoundSink;
use std::sync::Arc;
use std::time::Duration;
use tagscan_core::{
    Error, InventoryRound, Result, RoundId,
    constants::{ROUND_DELAY_MS, ROUND_RETRY_DELAY_MS},
};
use tagscan_link::{LinkManager, LinkTransport};
use tracing::{info, warn};

/// Timing configuration for the scan loop.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Per-round collection timings.
    pub inventory: InventoryConfig,

    /// Delay between successful cycles.
    pub round_delay: Duration,

    /// Delay before retrying after a failed cycle.
    pub retry_delay: Duration,
}

impl ScanConfig {
    /// Defaults from the reference deployment.
    pub fn new() -> Self {
        Self {
            inventory: InventoryConfig::default(),
            round_delay: Duration::from_millis(ROUND_DELAY_MS),
            retry_delay: Duration::from_millis(ROUND_RETRY_DELAY_MS),
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Health classification of one completed round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundOutcome {
    /// Tags survived filtering and were reported.
    Tags(usize),

    /// The reader saw no tags at all.
    Empty,

    /// Every observed tag was blacklisted.
    AllBlacklisted,
}

/// Drives inventory cycles until the task is dropped.
pub struct ScanLoop<T: LinkTransport, S: RoundSink> {
    link: Arc<LinkManager<T>>,
    sink: S,
    blacklist: Blacklist,
    config: ScanConfig,
    next_round: RoundId,
}

impl<T: LinkTransport, S: RoundSink> ScanLoop<T, S> {
    /// Create a scan loop over an already managed link.
    ///
    /// The manager stays shared: a control surface holding another clone of
    /// the `Arc` may switch devices while the loop runs.
    pub fn new(link: Arc<LinkManager<T>>, sink: S, blacklist: Blacklist, config: ScanConfig) -> Self {
        Self {
            link,
            sink,
            blacklist,
            config,
            next_round: RoundId::FIRST,
        }
    }

    /// The shared link manager.
    pub fn link(&self) -> &Arc<LinkManager<T>> {
        &self.link
    }

    /// Id the next cycle will carry.
    pub fn next_round(&self) -> RoundId {
        self.next_round
    }

    /// Replace the blacklist for subsequent rounds.
    ///
    /// The set stays immutable within a round; a replacement takes effect
    /// from the next cycle.
    pub fn set_blacklist(&mut self, blacklist: Blacklist) {
        self.blacklist = blacklist;
    }

    /// Run scan cycles forever.
    pub async fn run(&mut self) {
        loop {
            self.run_cycle().await;
        }
    }

    /// Run a bounded number of cycles. Primarily for tests and tooling.
    pub async fn run_cycles(&mut self, count: usize) {
        for _ in 0..count {
            self.run_cycle().await;
        }
    }

    /// One complete cycle: round, filter, classify, publish, delay.
    async fn run_cycle(&mut self) {
        let round_id = self.next_round;
        match self.try_round(round_id).await {
            Ok(_) => {
                self.next_round = round_id.next();
                tokio::time::sleep(self.config.round_delay).await;
            }
            Err(error) => {
                warn!(round = %round_id, %error, "scan cycle failed");
                self.next_round = round_id.next();
                tokio::time::sleep(self.config.retry_delay).await;
                self.handle_cycle_failure(error).await;
            }
        }
    }

    /// Attempt one round against the current connection.
    async fn try_round(&self, round_id: RoundId) -> Result<RoundOutcome> {
        let handle = self.link.handle().await?;
        let epcs = collect_round(&handle, &self.config.inventory).await?;
        drop(handle);

        let raw = InventoryRound::new(round_id, epcs);
        let filtered = self.blacklist.apply(&raw);

        let outcome = if raw.is_empty() {
            info!(round = %round_id, "no tags detected");
            RoundOutcome::Empty
        } else if filtered.is_empty() {
            info!(round = %round_id, observed = raw.len(), "all observed tags blacklisted");
            RoundOutcome::AllBlacklisted
        } else {
            info!(round = %round_id, tags = filtered.len(), "round published");
            RoundOutcome::Tags(filtered.len())
        };

        self.sink.publish(&filtered).await;
        Ok(outcome)
    }

    /// Run link recovery when the failure implicates the device itself.
    ///
    /// A stale handle from a deliberate switch needs no recovery: the
    /// manager already opened the new device, and the next cycle borrows it.
    async fn handle_cycle_failure(&self, error: Error) {
        match error {
            Error::LinkClosed { .. } => {}
            Error::WriteFailed { .. } | Error::Disconnected { .. } | Error::Io(_) => {
                if let Err(recover_error) = self.link.recover().await {
                    warn!(error = %recover_error, "link recovery failed");
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::ChannelSink;
    use bytes::Bytes;
    use tagscan_core::{DeviceAddress, PortInfo};
    use tagscan_link::MockTransport;
    use tagscan_protocol::tag_report_frame;

    fn frame(epc: &[u8]) -> Bytes {
        Bytes::from(tag_report_frame(0xC8, &[0x30, 0x00], epc, &[0xAB, 0xCD]))
    }

    async fn connected_manager(transport: MockTransport) -> Arc<LinkManager<MockTransport>> {
        let manager = Arc::new(LinkManager::new(transport));
        manager.connect(DeviceAddress::new("mock0")).await.unwrap();
        manager
    }

    #[tokio::test(start_paused = true)]
    async fn test_single_cycle_publishes_filtered_round() {
        let transport = MockTransport::new()
            .with_port(PortInfo::new("mock0"))
            .with_preload(vec![frame(&[0xE2, 0x80, 0x11, 0xAA]), frame(&[0xDE, 0xAD, 0xBE, 0xEF])]);
        let link = connected_manager(transport).await;

        let (sink, mut rx) = ChannelSink::new(8);
        let blacklist = Blacklist::with_entries(["DEADBEEF"]).unwrap();
        let mut scan = ScanLoop::new(link, sink, blacklist, ScanConfig::new());

        scan.run_cycles(1).await;

        let published = rx.recv().await.unwrap();
        assert_eq!(published.round, RoundId::FIRST);
        assert_eq!(published.len(), 1);
        assert_eq!(published.epcs.iter().next().unwrap().as_str(), "E28011AA");
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_rounds_are_published_too() {
        let transport = MockTransport::new().with_port(PortInfo::new("mock0"));
        let link = connected_manager(transport).await;

        let (sink, mut rx) = ChannelSink::new(8);
        let mut scan = ScanLoop::new(link, sink, Blacklist::baseline(), ScanConfig::new());

        scan.run_cycles(2).await;

        assert!(rx.recv().await.unwrap().is_empty());
        assert!(rx.recv().await.unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_round_ids_strictly_increase_across_write_failure() {
        // Every opened port carries the same preload, so rounds after a
        // reconnect still see frames.
        let transport = MockTransport::new()
            .with_port(PortInfo::new("mock0"))
            .with_preload(vec![frame(&[0xE2, 0x80, 0x11, 0xAA])]);
        let link = connected_manager(transport.clone()).await;

        // Fail the 4th write on the first port: cycle 4 loses its poll.
        transport.last_port().unwrap().fail_write(4);

        let (sink, mut rx) = ChannelSink::new(32);
        let mut scan = ScanLoop::new(link, sink, Blacklist::baseline(), ScanConfig::new());

        scan.run_cycles(10).await;
        assert_eq!(scan.next_round().as_u64(), 11);

        let mut published = Vec::new();
        while let Ok(round) = rx.try_recv() {
            published.push(round.round.as_u64());
        }
        // Cycle 4 failed and consumed its id; everything else published.
        assert_eq!(published, vec![1, 2, 3, 5, 6, 7, 8, 9, 10]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_device_switch_mid_stream_is_absorbed() {
        let transport = MockTransport::new()
            .with_port(PortInfo::new("mock0"))
            .with_port(PortInfo::new("mock1"))
            .with_preload(vec![frame(&[0xE2, 0x80, 0x11, 0xAA])]);
        let link = connected_manager(transport).await;

        let (sink, mut rx) = ChannelSink::new(8);
        let mut scan = ScanLoop::new(Arc::clone(&link), sink, Blacklist::baseline(), ScanConfig::new());

        scan.run_cycles(1).await;
        // Control surface swaps the device between cycles.
        link.switch_to(DeviceAddress::new("mock1")).await.unwrap();
        scan.run_cycles(1).await;

        let first = rx.recv().await.unwrap();
        let second = rx.recv().await.unwrap();
        assert_eq!(first.round.as_u64(), 1);
        assert_eq!(second.round.as_u64(), 2);
        assert_eq!(link.address().await.unwrap().as_str(), "mock1");
    }

    #[tokio::test(start_paused = true)]
    async fn test_severed_device_triggers_recovery_and_loop_continues() {
        let transport = MockTransport::new()
            .with_port(PortInfo::new("mock0"))
            .with_preload(vec![frame(&[0xE2, 0x80, 0x11, 0xAA])]);
        let link = connected_manager(transport.clone()).await;

        let (sink, mut rx) = ChannelSink::new(8);
        let mut scan = ScanLoop::new(Arc::clone(&link), sink, Blacklist::baseline(), ScanConfig::new());

        scan.run_cycles(1).await;
        transport.last_port().unwrap().sever();
        scan.run_cycles(2).await;

        // Cycle 2 failed against the dead device, recovery reopened it,
        // cycle 3 published again.
        let ids: Vec<u64> = std::iter::from_fn(|| rx.try_recv().ok())
            .map(|r| r.round.as_u64())
            .collect();
        assert_eq!(ids, vec![1, 3]);
        assert!(transport.open_attempts() >= 2);
    }
}
