//! Inventory pipeline: poll rounds, blacklist filtering, the scan loop and
//! round publication.
//!
//! One scan cycle is: write the poll command, collect reader output for a
//! bounded window ([`collect_round`]), deduplicate the decoded EPCs, drop
//! blacklisted identifiers ([`Blacklist`]), classify and publish the result
//! ([`ScanLoop`], [`RoundSink`]). A single logical worker drives the loop;
//! rounds suspend only on timers and I/O.

#![allow(async_fn_in_trait)]

pub mod blacklist;
pub mod round;
pub mod scan_loop;
pub mod sink;

pub use blacklist::{Blacklist, DEFAULT_BLACKLIST};
pub use round::{InventoryConfig, collect_round};
pub use scan_loop::{RoundOutcome, ScanConfig, ScanLoop};
pub use sink::{ChannelSink, JsonLineSink, RoundSink};
