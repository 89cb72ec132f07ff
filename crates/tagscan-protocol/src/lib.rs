//! Wire-protocol engine for the UHF reader: frame splitting, tag decoding
//! and command building.
//!
//! The reader speaks a framed binary protocol delimited by `0xBB`/`0x7E`
//! markers. This crate turns a raw byte stream into candidate frame slices
//! ([`FrameSplitter`]), validates slices and extracts tag readings under the
//! known payload-layout ambiguity ([`decode_frame`]), and builds the command
//! frames sent to the reader ([`command`]).

pub mod command;
pub mod decoder;
pub mod splitter;

pub use command::{Reply, build_command, parse_reply, power_reply_dbm, set_power_command, tag_report_frame};
pub use decoder::{TagLayout, TagReading, decode_frame};
pub use splitter::FrameSplitter;
