//! Shared types, constants and errors for the tagscan workspace.
//!
//! This crate holds everything the other crates agree on: the wire-protocol
//! constants of the UHF reader, the validated identifier and address newtypes,
//! the per-round result record, and the central error enum.

pub mod constants;
pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{DeviceAddress, DeviceHint, Epc, InventoryRound, PortInfo, RoundId};
