//! Central error type for the tagscan workspace.
//!
//! Frame-level decode failures are deliberately absent: malformed frames are
//! expected under wire noise and are dropped silently by the decoder. Only
//! conditions that callers must react to are represented here.

use thiserror::Error;

/// Result type alias used across the workspace.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The poll command could not be written; fails the current round.
    #[error("poll command write failed: {message}")]
    WriteFailed { message: String },

    /// Operation attempted on a handle that was deliberately torn down,
    /// typically by a concurrent device switch.
    #[error("device link closed: {device}")]
    LinkClosed { device: String },

    /// The device disappeared mid-session or the link is not open.
    #[error("device disconnected: {device}")]
    Disconnected { device: String },

    /// A single open attempt failed. Carried inside the retry loop and
    /// logged per attempt; never escalated to callers.
    #[error("failed to open {address}: {message}")]
    OpenFailed { address: String, message: String },

    /// No candidate devices were enumerable during automatic discovery.
    #[error("no candidate devices found")]
    DiscoveryFailed,

    /// A device switch request named a missing or invalid target.
    #[error("switch rejected: {reason}")]
    SwitchRejected { reason: String },

    /// A configured identifier is not a valid EPC.
    #[error("invalid EPC identifier: {value}")]
    InvalidEpc { value: String },

    /// Link state machine guard violation.
    #[error("invalid link state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a write failure error.
    pub fn write_failed(message: impl Into<String>) -> Self {
        Self::WriteFailed {
            message: message.into(),
        }
    }

    /// Create a closed-link error.
    pub fn link_closed(device: impl Into<String>) -> Self {
        Self::LinkClosed {
            device: device.into(),
        }
    }

    /// Create a disconnected error.
    pub fn disconnected(device: impl Into<String>) -> Self {
        Self::Disconnected {
            device: device.into(),
        }
    }

    /// Create an open failure error.
    pub fn open_failed(address: impl Into<String>, message: impl Into<String>) -> Self {
        Self::OpenFailed {
            address: address.into(),
            message: message.into(),
        }
    }

    /// Create a switch rejection error.
    pub fn switch_rejected(reason: impl Into<String>) -> Self {
        Self::SwitchRejected {
            reason: reason.into(),
        }
    }

    /// Create an invalid EPC error.
    pub fn invalid_epc(value: impl Into<String>) -> Self {
        Self::InvalidEpc {
            value: value.into(),
        }
    }
}
