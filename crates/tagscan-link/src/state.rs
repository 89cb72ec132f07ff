//! Link lifecycle state machine.
//!
//! The connection to the reader moves through four named states:
//!
//! - `Disconnected`: no device open, nothing in flight
//! - `Connecting`: an open attempt (or retry) is in progress
//! - `Open`: a live connection handle exists
//! - `Closing`: teardown of the current connection is in progress
//!
//! # Valid Transitions
//!
//! - Disconnected → Connecting → Open
//! - Connecting → Disconnected (open attempt failed, retry pending)
//! - Open → Closing → Disconnected (unexpected closure or device switch)
//!
//! Exactly one [`LinkManager`](crate::LinkManager) owns the machine at a
//! time; the open handle exists only while the state is `Open`. Modeling the
//! transitions explicitly keeps concurrent switch requests and
//! unexpected-closure events composable instead of racing through scattered
//! flags.

use std::fmt;
use tagscan_core::{Error, Result};

/// Lifecycle state of the device link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkState {
    /// No device open.
    Disconnected,

    /// Open attempt in progress.
    Connecting,

    /// Connection handle is live.
    Open,

    /// Teardown in progress.
    Closing,
}

impl LinkState {
    /// Check whether a transition to `target` is valid from this state.
    ///
    /// # Examples
    ///
    /// ```
    /// use tagscan_link::LinkState;
    ///
    /// assert!(LinkState::Disconnected.can_transition_to(LinkState::Connecting));
    /// assert!(!LinkState::Disconnected.can_transition_to(LinkState::Open));
    /// ```
    pub fn can_transition_to(self, target: LinkState) -> bool {
        matches!(
            (self, target),
            (LinkState::Disconnected, LinkState::Connecting)
                | (LinkState::Connecting, LinkState::Open | LinkState::Disconnected)
                | (LinkState::Open, LinkState::Closing)
                | (LinkState::Closing, LinkState::Disconnected)
        )
    }

    /// Validate and perform a transition.
    ///
    /// # Errors
    /// Returns `Error::InvalidStateTransition` for a transition the state
    /// machine does not allow.
    pub fn transition_to(self, target: LinkState) -> Result<LinkState> {
        if !self.can_transition_to(target) {
            return Err(Error::InvalidStateTransition {
                from: self.to_string(),
                to: target.to_string(),
            });
        }
        Ok(target)
    }
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LinkState::Disconnected => "Disconnected",
            LinkState::Connecting => "Connecting",
            LinkState::Open => "Open",
            LinkState::Closing => "Closing",
        };
        write!(f, "{}", s)
    }
}
