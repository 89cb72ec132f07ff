//! Device-link layer for the tagscan service.
//!
//! This crate owns everything between the scan pipeline and the physical
//! reader: the transport abstraction ([`LinkTransport`]/[`ReaderPort`]), a
//! real serial backend (behind the `serial` feature), a scriptable mock
//! backend for development and tests, and the [`LinkManager`] that drives
//! the connection lifecycle: discovery, open with retry-forever,
//! health-driven reconnect, and live device hot-swap.
//!
//! All I/O traits use native `async fn` (Edition 2024 RPITIT); consumers use
//! generic type parameters rather than trait objects.

#![allow(async_fn_in_trait)]

pub mod handle;
pub mod manager;
pub mod mock;
pub mod state;
pub mod transport;

#[cfg(feature = "serial")]
pub mod serial;

pub use handle::LinkHandle;
pub use manager::{LinkConfig, LinkManager};
pub use mock::{MockPort, MockPortHandle, MockTransport};
pub use state::LinkState;
pub use transport::{LinkTransport, ReaderPort};

#[cfg(feature = "serial")]
pub use serial::{SerialLink, SerialTransport};
