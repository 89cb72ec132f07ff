//! Transport abstraction for the reader link.
//!
//! [`LinkTransport`] is the factory side (enumerate candidate devices and
//! open one) and [`ReaderPort`] is the byte-stream side of an opened
//! connection. The split keeps ownership clear: the
//! [`LinkManager`](crate::LinkManager) holds the transport for the lifetime
//! of the service and exclusively owns whichever port is currently open.
//!
//! Backends: [`SerialTransport`](crate::serial::SerialTransport) for real
//! hardware (feature `serial`) and [`MockTransport`](crate::mock::MockTransport)
//! for development and tests.

use bytes::Bytes;
use std::time::Duration;
use tagscan_core::{DeviceAddress, PortInfo, Result};

/// Factory side of a transport backend.
pub trait LinkTransport: Send + Sync {
    /// The connection type this transport opens.
    type Port: ReaderPort;

    /// Enumerate available device ports with optional metadata.
    ///
    /// # Errors
    /// Returns an error if the underlying enumeration facility fails;
    /// an empty device list is not an error at this level.
    async fn list_ports(&self) -> Result<Vec<PortInfo>>;

    /// Open a connection to the device at `address`.
    ///
    /// One attempt only; retry policy belongs to the caller.
    ///
    /// # Errors
    /// Returns `Error::OpenFailed` when the device cannot be opened.
    async fn open(&self, address: &DeviceAddress) -> Result<Self::Port>;
}

/// Byte-stream side of an opened connection.
///
/// A port is exclusively owned; only the link manager may open or close it,
/// and the scan pipeline borrows it for at most one round at a time.
pub trait ReaderPort: Send {
    /// Write a complete command to the device.
    ///
    /// # Errors
    /// Returns an error if the device rejected or lost the write.
    async fn write_all(&mut self, bytes: &[u8]) -> Result<()>;

    /// Read whatever bytes the device has delivered.
    ///
    /// Waits at most `max_wait` for data; a quiet wire yields an empty
    /// chunk, which is not an error.
    ///
    /// # Errors
    /// Returns an error if the device disappeared.
    async fn read_chunk(&mut self, max_wait: Duration) -> Result<Bytes>;

    /// Close the connection.
    ///
    /// Callers tolerate failure here; a device that vanished mid-session
    /// cannot acknowledge its own teardown.
    async fn shutdown(&mut self) -> Result<()>;
}
