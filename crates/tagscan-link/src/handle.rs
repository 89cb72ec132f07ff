//! Borrowable handle to the currently open connection.
//!
//! The [`LinkManager`](crate::LinkManager) owns the port; the scan pipeline
//! gets a [`LinkHandle`] clone for the duration of one round. A handle is a
//! cheap `Arc` around the port plus a closed flag: when the manager tears
//! the connection down (unexpected closure or device switch), it marks the
//! flag first, so any in-flight round holding a stale handle fails fast with
//! `Error::LinkClosed` instead of touching a dead descriptor.

use crate::transport::ReaderPort;
use bytes::Bytes;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tagscan_core::{DeviceAddress, Error, Result};
use tokio::sync::Mutex;

/// Shared handle to one open connection.
#[derive(Debug)]
pub struct LinkHandle<P> {
    inner: Arc<HandleInner<P>>,
}

#[derive(Debug)]
struct HandleInner<P> {
    address: DeviceAddress,
    closed: AtomicBool,
    port: Mutex<P>,
}

impl<P> Clone for LinkHandle<P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<P: ReaderPort> LinkHandle<P> {
    pub(crate) fn new(address: DeviceAddress, port: P) -> Self {
        Self {
            inner: Arc::new(HandleInner {
                address,
                closed: AtomicBool::new(false),
                port: Mutex::new(port),
            }),
        }
    }

    /// Address of the device behind this handle.
    pub fn address(&self) -> &DeviceAddress {
        &self.inner.address
    }

    /// Whether the manager has torn this connection down.
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }

    /// Whether two handles refer to the same connection.
    pub fn same_connection(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Write a command through the connection.
    ///
    /// # Errors
    /// `Error::LinkClosed` if the handle is stale; otherwise whatever the
    /// port reports.
    pub async fn write_all(&self, bytes: &[u8]) -> Result<()> {
        self.ensure_live()?;
        self.inner.port.lock().await.write_all(bytes).await
    }

    /// Read one chunk from the connection, waiting at most `max_wait`.
    ///
    /// # Errors
    /// `Error::LinkClosed` if the handle is stale; otherwise whatever the
    /// port reports.
    pub async fn read_chunk(&self, max_wait: Duration) -> Result<Bytes> {
        self.ensure_live()?;
        self.inner.port.lock().await.read_chunk(max_wait).await
    }

    /// Mark the handle stale and close the underlying port.
    ///
    /// The flag is set before the port lock is taken, so a round blocked in
    /// a read observes the teardown on its next operation. Close failures
    /// are tolerated: a vanished device cannot acknowledge its teardown.
    pub(crate) async fn teardown(&self) {
        self.inner.closed.store(true, Ordering::SeqCst);
        if let Err(error) = self.inner.port.lock().await.shutdown().await {
            tracing::debug!(device = %self.inner.address, %error, "close failed during teardown");
        }
    }

    fn ensure_live(&self) -> Result<()> {
        if self.is_closed() {
            return Err(Error::link_closed(self.inner.address.as_str()));
        }
        Ok(())
    }
}
