//! Link lifecycle manager.
//!
//! The [`LinkManager`] is the sole owner of the physical connection. It
//! discovers a candidate device, opens it with an indefinite fixed-delay
//! retry, supervises the session, reconnects after unexpected closure, and
//! performs live device switches while the scan loop keeps running.
//!
//! All lifecycle state lives behind one async mutex, held across an entire
//! open-retry sequence: a switch request arriving while an auto-reconnect is
//! already `Connecting` queues on the mutex and is serialized, never raced.
//! Scan rounds do not take this lock; they operate
//! on a [`LinkHandle`] clone and observe teardown through the handle's
//! closed flag.

use crate::handle::LinkHandle;
use crate::state::LinkState;
use crate::transport::LinkTransport;
use std::time::Duration;
use tagscan_core::{DeviceAddress, DeviceHint, Error, Result, constants::RECONNECT_DELAY_MS};
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Tunable link timings.
#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// Delay between open attempts and before automatic reconnects.
    pub reconnect_delay: Duration,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            reconnect_delay: Duration::from_millis(RECONNECT_DELAY_MS),
        }
    }
}

/// Owner of the device connection and its lifecycle state machine.
pub struct LinkManager<T: LinkTransport> {
    transport: T,
    config: LinkConfig,
    cell: Mutex<LinkCell<T::Port>>,
}

struct LinkCell<P> {
    state: LinkState,
    address: Option<DeviceAddress>,
    handle: Option<LinkHandle<P>>,
}

impl<T: LinkTransport> LinkManager<T> {
    /// Create a manager with default timings.
    pub fn new(transport: T) -> Self {
        Self::with_config(transport, LinkConfig::default())
    }

    /// Create a manager with explicit timings.
    pub fn with_config(transport: T, config: LinkConfig) -> Self {
        Self {
            transport,
            config,
            cell: Mutex::new(LinkCell {
                state: LinkState::Disconnected,
                address: None,
                handle: None,
            }),
        }
    }

    /// Resolve a device hint to a concrete address.
    ///
    /// An explicit address passes through unchanged. `Auto` enumerates the
    /// transport's ports, prefers the first whose address matches a known
    /// reader-naming pattern, and falls back to the first enumerated port.
    ///
    /// # Errors
    /// Returns `Error::DiscoveryFailed` when automatic selection finds no
    /// devices at all.
    pub async fn discover(&self, hint: &DeviceHint) -> Result<DeviceAddress> {
        match hint {
            DeviceHint::Address(address) => Ok(address.clone()),
            DeviceHint::Auto => {
                let ports = self.transport.list_ports().await?;
                let chosen = ports
                    .iter()
                    .find(|p| p.address.is_likely_reader())
                    .or_else(|| ports.first())
                    .ok_or(Error::DiscoveryFailed)?;
                info!(address = %chosen.address, product = ?chosen.product, "discovered reader port");
                Ok(chosen.address.clone())
            }
        }
    }

    /// Open the device at `address` and make it the configured device.
    ///
    /// Blocks until the device opens: failed attempts are logged and retried
    /// after the configured delay, indefinitely. The device is assumed to
    /// eventually become available.
    pub async fn connect(&self, address: DeviceAddress) -> Result<()> {
        let mut cell = self.cell.lock().await;
        cell.address = Some(address.clone());
        self.open_locked(&mut cell, address).await
    }

    /// Current lifecycle state.
    pub async fn state(&self) -> LinkState {
        self.cell.lock().await.state
    }

    /// Currently configured device address, if any.
    pub async fn address(&self) -> Option<DeviceAddress> {
        self.cell.lock().await.address.clone()
    }

    /// Borrow the live connection for one scan round.
    ///
    /// The clone must not be retained past the round; the next round
    /// re-borrows whatever connection is current by then.
    ///
    /// # Errors
    /// Returns `Error::Disconnected` when no connection is open.
    pub async fn handle(&self) -> Result<LinkHandle<T::Port>> {
        let cell = self.cell.lock().await;
        match (&cell.state, &cell.handle) {
            (LinkState::Open, Some(handle)) => Ok(handle.clone()),
            _ => Err(Error::disconnected(
                cell.address
                    .as_ref()
                    .map(DeviceAddress::as_str)
                    .unwrap_or("unconfigured"),
            )),
        }
    }

    /// Recover from an unexpected closure.
    ///
    /// Tears down whatever is left of the session, waits the reconnect
    /// delay, then re-opens the last known address with the usual
    /// retry-forever policy.
    ///
    /// # Errors
    /// Returns `Error::Disconnected` when no address was ever configured.
    pub async fn recover(&self) -> Result<()> {
        let mut cell = self.cell.lock().await;
        self.teardown_locked(&mut cell).await?;
        let address = cell
            .address
            .clone()
            .ok_or_else(|| Error::disconnected("unconfigured"))?;
        warn!(address = %address, delay_ms = self.config.reconnect_delay.as_millis() as u64,
            "link lost; reconnecting");
        tokio::time::sleep(self.config.reconnect_delay).await;
        self.open_locked(&mut cell, address).await
    }

    /// Switch to a different device address.
    ///
    /// Switching to the currently configured address is a no-op: the
    /// connection handle is left untouched. Otherwise the existing
    /// connection is fully torn down (close failure tolerated), the address
    /// updated, and the new device opened with the retry-forever policy.
    ///
    /// Safe to call while a scan round is in flight: the round holds a stale
    /// handle, fails against it, and the scan loop retries on the new
    /// connection next cycle.
    ///
    /// # Errors
    /// Returns `Error::SwitchRejected` for an empty target address.
    pub async fn switch_to(&self, target: DeviceAddress) -> Result<()> {
        if target.as_str().trim().is_empty() {
            return Err(Error::switch_rejected("empty target address"));
        }
        let mut cell = self.cell.lock().await;
        if cell.address.as_ref() == Some(&target) {
            info!(address = %target, "switch target already active");
            return Ok(());
        }
        info!(
            from = cell.address.as_ref().map(DeviceAddress::as_str).unwrap_or("none"),
            to = %target,
            "switching device"
        );
        self.teardown_locked(&mut cell).await?;
        cell.address = Some(target.clone());
        self.open_locked(&mut cell, target).await
    }

    /// Open `address`, retrying forever with the configured delay.
    async fn open_locked(&self, cell: &mut LinkCell<T::Port>, address: DeviceAddress) -> Result<()> {
        let mut attempt: u64 = 0;
        loop {
            attempt += 1;
            cell.state = cell.state.transition_to(LinkState::Connecting)?;
            match self.transport.open(&address).await {
                Ok(port) => {
                    cell.state = cell.state.transition_to(LinkState::Open)?;
                    cell.handle = Some(LinkHandle::new(address.clone(), port));
                    info!(address = %address, attempt, "device link open");
                    return Ok(());
                }
                Err(error) => {
                    cell.state = cell.state.transition_to(LinkState::Disconnected)?;
                    warn!(
                        address = %address,
                        attempt,
                        %error,
                        retry_ms = self.config.reconnect_delay.as_millis() as u64,
                        "open failed; retrying"
                    );
                    tokio::time::sleep(self.config.reconnect_delay).await;
                }
            }
        }
    }

    /// Tear down the current connection, if any.
    async fn teardown_locked(&self, cell: &mut LinkCell<T::Port>) -> Result<()> {
        if let Some(handle) = cell.handle.take() {
            cell.state = cell.state.transition_to(LinkState::Closing)?;
            handle.teardown().await;
            cell.state = cell.state.transition_to(LinkState::Disconnected)?;
        }
        Ok(())
    }
}
