//! Mock transport for development and testing.
//!
//! Simulates a reader link without hardware: the transport enumerates a
//! scripted port list and can be told to fail the next N open attempts; an
//! opened [`MockPort`] plays back queued byte chunks and records every
//! command written to it. A [`MockPortHandle`] controls a port from the
//! outside (pushing chunks, injecting write failures, severing the
//! connection), which is how tests and the simulated CLI drive scenarios.

use crate::transport::{LinkTransport, ReaderPort};
use bytes::Bytes;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tagscan_core::{DeviceAddress, Error, PortInfo, Result};

/// Scriptable transport backend.
#[derive(Debug, Clone, Default)]
pub struct MockTransport {
    shared: Arc<Mutex<TransportState>>,
}

#[derive(Debug, Default)]
struct TransportState {
    ports: Vec<PortInfo>,
    open_failures: u32,
    open_attempts: u32,
    preload: Vec<Bytes>,
    last_port: Option<MockPortHandle>,
}

impl MockTransport {
    /// Create a transport with no ports registered.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an enumerable port.
    pub fn with_port(self, info: impl Into<PortInfo>) -> Self {
        self.shared.lock().unwrap().ports.push(info.into());
        self
    }

    /// Queue chunks that every newly opened port starts with.
    pub fn with_preload(self, chunks: Vec<Bytes>) -> Self {
        self.shared.lock().unwrap().preload = chunks;
        self
    }

    /// Make the next `n` open attempts fail.
    pub fn fail_next_opens(&self, n: u32) {
        self.shared.lock().unwrap().open_failures = n;
    }

    /// Total open attempts seen so far, including failed ones.
    pub fn open_attempts(&self) -> u32 {
        self.shared.lock().unwrap().open_attempts
    }

    /// Controller for the most recently opened port, if any.
    pub fn last_port(&self) -> Option<MockPortHandle> {
        self.shared.lock().unwrap().last_port.clone()
    }
}

impl LinkTransport for MockTransport {
    type Port = MockPort;

    async fn list_ports(&self) -> Result<Vec<PortInfo>> {
        Ok(self.shared.lock().unwrap().ports.clone())
    }

    async fn open(&self, address: &DeviceAddress) -> Result<MockPort> {
        let mut state = self.shared.lock().unwrap();
        state.open_attempts += 1;
        if state.open_failures > 0 {
            state.open_failures -= 1;
            return Err(Error::open_failed(address.as_str(), "scripted open failure"));
        }
        let port = MockPort::new(address.clone(), state.preload.clone());
        state.last_port = Some(port.controller());
        Ok(port)
    }
}

/// One simulated open connection.
#[derive(Debug)]
pub struct MockPort {
    address: DeviceAddress,
    state: Arc<Mutex<PortState>>,
}

#[derive(Debug, Default)]
struct PortState {
    incoming: VecDeque<Bytes>,
    written: Vec<Vec<u8>>,
    writes_seen: u32,
    fail_write_at: Option<u32>,
    severed: bool,
    closed: bool,
}

impl MockPort {
    fn new(address: DeviceAddress, preload: Vec<Bytes>) -> Self {
        Self {
            address,
            state: Arc::new(Mutex::new(PortState {
                incoming: preload.into_iter().collect(),
                ..PortState::default()
            })),
        }
    }

    /// A quiet port with nothing queued.
    pub fn idle(address: impl Into<DeviceAddress>) -> Self {
        Self::new(address.into(), Vec::new())
    }

    /// A port that will play back the given chunks.
    pub fn with_chunks(address: impl Into<DeviceAddress>, chunks: Vec<Bytes>) -> Self {
        Self::new(address.into(), chunks)
    }

    /// External controller for this port.
    pub fn controller(&self) -> MockPortHandle {
        MockPortHandle {
            address: self.address.clone(),
            state: Arc::clone(&self.state),
        }
    }
}

impl ReaderPort for MockPort {
    async fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.writes_seen += 1;
        if state.severed || state.closed {
            return Err(Error::disconnected(self.address.as_str()));
        }
        if state.fail_write_at == Some(state.writes_seen) {
            return Err(Error::Io(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "scripted write failure",
            )));
        }
        state.written.push(bytes.to_vec());
        Ok(())
    }

    async fn read_chunk(&mut self, max_wait: Duration) -> Result<Bytes> {
        {
            let mut state = self.state.lock().unwrap();
            if state.severed || state.closed {
                return Err(Error::disconnected(self.address.as_str()));
            }
            if let Some(chunk) = state.incoming.pop_front() {
                return Ok(chunk);
            }
        }
        tokio::time::sleep(max_wait).await;

        let mut state = self.state.lock().unwrap();
        if state.severed || state.closed {
            return Err(Error::disconnected(self.address.as_str()));
        }
        Ok(state.incoming.pop_front().unwrap_or_default())
    }

    async fn shutdown(&mut self) -> Result<()> {
        self.state.lock().unwrap().closed = true;
        Ok(())
    }
}

/// Controller for driving a [`MockPort`] from a test or simulation.
#[derive(Debug, Clone)]
pub struct MockPortHandle {
    address: DeviceAddress,
    state: Arc<Mutex<PortState>>,
}

impl MockPortHandle {
    /// Address of the controlled port.
    pub fn address(&self) -> &DeviceAddress {
        &self.address
    }

    /// Queue a chunk for the next read.
    pub fn push_chunk(&self, chunk: impl Into<Bytes>) {
        self.state.lock().unwrap().incoming.push_back(chunk.into());
    }

    /// Make the nth write (1-based, counted from open) fail once.
    pub fn fail_write(&self, nth: u32) {
        self.state.lock().unwrap().fail_write_at = Some(nth);
    }

    /// Simulate the device vanishing: all further I/O errors out.
    pub fn sever(&self) {
        self.state.lock().unwrap().severed = true;
    }

    /// Whether the port has been closed by its owner.
    pub fn is_closed(&self) -> bool {
        self.state.lock().unwrap().closed
    }

    /// Commands written to the port so far.
    pub fn written(&self) -> Vec<Vec<u8>> {
        self.state.lock().unwrap().written.clone()
    }
}
