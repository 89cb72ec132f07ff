//! Serial transport backed by the `serialport` crate.
//!
//! Reads are blocking with short, bounded timeouts (the chunk wait of the
//! inventory window), which keeps the single-worker scan loop responsive
//! without a dedicated reader thread.

use crate::transport::{LinkTransport, ReaderPort};
use bytes::Bytes;
use serialport::{ClearBuffer, SerialPortType};
use std::io::{Read, Write};
use std::time::Duration;
use tagscan_core::{DeviceAddress, Error, PortInfo, Result, constants::DEFAULT_BAUD_RATE};

/// How long a freshly opened adapter gets to settle before first use.
const OPEN_SETTLE: Duration = Duration::from_millis(500);

/// Read buffer size per chunk; tag bursts are far smaller than this.
const CHUNK_BUF_LEN: usize = 256;

/// Transport that enumerates and opens system serial ports.
#[derive(Debug, Clone)]
pub struct SerialTransport {
    baud_rate: u32,
}

impl SerialTransport {
    /// Create a transport using the reader's default baud rate.
    pub fn new() -> Self {
        Self::with_baud_rate(DEFAULT_BAUD_RATE)
    }

    /// Create a transport with an explicit baud rate.
    pub fn with_baud_rate(baud_rate: u32) -> Self {
        Self { baud_rate }
    }
}

impl Default for SerialTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkTransport for SerialTransport {
    type Port = SerialLink;

    async fn list_ports(&self) -> Result<Vec<PortInfo>> {
        let ports = serialport::available_ports()
            .map_err(|e| Error::Io(std::io::Error::other(e.to_string())))?;
        Ok(ports
            .into_iter()
            .map(|p| {
                let mut info = PortInfo::new(p.port_name.as_str());
                if let SerialPortType::UsbPort(usb) = p.port_type {
                    if let Some(manufacturer) = usb.manufacturer {
                        info = info.with_manufacturer(manufacturer);
                    }
                    if let Some(product) = usb.product {
                        info = info.with_product(product);
                    }
                }
                info
            })
            .collect())
    }

    async fn open(&self, address: &DeviceAddress) -> Result<SerialLink> {
        let port = serialport::new(address.as_str(), self.baud_rate)
            .timeout(Duration::from_secs(1))
            .open()
            .map_err(|e| Error::open_failed(address.as_str(), e.to_string()))?;

        // Some USB adapters drop bytes right after open; give the line a
        // moment, then start from a clean input buffer.
        tokio::time::sleep(OPEN_SETTLE).await;
        port.clear(ClearBuffer::Input)
            .map_err(|e| Error::open_failed(address.as_str(), e.to_string()))?;

        Ok(SerialLink {
            address: address.clone(),
            port,
        })
    }
}

/// One open serial connection to the reader.
pub struct SerialLink {
    address: DeviceAddress,
    port: Box<dyn serialport::SerialPort>,
}

impl ReaderPort for SerialLink {
    async fn write_all(&mut self, bytes: &[u8]) -> Result<()> {
        self.port.write_all(bytes)?;
        self.port.flush()?;
        Ok(())
    }

    async fn read_chunk(&mut self, max_wait: Duration) -> Result<Bytes> {
        self.port
            .set_timeout(max_wait)
            .map_err(|e| Error::disconnected(format!("{}: {e}", self.address)))?;

        let mut buf = [0u8; CHUNK_BUF_LEN];
        match self.port.read(&mut buf) {
            Ok(n) => Ok(Bytes::copy_from_slice(&buf[..n])),
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => Ok(Bytes::new()),
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Ok(Bytes::new()),
            Err(e) => Err(Error::Io(e)),
        }
    }

    async fn shutdown(&mut self) -> Result<()> {
        self.port.clear(ClearBuffer::All).map_err(|e| {
            Error::disconnected(format!("{}: {e}", self.address))
        })?;
        Ok(())
    }
}
