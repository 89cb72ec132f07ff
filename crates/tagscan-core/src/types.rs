use crate::{
    Result,
    constants::{MIN_EPC_LEN, READER_PORT_PATTERNS},
    error::Error,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;

/// Electronic Product Code: a tag identifier as an uppercase-hex string.
///
/// All EPC comparisons in the system are case-insensitive by construction:
/// every `Epc` is normalized to uppercase when it is created, whether it was
/// decoded off the wire or read from configuration.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Epc(String);

impl Epc {
    /// Minimum number of hex digits in a valid EPC.
    pub const MIN_HEX_DIGITS: usize = MIN_EPC_LEN * 2;

    /// Parse an EPC from a configured identifier string.
    ///
    /// The input is trimmed and uppercased before validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidEpc` if the identifier is shorter than
    /// [`Epc::MIN_HEX_DIGITS`], has an odd number of digits, or contains
    /// non-hex characters.
    pub fn new(raw: &str) -> Result<Self> {
        let normalized = raw.trim().to_ascii_uppercase();
        let valid = normalized.len() >= Self::MIN_HEX_DIGITS
            && normalized.len() % 2 == 0
            && normalized.bytes().all(|b| b.is_ascii_hexdigit());
        if !valid {
            return Err(Error::invalid_epc(raw.trim()));
        }
        Ok(Epc(normalized))
    }

    /// Build an EPC from raw decoded bytes.
    ///
    /// # Errors
    /// Returns `Error::InvalidEpc` if fewer than [`MIN_EPC_LEN`] bytes are
    /// supplied.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < MIN_EPC_LEN {
            return Err(Error::invalid_epc(hex_upper(bytes)));
        }
        Ok(Epc(hex_upper(bytes)))
    }

    /// Get the EPC as an uppercase-hex string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Epc {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Epc {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Epc::new(s)
    }
}

fn hex_upper(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02X}")).collect()
}

/// Monotonic inventory round counter, starting at 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct RoundId(u64);

impl RoundId {
    /// The first round of a scan session.
    pub const FIRST: RoundId = RoundId(1);

    /// Get the raw counter value.
    #[must_use]
    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// The id of the round following this one.
    #[must_use]
    pub fn next(self) -> RoundId {
        RoundId(self.0 + 1)
    }
}

impl fmt::Display for RoundId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Transport-specific path of a reader device (serial port name).
///
/// The link manager is the sole writer of the currently configured address;
/// everything else treats addresses as opaque values.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct DeviceAddress(String);

impl DeviceAddress {
    /// Create a device address from a port path.
    pub fn new(path: impl Into<String>) -> Self {
        DeviceAddress(path.into())
    }

    /// Get the address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the address matches a known reader-naming pattern.
    ///
    /// Used by automatic discovery to prefer USB-serial adapters over other
    /// enumerated ports.
    #[must_use]
    pub fn is_likely_reader(&self) -> bool {
        READER_PORT_PATTERNS.iter().any(|p| self.0.contains(p))
    }
}

impl fmt::Display for DeviceAddress {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for DeviceAddress {
    fn from(path: &str) -> Self {
        DeviceAddress::new(path)
    }
}

/// Discovery input: an explicit address or a request to pick one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceHint {
    /// Enumerate available devices and pick the best candidate.
    Auto,
    /// Use exactly this address.
    Address(DeviceAddress),
}

impl DeviceHint {
    /// Build a hint from an optional configured port path.
    pub fn from_option(path: Option<String>) -> Self {
        match path {
            Some(p) => DeviceHint::Address(DeviceAddress::new(p)),
            None => DeviceHint::Auto,
        }
    }
}

/// Metadata for one enumerated device port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortInfo {
    /// The openable address of the port.
    pub address: DeviceAddress,

    /// USB manufacturer string, when the transport reports one.
    pub manufacturer: Option<String>,

    /// USB product string, when the transport reports one.
    pub product: Option<String>,
}

impl PortInfo {
    /// Create port metadata with just an address.
    pub fn new(address: impl Into<DeviceAddress>) -> Self {
        Self {
            address: address.into(),
            manufacturer: None,
            product: None,
        }
    }

    /// Set the manufacturer string.
    pub fn with_manufacturer(mut self, manufacturer: impl Into<String>) -> Self {
        self.manufacturer = Some(manufacturer.into());
        self
    }

    /// Set the product string.
    pub fn with_product(mut self, product: impl Into<String>) -> Self {
        self.product = Some(product.into());
        self
    }
}

impl From<DeviceAddress> for PortInfo {
    fn from(address: DeviceAddress) -> Self {
        PortInfo::new(address)
    }
}

/// The published result of one inventory round.
///
/// Ownership transfers to the publisher as soon as the round is produced;
/// the record is immutable from then on.
#[derive(Debug, Clone, Serialize)]
pub struct InventoryRound {
    /// Round number, strictly increasing by 1 per completed cycle.
    pub round: RoundId,

    /// Deduplicated EPCs observed in this round, in sorted order.
    pub epcs: BTreeSet<Epc>,

    /// When the round result was produced.
    pub timestamp: DateTime<Utc>,
}

impl InventoryRound {
    /// Create a round record stamped with the current time.
    pub fn new(round: RoundId, epcs: BTreeSet<Epc>) -> Self {
        Self {
            round,
            epcs,
            timestamp: Utc::now(),
        }
    }

    /// Number of surviving EPCs in the round.
    #[must_use]
    pub fn len(&self) -> usize {
        self.epcs.len()
    }

    /// Whether the round saw no tags.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.epcs.is_empty()
    }
}
