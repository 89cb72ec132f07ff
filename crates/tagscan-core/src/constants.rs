//! Protocol and timing constants for the UHF reader link.
//!
//! The wire protocol is the framed binary format spoken by common UHF RFID
//! reader modules (M5Stack/JRD-4035 family):
//!
//! ```text
//! 0xBB | addr | cmd | lenH lenL | payload ... | checksum | 0x7E
//! ```
//!
//! Commands carry an 8-bit additive checksum; tag report frames carry a
//! 2-byte tag CRC as the last two payload bytes. Timing constants are the
//! empirically tuned defaults of the reference deployment and are exposed as
//! configurable defaults rather than hard limits.

// ============================================================================
// Frame markers and structure
// ============================================================================

/// Start-of-frame marker. Every frame on the wire begins with this byte.
pub const FRAME_START: u8 = 0xBB;

/// End-of-frame marker. Every frame on the wire ends with this byte.
pub const FRAME_END: u8 = 0x7E;

/// Minimum plausible frame length in bytes.
///
/// Header (5) + protocol control (2) + tag CRC (2) is the smallest tag
/// report the decoder will consider; anything shorter is noise.
pub const FRAME_MIN_LEN: usize = 9;

/// Offset of the big-endian 16-bit payload length field.
pub const FRAME_LEN_OFFSET: usize = 3;

/// Offset of the first payload byte.
pub const FRAME_PAYLOAD_OFFSET: usize = 5;

/// Length of the protocol-control field at the start of a tag payload.
pub const PROTOCOL_CONTROL_LEN: usize = 2;

/// Length of the tag CRC at the end of a tag payload.
pub const TAG_CRC_LEN: usize = 2;

/// Minimum EPC length in bytes for a decode to be accepted.
///
/// Shorter candidates are layout-trial artifacts, not real identifiers.
pub const MIN_EPC_LEN: usize = 4;

// ============================================================================
// Command codes
// ============================================================================

/// Reader address used for broadcast commands.
pub const READER_ADDRESS: u8 = 0x00;

/// Single inventory poll command code.
pub const CMD_INVENTORY: u8 = 0x22;

/// Read transmit power command code.
pub const CMD_GET_POWER: u8 = 0xB7;

/// Set transmit power command code.
pub const CMD_SET_POWER: u8 = 0xB6;

/// The fixed inventory poll command, bit-exact as sent on the wire.
///
/// `BB 00 22 00 00 22 7E`: address 0x00, command 0x22, empty payload,
/// additive checksum 0x22.
pub const POLL_COMMAND: [u8; 7] = [0xBB, 0x00, 0x22, 0x00, 0x00, 0x22, 0x7E];

// ============================================================================
// Timing defaults (milliseconds)
// ============================================================================

/// Default collection window per inventory round.
///
/// Measured from the moment the poll command write completes.
pub const DEFAULT_WINDOW_MS: u64 = 400;

/// Grace margin added to the window for the fallback stop.
///
/// Guards a round against a connection that stops delivering data entirely.
pub const WINDOW_GRACE_MS: u64 = 50;

/// How long a single chunk read waits before reporting a quiet wire.
pub const CHUNK_WAIT_MS: u64 = 30;

/// Delay between successful scan rounds.
pub const ROUND_DELAY_MS: u64 = 200;

/// Delay before retrying after a failed scan round.
pub const ROUND_RETRY_DELAY_MS: u64 = 500;

/// Delay between reconnect attempts when the device cannot be opened.
pub const RECONNECT_DELAY_MS: u64 = 5_000;

// ============================================================================
// Device defaults
// ============================================================================

/// Default serial baud rate for the reader modules.
pub const DEFAULT_BAUD_RATE: u32 = 115_200;

/// Address fragments that identify a likely reader port during discovery.
///
/// USB-serial adapters on Linux and macOS, plus Windows COM ports.
pub const READER_PORT_PATTERNS: &[&str] = &[
    "ttyUSB",
    "ttyACM",
    "cu.usbserial",
    "cu.SLAB_USBtoUART",
    "COM",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn poll_command_is_bit_exact() {
        assert_eq!(POLL_COMMAND, [0xBB, 0x00, 0x22, 0x00, 0x00, 0x22, 0x7E]);
        assert_eq!(POLL_COMMAND[0], FRAME_START);
        assert_eq!(*POLL_COMMAND.last().unwrap(), FRAME_END);
    }

    #[test]
    fn poll_command_checksum_is_additive() {
        // Checksum covers addr..payload and is the low byte of the sum.
        let core = &POLL_COMMAND[1..POLL_COMMAND.len() - 2];
        let sum: u8 = core.iter().fold(0u8, |acc, &b| acc.wrapping_add(b));
        assert_eq!(sum, POLL_COMMAND[POLL_COMMAND.len() - 2]);
    }
}
