//! Tag report decoder.
//!
//! Validates one candidate frame slice against the wire structure and
//! extracts a tag reading. Malformed slices are dropped silently (under
//! wire noise they are expected, not exceptional), so the decoder returns
//! `Option` rather than `Result`.
//!
//! # Layout ambiguity
//!
//! Depending on reader firmware, the payload after the 2-byte protocol
//! control field may or may not carry a 1-byte antenna/RSSI field before the
//! EPC. The decoder tries the candidate layouts in priority order, antenna
//! byte present first, then absent, and takes the first layout that leaves
//! at least 4 EPC bytes after stripping the leading skip and the trailing
//! 2-byte tag CRC. The antenna-tagged layout is preferred when both fit,
//! matching the more common firmware behavior.

use std::fmt;
use tagscan_core::{
    Epc,
    constants::{
        FRAME_END, FRAME_LEN_OFFSET, FRAME_MIN_LEN, FRAME_PAYLOAD_OFFSET, FRAME_START,
        MIN_EPC_LEN, PROTOCOL_CONTROL_LEN, TAG_CRC_LEN,
    },
};

/// Candidate payload layouts, tried in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagLayout {
    /// Protocol control, then a 1-byte antenna/RSSI field, then EPC + CRC.
    AntennaPrefixed,
    /// Protocol control directly followed by EPC + CRC.
    Bare,
}

impl TagLayout {
    /// All layouts in decode priority order.
    pub const PRIORITY: [TagLayout; 2] = [TagLayout::AntennaPrefixed, TagLayout::Bare];

    /// Bytes to skip between the protocol control field and the EPC.
    pub fn leading_bytes(self) -> usize {
        match self {
            TagLayout::AntennaPrefixed => 1,
            TagLayout::Bare => 0,
        }
    }
}

/// One decoded tag observation. Immutable once produced.
///
/// Identity is the EPC alone: two readings of the same tag compare equal
/// even when their antenna fields or CRCs differ.
#[derive(Debug, Clone)]
pub struct TagReading {
    pc: [u8; PROTOCOL_CONTROL_LEN],
    epc: Epc,
    checksum: [u8; TAG_CRC_LEN],
    layout: TagLayout,
}

impl TagReading {
    /// The decoded EPC.
    pub fn epc(&self) -> &Epc {
        &self.epc
    }

    /// Consume the reading, keeping only the EPC.
    pub fn into_epc(self) -> Epc {
        self.epc
    }

    /// Protocol control field as lowercase hex, for diagnostics only.
    pub fn pc_hex(&self) -> String {
        hex_lower(&self.pc)
    }

    /// Tag CRC as lowercase hex, for diagnostics only.
    pub fn checksum_hex(&self) -> String {
        hex_lower(&self.checksum)
    }

    /// Which payload layout the decode accepted.
    pub fn layout(&self) -> TagLayout {
        self.layout
    }
}

impl PartialEq for TagReading {
    fn eq(&self, other: &Self) -> bool {
        self.epc == other.epc
    }
}

impl Eq for TagReading {}

impl std::hash::Hash for TagReading {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.epc.hash(state);
    }
}

impl fmt::Display for TagReading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (pc={}, crc={})", self.epc, self.pc_hex(), self.checksum_hex())
    }
}

/// Decode one candidate frame slice into a tag reading.
///
/// Structural requirements: at least [`FRAME_MIN_LEN`] bytes, start and end
/// markers in place, and a payload at least as long as the declared
/// big-endian 16-bit length field. A declared length overrunning the
/// available bytes invalidates the frame.
///
/// Returns `None` for anything malformed; there is deliberately no further
/// signal.
pub fn decode_frame(slice: &[u8]) -> Option<TagReading> {
    if slice.len() < FRAME_MIN_LEN {
        return None;
    }
    if slice[0] != FRAME_START || slice[slice.len() - 1] != FRAME_END {
        return None;
    }

    let declared = u16::from_be_bytes([slice[FRAME_LEN_OFFSET], slice[FRAME_LEN_OFFSET + 1]]) as usize;
    let body = &slice[FRAME_PAYLOAD_OFFSET..slice.len() - 1];
    if body.len() < declared {
        return None;
    }
    let payload = &body[..declared];
    if payload.len() < PROTOCOL_CONTROL_LEN + TAG_CRC_LEN {
        return None;
    }

    let (pc, rest) = payload.split_at(PROTOCOL_CONTROL_LEN);

    for layout in TagLayout::PRIORITY {
        let skip = layout.leading_bytes();
        if rest.len() < skip + TAG_CRC_LEN {
            continue;
        }
        let epc_bytes = &rest[skip..rest.len() - TAG_CRC_LEN];
        if epc_bytes.len() < MIN_EPC_LEN {
            continue;
        }
        if let Ok(epc) = Epc::from_bytes(epc_bytes) {
            let mut pc_field = [0u8; PROTOCOL_CONTROL_LEN];
            pc_field.copy_from_slice(pc);
            let mut crc = [0u8; TAG_CRC_LEN];
            crc.copy_from_slice(&rest[rest.len() - TAG_CRC_LEN..]);
            return Some(TagReading {
                pc: pc_field,
                epc,
                checksum: crc,
                layout,
            });
        }
    }
    None
}

fn hex_lower(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    /// Test helper: assemble a frame around a raw payload.
    fn frame_with_payload(addr: u8, cmd: u8, payload: &[u8]) -> Vec<u8> {
        let len = payload.len() as u16;
        let mut frame = vec![FRAME_START, addr, cmd, (len >> 8) as u8, (len & 0xFF) as u8];
        frame.extend_from_slice(payload);
        frame.push(FRAME_END);
        frame
    }

    #[test]
    fn test_decode_antenna_prefixed_layout() {
        // PC(2) + antenna(1) + EPC(12) + CRC(2)
        let payload = [
            0x30, 0x00, // PC
            0xC8, // antenna/RSSI
            0xE2, 0x00, 0x68, 0x16, 0x00, 0x00, 0x00, 0x60, 0x12, 0x34, 0x56, 0x78, // EPC
            0xAB, 0xCD, // CRC
        ];
        let frame = frame_with_payload(0x02, 0x22, &payload);

        let reading = decode_frame(&frame).unwrap();
        assert_eq!(reading.epc().as_str(), "E20068160000006012345678");
        assert_eq!(reading.layout(), TagLayout::AntennaPrefixed);
        assert_eq!(reading.pc_hex(), "3000");
        assert_eq!(reading.checksum_hex(), "abcd");
    }

    #[test]
    fn test_decode_falls_back_to_bare_layout() {
        // PC(2) + EPC(4) + CRC(2): under skip-1 only 3 EPC bytes remain,
        // so the decoder must fall back to skip-0.
        let payload = [0x30, 0x00, 0xE2, 0x80, 0x11, 0xAA, 0xBB, 0xCC];
        let frame = frame_with_payload(0x00, 0x22, &payload);

        let reading = decode_frame(&frame).unwrap();
        assert_eq!(reading.epc().as_str(), "E28011AA");
        assert_eq!(reading.layout(), TagLayout::Bare);
        assert_eq!(reading.checksum_hex(), "bbcc");
    }

    #[test]
    fn test_decode_prefers_antenna_layout_when_both_fit() {
        // rest = 01 DE AD BE EF CA FE: skip-1 gives DE AD BE EF (4 bytes),
        // skip-0 gives 01 DE AD BE (also >= 4). Priority order must win.
        let payload = [0x30, 0x00, 0x01, 0xDE, 0xAD, 0xBE, 0xEF, 0xCA, 0xFE];
        let frame = frame_with_payload(0x02, 0x22, &payload);

        let reading = decode_frame(&frame).unwrap();
        assert_eq!(reading.epc().as_str(), "DEADBEEF");
        assert_eq!(reading.layout(), TagLayout::AntennaPrefixed);
    }

    #[test]
    fn test_decode_declared_length_overrun_is_invalid() {
        // Declared length 7, but only 6 payload bytes present.
        let frame = [
            0xBB, 0x00, 0x22, 0x00, 0x07, 0xE2, 0x80, 0x11, 0xAA, 0xBB, 0xCC, 0x7E,
        ];
        assert!(decode_frame(&frame).is_none());
    }

    #[test]
    fn test_decode_epc_too_short_under_both_layouts() {
        // PC(2) + 3 bytes + CRC(2): skip-0 leaves a 3-byte EPC, skip-1 a
        // 2-byte one. Invalid either way.
        let payload = [0x30, 0x00, 0x01, 0x02, 0x03, 0xBB, 0xCC];
        let frame = frame_with_payload(0x00, 0x22, &payload);
        assert!(decode_frame(&frame).is_none());
    }

    #[rstest]
    #[case::empty(&[])]
    #[case::markers_only(&[0xBB, 0x7E])]
    #[case::command_echo(&[0xBB, 0x00, 0x22, 0x00, 0x00, 0x22, 0x7E])]
    #[case::eight_bytes(&[0xBB, 0x00, 0x22, 0x00, 0x02, 0x01, 0x02, 0x7E])]
    fn test_decode_too_short(#[case] slice: &[u8]) {
        assert!(decode_frame(slice).is_none());
    }

    #[test]
    fn test_decode_wrong_markers() {
        let payload = [0x30, 0x00, 0xC8, 0xE2, 0x80, 0x11, 0xAA, 0xBB, 0xCC];
        let mut frame = frame_with_payload(0x02, 0x22, &payload);

        frame[0] = 0xAA;
        assert!(decode_frame(&frame).is_none());

        frame[0] = FRAME_START;
        let last = frame.len() - 1;
        frame[last] = 0x7F;
        assert!(decode_frame(&frame).is_none());
    }

    #[test]
    fn test_decode_empty_payload_is_invalid() {
        // Declared length 0 with valid markers: nothing to extract. The
        // frame is long enough structurally but has no payload fields.
        let frame = [0xBB, 0x01, 0x22, 0x00, 0x00, 0x00, 0x00, 0x00, 0x7E];
        assert!(decode_frame(&frame).is_none());
    }

    #[test]
    fn test_reading_equality_is_epc_only() {
        let payload_a = [0x30, 0x00, 0xC8, 0xE2, 0x80, 0x11, 0xAA, 0x01, 0x02];
        let payload_b = [0x11, 0x22, 0x55, 0xE2, 0x80, 0x11, 0xAA, 0x03, 0x04];

        let a = decode_frame(&frame_with_payload(0x02, 0x22, &payload_a)).unwrap();
        let b = decode_frame(&frame_with_payload(0x02, 0x22, &payload_b)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_decode_uppercases_epc() {
        let payload = [0x30, 0x00, 0xC8, 0xDE, 0xAD, 0xBE, 0xEF, 0x00, 0x00];
        let reading = decode_frame(&frame_with_payload(0x02, 0x22, &payload)).unwrap();
        assert_eq!(reading.epc().as_str(), "DEADBEEF");
        assert_eq!(reading.epc().as_str(), reading.epc().as_str().to_uppercase());
    }
}
