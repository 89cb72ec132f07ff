//! Command frame construction and control-reply parsing.
//!
//! Commands sent to the reader use the same framing as inbound data but
//! carry a single-byte additive checksum over `addr | cmd | len | payload`:
//!
//! ```text
//! 0xBB | addr | cmd | lenH lenL | payload ... | sum & 0xFF | 0x7E
//! ```
//!
//! Only the inventory poll is issued by the scan pipeline; the transmit
//! power helpers exist for bench/setup tooling against the same frame
//! format.

use tagscan_core::constants::{
    CMD_GET_POWER, CMD_SET_POWER, FRAME_END, FRAME_START, POLL_COMMAND, READER_ADDRESS,
};

/// Build a command frame for the reader.
///
/// # Examples
///
/// ```
/// use tagscan_protocol::build_command;
/// use tagscan_core::constants::{CMD_INVENTORY, POLL_COMMAND, READER_ADDRESS};
///
/// let cmd = build_command(READER_ADDRESS, CMD_INVENTORY, &[]);
/// assert_eq!(cmd, POLL_COMMAND);
/// ```
pub fn build_command(addr: u8, code: u8, payload: &[u8]) -> Vec<u8> {
    let len = payload.len() as u16;
    let mut frame = Vec::with_capacity(payload.len() + 7);
    frame.push(FRAME_START);
    frame.push(addr);
    frame.push(code);
    frame.push((len >> 8) as u8);
    frame.push((len & 0xFF) as u8);
    frame.extend_from_slice(payload);
    frame.push(additive_checksum(&frame[1..]));
    frame.push(FRAME_END);
    frame
}

/// 8-bit additive checksum over the covered bytes.
fn additive_checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0u8, |acc, &b| acc.wrapping_add(b))
}

/// Build the set-transmit-power command for a dBm value.
///
/// The reader encodes power as a big-endian u16 of dBm × 100.
pub fn set_power_command(dbm: f32) -> Vec<u8> {
    let centi = (dbm * 100.0).round() as u16;
    build_command(READER_ADDRESS, CMD_SET_POWER, &centi.to_be_bytes())
}

/// A structurally parsed control reply.
///
/// Control replies (power, settings) carry a short status or value payload;
/// tag reports go through [`decode_frame`](crate::decode_frame) instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply<'a> {
    /// Responding device address byte.
    pub addr: u8,
    /// Echoed command code.
    pub code: u8,
    /// Reply payload, exactly as declared by the length field.
    pub data: &'a [u8],
}

/// Parse a control reply frame.
///
/// Returns `None` when markers are missing or the declared payload length
/// overruns the frame. The reply checksum is not verified; the original
/// firmware tooling never checks it and some modules respond with either
/// checksum convention.
pub fn parse_reply(frame: &[u8]) -> Option<Reply<'_>> {
    if frame.len() < 7 {
        return None;
    }
    if frame[0] != FRAME_START || frame[frame.len() - 1] != FRAME_END {
        return None;
    }
    let declared = u16::from_be_bytes([frame[3], frame[4]]) as usize;
    let body = &frame[5..frame.len() - 1];
    if body.len() < declared {
        return None;
    }
    Some(Reply {
        addr: frame[1],
        code: frame[2],
        data: &body[..declared],
    })
}

/// Extract the transmit power in dBm from a get-power reply.
pub fn power_reply_dbm(frame: &[u8]) -> Option<f32> {
    let reply = parse_reply(frame)?;
    if reply.code != CMD_GET_POWER || reply.data.len() != 2 {
        return None;
    }
    let centi = u16::from_be_bytes([reply.data[0], reply.data[1]]);
    Some(centi as f32 / 100.0)
}

/// Assemble a tag report frame as the reader would emit it.
///
/// Used by the simulated transport and by tests; `crc` stands in for the
/// air-interface tag CRC, which the decoder preserves but never verifies.
pub fn tag_report_frame(antenna: u8, pc: &[u8; 2], epc: &[u8], crc: &[u8; 2]) -> Vec<u8> {
    let len = (pc.len() + 1 + epc.len() + crc.len()) as u16;
    let mut frame = Vec::with_capacity(epc.len() + 12);
    frame.push(FRAME_START);
    frame.push(0x02);
    frame.push(tagscan_core::constants::CMD_INVENTORY);
    frame.push((len >> 8) as u8);
    frame.push((len & 0xFF) as u8);
    frame.extend_from_slice(pc);
    frame.push(antenna);
    frame.extend_from_slice(epc);
    frame.extend_from_slice(crc);
    frame.push(FRAME_END);
    frame
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode_frame;
    use tagscan_core::constants::CMD_INVENTORY;

    #[test]
    fn test_inventory_command_matches_wire_bytes() {
        let cmd = build_command(READER_ADDRESS, CMD_INVENTORY, &[]);
        assert_eq!(cmd, [0xBB, 0x00, 0x22, 0x00, 0x00, 0x22, 0x7E]);
        assert_eq!(cmd, POLL_COMMAND);
    }

    #[test]
    fn test_get_power_command() {
        let cmd = build_command(READER_ADDRESS, CMD_GET_POWER, &[]);
        assert_eq!(cmd, [0xBB, 0x00, 0xB7, 0x00, 0x00, 0xB7, 0x7E]);
    }

    #[test]
    fn test_set_power_command_26_dbm() {
        // 26.00 dBm → 2600 = 0x0A28
        let cmd = set_power_command(26.0);
        assert_eq!(cmd[..7], [0xBB, 0x00, 0xB6, 0x00, 0x02, 0x0A, 0x28]);
        assert_eq!(*cmd.last().unwrap(), FRAME_END);
    }

    #[test]
    fn test_set_power_command_20_dbm_checksum() {
        // 2000 = 0x07D0; checksum of 00 B6 00 02 07 D0 is 0x8F.
        let cmd = set_power_command(20.0);
        assert_eq!(cmd, [0xBB, 0x00, 0xB6, 0x00, 0x02, 0x07, 0xD0, 0x8F, 0x7E]);
    }

    #[test]
    fn test_command_with_payload_checksum() {
        let cmd = build_command(READER_ADDRESS, 0x03, &[0x01]);
        assert_eq!(cmd, [0xBB, 0x00, 0x03, 0x00, 0x01, 0x01, 0x05, 0x7E]);
    }

    #[test]
    fn test_parse_reply_power() {
        // Get-power reply: 2600 = 0x0A28 → 26.00 dBm
        let frame = [0xBB, 0x01, 0xB7, 0x00, 0x02, 0x0A, 0x28, 0xEC, 0x7E];
        let reply = parse_reply(&frame).unwrap();
        assert_eq!(reply.code, CMD_GET_POWER);
        assert_eq!(reply.data, &[0x0A, 0x28]);
        assert_eq!(power_reply_dbm(&frame), Some(26.0));
    }

    #[test]
    fn test_power_reply_wrong_command() {
        let frame = [0xBB, 0x01, 0xB6, 0x00, 0x02, 0x0A, 0x28, 0xEB, 0x7E];
        assert_eq!(power_reply_dbm(&frame), None);
    }

    #[test]
    fn test_parse_reply_rejects_truncated() {
        assert!(parse_reply(&[0xBB, 0x01, 0xB7, 0x00]).is_none());
        // Declared length 4 but only 2 payload bytes present.
        let frame = [0xBB, 0x01, 0xB7, 0x00, 0x04, 0x0A, 0x28, 0x00, 0x7E];
        assert!(parse_reply(&frame).is_none());
    }

    #[test]
    fn test_tag_report_frame_round_trips_through_decoder() {
        let epc = [0xE2, 0x00, 0x68, 0x16, 0x00, 0x00, 0x00, 0x60, 0x12, 0x34, 0x56, 0x78];
        let frame = tag_report_frame(0xC8, &[0x30, 0x00], &epc, &[0xAB, 0xCD]);

        let reading = decode_frame(&frame).unwrap();
        assert_eq!(reading.epc().as_str(), "E20068160000006012345678");
    }
}
