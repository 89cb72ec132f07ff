//! Property-based tests for the frame splitter and decoder.

use proptest::prelude::*;
use tagscan_protocol::{FrameSplitter, decode_frame};

const FRAME_START: u8 = 0xBB;
const FRAME_END: u8 = 0x7E;

proptest! {
    /// Every yielded slice starts with the start marker and ends with the
    /// end marker, for any input buffer.
    #[test]
    fn splitter_slices_are_marker_bounded(buf in proptest::collection::vec(any::<u8>(), 0..512)) {
        for slice in FrameSplitter::new(&buf) {
            prop_assert!(slice.len() >= 2);
            prop_assert_eq!(slice[0], FRAME_START);
            prop_assert_eq!(slice[slice.len() - 1], FRAME_END);
        }
    }

    /// Slices never overlap and appear in buffer order: each slice begins
    /// at or after the byte following the previous slice's end marker.
    #[test]
    fn splitter_slices_never_overlap(buf in proptest::collection::vec(any::<u8>(), 0..512)) {
        let mut previous_end: Option<usize> = None;
        let mut splitter = FrameSplitter::new(&buf);
        while let Some(slice) = splitter.next() {
            let start = slice.as_ptr() as usize - buf.as_ptr() as usize;
            let end = start + slice.len() - 1;
            if let Some(prev) = previous_end {
                prop_assert!(start > prev);
            }
            previous_end = Some(end);
        }
    }

    /// Splitting the same buffer twice yields the same sequence.
    #[test]
    fn splitter_is_restartable(buf in proptest::collection::vec(any::<u8>(), 0..256)) {
        let first: Vec<&[u8]> = FrameSplitter::new(&buf).collect();
        let second: Vec<&[u8]> = FrameSplitter::new(&buf).collect();
        prop_assert_eq!(first, second);
    }

    /// The remainder never contains a complete frame.
    #[test]
    fn splitter_remainder_holds_no_complete_frame(buf in proptest::collection::vec(any::<u8>(), 0..256)) {
        let mut splitter = FrameSplitter::new(&buf);
        while splitter.next().is_some() {}
        let tail = splitter.remainder();
        prop_assert!(FrameSplitter::new(tail).next().is_none());
    }

    /// The decoder never panics, whatever the slice contents.
    #[test]
    fn decoder_total_on_arbitrary_input(slice in proptest::collection::vec(any::<u8>(), 0..128)) {
        let _ = decode_frame(&slice);
    }

    /// A declared payload length greater than the available bytes is always
    /// invalid.
    #[test]
    fn decoder_rejects_overrunning_length(
        payload in proptest::collection::vec(any::<u8>(), 4..40),
        excess in 1u16..100,
    ) {
        let declared = payload.len() as u16 + excess;
        let mut frame = vec![FRAME_START, 0x00, 0x22, (declared >> 8) as u8, (declared & 0xFF) as u8];
        // Strip interior end markers so the whole buffer is one candidate slice.
        frame.extend(payload.iter().map(|&b| if b == FRAME_END { 0x00 } else { b }));
        frame.push(FRAME_END);
        prop_assert!(decode_frame(&frame).is_none());
    }

    /// Decoded EPCs are always uppercase hex of at least 8 digits.
    #[test]
    fn decoder_epcs_are_normalized(slice in proptest::collection::vec(any::<u8>(), 0..128)) {
        if let Some(reading) = decode_frame(&slice) {
            let epc = reading.epc().as_str();
            prop_assert!(epc.len() >= 8);
            prop_assert!(epc.len() % 2 == 0);
            prop_assert!(epc.bytes().all(|b| b.is_ascii_hexdigit()));
            prop_assert!(!epc.bytes().any(|b| b.is_ascii_lowercase()));
        }
    }
}
