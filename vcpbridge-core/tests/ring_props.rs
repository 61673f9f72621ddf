//! Property tests for the receive ring

use proptest::prelude::*;
use vcpbridge_core::ByteRing;

const SLOTS: usize = 32;

proptest! {
    #[test]
    fn delivers_everything_that_fits(data in prop::collection::vec(any::<u8>(), 0..SLOTS)) {
        let mut ring = ByteRing::<SLOTS>::new();
        let (mut writer, mut reader) = ring.split();

        for &b in &data {
            prop_assert!(writer.push(b));
        }

        let mut out = Vec::new();
        while let Some(b) = reader.pop() {
            out.push(b);
        }
        prop_assert_eq!(out, data);
        prop_assert_eq!(reader.take_dropped(), 0);
    }

    #[test]
    fn overflow_keeps_prefix(data in prop::collection::vec(any::<u8>(), SLOTS..4 * SLOTS)) {
        let mut ring = ByteRing::<SLOTS>::new();
        let (mut writer, mut reader) = ring.split();
        let capacity = ByteRing::<SLOTS>::capacity();

        let accepted = writer.push_slice(&data);
        prop_assert_eq!(accepted, capacity);

        let mut out = [0u8; SLOTS];
        let n = reader.pop_into(&mut out);
        prop_assert_eq!(&out[..n], &data[..capacity]);
        prop_assert_eq!(reader.take_dropped() as usize, data.len() - capacity);
    }

    #[test]
    fn interleaved_push_pop_keeps_order(
        chunks in prop::collection::vec(prop::collection::vec(any::<u8>(), 1..SLOTS), 1..16)
    ) {
        let mut ring = ByteRing::<SLOTS>::new();
        let (mut writer, mut reader) = ring.split();
        let mut sent = Vec::new();
        let mut out = Vec::new();

        for chunk in &chunks {
            let accepted = writer.push_slice(chunk);
            sent.extend_from_slice(&chunk[..accepted]);
            while let Some(b) = reader.pop() {
                out.push(b);
            }
        }
        prop_assert_eq!(out, sent);
    }
}
