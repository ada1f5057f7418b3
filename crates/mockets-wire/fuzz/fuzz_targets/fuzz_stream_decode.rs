#![no_main]

use libfuzzer_sys::fuzz_target;
use mockets_wire::stream::{StreamPacket, STREAM_HEADER_SIZE};

/// Fuzz the stream-packet decoder: only short buffers may fail.
fuzz_target!(|data: &[u8]| {
    match StreamPacket::decode(data) {
        Ok(pkt) => {
            assert!(data.len() >= STREAM_HEADER_SIZE);
            assert_eq!(&pkt.payload[..], &data[STREAM_HEADER_SIZE..]);
        }
        Err(_) => assert!(data.len() < STREAM_HEADER_SIZE),
    }
});
