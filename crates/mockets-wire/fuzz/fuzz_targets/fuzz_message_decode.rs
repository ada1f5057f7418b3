#![no_main]

use libfuzzer_sys::fuzz_target;
use mockets_wire::message::MessagePacket;

/// Fuzz the message-packet decoder.
///
/// Any input must either decode or fail with an offset inside the buffer.
/// A successful decode must tile the chunk list exactly and decode the same
/// way a second time.
fuzz_target!(|data: &[u8]| {
    match MessagePacket::decode(data) {
        Ok(pkt) => {
            assert_eq!(pkt.wire_len, data.len());
            let chunks: usize = pkt.chunks.iter().map(|c| c.declared_len as usize).sum();
            assert!(chunks <= data.len());
            assert!(pkt.chunks.iter().all(|c| c.declared_len >= 4));
            assert_eq!(MessagePacket::decode(data).as_ref(), Ok(&pkt));
        }
        Err(err) => assert!(err.offset() <= data.len()),
    }
});
