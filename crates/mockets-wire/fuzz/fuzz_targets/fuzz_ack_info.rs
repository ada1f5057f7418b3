#![no_main]

use libfuzzer_sys::fuzz_target;
use mockets_wire::ack::AckInformation;
use mockets_wire::cursor::Reader;

/// Fuzz ACK information parsing with an arbitrary declared total.
///
/// The first two bytes pick the declared length; the rest is the field.
fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }
    let declared = u16::from_be_bytes([data[0], data[1]]) as usize;
    let reader = Reader::new(&data[2..]);
    if let Ok(info) = AckInformation::decode(&reader, 0, declared) {
        let consumed: usize = info.blocks.iter().map(|b| b.declared_len as usize).sum();
        assert_eq!(consumed, declared);
        assert!(consumed <= reader.len());
    }
});
