//! # Decode scenarios
//!
//! End-to-end decodes of hand-assembled datagrams through the public entry
//! points, covering the reference packets and the malformed-input guarantees
//! (bounded progress, short headers, empty ACK information).

use mockets_wire::ack::{AckBlockFlags, AckEntries, TsnRange};
use mockets_wire::chunk::{ChunkBody, ChunkType};
use mockets_wire::error::{ErrorKind, Record};
use mockets_wire::message::{MessageFlags, MessagePacket};
use mockets_wire::prereq::PrerequisiteFlags;
use mockets_wire::stream::{StreamFlags, StreamPacket};
use mockets_wire::DecodeError;

// ─── Helpers ────────────────────────────────────────────────────────────────

const PLAIN_HEADER: [u8; 12] = [
    0x10, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x05,
];

fn message(chunks: &[&[u8]]) -> Vec<u8> {
    let mut buf = PLAIN_HEADER.to_vec();
    for c in chunks {
        buf.extend_from_slice(c);
    }
    buf
}

/// A SAck chunk with zero cumulative acks followed by `ack_info`.
fn sack(ack_info: &[u8]) -> Vec<u8> {
    let mut buf = vec![0x10, 0x01];
    buf.extend_from_slice(&((4 + 12 + ack_info.len()) as u16).to_be_bytes());
    buf.extend_from_slice(&[0; 12]);
    buf.extend_from_slice(ack_info);
    buf
}

fn only_ack_entries(pkt: &MessagePacket) -> Vec<AckEntries> {
    pkt.chunks[0]
        .ack_info()
        .expect("sack carries ack info")
        .blocks
        .iter()
        .map(|b| b.entries.clone())
        .collect()
}

// ─── Reference Packets ──────────────────────────────────────────────────────

#[test]
fn plain_header_with_abort() {
    let buf = message(&[&[0x40, 0x08, 0x00, 0x04]]);
    let pkt = MessagePacket::decode(&buf).unwrap();

    assert_eq!(pkt.header.version, 1);
    assert!(pkt.header.flags.is_empty());
    assert_eq!(pkt.header.window_len, 0);
    assert_eq!(pkt.header.validation, 1);
    assert_eq!(pkt.header.sequence_num, 5);
    assert!(pkt.prerequisites.is_none());
    assert_eq!(pkt.chunks.len(), 1);
    assert_eq!(pkt.chunks[0].kind(), Some(ChunkType::Abort));
    assert_eq!(pkt.chunks[0].body, ChunkBody::Abort);
    assert_eq!(pkt.wire_len, 16);
}

#[test]
fn delivery_prerequisites_consume_five_bytes() {
    let mut buf = PLAIN_HEADER.to_vec();
    buf[1] = 0x10;
    buf.extend_from_slice(&[0x01, 0x00, 0x00, 0x00, 0x2A]);
    // The chunk list starts right after the 5 prerequisite bytes.
    buf.extend_from_slice(&[0x40, 0x05, 0x00, 0x04]);

    let pkt = MessagePacket::decode(&buf).unwrap();
    assert!(pkt.header.flags.contains(MessageFlags::DELIVERY_PREREQUISITES));
    let prereq = pkt.prerequisites.as_ref().unwrap();
    assert_eq!(prereq.flags, PrerequisiteFlags::RELIABLE_SEQUENCED);
    assert_eq!(prereq.reliable_sequenced_tsn, Some(42));
    assert_eq!(prereq.unreliable_sequenced_tsn, None);
    assert_eq!(prereq.control_tsn, None);
    assert_eq!(pkt.chunk_names().collect::<Vec<_>>(), ["Shutdown"]);
}

#[test]
fn singles_ack_block() {
    let buf = message(&[&sack(&[0x20, 0x00, 0x07, 0x00, 0x00, 0x00, 0x03])]);
    let pkt = MessagePacket::decode(&buf).unwrap();
    let block = &pkt.chunks[0].ack_info().unwrap().blocks[0];
    assert_eq!(block.flags, AckBlockFlags::TYPE_SINGLES);
    assert_eq!(block.declared_len, 7);
    assert_eq!(only_ack_entries(&pkt), [AckEntries::Singles(vec![3])]);
}

#[test]
fn ranges_ack_block() {
    let buf = message(&[&sack(&[
        0x10, 0x00, 0x0B, 0x00, 0x00, 0x00, 0x05, 0x00, 0x00, 0x00, 0x0A,
    ])]);
    let pkt = MessagePacket::decode(&buf).unwrap();
    assert_eq!(
        only_ack_entries(&pkt),
        [AckEntries::Ranges(vec![TsnRange { start: 5, end: 10 }])]
    );
}

#[test]
fn stream_syn_fin() {
    let buf = [
        0x00, 0x05, 0x01, 0x02, 0x00, 0x00, 0x00, 0x0A, 0x00, 0x00, 0x00, 0x0B, 0x01, 0x00, 0x00,
        0x00,
    ];
    let pkt = StreamPacket::decode(&buf).unwrap();
    let h = &pkt.header;
    assert_eq!(h.flags, StreamFlags::SYN | StreamFlags::FIN);
    let names: Vec<_> = h.flags.iter_names().map(|(n, _)| n).collect();
    assert_eq!(names, ["SYN", "FIN"]);
    assert_eq!(h.control_seq, 1);
    assert_eq!(h.control_ack, 2);
    assert_eq!(h.sequence_num, 10);
    assert_eq!(h.ack_num, 11);
    assert_eq!(h.window_len, 256);
    assert_eq!(h.payload_len, 0);
}

// ─── Handshake ──────────────────────────────────────────────────────────────

#[test]
fn four_way_handshake_chunks() {
    let init_params: Vec<u8> = [0xAAAA_0001u32, 100, 200, 300, 7]
        .iter()
        .flat_map(|v| v.to_be_bytes())
        .collect();
    let mut cookie = Vec::new();
    cookie.extend_from_slice(&1_700_000_000_000u64.to_be_bytes());
    cookie.extend_from_slice(&30_000u64.to_be_bytes());
    cookie.extend_from_slice(&[0u8; 48]);
    cookie.extend_from_slice(&5000u16.to_be_bytes());
    cookie.extend_from_slice(&5001u16.to_be_bytes());

    let mut init = vec![0x40, 0x01, 0x00, 24];
    init.extend_from_slice(&init_params);
    let mut init_ack = vec![0x40, 0x02, 0x00, 92];
    init_ack.extend_from_slice(&init_params);
    init_ack.extend_from_slice(&cookie);
    let mut echo = vec![0x40, 0x03, 0x00, 72];
    echo.extend_from_slice(&cookie);
    let cookie_ack = [0x40, 0x04, 0x00, 0x06, 0x13, 0x88];

    let buf = message(&[&init, &init_ack, &echo, &cookie_ack]);
    let pkt = MessagePacket::decode(&buf).unwrap();
    let kinds: Vec<_> = pkt.chunk_types().collect();
    assert_eq!(
        kinds,
        [
            ChunkType::Init,
            ChunkType::InitAck,
            ChunkType::CookieEcho,
            ChunkType::CookieAck
        ]
    );
    match (&pkt.chunks[1].body, &pkt.chunks[2].body) {
        (
            ChunkBody::InitAck { params, cookie: a },
            ChunkBody::CookieEcho {
                cookie: b,
                public_key: None,
            },
        ) => {
            assert_eq!(params.validation, 0xAAAA_0001);
            assert_eq!(params.association_id, 7);
            assert_eq!(a, b);
            assert_eq!(a.lifespan, 30_000);
            assert_eq!((a.port_a, a.port_z), (5000, 5001));
        }
        other => panic!("unexpected bodies {other:?}"),
    }
    assert_eq!(pkt.chunks[3].body, ChunkBody::CookieAck { port: 5000 });
}

#[test]
fn unknown_chunk_does_not_stop_decoding() {
    let buf = message(&[
        &[0x40, 0x13, 0x00, 0x06, 0xDE, 0xAD],
        &[0x20, 0x01, 0x00, 0x07, 0x00, 0x01, 0x5A],
    ]);
    let pkt = MessagePacket::decode(&buf).unwrap();
    assert!(pkt.chunks[0].is_unknown());
    assert_eq!(pkt.chunks[0].chunk_type, 0x4013);
    assert_eq!(pkt.data_chunk(), Some((1, &[0x5A][..])));
}

#[test]
fn simple_connect_then_suspend_exchange() {
    let params: Vec<u8> = [0xBEEF_0001u32, 1, 2, 3, 4, 5]
        .iter()
        .flat_map(|v| v.to_be_bytes())
        .collect();
    let mut connect = vec![0x40, 0x11, 0x00, 28];
    connect.extend_from_slice(&params);
    let mut connect_ack = vec![0x40, 0x12, 0x00, 98];
    connect_ack.extend_from_slice(&params);
    connect_ack.extend_from_slice(&6000u16.to_be_bytes());
    connect_ack.extend_from_slice(&[0u8; 68]);
    let suspend = [0x40, 0x09, 0x00, 0x07, 0x01, 0x02, 0x03];
    let resume_ack = [0x40, 0x0C, 0x00, 0x04];

    let buf = message(&[&connect, &connect_ack, &suspend, &resume_ack]);
    let pkt = MessagePacket::decode(&buf).unwrap();
    let names: Vec<_> = pkt.chunk_names().collect();
    assert_eq!(
        names,
        ["SimpleConnect", "SimpleConnectAck", "Suspend", "ResumeAck"]
    );
    assert!(pkt.chunks.iter().all(|c| !c.is_unknown()));
    match &pkt.chunks[1].body {
        ChunkBody::SimpleConnectAck { params, port, .. } => {
            assert_eq!(params.validation, 0xBEEF_0001);
            assert_eq!(params.unreliable_unsequenced_id, Some(5));
            assert_eq!(*port, 6000);
        }
        other => panic!("unexpected body {other:?}"),
    }
    assert_eq!(
        pkt.chunks[2].body,
        ChunkBody::Suspend {
            key: bytes::Bytes::from_static(&[1, 2, 3])
        }
    );
}

// ─── Malformed Input ────────────────────────────────────────────────────────

#[test]
fn zero_length_chunk_is_invalid_length() {
    let buf = message(&[&[0x10, 0x02, 0x00, 0x00]]);
    let err = MessagePacket::decode(&buf).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidLength);
    assert_eq!(err.offset(), 12);
}

#[test]
fn every_declared_length_below_header_is_rejected() {
    for declared in 0u8..4 {
        let buf = message(&[&[0x77, 0x77, 0x00, declared]]);
        let err = MessagePacket::decode(&buf).unwrap_err();
        assert!(
            matches!(
                err,
                DecodeError::InvalidLength {
                    record: Record::Chunk,
                    ..
                }
            ),
            "declared {declared}: {err}"
        );
    }
}

#[test]
fn short_message_header_is_truncated() {
    for len in 0..12 {
        let err = MessagePacket::decode(&PLAIN_HEADER[..len]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TruncatedBuffer, "len {len}");
    }
}

#[test]
fn short_stream_header_is_truncated() {
    let buf = [0u8; 16];
    for len in 0..16 {
        let err = StreamPacket::decode(&buf[..len]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TruncatedBuffer, "len {len}");
    }
}

#[test]
fn empty_ack_information() {
    let buf = message(&[&sack(&[])]);
    let pkt = MessagePacket::decode(&buf).unwrap();
    assert!(pkt.chunks[0].ack_info().unwrap().is_empty());
}

#[test]
fn ack_block_overrunning_its_chunk_is_rejected() {
    // Block claims 11 bytes but the chunk only leaves 7 for ack information.
    let buf = message(&[&sack(&[0x20, 0x00, 0x0B, 0x00, 0x00, 0x00, 0x03])]);
    let err = MessagePacket::decode(&buf).unwrap_err();
    assert!(matches!(
        err,
        DecodeError::InvalidLength {
            record: Record::AckInfoBlock,
            offset: 28,
            ..
        }
    ));
}

#[test]
fn truncated_prerequisites_fail_the_packet() {
    let mut buf = PLAIN_HEADER.to_vec();
    buf[1] = 0x10;
    buf.extend_from_slice(&[0x07, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00]);
    let err = MessagePacket::decode(&buf).unwrap_err();
    assert_eq!(
        err,
        DecodeError::TruncatedBuffer {
            offset: 17,
            needed: 4,
            available: 2
        }
    );
}

#[test]
fn error_message_names_offset_and_lengths() {
    let buf = message(&[&[0x20, 0x01, 0x00, 0x40, 0x00, 0x00]]);
    let err = MessagePacket::decode(&buf).unwrap_err();
    assert_eq!(
        err.to_string(),
        "truncated buffer at offset 12: need 64 bytes, 6 available"
    );
}

#[test]
fn decoding_is_deterministic() {
    let buf = message(&[
        &sack(&[0x21, 0x00, 0x0B, 0, 0, 0, 9, 0, 0, 0, 4]),
        &[0x10, 0x04, 0x00, 0x0C, 0, 0, 0, 0, 0, 0, 0x30, 0x39],
        &[0x40, 0x07, 0x00, 0x04],
    ]);
    let a = MessagePacket::decode(&buf).unwrap();
    let b = MessagePacket::decode(&buf).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.chunks[1].body, ChunkBody::Timestamp { timestamp: 12345 });
}
