//! Decode latency benchmarks for mockets-wire.
//!
//! Measures the per-datagram cost of the two top-level decoders on
//! representative traffic:
//! - Data packet (header + one data chunk, various payload sizes)
//! - SAck packet with several ACK info blocks
//! - Handshake packet carrying an InitAck with state cookie
//! - Stream packet
//!
//! Run with: cargo bench --package mockets-wire

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};

use mockets_wire::message::MessagePacket;
use mockets_wire::stream::StreamPacket;

const HEADER: [u8; 12] = [
    0x10, 0x03, 0x10, 0x00, 0xCA, 0xFE, 0xBA, 0xBE, 0x00, 0x00, 0x01, 0x00,
];

fn data_packet(payload_len: usize) -> Vec<u8> {
    let mut buf = HEADER.to_vec();
    buf.extend_from_slice(&[0x20, 0x01]);
    buf.extend_from_slice(&((6 + payload_len) as u16).to_be_bytes());
    buf.extend_from_slice(&[0x00, 0x01]);
    buf.resize(buf.len() + payload_len, 0xA5);
    buf
}

fn sack_packet(blocks: usize) -> Vec<u8> {
    let mut ack_info = Vec::new();
    for i in 0..blocks as u32 {
        ack_info.extend_from_slice(&[0x12, 0x00, 0x13]);
        for tsn in [i * 10, i * 10 + 3, i * 10 + 5, i * 10 + 8] {
            ack_info.extend_from_slice(&tsn.to_be_bytes());
        }
    }
    let mut buf = HEADER.to_vec();
    buf.extend_from_slice(&[0x10, 0x01]);
    buf.extend_from_slice(&((16 + ack_info.len()) as u16).to_be_bytes());
    buf.extend_from_slice(&[0; 12]);
    buf.extend_from_slice(&ack_info);
    buf
}

fn init_ack_packet() -> Vec<u8> {
    let mut buf = HEADER.to_vec();
    buf.extend_from_slice(&[0x40, 0x02, 0x00, 92]);
    buf.resize(buf.len() + 88, 0x11);
    buf
}

fn bench_message_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("message_decode");

    for size in [64usize, 512, 1400] {
        let pkt = data_packet(size);
        group.throughput(Throughput::Bytes(pkt.len() as u64));
        group.bench_function(format!("data_{size}"), |b| {
            b.iter(|| black_box(MessagePacket::decode(black_box(&pkt))));
        });
    }

    let pkt = sack_packet(8);
    group.throughput(Throughput::Bytes(pkt.len() as u64));
    group.bench_function("sack_8_blocks", |b| {
        b.iter(|| black_box(MessagePacket::decode(black_box(&pkt))));
    });

    let pkt = init_ack_packet();
    group.throughput(Throughput::Bytes(pkt.len() as u64));
    group.bench_function("init_ack", |b| {
        b.iter(|| black_box(MessagePacket::decode(black_box(&pkt))));
    });

    group.finish();
}

fn bench_stream_decode(c: &mut Criterion) {
    let mut pkt = vec![0x00, 0x05, 0x01, 0x02, 0, 0, 0, 9, 0, 0, 0, 8, 0x10, 0x00, 0x04, 0x00];
    pkt.resize(16 + 1024, 0x5A);
    c.bench_function("stream_decode_1k", |b| {
        b.iter(|| black_box(StreamPacket::decode(black_box(&pkt))));
    });
}

criterion_group!(benches, bench_message_decode, bench_stream_decode);
criterion_main!(benches);
