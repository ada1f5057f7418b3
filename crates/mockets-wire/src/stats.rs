//! # Decode Statistics
//!
//! Running counters over a stream of decode results, serializable for the
//! JSON summary printed by diagnostic tooling.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::datagram::{DecodedDatagram, DecodedPacket};
use crate::error::{DecodeError, ErrorKind};

// ─── Decode Stats ───────────────────────────────────────────────────────────

/// Aggregate decode statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DecodeStats {
    /// Datagrams handed to the decoder.
    pub datagrams: u64,
    /// Datagrams decoded as message packets.
    pub message_packets: u64,
    /// Datagrams decoded as stream packets.
    pub stream_packets: u64,
    /// Failed decodes by error kind.
    pub failures: BTreeMap<ErrorKind, u64>,
    /// Chunks across all decoded message packets.
    pub chunks: u64,
    /// Chunks with an unrecognized type code.
    pub unknown_chunks: u64,
    /// Chunk count per type name.
    pub chunks_by_type: BTreeMap<String, u64>,
    /// Bytes of every datagram seen, decoded or not.
    pub bytes: u64,
}

impl DecodeStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Account for one decode attempt over a datagram of `wire_len` bytes.
    pub fn record(&mut self, wire_len: usize, result: &Result<DecodedDatagram, DecodeError>) {
        self.datagrams += 1;
        self.bytes += wire_len as u64;
        match result {
            Ok(decoded) => self.record_packet(&decoded.packet),
            Err(e) => *self.failures.entry(e.kind()).or_default() += 1,
        }
    }

    fn record_packet(&mut self, packet: &DecodedPacket) {
        match packet {
            DecodedPacket::Message(msg) => {
                self.message_packets += 1;
                for chunk in &msg.chunks {
                    self.chunks += 1;
                    if chunk.is_unknown() {
                        self.unknown_chunks += 1;
                    }
                    *self
                        .chunks_by_type
                        .entry(chunk.name().to_string())
                        .or_default() += 1;
                }
            }
            DecodedPacket::Stream(_) => self.stream_packets += 1,
        }
    }

    pub fn decoded(&self) -> u64 {
        self.message_packets + self.stream_packets
    }

    pub fn failed(&self) -> u64 {
        self.failures.values().sum()
    }

    /// Fraction of datagrams that failed to decode.
    pub fn failure_rate(&self) -> f64 {
        if self.datagrams == 0 {
            0.0
        } else {
            self.failed() as f64 / self.datagrams as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datagram::{decode_datagram, CapturedDatagram, Protocol};
    use bytes::Bytes;

    fn run(stats: &mut DecodeStats, payload: &[u8], protocol: Protocol) {
        let d = CapturedDatagram {
            timestamp_us: 0,
            source: "127.0.0.1:1".parse().unwrap(),
            destination: "127.0.0.1:2".parse().unwrap(),
            payload: Bytes::copy_from_slice(payload),
        };
        stats.record(d.payload.len(), &decode_datagram(&d, protocol));
    }

    #[test]
    fn failure_rate_zero_div() {
        assert_eq!(DecodeStats::new().failure_rate(), 0.0);
    }

    #[test]
    fn counts_chunks_by_name() {
        let mut stats = DecodeStats::new();
        let mut buf = vec![0x10, 0x00, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];
        buf.extend_from_slice(&[0x40, 0x05, 0x00, 0x04]);
        buf.extend_from_slice(&[0x40, 0x05, 0x00, 0x04]);
        buf.extend_from_slice(&[0x7A, 0xBC, 0x00, 0x05, 0xFF]);
        run(&mut stats, &buf, Protocol::Message);

        assert_eq!(stats.datagrams, 1);
        assert_eq!(stats.message_packets, 1);
        assert_eq!(stats.chunks, 3);
        assert_eq!(stats.unknown_chunks, 1);
        assert_eq!(stats.chunks_by_type["Shutdown"], 2);
        assert_eq!(stats.chunks_by_type["Unknown"], 1);
        assert_eq!(stats.bytes, buf.len() as u64);
    }

    #[test]
    fn failures_by_kind() {
        let mut stats = DecodeStats::new();
        run(&mut stats, &[0x10], Protocol::Message);
        let mut zero_len = vec![0x10, 0x00, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];
        zero_len.extend_from_slice(&[0x40, 0x08, 0x00, 0x00]);
        run(&mut stats, &zero_len, Protocol::Message);
        run(&mut stats, &[0u8; 16], Protocol::Stream);
        run(&mut stats, &[0u8; 16], Protocol::Stream);

        assert_eq!(stats.failures[&ErrorKind::TruncatedBuffer], 1);
        assert_eq!(stats.failures[&ErrorKind::InvalidLength], 1);
        assert_eq!(stats.stream_packets, 2);
        assert_eq!(stats.decoded(), 2);
        assert!((stats.failure_rate() - 0.5).abs() < 0.001);
    }

    #[test]
    fn serializes_to_json() {
        let mut stats = DecodeStats::new();
        run(&mut stats, &[0x10], Protocol::Message);
        let json = serde_json::to_string(&stats).unwrap();
        assert!(json.contains("\"datagrams\":1"));
        assert!(json.contains("\"TruncatedBuffer\":1"));
    }
}
