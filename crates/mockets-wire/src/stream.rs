//! # Stream Packets
//!
//! Decoder for the stream-oriented format: a fixed 16-byte header with no
//! nested records.
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |          Flags (16)           |  Ctrl Seq (8) |  Ctrl Ack (8) |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                      Sequence Number (32)                      |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                        Ack Number (32)                         |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |       Window Length (16)      |      Payload Length (16)       |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```

use bytes::Bytes;
use serde::Serialize;

use crate::cursor::Reader;
use crate::error::DecodeError;

pub const STREAM_HEADER_SIZE: usize = 16;

bitflags::bitflags! {
    /// Connection-control flags of a stream packet.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
    pub struct StreamFlags: u16 {
        const SYN = 0x01;
        const SYN_ACK = 0x02;
        const FIN = 0x04;
        const FIN_ACK = 0x08;
        const SUSPEND = 0x10;
        const SUSPEND_ACK = 0x20;
        const RESUME = 0x40;
        const RESUME_ACK = 0x80;

        const _ = !0;
    }
}

/// Decoded stream packet header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamPacketHeader {
    pub flags: StreamFlags,
    pub control_seq: u8,
    pub control_ack: u8,
    pub sequence_num: u32,
    pub ack_num: u32,
    pub window_len: u16,
    pub payload_len: u16,
}

impl StreamPacketHeader {
    pub fn decode(reader: &Reader<'_>) -> Result<Self, DecodeError> {
        let r = reader.sub(0, STREAM_HEADER_SIZE)?;
        Ok(StreamPacketHeader {
            flags: StreamFlags::from_bits_retain(r.u16_at(0)?),
            control_seq: r.u8_at(2)?,
            control_ack: r.u8_at(3)?,
            sequence_num: r.u32_at(4)?,
            ack_num: r.u32_at(8)?,
            window_len: r.u16_at(12)?,
            payload_len: r.u16_at(14)?,
        })
    }
}

/// A decoded stream packet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamPacket {
    pub header: StreamPacketHeader,
    /// Every byte after the header.
    pub payload: Bytes,
    pub wire_len: usize,
}

impl StreamPacket {
    pub fn decode(buf: &[u8]) -> Result<Self, DecodeError> {
        let reader = Reader::new(buf);
        let header = StreamPacketHeader::decode(&reader)?;
        let payload = reader.tail(STREAM_HEADER_SIZE)?;
        if payload.len() != header.payload_len as usize {
            tracing::debug!(
                declared = header.payload_len,
                actual = payload.len(),
                "stream payload length mismatch"
            );
        }
        Ok(StreamPacket {
            header,
            payload: Bytes::copy_from_slice(payload),
            wire_len: buf.len(),
        })
    }
}
