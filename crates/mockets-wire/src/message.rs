//! # Message Packets
//!
//! Top-level decoder for the message-oriented Mockets format.
//!
//! ## Header (12 bytes)
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |  Ver  |       Flags (12)      |        Window Length (16)      |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                        Validation (32)                         |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                      Sequence Number (32)                      |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! followed by the optional [delivery prerequisites](crate::prereq) and then
//! chunks until the end of the datagram.

use serde::Serialize;

use crate::chunk::{Chunk, ChunkBody, ChunkType};
use crate::cursor::Reader;
use crate::error::DecodeError;
use crate::prereq::DeliveryPrerequisites;

/// Fixed header size.
pub const MESSAGE_HEADER_SIZE: usize = 12;

bitflags::bitflags! {
    /// The 12 flag bits of the message header.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
    pub struct MessageFlags: u16 {
        const RELIABLE = 0x001;
        const SEQUENCED = 0x002;
        const MESSAGE_PACKET = 0x004;
        const CONTROL = 0x008;
        const DELIVERY_PREREQUISITES = 0x010;
        const FIRST_FRAGMENT = 0x020;
        const LAST_FRAGMENT = 0x040;
        const MORE_FRAGMENTS = 0x080;
        /// Informational only.
        const RETRANSMITTED = 0x100;

        const _ = 0x0FFF;
    }
}

/// Decoded message packet header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessagePacketHeader {
    /// Protocol version (top 4 bits).
    pub version: u8,
    pub flags: MessageFlags,
    pub window_len: u16,
    pub validation: u32,
    pub sequence_num: u32,
}

impl MessagePacketHeader {
    pub fn decode(reader: &Reader<'_>) -> Result<Self, DecodeError> {
        let r = reader.sub(0, MESSAGE_HEADER_SIZE)?;
        let first = r.u16_at(0)?;
        Ok(MessagePacketHeader {
            version: (first >> 12) as u8,
            flags: MessageFlags::from_bits_retain(first & 0x0FFF),
            window_len: r.u16_at(2)?,
            validation: r.u32_at(4)?,
            sequence_num: r.u32_at(8)?,
        })
    }

    pub fn is_reliable(&self) -> bool {
        self.flags.contains(MessageFlags::RELIABLE)
    }

    pub fn is_sequenced(&self) -> bool {
        self.flags.contains(MessageFlags::SEQUENCED)
    }

    pub fn is_control(&self) -> bool {
        self.flags.contains(MessageFlags::CONTROL)
    }

    /// Whether this packet carries any fragment of a larger message.
    pub fn is_fragment(&self) -> bool {
        self.flags.intersects(
            MessageFlags::FIRST_FRAGMENT
                | MessageFlags::LAST_FRAGMENT
                | MessageFlags::MORE_FRAGMENTS,
        )
    }

    pub fn has_prerequisites(&self) -> bool {
        self.flags.contains(MessageFlags::DELIVERY_PREREQUISITES)
    }
}

/// A fully decoded message packet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessagePacket {
    pub header: MessagePacketHeader,
    pub prerequisites: Option<DeliveryPrerequisites>,
    /// Chunks in wire order.
    pub chunks: Vec<Chunk>,
    /// Length of the decoded datagram.
    pub wire_len: usize,
}

impl MessagePacket {
    /// Decode a complete datagram payload.
    ///
    /// Any truncation or length violation anywhere in the packet fails the
    /// whole decode; unknown chunk types do not.
    pub fn decode(buf: &[u8]) -> Result<Self, DecodeError> {
        let reader = Reader::new(buf);
        let header = MessagePacketHeader::decode(&reader)?;

        let mut offset = MESSAGE_HEADER_SIZE;
        let prerequisites = if header.has_prerequisites() {
            let (prereq, consumed) = DeliveryPrerequisites::decode(&reader, offset)?;
            offset += consumed;
            Some(prereq)
        } else {
            None
        };

        let mut chunks = Vec::new();
        while offset < reader.len() {
            let chunk = Chunk::decode(&reader, offset)?;
            tracing::trace!(
                offset,
                chunk = chunk.name(),
                declared = chunk.declared_len,
                "chunk"
            );
            // Advance by the declared length, never by the bytes the typed
            // decoder consumed. Chunk::decode guarantees declared_len >= 4.
            offset += chunk.declared_len as usize;
            chunks.push(chunk);
        }

        Ok(MessagePacket {
            header,
            prerequisites,
            chunks,
            wire_len: buf.len(),
        })
    }

    /// Chunk type names in wire order.
    pub fn chunk_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.chunks.iter().map(Chunk::name)
    }

    /// Recognized chunk types in wire order (unknown chunks are skipped).
    pub fn chunk_types(&self) -> impl Iterator<Item = ChunkType> + '_ {
        self.chunks.iter().filter_map(Chunk::kind)
    }

    /// Tag id and payload of the first data chunk, if any.
    pub fn data_chunk(&self) -> Option<(u16, &[u8])> {
        self.chunks.iter().find_map(|c| match &c.body {
            ChunkBody::Data { tag_id, payload } => Some((*tag_id, payload.as_ref())),
            _ => None,
        })
    }
}
