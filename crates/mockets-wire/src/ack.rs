//! # ACK Information
//!
//! Length-bounded list of TSN blocks carried by SAck and CancelledPackets
//! chunks. Each block describes either individual TSNs or inclusive TSN
//! ranges for one flow.
//!
//! ## Block layout
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |  Flags (8)    |   Block Length (16, incl. hdr) |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |  Singles: TSN (32) ...   |   Ranges: Start TSN (32), End TSN (32) ...
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```

use serde::Serialize;

use crate::cursor::Reader;
use crate::error::{DecodeError, Record};

/// Size of the flags + length sub-header of every block.
pub const BLOCK_HEADER_SIZE: usize = 3;

const SINGLE_WIDTH: usize = 4;
const RANGE_WIDTH: usize = 8;

bitflags::bitflags! {
    /// Flags byte of an ACK info block.
    ///
    /// Only [`AckBlockFlags::TYPE_RANGES`] changes how the block is parsed;
    /// the flow bits are context for the reader.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
    pub struct AckBlockFlags: u8 {
        const CONTROL_FLOW = 0x01;
        const RELIABLE_SEQUENCED_FLOW = 0x02;
        const RELIABLE_UNSEQUENCED_FLOW = 0x04;
        const TYPE_RANGES = 0x10;
        const TYPE_SINGLES = 0x20;

        const _ = !0;
    }
}

/// Inclusive TSN range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TsnRange {
    pub start: u32,
    pub end: u32,
}

/// Entries of one block, in wire order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum AckEntries {
    Singles(Vec<u32>),
    Ranges(Vec<TsnRange>),
}

/// One decoded ACK info block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AckInfoBlock {
    pub flags: AckBlockFlags,
    /// Declared length including the 3-byte sub-header.
    pub declared_len: u16,
    pub entries: AckEntries,
}

impl AckInfoBlock {
    /// Decode one block at `offset`. `limit` is the number of bytes left in
    /// the enclosing ACK information field; the block may not extend past it.
    pub fn decode(reader: &Reader<'_>, offset: usize, limit: usize) -> Result<Self, DecodeError> {
        if limit < BLOCK_HEADER_SIZE {
            return Err(DecodeError::invalid_length(
                reader.absolute(offset),
                Record::AckInfoBlock,
                limit,
                "block header does not fit in remaining ack information",
            ));
        }

        let flags = AckBlockFlags::from_bits_retain(reader.u8_at(offset)?);
        let declared_len = reader.u16_at(offset + 1)?;
        let declared = declared_len as usize;

        if declared < BLOCK_HEADER_SIZE {
            return Err(DecodeError::invalid_length(
                reader.absolute(offset),
                Record::AckInfoBlock,
                declared,
                "shorter than block header",
            ));
        }
        if declared > limit {
            return Err(DecodeError::invalid_length(
                reader.absolute(offset),
                Record::AckInfoBlock,
                declared,
                "overruns enclosing ack information",
            ));
        }

        let body_len = declared - BLOCK_HEADER_SIZE;
        let body = offset + BLOCK_HEADER_SIZE;
        let ranges = flags.contains(AckBlockFlags::TYPE_RANGES);
        let width = if ranges { RANGE_WIDTH } else { SINGLE_WIDTH };
        if body_len % width != 0 {
            return Err(DecodeError::invalid_length(
                reader.absolute(offset),
                Record::AckInfoBlock,
                declared,
                "entries are not a whole number of TSN fields",
            ));
        }

        let count = body_len / width;
        let entries = if ranges {
            let mut out = Vec::with_capacity(count);
            for i in 0..count {
                let at = body + i * RANGE_WIDTH;
                out.push(TsnRange {
                    start: reader.u32_at(at)?,
                    end: reader.u32_at(at + 4)?,
                });
            }
            AckEntries::Ranges(out)
        } else {
            let mut out = Vec::with_capacity(count);
            for i in 0..count {
                out.push(reader.u32_at(body + i * SINGLE_WIDTH)?);
            }
            AckEntries::Singles(out)
        };

        tracing::trace!(
            offset = reader.absolute(offset),
            flags = flags.bits(),
            declared,
            count,
            ranges,
            "ack info block"
        );

        Ok(AckInfoBlock {
            flags,
            declared_len,
            entries,
        })
    }

    /// Number of TSNs acknowledged (or cancelled) by this block.
    ///
    /// Range widths use wrapping arithmetic so that ranges spanning the TSN
    /// wrap-around point are counted correctly.
    pub fn tsn_count(&self) -> u64 {
        match &self.entries {
            AckEntries::Singles(tsns) => tsns.len() as u64,
            AckEntries::Ranges(ranges) => ranges
                .iter()
                .map(|r| r.end.wrapping_sub(r.start) as u64 + 1)
                .sum(),
        }
    }
}

/// Ordered sequence of ACK info blocks filling a declared length exactly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AckInformation {
    pub blocks: Vec<AckInfoBlock>,
}

impl AckInformation {
    /// Decode blocks starting at `offset` until exactly `declared_len` bytes
    /// have been consumed.
    pub fn decode(
        reader: &Reader<'_>,
        offset: usize,
        declared_len: usize,
    ) -> Result<Self, DecodeError> {
        let mut blocks = Vec::new();
        let mut consumed = 0;
        while consumed < declared_len {
            let block = AckInfoBlock::decode(reader, offset + consumed, declared_len - consumed)?;
            // declared_len >= BLOCK_HEADER_SIZE, so every pass makes progress.
            consumed += block.declared_len as usize;
            blocks.push(block);
        }
        Ok(AckInformation { blocks })
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Total TSNs covered by all blocks.
    pub fn tsn_count(&self) -> u64 {
        self.blocks.iter().map(AckInfoBlock::tsn_count).sum()
    }
}
