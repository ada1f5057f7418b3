//! # Delivery Prerequisites
//!
//! Optional sub-header that follows the message header when
//! [`MessageFlags::DELIVERY_PREREQUISITES`](crate::message::MessageFlags) is
//! set. It lists the TSNs that must have been delivered before this packet.
//!
//! ```text
//! +-+-+-+-+-+-+-+-+
//! |  Flags (8)    |   0x01 reliable-sequenced, 0x02 unreliable-sequenced, 0x04 control
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |        0..3 × TSN (32), present in flag bit order              |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```

use serde::Serialize;

use crate::cursor::Reader;
use crate::error::DecodeError;

bitflags::bitflags! {
    /// Which prerequisite TSNs are present.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
    pub struct PrerequisiteFlags: u8 {
        const RELIABLE_SEQUENCED = 0x01;
        const UNRELIABLE_SEQUENCED = 0x02;
        const CONTROL = 0x04;

        // Other bits are reserved and never interpreted.
        const _ = !0;
    }
}

/// Decoded delivery prerequisites.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryPrerequisites {
    pub flags: PrerequisiteFlags,
    pub reliable_sequenced_tsn: Option<u32>,
    pub unreliable_sequenced_tsn: Option<u32>,
    pub control_tsn: Option<u32>,
}

impl DeliveryPrerequisites {
    /// Decode the sub-header at `offset`, returning it together with the
    /// number of bytes consumed (`1 + 4 * present fields`).
    pub fn decode(reader: &Reader<'_>, offset: usize) -> Result<(Self, usize), DecodeError> {
        let flags = PrerequisiteFlags::from_bits_retain(reader.u8_at(offset)?);
        let mut cursor = offset + 1;

        let mut take = |flag: PrerequisiteFlags| -> Result<Option<u32>, DecodeError> {
            if !flags.contains(flag) {
                return Ok(None);
            }
            let tsn = reader.u32_at(cursor)?;
            cursor += 4;
            Ok(Some(tsn))
        };

        let reliable_sequenced_tsn = take(PrerequisiteFlags::RELIABLE_SEQUENCED)?;
        let unreliable_sequenced_tsn = take(PrerequisiteFlags::UNRELIABLE_SEQUENCED)?;
        let control_tsn = take(PrerequisiteFlags::CONTROL)?;

        let consumed = cursor - offset;
        tracing::trace!(
            offset = reader.absolute(offset),
            flags = flags.bits(),
            consumed,
            "delivery prerequisites"
        );

        Ok((
            DeliveryPrerequisites {
                flags,
                reliable_sequenced_tsn,
                unreliable_sequenced_tsn,
                control_tsn,
            },
            consumed,
        ))
    }

    /// Number of prerequisite TSNs carried.
    pub fn len(&self) -> usize {
        [
            self.reliable_sequenced_tsn,
            self.unreliable_sequenced_tsn,
            self.control_tsn,
        ]
        .iter()
        .filter(|tsn| tsn.is_some())
        .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
