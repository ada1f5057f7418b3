//! # State Cookie
//!
//! Fixed 68-byte token exchanged during the four-way handshake (carried by
//! InitAck and echoed back in CookieEcho). Decoded purely for display; the
//! values are not validated.

use serde::Serialize;

use crate::cursor::Reader;
use crate::error::DecodeError;

/// Decoded state cookie. Field order matches the wire layout; endpoint "A"
/// is the initiator and "Z" the responder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StateCookie {
    pub timestamp: u64,
    pub lifespan: u64,
    pub validation_a: u32,
    pub validation_z: u32,
    pub reliable_sequenced_tsn_a: u32,
    pub unreliable_sequenced_tsn_a: u32,
    pub control_tsn_a: u32,
    pub reliable_flow_id_a: u32,
    pub unreliable_flow_id_a: u32,
    pub reliable_sequenced_tsn_z: u32,
    pub unreliable_sequenced_tsn_z: u32,
    pub control_tsn_z: u32,
    pub reliable_flow_id_z: u32,
    pub unreliable_flow_id_z: u32,
    pub port_a: u16,
    pub port_z: u16,
}

impl StateCookie {
    /// Encoded size: 2×8 + 12×4 + 2×2.
    pub const SIZE: usize = 68;

    pub fn decode(reader: &Reader<'_>, offset: usize) -> Result<Self, DecodeError> {
        // A short cookie is reported at the record start.
        let r = reader.sub(offset, Self::SIZE)?;
        Ok(StateCookie {
            timestamp: r.u64_at(0)?,
            lifespan: r.u64_at(8)?,
            validation_a: r.u32_at(16)?,
            validation_z: r.u32_at(20)?,
            reliable_sequenced_tsn_a: r.u32_at(24)?,
            unreliable_sequenced_tsn_a: r.u32_at(28)?,
            control_tsn_a: r.u32_at(32)?,
            reliable_flow_id_a: r.u32_at(36)?,
            unreliable_flow_id_a: r.u32_at(40)?,
            reliable_sequenced_tsn_z: r.u32_at(44)?,
            unreliable_sequenced_tsn_z: r.u32_at(48)?,
            control_tsn_z: r.u32_at(52)?,
            reliable_flow_id_z: r.u32_at(56)?,
            unreliable_flow_id_z: r.u32_at(60)?,
            port_a: r.u16_at(64)?,
            port_z: r.u16_at(66)?,
        })
    }
}
