//! # Chunks
//!
//! The payload of a message packet is a sequence of self-delimiting chunks.
//! Every chunk starts with the same 4-byte header:
//!
//! ```text
//!  0                   1                   2                   3
//!  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |      Chunk Type (16)          |   Chunk Length (16, incl. hdr) |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! |                      type-specific fields                      |
//! +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
//! ```
//!
//! The high nibble of the type code selects the chunk class (metadata, data,
//! state change). Type codes this decoder does not know are kept as
//! [`ChunkBody::Unknown`] with their raw bytes, so newer peers never make a
//! packet undecodable.

use bytes::Bytes;
use serde::Serialize;
use std::fmt;

use crate::ack::AckInformation;
use crate::cookie::StateCookie;
use crate::cursor::Reader;
use crate::error::{DecodeError, Record};

// ─── Constants ───────────────────────────────────────────────────────────────

/// Type code (2) + declared length (2).
pub const CHUNK_HEADER_SIZE: usize = 4;

/// Chunk header plus the 16-bit tag id.
pub const DATA_CHUNK_HEADER_SIZE: usize = CHUNK_HEADER_SIZE + 2;

pub const CHUNK_CLASS_METADATA: u16 = 0x1000;
pub const CHUNK_CLASS_DATA: u16 = 0x2000;
pub const CHUNK_CLASS_STATE_CHANGE: u16 = 0x4000;

const INIT_PARAMS_SIZE: usize = 20;

/// Init parameters plus the unreliable-unsequenced id.
const EXTENDED_PARAMS_SIZE: usize = INIT_PARAMS_SIZE + 4;

/// Key length (2) + reserved (2) ahead of a public key.
const PUBLIC_KEY_HEADER_SIZE: usize = 4;

// ─── Chunk Type ──────────────────────────────────────────────────────────────

/// Chunk class selected by the high nibble of the type code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChunkClass {
    Metadata,
    Data,
    StateChange,
    Unassigned,
}

impl ChunkClass {
    pub fn of(code: u16) -> Self {
        match code & 0xF000 {
            CHUNK_CLASS_METADATA => ChunkClass::Metadata,
            CHUNK_CLASS_DATA => ChunkClass::Data,
            CHUNK_CLASS_STATE_CHANGE => ChunkClass::StateChange,
            _ => ChunkClass::Unassigned,
        }
    }
}

/// Every chunk type code this decoder understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u16)]
pub enum ChunkType {
    Sack = CHUNK_CLASS_METADATA | 0x0001,
    Heartbeat = CHUNK_CLASS_METADATA | 0x0002,
    CancelledPackets = CHUNK_CLASS_METADATA | 0x0003,
    Timestamp = CHUNK_CLASS_METADATA | 0x0004,
    TimestampAck = CHUNK_CLASS_METADATA | 0x0005,
    SackBandwidthEstimate = CHUNK_CLASS_METADATA | 0x0006,
    Data = CHUNK_CLASS_DATA | 0x0001,
    Init = CHUNK_CLASS_STATE_CHANGE | 0x0001,
    InitAck = CHUNK_CLASS_STATE_CHANGE | 0x0002,
    CookieEcho = CHUNK_CLASS_STATE_CHANGE | 0x0003,
    CookieAck = CHUNK_CLASS_STATE_CHANGE | 0x0004,
    Shutdown = CHUNK_CLASS_STATE_CHANGE | 0x0005,
    ShutdownAck = CHUNK_CLASS_STATE_CHANGE | 0x0006,
    ShutdownComplete = CHUNK_CLASS_STATE_CHANGE | 0x0007,
    Abort = CHUNK_CLASS_STATE_CHANGE | 0x0008,
    Suspend = CHUNK_CLASS_STATE_CHANGE | 0x0009,
    SuspendAck = CHUNK_CLASS_STATE_CHANGE | 0x000A,
    Resume = CHUNK_CLASS_STATE_CHANGE | 0x000B,
    ResumeAck = CHUNK_CLASS_STATE_CHANGE | 0x000C,
    ReEstablish = CHUNK_CLASS_STATE_CHANGE | 0x000D,
    ReEstablishAck = CHUNK_CLASS_STATE_CHANGE | 0x000E,
    SimpleSuspend = CHUNK_CLASS_STATE_CHANGE | 0x000F,
    SimpleSuspendAck = CHUNK_CLASS_STATE_CHANGE | 0x0010,
    SimpleConnect = CHUNK_CLASS_STATE_CHANGE | 0x0011,
    SimpleConnectAck = CHUNK_CLASS_STATE_CHANGE | 0x0012,
}

impl ChunkType {
    pub fn from_code(code: u16) -> Option<Self> {
        let kind = match code {
            0x1001 => ChunkType::Sack,
            0x1002 => ChunkType::Heartbeat,
            0x1003 => ChunkType::CancelledPackets,
            0x1004 => ChunkType::Timestamp,
            0x1005 => ChunkType::TimestampAck,
            0x1006 => ChunkType::SackBandwidthEstimate,
            0x2001 => ChunkType::Data,
            0x4001 => ChunkType::Init,
            0x4002 => ChunkType::InitAck,
            0x4003 => ChunkType::CookieEcho,
            0x4004 => ChunkType::CookieAck,
            0x4005 => ChunkType::Shutdown,
            0x4006 => ChunkType::ShutdownAck,
            0x4007 => ChunkType::ShutdownComplete,
            0x4008 => ChunkType::Abort,
            0x4009 => ChunkType::Suspend,
            0x400A => ChunkType::SuspendAck,
            0x400B => ChunkType::Resume,
            0x400C => ChunkType::ResumeAck,
            0x400D => ChunkType::ReEstablish,
            0x400E => ChunkType::ReEstablishAck,
            0x400F => ChunkType::SimpleSuspend,
            0x4010 => ChunkType::SimpleSuspendAck,
            0x4011 => ChunkType::SimpleConnect,
            0x4012 => ChunkType::SimpleConnectAck,
            _ => return None,
        };
        Some(kind)
    }

    #[inline]
    pub fn code(self) -> u16 {
        self as u16
    }

    pub fn class(self) -> ChunkClass {
        ChunkClass::of(self.code())
    }

    pub fn name(self) -> &'static str {
        match self {
            ChunkType::Sack => "Sack",
            ChunkType::Heartbeat => "Heartbeat",
            ChunkType::CancelledPackets => "CancelledPackets",
            ChunkType::Timestamp => "Timestamp",
            ChunkType::TimestampAck => "TimestampAck",
            ChunkType::SackBandwidthEstimate => "SackBandwidthEstimate",
            ChunkType::Data => "Data",
            ChunkType::Init => "Init",
            ChunkType::InitAck => "InitAck",
            ChunkType::CookieEcho => "CookieEcho",
            ChunkType::CookieAck => "CookieAck",
            ChunkType::Shutdown => "Shutdown",
            ChunkType::ShutdownAck => "ShutdownAck",
            ChunkType::ShutdownComplete => "ShutdownComplete",
            ChunkType::Abort => "Abort",
            ChunkType::Suspend => "Suspend",
            ChunkType::SuspendAck => "SuspendAck",
            ChunkType::Resume => "Resume",
            ChunkType::ResumeAck => "ResumeAck",
            ChunkType::ReEstablish => "ReEstablish",
            ChunkType::ReEstablishAck => "ReEstablishAck",
            ChunkType::SimpleSuspend => "SimpleSuspend",
            ChunkType::SimpleSuspendAck => "SimpleSuspendAck",
            ChunkType::SimpleConnect => "SimpleConnect",
            ChunkType::SimpleConnectAck => "SimpleConnectAck",
        }
    }

    /// Smallest declared length that holds every fixed field of this type.
    pub fn min_len(self) -> usize {
        match self {
            ChunkType::Sack => CHUNK_HEADER_SIZE + 12,
            ChunkType::SackBandwidthEstimate => CHUNK_HEADER_SIZE + 24,
            ChunkType::Heartbeat | ChunkType::Timestamp | ChunkType::TimestampAck => {
                CHUNK_HEADER_SIZE + 8
            }
            ChunkType::CancelledPackets => CHUNK_HEADER_SIZE,
            ChunkType::Data => DATA_CHUNK_HEADER_SIZE,
            ChunkType::Init => CHUNK_HEADER_SIZE + INIT_PARAMS_SIZE,
            ChunkType::InitAck => CHUNK_HEADER_SIZE + INIT_PARAMS_SIZE + StateCookie::SIZE,
            ChunkType::CookieEcho => CHUNK_HEADER_SIZE + StateCookie::SIZE,
            ChunkType::CookieAck => CHUNK_HEADER_SIZE + 2,
            ChunkType::SimpleConnect => CHUNK_HEADER_SIZE + EXTENDED_PARAMS_SIZE,
            ChunkType::SimpleConnectAck => {
                CHUNK_HEADER_SIZE + EXTENDED_PARAMS_SIZE + 2 + StateCookie::SIZE
            }
            ChunkType::Shutdown
            | ChunkType::ShutdownAck
            | ChunkType::ShutdownComplete
            | ChunkType::Abort
            | ChunkType::Suspend
            | ChunkType::SuspendAck
            | ChunkType::Resume
            | ChunkType::ReEstablish
            | ChunkType::ResumeAck
            | ChunkType::ReEstablishAck
            | ChunkType::SimpleSuspend
            | ChunkType::SimpleSuspendAck => CHUNK_HEADER_SIZE,
        }
    }

    /// Bytes covered by the fixed fields decoded for a chunk of this type
    /// with the given declared length.
    fn known_len(self, declared: usize) -> usize {
        match self {
            ChunkType::Init if declared >= CHUNK_HEADER_SIZE + EXTENDED_PARAMS_SIZE => {
                CHUNK_HEADER_SIZE + EXTENDED_PARAMS_SIZE
            }
            _ => self.min_len(),
        }
    }

    /// Whether the body runs to the declared length (ACK information, data
    /// payload or an opaque blob) rather than ending after fixed fields.
    fn fills_declared_len(self) -> bool {
        matches!(
            self,
            ChunkType::Sack
                | ChunkType::SackBandwidthEstimate
                | ChunkType::CancelledPackets
                | ChunkType::Data
                | ChunkType::CookieEcho
                | ChunkType::Suspend
                | ChunkType::SuspendAck
                | ChunkType::Resume
                | ChunkType::ReEstablish
        )
    }
}

impl fmt::Display for ChunkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ─── Chunk Bodies ────────────────────────────────────────────────────────────

/// Cumulative acknowledgments for the three reliable flows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CumulativeAcks {
    pub control: u32,
    pub reliable_sequenced: u32,
    pub reliable_unsequenced: u32,
}

impl CumulativeAcks {
    fn decode(r: &Reader<'_>, offset: usize) -> Result<Self, DecodeError> {
        Ok(CumulativeAcks {
            control: r.u32_at(offset)?,
            reliable_sequenced: r.u32_at(offset + 4)?,
            reliable_unsequenced: r.u32_at(offset + 8)?,
        })
    }
}

/// Association parameters shared by Init, InitAck and the SimpleConnect
/// pair.
///
/// `association_id` doubles as the reliable-unsequenced id. Peers may append
/// a sixth word, the unreliable-unsequenced id; it is decoded whenever the
/// chunk has room for it ahead of any following fields. InitAck places its
/// cookie directly after the fifth word, so there it is always `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct InitParams {
    pub validation: u32,
    pub control_tsn: u32,
    pub reliable_sequenced_tsn: u32,
    pub unreliable_sequenced_tsn: u32,
    pub association_id: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unreliable_unsequenced_id: Option<u32>,
}

impl InitParams {
    fn decode(r: &Reader<'_>, offset: usize, extended: bool) -> Result<Self, DecodeError> {
        let unreliable_unsequenced_id = if extended {
            Some(r.u32_at(offset + INIT_PARAMS_SIZE)?)
        } else {
            None
        };
        Ok(InitParams {
            validation: r.u32_at(offset)?,
            control_tsn: r.u32_at(offset + 4)?,
            reliable_sequenced_tsn: r.u32_at(offset + 8)?,
            unreliable_sequenced_tsn: r.u32_at(offset + 12)?,
            association_id: r.u32_at(offset + 16)?,
            unreliable_unsequenced_id,
        })
    }
}

/// Type-specific contents of a chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ChunkBody {
    Sack {
        cumulative: CumulativeAcks,
        ack_info: AckInformation,
    },
    Heartbeat {
        timestamp: i64,
    },
    CancelledPackets {
        ack_info: AckInformation,
    },
    Timestamp {
        timestamp: i64,
    },
    TimestampAck {
        timestamp: i64,
    },
    /// SAck that also lets the receiver side estimate bandwidth.
    SackBandwidthEstimate {
        cumulative: CumulativeAcks,
        bytes_received: u32,
        timestamp: i64,
        ack_info: AckInformation,
    },
    Data {
        tag_id: u16,
        payload: Bytes,
    },
    Init(InitParams),
    InitAck {
        params: InitParams,
        cookie: StateCookie,
    },
    /// The initiator's public key follows the cookie when it asks for
    /// reconnection support.
    CookieEcho {
        cookie: StateCookie,
        public_key: Option<Bytes>,
    },
    CookieAck {
        port: u16,
    },
    Shutdown,
    ShutdownAck,
    ShutdownComplete,
    Abort,
    /// Public key of the suspending side.
    Suspend {
        key: Bytes,
    },
    /// Encrypted session parameters.
    SuspendAck {
        encrypted: Bytes,
    },
    Resume {
        encrypted_nonce: Bytes,
    },
    ResumeAck,
    ReEstablish {
        encrypted_nonce: Bytes,
    },
    ReEstablishAck,
    SimpleSuspend,
    SimpleSuspendAck,
    SimpleConnect(InitParams),
    SimpleConnectAck {
        params: InitParams,
        port: u16,
        cookie: StateCookie,
    },
    /// Unrecognized type code; `raw` is everything after the chunk header.
    Unknown {
        raw: Bytes,
    },
}

impl ChunkBody {
    /// Decode the body of a chunk of a known type. `r` is confined to the
    /// chunk's declared extent and offsets are relative to the chunk start.
    fn decode(kind: ChunkType, r: &Reader<'_>) -> Result<Self, DecodeError> {
        let h = CHUNK_HEADER_SIZE;
        let body = match kind {
            ChunkType::Sack => ChunkBody::Sack {
                cumulative: CumulativeAcks::decode(r, h)?,
                ack_info: AckInformation::decode(r, h + 12, r.len() - (h + 12))?,
            },
            ChunkType::SackBandwidthEstimate => ChunkBody::SackBandwidthEstimate {
                cumulative: CumulativeAcks::decode(r, h)?,
                bytes_received: r.u32_at(h + 12)?,
                timestamp: r.i64_at(h + 16)?,
                ack_info: AckInformation::decode(r, h + 24, r.len() - (h + 24))?,
            },
            ChunkType::Heartbeat => ChunkBody::Heartbeat {
                timestamp: r.i64_at(h)?,
            },
            ChunkType::Timestamp => ChunkBody::Timestamp {
                timestamp: r.i64_at(h)?,
            },
            ChunkType::TimestampAck => ChunkBody::TimestampAck {
                timestamp: r.i64_at(h)?,
            },
            ChunkType::CancelledPackets => ChunkBody::CancelledPackets {
                ack_info: AckInformation::decode(r, h, r.len() - h)?,
            },
            ChunkType::Data => ChunkBody::Data {
                tag_id: r.u16_at(h)?,
                payload: Bytes::copy_from_slice(r.tail(DATA_CHUNK_HEADER_SIZE)?),
            },
            ChunkType::Init => {
                let extended = r.len() >= h + EXTENDED_PARAMS_SIZE;
                ChunkBody::Init(InitParams::decode(r, h, extended)?)
            }
            ChunkType::InitAck => ChunkBody::InitAck {
                params: InitParams::decode(r, h, false)?,
                cookie: StateCookie::decode(r, h + INIT_PARAMS_SIZE)?,
            },
            ChunkType::CookieEcho => ChunkBody::CookieEcho {
                cookie: StateCookie::decode(r, h)?,
                public_key: decode_public_key(r, h + StateCookie::SIZE)?,
            },
            ChunkType::CookieAck => ChunkBody::CookieAck { port: r.u16_at(h)? },
            ChunkType::Shutdown => ChunkBody::Shutdown,
            ChunkType::ShutdownAck => ChunkBody::ShutdownAck,
            ChunkType::ShutdownComplete => ChunkBody::ShutdownComplete,
            ChunkType::Abort => ChunkBody::Abort,
            ChunkType::Suspend => ChunkBody::Suspend {
                key: Bytes::copy_from_slice(r.tail(h)?),
            },
            ChunkType::SuspendAck => ChunkBody::SuspendAck {
                encrypted: Bytes::copy_from_slice(r.tail(h)?),
            },
            ChunkType::Resume => ChunkBody::Resume {
                encrypted_nonce: Bytes::copy_from_slice(r.tail(h)?),
            },
            ChunkType::ResumeAck => ChunkBody::ResumeAck,
            ChunkType::ReEstablish => ChunkBody::ReEstablish {
                encrypted_nonce: Bytes::copy_from_slice(r.tail(h)?),
            },
            ChunkType::ReEstablishAck => ChunkBody::ReEstablishAck,
            ChunkType::SimpleSuspend => ChunkBody::SimpleSuspend,
            ChunkType::SimpleSuspendAck => ChunkBody::SimpleSuspendAck,
            ChunkType::SimpleConnect => ChunkBody::SimpleConnect(InitParams::decode(r, h, true)?),
            ChunkType::SimpleConnectAck => ChunkBody::SimpleConnectAck {
                params: InitParams::decode(r, h, true)?,
                port: r.u16_at(h + EXTENDED_PARAMS_SIZE)?,
                cookie: StateCookie::decode(r, h + EXTENDED_PARAMS_SIZE + 2)?,
            },
        };
        Ok(body)
    }
}

/// Optional public-key trailer: u16 key length, two reserved bytes, then the
/// key. Absent when the chunk ends at `offset`; a zero length also means no
/// key.
fn decode_public_key(r: &Reader<'_>, offset: usize) -> Result<Option<Bytes>, DecodeError> {
    if r.len() <= offset {
        return Ok(None);
    }
    if r.len() < offset + PUBLIC_KEY_HEADER_SIZE {
        return Err(DecodeError::invalid_length(
            r.absolute(offset),
            Record::PublicKey,
            r.len() - offset,
            "shorter than public key header",
        ));
    }
    let key_len = r.u16_at(offset)? as usize;
    if key_len == 0 {
        return Ok(None);
    }
    let start = offset + PUBLIC_KEY_HEADER_SIZE;
    if start + key_len > r.len() {
        return Err(DecodeError::invalid_length(
            r.absolute(offset),
            Record::PublicKey,
            key_len,
            "key runs past chunk length",
        ));
    }
    Ok(Some(Bytes::copy_from_slice(r.bytes_at(start, key_len)?)))
}

// ─── Chunk Envelope ──────────────────────────────────────────────────────────

/// One decoded chunk: the shared header plus its typed body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Chunk {
    /// Raw type code as it appeared on the wire.
    pub chunk_type: u16,
    /// Declared length including the 4-byte header.
    pub declared_len: u16,
    pub body: ChunkBody,
}

impl Chunk {
    /// Decode the chunk whose header starts at `offset`.
    ///
    /// The caller advances by [`Chunk::declared_len`], which is always at
    /// least [`CHUNK_HEADER_SIZE`] on success.
    pub fn decode(reader: &Reader<'_>, offset: usize) -> Result<Self, DecodeError> {
        let chunk_type = reader.u16_at(offset)?;
        let declared_len = reader.u16_at(offset + 2)?;
        let declared = declared_len as usize;
        let at = reader.absolute(offset);

        if declared < CHUNK_HEADER_SIZE {
            return Err(DecodeError::invalid_length(
                at,
                Record::Chunk,
                declared,
                "shorter than chunk header",
            ));
        }

        let kind = ChunkType::from_code(chunk_type);
        if let Some(kind) = kind {
            if declared < kind.min_len() {
                return Err(DecodeError::invalid_length(
                    at,
                    Record::Chunk,
                    declared,
                    "shorter than the minimum for its chunk type",
                ));
            }
        }

        let r = reader.sub(offset, declared)?;
        let body = match kind {
            Some(kind) => {
                let known = kind.known_len(declared);
                if !kind.fills_declared_len() && declared > known {
                    tracing::trace!(
                        offset = at,
                        chunk = %kind,
                        ignored = declared - known,
                        "trailing chunk bytes ignored"
                    );
                }
                ChunkBody::decode(kind, &r)?
            }
            None => {
                tracing::debug!(
                    offset = at,
                    chunk_type = format_args!("{chunk_type:#06x}"),
                    declared,
                    "unknown chunk type"
                );
                ChunkBody::Unknown {
                    raw: Bytes::copy_from_slice(r.tail(CHUNK_HEADER_SIZE)?),
                }
            }
        };

        Ok(Chunk {
            chunk_type,
            declared_len,
            body,
        })
    }

    /// The recognized type, or `None` for an unknown chunk.
    pub fn kind(&self) -> Option<ChunkType> {
        ChunkType::from_code(self.chunk_type)
    }

    pub fn class(&self) -> ChunkClass {
        ChunkClass::of(self.chunk_type)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self.body, ChunkBody::Unknown { .. })
    }

    /// Display name of the chunk type ("Unknown" for unrecognized codes).
    pub fn name(&self) -> &'static str {
        self.kind().map_or("Unknown", ChunkType::name)
    }

    /// The ACK information carried by SAck-style and CancelledPackets chunks.
    pub fn ack_info(&self) -> Option<&AckInformation> {
        match &self.body {
            ChunkBody::Sack { ack_info, .. }
            | ChunkBody::SackBandwidthEstimate { ack_info, .. }
            | ChunkBody::CancelledPackets { ack_info } => Some(ack_info),
            _ => None,
        }
    }
}
