//! # Decode Errors
//!
//! Every decoder in this crate fails with [`DecodeError`]. Errors always carry
//! the absolute offset (from the start of the datagram) at which the problem
//! was detected so that diagnostic tooling can point at the offending byte.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// The kind of wire record a length check applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Record {
    MessageHeader,
    DeliveryPrerequisites,
    Chunk,
    AckInformation,
    AckInfoBlock,
    StateCookie,
    PublicKey,
    StreamHeader,
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Record::MessageHeader => "message header",
            Record::DeliveryPrerequisites => "delivery prerequisites",
            Record::Chunk => "chunk",
            Record::AckInformation => "ack information",
            Record::AckInfoBlock => "ack info block",
            Record::StateCookie => "state cookie",
            Record::PublicKey => "public key",
            Record::StreamHeader => "stream header",
        };
        f.write_str(name)
    }
}

/// Coarse error classification, used for statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ErrorKind {
    TruncatedBuffer,
    InvalidLength,
}

/// A malformed datagram.
///
/// Decoding is all-or-nothing: any error aborts the whole packet and no
/// partially decoded value is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// A fixed-size read needed more bytes than the buffer holds.
    #[error("truncated buffer at offset {offset}: need {needed} bytes, {available} available")]
    TruncatedBuffer {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// A declared length is below the record's minimum, overruns its
    /// enclosing record, or does not divide into whole entries.
    #[error("invalid {record} length {declared} at offset {offset}: {reason}")]
    InvalidLength {
        offset: usize,
        record: Record,
        declared: usize,
        reason: &'static str,
    },
}

impl DecodeError {
    /// Absolute offset of the failure.
    pub fn offset(&self) -> usize {
        match self {
            DecodeError::TruncatedBuffer { offset, .. } => *offset,
            DecodeError::InvalidLength { offset, .. } => *offset,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            DecodeError::TruncatedBuffer { .. } => ErrorKind::TruncatedBuffer,
            DecodeError::InvalidLength { .. } => ErrorKind::InvalidLength,
        }
    }

    pub(crate) fn invalid_length(
        offset: usize,
        record: Record,
        declared: usize,
        reason: &'static str,
    ) -> Self {
        DecodeError::InvalidLength {
            offset,
            record,
            declared,
            reason,
        }
    }
}
