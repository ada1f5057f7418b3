//! # Captured Datagrams
//!
//! Boundary with the capture source: a UDP payload plus the capture
//! timestamp and both endpoints. Capturing and filtering happen elsewhere;
//! this module only routes an already-delivered payload to the right decoder.

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

use crate::error::DecodeError;
use crate::message::MessagePacket;
use crate::stream::StreamPacket;

/// Which wire format a datagram carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Message,
    Stream,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Message => f.write_str("message"),
            Protocol::Stream => f.write_str("stream"),
        }
    }
}

impl FromStr for Protocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "message" | "mockets" => Ok(Protocol::Message),
            "stream" => Ok(Protocol::Stream),
            other => Err(format!("unknown protocol '{other}'")),
        }
    }
}

/// One UDP payload as handed over by the capture source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedDatagram {
    /// Capture time in microseconds since the Unix epoch.
    pub timestamp_us: u64,
    pub source: SocketAddr,
    pub destination: SocketAddr,
    pub payload: Bytes,
}

/// Either decoded packet form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "protocol", rename_all = "lowercase")]
pub enum DecodedPacket {
    Message(MessagePacket),
    Stream(StreamPacket),
}

impl DecodedPacket {
    pub fn decode(protocol: Protocol, buf: &[u8]) -> Result<Self, DecodeError> {
        match protocol {
            Protocol::Message => MessagePacket::decode(buf).map(DecodedPacket::Message),
            Protocol::Stream => StreamPacket::decode(buf).map(DecodedPacket::Stream),
        }
    }

    pub fn protocol(&self) -> Protocol {
        match self {
            DecodedPacket::Message(_) => Protocol::Message,
            DecodedPacket::Stream(_) => Protocol::Stream,
        }
    }
}

/// A decoded packet together with its capture metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodedDatagram {
    pub timestamp_us: u64,
    pub source: SocketAddr,
    pub destination: SocketAddr,
    pub packet: DecodedPacket,
}

/// Decode `datagram` as `protocol`.
pub fn decode_datagram(
    datagram: &CapturedDatagram,
    protocol: Protocol,
) -> Result<DecodedDatagram, DecodeError> {
    let packet = DecodedPacket::decode(protocol, &datagram.payload).inspect_err(|e| {
        tracing::debug!(
            source = %datagram.source,
            destination = %datagram.destination,
            %protocol,
            error = %e,
            "datagram decode failed"
        );
    })?;
    Ok(DecodedDatagram {
        timestamp_us: datagram.timestamp_us,
        source: datagram.source,
        destination: datagram.destination,
        packet,
    })
}
