//! # mockets-wire
//!
//! Passive decoder for the Mockets wire formats carried over UDP.
//!
//! Two independent formats are understood: the message-oriented format (a
//! 12-byte header, optional delivery prerequisites and a sequence of typed
//! chunks) and the stream-oriented format (a fixed 16-byte header followed
//! by payload). Decoding is pure and synchronous: bytes in, a structured
//! value or a [`DecodeError`] out. Nothing is ever encoded, and no protocol
//! state is kept between datagrams.
//!
//! ## Crate structure
//!
//! - [`cursor`]: Bounds-checked big-endian reader over a datagram
//! - [`error`]: Decode error taxonomy
//! - [`prereq`]: Delivery prerequisites block
//! - [`ack`]: ACK information blocks carried by SAck-style chunks
//! - [`cookie`]: Handshake state cookie
//! - [`chunk`]: Chunk envelope, type registry and bodies
//! - [`message`]: Message packet decoder
//! - [`stream`]: Stream packet decoder
//! - [`datagram`]: Captured datagram boundary and protocol dispatch
//! - [`stats`]: Decode statistics

pub mod ack;
pub mod chunk;
pub mod cookie;
pub mod cursor;
pub mod datagram;
pub mod error;
pub mod message;
pub mod prereq;
pub mod stats;
pub mod stream;

pub use chunk::{Chunk, ChunkBody, ChunkType};
pub use datagram::{decode_datagram, CapturedDatagram, DecodedDatagram, DecodedPacket, Protocol};
pub use error::{DecodeError, ErrorKind};
pub use message::MessagePacket;
pub use stats::DecodeStats;
pub use stream::StreamPacket;
