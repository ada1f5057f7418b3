//! Text records of captured datagrams.
//!
//! One datagram per line:
//!
//! ```text
//! <timestamp_us> <source addr:port> <destination addr:port> <hex payload>
//! ```
//!
//! Blank lines and lines starting with `#` are ignored. The payload may use
//! `:` separators between bytes (as copied from packet analyzers).

use std::net::SocketAddr;

use bytes::Bytes;
use mockets_wire::CapturedDatagram;

/// Parse one record line. Returns `Ok(None)` for blank and comment lines.
pub fn parse_line(line: &str) -> Result<Option<CapturedDatagram>, String> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }

    let mut fields = line.split_whitespace();
    let timestamp_us = fields
        .next()
        .ok_or("missing timestamp")?
        .parse::<u64>()
        .map_err(|e| format!("invalid timestamp: {}", e))?;
    let source = parse_addr(fields.next(), "source")?;
    let destination = parse_addr(fields.next(), "destination")?;
    let payload = parse_hex(fields.next().unwrap_or(""))?;
    if let Some(extra) = fields.next() {
        return Err(format!("unexpected trailing field '{}'", extra));
    }

    Ok(Some(CapturedDatagram {
        timestamp_us,
        source,
        destination,
        payload,
    }))
}

/// Decode a hex payload, tolerating `:` separators.
pub fn parse_hex(text: &str) -> Result<Bytes, String> {
    let cleaned: String = text.chars().filter(|c| *c != ':').collect();
    hex::decode(&cleaned)
        .map(Bytes::from)
        .map_err(|e| format!("invalid hex payload: {}", e))
}

fn parse_addr(field: Option<&str>, what: &str) -> Result<SocketAddr, String> {
    let field = field.ok_or_else(|| format!("missing {} address", what))?;
    field
        .parse()
        .map_err(|e| format!("invalid {} address '{}': {}", what, field, e))
}
