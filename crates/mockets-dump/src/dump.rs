//! JSON-lines rendering of decoded datagrams.

use std::io::{self, Write};
use std::net::SocketAddr;

use mockets_wire::error::ErrorKind;
use mockets_wire::{decode_datagram, CapturedDatagram, DecodeStats, Protocol};
use serde::Serialize;

use crate::config::DumpConfig;

/// Output line for a datagram that failed to decode.
#[derive(Debug, Serialize)]
struct FailedDatagram<'a> {
    timestamp_us: u64,
    source: SocketAddr,
    destination: SocketAddr,
    protocol: Protocol,
    error: String,
    kind: ErrorKind,
    offset: usize,
    payload: &'a str,
}

/// Final summary line.
#[derive(Debug, Serialize)]
struct Summary<'a> {
    summary: &'a DecodeStats,
    skipped: u64,
    malformed_records: u64,
}

/// Decodes datagrams and writes one JSON document per line.
pub struct Dumper<W: Write> {
    config: DumpConfig,
    out: W,
    stats: DecodeStats,
    skipped: u64,
    malformed_records: u64,
}

impl<W: Write> Dumper<W> {
    pub fn new(config: DumpConfig, out: W) -> Self {
        Self {
            config,
            out,
            stats: DecodeStats::new(),
            skipped: 0,
            malformed_records: 0,
        }
    }

    /// Decode and emit one datagram, classified by its ports unless
    /// `protocol` forces a format.
    pub fn process(
        &mut self,
        datagram: &CapturedDatagram,
        protocol: Option<Protocol>,
    ) -> io::Result<()> {
        let Some(protocol) =
            protocol.or_else(|| self.config.classify(&datagram.source, &datagram.destination))
        else {
            tracing::debug!(
                source = %datagram.source,
                destination = %datagram.destination,
                "no protocol mapped, skipping datagram"
            );
            self.skipped += 1;
            return Ok(());
        };

        let result = decode_datagram(datagram, protocol);
        self.stats.record(datagram.payload.len(), &result);

        match result {
            Ok(decoded) => serde_json::to_writer(&mut self.out, &decoded)?,
            Err(err) => {
                tracing::warn!(
                    timestamp_us = datagram.timestamp_us,
                    source = %datagram.source,
                    destination = %datagram.destination,
                    %protocol,
                    error = %err,
                    "undecodable datagram"
                );
                let payload = hex::encode(&datagram.payload);
                let failed = FailedDatagram {
                    timestamp_us: datagram.timestamp_us,
                    source: datagram.source,
                    destination: datagram.destination,
                    protocol,
                    error: err.to_string(),
                    kind: err.kind(),
                    offset: err.offset(),
                    payload: &payload,
                };
                serde_json::to_writer(&mut self.out, &failed)?;
            }
        }
        writeln!(self.out)
    }

    /// Count an input record that could not be parsed.
    pub fn malformed_record(&mut self) {
        self.malformed_records += 1;
    }

    pub fn stats(&self) -> &DecodeStats {
        &self.stats
    }

    pub fn write_summary(&mut self) -> io::Result<()> {
        let summary = Summary {
            summary: &self.stats,
            skipped: self.skipped,
            malformed_records: self.malformed_records,
        };
        serde_json::to_writer(&mut self.out, &summary)?;
        writeln!(self.out)
    }

    pub fn finish(mut self) -> io::Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}
