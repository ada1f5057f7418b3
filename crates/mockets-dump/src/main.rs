//! Mockets Dump
//!
//! Offline diagnostic decoder for captured Mockets traffic.
//!
//! - Reads datagram records (`timestamp_us src dst hexpayload`) from a file
//!   or stdin, or a single payload given with `--hex`
//! - Picks the wire format by UDP port mapping or `--protocol`
//! - Writes one JSON document per datagram to stdout
//! - With `--summary`, finishes with a decode statistics line

mod config;
mod dump;
mod record;

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter};
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use mockets_wire::{CapturedDatagram, Protocol};
use tracing_subscriber::EnvFilter;

use crate::config::DumpConfig;
use crate::dump::Dumper;

/// Decode captured Mockets datagrams to JSON lines.
#[derive(Parser, Debug)]
#[command(name = "mockets-dump", about = "Decode captured Mockets datagrams")]
struct Cli {
    /// TOML file with port mappings.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Record file to decode (`-` for stdin).
    #[arg(long, conflicts_with = "hex")]
    input: Option<String>,

    /// Decode a single hex payload instead of a record file.
    #[arg(long)]
    hex: Option<String>,

    /// Force the wire format (message or stream) for every datagram.
    #[arg(long)]
    protocol: Option<Protocol>,

    /// UDP port carrying the message-oriented format (repeatable).
    #[arg(long = "message-port")]
    message_ports: Vec<u16>,

    /// UDP port carrying the stream-oriented format (repeatable).
    #[arg(long = "stream-port")]
    stream_ports: Vec<u16>,

    /// Print decode statistics after the last datagram.
    #[arg(long, default_value_t = false)]
    summary: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    tracing::debug!(
        version = config.version,
        message_ports = ?config.message_ports,
        stream_ports = ?config.stream_ports,
        default_protocol = ?config.default_protocol,
        "mockets-dump starting"
    );

    let default_protocol = config.default_protocol;
    let stdout = io::stdout();
    let mut dumper = Dumper::new(config, BufWriter::new(stdout.lock()));

    if let Some(text) = &cli.hex {
        let protocol = cli
            .protocol
            .or(default_protocol)
            .context("--hex needs --protocol or a default_protocol in the config")?;
        let payload = record::parse_hex(text).map_err(anyhow::Error::msg)?;
        let unspecified = SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0));
        let datagram = CapturedDatagram {
            timestamp_us: 0,
            source: unspecified,
            destination: unspecified,
            payload,
        };
        dumper.process(&datagram, Some(protocol))?;
    } else {
        let input = cli.input.as_deref().unwrap_or("-");
        let reader: Box<dyn BufRead> = if input == "-" {
            Box::new(BufReader::new(io::stdin()))
        } else {
            let file = File::open(input).with_context(|| format!("opening {}", input))?;
            Box::new(BufReader::new(file))
        };
        dump_records(reader, &mut dumper, cli.protocol, input)?;
    }

    if cli.summary {
        let stats = dumper.stats();
        tracing::info!(
            datagrams = stats.datagrams,
            decoded = stats.decoded(),
            failed = stats.failed(),
            failure_rate = stats.failure_rate(),
            "decode finished"
        );
        dumper.write_summary()?;
    }
    dumper.finish().context("flushing output")?;
    Ok(())
}

fn load_config(cli: &Cli) -> anyhow::Result<DumpConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading config {}", path.display()))?;
            DumpConfig::from_toml_str(&text)
                .map_err(anyhow::Error::msg)
                .with_context(|| format!("loading config {}", path.display()))?
        }
        None => DumpConfig::default(),
    };
    config
        .add_ports(&cli.message_ports, &cli.stream_ports)
        .map_err(anyhow::Error::msg)?;
    Ok(config)
}

fn dump_records<W: io::Write>(
    reader: impl BufRead,
    dumper: &mut Dumper<W>,
    protocol: Option<Protocol>,
    source_name: &str,
) -> anyhow::Result<()> {
    for (idx, line) in reader.lines().enumerate() {
        let line_no = idx + 1;
        let line = line.with_context(|| format!("reading {} line {}", source_name, line_no))?;
        match record::parse_line(&line) {
            Ok(Some(datagram)) => dumper
                .process(&datagram, protocol)
                .context("writing output")?,
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(input = source_name, line = line_no, error = %e, "malformed record");
                dumper.malformed_record();
            }
        }
    }
    Ok(())
}
