use std::collections::BTreeSet;
use std::net::SocketAddr;

use mockets_wire::Protocol;
use serde::Deserialize;

pub const CONFIG_VERSION: u32 = 1;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DumpConfigInput {
    pub version: u32,
    pub ports: PortsInput,
    pub default_protocol: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PortsInput {
    pub message: Vec<u16>,
    pub stream: Vec<u16>,
}

/// Resolved dump configuration: which UDP ports carry which format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpConfig {
    pub version: u32,
    pub message_ports: BTreeSet<u16>,
    pub stream_ports: BTreeSet<u16>,
    /// Format assumed for datagrams on unmapped ports; `None` skips them.
    pub default_protocol: Option<Protocol>,
}

impl Default for DumpConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            message_ports: BTreeSet::new(),
            stream_ports: BTreeSet::new(),
            default_protocol: None,
        }
    }
}

impl DumpConfigInput {
    pub fn resolve(self) -> Result<DumpConfig, String> {
        let version = if self.version == 0 {
            CONFIG_VERSION
        } else {
            self.version
        };
        if version != CONFIG_VERSION {
            return Err(format!("Unsupported config version {}", version));
        }

        let default_protocol = match self.default_protocol.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(p) => Some(p.parse::<Protocol>()?),
        };

        let mut cfg = DumpConfig {
            version,
            default_protocol,
            ..DumpConfig::default()
        };
        cfg.add_ports(&self.ports.message, &self.ports.stream)?;
        Ok(cfg)
    }
}

impl DumpConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, String> {
        if input.trim().is_empty() {
            return Ok(DumpConfig::default());
        }
        let parsed: DumpConfigInput =
            toml::from_str(input).map_err(|e| format!("Invalid config TOML: {}", e))?;
        parsed.resolve()
    }

    /// Merge extra port mappings (from the command line) into this config.
    pub fn add_ports(&mut self, message: &[u16], stream: &[u16]) -> Result<(), String> {
        for &port in message.iter().chain(stream) {
            if port == 0 {
                return Err("Port 0 cannot be mapped".to_string());
            }
        }
        self.message_ports.extend(message.iter().copied());
        self.stream_ports.extend(stream.iter().copied());
        if let Some(port) = self.message_ports.intersection(&self.stream_ports).next() {
            return Err(format!(
                "Port {} is mapped to both message and stream formats",
                port
            ));
        }
        Ok(())
    }

    /// Pick the wire format for a datagram. The destination port wins over
    /// the source port; unmapped traffic falls back to `default_protocol`.
    pub fn classify(&self, source: &SocketAddr, destination: &SocketAddr) -> Option<Protocol> {
        [destination.port(), source.port()]
            .into_iter()
            .find_map(|port| self.protocol_for_port(port))
            .or(self.default_protocol)
    }

    fn protocol_for_port(&self, port: u16) -> Option<Protocol> {
        if self.message_ports.contains(&port) {
            Some(Protocol::Message)
        } else if self.stream_ports.contains(&port) {
            Some(Protocol::Stream)
        } else {
            None
        }
    }
}
