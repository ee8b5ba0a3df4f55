//! Transport capabilities the dispatcher sends through.
//!
//! The dispatcher never speaks OSC or MIDI on the wire itself.  It is given
//! an [`OscTransport`] (opens one [`OscSender`] per destination) and/or a
//! [`MidiPort`] (connects one [`MidiOut`]).  Either may be absent.
//!
//! [`MidirPort`] is the real MIDI backend, built on `midir`.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use tracing::{info, warn};

use crate::message::OscMessage;

// ════════════════════════════════════════════════════════════════════════════
// TransportError
// ════════════════════════════════════════════════════════════════════════════

/// Anything that can go wrong below the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("invalid destination {0:?}: expected host:port")]
    InvalidDestination(String),

    #[error("cannot open {destination}: {reason}")]
    Open { destination: String, reason: String },

    #[error("send failed: {0}")]
    Send(String),

    #[error("MIDI init error: {0}")]
    MidiInit(String),

    #[error("no MIDI output ports found")]
    NoMidiPorts,

    #[error("MIDI connect failed: {0}")]
    MidiConnect(String),
}

// ════════════════════════════════════════════════════════════════════════════
// Destination
// ════════════════════════════════════════════════════════════════════════════

/// A `host:port` network endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Destination {
    pub host: String,
    pub port: u16,
}

impl Destination {
    /// Parse `"host:port"`, splitting on the first colon.
    ///
    /// ```rust
    /// use sensor_dispatch::Destination;
    ///
    /// let d = Destination::parse("localhost:8000").unwrap();
    /// assert_eq!((d.host.as_str(), d.port), ("localhost", 8000));
    /// assert!(Destination::parse("localhost").is_err());
    /// ```
    pub fn parse(s: &str) -> Result<Self, TransportError> {
        let invalid = || TransportError::InvalidDestination(s.to_string());
        let (host, port) = s.split_once(':').ok_or_else(invalid)?;
        if host.is_empty() {
            return Err(invalid());
        }
        let port = port.parse::<u16>().map_err(|_| invalid())?;
        Ok(Destination { host: host.to_string(), port })
    }
}

impl FromStr for Destination {
    type Err = TransportError;
    fn from_str(s: &str) -> Result<Self, Self::Err> { Destination::parse(s) }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Capability traits
// ════════════════════════════════════════════════════════════════════════════

/// Opens OSC senders for network destinations.
pub trait OscTransport: Send {
    fn open(&mut self, destination: &Destination) -> Result<Box<dyn OscSender>, TransportError>;
}

/// An open OSC handle bound to one destination.
pub trait OscSender: Send {
    fn send(&mut self, message: &OscMessage) -> Result<(), TransportError>;
}

/// Connects to a MIDI output device.
pub trait MidiPort: Send {
    fn connect(&mut self) -> Result<Box<dyn MidiOut>, TransportError>;
}

/// An open MIDI output.  Receives raw channel-voice frames.
pub trait MidiOut: Send {
    fn send(&mut self, frame: &[u8]) -> Result<(), TransportError>;
}

// ════════════════════════════════════════════════════════════════════════════
// MidirPort — real MIDI output via midir
// ════════════════════════════════════════════════════════════════════════════

struct MidirOut {
    conn: midir::MidiOutputConnection,
}

impl MidiOut for MidirOut {
    fn send(&mut self, frame: &[u8]) -> Result<(), TransportError> {
        self.conn.send(frame).map_err(|e| TransportError::Send(e.to_string()))
    }
}

/// Opens a system MIDI output port through `midir`.
///
/// Port choice: the first port whose name contains `hint` (case-insensitive)
/// if a hint is set, otherwise the first software synth that is visible,
/// otherwise port 0.
#[derive(Clone, Debug)]
pub struct MidirPort {
    client_name: String,
    hint: Option<String>,
}

impl MidirPort {
    pub fn new(client_name: impl Into<String>) -> Self {
        MidirPort { client_name: client_name.into(), hint: None }
    }

    /// Prefer ports whose name contains `hint`.
    pub fn prefer(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into().to_lowercase());
        self
    }
}

impl MidiPort for MidirPort {
    fn connect(&mut self) -> Result<Box<dyn MidiOut>, TransportError> {
        let midi_out = midir::MidiOutput::new(&self.client_name)
            .map_err(|e| TransportError::MidiInit(e.to_string()))?;

        let ports = midi_out.ports();
        if ports.is_empty() {
            warn!("no MIDI output ports found; install a synth such as `timidity -iA` or `fluidsynth`");
            return Err(TransportError::NoMidiPorts);
        }

        let names: Vec<String> = ports
            .iter()
            .map(|p| midi_out.port_name(p).unwrap_or_default().to_lowercase())
            .collect();
        let port_idx = pick_port(&names, self.hint.as_deref());

        let port = &ports[port_idx];
        let name = midi_out.port_name(port).unwrap_or_else(|_| "Unknown".to_string());
        info!(port = %name, "opening MIDI output");

        let conn = midi_out
            .connect(port, &self.client_name)
            .map_err(|e| TransportError::MidiConnect(e.to_string()))?;
        Ok(Box::new(MidirOut { conn }))
    }
}

/// Index of the port to open, given lower-cased port names.
fn pick_port(names: &[String], hint: Option<&str>) -> usize {
    const SYNTHS: [&str; 5] = ["fluid", "timidity", "microsoft", "gm", "synth"];

    if let Some(h) = hint {
        if let Some(i) = names.iter().position(|n| n.contains(h)) {
            return i;
        }
        warn!(hint = h, "no MIDI port matches hint; falling back");
    }
    names
        .iter()
        .position(|n| SYNTHS.iter().any(|s| n.contains(s)))
        .unwrap_or(0)
}

/// Names of the MIDI output ports currently visible to `midir`.
pub fn list_midi_ports() -> Result<Vec<String>, TransportError> {
    let midi_out = midir::MidiOutput::new("sensor_dispatch_probe")
        .map_err(|e| TransportError::MidiInit(e.to_string()))?;
    Ok(midi_out
        .ports()
        .iter()
        .map(|p| midi_out.port_name(p).unwrap_or_else(|_| "Unknown".to_string()))
        .collect())
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    // ── Destination ──────────────────────────────────────────────────────
    #[test]
    fn parse_host_port() {
        let d = Destination::parse("192.168.1.20:9000").unwrap();
        assert_eq!(d.host, "192.168.1.20");
        assert_eq!(d.port, 9000);
        assert_eq!(d.to_string(), "192.168.1.20:9000");
    }

    #[test]
    fn parse_splits_on_first_colon() {
        // "a:b:c" → host "a", port "b:c" which is not a number
        assert_eq!(
            Destination::parse("a:1:2"),
            Err(TransportError::InvalidDestination("a:1:2".into()))
        );
    }

    #[test]
    fn parse_rejects_bad_input() {
        for bad in ["localhost", ":8000", "localhost:", "localhost:99999", "host:port"] {
            assert!(Destination::parse(bad).is_err(), "{} should fail", bad);
        }
    }

    #[test]
    fn from_str_delegates() {
        let d: Destination = "localhost:8000".parse().unwrap();
        assert_eq!(d.port, 8000);
    }

    // ── port selection ───────────────────────────────────────────────────
    fn names(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_lowercase()).collect()
    }

    #[test]
    fn pick_port_prefers_hint() {
        let n = names(&["Midi Through", "FLUID Synth", "IAC Bus 1"]);
        assert_eq!(pick_port(&n, Some("iac")), 2);
    }

    #[test]
    fn pick_port_prefers_softsynth() {
        let n = names(&["Midi Through", "FLUID Synth"]);
        assert_eq!(pick_port(&n, None), 1);
        assert_eq!(pick_port(&n, Some("missing")), 1);
    }

    #[test]
    fn pick_port_defaults_to_first() {
        let n = names(&["Port A", "Port B"]);
        assert_eq!(pick_port(&n, None), 0);
    }
}
