//! Outbound message values: OSC messages and MIDI note events.
//!
//! Both are immutable once built and carry the wall-clock time they were
//! created at.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ════════════════════════════════════════════════════════════════════════════
// OscArg
// ════════════════════════════════════════════════════════════════════════════

/// One OSC argument.
///
/// Serialises untagged, so a record's `args` reads `[1, 2.5, "hello", true]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OscArg {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
}

impl fmt::Display for OscArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OscArg::Int(i)   => write!(f, "{}", i),
            OscArg::Float(v) => write!(f, "{}", v),
            OscArg::Str(s)   => write!(f, "{:?}", s),
            OscArg::Bool(b)  => write!(f, "{}", b),
        }
    }
}

impl From<i32> for OscArg {
    fn from(v: i32) -> Self {
        OscArg::Int(v as i64)
    }
}

impl From<i64> for OscArg {
    fn from(v: i64) -> Self {
        OscArg::Int(v)
    }
}

impl From<f32> for OscArg {
    fn from(v: f32) -> Self {
        OscArg::Float(v as f64)
    }
}

impl From<f64> for OscArg {
    fn from(v: f64) -> Self {
        OscArg::Float(v)
    }
}

impl From<bool> for OscArg {
    fn from(v: bool) -> Self {
        OscArg::Bool(v)
    }
}

impl From<&str> for OscArg {
    fn from(v: &str) -> Self {
        OscArg::Str(v.to_string())
    }
}

impl From<String> for OscArg {
    fn from(v: String) -> Self {
        OscArg::Str(v)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// OscMessage
// ════════════════════════════════════════════════════════════════════════════

/// An OSC address plus its ordered argument list.
///
/// ```rust
/// use sensor_dispatch::{OscArg, OscMessage};
///
/// let msg = OscMessage::new("/sensor/accelerometer", vec![0.6.into(), 0.8.into(), 0.0.into()]);
/// assert_eq!(msg.args()[1], OscArg::Float(0.8));
/// assert_eq!(msg.to_string(), "/sensor/accelerometer [0.6, 0.8, 0]");
/// ```
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct OscMessage {
    address: String,
    args: Vec<OscArg>,
    #[serde(rename = "timestamp")]
    created_at: DateTime<Utc>,
}

impl OscMessage {
    pub fn new(address: impl Into<String>, args: Vec<OscArg>) -> Self {
        OscMessage { address: address.into(), args, created_at: Utc::now() }
    }

    /// Message with no arguments.
    pub fn bare(address: impl Into<String>) -> Self {
        Self::new(address, Vec::new())
    }

    pub fn address(&self) -> &str { &self.address }
    pub fn args(&self) -> &[OscArg] { &self.args }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }

    /// `{address, args, timestamp}` with an RFC 3339 timestamp.
    pub fn to_record(&self) -> serde_json::Value {
        serde_json::json!(self)
    }
}

impl fmt::Display for OscMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [", self.address)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 { f.write_str(", ")?; }
            write!(f, "{}", arg)?;
        }
        f.write_str("]")
    }
}

// ════════════════════════════════════════════════════════════════════════════
// MidiEvent
// ════════════════════════════════════════════════════════════════════════════

/// A MIDI note-on: note, velocity and channel.
///
/// Values are kept exactly as given.  Range limits are applied only when
/// the wire frame is built (see [`MidiEvent::note_on_frame`]).
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MidiEvent {
    note:     u8,
    velocity: u8,
    channel:  u8,
    #[serde(rename = "timestamp")]
    created_at: DateTime<Utc>,
}

impl MidiEvent {
    /// Note-on for channel 0.
    pub fn new(note: u8, velocity: u8) -> Self {
        Self::on_channel(note, velocity, 0)
    }

    pub fn on_channel(note: u8, velocity: u8, channel: u8) -> Self {
        MidiEvent { note, velocity, channel, created_at: Utc::now() }
    }

    pub fn note(&self) -> u8 { self.note }
    pub fn velocity(&self) -> u8 { self.velocity }
    pub fn channel(&self) -> u8 { self.channel }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }

    /// Three-byte note-on frame: `[0x90 | ch, note, velocity]`.
    ///
    /// The channel is masked to 4 bits and the data bytes to 7 bits.
    pub fn note_on_frame(&self) -> [u8; 3] {
        [0x90 | (self.channel & 0x0F), self.note & 0x7F, self.velocity & 0x7F]
    }

    /// `{note, velocity, channel, timestamp}` with an RFC 3339 timestamp.
    pub fn to_record(&self) -> serde_json::Value {
        serde_json::json!(self)
    }
}

impl fmt::Display for MidiEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MIDI[ch{}] note={} vel={}", self.channel, self.note, self.velocity)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
