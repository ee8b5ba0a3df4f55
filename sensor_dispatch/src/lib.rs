//! # sensor_dispatch
//!
//! Outbound side of the sensor instrument: OSC messages and MIDI note
//! events, and a [`DispatchManager`] that pushes them through injected
//! transports while logging every attempt.
//!
//! ## Transports
//!
//! | Capability | Trait | Absent → |
//! |---|---|---|
//! | OSC over the network | [`OscTransport`] / [`OscSender`] | record with `sent = false`, failure `Unavailable` |
//! | MIDI device output | [`MidiPort`] / [`MidiOut`] | record with `sent = false`, failure `Unavailable` |
//!
//! A transport that is present but errors produces a `Transport` failure
//! instead.  Neither case is returned as an error; the log is the only
//! place failures surface, apart from the `tracing` output.
//!
//! [`MidirPort`] connects to a real MIDI output through `midir`.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use sensor_dispatch::{DispatchManager, MidiEvent, MidirPort, OscMessage};
//!
//! let dm = DispatchManager::builder()
//!     .midi_port(MidirPort::new("sensor_instrument").prefer("fluid"))
//!     .build();
//! dm.start();
//!
//! dm.send_midi(MidiEvent::new(60, 100));
//! dm.send_osc(OscMessage::new("/sensor/gyroscope", vec![0.1.into()]), "localhost:8000");
//!
//! for record in dm.get_history(Some(2)) {
//!     println!("{}", record.to_record());
//! }
//! dm.stop();
//! ```

pub mod manager;
pub mod message;
pub mod record;
pub mod transport;

pub use manager::{DispatchBuilder, DispatchManager};
pub use message::{MidiEvent, OscArg, OscMessage};
pub use record::{DispatchFailure, DispatchKind, DispatchPayload, DispatchRecord};
pub use transport::{
    list_midi_ports, Destination, MidiOut, MidiPort, MidirPort, OscSender, OscTransport,
    TransportError,
};
