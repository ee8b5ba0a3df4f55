//! # sensor_instrument
//!
//! Turns a phone's motion sensors into an instrument.  Samples arrive from
//! a [`SampleSource`](source::SampleSource), are buffered per sensor in a
//! [`SensorStore`](sensor_stream::SensorStore), and fan out to routes that
//! emit OSC messages and MIDI notes through a
//! [`DispatchManager`](sensor_dispatch::DispatchManager).
//!
//! ## Sensor → message routes
//!
//! | Route | Output | Mapping |
//! |---|---|---|
//! | OSC | `{prefix}/{sensor}` `[nx, ny, nz]` | unit vector |
//! | Tilt | `{prefix}/{sensor}/tilt` `[x', y', z']` | `axis_range` → 0–1 per axis |
//! | MIDI | note-on on `midi_channel` | note ∝ magnitude / `magnitude_scale`, velocity ∝ \|y\| / `velocity_scale` |
//!
//! ## Sources
//!
//! * `SimSampleSource` — seeded random readings at a fixed interval.
//! * `ScriptedSource` — replays a prepared list (tests, recorded sessions).
//!
//! ## Configuration
//!
//! [`InstrumentConfig`](config::InstrumentConfig) is read from TOML; every
//! field has a default.  `RUST_LOG` overrides the configured log filter.

pub mod app;
pub mod config;
pub mod error;
pub mod logging;
pub mod routes;
pub mod source;

pub use app::{Instrument, RunSummary};
pub use config::InstrumentConfig;
pub use error::{ConfigError, InstrumentError};
