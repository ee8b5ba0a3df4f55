//! # sensor_stream
//!
//! Typed motion-sensor samples (accelerometer-style x/y/z triples), a
//! bounded per-sensor ring history with subscriber fan-out, and the pure
//! range-mapping helpers used to turn raw readings into control values.
//!
//! ## Quick start
//!
//! ```rust
//! use sensor_stream::{SensorStore, SensorSample, SensorType, mapping};
//!
//! let store = SensorStore::new();
//! store.register_callback(SensorType::Accelerometer, |s| {
//!     let note = mapping::map_to_midi_note(s.magnitude() / 20.0);
//!     assert!(note <= 127);
//!     Ok(())
//! });
//!
//! store.record_data(
//!     SensorType::Accelerometer,
//!     SensorSample::new(SensorType::Accelerometer, 0.1, 9.8, 0.2, 1_700_000_000.0),
//! );
//! assert_eq!(store.get_data(SensorType::Accelerometer, None).len(), 1);
//! ```
//!
//! ## History
//!
//! Each [`SensorType`] keeps at most [`HISTORY_CAPACITY`] samples.  The
//! oldest sample is evicted first.
//!
//! ## Callback isolation
//!
//! Callbacks run synchronously, in registration order, on the thread that
//! called [`SensorStore::record_data`].  A callback that returns an error or
//! panics is logged and skipped; the remaining callbacks still run and the
//! sample stays recorded.

pub mod error;
pub mod mapping;
pub mod sample;
pub mod store;

pub use error::{panic_message, MappingError, SensorError};
pub use sample::{SensorSample, SensorType};
pub use store::{CallbackResult, SensorCallback, SensorStore, HISTORY_CAPACITY};
