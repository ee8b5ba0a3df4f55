use std::any::Any;

use thiserror::Error;

use crate::sample::SensorType;

/// Numeric-domain errors from the range mapper.
///
/// These indicate a configuration mistake (a degenerate source range), so
/// they are returned to the caller rather than absorbed.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum MappingError {
    #[error("degenerate source range: from_min == from_max == {0}")]
    DegenerateRange(f64),
}

/// Failures raised by subscriber callbacks during fan-out.
///
/// The store never returns these to the producer; they are logged at the
/// fan-out boundary and the next callback runs.
#[derive(Debug, Error)]
pub enum SensorError {
    #[error("callback #{index} for {sensor} failed: {reason}")]
    Callback {
        sensor: SensorType,
        index: usize,
        reason: String,
    },

    #[error("callback #{index} for {sensor} panicked: {message}")]
    CallbackPanicked {
        sensor: SensorType,
        index: usize,
        message: String,
    },

    #[error("unknown sensor type: {0}")]
    UnknownSensor(String),
}

/// Text of a caught panic payload, for logging.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::panic;

    #[test]
    fn panic_message_reads_str_and_string_payloads() {
        let p = panic::catch_unwind(|| panic!("plain")).unwrap_err();
        assert_eq!(panic_message(p.as_ref()), "plain");
        let p = panic::catch_unwind(|| panic!("formatted {}", 7)).unwrap_err();
        assert_eq!(panic_message(p.as_ref()), "formatted 7");
        let p = panic::catch_unwind(|| panic::panic_any(42u8)).unwrap_err();
        assert_eq!(panic_message(p.as_ref()), "non-string panic payload");
    }
}
