use std::path::Path;

use serde::{Deserialize, Serialize};

use sensor_dispatch::Destination;
use sensor_stream::{SensorType, HISTORY_CAPACITY};

use crate::error::ConfigError;

// ---------------------------------------------------------------------------
// Serde default functions
// ---------------------------------------------------------------------------

fn default_osc_target() -> String {
    "localhost:8000".into()
}
fn default_osc_prefix() -> String {
    "/sensor".into()
}
const fn default_true() -> bool {
    true
}
const fn default_magnitude_scale() -> f64 {
    20.0
}
const fn default_velocity_scale() -> f64 {
    10.0
}
const fn default_axis_range() -> [f64; 2] {
    [-2.0, 2.0]
}
const fn default_history_capacity() -> usize {
    HISTORY_CAPACITY
}
const fn default_sample_interval_ms() -> u64 {
    100
}
const fn default_sample_count() -> usize {
    10
}
fn default_sensors() -> Vec<SensorType> {
    vec![SensorType::Accelerometer]
}
fn default_log_filter() -> String {
    "info".into()
}

// ---------------------------------------------------------------------------
// InstrumentConfig
// ---------------------------------------------------------------------------

/// Settings for one installation run, usually read from a TOML file.
///
/// Every field has a default, so an empty file is a valid configuration.
///
/// ```toml
/// osc_target = "192.168.1.20:9000"
/// midi_channel = 2
/// sensors = ["accelerometer", "gyroscope"]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentConfig {
    /// OSC receiver as `host:port`.
    #[serde(default = "default_osc_target")]
    pub osc_target: String,

    /// Address prefix; messages go to `{prefix}/{sensor}`.
    #[serde(default = "default_osc_prefix")]
    pub osc_prefix: String,

    /// Try to open a MIDI output at startup.
    #[serde(default = "default_true")]
    pub midi_enabled: bool,

    /// MIDI channel 0–15.
    #[serde(default)]
    pub midi_channel: u8,

    /// Prefer a MIDI port whose name contains this text.
    #[serde(default)]
    pub midi_port_hint: Option<String>,

    /// Sample magnitude that maps to the top MIDI note.
    #[serde(default = "default_magnitude_scale")]
    pub magnitude_scale: f64,

    /// |y| that maps to full velocity.
    #[serde(default = "default_velocity_scale")]
    pub velocity_scale: f64,

    /// Raw axis range `[low, high]` remapped onto 0–1 for the tilt messages.
    #[serde(default = "default_axis_range")]
    pub axis_range: [f64; 2],

    /// Samples kept per sensor type.
    #[serde(default = "default_history_capacity")]
    pub history_capacity: usize,

    /// Delay between simulated samples.
    #[serde(default = "default_sample_interval_ms")]
    pub sample_interval_ms: u64,

    /// Number of simulated ticks per run.
    #[serde(default = "default_sample_count")]
    pub sample_count: usize,

    /// Seed for the simulated source; random when unset.
    #[serde(default)]
    pub seed: Option<u64>,

    /// Sensors to route.
    #[serde(default = "default_sensors")]
    pub sensors: Vec<SensorType>,

    /// Fallback `tracing` filter when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

impl Default for InstrumentConfig {
    fn default() -> Self {
        Self {
            osc_target:         default_osc_target(),
            osc_prefix:         default_osc_prefix(),
            midi_enabled:       true,
            midi_channel:       0,
            midi_port_hint:     None,
            magnitude_scale:    default_magnitude_scale(),
            velocity_scale:     default_velocity_scale(),
            axis_range:         default_axis_range(),
            history_capacity:   default_history_capacity(),
            sample_interval_ms: default_sample_interval_ms(),
            sample_count:       default_sample_count(),
            seed:               None,
            sensors:            default_sensors(),
            log_filter:         default_log_filter(),
        }
    }
}

impl InstrumentConfig {
    /// Parse a TOML document and validate it.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let cfg: Self = toml::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read, parse and validate a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Validate configuration. Returns Err on invalid values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field: &'static str, message: String| {
            Err(ConfigError::InvalidValue { field, message })
        };

        if let Err(e) = Destination::parse(&self.osc_target) {
            return invalid("osc_target", e.to_string());
        }
        if !self.osc_prefix.starts_with('/') {
            return invalid("osc_prefix", format!("{:?} must start with '/'", self.osc_prefix));
        }
        if self.midi_channel > 15 {
            return invalid("midi_channel", format!("{} (must be 0–15)", self.midi_channel));
        }
        if !(self.magnitude_scale > 0.0) {
            return invalid("magnitude_scale", format!("{} (must be > 0)", self.magnitude_scale));
        }
        if !(self.velocity_scale > 0.0) {
            return invalid("velocity_scale", format!("{} (must be > 0)", self.velocity_scale));
        }
        let [lo, hi] = self.axis_range;
        if lo == hi {
            return invalid("axis_range", format!("[{}, {}] has zero width", lo, hi));
        }
        if self.history_capacity == 0 {
            return invalid("history_capacity", "must be > 0".into());
        }
        if self.sensors.is_empty() {
            return invalid("sensors", "at least one sensor is required".into());
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        let cfg = InstrumentConfig::default();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.osc_target, "localhost:8000");
        assert_eq!(cfg.history_capacity, 100);
    }

    #[test]
    fn empty_toml_equals_default() {
        let cfg = InstrumentConfig::from_toml_str("").unwrap();
        assert_eq!(cfg, InstrumentConfig::default());
    }

    #[test]
    fn toml_overrides() {
        let cfg = InstrumentConfig::from_toml_str(
            r#"
            osc_target = "10.0.0.5:9000"
            midi_channel = 3
            midi_port_hint = "IAC"
            sensors = ["gyroscope", "user_acceleration"]
            seed = 7
            "#,
        )
        .unwrap();
        assert_eq!(cfg.osc_target, "10.0.0.5:9000");
        assert_eq!(cfg.midi_channel, 3);
        assert_eq!(cfg.midi_port_hint.as_deref(), Some("IAC"));
        assert_eq!(cfg.sensors, vec![SensorType::Gyroscope, SensorType::UserAcceleration]);
        assert_eq!(cfg.seed, Some(7));
    }

    #[test]
    fn unknown_sensor_is_parse_error() {
        let err = InstrumentConfig::from_toml_str(r#"sensors = ["barometer"]"#).unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let cases = [
            ("osc_target", r#"osc_target = "localhost""#),
            ("osc_prefix", r#"osc_prefix = "sensor""#),
            ("midi_channel", "midi_channel = 16"),
            ("magnitude_scale", "magnitude_scale = 0.0"),
            ("velocity_scale", "velocity_scale = -1.0"),
            ("axis_range", "axis_range = [1.0, 1.0]"),
            ("history_capacity", "history_capacity = 0"),
            ("sensors", "sensors = []"),
        ];
        for (field, doc) in cases {
            match InstrumentConfig::from_toml_str(doc) {
                Err(ConfigError::InvalidValue { field: f, .. }) => assert_eq!(f, field),
                other => panic!("{}: expected InvalidValue, got {:?}", field, other),
            }
        }
    }

    #[test]
    fn from_file_reads_toml() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        writeln!(f, "sample_count = 3").unwrap();
        let cfg = InstrumentConfig::from_file(f.path()).unwrap();
        assert_eq!(cfg.sample_count, 3);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = InstrumentConfig::from_file("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
