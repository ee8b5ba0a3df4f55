//! Sensor kinds and the immutable sample value recorded for each reading.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::SensorError;
use crate::mapping;

// ════════════════════════════════════════════════════════════════════════════
// SensorType
// ════════════════════════════════════════════════════════════════════════════

/// Motion sensors a device can report.  Partitions both history and
/// callback registration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorType {
    Accelerometer,
    Gyroscope,
    /// Compass.
    Magnetometer,
    Gravity,
    UserAcceleration,
}

impl SensorType {
    /// Every sensor type, in declaration order.
    pub const ALL: [SensorType; 5] = [
        SensorType::Accelerometer,
        SensorType::Gyroscope,
        SensorType::Magnetometer,
        SensorType::Gravity,
        SensorType::UserAcceleration,
    ];

    /// Wire / record name, e.g. `"user_acceleration"`.
    pub fn name(self) -> &'static str {
        match self {
            SensorType::Accelerometer    => "accelerometer",
            SensorType::Gyroscope        => "gyroscope",
            SensorType::Magnetometer     => "magnetometer",
            SensorType::Gravity          => "gravity",
            SensorType::UserAcceleration => "user_acceleration",
        }
    }
}

impl fmt::Display for SensorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SensorType {
    type Err = SensorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SensorType::ALL
            .iter()
            .copied()
            .find(|t| t.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| SensorError::UnknownSensor(s.to_string()))
    }
}

// ════════════════════════════════════════════════════════════════════════════
// SensorSample
// ════════════════════════════════════════════════════════════════════════════

/// One x/y/z reading from a sensor.
///
/// Fields are private so a recorded sample can't be altered by the
/// callbacks it is handed to.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SensorSample {
    #[serde(rename = "type")]
    sensor_type: SensorType,
    x: f64,
    y: f64,
    z: f64,
    /// Seconds since the Unix epoch.
    timestamp: f64,
}

impl SensorSample {
    pub fn new(sensor_type: SensorType, x: f64, y: f64, z: f64, timestamp: f64) -> Self {
        SensorSample { sensor_type, x, y, z, timestamp }
    }

    /// Sample stamped with the current wall-clock time.
    pub fn now(sensor_type: SensorType, x: f64, y: f64, z: f64) -> Self {
        let micros = chrono::Utc::now().timestamp_micros();
        Self::new(sensor_type, x, y, z, micros as f64 / 1_000_000.0)
    }

    pub fn sensor_type(&self) -> SensorType { self.sensor_type }
    pub fn x(&self) -> f64 { self.x }
    pub fn y(&self) -> f64 { self.y }
    pub fn z(&self) -> f64 { self.z }
    pub fn timestamp(&self) -> f64 { self.timestamp }

    /// `(x, y, z)` as a tuple.
    pub fn vector(&self) -> (f64, f64, f64) {
        (self.x, self.y, self.z)
    }

    /// Euclidean norm of the reading.
    pub fn magnitude(&self) -> f64 {
        mapping::magnitude(self.x, self.y, self.z)
    }

    /// Unit-length copy of the reading (zero stays zero).
    pub fn normalized(&self) -> (f64, f64, f64) {
        mapping::normalize(self.x, self.y, self.z)
    }

    /// Plain structured record: `{type, x, y, z, timestamp}`.
    pub fn to_record(&self) -> serde_json::Value {
        serde_json::json!(self)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
