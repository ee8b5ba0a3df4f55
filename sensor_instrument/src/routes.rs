//! Sensor → message routes.
//!
//! Each route is a store callback that maps a sample and hands the result
//! to the dispatcher.
//!
//! | Route | Address / event | Mapping |
//! |---|---|---|
//! | [`osc_route`]  | `{prefix}/{sensor}` `[nx, ny, nz]` | unit vector |
//! | [`tilt_route`] | `{prefix}/{sensor}/tilt` `[x', y', z']` | `axis_range` → 0–1, unclamped |
//! | [`midi_route`] | note-on on `channel` | note ∝ magnitude, velocity ∝ \|y\| |

use std::sync::Arc;

use sensor_dispatch::{DispatchManager, MidiEvent, OscMessage};
use sensor_stream::{mapping, CallbackResult, SensorSample};

use crate::config::InstrumentConfig;

/// Per-route settings, taken from [`InstrumentConfig`].
#[derive(Clone, Debug, PartialEq)]
pub struct RouteConfig {
    pub target:          String,
    pub prefix:          String,
    pub channel:         u8,
    pub magnitude_scale: f64,
    pub velocity_scale:  f64,
    pub axis_range:      [f64; 2],
}

impl From<&InstrumentConfig> for RouteConfig {
    fn from(cfg: &InstrumentConfig) -> Self {
        RouteConfig {
            target:          cfg.osc_target.clone(),
            prefix:          cfg.osc_prefix.trim_end_matches('/').to_string(),
            channel:         cfg.midi_channel,
            magnitude_scale: cfg.magnitude_scale,
            velocity_scale:  cfg.velocity_scale,
            axis_range:      cfg.axis_range,
        }
    }
}

/// Normalised vector as an OSC message.
pub fn osc_route(
    dispatch: Arc<DispatchManager>,
    route:    RouteConfig,
) -> impl Fn(&SensorSample) -> CallbackResult + Send + Sync + 'static {
    move |sample: &SensorSample| {
        let (nx, ny, nz) = sample.normalized();
        let msg = OscMessage::new(
            format!("{}/{}", route.prefix, sample.sensor_type()),
            vec![nx.into(), ny.into(), nz.into()],
        );
        dispatch.send_osc(msg, &route.target);
        Ok(())
    }
}

/// Each axis remapped from `axis_range` onto 0–1 as an OSC message.
///
/// Readings outside the range extrapolate.  A zero-width range is an error
/// returned to the store, which logs it.
pub fn tilt_route(
    dispatch: Arc<DispatchManager>,
    route:    RouteConfig,
) -> impl Fn(&SensorSample) -> CallbackResult + Send + Sync + 'static {
    move |sample: &SensorSample| {
        let [lo, hi] = route.axis_range;
        let x = mapping::map_range(sample.x(), lo, hi, 0.0, 1.0)?;
        let y = mapping::map_range(sample.y(), lo, hi, 0.0, 1.0)?;
        let z = mapping::map_range(sample.z(), lo, hi, 0.0, 1.0)?;
        let msg = OscMessage::new(
            format!("{}/{}/tilt", route.prefix, sample.sensor_type()),
            vec![x.into(), y.into(), z.into()],
        );
        dispatch.send_osc(msg, &route.target);
        Ok(())
    }
}

/// Note from the vector magnitude, velocity from `|y|`.
pub fn midi_route(
    dispatch: Arc<DispatchManager>,
    route:    RouteConfig,
) -> impl Fn(&SensorSample) -> CallbackResult + Send + Sync + 'static {
    move |sample: &SensorSample| {
        let note = dispatch.map_sensor_to_midi(sample.magnitude() / route.magnitude_scale);
        let velocity = dispatch.map_sensor_to_midi(sample.y().abs() / route.velocity_scale);
        dispatch.send_midi(MidiEvent::on_channel(note, velocity, route.channel));
        Ok(())
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
