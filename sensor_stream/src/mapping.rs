//! Pure range-mapping helpers: vector magnitude, normalisation and linear
//! remapping onto OSC and MIDI value ranges.
//!
//! Nothing here has side effects.

use crate::error::MappingError;

/// Euclidean norm `sqrt(x² + y² + z²)`.
pub fn magnitude(x: f64, y: f64, z: f64) -> f64 {
    (x * x + y * y + z * z).sqrt()
}

/// Scale `(x, y, z)` to unit length.
///
/// The zero vector maps to `(0, 0, 0)` instead of dividing by zero.
pub fn normalize(x: f64, y: f64, z: f64) -> (f64, f64, f64) {
    let m = magnitude(x, y, z);
    if m == 0.0 {
        return (0.0, 0.0, 0.0);
    }
    (x / m, y / m, z / m)
}

/// Affine remap of `value` from `[from_min, from_max]` onto `[to_min, to_max]`.
///
/// The result is not clamped: values outside the source range extrapolate
/// linearly.  A zero-width source range is an error.
///
/// ```rust
/// use sensor_stream::mapping::map_range;
///
/// assert_eq!(map_range(0.5, 0.0, 1.0, -100.0, 100.0).unwrap(), 0.0);
/// assert_eq!(map_range(2.0, 0.0, 1.0, 0.0, 100.0).unwrap(), 200.0);
/// assert!(map_range(1.0, 3.0, 3.0, 0.0, 1.0).is_err());
/// ```
pub fn map_range(
    value:    f64,
    from_min: f64,
    from_max: f64,
    to_min:   f64,
    to_max:   f64,
) -> Result<f64, MappingError> {
    let span = from_max - from_min;
    if span == 0.0 {
        return Err(MappingError::DegenerateRange(from_min));
    }
    Ok((value - from_min) / span * (to_max - to_min) + to_min)
}

/// Clamp `value` to `[0, 1]`, then map it onto `[min, max]`.
///
/// Inputs on the sensor → OSC path are expected to be pre-normalised
/// magnitudes, hence the unit clamp.
pub fn map_to_osc_range(value: f64, min: f64, max: f64) -> f64 {
    let unit = clamp_unit(value);
    min + (max - min) * unit
}

/// Clamp `value` to `[0, 1]` and scale to a MIDI data value, `floor(127 * v)`.
///
/// Always in `0..=127`.
pub fn map_to_midi_note(value: f64) -> u8 {
    let unit = clamp_unit(value);
    // NaN survives the clamp; the float → int cast saturates it to 0.
    (127.0 * unit).floor() as u8
}

fn clamp_unit(value: f64) -> f64 {
    value.clamp(0.0, 1.0)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    // ── magnitude ────────────────────────────────────────────────────────
    #[test]
    fn magnitude_zero_vector() {
        assert_eq!(magnitude(0.0, 0.0, 0.0), 0.0);
    }

    #[test]
    fn magnitude_pythagorean_triples() {
        assert_eq!(magnitude(3.0, 4.0, 0.0), 5.0);
        assert_eq!(magnitude(3.0, 4.0, 12.0), 13.0);
    }

    #[test]
    fn magnitude_unit_axis() {
        assert_relative_eq!(magnitude(0.0, -1.0, 0.0), 1.0);
    }

    // ── normalize ────────────────────────────────────────────────────────
    #[test]
    fn normalize_zero_vector_is_zero() {
        assert_eq!(normalize(0.0, 0.0, 0.0), (0.0, 0.0, 0.0));
    }

    #[test]
    fn normalize_has_unit_length() {
        let (x, y, z) = normalize(3.0, 4.0, 0.0);
        assert_relative_eq!(magnitude(x, y, z), 1.0, epsilon = 1e-12);
        assert_relative_eq!(x, 0.6, epsilon = 1e-12);
        assert_relative_eq!(y, 0.8, epsilon = 1e-12);
    }

    #[test]
    fn normalize_diagonal() {
        let inv = 1.0 / 3f64.sqrt();
        let (x, y, z) = normalize(1.0, 1.0, 1.0);
        assert_relative_eq!(x, inv, epsilon = 1e-12);
        assert_relative_eq!(y, inv, epsilon = 1e-12);
        assert_relative_eq!(z, inv, epsilon = 1e-12);
    }

    #[test]
    fn normalize_unit_vector_unchanged() {
        assert_eq!(normalize(1.0, 0.0, 0.0), (1.0, 0.0, 0.0));
    }

    // ── map_range ────────────────────────────────────────────────────────
    #[test]
    fn map_range_endpoints() {
        assert_relative_eq!(map_range(0.0, 0.0, 1.0, 10.0, 20.0).unwrap(), 10.0);
        assert_relative_eq!(map_range(1.0, 0.0, 1.0, 10.0, 20.0).unwrap(), 20.0);
    }

    #[test]
    fn map_range_midpoint_of_symmetric_target() {
        assert_relative_eq!(map_range(0.5, 0.0, 1.0, -100.0, 100.0).unwrap(), 0.0);
    }

    #[test]
    fn map_range_extrapolates() {
        assert_relative_eq!(map_range(2.0, 0.0, 1.0, 0.0, 100.0).unwrap(), 200.0);
        assert_relative_eq!(map_range(-1.0, 0.0, 1.0, 0.0, 100.0).unwrap(), -100.0);
    }

    #[test]
    fn map_range_inverted_target() {
        assert_relative_eq!(map_range(0.25, 0.0, 1.0, 1.0, 0.0).unwrap(), 0.75);
    }

    #[test]
    fn map_range_degenerate_source_is_error() {
        assert_eq!(
            map_range(5.0, 2.0, 2.0, 0.0, 1.0),
            Err(MappingError::DegenerateRange(2.0))
        );
    }

    // ── map_to_osc_range ─────────────────────────────────────────────────
    #[test]
    fn osc_range_maps_unit_input() {
        assert_relative_eq!(map_to_osc_range(0.0, 0.0, 1.0), 0.0);
        assert_relative_eq!(map_to_osc_range(1.0, 0.0, 100.0), 100.0);
        assert_relative_eq!(map_to_osc_range(0.5, 0.0, 200.0), 100.0);
    }

    #[test]
    fn osc_range_clamps_input_first() {
        assert_relative_eq!(map_to_osc_range(3.0, 0.0, 10.0), 10.0);
        assert_relative_eq!(map_to_osc_range(-2.0, 5.0, 10.0), 5.0);
    }

    // ── map_to_midi_note ─────────────────────────────────────────────────
    #[test]
    fn midi_note_reference_points() {
        assert_eq!(map_to_midi_note(0.0), 0);
        assert_eq!(map_to_midi_note(1.0), 127);
        assert_eq!(map_to_midi_note(0.5), 63);
    }

    #[test]
    fn midi_note_clamps() {
        assert_eq!(map_to_midi_note(7.5), 127);
        assert_eq!(map_to_midi_note(-0.3), 0);
        assert_eq!(map_to_midi_note(f64::NAN), 0);
    }
}
