//! Sample sources: anything that produces [`SensorSample`]s.
//!
//! A source runs on its own thread and hands samples over an `mpsc`
//! channel; the consumer records them into the store on its own thread.
//! Consumers don't need to know whether samples come from a device bridge,
//! the simulator or a fixed script.

use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sensor_stream::{SensorSample, SensorType};
use tracing::{debug, warn};

// ════════════════════════════════════════════════════════════════════════════
// SampleSource trait
// ════════════════════════════════════════════════════════════════════════════

/// Anything that can deliver [`SensorSample`]s over a channel.
///
/// `run` returns when the source is exhausted or the receiver hangs up.
pub trait SampleSource: Send + 'static {
    fn run(self: Box<Self>, tx: Sender<SensorSample>);
}

/// Spawn a sample source on its own thread and return the receiving end.
pub fn spawn_sample_source<S: SampleSource>(source: S) -> Receiver<SensorSample> {
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || Box::new(source).run(tx));
    rx
}

// ════════════════════════════════════════════════════════════════════════════
// SimSampleSource — random readings at a fixed rate
// ════════════════════════════════════════════════════════════════════════════

/// Axis range of [`SimSampleSource`] unless set otherwise.
pub const DEFAULT_AMPLITUDE: f64 = 2.0;

/// Simulated device: every tick emits one sample per configured sensor with
/// each axis drawn uniformly from `[-amplitude, amplitude]`.
pub struct SimSampleSource {
    sensors:   Vec<SensorType>,
    ticks:     usize,
    interval:  Duration,
    amplitude: f64,
    rng:       ChaCha8Rng,
}

impl SimSampleSource {
    /// `ticks` rounds of samples, `interval` apart.  A fixed `seed` makes
    /// the readings reproducible.
    pub fn new(sensors: Vec<SensorType>, ticks: usize, interval: Duration, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => ChaCha8Rng::seed_from_u64(s),
            None    => ChaCha8Rng::from_entropy(),
        };
        SimSampleSource { sensors, ticks, interval, amplitude: DEFAULT_AMPLITUDE, rng }
    }

    /// Axis range; readings fall in `[-amplitude, amplitude]`.
    ///
    /// A value that is not finite, or too large for the span to be finite,
    /// keeps [`DEFAULT_AMPLITUDE`].
    pub fn amplitude(mut self, amplitude: f64) -> Self {
        let a = amplitude.abs();
        if a.is_finite() && a <= f64::MAX / 2.0 {
            self.amplitude = a;
        } else {
            warn!(amplitude, "unusable amplitude; keeping default {}", DEFAULT_AMPLITUDE);
            self.amplitude = DEFAULT_AMPLITUDE;
        }
        self
    }

    fn next_sample(&mut self, sensor: SensorType) -> SensorSample {
        let a = self.amplitude;
        if a == 0.0 {
            return SensorSample::now(sensor, 0.0, 0.0, 0.0);
        }
        let x = self.rng.gen_range(-a..=a);
        let y = self.rng.gen_range(-a..=a);
        let z = self.rng.gen_range(-a..=a);
        SensorSample::now(sensor, x, y, z)
    }
}

impl SampleSource for SimSampleSource {
    fn run(mut self: Box<Self>, tx: Sender<SensorSample>) {
        for tick in 0..self.ticks {
            if tick > 0 && !self.interval.is_zero() {
                thread::sleep(self.interval);
            }
            for i in 0..self.sensors.len() {
                let sample = self.next_sample(self.sensors[i]);
                if tx.send(sample).is_err() {
                    debug!("sample receiver closed; simulator exiting");
                    return;
                }
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ScriptedSource — replays a fixed list
// ════════════════════════════════════════════════════════════════════════════

/// Replays a prepared list of samples, in order, without delay.
pub struct ScriptedSource {
    samples: Vec<SensorSample>,
}

impl ScriptedSource {
    pub fn new(samples: Vec<SensorSample>) -> Self {
        ScriptedSource { samples }
    }
}

impl SampleSource for ScriptedSource {
    fn run(self: Box<Self>, tx: Sender<SensorSample>) {
        for sample in self.samples {
            if tx.send(sample).is_err() {
                return;
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
