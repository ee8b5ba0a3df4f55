//! Top-level application: one store, one dispatcher, routes between them.
//!
//! `Instrument` owns both managers.  `run` drains a [`SampleSource`] into
//! the store; the registered routes turn each sample into OSC and MIDI
//! traffic on the caller's thread.

use std::sync::Arc;
use std::time::Duration;

use sensor_dispatch::{DispatchManager, MidiPort, MidirPort};
use sensor_stream::SensorStore;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::InstrumentConfig;
use crate::error::InstrumentError;
use crate::routes::{midi_route, osc_route, tilt_route, RouteConfig};
use crate::source::{spawn_sample_source, SampleSource, SimSampleSource};

/// Counts from one [`Instrument::run`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Samples recorded into the store.
    pub samples: usize,
    /// Dispatch records added during the run.
    pub records: usize,
    /// Of those, how many reached a transport.
    pub sent:    usize,
}

pub struct Instrument {
    config:   InstrumentConfig,
    store:    Arc<SensorStore>,
    dispatch: Arc<DispatchManager>,
}

impl Instrument {
    /// Validate `config` and wire up the real MIDI backend when enabled.
    ///
    /// No OSC transport is installed, so OSC sends are logged unsent.
    pub fn new(config: InstrumentConfig) -> Result<Self, InstrumentError> {
        let port = config.midi_enabled.then(|| {
            let port = MidirPort::new("sensor_instrument");
            match &config.midi_port_hint {
                Some(hint) => port.prefer(hint.clone()),
                None => port,
            }
        });
        Self::with_midi(config, port)
    }

    /// Validate `config`, then connect `midi` (if any).  An invalid config
    /// never touches the device.
    pub fn with_midi<P: MidiPort + 'static>(config: InstrumentConfig, midi: Option<P>) -> Result<Self, InstrumentError> {
        config.validate()?;
        let mut builder = DispatchManager::builder();
        if let Some(port) = midi {
            builder = builder.midi_port(port);
        }
        Self::with_dispatch(config, builder.build())
    }

    /// Use a prebuilt dispatcher (custom transports).
    pub fn with_dispatch(config: InstrumentConfig, dispatch: DispatchManager) -> Result<Self, InstrumentError> {
        config.validate()?;

        let store = Arc::new(SensorStore::with_capacity(config.history_capacity));
        let dispatch = Arc::new(dispatch);
        let route = RouteConfig::from(&config);

        for &sensor in &config.sensors {
            store.register_callback(sensor, osc_route(Arc::clone(&dispatch), route.clone()));
            store.register_callback(sensor, tilt_route(Arc::clone(&dispatch), route.clone()));
            store.register_callback(sensor, midi_route(Arc::clone(&dispatch), route.clone()));
            debug!(%sensor, "routes registered");
        }

        Ok(Instrument { config, store, dispatch })
    }

    pub fn config(&self) -> &InstrumentConfig { &self.config }
    pub fn store(&self) -> &SensorStore { &self.store }
    pub fn dispatch(&self) -> &DispatchManager { &self.dispatch }

    /// The simulated source described by the config.
    pub fn sim_source(&self) -> SimSampleSource {
        SimSampleSource::new(
            self.config.sensors.clone(),
            self.config.sample_count,
            Duration::from_millis(self.config.sample_interval_ms),
            self.config.seed,
        )
    }

    /// Start both managers, record every sample the source produces, then
    /// stop both.  Returns once the source is exhausted.
    pub fn run<S: SampleSource>(&self, source: S) -> RunSummary {
        let before = self.dispatch.len();
        self.store.start();
        self.dispatch.start();
        info!(
            sensors = self.config.sensors.len(),
            target = %self.config.osc_target,
            midi = self.dispatch.has_midi_output(),
            "instrument started"
        );

        let mut samples = 0;
        for sample in spawn_sample_source(source) {
            self.store.record_data(sample.sensor_type(), sample);
            samples += 1;
        }

        self.store.stop();
        self.dispatch.stop();

        let new_records = self.dispatch.get_history(None).split_off(before);
        let summary = RunSummary {
            samples,
            records: new_records.len(),
            sent:    new_records.iter().filter(|r| r.sent()).count(),
        };
        info!(samples = summary.samples, records = summary.records, sent = summary.sent, "instrument stopped");
        summary
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use sensor_dispatch::{
        Destination, DispatchFailure, DispatchKind, MidiOut, OscMessage, OscSender, OscTransport,
        TransportError,
    };
    use sensor_stream::{SensorSample, SensorType};

    use crate::error::ConfigError;
    use crate::source::ScriptedSource;

    #[derive(Clone, Default)]
    struct RecordingOsc {
        sent: Arc<Mutex<Vec<(String, String)>>>,
    }

    struct RecordingSender {
        dest: String,
        sent: Arc<Mutex<Vec<(String, String)>>>,
    }

    impl OscTransport for RecordingOsc {
        fn open(&mut self, destination: &Destination) -> Result<Box<dyn OscSender>, TransportError> {
            Ok(Box::new(RecordingSender { dest: destination.to_string(), sent: Arc::clone(&self.sent) }))
        }
    }

    impl OscSender for RecordingSender {
        fn send(&mut self, message: &OscMessage) -> Result<(), TransportError> {
            self.sent.lock().unwrap().push((self.dest.clone(), message.address().to_string()));
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    struct RecordingMidi {
        connects: Arc<Mutex<usize>>,
        frames:   Arc<Mutex<Vec<Vec<u8>>>>,
    }

    struct RecordingMidiOut {
        frames: Arc<Mutex<Vec<Vec<u8>>>>,
    }

    impl MidiPort for RecordingMidi {
        fn connect(&mut self) -> Result<Box<dyn MidiOut>, TransportError> {
            *self.connects.lock().unwrap() += 1;
            Ok(Box::new(RecordingMidiOut { frames: Arc::clone(&self.frames) }))
        }
    }

    impl MidiOut for RecordingMidiOut {
        fn send(&mut self, frame: &[u8]) -> Result<(), TransportError> {
            self.frames.lock().unwrap().push(frame.to_vec());
            Ok(())
        }
    }

    fn config() -> InstrumentConfig {
        InstrumentConfig {
            sensors: vec![SensorType::Accelerometer, SensorType::Gyroscope],
            midi_channel: 1,
            sample_interval_ms: 0,
            seed: Some(9),
            ..InstrumentConfig::default()
        }
    }

    fn scripted(n: usize) -> ScriptedSource {
        ScriptedSource::new(
            (0..n)
                .map(|i| SensorSample::new(SensorType::Accelerometer, 1.0, 2.0, 2.0, i as f64))
                .collect(),
        )
    }

    #[test]
    fn invalid_config_is_rejected() {
        let cfg = InstrumentConfig { midi_channel: 99, ..InstrumentConfig::default() };
        let err = Instrument::with_dispatch(cfg, DispatchManager::default()).err().unwrap();
        assert!(matches!(err, InstrumentError::Config(ConfigError::InvalidValue { field: "midi_channel", .. })));
    }

    #[test]
    fn invalid_config_never_connects_midi() {
        let midi = RecordingMidi::default();
        let cfg = InstrumentConfig { history_capacity: 0, ..config() };
        assert!(Instrument::with_midi(cfg, Some(midi.clone())).is_err());
        assert_eq!(*midi.connects.lock().unwrap(), 0);

        let app = Instrument::with_midi(config(), Some(midi.clone())).unwrap();
        assert!(app.dispatch().has_midi_output());
        assert_eq!(*midi.connects.lock().unwrap(), 1);
    }

    #[test]
    fn routes_registered_per_sensor() {
        let app = Instrument::with_dispatch(config(), DispatchManager::default()).unwrap();
        assert_eq!(app.store().callback_count(SensorType::Accelerometer), 3);
        assert_eq!(app.store().callback_count(SensorType::Gyroscope), 3);
        assert_eq!(app.store().callback_count(SensorType::Gravity), 0);
        assert_eq!(app.store().capacity(), 100);
    }

    #[test]
    fn end_to_end_with_transports() {
        let osc = RecordingOsc::default();
        let midi = RecordingMidi::default();
        let dm = DispatchManager::builder()
            .osc_transport(osc.clone())
            .midi_port(midi.clone())
            .build();
        let app = Instrument::with_dispatch(config(), dm).unwrap();

        let summary = app.run(scripted(4));
        assert_eq!(summary, RunSummary { samples: 4, records: 12, sent: 12 });
        assert_eq!(app.store().len(SensorType::Accelerometer), 4);
        assert!(!app.store().is_active());
        assert!(!app.dispatch().is_active());

        let sent = osc.sent.lock().unwrap();
        assert_eq!(sent.len(), 8);
        assert_eq!(sent[0], ("localhost:8000".to_string(), "/sensor/accelerometer".to_string()));
        assert_eq!(sent[1].1, "/sensor/accelerometer/tilt");

        // magnitude 3 / 20 → note 19; |y| 2 / 10 → velocity 25; channel 1
        let frames = midi.frames.lock().unwrap();
        assert_eq!(frames.len(), 4);
        assert_eq!(frames[0], vec![0x91, 19, 25]);
    }

    #[test]
    fn without_transports_everything_is_logged_unsent() {
        let app = Instrument::with_dispatch(config(), DispatchManager::default()).unwrap();
        let summary = app.run(scripted(2));
        assert_eq!(summary, RunSummary { samples: 2, records: 6, sent: 0 });

        let history = app.dispatch().get_history(None);
        assert!(history.iter().all(|r| r.failure() == Some(&DispatchFailure::Unavailable)));
        assert_eq!(history.iter().filter(|r| r.kind() == DispatchKind::Midi).count(), 2);
    }

    #[test]
    fn unrouted_sensor_is_stored_but_not_sent() {
        let app = Instrument::with_dispatch(config(), DispatchManager::default()).unwrap();
        let src = ScriptedSource::new(vec![SensorSample::new(SensorType::Magnetometer, 1.0, 0.0, 0.0, 0.0)]);
        let summary = app.run(src);
        assert_eq!(summary.samples, 1);
        assert_eq!(summary.records, 0);
        assert_eq!(app.store().len(SensorType::Magnetometer), 1);
    }

    #[test]
    fn summary_counts_only_the_current_run() {
        let app = Instrument::with_dispatch(config(), DispatchManager::default()).unwrap();
        app.run(scripted(1));
        let second = app.run(scripted(1));
        assert_eq!(second.records, 3);
        assert_eq!(app.dispatch().len(), 6);
    }

    #[test]
    fn summary_serialises_counts() {
        let v = serde_json::json!(RunSummary { samples: 4, records: 12, sent: 8 });
        assert_eq!(v, serde_json::json!({ "samples": 4, "records": 12, "sent": 8 }));
    }

    #[test]
    fn sim_source_follows_config() {
        let osc = RecordingOsc::default();
        let dm = DispatchManager::builder().osc_transport(osc.clone()).build();
        let cfg = InstrumentConfig { sample_count: 3, ..config() };
        let app = Instrument::with_dispatch(cfg, dm).unwrap();

        let summary = app.run(app.sim_source());
        // two sensors × three ticks
        assert_eq!(summary.samples, 6);
        assert_eq!(app.store().len(SensorType::Gyroscope), 3);
        assert_eq!(osc.sent.lock().unwrap().len(), 12);
    }
}
