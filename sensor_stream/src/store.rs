//! Bounded per-sensor history with synchronous subscriber fan-out.
//!
//! [`SensorStore`] is shared by reference (usually behind an `Arc`) between
//! the sample source that feeds it and the consumers that read from it.
//! All methods take `&self`; one mutex guards history and callbacks.

use std::collections::{HashMap, VecDeque};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, error, info, warn};

use crate::error::{panic_message, SensorError};
use crate::sample::{SensorSample, SensorType};

/// Samples kept per sensor type before the oldest is evicted.
pub const HISTORY_CAPACITY: usize = 100;

/// Outcome of one callback invocation.
pub type CallbackResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

/// A subscriber.  Receives each new sample by shared reference.
pub type SensorCallback = Arc<dyn Fn(&SensorSample) -> CallbackResult + Send + Sync>;

#[derive(Default)]
struct StoreState {
    history:   HashMap<SensorType, VecDeque<SensorSample>>,
    callbacks: HashMap<SensorType, Vec<SensorCallback>>,
}

// ════════════════════════════════════════════════════════════════════════════
// SensorStore
// ════════════════════════════════════════════════════════════════════════════

/// Ring history per [`SensorType`] plus the callbacks subscribed to it.
///
/// `start`/`stop` only flip an activity flag for observers; recording and
/// registration work the same either way.
pub struct SensorStore {
    capacity: usize,
    active:   AtomicBool,
    state:    Mutex<StoreState>,
}

impl Default for SensorStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SensorStore {
    /// Store keeping [`HISTORY_CAPACITY`] samples per sensor.
    pub fn new() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }

    /// Store keeping `capacity` samples per sensor (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        info!(capacity, "sensor store initialised");
        SensorStore {
            capacity,
            active: AtomicBool::new(false),
            state:  Mutex::new(StoreState::default()),
        }
    }

    pub fn capacity(&self) -> usize { self.capacity }

    // ── subscriptions ─────────────────────────────────────────────────────

    /// Subscribe `callback` to samples of `sensor`.
    ///
    /// Callbacks run in registration order.  Registering the same callback
    /// twice makes it run twice.
    pub fn register_callback<F>(&self, sensor: SensorType, callback: F)
    where
        F: Fn(&SensorSample) -> CallbackResult + Send + Sync + 'static,
    {
        self.register_shared(sensor, Arc::new(callback));
    }

    /// Subscribe an already-shared callback.
    pub fn register_shared(&self, sensor: SensorType, callback: SensorCallback) {
        let count = {
            let mut state = self.lock();
            let list = state.callbacks.entry(sensor).or_default();
            list.push(callback);
            list.len()
        };
        info!(sensor = %sensor, count, "callback registered");
    }

    /// Number of callbacks subscribed to `sensor`.
    pub fn callback_count(&self, sensor: SensorType) -> usize {
        self.lock().callbacks.get(&sensor).map_or(0, Vec::len)
    }

    // ── recording ─────────────────────────────────────────────────────────

    /// Append `sample` to the history of `sensor` and fan it out.
    ///
    /// The oldest sample is evicted when the history is full.  Every
    /// callback for `sensor` then runs in registration order; failures and
    /// panics are logged and never reach the caller.
    pub fn record_data(&self, sensor: SensorType, sample: SensorSample) {
        if sample.sensor_type() != sensor {
            warn!(
                sensor = %sensor,
                sample_type = %sample.sensor_type(),
                "sample filed under a different sensor type"
            );
        }

        // Snapshot the subscribers so the lock is released before they run;
        // a callback may read the store.
        let callbacks: Vec<SensorCallback> = {
            let mut state = self.lock();
            let history = state.history.entry(sensor).or_default();
            while history.len() >= self.capacity {
                history.pop_front();
            }
            history.push_back(sample);
            debug!(sensor = %sensor, len = history.len(), "sample recorded");
            state.callbacks.get(&sensor).cloned().unwrap_or_default()
        };

        for (index, callback) in callbacks.iter().enumerate() {
            if let Err(e) = invoke(sensor, index, callback, &sample) {
                error!("{}", e);
            }
        }
    }

    // ── queries ───────────────────────────────────────────────────────────

    /// Copy of the history for `sensor`, oldest first.
    ///
    /// With `Some(n)` only the last `n` samples are returned (fewer if the
    /// history is shorter).  Unknown sensors yield an empty vector.
    pub fn get_data(&self, sensor: SensorType, count: Option<usize>) -> Vec<SensorSample> {
        let state = self.lock();
        let Some(history) = state.history.get(&sensor) else {
            return Vec::new();
        };
        let skip = count.map_or(0, |n| history.len().saturating_sub(n));
        history.iter().skip(skip).copied().collect()
    }

    /// Number of samples currently held for `sensor`.
    pub fn len(&self, sensor: SensorType) -> usize {
        self.lock().history.get(&sensor).map_or(0, VecDeque::len)
    }

    /// True when no sample of any type has been recorded.
    pub fn is_empty(&self) -> bool {
        self.lock().history.values().all(VecDeque::is_empty)
    }

    // ── activity flag ─────────────────────────────────────────────────────

    pub fn start(&self) {
        self.active.store(true, Ordering::SeqCst);
        info!("sensor capture started");
    }

    pub fn stop(&self) {
        self.active.store(false, Ordering::SeqCst);
        info!("sensor capture stopped");
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Run one callback, turning an error return or a panic into a
/// [`SensorError`].
fn invoke(
    sensor:   SensorType,
    index:    usize,
    callback: &SensorCallback,
    sample:   &SensorSample,
) -> Result<(), SensorError> {
    match panic::catch_unwind(AssertUnwindSafe(|| callback(sample))) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(SensorError::Callback {
            sensor,
            index,
            reason: e.to_string(),
        }),
        Err(payload) => Err(SensorError::CallbackPanicked {
            sensor,
            index,
            message: panic_message(payload.as_ref()),
        }),
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
