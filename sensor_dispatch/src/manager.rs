//! The dispatcher: sends OSC messages and MIDI notes through whatever
//! transports it was built with and logs every attempt.
//!
//! Transport failures never reach the caller.  Each `send_*` call appends
//! exactly one [`DispatchRecord`], with `sent = false` when delivery did
//! not happen.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use sensor_stream::{mapping, panic_message};
use tracing::{debug, info, warn};

use crate::message::{MidiEvent, OscMessage};
use crate::record::{DispatchFailure, DispatchRecord};
use crate::transport::{Destination, MidiOut, MidiPort, OscSender, OscTransport, TransportError};

// ════════════════════════════════════════════════════════════════════════════
// Builder
// ════════════════════════════════════════════════════════════════════════════

/// Collects the optional transports for a [`DispatchManager`].
///
/// ```rust
/// use sensor_dispatch::{DispatchManager, OscMessage};
///
/// // No transports: every send is logged as unsent.
/// let dm = DispatchManager::builder().build();
/// assert!(!dm.send_osc(OscMessage::bare("/ping"), "localhost:8000"));
/// assert_eq!(dm.len(), 1);
/// ```
#[derive(Default)]
pub struct DispatchBuilder {
    osc:  Option<Box<dyn OscTransport>>,
    midi: Option<Box<dyn MidiPort>>,
}

impl DispatchBuilder {
    /// Transport used to open one sender per OSC destination.
    pub fn osc_transport(mut self, transport: impl OscTransport + 'static) -> Self {
        self.osc = Some(Box::new(transport));
        self
    }

    /// MIDI device to connect at build time.
    pub fn midi_port(mut self, port: impl MidiPort + 'static) -> Self {
        self.midi = Some(Box::new(port));
        self
    }

    pub fn build(self) -> DispatchManager {
        let mut state = DispatchState {
            osc:         self.osc,
            senders:     HashMap::new(),
            midi_port:   self.midi,
            midi_out:    None,
            midi_probed: false,
            log:         Vec::new(),
        };
        state.probe_midi();
        info!(
            osc = state.osc.is_some(),
            midi = state.midi_out.is_some(),
            "dispatch manager initialised"
        );
        DispatchManager {
            active: AtomicBool::new(false),
            state:  Mutex::new(state),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// DispatchState
// ════════════════════════════════════════════════════════════════════════════

struct DispatchState {
    osc:     Option<Box<dyn OscTransport>>,
    /// "host:port" → open sender.  Filled on first use.
    senders: HashMap<String, Box<dyn OscSender>>,

    midi_port:   Option<Box<dyn MidiPort>>,
    midi_out:    Option<Box<dyn MidiOut>>,
    /// A connect was attempted since the last release.
    midi_probed: bool,

    log: Vec<DispatchRecord>,
}

impl DispatchState {
    /// Connect the MIDI output once, if a port exists and nothing is open.
    fn probe_midi(&mut self) {
        if self.midi_out.is_some() || self.midi_probed {
            return;
        }
        let Some(port) = self.midi_port.as_mut() else { return };
        self.midi_probed = true;
        match panic::catch_unwind(AssertUnwindSafe(|| port.connect())) {
            Ok(Ok(out)) => {
                info!("MIDI output connected");
                self.midi_out = Some(out);
            }
            Ok(Err(e)) => warn!("MIDI output unavailable: {}", e),
            Err(payload) => warn!("MIDI connect panicked: {}", panic_message(payload.as_ref())),
        }
    }

    fn deliver_osc(&mut self, message: &OscMessage, destination: &str) -> Result<(), DispatchFailure> {
        let Some(transport) = self.osc.as_mut() else {
            return Err(DispatchFailure::Unavailable);
        };
        let sender = match self.senders.entry(destination.to_string()) {
            Entry::Occupied(e) => e.into_mut(),
            Entry::Vacant(e) => {
                let dest = Destination::parse(destination).map_err(failed)?;
                let sender = transport.open(&dest).map_err(failed)?;
                info!(destination, "OSC destination opened");
                e.insert(sender)
            }
        };
        sender.send(message).map_err(failed)
    }

    fn deliver_midi(&mut self, event: &MidiEvent) -> Result<(), DispatchFailure> {
        self.probe_midi();
        let Some(out) = self.midi_out.as_mut() else {
            return Err(DispatchFailure::Unavailable);
        };
        out.send(&event.note_on_frame()).map_err(failed)
    }

    fn release(&mut self) -> usize {
        let released = self.senders.len() + usize::from(self.midi_out.is_some());
        self.senders.clear();
        self.midi_out = None;
        self.midi_probed = false;
        released
    }
}

fn failed(e: TransportError) -> DispatchFailure {
    DispatchFailure::Transport(e.to_string())
}

/// Run one delivery, catching a transport panic.  The outer `Err` carries
/// the panic as a `Transport` failure.
fn contain<F>(deliver: F) -> Result<Result<(), DispatchFailure>, DispatchFailure>
where
    F: FnOnce() -> Result<(), DispatchFailure>,
{
    panic::catch_unwind(AssertUnwindSafe(deliver)).map_err(|payload| {
        DispatchFailure::Transport(format!("transport panicked: {}", panic_message(payload.as_ref())))
    })
}

// ════════════════════════════════════════════════════════════════════════════
// DispatchManager
// ════════════════════════════════════════════════════════════════════════════

/// Sends OSC / MIDI and keeps the ordered dispatch log.
///
/// All methods take `&self`; one mutex guards the handle cache and the
/// log, so records appear in the order their sends completed.
/// `start`/`stop` flip an advisory flag; `stop` also drops every open
/// transport handle.  Handles are reopened on the next send.
pub struct DispatchManager {
    active: AtomicBool,
    state:  Mutex<DispatchState>,
}

impl Default for DispatchManager {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl DispatchManager {
    pub fn builder() -> DispatchBuilder {
        DispatchBuilder::default()
    }

    // ── sending ───────────────────────────────────────────────────────────

    /// Send `message` to `destination` (`"host:port"`) and log the attempt.
    ///
    /// Returns whether the message reached the transport.
    pub fn send_osc(&self, message: OscMessage, destination: &str) -> bool {
        let mut state = self.lock();
        let outcome = contain(|| state.deliver_osc(&message, destination)).unwrap_or_else(|reason| {
            // a sender that panicked is not reused
            state.senders.remove(destination);
            Err(reason)
        });
        match &outcome {
            Ok(())                             => debug!(%message, destination, "OSC sent"),
            Err(DispatchFailure::Unavailable)  => debug!(%message, destination, "no OSC transport; logged only"),
            Err(DispatchFailure::Transport(e)) => warn!(%message, destination, "OSC send failed: {}", e),
        }
        let sent = outcome.is_ok();
        state.log.push(DispatchRecord::osc(message, destination, outcome));
        sent
    }

    /// Send `event` as a note-on through the MIDI output and log the attempt.
    ///
    /// Returns whether the frame reached the device.
    pub fn send_midi(&self, event: MidiEvent) -> bool {
        let mut state = self.lock();
        let outcome = contain(|| state.deliver_midi(&event)).unwrap_or_else(|reason| {
            state.midi_out = None;
            state.midi_probed = false;
            Err(reason)
        });
        match &outcome {
            Ok(())                             => debug!(%event, "MIDI sent"),
            Err(DispatchFailure::Unavailable)  => debug!(%event, "no MIDI output; logged only"),
            Err(DispatchFailure::Transport(e)) => warn!(%event, "MIDI send failed: {}", e),
        }
        let sent = outcome.is_ok();
        state.log.push(DispatchRecord::midi(event, outcome));
        sent
    }

    // ── mapping helpers ───────────────────────────────────────────────────

    /// See [`mapping::map_to_osc_range`].
    pub fn map_sensor_to_osc(&self, value: f64, osc_min: f64, osc_max: f64) -> f64 {
        mapping::map_to_osc_range(value, osc_min, osc_max)
    }

    /// See [`mapping::map_to_midi_note`].
    pub fn map_sensor_to_midi(&self, value: f64) -> u8 {
        mapping::map_to_midi_note(value)
    }

    // ── history ───────────────────────────────────────────────────────────

    /// Copy of the dispatch log, oldest first; `Some(n)` keeps the last `n`.
    pub fn get_history(&self, count: Option<usize>) -> Vec<DispatchRecord> {
        let state = self.lock();
        let skip = count.map_or(0, |n| state.log.len().saturating_sub(n));
        state.log[skip..].to_vec()
    }

    pub fn len(&self) -> usize {
        self.lock().log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().log.is_empty()
    }

    /// Destinations with an open OSC sender, sorted.
    pub fn cached_destinations(&self) -> Vec<String> {
        let mut d: Vec<String> = self.lock().senders.keys().cloned().collect();
        d.sort();
        d
    }

    pub fn has_midi_output(&self) -> bool {
        self.lock().midi_out.is_some()
    }

    // ── lifecycle ─────────────────────────────────────────────────────────

    pub fn start(&self) {
        self.active.store(true, Ordering::SeqCst);
        self.lock().probe_midi();
        info!("dispatch started");
    }

    /// Clear the activity flag and drop every open transport handle.
    /// The log is kept.
    pub fn stop(&self) {
        self.active.store(false, Ordering::SeqCst);
        let released = self.lock().release();
        info!(released, "dispatch stopped");
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    fn lock(&self) -> MutexGuard<'_, DispatchState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
