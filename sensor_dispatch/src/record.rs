//! Dispatch log entries.

use serde::Serialize;

use crate::message::{MidiEvent, OscMessage};

/// Which protocol a record belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchKind {
    Osc,
    Midi,
}

/// The message a record was made for.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum DispatchPayload {
    Osc(OscMessage),
    Midi(MidiEvent),
}

/// Why a dispatch attempt did not reach the wire.
///
/// `Unavailable` means no transport was configured or no device is
/// connected; `Transport` means a transport was there and failed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", content = "detail", rename_all = "snake_case")]
pub enum DispatchFailure {
    Unavailable,
    Transport(String),
}

/// One send attempt.  Appended to the dispatch log and never changed.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DispatchRecord {
    #[serde(rename = "type")]
    kind: DispatchKind,
    #[serde(rename = "message")]
    payload: DispatchPayload,
    #[serde(rename = "target", skip_serializing_if = "Option::is_none")]
    destination: Option<String>,
    sent: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    failure: Option<DispatchFailure>,
}

impl DispatchRecord {
    pub(crate) fn osc(
        message:     OscMessage,
        destination: &str,
        outcome:     Result<(), DispatchFailure>,
    ) -> Self {
        DispatchRecord {
            kind:        DispatchKind::Osc,
            payload:     DispatchPayload::Osc(message),
            destination: Some(destination.to_string()),
            sent:        outcome.is_ok(),
            failure:     outcome.err(),
        }
    }

    pub(crate) fn midi(event: MidiEvent, outcome: Result<(), DispatchFailure>) -> Self {
        DispatchRecord {
            kind:        DispatchKind::Midi,
            payload:     DispatchPayload::Midi(event),
            destination: None,
            sent:        outcome.is_ok(),
            failure:     outcome.err(),
        }
    }

    pub fn kind(&self) -> DispatchKind { self.kind }
    pub fn payload(&self) -> &DispatchPayload { &self.payload }
    pub fn destination(&self) -> Option<&str> { self.destination.as_deref() }
    pub fn sent(&self) -> bool { self.sent }
    pub fn failure(&self) -> Option<&DispatchFailure> { self.failure.as_ref() }

    /// `{type, message, target?, sent, failure?}`.
    pub fn to_record(&self) -> serde_json::Value {
        serde_json::json!(self)
    }
}
