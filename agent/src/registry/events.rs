//! Registry notification filtering

use serde::Deserialize;
use tracing::{debug, trace};

/// Media type of the manifests that trigger a deploy prompt
pub const MANIFEST_V2_MEDIA_TYPE: &str = "application/vnd.docker.distribution.manifest.v2+json";

/// Registry event action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventAction {
    Push,
    Other(String),
}

impl From<String> for EventAction {
    fn from(action: String) -> Self {
        if action == "push" {
            EventAction::Push
        } else {
            EventAction::Other(action)
        }
    }
}

/// A normalized registry event
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushEvent {
    pub action: EventAction,
    pub media_type: String,
    pub repository: String,
    pub tag: String,
}

/// Notification envelope. Events stay untyped so one bad entry cannot poison the batch.
#[derive(Debug, Deserialize)]
struct Envelope {
    events: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawEvent {
    action: String,
    target: RawTarget,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawTarget {
    media_type: String,
    repository: String,
    tag: String,
}

impl From<RawEvent> for PushEvent {
    fn from(raw: RawEvent) -> Self {
        Self {
            action: raw.action.into(),
            media_type: raw.target.media_type,
            repository: raw.target.repository,
            tag: raw.target.tag,
        }
    }
}

/// Selects push events for the managed application
#[derive(Debug, Clone)]
pub struct EventFilter {
    app_name: String,
}

impl EventFilter {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
        }
    }

    /// Validity predicate for a single event
    pub fn accepts(&self, event: &PushEvent) -> bool {
        event.action == EventAction::Push
            && event.media_type == MANIFEST_V2_MEDIA_TYPE
            && event.repository == self.app_name
    }

    /// Decode a raw notification body and keep the valid push events, in input order.
    ///
    /// Undecodable bodies yield nothing; undecodable events are dropped individually.
    pub fn filter(&self, payload: &[u8]) -> Vec<PushEvent> {
        let envelope: Envelope = match serde_json::from_slice(payload) {
            Ok(envelope) => envelope,
            Err(e) => {
                debug!("Ignoring registry notification: {}", e);
                return Vec::new();
            }
        };

        envelope
            .events
            .into_iter()
            .filter_map(|value| match serde_json::from_value::<RawEvent>(value) {
                Ok(raw) => Some(PushEvent::from(raw)),
                Err(e) => {
                    trace!("Dropping malformed registry event: {}", e);
                    None
                }
            })
            .filter(|event| self.accepts(event))
            .collect()
    }
}
