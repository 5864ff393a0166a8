//! Out-of-band progress reporting.
//!
//! Grounded on the `CrawlEventBus` pattern used elsewhere in the pack: a
//! `tokio::sync::broadcast` channel, safe for one producer (the explorer)
//! and many consumers. Emission is always best-effort — a send with no
//! subscribers is not an error, it just means nobody is listening.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;

/// Tag taxonomy from the event contract. Consumers that don't recognize a
/// tag should treat it as informational — new tags may be added here over
/// time without breaking existing subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventTag {
    DiscoveryStart,
    DiscoveryComplete,
    DiscoveryError,
    DiscoveryTimeout,
    LoginStart,
    LoginNotNeeded,
    LoginEmailFilled,
    LoginPasswordFilled,
    LoginComplete,
    LoginRedirect,
    LoginError,
    Visiting,
    VisitError,
    SkipExternal,
    AppTypeDetected,
    NodeCreated,
    NavigationDetected,
    SpaStateFound,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiscoveryEvent {
    pub tag: EventTag,
    pub timestamp: DateTime<Utc>,
    pub payload: Value,
}

impl DiscoveryEvent {
    pub fn new(tag: EventTag, payload: Value) -> Self {
        Self {
            tag,
            timestamp: Utc::now(),
            payload,
        }
    }
}

/// Write-only (from the explorer's perspective) broadcast sink.
#[derive(Clone)]
pub struct EventSink {
    sender: broadcast::Sender<DiscoveryEvent>,
}

impl EventSink {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Subscribe a new consumer. Consumers that lag behind the buffer
    /// capacity will see `RecvError::Lagged` rather than block the producer.
    pub fn subscribe(&self) -> broadcast::Receiver<DiscoveryEvent> {
        self.sender.subscribe()
    }

    /// Best-effort emit. A `SendError` here only means there are currently
    /// no subscribers — never a reason to interrupt the crawl.
    pub fn emit(&self, tag: EventTag, payload: Value) {
        let _ = self.sender.send(DiscoveryEvent::new(tag, payload));
    }
}

impl Default for EventSink {
    fn default() -> Self {
        Self::new(1024)
    }
}
