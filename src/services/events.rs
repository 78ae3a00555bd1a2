// Event Service
// Sink seam plus the broadcast bus UI surfaces subscribe to

use serde::Serialize;
use serde_json::Value;
use tokio::sync::broadcast;
use tokio_stream::wrappers::BroadcastStream;

/// Name of the event emitted whenever the settings record changes; the
/// payload is the full record.
pub const SETTINGS_UPDATED: &str = "settings_updated";

pub trait EventSink: Send + Sync {
    fn emit(&self, event: &str, payload: Value);
}

pub struct NoopEventSink;

impl EventSink for NoopEventSink {
    fn emit(&self, _event: &str, _payload: Value) {}
}

pub fn emit_event<T: Serialize>(sink: &dyn EventSink, event: &str, payload: &T) {
    if let Ok(value) = serde_json::to_value(payload) {
        sink.emit(event, value);
    }
}

/// One event on the bus.
#[derive(Debug, Clone, Serialize)]
pub struct ClientEvent {
    pub event: String,
    pub payload: Value,
}

/// Broadcast bus: every subscriber sees every event. Slow subscribers drop
/// old events rather than block emitters.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<ClientEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(256);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.sender.subscribe()
    }

    /// Stream adapter for async consumers.
    pub fn stream(&self) -> BroadcastStream<ClientEvent> {
        BroadcastStream::new(self.sender.subscribe())
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for EventBus {
    fn emit(&self, event: &str, payload: Value) {
        let _ = self.sender.send(ClientEvent {
            event: event.to_string(),
            payload,
        });
    }
}
