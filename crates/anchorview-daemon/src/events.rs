//! Event fan-out to subscribers.
//!
//! Oracle events drained after each write are wrapped with a timestamp and
//! broadcast. Subscribed connections receive them as JSON-RPC
//! notifications; a subscriber that falls more than the buffer size behind
//! skips the missed events.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use anchorview_types::events::OracleEvent;
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// An event emitted by the daemon.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Event type name (e.g. "PriceUpdated", "DaemonStarted").
    pub event_type: String,
    /// Unix timestamp.
    pub timestamp: u64,
    /// Type-specific payload.
    pub payload: serde_json::Value,
}

impl Event {
    pub fn from_oracle(event: &OracleEvent, timestamp: u64) -> Self {
        Self {
            event_type: event.name().to_string(),
            timestamp,
            payload: serde_json::to_value(event).unwrap_or(serde_json::Value::Null),
        }
    }
}

/// Filter for event subscriptions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventFilter {
    /// Only these event types.
    #[serde(default)]
    pub event_types: Option<Vec<String>>,
    /// Only events about these symbols. Events without a symbol pass.
    #[serde(default)]
    pub symbols: Option<Vec<String>>,
}

/// Event bus for broadcasting events to subscribers.
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<Event>,
    sequence: Arc<AtomicU64>,
}

impl EventBus {
    /// Create a new event bus with the given buffer capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            sequence: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Emit an event to all subscribers.
    pub fn emit(&self, event: Event) {
        self.sequence.fetch_add(1, Ordering::SeqCst);
        // No subscribers is fine.
        let _ = self.sender.send(event);
    }

    /// Emit a batch of oracle events in order.
    pub fn emit_oracle(&self, events: &[OracleEvent], timestamp: u64) {
        for event in events {
            self.emit(Event::from_oracle(event, timestamp));
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.sender.subscribe()
    }

    /// Number of events emitted so far.
    pub fn sequence(&self) -> u64 {
        self.sequence.load(Ordering::SeqCst)
    }
}

impl EventFilter {
    /// Check if an event matches this filter.
    pub fn matches(&self, event: &Event) -> bool {
        if let Some(ref types) = self.event_types {
            if !types.iter().any(|t| *t == event.event_type) {
                return false;
            }
        }

        if let Some(ref symbols) = self.symbols {
            if let Some(symbol) = event.payload.get("symbol").and_then(|v| v.as_str()) {
                if !symbols.iter().any(|s| s == symbol) {
                    return false;
                }
            }
        }

        true
    }
}
