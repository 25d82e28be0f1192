//! Domain event system — the observer side-channel of an agent run.
//!
//! The engine publishes what it is doing here; nothing in the loop depends on
//! anyone listening. Tests subscribe to assert on behaviour, hosts subscribe
//! for metrics or audit trails.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// All domain events in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DomainEvent {
    /// The model was asked for the next step
    ModelCalled {
        conversation_id: String,
        iteration: u32,
        action_calls: usize,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// A canonical action was carried out against the desktop
    ActionExecuted {
        action: String,
        success: bool,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// A provider action could not be mapped and became a no-op
    ActionDegraded {
        raw_name: String,
        reason: String,
        timestamp: DateTime<Utc>,
    },

    /// A run reached a terminal state
    RunFinished {
        conversation_id: String,
        outcome: String, // "completed", "cancelled", "error", "limit_reached"
        iterations: u32,
        timestamp: DateTime<Utc>,
    },
}

/// A broadcast-based event bus for domain events.
///
/// Uses `tokio::sync::broadcast` for multi-consumer pub/sub.
pub struct EventBus {
    sender: broadcast::Sender<Arc<DomainEvent>>,
}

impl EventBus {
    /// Create a new event bus with the given capacity.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publish an event to all subscribers.
    pub fn publish(&self, event: DomainEvent) {
        // No subscribers is fine
        let _ = self.sender.send(Arc::new(event));
    }

    /// Subscribe to receive events.
    pub fn subscribe(&self) -> broadcast::Receiver<Arc<DomainEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}
