//! Agent-level streaming events.
//!
//! `AgentEvent` is the ordered contract a client consumes while a run is in
//! flight, serialized as JSON objects tagged by `type`:
//! - `reasoning`        — the model's narration for this iteration
//! - `action`           — an action is about to run (native coordinates)
//! - `action_completed` — that action finished
//! - `error`            — the run failed; always followed by `done`
//! - `done`             — the run is over; nothing follows it

use deskpilot_core::action::Action;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentEvent {
    Reasoning {
        text: String,
    },

    Action {
        action: Action,
        correlation_id: String,
    },

    ActionCompleted {
        correlation_id: String,
    },

    Error {
        kind: ErrorKind,
        message: String,
    },

    Done {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        summary: Option<String>,
    },
}

impl AgentEvent {
    /// Wire name for this event type.
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Reasoning { .. } => "reasoning",
            Self::Action { .. } => "action",
            Self::ActionCompleted { .. } => "action_completed",
            Self::Error { .. } => "error",
            Self::Done { .. } => "done",
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, Self::Done { .. })
    }
}

/// Coarse failure category a client can act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Quota,
    Auth,
    LimitReached,
    Generic,
}

impl ErrorKind {
    /// Classify a failure by the text of its message.
    pub fn classify_message(message: &str) -> Self {
        if message.contains("quota") || message.contains("429") || message.contains("RESOURCE_EXHAUSTED")
        {
            Self::Quota
        } else if message.contains("API key") || message.contains("API_KEY") {
            Self::Auth
        } else {
            Self::Generic
        }
    }
}

/// Sending half of a run's event stream.
///
/// Sends wait for buffer space, so events are never dropped or reordered.
/// Once `Done` has gone out every further emit is ignored.
#[derive(Debug)]
pub struct EventEmitter {
    tx: mpsc::Sender<AgentEvent>,
    finished: bool,
}

impl EventEmitter {
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<AgentEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx, finished: false }, rx)
    }

    /// Deliver an event. Returns `false` if the receiver is gone.
    pub async fn emit(&mut self, event: AgentEvent) -> bool {
        if self.finished {
            return false;
        }
        if event.is_done() {
            self.finished = true;
        }
        self.tx.send(event).await.is_ok()
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }
}
