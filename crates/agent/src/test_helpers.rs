//! Shared test helpers for agent loop tests.

use std::sync::Arc;

use deskpilot_core::action::Resolution;
use deskpilot_core::event::EventBus;
use deskpilot_core::model::{ActionCall, ModelResponse};
use tokio::sync::mpsc;

use crate::loop_runner::AgentLoop;
use crate::normalizer::ActionNormalizer;
use crate::replay::{DryRunDesktop, ScriptedModel};
use crate::scaler::CoordinateScaler;
use crate::stream_event::AgentEvent;

/// A Gemini-speaking loop over a fresh dry-run desktop of the given size.
pub fn gemini_loop(
    model: Arc<ScriptedModel>,
    width: u32,
    height: u32,
) -> (AgentLoop, Arc<DryRunDesktop>) {
    gemini_loop_with(model, DryRunDesktop::new(Resolution::new(width, height).unwrap()))
}

/// A Gemini-speaking loop over a prepared dry-run desktop.
pub fn gemini_loop_with(
    model: Arc<ScriptedModel>,
    desktop: DryRunDesktop,
) -> (AgentLoop, Arc<DryRunDesktop>) {
    let desktop = Arc::new(desktop);
    let scaler = CoordinateScaler::with_resolutions(desktop.clone(), desktop.resolution(), None);
    let engine = AgentLoop::new(
        model,
        desktop.clone(),
        scaler,
        ActionNormalizer::for_vocabulary("gemini").unwrap(),
        Arc::new(EventBus::default()),
    );
    (engine, desktop)
}

/// Drain a run's event channel until the run closes it.
pub async fn collect(mut rx: mpsc::Receiver<AgentEvent>) -> Vec<AgentEvent> {
    let mut events = vec![];
    while let Some(event) = rx.recv().await {
        events.push(event);
    }
    events
}

pub fn action_call(name: &str, args: serde_json::Value) -> ActionCall {
    ActionCall::new(name, args)
}

/// A response proposing `calls` with no narration.
pub fn respond(calls: Vec<ActionCall>) -> ModelResponse {
    ModelResponse {
        reasoning: vec![],
        action_calls: calls,
    }
}

/// A response that only talks, which ends the run.
pub fn say(text: &str) -> ModelResponse {
    ModelResponse {
        reasoning: vec![text.to_string()],
        action_calls: vec![],
    }
}
