//! ModelClient trait — the abstraction over computer-use model backends.
//!
//! A client turns the conversation into a provider request, and hands back
//! the reasoning text and raw action calls from the first candidate. Wire
//! formats, authentication and retries live behind this trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::action::{CoordinateSpace, Resolution};
use crate::error::ModelError;
use crate::message::Conversation;

/// One action as the provider phrased it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionCall {
    /// Provider-assigned call ID, if the provider has them
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Provider action name (e.g. "click_at", "left_click")
    pub name: String,

    /// Arguments exactly as received
    #[serde(default)]
    pub args: serde_json::Value,
}

impl ActionCall {
    pub fn new(name: impl Into<String>, args: serde_json::Value) -> Self {
        Self {
            id: None,
            name: name.into(),
            args,
        }
    }
}

/// The useful content of one model candidate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelResponse {
    /// Free-text parts (reasoning, narration, final answers)
    #[serde(default)]
    pub reasoning: Vec<String>,

    /// Proposed actions, in the order they should run
    #[serde(default)]
    pub action_calls: Vec<ActionCall>,
}

impl ModelResponse {
    pub fn is_empty(&self) -> bool {
        self.action_calls.is_empty() && self.reasoning.iter().all(|r| r.trim().is_empty())
    }

    /// Reasoning parts trimmed and joined; `None` when nothing is left.
    pub fn reasoning_text(&self) -> Option<String> {
        let joined = self
            .reasoning
            .iter()
            .map(|r| r.trim())
            .filter(|r| !r.is_empty())
            .collect::<Vec<_>>()
            .join("\n");
        (!joined.is_empty()).then_some(joined)
    }
}

/// What the client should advertise to the model about the action tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionSchema {
    /// Vocabulary the model is expected to speak ("gemini", "openai", ...)
    pub vocabulary: String,

    /// Display size the model sees in screenshots
    pub display: Resolution,

    /// Coordinate space the vocabulary uses
    pub coordinate_space: CoordinateSpace,

    /// Action names the vocabulary declares
    pub action_names: Vec<String>,
}

/// The core ModelClient trait.
///
/// The agent loop calls `generate()` once per iteration without knowing which
/// provider sits behind it.
#[async_trait]
pub trait ModelClient: Send + Sync {
    /// A human-readable name for this client (e.g., "gemini", "scripted").
    fn name(&self) -> &str;

    /// Ask the model for the next step.
    ///
    /// `Ok(None)` means the provider returned no candidate at all.
    async fn generate(
        &self,
        conversation: &Conversation,
        schema: &ActionSchema,
    ) -> std::result::Result<Option<ModelResponse>, ModelError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reasoning_text_trims_and_skips_blanks() {
        let response = ModelResponse {
            reasoning: vec!["  I see a button. ".into(), "   ".into(), "Clicking it.".into()],
            action_calls: vec![],
        };
        assert_eq!(
            response.reasoning_text().as_deref(),
            Some("I see a button.\nClicking it.")
        );
    }

    #[test]
    fn whitespace_only_response_is_empty() {
        let response = ModelResponse {
            reasoning: vec!["\n".into()],
            action_calls: vec![],
        };
        assert!(response.is_empty());
        assert!(response.reasoning_text().is_none());
    }

    #[test]
    fn action_call_deserializes_without_id() {
        let call: ActionCall =
            serde_json::from_str(r#"{"name":"click_at","args":{"x":10,"y":20}}"#).unwrap();
        assert_eq!(call.name, "click_at");
        assert!(call.id.is_none());
        assert_eq!(call.args["x"], 10);
    }
}
