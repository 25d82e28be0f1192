//! Conversation domain types.
//!
//! A run's conversation is an append-only log of turns. Each turn carries
//! multimodal parts: text, screenshots, the actions the model proposed and
//! the results the agent observed.

use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a conversation (one agent run).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationId(pub String);

impl ConversationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for ConversationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Who produced a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user, or the agent reporting observations back to the model
    User,
    /// The model
    Agent,
}

/// One piece of turn content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Part {
    Text {
        text: String,
    },
    Image {
        /// Base64-encoded image bytes
        data: String,
        media_type: String,
    },
    /// An action the model asked for, verbatim.
    ActionCall {
        correlation_id: String,
        name: String,
        #[serde(default)]
        args: serde_json::Value,
    },
    /// What happened when the agent carried out an action call.
    ActionResult {
        correlation_id: String,
        name: String,
        success: bool,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        side_effects: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        url: Option<String>,
    },
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Wrap raw image bytes as a base64 image part.
    pub fn image(bytes: &[u8], media_type: impl Into<String>) -> Self {
        Self::Image {
            data: base64::engine::general_purpose::STANDARD.encode(bytes),
            media_type: media_type.into(),
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(self, Self::Image { .. })
    }
}

/// A single role-tagged unit of conversation content.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    /// Unique turn ID
    pub id: String,

    /// Who produced this turn
    pub role: Role,

    /// Ordered content parts
    pub parts: Vec<Part>,

    /// Timestamp
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    pub fn new(role: Role, parts: Vec<Part>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role,
            parts,
            timestamp: Utc::now(),
        }
    }

    /// Create a user turn holding a single text part.
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, vec![Part::text(text)])
    }

    /// Create an agent turn from arbitrary parts.
    pub fn agent(parts: Vec<Part>) -> Self {
        Self::new(Role::Agent, parts)
    }

    /// Concatenated text parts of this turn.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                Part::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn has_image(&self) -> bool {
        self.parts.iter().any(Part::is_image)
    }
}

/// An append-only sequence of turns shared by one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    /// Unique conversation ID
    pub id: ConversationId,

    /// Ordered turns
    turns: Vec<Turn>,

    /// When this conversation was created
    pub created_at: DateTime<Utc>,

    /// When the last turn was added
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    /// Create a new empty conversation.
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: ConversationId::new(),
            turns: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Start a conversation from a user instruction.
    pub fn from_instruction(text: impl Into<String>) -> Self {
        let mut conv = Self::new();
        conv.push(Turn::user(text));
        conv
    }

    /// Append a turn. Existing turns are never modified.
    pub fn push(&mut self, turn: Turn) {
        self.updated_at = Utc::now();
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_user_turn() {
        let turn = Turn::user("click the button");
        assert_eq!(turn.role, Role::User);
        assert_eq!(turn.text(), "click the button");
        assert!(!turn.has_image());
    }

    #[test]
    fn conversation_tracks_updates() {
        let mut conv = Conversation::new();
        let created = conv.created_at;

        conv.push(Turn::user("First message"));
        assert_eq!(conv.len(), 1);
        assert!(conv.updated_at >= created);
    }

    #[test]
    fn image_part_is_base64() {
        let part = Part::image(b"\x89PNG", "image/png");
        match part {
            Part::Image { data, media_type } => {
                assert_eq!(data, "iVBORw==");
                assert_eq!(media_type, "image/png");
            }
            _ => panic!("Expected image part"),
        }
    }

    #[test]
    fn action_result_serialization_skips_empty_fields() {
        let part = Part::ActionResult {
            correlation_id: "c1".into(),
            name: "click_at".into(),
            success: true,
            side_effects: vec![],
            url: None,
        };
        let json = serde_json::to_string(&part).unwrap();
        assert!(json.contains(r#""kind":"action_result""#));
        assert!(!json.contains("side_effects"));
        assert!(!json.contains("url"));
    }
}
