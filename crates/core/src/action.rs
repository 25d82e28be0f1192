//! Canonical actions and the geometry they are expressed in.
//!
//! Every provider vocabulary is normalized into [`Action`] before anything is
//! executed. Coordinates stay in the space the model used until the scaler
//! resolves them against the real display.

use serde::{Deserialize, Serialize};

use crate::error::RemoteError;

/// A display size in pixels. Both sides are always non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    /// Create a resolution, rejecting zero-sized sides.
    pub fn new(width: u32, height: u32) -> Result<Self, RemoteError> {
        if width == 0 || height == 0 {
            return Err(RemoteError::InvalidResolution { width, height });
        }
        Ok(Self { width, height })
    }

    /// Shrink so that neither side exceeds `max_dimension`, keeping the aspect ratio.
    pub fn fit_within(self, max_dimension: u32) -> Self {
        let longest = self.width.max(self.height);
        if max_dimension == 0 || longest <= max_dimension {
            return self;
        }
        let scale = max_dimension as f64 / longest as f64;
        Self {
            width: ((self.width as f64 * scale).round() as u32).max(1),
            height: ((self.height as f64 * scale).round() as u32).max(1),
        }
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// The coordinate system a model expressed a point in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoordinateSpace {
    /// Resolution-independent 0..=999 grid.
    Normalized,
    /// 0..=100 percent of each axis.
    Percentage,
    /// Pixels of the resolution advertised to the model.
    Model,
    /// Pixels of the real display.
    Native,
}

/// A point as proposed by the model, tagged with its space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelPoint {
    pub x: f64,
    pub y: f64,
    pub space: CoordinateSpace,
}

impl ModelPoint {
    pub fn new(x: f64, y: f64, space: CoordinateSpace) -> Self {
        Self { x, y, space }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MouseButton {
    #[default]
    Left,
    Right,
    Middle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrollDirection {
    Up,
    Down,
    Left,
    Right,
}

impl ScrollDirection {
    /// Parse a provider direction string (case-insensitive).
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "up" => Some(Self::Up),
            "down" => Some(Self::Down),
            "left" => Some(Self::Left),
            "right" => Some(Self::Right),
            _ => None,
        }
    }

    pub fn is_vertical(self) -> bool {
        matches!(self, Self::Up | Self::Down)
    }
}

impl std::fmt::Display for ScrollDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Left => "left",
            Self::Right => "right",
        };
        f.write_str(s)
    }
}

/// The closed set of operations the agent can perform on the desktop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    Click {
        at: ModelPoint,
        #[serde(default)]
        button: MouseButton,
    },
    DoubleClick {
        at: ModelPoint,
    },
    Move {
        at: ModelPoint,
    },
    TypeText {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        at: Option<ModelPoint>,
        text: String,
        press_enter: bool,
        clear_first: bool,
    },
    KeyCombination {
        keys: Vec<String>,
    },
    ScrollDocument {
        direction: ScrollDirection,
    },
    ScrollAt {
        at: ModelPoint,
        direction: ScrollDirection,
        /// Scroll distance, in the same space as `at`.
        magnitude: f64,
    },
    DragAndDrop {
        from: ModelPoint,
        to: ModelPoint,
    },
    Wait {
        duration_ms: u64,
    },
    Unsupported {
        raw_name: String,
    },
}

/// Discriminant of [`Action`], handy for tables and assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Click,
    DoubleClick,
    Move,
    TypeText,
    KeyCombination,
    ScrollDocument,
    ScrollAt,
    DragAndDrop,
    Wait,
    Unsupported,
}

impl ActionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::DoubleClick => "double_click",
            Self::Move => "move",
            Self::TypeText => "type_text",
            Self::KeyCombination => "key_combination",
            Self::ScrollDocument => "scroll_document",
            Self::ScrollAt => "scroll_at",
            Self::DragAndDrop => "drag_and_drop",
            Self::Wait => "wait",
            Self::Unsupported => "unsupported",
        }
    }
}

impl std::fmt::Display for CoordinateSpace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Normalized => "normalized",
            Self::Percentage => "percentage",
            Self::Model => "model",
            Self::Native => "native",
        };
        f.write_str(s)
    }
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::Click { .. } => ActionKind::Click,
            Self::DoubleClick { .. } => ActionKind::DoubleClick,
            Self::Move { .. } => ActionKind::Move,
            Self::TypeText { .. } => ActionKind::TypeText,
            Self::KeyCombination { .. } => ActionKind::KeyCombination,
            Self::ScrollDocument { .. } => ActionKind::ScrollDocument,
            Self::ScrollAt { .. } => ActionKind::ScrollAt,
            Self::DragAndDrop { .. } => ActionKind::DragAndDrop,
            Self::Wait { .. } => ActionKind::Wait,
            Self::Unsupported { .. } => ActionKind::Unsupported,
        }
    }

    /// Short stable name used in logs and action results.
    pub fn name(&self) -> &'static str {
        self.kind().as_str()
    }

    /// Apply `f` to every point carried by this action.
    pub fn map_points(&self, mut f: impl FnMut(ModelPoint) -> ModelPoint) -> Self {
        match self.clone() {
            Self::Click { at, button } => Self::Click { at: f(at), button },
            Self::DoubleClick { at } => Self::DoubleClick { at: f(at) },
            Self::Move { at } => Self::Move { at: f(at) },
            Self::TypeText {
                at,
                text,
                press_enter,
                clear_first,
            } => Self::TypeText {
                at: at.map(&mut f),
                text,
                press_enter,
                clear_first,
            },
            Self::ScrollAt {
                at,
                direction,
                magnitude,
            } => Self::ScrollAt {
                at: f(at),
                direction,
                magnitude,
            },
            Self::DragAndDrop { from, to } => Self::DragAndDrop {
                from: f(from),
                to: f(to),
            },
            other => other,
        }
    }
}
