//! # DeskPilot Core
//!
//! Domain types, traits, and error definitions for the DeskPilot computer-use
//! agent loop. This crate has **no runtime dependencies** beyond tokio's sync
//! primitives — it defines the model that the other crates implement against.
//!
//! ## Design Philosophy
//!
//! The two outside collaborators of the loop are traits defined here:
//! - [`ModelClient`] asks a model for the next step
//! - [`RemoteDesktop`] moves the pointer, types and takes screenshots
//!
//! Everything else (canonical actions, the conversation log, domain events)
//! is plain data that any implementation can construct and inspect.

pub mod action;
pub mod error;
pub mod event;
pub mod message;
pub mod model;
pub mod remote;

// Re-export key types at crate root for ergonomics
pub use action::{
    Action, ActionKind, CoordinateSpace, ModelPoint, MouseButton, Resolution, ScrollDirection,
};
pub use error::{Error, ExecutionError, ModelError, RemoteError, Result, ScreenshotError};
pub use event::{DomainEvent, EventBus};
pub use message::{Conversation, ConversationId, Part, Role, Turn};
pub use model::{ActionCall, ActionSchema, ModelClient, ModelResponse};
pub use remote::RemoteDesktop;
