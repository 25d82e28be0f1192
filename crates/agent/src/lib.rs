//! The computer-use agent loop — the heart of DeskPilot.
//!
//! The agent follows an **Act → Observe** cycle:
//!
//! 1. **Observe** the desktop (screenshot, scaled to what the model sees)
//! 2. **Ask the model** for the next step via a [`ModelClient`](deskpilot_core::ModelClient)
//! 3. **Normalize** each proposed action into the canonical [`Action`](deskpilot_core::Action) set
//! 4. **Execute** the actions in order on the [`RemoteDesktop`](deskpilot_core::RemoteDesktop)
//! 5. **Settle**, capture a fresh screenshot, append both turns, loop back to step 2
//!
//! The loop continues until the model stops proposing actions, fails, is
//! cancelled, or the iteration limit is reached. Every run reports progress
//! as an ordered stream of [`AgentEvent`]s ending in exactly one `Done`.

pub mod executor;
pub mod loop_runner;
pub mod normalizer;
pub mod replay;
pub mod scaler;
pub mod stream_event;
pub mod vocabulary;

#[cfg(test)]
mod test_helpers;

pub use executor::{ActionExecutor, ExecutionOutcome, SideEffect, settle_delay};
pub use loop_runner::{AgentLoop, DEFAULT_MAX_ITERATIONS, classify};
pub use normalizer::{ActionNormalizer, Normalized};
pub use replay::{DryRunDesktop, InputEvent, ScriptStep, ScriptedModel};
pub use scaler::{CoordinateScaler, Screenshot};
pub use stream_event::{AgentEvent, ErrorKind, EventEmitter};
pub use vocabulary::Vocabulary;
