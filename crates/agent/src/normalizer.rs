//! Provider action payloads → canonical [`Action`]s.
//!
//! Normalization never fails. Unknown names, explicitly unsupported entries
//! and malformed arguments all come out as `Action::Unsupported` with a
//! reason, so one odd action cannot stop the loop.

use std::collections::HashMap;

use deskpilot_core::action::{Action, Resolution};
use deskpilot_core::model::{ActionCall, ActionSchema};
use tracing::{debug, warn};

use crate::vocabulary::{self, Args, Mapping, Vocabulary};

/// The outcome of normalizing one action call.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalized {
    pub action: Action,
    /// Why the call degraded to `Unsupported`, if it did
    pub degraded: Option<String>,
}

impl Normalized {
    fn mapped(action: Action) -> Self {
        Self {
            action,
            degraded: None,
        }
    }

    fn unsupported(raw_name: &str, reason: String) -> Self {
        Self {
            action: Action::Unsupported {
                raw_name: raw_name.to_string(),
            },
            degraded: Some(reason),
        }
    }
}

/// Maps one provider's vocabulary onto canonical actions.
#[derive(Debug, Clone)]
pub struct ActionNormalizer {
    vocabulary: &'static Vocabulary,
    /// Raw name → table name
    aliases: HashMap<String, String>,
}

impl ActionNormalizer {
    pub fn new(vocabulary: &'static Vocabulary) -> Self {
        Self {
            vocabulary,
            aliases: HashMap::new(),
        }
    }

    /// Look up a built-in vocabulary by name.
    pub fn for_vocabulary(name: &str) -> Result<Self, deskpilot_core::Error> {
        vocabulary::by_name(name)
            .map(Self::new)
            .ok_or_else(|| deskpilot_core::Error::Config {
                message: format!(
                    "unknown action vocabulary '{name}' (expected one of: {})",
                    vocabulary::builtin()
                        .iter()
                        .map(|v| v.name)
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            })
    }

    /// Extra raw names that should be treated as existing table entries.
    pub fn with_aliases(mut self, aliases: HashMap<String, String>) -> Self {
        for (alias, target) in &aliases {
            if self.vocabulary.entry(target).is_none() {
                warn!(
                    vocabulary = self.vocabulary.name,
                    alias = %alias,
                    target = %target,
                    "Alias points at an unknown action name"
                );
            }
        }
        self.aliases = aliases;
        self
    }

    pub fn vocabulary(&self) -> &'static Vocabulary {
        self.vocabulary
    }

    /// Tool description to hand to the model client.
    pub fn schema(&self, display: Resolution) -> ActionSchema {
        ActionSchema {
            vocabulary: self.vocabulary.name.to_string(),
            display,
            coordinate_space: self.vocabulary.space,
            action_names: self.vocabulary.action_names(),
        }
    }

    /// Convert a raw provider call into a canonical action.
    ///
    /// A degraded call keeps the name it resolved to after aliasing, so a
    /// no-op still reads as the provider action it stands for.
    pub fn normalize(&self, call: &ActionCall) -> Normalized {
        let raw_name = call.name.as_str();
        let lookup = self
            .aliases
            .get(raw_name)
            .map(String::as_str)
            .unwrap_or(raw_name);

        let normalized = match self.vocabulary.entry(lookup) {
            None => Normalized::unsupported(
                lookup,
                format!("'{raw_name}' is not a {} action", self.vocabulary.name),
            ),
            Some(entry) => match &entry.mapping {
                Mapping::Unsupported => Normalized::unsupported(
                    entry.name,
                    format!("'{raw_name}' is not supported on a remote desktop"),
                ),
                Mapping::Parse(parse) => {
                    match parse(&Args::new(&call.args, self.vocabulary.space)) {
                        Ok(action) => Normalized::mapped(action),
                        Err(e) => Normalized::unsupported(
                            entry.name,
                            format!("invalid arguments for '{raw_name}': {e}"),
                        ),
                    }
                }
            },
        };

        match &normalized.degraded {
            Some(reason) => warn!(
                vocabulary = self.vocabulary.name,
                action = raw_name,
                %reason,
                "Action degraded to no-op"
            ),
            None => debug!(
                vocabulary = self.vocabulary.name,
                action = raw_name,
                canonical = normalized.action.name(),
                "Normalized action"
            ),
        }

        normalized
    }
}
