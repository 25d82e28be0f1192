//! Provider action vocabularies.
//!
//! Each provider gets one fixed table mapping its action names to a parser
//! that builds a canonical [`Action`], or to an explicit `Unsupported` entry
//! for actions the provider declares but the remote desktop cannot perform.
//! Adding a provider means adding a table here; nothing downstream branches
//! on provider identity.

pub mod anthropic;
pub mod gemini;
pub mod openai;

use deskpilot_core::action::{Action, ActionKind, CoordinateSpace, ModelPoint};
use serde_json::Value;

/// Pixels scrolled by one wheel click, used to turn click counts into distances.
pub const PIXELS_PER_SCROLL_CLICK: f64 = 100.0;

/// Browser-navigation names. They degrade to no-ops but still get a longer settle.
pub const NAVIGATION_ACTIONS: &[&str] = &[
    "open_web_browser",
    "navigate",
    "go_back",
    "go_forward",
    "search",
];

pub fn is_navigation_like(raw_name: &str) -> bool {
    NAVIGATION_ACTIONS.contains(&raw_name)
}

/// Longest wait a model may ask for in one action.
pub const MAX_WAIT_MS: u64 = 60_000;

/// Milliseconds from a model-supplied value, bounded to `[0, MAX_WAIT_MS]`.
pub(crate) fn wait_ms(ms: f64) -> u64 {
    if ms.is_nan() {
        return 0;
    }
    ms.round().clamp(0.0, MAX_WAIT_MS as f64) as u64
}

/// All built-in vocabularies.
pub fn builtin() -> [&'static Vocabulary; 3] {
    [&gemini::VOCABULARY, &openai::VOCABULARY, &anthropic::VOCABULARY]
}

/// Look up a built-in vocabulary by name (case-insensitive).
pub fn by_name(name: &str) -> Option<&'static Vocabulary> {
    builtin()
        .into_iter()
        .find(|v| v.name.eq_ignore_ascii_case(name.trim()))
}

/// One provider's complete action table.
#[derive(Debug)]
pub struct Vocabulary {
    pub name: &'static str,
    /// Space every coordinate of this provider is expressed in
    pub space: CoordinateSpace,
    pub entries: &'static [VocabEntry],
}

impl Vocabulary {
    pub fn entry(&self, name: &str) -> Option<&'static VocabEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn action_names(&self) -> Vec<String> {
        self.entries.iter().map(|e| e.name.to_string()).collect()
    }
}

#[derive(Debug)]
pub struct VocabEntry {
    pub name: &'static str,
    /// Canonical variant this entry produces
    pub kind: ActionKind,
    pub mapping: Mapping,
}

pub type Parser = fn(&Args<'_>) -> Result<Action, ArgError>;

pub enum Mapping {
    Parse(Parser),
    Unsupported,
}

impl std::fmt::Debug for Mapping {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Parse(_) => f.write_str("Parse"),
            Self::Unsupported => f.write_str("Unsupported"),
        }
    }
}

/// Argument validation failures. These never escape normalization.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ArgError {
    #[error("missing argument `{0}`")]
    Missing(&'static str),

    #[error("argument `{key}` is not {expected}")]
    Invalid {
        key: &'static str,
        expected: &'static str,
    },
}

/// Typed accessors over a provider's raw JSON arguments.
pub struct Args<'a> {
    value: &'a Value,
    space: CoordinateSpace,
}

impl<'a> Args<'a> {
    pub fn new(value: &'a Value, space: CoordinateSpace) -> Self {
        Self { value, space }
    }

    pub fn space(&self) -> CoordinateSpace {
        self.space
    }

    fn get(&self, key: &str) -> Option<&'a Value> {
        self.value.get(key).filter(|v| !v.is_null())
    }

    pub fn opt_f64(&self, key: &'static str) -> Result<Option<f64>, ArgError> {
        match self.get(key) {
            None => Ok(None),
            Some(v) => as_number(v)
                .map(Some)
                .ok_or(ArgError::Invalid { key, expected: "a number" }),
        }
    }

    pub fn f64(&self, key: &'static str) -> Result<f64, ArgError> {
        self.opt_f64(key)?.ok_or(ArgError::Missing(key))
    }

    pub fn opt_str(&self, key: &'static str) -> Result<Option<&'a str>, ArgError> {
        match self.get(key) {
            None => Ok(None),
            Some(v) => v
                .as_str()
                .map(Some)
                .ok_or(ArgError::Invalid { key, expected: "a string" }),
        }
    }

    pub fn str(&self, key: &'static str) -> Result<&'a str, ArgError> {
        self.opt_str(key)?.ok_or(ArgError::Missing(key))
    }

    pub fn opt_bool(&self, key: &'static str) -> Result<Option<bool>, ArgError> {
        match self.get(key) {
            None => Ok(None),
            Some(v) => v
                .as_bool()
                .map(Some)
                .ok_or(ArgError::Invalid { key, expected: "a boolean" }),
        }
    }

    /// A point from two numeric fields, e.g. `x`/`y`.
    pub fn point(&self, x_key: &'static str, y_key: &'static str) -> Result<ModelPoint, ArgError> {
        Ok(ModelPoint::new(self.f64(x_key)?, self.f64(y_key)?, self.space))
    }

    /// A point from a `[x, y]` array field.
    pub fn pair(&self, key: &'static str) -> Result<ModelPoint, ArgError> {
        let value = self.get(key).ok_or(ArgError::Missing(key))?;
        point_from_pair(value, self.space).ok_or(ArgError::Invalid {
            key,
            expected: "an [x, y] pair",
        })
    }

    pub fn opt_pair(&self, key: &'static str) -> Result<Option<ModelPoint>, ArgError> {
        match self.get(key) {
            None => Ok(None),
            Some(_) => self.pair(key).map(Some),
        }
    }

    /// A list of strings, or a single string split on `+`.
    pub fn keys(&self, key: &'static str) -> Result<Vec<String>, ArgError> {
        let value = self.get(key).ok_or(ArgError::Missing(key))?;
        let keys: Vec<String> = match value {
            Value::String(s) => split_combo(s),
            Value::Array(items) => items
                .iter()
                .map(|i| i.as_str().map(str::to_string))
                .collect::<Option<Vec<_>>>()
                .ok_or(ArgError::Invalid {
                    key,
                    expected: "a list of key names",
                })?,
            _ => {
                return Err(ArgError::Invalid {
                    key,
                    expected: "a key combination",
                });
            }
        };
        if keys.is_empty() {
            return Err(ArgError::Missing(key));
        }
        Ok(keys)
    }

    /// The raw value behind `key`, for provider-specific shapes.
    pub fn raw(&self, key: &'static str) -> Result<&'a Value, ArgError> {
        self.get(key).ok_or(ArgError::Missing(key))
    }
}

fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub(crate) fn point_from_pair(value: &Value, space: CoordinateSpace) -> Option<ModelPoint> {
    let items = value.as_array()?;
    if items.len() != 2 {
        return None;
    }
    Some(ModelPoint::new(
        as_number(&items[0])?,
        as_number(&items[1])?,
        space,
    ))
}

/// "Control+Shift+T" -> ["Control", "Shift", "T"]. A lone "+" stays a key.
fn split_combo(raw: &str) -> Vec<String> {
    let trimmed = raw.trim();
    if trimmed == "+" {
        return vec!["+".into()];
    }
    trimmed
        .split('+')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn by_name_is_case_insensitive() {
        assert_eq!(by_name("Gemini").map(|v| v.name), Some("gemini"));
        assert_eq!(by_name(" openai ").map(|v| v.name), Some("openai"));
        assert!(by_name("cobol").is_none());
    }

    #[test]
    fn table_names_are_unique() {
        for vocab in builtin() {
            let mut names: Vec<_> = vocab.entries.iter().map(|e| e.name).collect();
            names.sort_unstable();
            let before = names.len();
            names.dedup();
            assert_eq!(before, names.len(), "duplicate entry in {}", vocab.name);
        }
    }

    #[test]
    fn numbers_accept_numeric_strings() {
        let value = json!({"x": "12.5", "y": 3});
        let args = Args::new(&value, CoordinateSpace::Model);
        assert_eq!(args.f64("x"), Ok(12.5));
        assert_eq!(args.f64("y"), Ok(3.0));
        assert_eq!(args.f64("z"), Err(ArgError::Missing("z")));
    }

    #[test]
    fn waits_are_bounded() {
        assert_eq!(wait_ms(250.4), 250);
        assert_eq!(wait_ms(-5.0), 0);
        assert_eq!(wait_ms(f64::NAN), 0);
        assert_eq!(wait_ms(1e15), MAX_WAIT_MS);
        assert_eq!(wait_ms(f64::INFINITY), MAX_WAIT_MS);
    }

    #[test]
    fn null_counts_as_missing() {
        let value = json!({"text": null});
        let args = Args::new(&value, CoordinateSpace::Model);
        assert_eq!(args.str("text"), Err(ArgError::Missing("text")));
    }

    #[test]
    fn keys_from_string_or_list() {
        let value = json!({"a": "Control+Shift+T", "b": ["ctrl", "c"], "c": "+", "d": 7});
        let args = Args::new(&value, CoordinateSpace::Normalized);
        assert_eq!(args.keys("a").unwrap(), vec!["Control", "Shift", "T"]);
        assert_eq!(args.keys("b").unwrap(), vec!["ctrl", "c"]);
        assert_eq!(args.keys("c").unwrap(), vec!["+"]);
        assert!(args.keys("d").is_err());
    }

    #[test]
    fn pair_requires_two_numbers() {
        let value = json!({"good": [10, 20], "bad": [1, 2, 3]});
        let args = Args::new(&value, CoordinateSpace::Model);
        assert_eq!(
            args.pair("good").unwrap(),
            ModelPoint::new(10.0, 20.0, CoordinateSpace::Model)
        );
        assert!(matches!(args.pair("bad"), Err(ArgError::Invalid { .. })));
    }
}
