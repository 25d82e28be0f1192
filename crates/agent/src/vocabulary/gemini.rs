//! Gemini computer-use function names.
//!
//! Coordinates are on a 0..=999 grid regardless of screenshot size.

use deskpilot_core::action::{Action, ActionKind, CoordinateSpace, MouseButton, ScrollDirection};

use super::{ArgError, Args, Mapping, VocabEntry, Vocabulary};

/// Default `scroll_at` distance when the model omits `magnitude`.
const DEFAULT_MAGNITUDE: f64 = 800.0;

pub static VOCABULARY: Vocabulary = Vocabulary {
    name: "gemini",
    space: CoordinateSpace::Normalized,
    entries: &[
        VocabEntry { name: "open_web_browser", kind: ActionKind::Unsupported, mapping: Mapping::Unsupported },
        VocabEntry { name: "wait_5_seconds", kind: ActionKind::Wait, mapping: Mapping::Parse(wait_5_seconds) },
        VocabEntry { name: "go_back", kind: ActionKind::Unsupported, mapping: Mapping::Unsupported },
        VocabEntry { name: "go_forward", kind: ActionKind::Unsupported, mapping: Mapping::Unsupported },
        VocabEntry { name: "search", kind: ActionKind::Unsupported, mapping: Mapping::Unsupported },
        VocabEntry { name: "navigate", kind: ActionKind::Unsupported, mapping: Mapping::Unsupported },
        VocabEntry { name: "click_at", kind: ActionKind::Click, mapping: Mapping::Parse(click_at) },
        VocabEntry { name: "hover_at", kind: ActionKind::Move, mapping: Mapping::Parse(hover_at) },
        VocabEntry { name: "type_text_at", kind: ActionKind::TypeText, mapping: Mapping::Parse(type_text_at) },
        VocabEntry { name: "key_combination", kind: ActionKind::KeyCombination, mapping: Mapping::Parse(key_combination) },
        VocabEntry { name: "scroll_document", kind: ActionKind::ScrollDocument, mapping: Mapping::Parse(scroll_document) },
        VocabEntry { name: "scroll_at", kind: ActionKind::ScrollAt, mapping: Mapping::Parse(scroll_at) },
        VocabEntry { name: "drag_and_drop", kind: ActionKind::DragAndDrop, mapping: Mapping::Parse(drag_and_drop) },
    ],
};

fn wait_5_seconds(_args: &Args<'_>) -> Result<Action, ArgError> {
    Ok(Action::Wait { duration_ms: 5_000 })
}

fn click_at(args: &Args<'_>) -> Result<Action, ArgError> {
    Ok(Action::Click {
        at: args.point("x", "y")?,
        button: MouseButton::Left,
    })
}

fn hover_at(args: &Args<'_>) -> Result<Action, ArgError> {
    Ok(Action::Move {
        at: args.point("x", "y")?,
    })
}

fn type_text_at(args: &Args<'_>) -> Result<Action, ArgError> {
    Ok(Action::TypeText {
        at: Some(args.point("x", "y")?),
        text: args.str("text")?.to_string(),
        press_enter: args.opt_bool("press_enter")?.unwrap_or(true),
        clear_first: args.opt_bool("clear_before_typing")?.unwrap_or(true),
    })
}

fn key_combination(args: &Args<'_>) -> Result<Action, ArgError> {
    Ok(Action::KeyCombination {
        keys: args.keys("keys")?,
    })
}

fn direction(args: &Args<'_>) -> Result<ScrollDirection, ArgError> {
    ScrollDirection::parse(args.str("direction")?).ok_or(ArgError::Invalid {
        key: "direction",
        expected: "one of up, down, left, right",
    })
}

fn scroll_document(args: &Args<'_>) -> Result<Action, ArgError> {
    Ok(Action::ScrollDocument {
        direction: direction(args)?,
    })
}

fn scroll_at(args: &Args<'_>) -> Result<Action, ArgError> {
    Ok(Action::ScrollAt {
        at: args.point("x", "y")?,
        direction: direction(args)?,
        magnitude: args.opt_f64("magnitude")?.unwrap_or(DEFAULT_MAGNITUDE),
    })
}

fn drag_and_drop(args: &Args<'_>) -> Result<Action, ArgError> {
    Ok(Action::DragAndDrop {
        from: args.point("x", "y")?,
        to: args.point("destination_x", "destination_y")?,
    })
}
