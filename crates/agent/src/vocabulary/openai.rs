//! OpenAI `computer_use_preview` action types.
//!
//! Coordinates are pixels of the screenshot the model was shown.

use deskpilot_core::action::{Action, ActionKind, CoordinateSpace, ModelPoint, MouseButton, ScrollDirection};
use serde_json::Value;

use super::{ArgError, Args, Mapping, VocabEntry, Vocabulary, as_number, wait_ms};

const DEFAULT_WAIT_MS: u64 = 1_000;

pub static VOCABULARY: Vocabulary = Vocabulary {
    name: "openai",
    space: CoordinateSpace::Model,
    entries: &[
        VocabEntry { name: "click", kind: ActionKind::Click, mapping: Mapping::Parse(click) },
        VocabEntry { name: "double_click", kind: ActionKind::DoubleClick, mapping: Mapping::Parse(double_click) },
        VocabEntry { name: "move", kind: ActionKind::Move, mapping: Mapping::Parse(move_to) },
        VocabEntry { name: "type", kind: ActionKind::TypeText, mapping: Mapping::Parse(type_text) },
        VocabEntry { name: "keypress", kind: ActionKind::KeyCombination, mapping: Mapping::Parse(keypress) },
        VocabEntry { name: "scroll", kind: ActionKind::ScrollAt, mapping: Mapping::Parse(scroll) },
        VocabEntry { name: "drag", kind: ActionKind::DragAndDrop, mapping: Mapping::Parse(drag) },
        VocabEntry { name: "wait", kind: ActionKind::Wait, mapping: Mapping::Parse(wait) },
        // The loop captures a fresh screenshot after every turn anyway.
        VocabEntry { name: "screenshot", kind: ActionKind::Wait, mapping: Mapping::Parse(screenshot) },
    ],
};

fn click(args: &Args<'_>) -> Result<Action, ArgError> {
    let button = match args.opt_str("button")?.unwrap_or("left") {
        "left" => MouseButton::Left,
        "right" => MouseButton::Right,
        "wheel" | "middle" => MouseButton::Middle,
        _ => {
            return Err(ArgError::Invalid {
                key: "button",
                expected: "left, right or wheel",
            });
        }
    };
    Ok(Action::Click {
        at: args.point("x", "y")?,
        button,
    })
}

fn double_click(args: &Args<'_>) -> Result<Action, ArgError> {
    Ok(Action::DoubleClick {
        at: args.point("x", "y")?,
    })
}

fn move_to(args: &Args<'_>) -> Result<Action, ArgError> {
    Ok(Action::Move {
        at: args.point("x", "y")?,
    })
}

fn type_text(args: &Args<'_>) -> Result<Action, ArgError> {
    Ok(Action::TypeText {
        at: None,
        text: args.str("text")?.to_string(),
        press_enter: false,
        clear_first: false,
    })
}

fn keypress(args: &Args<'_>) -> Result<Action, ArgError> {
    Ok(Action::KeyCombination {
        keys: args.keys("keys")?,
    })
}

fn scroll(args: &Args<'_>) -> Result<Action, ArgError> {
    let at = args.point("x", "y")?;
    let dx = args.opt_f64("scroll_x")?.unwrap_or(0.0);
    let dy = args.opt_f64("scroll_y")?.unwrap_or(0.0);

    let (direction, magnitude) = if dy != 0.0 {
        (if dy > 0.0 { ScrollDirection::Down } else { ScrollDirection::Up }, dy.abs())
    } else if dx != 0.0 {
        (if dx > 0.0 { ScrollDirection::Right } else { ScrollDirection::Left }, dx.abs())
    } else {
        return Err(ArgError::Invalid {
            key: "scroll_y",
            expected: "a non-zero distance",
        });
    };

    Ok(Action::ScrollAt {
        at,
        direction,
        magnitude,
    })
}

fn drag(args: &Args<'_>) -> Result<Action, ArgError> {
    let invalid = ArgError::Invalid {
        key: "path",
        expected: "a list of at least two {x, y} points",
    };
    let path = args.raw("path")?.as_array().ok_or(invalid.clone())?;
    let points = path
        .iter()
        .map(|p| path_point(p, args.space()))
        .collect::<Option<Vec<_>>>()
        .ok_or(invalid.clone())?;

    match (points.first(), points.last()) {
        (Some(from), Some(to)) if points.len() >= 2 => Ok(Action::DragAndDrop {
            from: *from,
            to: *to,
        }),
        _ => Err(invalid),
    }
}

fn path_point(value: &Value, space: CoordinateSpace) -> Option<ModelPoint> {
    Some(ModelPoint::new(
        as_number(value.get("x")?)?,
        as_number(value.get("y")?)?,
        space,
    ))
}

fn wait(args: &Args<'_>) -> Result<Action, ArgError> {
    let duration_ms = args
        .opt_f64("ms")?
        .map(wait_ms)
        .unwrap_or(DEFAULT_WAIT_MS);
    Ok(Action::Wait { duration_ms })
}

fn screenshot(_args: &Args<'_>) -> Result<Action, ArgError> {
    Ok(Action::Wait { duration_ms: 0 })
}
