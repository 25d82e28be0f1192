//! Anthropic `computer` tool actions.
//!
//! Coordinates arrive as `[x, y]` pairs in screenshot pixels; key
//! combinations arrive xdotool-style ("ctrl+s").

use deskpilot_core::action::{Action, ActionKind, CoordinateSpace, MouseButton, ScrollDirection};

use super::{ArgError, Args, Mapping, PIXELS_PER_SCROLL_CLICK, VocabEntry, Vocabulary, wait_ms};

const DEFAULT_SCROLL_CLICKS: f64 = 3.0;

pub static VOCABULARY: Vocabulary = Vocabulary {
    name: "anthropic",
    space: CoordinateSpace::Model,
    entries: &[
        VocabEntry { name: "key", kind: ActionKind::KeyCombination, mapping: Mapping::Parse(key) },
        VocabEntry { name: "type", kind: ActionKind::TypeText, mapping: Mapping::Parse(type_text) },
        VocabEntry { name: "mouse_move", kind: ActionKind::Move, mapping: Mapping::Parse(mouse_move) },
        VocabEntry { name: "left_click", kind: ActionKind::Click, mapping: Mapping::Parse(left_click) },
        VocabEntry { name: "right_click", kind: ActionKind::Click, mapping: Mapping::Parse(right_click) },
        VocabEntry { name: "middle_click", kind: ActionKind::Click, mapping: Mapping::Parse(middle_click) },
        VocabEntry { name: "double_click", kind: ActionKind::DoubleClick, mapping: Mapping::Parse(double_click) },
        VocabEntry { name: "left_click_drag", kind: ActionKind::DragAndDrop, mapping: Mapping::Parse(left_click_drag) },
        VocabEntry { name: "scroll", kind: ActionKind::ScrollAt, mapping: Mapping::Parse(scroll) },
        VocabEntry { name: "wait", kind: ActionKind::Wait, mapping: Mapping::Parse(wait) },
        VocabEntry { name: "screenshot", kind: ActionKind::Wait, mapping: Mapping::Parse(screenshot) },
        VocabEntry { name: "cursor_position", kind: ActionKind::Unsupported, mapping: Mapping::Unsupported },
        VocabEntry { name: "triple_click", kind: ActionKind::Unsupported, mapping: Mapping::Unsupported },
        VocabEntry { name: "left_mouse_down", kind: ActionKind::Unsupported, mapping: Mapping::Unsupported },
        VocabEntry { name: "left_mouse_up", kind: ActionKind::Unsupported, mapping: Mapping::Unsupported },
        VocabEntry { name: "hold_key", kind: ActionKind::Unsupported, mapping: Mapping::Unsupported },
    ],
};

fn key(args: &Args<'_>) -> Result<Action, ArgError> {
    Ok(Action::KeyCombination {
        keys: args.keys("text")?,
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

fn mouse_move(args: &Args<'_>) -> Result<Action, ArgError> {
    Ok(Action::Move {
        at: args.pair("coordinate")?,
    })
}

fn click_with(args: &Args<'_>, button: MouseButton) -> Result<Action, ArgError> {
    Ok(Action::Click {
        at: args.pair("coordinate")?,
        button,
    })
}

fn left_click(args: &Args<'_>) -> Result<Action, ArgError> {
    click_with(args, MouseButton::Left)
}

fn right_click(args: &Args<'_>) -> Result<Action, ArgError> {
    click_with(args, MouseButton::Right)
}

fn middle_click(args: &Args<'_>) -> Result<Action, ArgError> {
    click_with(args, MouseButton::Middle)
}

fn double_click(args: &Args<'_>) -> Result<Action, ArgError> {
    Ok(Action::DoubleClick {
        at: args.pair("coordinate")?,
    })
}

fn left_click_drag(args: &Args<'_>) -> Result<Action, ArgError> {
    Ok(Action::DragAndDrop {
        from: args.pair("start_coordinate")?,
        to: args.pair("coordinate")?,
    })
}

fn scroll(args: &Args<'_>) -> Result<Action, ArgError> {
    let direction = ScrollDirection::parse(args.str("scroll_direction")?).ok_or(
        ArgError::Invalid {
            key: "scroll_direction",
            expected: "one of up, down, left, right",
        },
    )?;

    // Without a coordinate the whole document scrolls.
    let Some(at) = args.opt_pair("coordinate")? else {
        return Ok(Action::ScrollDocument { direction });
    };

    let clicks = args
        .opt_f64("scroll_amount")?
        .unwrap_or(DEFAULT_SCROLL_CLICKS)
        .max(1.0);
    Ok(Action::ScrollAt {
        at,
        direction,
        magnitude: clicks * PIXELS_PER_SCROLL_CLICK,
    })
}

fn wait(args: &Args<'_>) -> Result<Action, ArgError> {
    let seconds = args.opt_f64("duration")?.unwrap_or(1.0);
    Ok(Action::Wait {
        duration_ms: wait_ms(seconds * 1000.0),
    })
}

fn screenshot(_args: &Args<'_>) -> Result<Action, ArgError> {
    Ok(Action::Wait { duration_ms: 0 })
}
