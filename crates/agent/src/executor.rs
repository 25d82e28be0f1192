//! Carries canonical actions out on the remote desktop.
//!
//! Points are resolved to native pixels right before the remote call. Each
//! action reports what it did and how long the display should be left to
//! settle before the next screenshot.

use std::sync::Arc;
use std::time::Duration;

use deskpilot_core::action::{Action, ModelPoint, MouseButton, ScrollDirection};
use deskpilot_core::error::{ExecutionError, RemoteError};
use deskpilot_core::remote::RemoteDesktop;
use tracing::{debug, warn};

use crate::scaler::CoordinateScaler;
use crate::vocabulary::{MAX_WAIT_MS, PIXELS_PER_SCROLL_CLICK, is_navigation_like};

/// Wheel clicks for a whole-document scroll.
const DOCUMENT_SCROLL_CLICKS: u32 = 5;

const POINTER_SETTLE: Duration = Duration::from_millis(400);
const KEY_SETTLE: Duration = Duration::from_millis(300);
const SCROLL_SETTLE: Duration = Duration::from_millis(200);
const DRAG_SETTLE: Duration = Duration::from_millis(300);
const NAVIGATION_SETTLE: Duration = Duration::from_millis(800);

const TYPING_MS_PER_CHAR: u64 = 50;
const TYPING_MIN_MS: u64 = 500;
const SUBMIT_SETTLE: Duration = Duration::from_millis(3_000);

/// Upper bound on wheel clicks for a single scroll.
const MAX_SCROLL_CLICKS: u32 = 50;

/// Something observable that executing an action caused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SideEffect {
    Performed(String),
    Warning(String),
}

impl SideEffect {
    pub fn is_warning(&self) -> bool {
        matches!(self, Self::Warning(_))
    }
}

impl std::fmt::Display for SideEffect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Performed(what) => f.write_str(what),
            Self::Warning(what) => write!(f, "warning: {what}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOutcome {
    pub side_effects: Vec<SideEffect>,
    pub settle_delay: Duration,
}

/// How long the display needs after `action` before it is worth capturing.
pub fn settle_delay(action: &Action) -> Duration {
    match action {
        Action::Click { .. } | Action::DoubleClick { .. } | Action::Move { .. } => POINTER_SETTLE,
        Action::KeyCombination { .. } => KEY_SETTLE,
        Action::ScrollDocument { .. } | Action::ScrollAt { .. } => SCROLL_SETTLE,
        Action::DragAndDrop { .. } => DRAG_SETTLE,
        Action::Wait { duration_ms } => Duration::from_millis((*duration_ms).min(MAX_WAIT_MS)),
        Action::TypeText {
            text, press_enter, ..
        } => {
            if *press_enter {
                SUBMIT_SETTLE
            } else {
                let chars = text.chars().count() as u64;
                Duration::from_millis(chars.saturating_mul(TYPING_MS_PER_CHAR).max(TYPING_MIN_MS))
            }
        }
        Action::Unsupported { raw_name } if is_navigation_like(raw_name) => NAVIGATION_SETTLE,
        Action::Unsupported { .. } => Duration::ZERO,
    }
}

/// Wheel clicks for a scroll of `pixels`, at least one and at most `MAX_SCROLL_CLICKS`.
fn scroll_clicks(pixels: f64) -> u32 {
    let clicks = (pixels / PIXELS_PER_SCROLL_CLICK).round();
    if clicks.is_nan() {
        return 1;
    }
    clicks.clamp(1.0, MAX_SCROLL_CLICKS as f64) as u32
}

pub struct ActionExecutor {
    desktop: Arc<dyn RemoteDesktop>,
    scaler: Arc<CoordinateScaler>,
}

impl ActionExecutor {
    pub fn new(desktop: Arc<dyn RemoteDesktop>, scaler: Arc<CoordinateScaler>) -> Self {
        Self { desktop, scaler }
    }

    /// Execute one action. A remote failure aborts the action immediately.
    pub async fn execute(&self, action: &Action) -> Result<ExecutionOutcome, ExecutionError> {
        let name = action.name();
        let fail = |source: RemoteError| ExecutionError::Remote {
            action: name,
            source,
        };

        let mut side_effects = Vec::new();
        match action {
            Action::Click { at, button } => {
                let (x, y) = self.native(*at);
                self.desktop.click_at(x, y, *button).await.map_err(fail)?;
                side_effects.push(SideEffect::Performed(format!(
                    "{button:?} click at ({x}, {y})"
                )));
            }
            Action::DoubleClick { at } => {
                let (x, y) = self.native(*at);
                self.desktop.double_click_at(x, y).await.map_err(fail)?;
                side_effects.push(SideEffect::Performed(format!("double click at ({x}, {y})")));
            }
            Action::Move { at } => {
                let (x, y) = self.native(*at);
                self.desktop.move_to(x, y).await.map_err(fail)?;
                side_effects.push(SideEffect::Performed(format!("pointer moved to ({x}, {y})")));
            }
            Action::TypeText {
                at,
                text,
                press_enter,
                clear_first,
            } => {
                if let Some(at) = at {
                    let (x, y) = self.native(*at);
                    self.desktop
                        .click_at(x, y, MouseButton::Left)
                        .await
                        .map_err(fail)?;
                    side_effects.push(SideEffect::Performed(format!("focused ({x}, {y})")));
                }
                if *clear_first {
                    self.desktop
                        .press_keys(&["ctrl".to_string(), "a".to_string()])
                        .await
                        .map_err(fail)?;
                    self.desktop
                        .press_keys(&["Delete".to_string()])
                        .await
                        .map_err(fail)?;
                    side_effects.push(SideEffect::Performed("cleared field".into()));
                }
                self.desktop.write(text).await.map_err(fail)?;
                side_effects.push(SideEffect::Performed(format!(
                    "typed {} characters",
                    text.chars().count()
                )));
                if *press_enter {
                    self.desktop
                        .press_keys(&["Return".to_string()])
                        .await
                        .map_err(fail)?;
                    side_effects.push(SideEffect::Performed("pressed Enter".into()));
                }
            }
            Action::KeyCombination { keys } => {
                self.desktop.press_keys(keys).await.map_err(fail)?;
                side_effects.push(SideEffect::Performed(format!("pressed {}", keys.join("+"))));
            }
            Action::ScrollDocument { direction } => {
                if let Some(warning) = horizontal_scroll_warning(*direction) {
                    side_effects.push(warning);
                } else {
                    self.desktop
                        .scroll(*direction, DOCUMENT_SCROLL_CLICKS)
                        .await
                        .map_err(fail)?;
                    side_effects.push(SideEffect::Performed(format!("scrolled document {direction}")));
                }
            }
            Action::ScrollAt {
                at,
                direction,
                magnitude,
            } => {
                if let Some(warning) = horizontal_scroll_warning(*direction) {
                    side_effects.push(warning);
                } else {
                    let (x, y) = self.native(*at);
                    let pixels = self.scaler.scale_length(*magnitude, at.space, true);
                    let clicks = scroll_clicks(pixels);
                    self.desktop.move_to(x, y).await.map_err(fail)?;
                    self.desktop.scroll(*direction, clicks).await.map_err(fail)?;
                    side_effects.push(SideEffect::Performed(format!(
                        "scrolled {direction} {clicks} clicks at ({x}, {y})"
                    )));
                }
            }
            Action::DragAndDrop { from, to } => {
                let from = self.native(*from);
                let to = self.native(*to);
                self.desktop.drag(from, to).await.map_err(fail)?;
                side_effects.push(SideEffect::Performed(format!(
                    "dragged ({}, {}) to ({}, {})",
                    from.0, from.1, to.0, to.1
                )));
            }
            Action::Wait { duration_ms } => {
                side_effects.push(SideEffect::Performed(format!("waited {duration_ms} ms")));
            }
            Action::Unsupported { raw_name } => {
                warn!(action = %raw_name, "Skipping unsupported action");
                side_effects.push(SideEffect::Warning(format!(
                    "'{raw_name}' is not available on this desktop; nothing was done"
                )));
            }
        }

        let outcome = ExecutionOutcome {
            side_effects,
            settle_delay: settle_delay(action),
        };
        debug!(
            action = name,
            settle_ms = outcome.settle_delay.as_millis() as u64,
            "Executed action"
        );
        Ok(outcome)
    }

    fn native(&self, point: ModelPoint) -> (u32, u32) {
        self.scaler.to_native(point)
    }
}

fn horizontal_scroll_warning(direction: ScrollDirection) -> Option<SideEffect> {
    (!direction.is_vertical()).then(|| {
        warn!(%direction, "Horizontal scrolling is not supported");
        SideEffect::Warning(format!("scrolling {direction} is not supported; nothing was done"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replay::{DryRunDesktop, InputEvent};
    use deskpilot_core::action::{CoordinateSpace, Resolution};

    fn setup(width: u32, height: u32) -> (Arc<DryRunDesktop>, ActionExecutor) {
        let native = Resolution::new(width, height).unwrap();
        let desktop = Arc::new(DryRunDesktop::new(native));
        let scaler = Arc::new(CoordinateScaler::with_resolutions(desktop.clone(), native, None));
        (desktop.clone(), ActionExecutor::new(desktop, scaler))
    }

    fn normalized(x: f64, y: f64) -> ModelPoint {
        ModelPoint::new(x, y, CoordinateSpace::Normalized)
    }

    #[tokio::test]
    async fn click_resolves_to_native_pixels() {
        let (desktop, executor) = setup(1920, 1080);
        let outcome = executor
            .execute(&Action::Click {
                at: normalized(500.0, 500.0),
                button: MouseButton::Left,
            })
            .await
            .unwrap();

        assert_eq!(
            desktop.inputs(),
            vec![InputEvent::Click {
                x: 960,
                y: 540,
                button: MouseButton::Left
            }]
        );
        assert_eq!(outcome.settle_delay, Duration::from_millis(400));
    }

    #[tokio::test]
    async fn type_text_focuses_clears_types_and_submits() {
        let (desktop, executor) = setup(1000, 1000);
        executor
            .execute(&Action::TypeText {
                at: Some(normalized(100.0, 200.0)),
                text: "rust".into(),
                press_enter: true,
                clear_first: true,
            })
            .await
            .unwrap();

        assert_eq!(
            desktop.inputs(),
            vec![
                InputEvent::Click {
                    x: 100,
                    y: 200,
                    button: MouseButton::Left
                },
                InputEvent::PressKeys {
                    keys: vec!["ctrl".into(), "a".into()]
                },
                InputEvent::PressKeys {
                    keys: vec!["Delete".into()]
                },
                InputEvent::Write {
                    text: "rust".into()
                },
                InputEvent::PressKeys {
                    keys: vec!["Return".into()]
                },
            ]
        );
    }

    #[tokio::test]
    async fn type_text_without_point_only_writes() {
        let (desktop, executor) = setup(800, 600);
        executor
            .execute(&Action::TypeText {
                at: None,
                text: "hi".into(),
                press_enter: false,
                clear_first: false,
            })
            .await
            .unwrap();
        assert_eq!(desktop.inputs(), vec![InputEvent::Write { text: "hi".into() }]);
    }

    #[tokio::test]
    async fn key_names_pass_through() {
        let (desktop, executor) = setup(800, 600);
        let keys = vec!["Control".to_string(), "Shift".to_string(), "T".to_string()];
        executor
            .execute(&Action::KeyCombination { keys: keys.clone() })
            .await
            .unwrap();
        assert_eq!(desktop.inputs(), vec![InputEvent::PressKeys { keys }]);
    }

    #[tokio::test]
    async fn huge_scroll_is_bounded() {
        let (desktop, executor) = setup(1000, 1000);
        executor
            .execute(&Action::ScrollAt {
                at: ModelPoint::new(10.0, 10.0, CoordinateSpace::Native),
                direction: ScrollDirection::Up,
                magnitude: 1e12,
            })
            .await
            .unwrap();
        assert_eq!(
            desktop.inputs().last(),
            Some(&InputEvent::Scroll {
                direction: ScrollDirection::Up,
                amount: MAX_SCROLL_CLICKS
            })
        );
    }

    #[test]
    fn scroll_clicks_bounds() {
        assert_eq!(scroll_clicks(0.0), 1);
        assert_eq!(scroll_clicks(f64::NAN), 1);
        assert_eq!(scroll_clicks(450.0), 5);
        assert_eq!(scroll_clicks(f64::INFINITY), MAX_SCROLL_CLICKS);
    }

    #[test]
    fn wait_settle_is_bounded() {
        assert_eq!(
            settle_delay(&Action::Wait { duration_ms: u64::MAX }),
            Duration::from_millis(MAX_WAIT_MS)
        );
    }

    #[tokio::test]
    async fn scroll_at_moves_then_scrolls() {
        let (desktop, executor) = setup(1000, 1000);
        executor
            .execute(&Action::ScrollAt {
                at: normalized(500.0, 500.0),
                direction: ScrollDirection::Down,
                magnitude: 300.0,
            })
            .await
            .unwrap();
        // 300/1000 of 1000 px is 300 px, i.e. three wheel clicks
        assert_eq!(
            desktop.inputs(),
            vec![
                InputEvent::MoveTo { x: 500, y: 500 },
                InputEvent::Scroll {
                    direction: ScrollDirection::Down,
                    amount: 3
                },
            ]
        );
    }

    #[tokio::test]
    async fn horizontal_scroll_is_a_warning_noop() {
        let (desktop, executor) = setup(800, 600);
        let outcome = executor
            .execute(&Action::ScrollDocument {
                direction: ScrollDirection::Left,
            })
            .await
            .unwrap();
        assert!(desktop.inputs().is_empty());
        assert!(outcome.side_effects.iter().all(SideEffect::is_warning));
    }

    #[tokio::test]
    async fn unsupported_is_a_warning_noop() {
        let (desktop, executor) = setup(800, 600);
        let outcome = executor
            .execute(&Action::Unsupported {
                raw_name: "navigate".into(),
            })
            .await
            .unwrap();
        assert!(desktop.inputs().is_empty());
        assert!(outcome.side_effects[0].is_warning());
        assert_eq!(outcome.settle_delay, Duration::from_millis(800));
    }

    #[tokio::test]
    async fn wait_never_touches_the_desktop() {
        let (desktop, executor) = setup(800, 600);
        let outcome = executor
            .execute(&Action::Wait { duration_ms: 5_000 })
            .await
            .unwrap();
        assert!(desktop.inputs().is_empty());
        assert_eq!(outcome.settle_delay, Duration::from_secs(5));
    }

    #[tokio::test]
    async fn remote_failure_names_the_action() {
        let native = Resolution::new(800, 600).unwrap();
        let desktop = Arc::new(DryRunDesktop::new(native).failing_on("drag"));
        let scaler = Arc::new(CoordinateScaler::with_resolutions(desktop.clone(), native, None));
        let executor = ActionExecutor::new(desktop, scaler);

        let err = executor
            .execute(&Action::DragAndDrop {
                from: normalized(0.0, 0.0),
                to: normalized(10.0, 10.0),
            })
            .await
            .unwrap_err();
        match err {
            ExecutionError::Remote { action, .. } => assert_eq!(action, "drag_and_drop"),
        }
    }

    #[test]
    fn typing_settle_grows_with_text() {
        let typed = |text: &str, press_enter| Action::TypeText {
            at: None,
            text: text.into(),
            press_enter,
            clear_first: false,
        };
        assert_eq!(settle_delay(&typed("ab", false)), Duration::from_millis(500));
        assert_eq!(settle_delay(&typed(&"x".repeat(20), false)), Duration::from_millis(1000));
        assert_eq!(settle_delay(&typed(&"x".repeat(100), false)), Duration::from_millis(5000));
        assert_eq!(settle_delay(&typed(&"x".repeat(500), false)), Duration::from_millis(25000));
        assert_eq!(settle_delay(&typed("ab", true)), Duration::from_millis(3000));
    }

    #[test]
    fn settle_table() {
        let p = normalized(1.0, 1.0);
        assert_eq!(settle_delay(&Action::Move { at: p }), Duration::from_millis(400));
        assert_eq!(
            settle_delay(&Action::KeyCombination { keys: vec!["a".into()] }),
            Duration::from_millis(300)
        );
        assert_eq!(
            settle_delay(&Action::ScrollDocument {
                direction: ScrollDirection::Up
            }),
            Duration::from_millis(200)
        );
        assert_eq!(
            settle_delay(&Action::DragAndDrop { from: p, to: p }),
            Duration::from_millis(300)
        );
        assert_eq!(
            settle_delay(&Action::Unsupported {
                raw_name: "triple_click".into()
            }),
            Duration::ZERO
        );
    }
}
