//! End-to-end integration tests for the DeskPilot agent loop.
//!
//! These tests exercise the full pipeline the `replay` command uses: config
//! loading, a scripted model read from disk, a dry-run desktop, and the event
//! stream as a client would see it.

use std::io::Write;
use std::sync::Arc;

use deskpilot_agent::{AgentEvent, AgentLoop, DryRunDesktop, ErrorKind, InputEvent, ScriptedModel};
use deskpilot_config::AppConfig;
use deskpilot_core::action::{Action, MouseButton, Resolution};
use deskpilot_core::event::{DomainEvent, EventBus};
use deskpilot_core::message::Conversation;
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;

// ── Helpers ──────────────────────────────────────────────────────────────

fn write_file(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    path
}

async fn replay(
    config: &AppConfig,
    script: &str,
) -> (Vec<AgentEvent>, Arc<ScriptedModel>, Arc<DryRunDesktop>) {
    let dir = tempfile::tempdir().unwrap();
    let path = write_file(&dir, "script.json", script);

    let model = Arc::new(ScriptedModel::from_file(&path).unwrap());
    let desktop = Arc::new(DryRunDesktop::new(config.display.resolution().unwrap()));
    let engine = AgentLoop::from_config(config, model.clone(), desktop.clone(), Arc::new(EventBus::default()))
        .await
        .unwrap();

    let events: Vec<AgentEvent> = engine
        .stream(Conversation::from_instruction("Fill in the form"), CancellationToken::new())
        .collect()
        .await;
    (events, model, desktop)
}

fn types(events: &[AgentEvent]) -> Vec<&'static str> {
    events.iter().map(AgentEvent::event_type).collect()
}

// ── Tests ────────────────────────────────────────────────────────────────

#[tokio::test(start_paused = true)]
async fn gemini_form_fill_from_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = write_file(
        &dir,
        "config.toml",
        r#"
[display]
width = 1920
height = 1080

[vocabulary]
name = "gemini"
"#,
    );
    let config = AppConfig::load_from(&config_path).unwrap();

    let (events, model, desktop) = replay(
        &config,
        r#"[
            {
                "reasoning": ["The name field is in the middle of the screen."],
                "action_calls": [
                    {"id": "call-1", "name": "type_text_at", "args": {"x": 500, "y": 500, "text": "Ada"}}
                ]
            },
            {
                "action_calls": [
                    {"id": "call-2", "name": "key_combination", "args": {"keys": "Control+S"}}
                ]
            },
            {"reasoning": ["Saved the form."]}
        ]"#,
    )
    .await;

    assert_eq!(
        types(&events),
        vec![
            "reasoning",
            "action",
            "action_completed",
            "action",
            "action_completed",
            "reasoning",
            "done"
        ]
    );
    assert_eq!(
        events[2],
        AgentEvent::ActionCompleted {
            correlation_id: "call-1".into()
        }
    );
    assert_eq!(
        events.last(),
        Some(&AgentEvent::Done {
            summary: Some("Saved the form.".into())
        })
    );

    assert_eq!(
        desktop.inputs(),
        vec![
            InputEvent::Click {
                x: 960,
                y: 540,
                button: MouseButton::Left
            },
            InputEvent::PressKeys {
                keys: vec!["ctrl".into(), "a".into()]
            },
            InputEvent::PressKeys {
                keys: vec!["Delete".into()]
            },
            InputEvent::Write { text: "Ada".into() },
            InputEvent::PressKeys {
                keys: vec!["Return".into()]
            },
            InputEvent::PressKeys {
                keys: vec!["Control".into(), "S".into()]
            },
        ]
    );

    assert_eq!(model.calls(), 3);
    assert!(model.screenshot_seen().iter().all(|seen| *seen));
}

#[tokio::test(start_paused = true)]
async fn anthropic_vocabulary_with_downscaled_screenshots() {
    let mut config = AppConfig::default();
    config.vocabulary.name = "anthropic".into();
    config.display.width = 1920;
    config.display.height = 1080;
    config.display.max_dimension = Some(1280);

    let (events, _model, desktop) = replay(
        &config,
        r#"[
            {"action_calls": [{"name": "left_click", "args": {"coordinate": [640, 360]}}]},
            null
        ]"#,
    )
    .await;

    match &events[0] {
        AgentEvent::Action { action, .. } => match action {
            Action::Click { at, .. } => assert_eq!((at.x, at.y), (960.0, 540.0)),
            other => panic!("Expected Click, got {other:?}"),
        },
        other => panic!("Expected Action, got {other:?}"),
    }
    assert_eq!(
        desktop.inputs(),
        vec![InputEvent::Click {
            x: 960,
            y: 540,
            button: MouseButton::Left
        }]
    );
    assert_eq!(events.last(), Some(&AgentEvent::Done { summary: None }));
}

#[tokio::test]
async fn rate_limit_surfaces_as_quota() {
    let (events, model, _desktop) = replay(
        &AppConfig::default(),
        r#"[{"error": "Too many requests", "status": 429}]"#,
    )
    .await;

    assert_eq!(types(&events), vec!["error", "done"]);
    assert!(matches!(
        events[0],
        AgentEvent::Error {
            kind: ErrorKind::Quota,
            ..
        }
    ));
    assert_eq!(model.calls(), 1);
}

#[tokio::test]
async fn aliases_from_config_reach_the_normalizer() {
    let mut config = AppConfig::default();
    config
        .vocabulary
        .aliases
        .insert("tap".into(), "click_at".into());

    let (events, _model, desktop) = replay(
        &config,
        r#"[{"action_calls": [{"name": "tap", "args": {"x": 0, "y": 0}}]}, null]"#,
    )
    .await;

    assert_eq!(types(&events), vec!["action", "action_completed", "done"]);
    assert_eq!(
        desktop.inputs(),
        vec![InputEvent::Click {
            x: 0,
            y: 0,
            button: MouseButton::Left
        }]
    );
}

#[tokio::test]
async fn unknown_vocabulary_is_rejected_at_construction() {
    let mut config = AppConfig::default();
    config.vocabulary.name = "cobol".into();

    let desktop = Arc::new(DryRunDesktop::new(Resolution::new(64, 48).unwrap()));
    let model = Arc::new(ScriptedModel::new(vec![]));
    let result = AgentLoop::from_config(&config, model, desktop, Arc::new(EventBus::default())).await;
    assert!(result.is_err());
}

#[tokio::test(start_paused = true)]
async fn cancellation_mid_run_ends_with_cancelled_done() {
    let mut config = AppConfig::default();
    config.display.width = 64;
    config.display.height = 48;

    let model = Arc::new(ScriptedModel::repeating(
        serde_json::from_str(r#"{"action_calls": [{"name": "wait_5_seconds", "args": {}}]}"#).unwrap(),
    ));
    let desktop = Arc::new(DryRunDesktop::new(config.display.resolution().unwrap()));
    let bus = Arc::new(EventBus::default());
    let mut domain = bus.subscribe();
    let engine = AgentLoop::from_config(&config, model.clone(), desktop, bus.clone())
        .await
        .unwrap();

    let cancel = CancellationToken::new();
    let mut rx = engine.run(Conversation::from_instruction("wait"), cancel.clone());

    let mut events = vec![];
    while let Some(event) = rx.recv().await {
        if matches!(event, AgentEvent::ActionCompleted { .. }) {
            cancel.cancel();
        }
        events.push(event);
    }

    assert_eq!(model.calls(), 1);
    assert_eq!(
        events.last(),
        Some(&AgentEvent::Done {
            summary: Some("cancelled".into())
        })
    );
    assert!(!events.iter().any(|e| matches!(e, AgentEvent::Error { .. })));

    let mut outcome = None;
    while let Ok(event) = domain.try_recv() {
        if let DomainEvent::RunFinished { outcome: o, .. } = event.as_ref() {
            outcome = Some(o.clone());
        }
    }
    assert_eq!(outcome.as_deref(), Some("cancelled"));
}
