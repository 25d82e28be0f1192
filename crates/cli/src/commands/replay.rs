//! `deskpilot replay` — drive the real agent loop from a script.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use deskpilot_agent::{AgentEvent, AgentLoop, DryRunDesktop, ScriptedModel};
use deskpilot_config::AppConfig;
use deskpilot_core::event::EventBus;
use deskpilot_core::message::Conversation;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub struct ReplayArgs {
    pub script: PathBuf,
    pub instruction: String,
    pub vocabulary: Option<String>,
    pub config: Option<PathBuf>,
}

pub async fn run(args: ReplayArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => AppConfig::load_path(path)?,
        None => AppConfig::load()?,
    };
    if let Some(name) = args.vocabulary {
        config.vocabulary.name = name;
    }

    let model = Arc::new(ScriptedModel::from_file(&args.script)?);
    let desktop = Arc::new(DryRunDesktop::new(config.display.resolution()?));
    let engine = AgentLoop::from_config(&config, model.clone(), desktop.clone(), Arc::new(EventBus::default())).await?;

    let cancel = CancellationToken::new();
    let on_ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received, cancelling run");
            on_ctrl_c.cancel();
        }
    });

    let events = engine.run(Conversation::from_instruction(args.instruction), cancel);
    let failed = print_events(events, &mut std::io::stdout().lock()).await?;

    info!(
        model_calls = model.calls(),
        inputs = desktop.inputs().len(),
        screenshots = desktop.captures(),
        "Replay finished"
    );

    if failed {
        return Err("replay ended with an error event".into());
    }
    Ok(())
}

/// Write each event as one JSON line. Returns whether an `error` event was seen.
async fn print_events(
    mut events: mpsc::Receiver<AgentEvent>,
    out: &mut impl Write,
) -> Result<bool, Box<dyn std::error::Error>> {
    let mut failed = false;
    while let Some(event) = events.recv().await {
        failed |= matches!(event, AgentEvent::Error { .. });
        writeln!(out, "{}", serde_json::to_string(&event)?)?;
        out.flush()?;
    }
    Ok(failed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use deskpilot_agent::ErrorKind;

    #[tokio::test]
    async fn events_become_json_lines() {
        let (tx, rx) = mpsc::channel(4);
        tx.send(AgentEvent::Reasoning { text: "hi".into() }).await.unwrap();
        tx.send(AgentEvent::Done { summary: None }).await.unwrap();
        drop(tx);

        let mut out = Vec::new();
        let failed = print_events(rx, &mut out).await.unwrap();
        assert!(!failed);

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines, vec![r#"{"type":"reasoning","text":"hi"}"#, r#"{"type":"done"}"#]);
    }

    #[tokio::test]
    async fn error_events_are_reported() {
        let (tx, rx) = mpsc::channel(4);
        tx.send(AgentEvent::Error {
            kind: ErrorKind::Quota,
            message: "429".into(),
        })
        .await
        .unwrap();
        drop(tx);

        let mut out = Vec::new();
        assert!(print_events(rx, &mut out).await.unwrap());
    }
}
