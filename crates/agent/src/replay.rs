//! Offline collaborators for replaying a run without a model or a desktop.
//!
//! [`ScriptedModel`] answers from a fixed list of steps; [`DryRunDesktop`]
//! records every input it receives and hands back blank frames. The CLI
//! `replay` command wires them into a real [`AgentLoop`](crate::AgentLoop),
//! and the tests use them as doubles.

use std::collections::VecDeque;
use std::io::Cursor;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use deskpilot_core::action::{MouseButton, Resolution, ScrollDirection};
use deskpilot_core::error::{ModelError, RemoteError};
use deskpilot_core::message::Conversation;
use deskpilot_core::model::{ActionSchema, ModelClient, ModelResponse};
use deskpilot_core::remote::RemoteDesktop;
use image::{DynamicImage, ImageFormat, RgbImage};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One scripted model reply.
///
/// In JSON: `{"error": "...", "status": 429}` fails the call, `null` is a
/// reply with no candidate, and any other object is a [`ModelResponse`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum ScriptStep {
    Fail {
        error: String,
        #[serde(default)]
        status: Option<u16>,
    },
    Respond(ModelResponse),
    NoCandidate,
}

impl ScriptStep {
    fn into_result(self) -> Result<Option<ModelResponse>, ModelError> {
        match self {
            Self::Respond(response) => Ok(Some(response)),
            Self::NoCandidate => Ok(None),
            Self::Fail { error, status } => Err(match status {
                Some(429) => ModelError::RateLimited(error),
                Some(401 | 403) => ModelError::AuthenticationFailed(error),
                status => ModelError::ApiError {
                    status_code: status.unwrap_or(500),
                    message: error,
                },
            }),
        }
    }
}

/// A model client that replays canned steps in order.
///
/// When the steps run out it repeats the fallback response if one is set,
/// otherwise it reports no candidate.
pub struct ScriptedModel {
    steps: Mutex<VecDeque<ScriptStep>>,
    fallback: Option<ModelResponse>,
    calls: AtomicUsize,
    saw_screenshot: Mutex<Vec<bool>>,
}

impl ScriptedModel {
    pub fn new(steps: Vec<ScriptStep>) -> Self {
        Self {
            steps: Mutex::new(steps.into()),
            fallback: None,
            calls: AtomicUsize::new(0),
            saw_screenshot: Mutex::new(Vec::new()),
        }
    }

    /// A model that answers every call with `response`.
    pub fn repeating(response: ModelResponse) -> Self {
        Self::new(vec![]).with_fallback(response)
    }

    pub fn with_fallback(mut self, response: ModelResponse) -> Self {
        self.fallback = Some(response);
        self
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let steps: Vec<ScriptStep> = serde_json::from_str(json)?;
        Ok(Self::new(steps))
    }

    pub fn from_file(path: &Path) -> Result<Self, deskpilot_core::Error> {
        let json = std::fs::read_to_string(path).map_err(|e| deskpilot_core::Error::Config {
            message: format!("Failed to read script {}: {e}", path.display()),
        })?;
        Ok(Self::from_json(&json)?)
    }

    /// How many times `generate` has been called.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// For each call, whether the newest turn carried a screenshot.
    pub fn screenshot_seen(&self) -> Vec<bool> {
        lock(&self.saw_screenshot).clone()
    }
}

#[async_trait]
impl ModelClient for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(
        &self,
        conversation: &Conversation,
        _schema: &ActionSchema,
    ) -> Result<Option<ModelResponse>, ModelError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        lock(&self.saw_screenshot).push(conversation.last().is_some_and(|t| t.has_image()));

        let step = lock(&self.steps).pop_front();
        debug!(call, scripted = step.is_some(), "Scripted model call");
        match step {
            Some(step) => step.into_result(),
            None => Ok(self.fallback.clone()),
        }
    }
}

/// An input the dry-run desktop received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum InputEvent {
    MoveTo { x: u32, y: u32 },
    Click { x: u32, y: u32, button: MouseButton },
    DoubleClick { x: u32, y: u32 },
    Write { text: String },
    PressKeys { keys: Vec<String> },
    Scroll { direction: ScrollDirection, amount: u32 },
    Drag { from: (u32, u32), to: (u32, u32) },
}

/// A desktop that performs nothing and remembers everything.
pub struct DryRunDesktop {
    resolution: Resolution,
    inputs: Mutex<Vec<InputEvent>>,
    frame: Mutex<Option<Arc<Vec<u8>>>>,
    captures: AtomicUsize,
    failing_on: Option<String>,
    url: Option<String>,
}

impl DryRunDesktop {
    pub fn new(resolution: Resolution) -> Self {
        Self {
            resolution,
            inputs: Mutex::new(Vec::new()),
            frame: Mutex::new(None),
            captures: AtomicUsize::new(0),
            failing_on: None,
            url: None,
        }
    }

    /// Make the named operation (e.g. `"click_at"`, `"capture_screenshot"`) fail.
    pub fn failing_on(mut self, operation: impl Into<String>) -> Self {
        self.failing_on = Some(operation.into());
        self
    }

    /// Serve these bytes as every screenshot instead of a blank frame.
    pub fn with_frame(self, bytes: Vec<u8>) -> Self {
        *lock(&self.frame) = Some(Arc::new(bytes));
        self
    }

    /// Report this URL as the focused page.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn resolution(&self) -> Resolution {
        self.resolution
    }

    pub fn inputs(&self) -> Vec<InputEvent> {
        lock(&self.inputs).clone()
    }

    pub fn captures(&self) -> usize {
        self.captures.load(Ordering::SeqCst)
    }

    fn check(&self, operation: &str) -> Result<(), RemoteError> {
        match &self.failing_on {
            Some(failing) if failing == operation => Err(RemoteError::InputFailed {
                operation: operation.to_string(),
                reason: "dry-run failure injected".into(),
            }),
            _ => Ok(()),
        }
    }

    fn record(&self, operation: &str, event: InputEvent) -> Result<(), RemoteError> {
        self.check(operation)?;
        info!(desktop = "dry-run", input = ?event, "Input");
        lock(&self.inputs).push(event);
        Ok(())
    }

    fn blank_frame(&self) -> Result<Arc<Vec<u8>>, RemoteError> {
        let mut cached = lock(&self.frame);
        if let Some(frame) = cached.as_ref() {
            return Ok(frame.clone());
        }

        let image = DynamicImage::ImageRgb8(RgbImage::new(
            self.resolution.width,
            self.resolution.height,
        ));
        let mut out = Cursor::new(Vec::new());
        image
            .write_to(&mut out, ImageFormat::Png)
            .map_err(|e| RemoteError::CaptureFailed(e.to_string()))?;

        let frame = Arc::new(out.into_inner());
        *cached = Some(frame.clone());
        Ok(frame)
    }
}

#[async_trait]
impl RemoteDesktop for DryRunDesktop {
    fn name(&self) -> &str {
        "dry-run"
    }

    async fn native_resolution(&self) -> Result<Resolution, RemoteError> {
        self.check("native_resolution")?;
        Ok(self.resolution)
    }

    async fn move_to(&self, x: u32, y: u32) -> Result<(), RemoteError> {
        self.record("move_to", InputEvent::MoveTo { x, y })
    }

    async fn click_at(&self, x: u32, y: u32, button: MouseButton) -> Result<(), RemoteError> {
        self.record("click_at", InputEvent::Click { x, y, button })
    }

    async fn double_click_at(&self, x: u32, y: u32) -> Result<(), RemoteError> {
        self.record("double_click_at", InputEvent::DoubleClick { x, y })
    }

    async fn write(&self, text: &str) -> Result<(), RemoteError> {
        self.record(
            "write",
            InputEvent::Write {
                text: text.to_string(),
            },
        )
    }

    async fn press_keys(&self, keys: &[String]) -> Result<(), RemoteError> {
        self.record(
            "press_keys",
            InputEvent::PressKeys {
                keys: keys.to_vec(),
            },
        )
    }

    async fn scroll(&self, direction: ScrollDirection, amount: u32) -> Result<(), RemoteError> {
        self.record("scroll", InputEvent::Scroll { direction, amount })
    }

    async fn drag(&self, from: (u32, u32), to: (u32, u32)) -> Result<(), RemoteError> {
        self.record("drag", InputEvent::Drag { from, to })
    }

    async fn capture_screenshot(&self) -> Result<Vec<u8>, RemoteError> {
        self.check("capture_screenshot")?;
        self.captures.fetch_add(1, Ordering::SeqCst);
        Ok(self.blank_frame()?.as_ref().clone())
    }

    async fn current_url(&self) -> Result<Option<String>, RemoteError> {
        Ok(self.url.clone())
    }
}
