//! The Act-Observe loop.
//!
//! One run owns one conversation. Each iteration asks the model for the next
//! step, carries out every proposed action in order, waits once for the UI to
//! settle, and appends the model's turn plus a fresh observation before asking
//! again. Progress is reported on an ordered event channel; internals are
//! published on the domain [`EventBus`].

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use deskpilot_config::AppConfig;
use deskpilot_core::error::{Error, ExecutionError, ModelError, ScreenshotError};
use deskpilot_core::event::{DomainEvent, EventBus};
use deskpilot_core::message::{Conversation, Part, Role, Turn};
use deskpilot_core::model::ModelClient;
use deskpilot_core::remote::RemoteDesktop;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::executor::{ActionExecutor, SideEffect};
use crate::normalizer::ActionNormalizer;
use crate::scaler::CoordinateScaler;
use crate::stream_event::{AgentEvent, ErrorKind, EventEmitter};

pub const DEFAULT_MAX_ITERATIONS: u32 = 50;
pub const DEFAULT_EVENT_BUFFER: usize = 128;

const CANCELLED_SUMMARY: &str = "cancelled";

/// The computer-use agent loop.
///
/// Cheap to clone; every collaborator is shared. Each call to [`run`](Self::run)
/// starts an independent run on its own task.
#[derive(Clone)]
pub struct AgentLoop {
    /// The model proposing actions
    model: Arc<dyn ModelClient>,

    /// The desktop under control
    desktop: Arc<dyn RemoteDesktop>,

    /// Desktop geometry and screenshots
    scaler: Arc<CoordinateScaler>,

    /// Carries actions out on the desktop
    executor: Arc<ActionExecutor>,

    /// Provider vocabulary → canonical actions
    normalizer: Arc<ActionNormalizer>,

    /// Observer side-channel
    event_bus: Arc<EventBus>,

    /// Model calls allowed per run
    max_iterations: u32,

    /// Capacity of the event channel handed to the caller
    event_buffer: usize,
}

/// Mutable state of one run. Dropped when the run ends.
struct RunState {
    conversation: Conversation,
    iteration: u32,
    cancel: CancellationToken,
    last_known_url: Option<String>,
}

/// Why a run stopped short of completing.
enum Stop {
    Cancelled,
    LimitReached,
    Failed(Error),
}

impl From<Error> for Stop {
    fn from(e: Error) -> Self {
        Self::Failed(e)
    }
}

impl From<ModelError> for Stop {
    fn from(e: ModelError) -> Self {
        Self::Failed(e.into())
    }
}

impl From<ExecutionError> for Stop {
    fn from(e: ExecutionError) -> Self {
        Self::Failed(e.into())
    }
}

impl From<ScreenshotError> for Stop {
    fn from(e: ScreenshotError) -> Self {
        Self::Failed(e.into())
    }
}

/// What one executed action reports back to the model.
struct ActionReport {
    correlation_id: String,
    name: String,
    success: bool,
    side_effects: Vec<String>,
}

impl AgentLoop {
    /// Create a new agent loop over an already connected scaler.
    pub fn new(
        model: Arc<dyn ModelClient>,
        desktop: Arc<dyn RemoteDesktop>,
        scaler: CoordinateScaler,
        normalizer: ActionNormalizer,
        event_bus: Arc<EventBus>,
    ) -> Self {
        let scaler = Arc::new(scaler);
        Self {
            model,
            executor: Arc::new(ActionExecutor::new(desktop.clone(), scaler.clone())),
            desktop,
            scaler,
            normalizer: Arc::new(normalizer),
            event_bus,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            event_buffer: DEFAULT_EVENT_BUFFER,
        }
    }

    /// Build a loop from configuration, reading the desktop's resolution.
    pub async fn from_config(
        config: &AppConfig,
        model: Arc<dyn ModelClient>,
        desktop: Arc<dyn RemoteDesktop>,
        event_bus: Arc<EventBus>,
    ) -> Result<Self, Error> {
        let scaler = CoordinateScaler::connect(desktop.clone(), config.display.max_dimension).await?;
        let normalizer = ActionNormalizer::for_vocabulary(&config.vocabulary.name)?
            .with_aliases(config.vocabulary.aliases.clone());

        Ok(Self::new(model, desktop, scaler, normalizer, event_bus)
            .with_max_iterations(config.agent.max_iterations)
            .with_event_buffer(config.agent.event_buffer))
    }

    /// Set the maximum number of model calls per run.
    pub fn with_max_iterations(mut self, max: u32) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn with_event_buffer(mut self, capacity: usize) -> Self {
        self.event_buffer = capacity;
        self
    }

    pub fn max_iterations(&self) -> u32 {
        self.max_iterations
    }

    pub fn scaler(&self) -> &CoordinateScaler {
        &self.scaler
    }

    /// Start a run on a new task and return its event stream.
    ///
    /// The stream always ends with exactly one `Done`. Cancelling `cancel`,
    /// or dropping the receiver, stops the run at the next iteration boundary.
    pub fn run(&self, conversation: Conversation, cancel: CancellationToken) -> mpsc::Receiver<AgentEvent> {
        let (emitter, rx) = EventEmitter::channel(self.event_buffer);
        let engine = self.clone();
        tokio::spawn(async move {
            engine.drive(conversation, emitter, cancel).await;
        });
        rx
    }

    /// Same as [`run`](Self::run), as a `Stream`.
    pub fn stream(&self, conversation: Conversation, cancel: CancellationToken) -> ReceiverStream<AgentEvent> {
        ReceiverStream::new(self.run(conversation, cancel))
    }

    async fn drive(self, conversation: Conversation, mut emitter: EventEmitter, cancel: CancellationToken) {
        let conversation_id = conversation.id.to_string();
        info!(
            conversation_id = %conversation_id,
            model = self.model.name(),
            vocabulary = self.normalizer.vocabulary().name,
            max_iterations = self.max_iterations,
            "Starting agent run"
        );

        let mut state = RunState {
            conversation,
            iteration: 0,
            cancel,
            last_known_url: None,
        };
        let result = self.iterate(&mut state, &mut emitter).await;

        let outcome = match result {
            Ok(summary) => {
                emitter.emit(AgentEvent::Done { summary }).await;
                "completed"
            }
            Err(Stop::Cancelled) => {
                info!(conversation_id = %conversation_id, "Run cancelled");
                emitter
                    .emit(AgentEvent::Done {
                        summary: Some(CANCELLED_SUMMARY.into()),
                    })
                    .await;
                "cancelled"
            }
            Err(Stop::LimitReached) => {
                warn!(
                    conversation_id = %conversation_id,
                    max_iterations = self.max_iterations,
                    "Iteration limit reached"
                );
                emitter
                    .emit(AgentEvent::Error {
                        kind: ErrorKind::LimitReached,
                        message: format!(
                            "Stopped after {} iterations without finishing",
                            self.max_iterations
                        ),
                    })
                    .await;
                emitter.emit(AgentEvent::Done { summary: None }).await;
                "limit_reached"
            }
            Err(Stop::Failed(e)) => {
                let kind = classify(&e);
                warn!(conversation_id = %conversation_id, ?kind, error = %e, "Run failed");
                emitter
                    .emit(AgentEvent::Error {
                        kind,
                        message: e.to_string(),
                    })
                    .await;
                emitter.emit(AgentEvent::Done { summary: None }).await;
                "error"
            }
        };

        info!(
            conversation_id = %conversation_id,
            outcome,
            iterations = state.iteration,
            "Agent run finished"
        );
        self.event_bus.publish(DomainEvent::RunFinished {
            conversation_id,
            outcome: outcome.to_string(),
            iterations: state.iteration,
            timestamp: Utc::now(),
        });
    }

    /// Iterate until the model is done. `Ok` carries the final summary.
    async fn iterate(&self, state: &mut RunState, emitter: &mut EventEmitter) -> Result<Option<String>, Stop> {
        let schema = self.normalizer.schema(self.scaler.model_resolution());

        loop {
            if state.cancel.is_cancelled() || emitter.is_closed() {
                return Err(Stop::Cancelled);
            }
            if state.iteration >= self.max_iterations {
                return Err(Stop::LimitReached);
            }

            self.ensure_observation(state).await?;

            let iteration = state.iteration + 1;
            debug!(iteration, turns = state.conversation.len(), "Calling model");
            let started = Instant::now();
            let response = self.model.generate(&state.conversation, &schema).await;
            self.event_bus.publish(DomainEvent::ModelCalled {
                conversation_id: state.conversation.id.to_string(),
                iteration,
                action_calls: match &response {
                    Ok(Some(r)) => r.action_calls.len(),
                    _ => 0,
                },
                duration_ms: started.elapsed().as_millis() as u64,
                timestamp: Utc::now(),
            });

            let Some(response) = response?.filter(|r| !r.is_empty()) else {
                info!(iteration, "Model returned no content; finishing");
                return Ok(None);
            };

            let reasoning = response.reasoning_text();
            if let Some(text) = &reasoning {
                emit(emitter, AgentEvent::Reasoning { text: text.clone() }).await?;
            }
            if response.action_calls.is_empty() {
                info!(iteration, "Model proposed no actions; task complete");
                return Ok(reasoning);
            }

            info!(iteration, actions = response.action_calls.len(), "Executing model turn");

            let mut agent_parts: Vec<Part> = reasoning.into_iter().map(Part::text).collect();
            let mut reports = Vec::with_capacity(response.action_calls.len());
            let mut settle = Duration::ZERO;

            for call in &response.action_calls {
                let correlation_id = call
                    .id
                    .clone()
                    .unwrap_or_else(|| Uuid::new_v4().to_string());
                agent_parts.push(Part::ActionCall {
                    correlation_id: correlation_id.clone(),
                    name: call.name.clone(),
                    args: call.args.clone(),
                });

                let normalized = self.normalizer.normalize(call);
                if let Some(reason) = normalized.degraded {
                    self.event_bus.publish(DomainEvent::ActionDegraded {
                        raw_name: call.name.clone(),
                        reason,
                        timestamp: Utc::now(),
                    });
                }

                emit(
                    emitter,
                    AgentEvent::Action {
                        action: self.scaler.resolve_action(&normalized.action),
                        correlation_id: correlation_id.clone(),
                    },
                )
                .await?;

                let started = Instant::now();
                let result = self.executor.execute(&normalized.action).await;
                self.event_bus.publish(DomainEvent::ActionExecuted {
                    action: normalized.action.name().to_string(),
                    success: result.is_ok(),
                    duration_ms: started.elapsed().as_millis() as u64,
                    timestamp: Utc::now(),
                });
                let outcome = result?;

                settle = settle.max(outcome.settle_delay);
                reports.push(ActionReport {
                    correlation_id: correlation_id.clone(),
                    name: call.name.clone(),
                    success: !outcome.side_effects.iter().any(SideEffect::is_warning),
                    side_effects: outcome.side_effects.iter().map(ToString::to_string).collect(),
                });

                emit(emitter, AgentEvent::ActionCompleted { correlation_id }).await?;
            }

            if !settle.is_zero() {
                debug!(settle_ms = settle.as_millis() as u64, "Waiting for the display to settle");
                tokio::select! {
                    _ = tokio::time::sleep(settle) => {}
                    _ = state.cancel.cancelled() => return Err(Stop::Cancelled),
                }
            }

            let screenshot = self.scaler.capture_screenshot().await?;
            match self.desktop.current_url().await {
                Ok(Some(url)) => state.last_known_url = Some(url),
                Ok(None) => {}
                Err(e) => debug!(error = %e, "Could not read the current URL"),
            }

            let mut observation: Vec<Part> = reports
                .into_iter()
                .map(|r| Part::ActionResult {
                    correlation_id: r.correlation_id,
                    name: r.name,
                    success: r.success,
                    side_effects: r.side_effects,
                    url: state.last_known_url.clone(),
                })
                .collect();
            observation.push(screenshot.to_part());

            state.conversation.push(Turn::agent(agent_parts));
            state.conversation.push(Turn::new(Role::User, observation));
            state.iteration = iteration;
        }
    }

    /// Make sure the newest turn carries a screenshot before the model sees it.
    async fn ensure_observation(&self, state: &mut RunState) -> Result<(), Stop> {
        if state.conversation.last().is_some_and(Turn::has_image) {
            return Ok(());
        }
        let screenshot = self.scaler.capture_screenshot().await?;
        debug!(resolution = %screenshot.resolution, "Captured initial observation");
        state
            .conversation
            .push(Turn::new(Role::User, vec![screenshot.to_part()]));
        Ok(())
    }
}

async fn emit(emitter: &mut EventEmitter, event: AgentEvent) -> Result<(), Stop> {
    if emitter.emit(event).await {
        Ok(())
    } else {
        Err(Stop::Cancelled)
    }
}

/// Map a run failure onto the category reported to clients.
pub fn classify(error: &Error) -> ErrorKind {
    match error {
        Error::Model(ModelError::RateLimited(_)) => ErrorKind::Quota,
        Error::Model(ModelError::AuthenticationFailed(_)) => ErrorKind::Auth,
        Error::Model(e) => ErrorKind::classify_message(&e.to_string()),
        _ => ErrorKind::Generic,
    }
}
