//! Turn Controller - The Orchestration Core
//!
//! The controller runs one turn cycle at a time:
//! - records the user's query in the conversation store
//! - asks the answer service
//! - reveals the answer through the typing simulator
//! - finalizes the turn with its timestamp and response time
//!
//! # Design Philosophy
//!
//! The controller is UI-agnostic. It owns the [`ConversationStore`] and the
//! single active reveal, and talks to a surface only through
//! [`EngineMessage`]s on an mpsc channel plus a few query methods. Surfaces
//! drive it with [`SurfaceEvent`]s or the direct methods below.
//!
//! # State Machine
//!
//! ```text
//!          submit               answer
//!   Idle ──────────► Dispatching ──────► Revealing
//!    ▲                   │                  │
//!    │      failure      │                  │ completed / stop
//!    ├───────────────────┘                  │
//!    └──────────────────────────────────────┘
//! ```

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;

use crate::backend::{Answer, AnswerBackend};
use crate::config::{ChatConfig, DEFAULT_FAILURE_MESSAGE};
use crate::events::SurfaceEvent;
use crate::messages::{EngineMessage, EngineState, Turn, TurnId};
use crate::store::{ConversationSnapshot, ConversationStore};
use crate::typing::{Pace, RevealEvent, RevealHandle, RevealTask, TieredPace};

/// Turn controller configuration
#[derive(Clone, Debug)]
pub struct ControllerConfig {
    /// Text of the error turn appended when the answer service fails
    pub failure_message: String,
    /// Capacity of the reveal event channel
    pub reveal_buffer: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            failure_message: DEFAULT_FAILURE_MESSAGE.to_string(),
            reveal_buffer: 64,
        }
    }
}

impl From<&ChatConfig> for ControllerConfig {
    fn from(config: &ChatConfig) -> Self {
        Self {
            failure_message: config.failure_message.clone(),
            ..Self::default()
        }
    }
}

/// Why a submit was not acted on
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RejectReason {
    /// The text was empty after trimming whitespace
    EmptyInput,
    /// A turn cycle is already in progress
    Busy,
}

/// Result of [`TurnController::submit`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Nothing changed
    Ignored(RejectReason),
    /// The answer arrived and its reveal is running
    Revealing,
    /// The answer was empty and the turn was finalized at once
    Completed,
    /// The answer service failed; an error turn was appended
    Failed,
}

/// The reveal currently feeding the last assistant turn
struct ActiveReveal {
    handle: RevealHandle,
    events: mpsc::Receiver<RevealEvent>,
    turn_id: TurnId,
    text: String,
    /// Provisional timestamp shown while revealing
    started_at: DateTime<Local>,
    elapsed: Duration,
    /// Whether the assistant turn is already in the store
    placed: bool,
}

/// The Turn Controller - headless turn orchestration
pub struct TurnController<B: AnswerBackend> {
    /// Configuration
    config: ControllerConfig,
    /// Answer service
    backend: Arc<B>,
    /// Conversation turns
    store: ConversationStore,
    /// Per-character delay for reveals
    pace: Arc<dyn Pace>,
    /// Current turn-cycle state
    state: EngineState,
    /// Channel to send messages to the UI surface
    tx: mpsc::Sender<EngineMessage>,
    /// At most one reveal at a time
    reveal: Option<ActiveReveal>,
}

impl<B: AnswerBackend> TurnController<B> {
    /// Create a new controller with the default pace
    pub fn new(backend: B, config: ControllerConfig, tx: mpsc::Sender<EngineMessage>) -> Self {
        Self {
            config,
            backend: Arc::new(backend),
            store: ConversationStore::new(),
            pace: Arc::new(TieredPace::default()),
            state: EngineState::Idle,
            tx,
            reveal: None,
        }
    }

    /// Replace the pace function
    #[must_use]
    pub fn with_pace(mut self, pace: impl Pace + 'static) -> Self {
        self.pace = Arc::new(pace);
        self
    }

    /// The answer service in use
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Current state
    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Immutable view of the conversation
    pub fn turns(&self) -> ConversationSnapshot {
        self.store.snapshot()
    }

    /// True between dispatch and the answer arriving
    pub fn waiting_for_response(&self) -> bool {
        self.state.waiting_for_response()
    }

    /// True while a reveal is running
    pub fn is_progressing(&self) -> bool {
        self.state.is_progressing()
    }

    /// Submit a user query and wait for the answer service
    ///
    /// Returns once the answer arrived (and its reveal started) or the call
    /// failed. The text is sent exactly as given; whitespace is trimmed only
    /// to detect empty input.
    pub async fn submit(&mut self, text: impl Into<String>) -> SubmitOutcome {
        let text = text.into();

        if self.state != EngineState::Idle {
            tracing::warn!(state = ?self.state, "Submit ignored, turn cycle in progress");
            return SubmitOutcome::Ignored(RejectReason::Busy);
        }
        if text.trim().is_empty() {
            tracing::debug!("Submit ignored, empty input");
            return SubmitOutcome::Ignored(RejectReason::EmptyInput);
        }

        let user_turn = Turn::user(text.clone());
        tracing::info!(turn_id = %user_turn.id, chars = text.chars().count(), "User turn");
        self.store.append(user_turn);
        self.publish().await;
        self.set_state(EngineState::Dispatching).await;

        match self.backend.ask(&text).await {
            Ok(answer) => self.begin_reveal(answer).await,
            Err(e) => {
                tracing::warn!(
                    backend = self.backend.name(),
                    error = %e,
                    "Answer service failed"
                );
                self.store
                    .append(Turn::error(self.config.failure_message.clone()));
                self.publish().await;
                self.set_state(EngineState::Idle).await;
                SubmitOutcome::Failed
            }
        }
    }

    async fn begin_reveal(&mut self, answer: Answer) -> SubmitOutcome {
        let turn_id = TurnId::new();

        if answer.text.is_empty() {
            let turn = Turn::assistant(turn_id, String::new(), Local::now())
                .finalized(Local::now(), answer.elapsed);
            tracing::info!(%turn_id, elapsed_ms = answer.elapsed_ms(), "Empty answer finalized");
            self.store.append(turn);
            self.publish().await;
            self.set_state(EngineState::Idle).await;
            return SubmitOutcome::Completed;
        }

        let char_count = answer.text.chars().count();
        let delay = self.pace.char_delay(answer.elapsed, char_count);
        tracing::debug!(
            %turn_id,
            chars = char_count,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            fallback = answer.fallback,
            "Starting reveal"
        );

        let (handle, events) =
            RevealTask::spawn(answer.text.clone(), delay, self.config.reveal_buffer);
        self.reveal = Some(ActiveReveal {
            handle,
            events,
            turn_id,
            text: answer.text,
            started_at: Local::now(),
            elapsed: answer.elapsed,
            placed: false,
        });
        self.set_state(EngineState::Revealing).await;
        SubmitOutcome::Revealing
    }

    /// Wait for the next reveal event and apply it
    ///
    /// Returns `false` when no reveal is active.
    pub async fn next_reveal_event(&mut self) -> bool {
        let Some(active) = self.reveal.as_mut() else {
            return false;
        };
        let event = active.events.recv().await;
        self.apply(event).await;
        true
    }

    /// Apply reveal events that are already buffered, without waiting
    ///
    /// Returns `true` if anything was applied.
    pub async fn poll_reveal(&mut self) -> bool {
        let mut applied = false;
        while let Some(active) = self.reveal.as_mut() {
            match active.events.try_recv() {
                Ok(event) => self.apply(Some(event)).await,
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => self.apply(None).await,
            }
            applied = true;
        }
        applied
    }

    /// Apply reveal events until the active reveal ends
    pub async fn finish_reveal(&mut self) {
        while self.next_reveal_event().await {}
    }

    async fn apply(&mut self, event: Option<RevealEvent>) {
        match event {
            Some(RevealEvent::Progress(prefix)) => {
                let Some(active) = self.reveal.as_mut() else {
                    return;
                };
                let turn = Turn::assistant(active.turn_id, prefix, active.started_at);
                if active.placed {
                    self.store.replace_last(turn);
                } else {
                    active.placed = true;
                    self.store.append(turn);
                }
                self.publish().await;
            }
            Some(RevealEvent::Completed) => {
                let Some(active) = self.reveal.take() else {
                    return;
                };
                let turn = Turn::assistant(active.turn_id, active.text, active.started_at)
                    .finalized(Local::now(), active.elapsed);
                tracing::info!(
                    turn_id = %active.turn_id,
                    response_ms = turn.response_time_ms(),
                    "Answer revealed"
                );
                if active.placed {
                    self.store.replace_last(turn);
                } else {
                    self.store.append(turn);
                }
                self.publish().await;
                self.set_state(EngineState::Idle).await;
            }
            Some(RevealEvent::Cancelled) | None => {
                if let Some(active) = self.reveal.take() {
                    tracing::debug!(turn_id = %active.turn_id, "Reveal ended early");
                }
                self.set_state(EngineState::Idle).await;
            }
        }
    }

    /// Stop the running reveal
    ///
    /// The partially revealed text stays in the store without a response
    /// time. Returns `false` (and changes nothing) when no reveal is running.
    pub async fn stop(&mut self) -> bool {
        if self.state != EngineState::Revealing {
            return false;
        }
        if let Some(active) = self.reveal.take() {
            active.handle.cancel();
            tracing::info!(turn_id = %active.turn_id, "Reveal stopped");
        }
        self.set_state(EngineState::Idle).await;
        true
    }

    /// Handle an event from the UI surface
    pub async fn handle_event(&mut self, event: SurfaceEvent) {
        match event {
            SurfaceEvent::Submit { text } => {
                let outcome = self.submit(text).await;
                tracing::debug!(?outcome, "Submit handled");
            }
            SurfaceEvent::Stop => {
                self.stop().await;
            }
            SurfaceEvent::Quit => self.shutdown().await,
        }
    }

    /// Stop any reveal and tell the surface to quit
    pub async fn shutdown(&mut self) {
        self.stop().await;
        self.send(EngineMessage::Quit).await;
    }

    /// Set state and notify UI
    async fn set_state(&mut self, state: EngineState) {
        self.state = state;
        self.send(EngineMessage::State { state }).await;
    }

    /// Publish the current conversation
    async fn publish(&self) {
        self.send(EngineMessage::Conversation {
            turns: self.store.snapshot(),
        })
        .await;
    }

    /// Send a message to the UI surface
    async fn send(&self, msg: EngineMessage) {
        if let Err(e) = self.tx.send(msg).await {
            tracing::warn!("Failed to send message to surface: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnswerError;
    use crate::messages::Sender;
    use crate::typing::FixedPace;
    use pretty_assertions::assert_eq;

    /// Mock backend for testing
    struct MockBackend {
        reply: Result<&'static str, ()>,
    }

    #[async_trait::async_trait]
    impl AnswerBackend for MockBackend {
        fn name(&self) -> &str {
            "Mock"
        }

        async fn health_check(&self) -> bool {
            true
        }

        async fn ask(&self, _query: &str) -> Result<Answer, AnswerError> {
            match self.reply {
                Ok(text) => Ok(Answer::new(text, Duration::from_millis(50))),
                Err(()) => Err(AnswerError::Timeout),
            }
        }
    }

    fn controller(
        reply: Result<&'static str, ()>,
    ) -> (TurnController<MockBackend>, mpsc::Receiver<EngineMessage>) {
        let (tx, rx) = mpsc::channel(256);
        let controller = TurnController::new(MockBackend { reply }, ControllerConfig::default(), tx)
            .with_pace(FixedPace(Duration::from_millis(5)));
        (controller, rx)
    }

    #[tokio::test]
    async fn test_controller_creation() {
        let (controller, _rx) = controller(Ok("hi"));

        assert_eq!(controller.state(), EngineState::Idle);
        assert!(controller.turns().is_empty());
        assert!(!controller.waiting_for_response());
        assert!(!controller.is_progressing());
        assert_eq!(controller.backend().name(), "Mock");
    }

    #[tokio::test]
    async fn test_whitespace_submit_is_ignored() {
        let (mut controller, mut rx) = controller(Ok("hi"));

        let outcome = controller.submit("  \n\t ").await;

        assert_eq!(outcome, SubmitOutcome::Ignored(RejectReason::EmptyInput));
        assert!(controller.turns().is_empty());
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_submit_while_revealing_is_busy() {
        let (mut controller, _rx) = controller(Ok("a long answer"));

        assert_eq!(controller.submit("first").await, SubmitOutcome::Revealing);
        let outcome = controller.submit("second").await;

        assert_eq!(outcome, SubmitOutcome::Ignored(RejectReason::Busy));
        assert_eq!(controller.turns().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_query_text_kept_as_typed() {
        let (mut controller, _rx) = controller(Ok("ok"));

        controller.submit("  spaced out  ").await;

        let turns = controller.turns();
        assert_eq!(turns[0].text, "  spaced out  ");
        assert_eq!(turns[0].sender, Sender::User);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_appends_error_turn() {
        let (mut controller, _rx) = controller(Err(()));

        let outcome = controller.submit("hello").await;

        assert_eq!(outcome, SubmitOutcome::Failed);
        assert_eq!(controller.state(), EngineState::Idle);
        let turns = controller.turns();
        assert_eq!(turns.len(), 2);
        assert!(turns[1].is_error);
        assert_eq!(turns[1].text, DEFAULT_FAILURE_MESSAGE);
        assert!(!controller.next_reveal_event().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_answer_is_finalized_directly() {
        let (mut controller, _rx) = controller(Ok(""));

        let outcome = controller.submit("hello").await;

        assert_eq!(outcome, SubmitOutcome::Completed);
        assert_eq!(controller.state(), EngineState::Idle);
        let last = controller.turns()[1].clone();
        assert_eq!(last.text, "");
        assert_eq!(last.response_time, Some(Duration::from_millis(50)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_finish_reveal_finalizes_turn() {
        let (mut controller, _rx) = controller(Ok("Hey"));

        controller.submit("hi").await;
        assert!(controller.is_progressing());
        controller.finish_reveal().await;

        assert_eq!(controller.state(), EngineState::Idle);
        let turns = controller.turns();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[1].text, "Hey");
        assert_eq!(turns[1].response_time, Some(Duration::from_millis(50)));
        assert!(!turns[1].is_error);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_reveal_applies_buffered_events() {
        let (mut controller, _rx) = controller(Ok("abc"));

        controller.submit("q").await;
        assert!(!controller.poll_reveal().await);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(controller.poll_reveal().await);

        assert_eq!(controller.state(), EngineState::Idle);
        assert_eq!(controller.turns()[1].text, "abc");
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_when_idle_does_nothing() {
        let (mut controller, mut rx) = controller(Ok("hi"));

        assert!(!controller.stop().await);
        assert_eq!(controller.state(), EngineState::Idle);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_quit_publishes_quit() {
        let (mut controller, mut rx) = controller(Ok("hi"));

        controller.handle_event(SurfaceEvent::Quit).await;

        assert!(matches!(rx.recv().await, Some(EngineMessage::Quit)));
    }
}
