//! Chat Core - Headless Chat Interaction Engine
//!
//! This crate runs the turn cycle of a question-and-answer chat: it records
//! the user's query, asks a remote answer service, and reveals the answer
//! character by character as if it were being typed. It knows nothing about
//! terminals, windows or widgets; any presentation layer can drive it.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        UI Surfaces                            │
//! │        ┌──────────────┐            ┌──────────────────┐       │
//! │        │  chat-term   │            │ Headless / Tests │       │
//! │        └──────┬───────┘            └────────┬─────────┘       │
//! │               └──────────────┬──────────────┘                 │
//! │                      SurfaceEvent (up)                        │
//! │                     EngineMessage (down)                      │
//! └──────────────────────────────┼────────────────────────────────┘
//!                                │
//! ┌──────────────────────────────┼────────────────────────────────┐
//! │                         CHAT CORE                             │
//! │  ┌───────────────────────────┴─────────────────────────────┐  │
//! │  │                    TurnController                        │  │
//! │  │  ┌──────────────┐  ┌──────────────┐  ┌────────────────┐  │  │
//! │  │  │ Conversation │  │    Answer    │  │     Typing     │  │  │
//! │  │  │    Store     │  │   Backend    │  │   Simulator    │  │  │
//! │  │  └──────────────┘  └──────────────┘  └────────────────┘  │  │
//! │  └──────────────────────────────────────────────────────────┘  │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Key Types
//!
//! - [`TurnController`]: Owns the conversation and runs one turn at a time
//! - [`EngineMessage`]: Messages sent from the controller to UI surfaces
//! - [`SurfaceEvent`]: Events sent from UI surfaces to the controller
//! - [`ConversationStore`]: Append-only turn list handing out snapshots
//! - [`HttpAnswerBackend`]: The answer service client
//! - [`RevealTask`]: Cancellable character-by-character reveal
//!
//! # Quick Start
//!
//! ```ignore
//! use chat_core::{ControllerConfig, HttpAnswerBackend, TurnController};
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let (tx, mut rx) = mpsc::channel(256);
//!
//!     let backend = HttpAnswerBackend::new("http://localhost/answer", Duration::from_secs(30))?;
//!     let mut controller = TurnController::new(backend, ControllerConfig::default(), tx);
//!
//!     controller.submit("What is a turn?").await;
//!     while controller.next_reveal_event().await {
//!         while let Ok(msg) = rx.try_recv() {
//!             // Render message to UI
//!         }
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Module Overview
//!
//! - [`backend`]: Answer service abstraction and HTTP client
//! - [`config`]: TOML, environment and CLI configuration
//! - [`controller`]: The turn state machine
//! - [`display`]: Formatting shared by surfaces
//! - [`error`]: Error types
//! - [`events`]: Events from UI surfaces to the controller
//! - [`messages`]: Turn model and messages to UI surfaces
//! - [`store`]: Conversation store and snapshots
//! - [`typing`]: Pace functions and the reveal task

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod backend;
pub mod config;
pub mod controller;
pub mod display;
pub mod error;
pub mod events;
pub mod messages;
pub mod store;
pub mod typing;

// Re-exports for convenience
pub use backend::{
    Answer, AnswerBackend, GzipJsonCodec, HttpAnswerBackend, JsonCodec, PayloadCodec,
    PayloadCompression,
};
pub use controller::{ControllerConfig, RejectReason, SubmitOutcome, TurnController};
pub use error::{AnswerError, CodecError};
pub use events::SurfaceEvent;
pub use messages::{EngineMessage, EngineState, Sender, Turn, TurnId};
pub use store::{ConversationSnapshot, ConversationStore};
pub use typing::{FixedPace, Pace, RevealEvent, RevealHandle, RevealTask, TieredPace};

// Config exports
pub use config::{
    default_config_path, load_config, load_config_from_path, ChatConfig, ChatToml, ConfigError,
    ConfigOverrides, ConfigSource,
};
