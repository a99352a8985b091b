//! Engine Messages
//!
//! The turn model and the messages sent from the engine to UI surfaces.
//!
//! # Design Philosophy
//!
//! Surfaces are pure renderers. Every change to the conversation is published
//! as a complete [`ConversationSnapshot`], and every transition of the turn
//! state machine is published as an [`EngineState`]. A surface never needs to
//! patch its own copy of the conversation.

use std::time::Duration;

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::ConversationSnapshot;

/// Messages from the engine to a UI surface
#[derive(Clone, Debug)]
pub enum EngineMessage {
    /// The conversation changed; this is the full current sequence
    Conversation {
        /// Immutable view of all turns
        turns: ConversationSnapshot,
    },

    /// The turn state machine moved to a new state
    State {
        /// The new state
        state: EngineState,
    },

    /// The engine is shutting down
    Quit,
}

/// Turn identifier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TurnId(pub Uuid);

impl TurnId {
    /// Generate a new unique turn ID
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TurnId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TurnId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "turn_{}", self.0.simple())
    }
}

/// Who authored a turn
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sender {
    /// The person typing queries
    User,
    /// The answer service, as revealed by the engine
    Assistant,
}

/// One message in the conversation
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    /// Unique turn ID
    pub id: TurnId,
    /// Who sent this turn
    pub sender: Sender,
    /// Full or partially revealed content
    pub text: String,
    /// Wall-clock time the turn was created (user) or finalized (assistant)
    pub timestamp: DateTime<Local>,
    /// How long the remote call took; set once a reveal completes
    #[serde(default, with = "duration_ms")]
    pub response_time: Option<Duration>,
    /// Marks a failure notice rather than a real answer
    #[serde(default)]
    pub is_error: bool,
}

impl Turn {
    /// Create a user turn stamped now
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            id: TurnId::new(),
            sender: Sender::User,
            text: text.into(),
            timestamp: Local::now(),
            response_time: None,
            is_error: false,
        }
    }

    /// Create an assistant turn carrying a (possibly partial) answer
    pub fn assistant(id: TurnId, text: impl Into<String>, timestamp: DateTime<Local>) -> Self {
        Self {
            id,
            sender: Sender::Assistant,
            text: text.into(),
            timestamp,
            response_time: None,
            is_error: false,
        }
    }

    /// Create an assistant failure notice stamped now
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            id: TurnId::new(),
            sender: Sender::Assistant,
            text: text.into(),
            timestamp: Local::now(),
            response_time: None,
            is_error: true,
        }
    }

    /// Attach the final timestamp and response time of a completed reveal
    #[must_use]
    pub fn finalized(mut self, timestamp: DateTime<Local>, response_time: Duration) -> Self {
        self.timestamp = timestamp;
        self.response_time = Some(response_time);
        self
    }

    /// Whether the user wrote this turn
    #[must_use]
    pub fn is_user(&self) -> bool {
        self.sender == Sender::User
    }

    /// Whether this turn carries a final response time
    #[must_use]
    pub fn is_finalized(&self) -> bool {
        self.response_time.is_some()
    }

    /// Response time in whole milliseconds
    #[must_use]
    pub fn response_time_ms(&self) -> Option<u64> {
        self.response_time
            .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }
}

/// Turn controller states
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineState {
    /// Ready for a submit
    #[default]
    Idle,
    /// Query sent, waiting for the answer service
    Dispatching,
    /// Answer received, revealing it character by character
    Revealing,
}

impl EngineState {
    /// Human-readable description
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Idle => "Ready",
            Self::Dispatching => "Loading...",
            Self::Revealing => "Typing...",
        }
    }

    /// True between request dispatch and the answer arriving
    #[must_use]
    pub fn waiting_for_response(&self) -> bool {
        matches!(self, Self::Dispatching)
    }

    /// True while a reveal is running
    #[must_use]
    pub fn is_progressing(&self) -> bool {
        matches!(self, Self::Revealing)
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::ref_option)]
    pub fn serialize<S: Serializer>(value: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => s.serialize_some(&u64::try_from(d.as_millis()).unwrap_or(u64::MAX)),
            None => s.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(d)?.map(Duration::from_millis))
    }
}
