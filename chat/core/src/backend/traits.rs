//! Answer Backend Traits
//!
//! Trait definitions for answer services. The turn controller only talks to
//! an [`AnswerBackend`], so tests and alternative transports plug in without
//! touching the state machine.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::AnswerError;

/// Text used when the service answered but had nothing usable
pub const NO_ANSWER_TEXT: &str = "No answer available";

/// A successful answer-service round trip
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Answer {
    /// Answer text to reveal
    pub text: String,
    /// Wall-clock time from dispatch to full response
    pub elapsed: Duration,
    /// True when `text` is the no-answer sentinel rather than service output
    pub fallback: bool,
}

impl Answer {
    /// An answer taken from the service's result set
    pub fn new(text: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            text: text.into(),
            elapsed,
            fallback: false,
        }
    }

    /// The sentinel answer for a result set with no usable answer
    pub fn fallback(text: impl Into<String>, elapsed: Duration) -> Self {
        Self {
            text: text.into(),
            elapsed,
            fallback: true,
        }
    }

    /// Elapsed time in whole milliseconds
    #[must_use]
    pub fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.elapsed.as_millis()).unwrap_or(u64::MAX)
    }
}

/// Answer service trait
///
/// Implementations make exactly one attempt per call; retries are not part
/// of the contract.
#[async_trait]
pub trait AnswerBackend: Send + Sync {
    /// Get the backend name (e.g., "HTTP")
    fn name(&self) -> &str;

    /// Check if the backend is reachable
    async fn health_check(&self) -> bool;

    /// Send one query and wait for its answer
    async fn ask(&self, query: &str) -> Result<Answer, AnswerError>;
}
