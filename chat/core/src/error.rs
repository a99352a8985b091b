//! Error types for the chat engine.
//!
//! None of these escape the turn controller: an [`AnswerError`] becomes a
//! single error turn, an empty submit is ignored, and cancellation is a normal
//! state transition.

use thiserror::Error;

/// Failures of a single answer-service round trip
#[derive(Debug, Error)]
pub enum AnswerError {
    /// Connection, DNS, TLS or body read failure
    #[error("transport error: {0}")]
    Transport(String),

    /// The request did not complete within the client timeout
    #[error("request timed out")]
    Timeout,

    /// The service answered with a non-success status
    #[error("answer service returned {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body, possibly empty
        body: String,
    },

    /// The outgoing payload could not be encoded
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The response body was not JSON
    #[error("invalid response body: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for AnswerError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout
        } else if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

/// Failures while encoding an outgoing payload
#[derive(Debug, Error)]
pub enum CodecError {
    /// JSON serialization failed
    #[error("payload serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Compression failed
    #[error("payload compression failed: {0}")]
    Compress(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_answer_error_display() {
        assert_eq!(AnswerError::Timeout.to_string(), "request timed out");

        let err = AnswerError::Status {
            status: 503,
            body: "busy".to_string(),
        };
        assert_eq!(err.to_string(), "answer service returned 503: busy");

        let err = AnswerError::Transport("connection refused".to_string());
        assert_eq!(err.to_string(), "transport error: connection refused");
    }

    #[test]
    fn test_codec_error_is_transparent() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        let err: AnswerError = CodecError::from(io).into();
        assert!(matches!(err, AnswerError::Codec(CodecError::Compress(_))));
        assert_eq!(err.to_string(), "payload compression failed: disk full");
    }
}
