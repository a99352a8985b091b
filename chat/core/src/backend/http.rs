//! HTTP Answer Backend
//!
//! Talks to the answer service over HTTP. One `POST` per query, body
//! `{ "q": <query> }` encoded by the configured [`PayloadCodec`], response a
//! JSON array of results of which only the first one's `answer` is used.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{CONTENT_ENCODING, CONTENT_TYPE};

use super::codec::{GzipJsonCodec, PayloadCodec, QueryPayload};
use super::traits::{Answer, AnswerBackend, NO_ANSWER_TEXT};
use crate::config::ServiceConfig;
use crate::error::AnswerError;

/// Default answer service endpoint
pub const DEFAULT_ENDPOINT: &str = "http://localhost/answer";

/// HTTP answer service client
pub struct HttpAnswerBackend {
    /// Full URL of the answer endpoint
    endpoint: String,
    /// HTTP client (carries the timeout)
    http_client: reqwest::Client,
    /// Request body encoder
    codec: Box<dyn PayloadCodec>,
    /// Text returned when the service has no usable answer
    no_answer_text: String,
}

impl HttpAnswerBackend {
    /// Create a backend with gzip-compressed payloads and the given timeout
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, AnswerError> {
        let http_client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            endpoint: endpoint.into(),
            http_client,
            codec: Box::new(GzipJsonCodec::default()),
            no_answer_text: NO_ANSWER_TEXT.to_string(),
        })
    }

    /// Create from the `[service]` configuration section
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &ServiceConfig, no_answer_text: &str) -> Result<Self, AnswerError> {
        Ok(Self::new(config.endpoint.clone(), config.timeout)?
            .with_codec(config.compression.codec())
            .with_no_answer_text(no_answer_text))
    }

    /// Replace the payload codec
    #[must_use]
    pub fn with_codec(mut self, codec: Box<dyn PayloadCodec>) -> Self {
        self.codec = codec;
        self
    }

    /// Replace the no-answer sentinel text
    #[must_use]
    pub fn with_no_answer_text(mut self, text: impl Into<String>) -> Self {
        self.no_answer_text = text.into();
        self
    }

    /// The configured endpoint
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Name of the active payload codec
    #[must_use]
    pub fn codec_name(&self) -> &'static str {
        self.codec.name()
    }
}

/// Pick the first result's answer out of a response body
///
/// Anything other than a non-empty string in `[0].answer` yields `None`.
#[must_use]
pub fn first_answer(body: &serde_json::Value) -> Option<&str> {
    body.as_array()?
        .first()?
        .get("answer")?
        .as_str()
        .filter(|s| !s.is_empty())
}

#[async_trait]
impl AnswerBackend for HttpAnswerBackend {
    fn name(&self) -> &'static str {
        "HTTP"
    }

    async fn health_check(&self) -> bool {
        // Any HTTP response means the service is reachable.
        self.http_client
            .head(&self.endpoint)
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .is_ok()
    }

    async fn ask(&self, query: &str) -> Result<Answer, AnswerError> {
        let payload = self.codec.encode(&QueryPayload { q: query })?;

        let mut request = self
            .http_client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, payload.content_type);
        if let Some(encoding) = payload.content_encoding {
            request = request.header(CONTENT_ENCODING, encoding);
        }

        let start = Instant::now();
        let response = request.body(payload.body).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(AnswerError::Status { status, body });
        }

        let bytes = response.bytes().await?;
        let elapsed = start.elapsed();

        let data: serde_json::Value =
            serde_json::from_slice(&bytes).map_err(|e| AnswerError::Decode(e.to_string()))?;

        match first_answer(&data) {
            Some(text) => Ok(Answer::new(text, elapsed)),
            None => {
                tracing::debug!(
                    endpoint = %self.endpoint,
                    "Answer service returned no usable answer"
                );
                Ok(Answer::fallback(self.no_answer_text.clone(), elapsed))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::codec::JsonCodec;
    use serde_json::json;

    #[test]
    fn test_backend_creation() {
        let backend = HttpAnswerBackend::new(DEFAULT_ENDPOINT, Duration::from_secs(1)).unwrap();
        assert_eq!(backend.endpoint(), "http://localhost/answer");
        assert_eq!(backend.codec_name(), "gzip");
        assert_eq!(backend.name(), "HTTP");

        let backend = backend.with_codec(Box::new(JsonCodec));
        assert_eq!(backend.codec_name(), "none");
    }

    #[test]
    fn test_first_answer() {
        assert_eq!(first_answer(&json!([{"answer": "Hi there"}])), Some("Hi there"));
        assert_eq!(
            first_answer(&json!([{"answer": "first"}, {"answer": "second"}])),
            Some("first")
        );
    }

    #[test]
    fn test_first_answer_unusable() {
        assert_eq!(first_answer(&json!([])), None);
        assert_eq!(first_answer(&json!([{}])), None);
        assert_eq!(first_answer(&json!([{"answer": ""}])), None);
        assert_eq!(first_answer(&json!([{"answer": 42}])), None);
        assert_eq!(first_answer(&json!({"answer": "not a list"})), None);
        // Only the first result counts.
        assert_eq!(first_answer(&json!([{}, {"answer": "late"}])), None);
    }
}
