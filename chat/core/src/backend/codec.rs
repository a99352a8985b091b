//! Payload Codecs
//!
//! Serialization and compression of the outgoing query. The answer service
//! accepts `{ "q": <query> }`, either as plain JSON or gzip-compressed JSON.

use std::io::Write;

use flate2::write::GzEncoder;
use flate2::Compression;
use serde::{Deserialize, Serialize};

use crate::error::CodecError;

/// The request body sent to the answer service
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryPayload<'a> {
    /// The user's query, as typed
    pub q: &'a str,
}

/// An encoded request body plus the headers describing it
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedPayload {
    /// Raw body bytes
    pub body: Vec<u8>,
    /// Value for the `Content-Type` header
    pub content_type: &'static str,
    /// Value for the `Content-Encoding` header, if any
    pub content_encoding: Option<&'static str>,
}

/// Turns a query payload into request bytes
pub trait PayloadCodec: Send + Sync {
    /// Short name used in logs and configuration
    fn name(&self) -> &'static str;

    /// Encode a payload
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or compression fails.
    fn encode(&self, payload: &QueryPayload<'_>) -> Result<EncodedPayload, CodecError>;
}

/// Plain JSON body
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonCodec;

impl PayloadCodec for JsonCodec {
    fn name(&self) -> &'static str {
        "none"
    }

    fn encode(&self, payload: &QueryPayload<'_>) -> Result<EncodedPayload, CodecError> {
        Ok(EncodedPayload {
            body: serde_json::to_vec(payload)?,
            content_type: "application/json",
            content_encoding: None,
        })
    }
}

/// JSON body compressed with gzip
#[derive(Clone, Copy, Debug)]
pub struct GzipJsonCodec {
    level: u32,
}

impl GzipJsonCodec {
    /// Create a codec with an explicit compression level (0-9)
    #[must_use]
    pub fn with_level(level: u32) -> Self {
        Self {
            level: level.min(9),
        }
    }
}

impl Default for GzipJsonCodec {
    fn default() -> Self {
        Self { level: 6 }
    }
}

impl PayloadCodec for GzipJsonCodec {
    fn name(&self) -> &'static str {
        "gzip"
    }

    fn encode(&self, payload: &QueryPayload<'_>) -> Result<EncodedPayload, CodecError> {
        let json = serde_json::to_vec(payload)?;
        let mut encoder = GzEncoder::new(Vec::with_capacity(json.len()), Compression::new(self.level));
        encoder.write_all(&json)?;
        Ok(EncodedPayload {
            body: encoder.finish()?,
            content_type: "application/json",
            content_encoding: Some("gzip"),
        })
    }
}

/// Codec selection as it appears in configuration
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PayloadCompression {
    /// Plain JSON
    None,
    /// Gzip-compressed JSON
    #[default]
    Gzip,
}

impl PayloadCompression {
    /// Build the codec for this selection
    #[must_use]
    pub fn codec(self) -> Box<dyn PayloadCodec> {
        match self {
            Self::None => Box::new(JsonCodec),
            Self::Gzip => Box::new(GzipJsonCodec::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Read;

    use flate2::read::GzDecoder;
    use pretty_assertions::assert_eq;
    use tokio_test::assert_ok;

    use super::*;

    #[test]
    fn test_json_codec_body() {
        let encoded = assert_ok!(JsonCodec.encode(&QueryPayload { q: "hello" }));
        assert_eq!(encoded.body, br#"{"q":"hello"}"#.to_vec());
        assert_eq!(encoded.content_type, "application/json");
        assert_eq!(encoded.content_encoding, None);
    }

    #[test]
    fn test_gzip_codec_decompresses_to_json() {
        let encoded = assert_ok!(GzipJsonCodec::default().encode(&QueryPayload { q: "hello" }));
        assert_eq!(encoded.content_encoding, Some("gzip"));

        let mut decoded = String::new();
        assert_ok!(GzDecoder::new(encoded.body.as_slice()).read_to_string(&mut decoded));
        assert_eq!(decoded, r#"{"q":"hello"}"#);
    }

    #[test]
    fn test_gzip_level_is_clamped() {
        let codec = GzipJsonCodec::with_level(42);
        assert_eq!(codec.level, 9);
    }

    #[test]
    fn test_compression_selection() {
        assert_eq!(PayloadCompression::default(), PayloadCompression::Gzip);
        assert_eq!(PayloadCompression::None.codec().name(), "none");
        assert_eq!(PayloadCompression::Gzip.codec().name(), "gzip");

        let parsed: PayloadCompression = serde_json::from_str(r#""none""#).unwrap();
        assert_eq!(parsed, PayloadCompression::None);
    }
}
