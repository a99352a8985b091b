//! Answer Service Integration
//!
//! Access to the remote answer service through a common trait interface.
//!
//! # Available Backends
//!
//! - **HTTP**: `POST {"q": ...}` to a configurable endpoint (default)
//!
//! # Usage
//!
//! ```ignore
//! use chat_core::backend::{AnswerBackend, HttpAnswerBackend};
//!
//! let backend = HttpAnswerBackend::new("http://localhost/answer", Duration::from_secs(30))?;
//! let answer = backend.ask("What is a turn?").await?;
//! println!("{} ({}ms)", answer.text, answer.elapsed_ms());
//! ```

pub mod codec;
mod http;
mod traits;

pub use codec::{
    EncodedPayload, GzipJsonCodec, JsonCodec, PayloadCodec, PayloadCompression, QueryPayload,
};
pub use http::{first_answer, HttpAnswerBackend, DEFAULT_ENDPOINT};
pub use traits::{Answer, AnswerBackend, NO_ANSWER_TEXT};
