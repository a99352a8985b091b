//! Typing Simulator
//!
//! Reveals an answer character by character so it reads like live typing.
//!
//! # Pieces
//!
//! - [`Pace`]: computes the per-character delay from response latency and
//!   answer length. [`TieredPace`] is the default: near-instant for fast
//!   responses, quicker for short answers than for long ones.
//! - [`prefixes`]: the lazy, finite sequence of growing prefixes.
//! - [`RevealTask`]: runs that sequence on the runtime and reports
//!   [`RevealEvent`]s; the [`RevealHandle`] cancels it.
//!
//! # Example
//!
//! ```ignore
//! use chat_core::typing::{Pace, RevealEvent, RevealTask, TieredPace};
//!
//! let delay = TieredPace::default().char_delay(answer.elapsed, answer.text.chars().count());
//! let (handle, mut events) = RevealTask::spawn(answer.text, delay, 64);
//! while let Some(event) = events.recv().await {
//!     if let RevealEvent::Progress(prefix) = event {
//!         render(&prefix);
//!     }
//! }
//! ```

mod pace;
mod reveal;

pub use pace::{default_tiers, FixedPace, Pace, PaceTier, TieredPace};
pub use reveal::{prefixes, RevealEvent, RevealHandle, RevealTask};
