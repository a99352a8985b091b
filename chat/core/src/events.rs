//! Surface Events
//!
//! Events sent from UI surfaces to the turn controller. Surfaces report what
//! the user did; the controller decides what it means.

use serde::{Deserialize, Serialize};

/// Events from UI surface to the turn controller
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SurfaceEvent {
    /// User submitted a query
    Submit {
        /// Text exactly as typed
        text: String,
    },

    /// User asked to stop the running reveal
    Stop,

    /// User wants to quit
    Quit,
}

impl SurfaceEvent {
    /// Create a submit event
    pub fn submit(text: impl Into<String>) -> Self {
        Self::Submit { text: text.into() }
    }
}
