//! Input line parsing
//!
//! Turns a line typed at the prompt into a [`SurfaceEvent`].

use chat_core::SurfaceEvent;

/// Map one input line to an event
///
/// `/quit` (or `/exit`) quits and `/stop` stops the running reveal. While a
/// reveal is running an empty line stops it as well. Anything else is
/// submitted exactly as typed; an empty line while idle does nothing.
pub fn parse_line(line: &str, revealing: bool) -> Option<SurfaceEvent> {
    match line.trim() {
        "/quit" | "/exit" => Some(SurfaceEvent::Quit),
        "/stop" => Some(SurfaceEvent::Stop),
        "" if revealing => Some(SurfaceEvent::Stop),
        "" => None,
        _ => Some(SurfaceEvent::submit(line)),
    }
}
