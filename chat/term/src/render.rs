//! Transcript rendering
//!
//! Converts engine messages into text for a line-oriented terminal. The
//! renderer remembers how much of the conversation it has already written,
//! so each snapshot only produces the new characters.

use chat_core::display::{format_duration, format_timestamp, text_blocks};
use chat_core::{ConversationSnapshot, EngineMessage, EngineState, Sender, Turn};

/// Incremental transcript renderer
#[derive(Debug, Default)]
pub struct Renderer {
    /// Turns written completely
    done: usize,
    /// Characters written of the turn at index `done`
    partial_chars: usize,
    /// Most recent conversation
    latest: ConversationSnapshot,
}

impl Renderer {
    /// Create a renderer for an empty conversation
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one engine message, returning the text to write
    pub fn apply(&mut self, msg: &EngineMessage) -> String {
        match msg {
            EngineMessage::Conversation { turns } => {
                self.latest = turns.clone();
                self.render_turns()
            }
            EngineMessage::State { state } => self.render_state(*state),
            EngineMessage::Quit => "Bye.\n".to_string(),
        }
    }

    fn render_turns(&mut self) -> String {
        let mut out = String::new();
        let turns = self.latest.clone();

        while let Some(turn) = turns.get(self.done) {
            let is_last = self.done + 1 == turns.len();
            match turn.sender {
                // Already echoed by the terminal
                Sender::User => self.done += 1,
                Sender::Assistant if turn.is_error => {
                    for block in text_blocks(&turn.text) {
                        out.push_str("! ");
                        out.push_str(block);
                        out.push('\n');
                    }
                    self.done += 1;
                }
                Sender::Assistant => {
                    out.extend(turn.text.chars().skip(self.partial_chars));
                    self.partial_chars = turn.text.chars().count();
                    if is_last && !turn.is_finalized() {
                        break;
                    }
                    self.finish_turn(turn, &mut out);
                }
            }
        }
        out
    }

    fn render_state(&mut self, state: EngineState) -> String {
        match state {
            EngineState::Dispatching => format!("{}\n", state.description()),
            EngineState::Revealing => String::new(),
            EngineState::Idle => {
                // A stopped reveal never gets a final snapshot
                let latest = self.latest.clone();
                let mut out = String::new();
                if let Some(turn) = latest.get(self.done) {
                    if turn.sender == Sender::Assistant {
                        self.finish_turn(turn, &mut out);
                    }
                }
                out
            }
        }
    }

    fn finish_turn(&mut self, turn: &Turn, out: &mut String) {
        out.push('\n');
        out.push_str(&footer(turn));
        out.push('\n');
        self.done += 1;
        self.partial_chars = 0;
    }
}

/// `HH:MM · <response time>` line shown under an answer
pub fn footer(turn: &Turn) -> String {
    let time = format_timestamp(&turn.timestamp);
    match turn.response_time {
        Some(elapsed) => format!("  {time} · {}", format_duration(elapsed)),
        None => format!("  {time}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chat_core::{ConversationStore, TurnId};
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn conversation(store: &ConversationStore) -> EngineMessage {
        EngineMessage::Conversation {
            turns: store.snapshot(),
        }
    }

    #[test]
    fn test_reveal_is_written_incrementally() {
        let mut renderer = Renderer::new();
        let mut store = ConversationStore::new();
        let id = TurnId::new();

        store.append(Turn::user("hello"));
        assert_eq!(renderer.apply(&conversation(&store)), "");

        let partial = Turn::assistant(id, "Hi", chrono::Local::now());
        let stamp = partial.timestamp;
        store.append(partial);
        assert_eq!(renderer.apply(&conversation(&store)), "Hi");

        store.replace_last(Turn::assistant(id, "Hi there", stamp));
        assert_eq!(renderer.apply(&conversation(&store)), " there");

        let done = Turn::assistant(id, "Hi there", stamp)
            .finalized(stamp, Duration::from_millis(15));
        let expected = format!("\n  {} · 15ms\n", format_timestamp(&stamp));
        store.replace_last(done);
        assert_eq!(renderer.apply(&conversation(&store)), expected);

        // Completion is already written; Idle adds nothing
        let idle = EngineMessage::State {
            state: EngineState::Idle,
        };
        assert_eq!(renderer.apply(&idle), "");
    }

    #[test]
    fn test_stopped_reveal_gets_footer_on_idle() {
        let mut renderer = Renderer::new();
        let mut store = ConversationStore::new();
        let partial = Turn::assistant(TurnId::new(), "A", chrono::Local::now());
        let stamp = partial.timestamp;

        store.append(Turn::user("q"));
        store.append(partial);
        assert_eq!(renderer.apply(&conversation(&store)), "A");

        let idle = EngineMessage::State {
            state: EngineState::Idle,
        };
        assert_eq!(
            renderer.apply(&idle),
            format!("\n  {}\n", format_timestamp(&stamp))
        );

        // The next turn starts cleanly
        store.append(Turn::user("again"));
        assert_eq!(renderer.apply(&conversation(&store)), "");
    }

    #[test]
    fn test_error_turn_is_marked() {
        let mut renderer = Renderer::new();
        let mut store = ConversationStore::new();

        store.append(Turn::user("q"));
        store.append(Turn::error("Failed.\nTry again."));

        assert_eq!(
            renderer.apply(&conversation(&store)),
            "! Failed.\n! Try again.\n"
        );
        let idle = EngineMessage::State {
            state: EngineState::Idle,
        };
        assert_eq!(renderer.apply(&idle), "");
    }

    #[test]
    fn test_loading_indicator_and_quit() {
        let mut renderer = Renderer::new();
        let dispatching = EngineMessage::State {
            state: EngineState::Dispatching,
        };
        assert_eq!(renderer.apply(&dispatching), "Loading...\n");
        assert_eq!(renderer.apply(&EngineMessage::Quit), "Bye.\n");
    }

    #[test]
    fn test_footer_formats() {
        let turn = Turn::assistant(TurnId::new(), "x", chrono::Local::now())
            .finalized(chrono::Local::now(), Duration::from_millis(2500));
        assert!(footer(&turn).ends_with(" · 2.5s"));
    }
}
