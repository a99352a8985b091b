//! Conversation Store
//!
//! Ordered, append-only list of turns. This is the single source of truth for
//! what a surface displays.
//!
//! # Snapshots
//!
//! The store hands out [`ConversationSnapshot`]s instead of references. A
//! snapshot is an `Arc` over the turn list; mutating the store after a
//! snapshot was taken copies the list first, so a snapshot never changes
//! underneath its reader.

use std::ops::Deref;
use std::sync::Arc;

use crate::messages::Turn;

/// Immutable view of the conversation at one instant
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConversationSnapshot(Arc<Vec<Turn>>);

impl ConversationSnapshot {
    /// All turns in creation order
    #[must_use]
    pub fn turns(&self) -> &[Turn] {
        &self.0
    }

    /// Whether two snapshots share the same underlying list
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Deref for ConversationSnapshot {
    type Target = [Turn];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Append-only turn list
#[derive(Clone, Debug, Default)]
pub struct ConversationStore {
    turns: Arc<Vec<Turn>>,
}

impl ConversationStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a turn at the end
    pub fn append(&mut self, turn: Turn) {
        Arc::make_mut(&mut self.turns).push(turn);
    }

    /// Overwrite the most recently appended turn
    ///
    /// On an empty store this appends instead.
    pub fn replace_last(&mut self, turn: Turn) {
        let turns = Arc::make_mut(&mut self.turns);
        match turns.last_mut() {
            Some(last) => *last = turn,
            None => turns.push(turn),
        }
    }

    /// Current immutable view of all turns
    #[must_use]
    pub fn snapshot(&self) -> ConversationSnapshot {
        ConversationSnapshot(Arc::clone(&self.turns))
    }

    /// Most recent turn
    #[must_use]
    pub fn last(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// All turns in creation order
    #[must_use]
    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Number of turns
    #[must_use]
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Whether no turn has been added yet
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::{Sender, TurnId};
    use chrono::Local;
    use pretty_assertions::assert_eq;

    fn texts(store: &ConversationStore) -> Vec<&str> {
        store.turns().iter().map(|t| t.text.as_str()).collect()
    }

    #[test]
    fn test_append_keeps_order() {
        let mut store = ConversationStore::new();
        store.append(Turn::user("one"));
        store.append(Turn::user("two"));
        store.append(Turn::error("three"));

        assert_eq!(texts(&store), vec!["one", "two", "three"]);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_replace_last_overwrites_only_last() {
        let mut store = ConversationStore::new();
        store.append(Turn::user("question"));
        let id = TurnId::new();
        let now = Local::now();
        store.append(Turn::assistant(id, "A", now));
        store.replace_last(Turn::assistant(id, "AB", now));

        assert_eq!(texts(&store), vec!["question", "AB"]);
        assert_eq!(store.last().map(|t| t.sender), Some(Sender::Assistant));
    }

    #[test]
    fn test_replace_last_on_empty_appends() {
        let mut store = ConversationStore::new();
        store.replace_last(Turn::user("first"));
        assert_eq!(texts(&store), vec!["first"]);
    }

    #[test]
    fn test_snapshot_is_not_affected_by_later_mutation() {
        let mut store = ConversationStore::new();
        store.append(Turn::user("q"));
        let id = TurnId::new();
        let now = Local::now();
        store.append(Turn::assistant(id, "H", now));

        let before = store.snapshot();
        store.replace_last(Turn::assistant(id, "Hi", now));
        let after = store.snapshot();

        assert_eq!(before[1].text, "H");
        assert_eq!(after[1].text, "Hi");
        assert!(!before.ptr_eq(&after));
    }

    #[test]
    fn test_snapshot_without_mutation_shares_storage() {
        let mut store = ConversationStore::new();
        store.append(Turn::user("q"));
        let a = store.snapshot();
        let b = store.snapshot();
        assert!(a.ptr_eq(&b));
        assert_eq!(a, b);
    }
}
