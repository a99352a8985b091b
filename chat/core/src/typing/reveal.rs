//! Cancellable reveal task
//!
//! [`prefixes`] is the lazy sequence of growing prefixes; [`RevealTask`]
//! drives it on the runtime and forwards each prefix over a channel until the
//! sequence ends or the [`RevealHandle`] is cancelled.

use std::time::Duration;

use futures::stream::{self, Stream, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Events produced by a running reveal, in order
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RevealEvent {
    /// The next, one character longer, prefix of the answer
    Progress(String),
    /// Every character was revealed
    Completed,
    /// The reveal was stopped before the end
    Cancelled,
}

/// Growing prefixes of `text`, one per character, each after `delay`
///
/// The stream is finite and cannot be restarted: once a prefix has been
/// yielded it is gone, and an exhausted stream stays exhausted.
pub fn prefixes(text: String, delay: Duration) -> impl Stream<Item = String> + Send {
    let ends: Vec<usize> = text
        .char_indices()
        .map(|(idx, ch)| idx + ch.len_utf8())
        .collect();

    stream::unfold(
        (text, ends.into_iter()),
        move |(text, mut ends)| async move {
            let end = ends.next()?;
            tokio::time::sleep(delay).await;
            let prefix = text[..end].to_string();
            Some((prefix, (text, ends)))
        },
    )
    .fuse()
}

/// Handle to a running reveal
#[derive(Debug)]
pub struct RevealHandle {
    cancel: CancellationToken,
    join: JoinHandle<()>,
}

impl RevealHandle {
    /// Stop emitting prefixes; idempotent
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Whether `cancel` was called
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Whether the reveal task has exited
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}

/// Spawns reveals
pub struct RevealTask;

impl RevealTask {
    /// Start revealing `text` at `delay` per character
    ///
    /// Events arrive on the returned receiver strictly in order. A
    /// cancellation is observed before every character and while waiting
    /// for the next one; after it no further `Progress` is sent. Dropping the
    /// receiver ends the task as well.
    #[must_use]
    pub fn spawn(
        text: String,
        delay: Duration,
        buffer: usize,
    ) -> (RevealHandle, mpsc::Receiver<RevealEvent>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let join = tokio::spawn(async move {
            let mut steps = std::pin::pin!(prefixes(text, delay));

            loop {
                let next = tokio::select! {
                    biased;
                    () = token.cancelled() => break,
                    next = steps.next() => next,
                };

                let Some(prefix) = next else {
                    let _ = tx.send(RevealEvent::Completed).await;
                    return;
                };

                tokio::select! {
                    biased;
                    () = token.cancelled() => break,
                    sent = tx.send(RevealEvent::Progress(prefix)) => {
                        if sent.is_err() {
                            // Receiver dropped, stop revealing
                            return;
                        }
                    }
                }
            }

            tracing::trace!("Reveal cancelled");
            let _ = tx.send(RevealEvent::Cancelled).await;
        });

        (RevealHandle { cancel, join }, rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    async fn collect(mut rx: mpsc::Receiver<RevealEvent>) -> Vec<RevealEvent> {
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        events
    }

    #[tokio::test(start_paused = true)]
    async fn test_prefixes_grow_one_char_at_a_time() {
        let all: Vec<String> = prefixes("Hi there".to_string(), Duration::from_millis(10))
            .collect()
            .await;
        assert_eq!(
            all,
            vec!["H", "Hi", "Hi ", "Hi t", "Hi th", "Hi the", "Hi ther", "Hi there"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_prefixes_respect_char_boundaries() {
        let all: Vec<String> = prefixes("¡olé!".to_string(), Duration::ZERO).collect().await;
        assert_eq!(all, vec!["¡", "¡o", "¡ol", "¡olé", "¡olé!"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_prefixes_wait_before_each_char() {
        let start = tokio::time::Instant::now();
        let all: Vec<String> = prefixes("abc".to_string(), Duration::from_millis(25))
            .collect()
            .await;
        assert_eq!(all.len(), 3);
        assert!(start.elapsed() >= Duration::from_millis(75));
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_text_has_no_prefixes() {
        let mut steps = std::pin::pin!(prefixes(String::new(), Duration::from_millis(5)));
        assert_eq!(steps.next().await, None);
        assert_eq!(steps.next().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reveal_completes_in_order() {
        let (handle, rx) = RevealTask::spawn("AB".to_string(), Duration::from_millis(10), 8);
        let events = collect(rx).await;

        assert_eq!(
            events,
            vec![
                RevealEvent::Progress("A".to_string()),
                RevealEvent::Progress("AB".to_string()),
                RevealEvent::Completed,
            ]
        );
        assert!(!handle.is_cancelled());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_stops_progress() {
        let (handle, mut rx) =
            RevealTask::spawn("ABCDE".to_string(), Duration::from_millis(10), 1);

        assert_eq!(rx.recv().await, Some(RevealEvent::Progress("A".to_string())));
        handle.cancel();
        handle.cancel();
        assert!(handle.is_cancelled());

        let rest = collect(rx).await;
        // At most the prefix already queued before the cancel, then Cancelled.
        assert!(rest.len() <= 2, "unexpected events: {rest:?}");
        assert_eq!(rest.last(), Some(&RevealEvent::Cancelled));
        assert!(!rest.contains(&RevealEvent::Progress("ABC".to_string())));
        assert!(!rest.contains(&RevealEvent::Completed));
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_receiver_ends_task() {
        let (handle, rx) = RevealTask::spawn("ABCDE".to_string(), Duration::from_millis(10), 1);
        drop(rx);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(handle.is_finished());
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_reveal_completes_immediately() {
        let (_handle, rx) = RevealTask::spawn(String::new(), Duration::from_millis(10), 4);
        assert_eq!(collect(rx).await, vec![RevealEvent::Completed]);
    }
}
