//! Pace functions
//!
//! A pace function maps how long the service took to answer and how long the
//! answer is to the delay between two revealed characters.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Maps response latency and answer length to a per-character delay
pub trait Pace: Send + Sync {
    /// Delay before each revealed character
    fn char_delay(&self, elapsed: Duration, char_count: usize) -> Duration;
}

impl<F> Pace for F
where
    F: Fn(Duration, usize) -> Duration + Send + Sync,
{
    fn char_delay(&self, elapsed: Duration, char_count: usize) -> Duration {
        self(elapsed, char_count)
    }
}

/// Same delay for every answer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedPace(pub Duration);

impl Pace for FixedPace {
    fn char_delay(&self, _elapsed: Duration, _char_count: usize) -> Duration {
        self.0
    }
}

/// Answers up to `max_chars` characters use `delay`
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaceTier {
    /// Longest answer (in chars) this tier applies to
    pub max_chars: usize,
    /// Per-character delay in milliseconds
    pub delay_ms: u64,
}

/// Latency- and length-aware pace
///
/// Answers that arrived within `instant_threshold` are revealed at
/// `instant_delay`. Otherwise the first tier covering the answer length
/// applies, falling back to `default_delay` for long answers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TieredPace {
    /// Latency at or below which the reveal is near-instant
    pub instant_threshold: Duration,
    /// Delay used for near-instant reveals
    pub instant_delay: Duration,
    /// Length tiers, sorted by `max_chars`
    tiers: Vec<PaceTier>,
    /// Delay for answers longer than every tier
    pub default_delay: Duration,
}

impl TieredPace {
    /// Create a pace; tiers are sorted by `max_chars`
    #[must_use]
    pub fn new(
        instant_threshold: Duration,
        instant_delay: Duration,
        mut tiers: Vec<PaceTier>,
        default_delay: Duration,
    ) -> Self {
        tiers.sort_by_key(|t| t.max_chars);
        Self {
            instant_threshold,
            instant_delay,
            tiers,
            default_delay,
        }
    }

    /// Length tiers, shortest first
    #[must_use]
    pub fn tiers(&self) -> &[PaceTier] {
        &self.tiers
    }
}

impl Default for TieredPace {
    fn default() -> Self {
        Self::new(
            Duration::from_millis(10),
            Duration::from_millis(1),
            default_tiers(),
            Duration::from_millis(25),
        )
    }
}

impl Pace for TieredPace {
    fn char_delay(&self, elapsed: Duration, char_count: usize) -> Duration {
        if elapsed <= self.instant_threshold {
            return self.instant_delay;
        }
        self.tiers
            .iter()
            .find(|tier| char_count <= tier.max_chars)
            .map_or(self.default_delay, |tier| {
                Duration::from_millis(tier.delay_ms)
            })
    }
}

/// Tiers used when none are configured
#[must_use]
pub fn default_tiers() -> Vec<PaceTier> {
    vec![
        PaceTier {
            max_chars: 40,
            delay_ms: 10,
        },
        PaceTier {
            max_chars: 200,
            delay_ms: 18,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    const SLOW: Duration = Duration::from_millis(500);

    #[test]
    fn test_fast_response_is_near_instant() {
        let pace = TieredPace::default();
        assert_eq!(
            pace.char_delay(Duration::from_millis(10), 5000),
            Duration::from_millis(1)
        );
        assert_eq!(pace.char_delay(Duration::ZERO, 3), Duration::from_millis(1));
    }

    #[test]
    fn test_short_answers_reveal_faster() {
        let pace = TieredPace::default();
        let short = pace.char_delay(SLOW, 12);
        let medium = pace.char_delay(SLOW, 120);
        let long = pace.char_delay(SLOW, 1200);

        assert_eq!(short, Duration::from_millis(10));
        assert_eq!(medium, Duration::from_millis(18));
        assert_eq!(long, Duration::from_millis(25));
        assert!(short < medium && medium < long);
    }

    #[test]
    fn test_tier_boundaries_inclusive() {
        let pace = TieredPace::default();
        assert_eq!(pace.char_delay(SLOW, 40), Duration::from_millis(10));
        assert_eq!(pace.char_delay(SLOW, 41), Duration::from_millis(18));
        assert_eq!(pace.char_delay(SLOW, 200), Duration::from_millis(18));
        assert_eq!(pace.char_delay(SLOW, 201), Duration::from_millis(25));
    }

    #[test]
    fn test_tiers_are_sorted() {
        let pace = TieredPace::new(
            Duration::ZERO,
            Duration::ZERO,
            vec![
                PaceTier {
                    max_chars: 100,
                    delay_ms: 20,
                },
                PaceTier {
                    max_chars: 10,
                    delay_ms: 5,
                },
            ],
            Duration::from_millis(30),
        );
        assert_eq!(pace.tiers()[0].max_chars, 10);
        assert_eq!(pace.char_delay(SLOW, 8), Duration::from_millis(5));
    }

    #[test]
    fn test_closure_and_fixed_pace() {
        let per_len = |_elapsed: Duration, len: usize| Duration::from_millis(len as u64);
        assert_eq!(per_len.char_delay(SLOW, 7), Duration::from_millis(7));

        let fixed = FixedPace(Duration::from_millis(25));
        assert_eq!(fixed.char_delay(Duration::ZERO, 1), Duration::from_millis(25));
    }
}
