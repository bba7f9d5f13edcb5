//! Requeue hints and pass outcomes.

use std::time::Duration;

use crate::error::Error;

/// Retry hint returned by a phase operation.
///
/// `None` means "no explicit delay requested"; the caller falls back to its
/// default resync interval. A zero duration is normalized to `None` at
/// construction so zero can never masquerade as "retry immediately".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Requeue {
    delay: Option<Duration>,
}

impl Requeue {
    /// No explicit delay requested.
    pub fn none() -> Self {
        Self { delay: None }
    }

    /// Request another pass after the given delay.
    pub fn after(delay: Duration) -> Self {
        Self {
            delay: Some(delay).filter(|d| !d.is_zero()),
        }
    }

    /// The requested delay, if any.
    pub fn delay(&self) -> Option<Duration> {
        self.delay
    }

    /// Check whether no delay was requested.
    pub fn is_none(&self) -> bool {
        self.delay.is_none()
    }

    /// Fold two hints, keeping the lowest explicit delay.
    ///
    /// A hint without a delay never wins over one with a delay; two explicit
    /// delays resolve to the smaller one.
    pub fn lowest_nonzero(a: Self, b: Self) -> Self {
        let delay = match (a.delay, b.delay) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (Some(a), None) => Some(a),
            (None, b) => b,
        };
        Self { delay }
    }
}

/// Terminal report of one reconcile pass.
///
/// The pass never propagates failure through `Result`; both halves of the
/// verdict travel as data so the caller's scheduler can act on the delay
/// even when the pass failed.
#[derive(Debug, Default)]
pub struct Outcome {
    /// Delay before the caller should schedule another pass.
    pub requeue_after: Option<Duration>,
    /// Error the pass surfaced, if any.
    pub error: Option<Error>,
}

impl Outcome {
    /// A completed pass with nothing to report.
    pub fn clean() -> Self {
        Self::default()
    }

    /// Build an outcome from the loop's folded hint and aggregate error.
    pub fn of(requeue: Requeue, error: Option<Error>) -> Self {
        Self {
            requeue_after: requeue.delay(),
            error,
        }
    }

    /// Check whether the pass completed without error or explicit delay.
    pub fn is_clean(&self) -> bool {
        self.requeue_after.is_none() && self.error.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_delay_normalizes_to_none() {
        assert!(Requeue::after(Duration::ZERO).is_none());
        assert_eq!(Requeue::after(Duration::ZERO), Requeue::none());
    }

    #[test]
    fn test_nonzero_delay_preserved() {
        let requeue = Requeue::after(Duration::from_secs(5));
        assert_eq!(requeue.delay(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn test_lowest_nonzero_ignores_missing_delay() {
        let explicit = Requeue::after(Duration::from_secs(5));
        assert_eq!(Requeue::lowest_nonzero(Requeue::none(), explicit), explicit);
        assert_eq!(Requeue::lowest_nonzero(explicit, Requeue::none()), explicit);
    }

    #[test]
    fn test_lowest_nonzero_picks_smaller() {
        let three = Requeue::after(Duration::from_secs(3));
        let five = Requeue::after(Duration::from_secs(5));
        assert_eq!(Requeue::lowest_nonzero(three, five), three);
        assert_eq!(Requeue::lowest_nonzero(five, three), three);
    }

    #[test]
    fn test_lowest_nonzero_of_two_nones() {
        assert!(Requeue::lowest_nonzero(Requeue::none(), Requeue::none()).is_none());
    }

    #[test]
    fn test_outcome_clean() {
        let outcome = Outcome::clean();
        assert!(outcome.is_clean());
        assert!(outcome.error.is_none());
        assert!(outcome.requeue_after.is_none());
    }

    #[test]
    fn test_outcome_of_carries_both_halves() {
        let outcome = Outcome::of(
            Requeue::after(Duration::from_secs(30)),
            Some(Error::persist("disk full")),
        );
        assert_eq!(outcome.requeue_after, Some(Duration::from_secs(30)));
        assert!(outcome.error.is_some());
        assert!(!outcome.is_clean());
    }
}
