//! Error types for the reconciler crate.

use std::fmt;

use caldera_claim::ClaimKey;
use itertools::Itertools;

use crate::phase::PhaseKind;

/// Result type alias for reconciler operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Reconciler error types.
#[derive(Debug, Clone)]
pub enum Error {
    /// Claim does not exist in the store.
    NotFound { key: ClaimKey },
    /// Store operation failed.
    Store { operation: String, reason: String },
    /// A phase operation failed.
    Phase { phase: PhaseKind, reason: String },
    /// Multiple phase operations failed in one pass.
    Aggregate(AggregateError),
    /// The final status commit failed.
    Persist { reason: String },
    /// Phase set construction is missing an operation.
    MissingPhase { kind: PhaseKind },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { key } => {
                write!(f, "claim '{key}' not found")
            }
            Self::Store { operation, reason } => {
                write!(f, "store operation '{operation}' failed: {reason}")
            }
            Self::Phase { phase, reason } => {
                write!(f, "phase '{phase}' failed: {reason}")
            }
            Self::Aggregate(aggregate) => {
                write!(f, "{aggregate}")
            }
            Self::Persist { reason } => {
                write!(f, "persisting claim status failed: {reason}")
            }
            Self::MissingPhase { kind } => {
                write!(f, "no operation registered for phase '{kind}'")
            }
        }
    }
}

impl std::error::Error for Error {}

impl Error {
    /// Create a not found error.
    pub fn not_found(key: ClaimKey) -> Self {
        Self::NotFound { key }
    }

    /// Create a store error.
    pub fn store(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Store {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    /// Create a phase error.
    pub fn phase(phase: PhaseKind, reason: impl Into<String>) -> Self {
        Self::Phase {
            phase,
            reason: reason.into(),
        }
    }

    /// Create a persist error.
    pub fn persist(reason: impl Into<String>) -> Self {
        Self::Persist {
            reason: reason.into(),
        }
    }

    /// Create a missing phase error.
    pub fn missing_phase(kind: PhaseKind) -> Self {
        Self::MissingPhase { kind }
    }

    /// Check whether this is a not found error.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Composite error preserving every failure collected during one pass.
///
/// Exists only in the non-empty form: [`AggregateError::from_errors`]
/// returns `None` for an empty list, so "no failures" is never a value of
/// this type.
#[derive(Debug, Clone)]
pub struct AggregateError {
    errors: Vec<Error>,
}

impl AggregateError {
    /// Collapse collected errors, or `None` when nothing failed.
    pub fn from_errors(errors: Vec<Error>) -> Option<Self> {
        if errors.is_empty() {
            None
        } else {
            Some(Self { errors })
        }
    }

    /// Every underlying error, in collection order.
    pub fn errors(&self) -> &[Error] {
        &self.errors
    }

    /// Consume the aggregate, yielding the underlying errors.
    pub fn into_errors(self) -> Vec<Error> {
        self.errors
    }
}

impl fmt::Display for AggregateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.errors.as_slice() {
            [single] => write!(f, "{single}"),
            many => write!(f, "[{}]", many.iter().join(", ")),
        }
    }
}

impl std::error::Error for AggregateError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::store("get", "connection refused");
        assert!(err.to_string().contains("get"));
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn test_not_found_predicate() {
        let err = Error::not_found(ClaimKey::new("infra", "network-prod"));
        assert!(err.is_not_found());
        assert!(!Error::persist("disk full").is_not_found());
    }

    #[test]
    fn test_aggregate_empty_is_none() {
        assert!(AggregateError::from_errors(Vec::new()).is_none());
    }

    #[test]
    fn test_aggregate_preserves_all_errors() {
        let aggregate = AggregateError::from_errors(vec![
            Error::phase(PhaseKind::Ready, "runner missing"),
            Error::phase(PhaseKind::Plan, "render failed"),
        ]);
        assert_eq!(aggregate.as_ref().map(|a| a.errors().len()), Some(2));
    }

    #[test]
    fn test_aggregate_display_single_and_many() {
        let single = AggregateError::from_errors(vec![Error::persist("disk full")]);
        let rendered = single.map(|a| a.to_string()).unwrap_or_default();
        assert!(!rendered.starts_with('['));
        assert!(rendered.contains("disk full"));

        let many = AggregateError::from_errors(vec![
            Error::phase(PhaseKind::Ready, "a"),
            Error::phase(PhaseKind::Apply, "b"),
        ]);
        let rendered = many.map(|a| a.to_string()).unwrap_or_default();
        assert!(rendered.starts_with('['));
        assert!(rendered.contains(", "));
    }
}
