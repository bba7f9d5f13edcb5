//! Typed progress conditions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One observed condition on a claim, keyed by `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    /// Condition kind, unique within a claim's condition list.
    pub kind: String,
    /// Whether the condition currently holds.
    pub active: bool,
    /// Machine-readable reason for the latest observation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// Human-readable detail for the latest observation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// When `active` last flipped.
    pub last_transition: DateTime<Utc>,
}

impl Condition {
    /// Create a condition that currently holds.
    pub fn active(kind: impl Into<String>) -> Self {
        Self::new(kind, true)
    }

    /// Create a condition that does not hold.
    pub fn inactive(kind: impl Into<String>) -> Self {
        Self::new(kind, false)
    }

    fn new(kind: impl Into<String>, active: bool) -> Self {
        Self {
            kind: kind.into(),
            active,
            reason: None,
            message: None,
            last_transition: Utc::now(),
        }
    }

    /// Attach a machine-readable reason.
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attach a human-readable message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}
