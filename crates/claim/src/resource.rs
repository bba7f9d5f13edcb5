//! Core claim resource types.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::condition::Condition;

/// Namespace + name identity of a claim. Immutable after creation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ClaimKey {
    namespace: String,
    name: String,
}

impl ClaimKey {
    /// Create a new claim key.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Get the namespace.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Get the name.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for ClaimKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Externally-set command recorded on a claim's status.
///
/// The empty wire value ("no action pending") is represented as `None` at
/// the `ClaimStatus::action` level, not as a variant here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    /// Accept the pending plan and let the workflow proceed.
    Approve,
    /// Refuse the pending plan.
    Reject,
    /// Generate a fresh execution plan.
    Plan,
    /// Execute the approved plan against infrastructure.
    Apply,
}

impl Action {
    /// Wire representation of the action.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Approve => "Approve",
            Self::Reject => "Reject",
            Self::Plan => "Plan",
            Self::Apply => "Apply",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error returned when parsing an unknown action string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unrecognized claim action '{value}'")]
pub struct ParseActionError {
    /// The rejected input.
    pub value: String,
}

impl FromStr for Action {
    type Err = ParseActionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Approve" => Ok(Self::Approve),
            "Reject" => Ok(Self::Reject),
            "Plan" => Ok(Self::Plan),
            "Apply" => Ok(Self::Apply),
            other => Err(ParseActionError {
                value: other.to_string(),
            }),
        }
    }
}

/// Coarse lifecycle phase recorded on a claim's status.
///
/// This is also the derived field the watch layer's field index keys on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ClaimPhase {
    /// Claim exists but no operation has acted on it yet.
    #[default]
    Pending,
    /// A plan exists and is waiting for an approval decision.
    Awaiting,
    /// The pending plan was accepted.
    Approved,
    /// The pending plan was refused.
    Rejected,
    /// A plan was generated.
    Planned,
    /// The plan was executed against infrastructure.
    Applied,
    /// Provisioned infrastructure was torn down.
    Destroyed,
}

impl ClaimPhase {
    /// Wire representation of the phase.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "Pending",
            Self::Awaiting => "Awaiting",
            Self::Approved => "Approved",
            Self::Rejected => "Rejected",
            Self::Planned => "Planned",
            Self::Applied => "Applied",
            Self::Destroyed => "Destroyed",
        }
    }

    /// Check whether the phase is terminal (nothing left to drive).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Destroyed)
    }
}

impl fmt::Display for ClaimPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Desired state of a claim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimSpec {
    /// Module or repository the provisioning workflow consumes.
    pub source: String,
    /// Revision of the source to pin, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub revision: Option<String>,
    /// Input variables handed to the workflow.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub vars: BTreeMap<String, String>,
    /// Whether teardown of provisioned infrastructure is requested.
    #[serde(default)]
    pub destroy: bool,
}

impl ClaimSpec {
    /// Create a spec for the given source.
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            revision: None,
            vars: BTreeMap::new(),
            destroy: false,
        }
    }

    /// Pin a source revision.
    pub fn with_revision(mut self, revision: impl Into<String>) -> Self {
        self.revision = Some(revision.into());
        self
    }

    /// Add an input variable.
    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.vars.insert(key.into(), value.into());
        self
    }

    /// Request teardown.
    pub fn with_destroy(mut self, destroy: bool) -> Self {
        self.destroy = destroy;
        self
    }
}

/// Observed state of a claim, written by phase operations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClaimStatus {
    /// Externally-set command; `None` is the empty wire value.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<Action>,
    /// Coarse lifecycle phase.
    #[serde(default)]
    pub phase: ClaimPhase,
    /// Rendered plan text from the most recent planning run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<String>,
    /// Human-readable progress message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Typed progress conditions, at most one per condition kind.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<Condition>,
}

impl ClaimStatus {
    /// Clear the pending action command.
    pub fn clear_action(&mut self) {
        self.action = None;
    }

    /// Look up a condition by kind.
    pub fn condition(&self, kind: &str) -> Option<&Condition> {
        self.conditions.iter().find(|c| c.kind == kind)
    }

    /// Upsert a condition by kind.
    ///
    /// The transition timestamp of an existing condition is preserved when
    /// its active flag did not change, so repeated passes stay idempotent.
    pub fn set_condition(&mut self, condition: Condition) {
        match self.conditions.iter_mut().find(|c| c.kind == condition.kind) {
            Some(existing) => {
                let last_transition = if existing.active == condition.active {
                    existing.last_transition
                } else {
                    condition.last_transition
                };
                *existing = Condition {
                    last_transition,
                    ..condition
                };
            }
            None => self.conditions.push(condition),
        }
    }
}

/// A declarative claim resource: identity, desired state, observed state.
///
/// The copy handed to phase operations lives only for one reconcile pass;
/// mutations become durable when the pass commits its merge patch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClaimResource {
    /// Namespace + name identity. Never rewritten after creation.
    pub key: ClaimKey,
    /// Store-side revision counter, bumped on every committed change.
    #[serde(default)]
    pub resource_version: u64,
    /// Desired state.
    pub spec: ClaimSpec,
    /// Observed state.
    #[serde(default)]
    pub status: ClaimStatus,
}

impl ClaimResource {
    /// Create a new claim with an empty status.
    pub fn new(key: ClaimKey, spec: ClaimSpec) -> Self {
        Self {
            key,
            resource_version: 0,
            spec,
            status: ClaimStatus::default(),
        }
    }

    /// Set the pending action command (builder form for tests and callers).
    pub fn with_action(mut self, action: Action) -> Self {
        self.status.action = Some(action);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claim_key_display() {
        let key = ClaimKey::new("infra", "network-prod");
        assert_eq!(key.to_string(), "infra/network-prod");
        assert_eq!(key.namespace(), "infra");
        assert_eq!(key.name(), "network-prod");
    }

    #[test]
    fn test_action_round_trip() {
        for action in [Action::Approve, Action::Reject, Action::Plan, Action::Apply] {
            assert_eq!(action.as_str().parse::<Action>().ok(), Some(action));
        }
    }

    #[test]
    fn test_action_parse_rejects_unknown() {
        let err = "Destroy".parse::<Action>().err();
        assert_eq!(
            err.map(|e| e.value),
            Some("Destroy".to_string()),
            "Destroy is driven by spec.destroy, not an action string"
        );
        assert!("".parse::<Action>().is_err());
    }

    #[test]
    fn test_claim_phase_terminal() {
        assert!(ClaimPhase::Destroyed.is_terminal());
        assert!(!ClaimPhase::Applied.is_terminal());
        assert!(!ClaimPhase::Rejected.is_terminal());
    }

    #[test]
    fn test_spec_builder() {
        let spec = ClaimSpec::new("git://modules/network")
            .with_revision("v1.4.2")
            .with_var("cidr", "10.0.0.0/16")
            .with_destroy(true);

        assert_eq!(spec.source, "git://modules/network");
        assert_eq!(spec.revision.as_deref(), Some("v1.4.2"));
        assert_eq!(spec.vars.get("cidr").map(String::as_str), Some("10.0.0.0/16"));
        assert!(spec.destroy);
    }

    #[test]
    fn test_status_action_serializes_as_string() {
        let status = ClaimStatus {
            action: Some(Action::Approve),
            ..ClaimStatus::default()
        };

        let json = serde_json::to_value(&status).ok();
        assert_eq!(
            json.as_ref().and_then(|v| v.get("action")).cloned(),
            Some(serde_json::Value::String("Approve".to_string()))
        );
    }

    #[test]
    fn test_status_empty_action_is_absent() {
        let status = ClaimStatus::default();
        let json = serde_json::to_value(&status).ok();
        assert_eq!(json.as_ref().and_then(|v| v.get("action")), None);
    }

    #[test]
    fn test_set_condition_upserts_by_kind() {
        let mut status = ClaimStatus::default();
        status.set_condition(Condition::active("Planned").with_reason("PlanRendered"));
        status.set_condition(Condition::active("Planned").with_reason("PlanRefreshed"));

        assert_eq!(status.conditions.len(), 1);
        assert_eq!(
            status.condition("Planned").and_then(|c| c.reason.as_deref()),
            Some("PlanRefreshed")
        );
    }

    #[test]
    fn test_set_condition_keeps_transition_time_when_unchanged() {
        let mut status = ClaimStatus::default();
        let first = Condition::active("Applied");
        let stamp = first.last_transition;
        status.set_condition(first);
        status.set_condition(Condition::active("Applied").with_message("still holding"));

        assert_eq!(
            status.condition("Applied").map(|c| c.last_transition),
            Some(stamp)
        );
    }

    #[test]
    fn test_set_condition_refreshes_transition_time_on_flip() {
        let mut status = ClaimStatus::default();
        let held = Condition::active("Applied");
        let first_stamp = held.last_transition;
        status.set_condition(held);

        // Give the flipped observation an explicitly newer stamp.
        let mut broken = Condition::inactive("Applied").with_reason("ApplyFailed");
        broken.last_transition = first_stamp + chrono::Duration::seconds(90);
        let flipped_stamp = broken.last_transition;
        status.set_condition(broken);

        let applied = status.condition("Applied");
        assert_eq!(applied.map(|c| c.active), Some(false));
        assert_eq!(applied.map(|c| c.last_transition), Some(flipped_stamp));
    }
}
