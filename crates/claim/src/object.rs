//! References to secondary objects a claim owns.
//!
//! The reconciler watches secondary objects (runner workloads, output
//! artifacts) alongside the claims themselves. An [`ObjectRef`] carries just
//! enough identity to route an observed change back to the owning claim.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::resource::ClaimKey;

/// Kind of a secondary object, e.g. `"Runner"` or `"Artifact"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectKind(String);

impl ObjectKind {
    /// Create a kind from its wire name.
    pub fn new(kind: impl Into<String>) -> Self {
        Self(kind.into())
    }

    /// Wire name of the kind.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a secondary object plus its owner link, if any.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectRef {
    /// Kind of the object.
    pub kind: ObjectKind,
    /// Namespace the object lives in.
    pub namespace: String,
    /// Name of the object.
    pub name: String,
    /// Claim that owns this object, when an owner link is recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<ClaimKey>,
}

impl ObjectRef {
    /// Create a reference without an owner link.
    pub fn new(
        kind: ObjectKind,
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            namespace: namespace.into(),
            name: name.into(),
            owner: None,
        }
    }

    /// Record the owning claim.
    pub fn with_owner(mut self, owner: ClaimKey) -> Self {
        self.owner = Some(owner);
        self
    }

    /// Key of the owning claim, when recorded.
    pub fn owner_key(&self) -> Option<&ClaimKey> {
        self.owner.as_ref()
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}/{}", self.kind, self.namespace, self.name)
    }
}
