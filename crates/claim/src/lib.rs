//! Declarative claim resource model for the caldera reconciliation engine.
//!
//! A claim describes a requested provisioning action against an
//! infrastructure workflow: its `spec` carries the desired state (source,
//! revision, teardown flag), its `status` carries the externally-set action
//! command plus the progress state phase operations write back. The
//! reconciler crate consumes these types; nothing here performs I/O.

#![forbid(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![forbid(clippy::panic)]

pub mod condition;
pub mod object;
pub mod resource;

pub use condition::Condition;
pub use object::{ObjectKind, ObjectRef};
pub use resource::{
    Action, ClaimKey, ClaimPhase, ClaimResource, ClaimSpec, ClaimStatus, ParseActionError,
};
