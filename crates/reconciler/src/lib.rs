//! Level-triggered multi-phase reconciliation engine for claim resources.
//!
//! One call to [`Reconciler::reconcile`] is one **pass** over a claim:
//!
//! - **Fetch**: load the claim snapshot through the [`ClaimStore`] contract.
//! - **Select**: compute the ordered phase list from the snapshot
//!   (`Ready` always first, at most one command- or teardown-phase after it).
//! - **Execute**: run every selected phase exactly once against a
//!   pass-owned copy, collecting errors and folding retry hints.
//! - **Persist**: diff the copy against the snapshot and commit the delta
//!   as a JSON merge patch, success or failure.
//!
//! The engine is level-triggered: a pass converges on whatever state it
//! observes, and the returned [`Outcome`] tells the caller's scheduler
//! whether and when to run another pass. Missed or coalesced change events
//! are harmless.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use caldera_claim::ClaimKey;
//! use caldera_reconciler::{
//!     InMemoryClaimStore, NoOpPhase, PassContext, PhaseSet, Reconciler,
//! };
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = Arc::new(InMemoryClaimStore::new());
//!
//!     // Real deployments register one operation per phase kind; the
//!     // builder variant validates partial registrations.
//!     let phases = PhaseSet::new(
//!         Arc::new(NoOpPhase::new()),
//!         Arc::new(NoOpPhase::new()),
//!         Arc::new(NoOpPhase::new()),
//!         Arc::new(NoOpPhase::new()),
//!         Arc::new(NoOpPhase::new()),
//!     );
//!     let reconciler = Reconciler::new(store, phases);
//!
//!     let outcome = reconciler
//!         .reconcile(&PassContext::new(), &ClaimKey::new("infra", "network-prod"))
//!         .await;
//!     println!("requeue after: {:?}", outcome.requeue_after);
//! }
//! ```

#![forbid(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![forbid(clippy::panic)]

pub mod context;
pub mod error;
pub mod outcome;
pub mod patch;
pub mod phase;
pub mod reconciler;
pub mod selector;
pub mod store;
pub mod watch;

// Re-export main types
pub use context::{CancelHandle, PassContext};
pub use error::{AggregateError, Error, Result};
pub use outcome::{Outcome, Requeue};
pub use patch::MergePatch;
pub use phase::{
    FailingPhase, FnPhase, NoOpPhase, PhaseKind, PhaseOperation, PhaseSet, PhaseSetBuilder,
};
pub use reconciler::{Reconciler, ReconcilerBuilder};
pub use selector::select_phases;
pub use store::{ClaimStore, InMemoryClaimStore, PatchHelper};
pub use watch::{FieldIndex, Subscriptions};
