//! Reconcile orchestrator.

use std::sync::Arc;

use caldera_claim::{ClaimKey, ClaimResource};
use tracing::{debug, info, warn};

use crate::context::PassContext;
use crate::error::{AggregateError, Error, Result};
use crate::outcome::{Outcome, Requeue};
use crate::phase::{PhaseKind, PhaseOperation, PhaseSet, PhaseSetBuilder};
use crate::selector::select_phases;
use crate::store::{ClaimStore, PatchHelper};

/// Level-triggered reconciler for claim resources.
///
/// One call to [`Reconciler::reconcile`] is one pass: fetch the claim, run
/// the selected phases against a pass-owned copy, persist the mutations as
/// a merge patch, report the folded retry hint and any failures as an
/// [`Outcome`]. The caller guarantees at most one in-flight pass per key;
/// passes for different keys may run concurrently.
pub struct Reconciler {
    /// Claim storage backend.
    store: Arc<dyn ClaimStore>,
    /// Registered phase operations, one per kind.
    phases: PhaseSet,
}

impl Reconciler {
    /// Create a new reconciler from validated parts.
    pub fn new(store: Arc<dyn ClaimStore>, phases: PhaseSet) -> Self {
        Self { store, phases }
    }

    /// Create a builder around the given store.
    pub fn builder(store: Arc<dyn ClaimStore>) -> ReconcilerBuilder {
        ReconcilerBuilder::new(store)
    }

    /// Run one reconcile pass for a claim key.
    ///
    /// The pass never fails through `Result`; fetch errors, phase failures
    /// and persist failures all travel inside the returned [`Outcome`]:
    /// - a vanished claim is a completed no-op pass (nothing persisted,
    ///   no error);
    /// - any other fetch failure is returned immediately, no phases run;
    /// - after the phases ran, the mutated copy is always committed, even
    ///   when phases failed or the pass was cancelled;
    /// - a commit failure replaces the phase-level error in the outcome
    ///   but never the computed delay.
    pub async fn reconcile(&self, ctx: &PassContext, key: &ClaimKey) -> Outcome {
        let mut claim = match self.store.get(key).await {
            Ok(claim) => claim,
            Err(err) if err.is_not_found() => {
                debug!(claim = %key, "Claim vanished, nothing to reconcile");
                return Outcome::clean();
            }
            Err(err) => {
                warn!(claim = %key, error = %err, "Fetching claim failed");
                return Outcome::of(Requeue::none(), Some(err));
            }
        };

        // Snapshot the diff base before any phase touches the copy.
        let helper = PatchHelper::new(&claim);

        let (requeue, error) = self.run_phases(ctx, &mut claim).await;

        let error = match helper.commit(self.store.as_ref(), &claim).await {
            Ok(()) => error,
            Err(persist_err) => {
                warn!(claim = %key, error = %persist_err, "Persisting claim failed");
                Some(persist_err)
            }
        };

        match &error {
            Some(err) => info!(claim = %key, error = %err, "Pass complete with failures"),
            None => info!(claim = %key, requeue = ?requeue.delay(), "Pass complete"),
        }

        Outcome::of(requeue, error)
    }

    /// Execute the selected phases in order against the pass copy.
    ///
    /// Every selected phase runs exactly once, even after an earlier phase
    /// failed. Retry hints fold through [`Requeue::lowest_nonzero`] only
    /// while zero errors have been recorded; once any error exists, later
    /// phases' hints are discarded while their mutations and errors are
    /// still collected.
    async fn run_phases(
        &self,
        ctx: &PassContext,
        claim: &mut ClaimResource,
    ) -> (Requeue, Option<Error>) {
        let kinds = select_phases(claim);
        debug!(claim = %claim.key, phases = kinds.len(), "Selected phases");

        let mut requeue = Requeue::none();
        let mut errors = Vec::new();

        for kind in kinds {
            debug!(claim = %claim.key, phase = %kind, "Running phase");
            match self.phases.get(kind).run(ctx, claim).await {
                Ok(hint) => {
                    if errors.is_empty() {
                        requeue = Requeue::lowest_nonzero(requeue, hint);
                    }
                }
                Err(err) => {
                    warn!(claim = %claim.key, phase = %kind, error = %err, "Phase failed");
                    errors.push(err);
                }
            }
        }

        let error = AggregateError::from_errors(errors).map(Error::Aggregate);
        (requeue, error)
    }

    /// Get the claim storage backend.
    pub fn store(&self) -> &Arc<dyn ClaimStore> {
        &self.store
    }
}

/// Builder for [`Reconciler`].
pub struct ReconcilerBuilder {
    store: Arc<dyn ClaimStore>,
    phases: PhaseSetBuilder,
}

impl ReconcilerBuilder {
    /// Create a new builder around the given store.
    pub fn new(store: Arc<dyn ClaimStore>) -> Self {
        Self {
            store,
            phases: PhaseSetBuilder::new(),
        }
    }

    /// Register the operation for a phase kind.
    pub fn register_phase(mut self, kind: PhaseKind, operation: Arc<dyn PhaseOperation>) -> Self {
        self.phases = self.phases.register(kind, operation);
        self
    }

    /// Build the reconciler, failing if any phase kind has no operation.
    pub fn build(self) -> Result<Reconciler> {
        Ok(Reconciler::new(self.store, self.phases.build()?))
    }
}
