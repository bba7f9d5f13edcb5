//! Phase operation contract and the phase lookup table.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use caldera_claim::ClaimResource;

use crate::context::PassContext;
use crate::error::{Error, Result};
use crate::outcome::Requeue;

/// The closed set of phases the orchestrator can select.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PhaseKind {
    /// Baseline convergence, always runs first.
    Ready,
    /// Resolve a pending approval decision.
    Approve,
    /// Generate an execution plan.
    Plan,
    /// Execute the approved plan.
    Apply,
    /// Tear down provisioned infrastructure.
    Destroy,
}

impl PhaseKind {
    /// Every phase kind, in selector precedence order.
    pub const ALL: [Self; 5] = [
        Self::Ready,
        Self::Approve,
        Self::Plan,
        Self::Apply,
        Self::Destroy,
    ];

    /// Name of the phase.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ready => "Ready",
            Self::Approve => "Approve",
            Self::Plan => "Plan",
            Self::Apply => "Apply",
            Self::Destroy => "Destroy",
        }
    }
}

impl fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Trait for phase operation implementations.
///
/// One operation is registered per [`PhaseKind`]. An operation mutates the
/// pass-owned claim copy and reports a retry hint; mutations become durable
/// when the pass commits. Operations must be safe to re-run on a claim in
/// any state and must not block indefinitely (observe
/// [`PassContext::is_cancelled`] in long-running work).
#[async_trait]
pub trait PhaseOperation: Send + Sync {
    /// Run the phase against the claim copy.
    async fn run(&self, ctx: &PassContext, claim: &mut ClaimResource) -> Result<Requeue>;
}

/// Total lookup table from phase kind to its registered operation.
///
/// Constructed either directly from five operations or through
/// [`PhaseSetBuilder`], which refuses to build until every kind has an
/// operation. Either way every slot is filled, so lookups never fail at
/// run time.
pub struct PhaseSet {
    ready: Arc<dyn PhaseOperation>,
    approve: Arc<dyn PhaseOperation>,
    plan: Arc<dyn PhaseOperation>,
    apply: Arc<dyn PhaseOperation>,
    destroy: Arc<dyn PhaseOperation>,
}

impl PhaseSet {
    /// Create a phase set from its five operations directly.
    pub fn new(
        ready: Arc<dyn PhaseOperation>,
        approve: Arc<dyn PhaseOperation>,
        plan: Arc<dyn PhaseOperation>,
        apply: Arc<dyn PhaseOperation>,
        destroy: Arc<dyn PhaseOperation>,
    ) -> Self {
        Self {
            ready,
            approve,
            plan,
            apply,
            destroy,
        }
    }

    /// Create a builder.
    pub fn builder() -> PhaseSetBuilder {
        PhaseSetBuilder::new()
    }

    /// Look up the operation for a phase kind.
    pub fn get(&self, kind: PhaseKind) -> &Arc<dyn PhaseOperation> {
        match kind {
            PhaseKind::Ready => &self.ready,
            PhaseKind::Approve => &self.approve,
            PhaseKind::Plan => &self.plan,
            PhaseKind::Apply => &self.apply,
            PhaseKind::Destroy => &self.destroy,
        }
    }
}

/// Builder for [`PhaseSet`].
#[derive(Default)]
pub struct PhaseSetBuilder {
    ready: Option<Arc<dyn PhaseOperation>>,
    approve: Option<Arc<dyn PhaseOperation>>,
    plan: Option<Arc<dyn PhaseOperation>>,
    apply: Option<Arc<dyn PhaseOperation>>,
    destroy: Option<Arc<dyn PhaseOperation>>,
}

impl PhaseSetBuilder {
    /// Create a new empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the operation for a phase kind.
    pub fn register(mut self, kind: PhaseKind, operation: Arc<dyn PhaseOperation>) -> Self {
        let slot = match kind {
            PhaseKind::Ready => &mut self.ready,
            PhaseKind::Approve => &mut self.approve,
            PhaseKind::Plan => &mut self.plan,
            PhaseKind::Apply => &mut self.apply,
            PhaseKind::Destroy => &mut self.destroy,
        };
        *slot = Some(operation);
        self
    }

    /// Build the phase set, failing if any kind has no operation.
    pub fn build(self) -> Result<PhaseSet> {
        let take = |slot: Option<Arc<dyn PhaseOperation>>, kind: PhaseKind| {
            slot.ok_or_else(|| Error::missing_phase(kind))
        };
        Ok(PhaseSet {
            ready: take(self.ready, PhaseKind::Ready)?,
            approve: take(self.approve, PhaseKind::Approve)?,
            plan: take(self.plan, PhaseKind::Plan)?,
            apply: take(self.apply, PhaseKind::Apply)?,
            destroy: take(self.destroy, PhaseKind::Destroy)?,
        })
    }
}

/// A phase operation that does nothing (for testing and placeholder slots).
#[derive(Default)]
pub struct NoOpPhase;

impl NoOpPhase {
    /// Create a new no-op operation.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PhaseOperation for NoOpPhase {
    async fn run(&self, _ctx: &PassContext, _claim: &mut ClaimResource) -> Result<Requeue> {
        Ok(Requeue::none())
    }
}

/// A phase operation that always fails (for testing).
pub struct FailingPhase {
    kind: PhaseKind,
    reason: String,
}

impl FailingPhase {
    /// Create a new failing operation.
    pub fn new(kind: PhaseKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl PhaseOperation for FailingPhase {
    async fn run(&self, _ctx: &PassContext, _claim: &mut ClaimResource) -> Result<Requeue> {
        Err(Error::phase(self.kind, &self.reason))
    }
}

/// A phase operation that runs a closure.
pub struct FnPhase<F>
where
    F: Fn(&PassContext, &mut ClaimResource) -> Result<Requeue> + Send + Sync,
{
    func: F,
}

impl<F> FnPhase<F>
where
    F: Fn(&PassContext, &mut ClaimResource) -> Result<Requeue> + Send + Sync,
{
    /// Create a new function operation.
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

#[async_trait]
impl<F> PhaseOperation for FnPhase<F>
where
    F: Fn(&PassContext, &mut ClaimResource) -> Result<Requeue> + Send + Sync,
{
    async fn run(&self, ctx: &PassContext, claim: &mut ClaimResource) -> Result<Requeue> {
        (self.func)(ctx, claim)
    }
}
