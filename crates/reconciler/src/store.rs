//! Store adapter contract and the in-memory reference store.

use async_trait::async_trait;
use caldera_claim::{ClaimKey, ClaimResource};
use itertools::Itertools;

use crate::error::{Error, Result};
use crate::patch::MergePatch;

/// Trait for claim storage backends.
///
/// The engine only ever reads whole claims and writes merge patches; it
/// never writes whole resources back.
#[async_trait]
pub trait ClaimStore: Send + Sync {
    /// Fetch a claim by key.
    ///
    /// Returns [`Error::NotFound`] when the claim does not exist and
    /// [`Error::Store`] for any other failure.
    async fn get(&self, key: &ClaimKey) -> Result<ClaimResource>;

    /// Merge-apply a patch to a stored claim and bump its version.
    async fn apply_patch(&self, key: &ClaimKey, patch: MergePatch) -> Result<()>;
}

/// Captures the serialization base at pass start and commits the delta.
///
/// Construction cannot fail; serialization happens at commit time, where a
/// failure path already exists.
pub struct PatchHelper {
    base: ClaimResource,
}

impl PatchHelper {
    /// Snapshot the diff base before any phase runs.
    pub fn new(claim: &ClaimResource) -> Self {
        Self { base: claim.clone() }
    }

    /// Diff the pass copy against the captured base and push the delta.
    ///
    /// A no-op when nothing changed. Every failure surfaces as
    /// [`Error::Persist`].
    pub async fn commit(&self, store: &dyn ClaimStore, claim: &ClaimResource) -> Result<()> {
        let base = serde_json::to_value(&self.base).map_err(|e| Error::persist(e.to_string()))?;
        let target = serde_json::to_value(claim).map_err(|e| Error::persist(e.to_string()))?;

        let patch = MergePatch::diff(&base, &target);
        if patch.is_empty() {
            return Ok(());
        }

        store
            .apply_patch(&claim.key, patch)
            .await
            .map_err(|e| Error::persist(e.to_string()))
    }
}

/// In-memory claim store for tests and embedding.
#[derive(Default)]
pub struct InMemoryClaimStore {
    claims: tokio::sync::RwLock<std::collections::HashMap<ClaimKey, ClaimResource>>,
}

impl InMemoryClaimStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed or replace a claim as-is.
    pub async fn insert(&self, claim: ClaimResource) {
        self.claims.write().await.insert(claim.key.clone(), claim);
    }

    /// Delete a claim, returning it if present.
    pub async fn remove(&self, key: &ClaimKey) -> Option<ClaimResource> {
        self.claims.write().await.remove(key)
    }

    /// All stored claims.
    pub async fn list(&self) -> Vec<ClaimResource> {
        self.claims.read().await.values().cloned().collect_vec()
    }
}

#[async_trait]
impl ClaimStore for InMemoryClaimStore {
    async fn get(&self, key: &ClaimKey) -> Result<ClaimResource> {
        self.claims
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| Error::not_found(key.clone()))
    }

    async fn apply_patch(&self, key: &ClaimKey, patch: MergePatch) -> Result<()> {
        let mut claims = self.claims.write().await;
        let stored = claims
            .get(key)
            .ok_or_else(|| Error::not_found(key.clone()))?;
        let version = stored.resource_version;

        let mut doc = serde_json::to_value(stored)
            .map_err(|e| Error::store("patch", e.to_string()))?;
        patch.apply(&mut doc);

        let mut merged: ClaimResource = serde_json::from_value(doc)
            .map_err(|e| Error::store("patch", e.to_string()))?;
        merged.resource_version = version + 1;

        claims.insert(key.clone(), merged);
        Ok(())
    }
}
