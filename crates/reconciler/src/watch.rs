//! Change subscriptions and derived-field indexing.
//!
//! The engine itself is driven by claim keys. This module declares which
//! observed object kinds produce those keys: the primary claim kind maps an
//! event to its own key, owned secondary kinds map an event to the owning
//! claim. A [`FieldIndex`] supplements this with fast lookups of secondary
//! objects by a computed field, for phase operations that need "all runners
//! in phase X" style queries.

use std::collections::{BTreeSet, HashMap};

use caldera_claim::{ClaimKey, ObjectKind, ObjectRef};
use itertools::Itertools;

/// Declares which object kinds trigger a reconcile pass.
#[derive(Debug, Clone)]
pub struct Subscriptions {
    primary: ObjectKind,
    owned: Vec<ObjectKind>,
}

impl Subscriptions {
    /// Subscribe to a primary kind.
    pub fn for_kind(primary: ObjectKind) -> Self {
        Self {
            primary,
            owned: Vec::new(),
        }
    }

    /// Also subscribe to an owned secondary kind.
    pub fn owns(mut self, kind: ObjectKind) -> Self {
        self.owned.push(kind);
        self
    }

    /// The primary kind.
    pub fn primary(&self) -> &ObjectKind {
        &self.primary
    }

    /// The owned secondary kinds.
    pub fn owned(&self) -> &[ObjectKind] {
        &self.owned
    }

    /// Check whether events of a kind are subscribed at all.
    pub fn is_subscribed(&self, kind: &ObjectKind) -> bool {
        self.primary == *kind || self.owned.contains(kind)
    }

    /// Map an observed object event to the claim key to enqueue.
    ///
    /// A primary event routes to its own key. An owned-kind event routes to
    /// the recorded owner; without an owner link it is dropped, as is any
    /// event of an unsubscribed kind.
    pub fn route(&self, object: &ObjectRef) -> Option<ClaimKey> {
        if object.kind == self.primary {
            return Some(ClaimKey::new(object.namespace.clone(), object.name.clone()));
        }
        if self.owned.contains(&object.kind) {
            return object.owner_key().cloned();
        }
        None
    }
}

type Extractor<O> = Box<dyn Fn(&O) -> Option<String> + Send + Sync>;

/// Index from a computed field value to the objects carrying it.
///
/// Built once at startup from a list of the watched objects, then kept
/// current by the watch loop through [`FieldIndex::insert`] and
/// [`FieldIndex::remove`]. The extractor returns `None` for objects that do
/// not index, which also clears a previously indexed entry on update.
pub struct FieldIndex<O> {
    field: String,
    extract: Extractor<O>,
    by_value: HashMap<String, BTreeSet<ObjectRef>>,
    current: HashMap<ObjectRef, String>,
}

impl<O> FieldIndex<O> {
    /// Create an empty index over the named field.
    pub fn new<F>(field: impl Into<String>, extract: F) -> Self
    where
        F: Fn(&O) -> Option<String> + Send + Sync + 'static,
    {
        Self {
            field: field.into(),
            extract: Box::new(extract),
            by_value: HashMap::new(),
            current: HashMap::new(),
        }
    }

    /// The indexed field name, for diagnostics.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Index or re-index an object.
    pub fn insert(&mut self, object_ref: ObjectRef, object: &O) {
        self.unlink(&object_ref);
        if let Some(value) = (self.extract)(object) {
            self.by_value
                .entry(value.clone())
                .or_default()
                .insert(object_ref.clone());
            self.current.insert(object_ref, value);
        }
    }

    /// Drop an object from the index.
    pub fn remove(&mut self, object_ref: &ObjectRef) {
        self.unlink(object_ref);
    }

    /// All objects whose indexed field equals `value`, in stable order.
    pub fn get(&self, value: &str) -> Vec<ObjectRef> {
        self.by_value
            .get(value)
            .map(|refs| refs.iter().cloned().collect_vec())
            .unwrap_or_default()
    }

    /// Number of indexed objects.
    pub fn len(&self) -> usize {
        self.current.len()
    }

    /// Check whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.current.is_empty()
    }

    fn unlink(&mut self, object_ref: &ObjectRef) {
        if let Some(old_value) = self.current.remove(object_ref) {
            if let Some(refs) = self.by_value.get_mut(&old_value) {
                refs.remove(object_ref);
                if refs.is_empty() {
                    self.by_value.remove(&old_value);
                }
            }
        }
    }
}
