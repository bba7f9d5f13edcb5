//! JSON merge patches for claim persistence.
//!
//! A pass never writes whole resources back. It diffs the serialized pass
//! copy against the snapshot captured at pass start and ships only the
//! delta, so unrelated fields written concurrently by other clients
//! survive. Removals travel as explicit nulls, which also means the claim
//! model must never serialize a present-but-null field (optional fields are
//! skipped instead).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A merge patch document: changed fields carry their new value, removed
/// fields carry `null`, untouched fields are absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MergePatch(Value);

impl MergePatch {
    /// Compute the patch that turns `base` into `target`.
    pub fn diff(base: &Value, target: &Value) -> Self {
        Self(diff_value(base, target).unwrap_or_else(|| Value::Object(Map::new())))
    }

    /// Wrap an existing patch document.
    pub fn from_value(value: Value) -> Self {
        Self(value)
    }

    /// The underlying patch document.
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Check whether the patch changes nothing.
    pub fn is_empty(&self) -> bool {
        self.0.as_object().is_some_and(Map::is_empty)
    }

    /// Apply the patch to a document in place.
    ///
    /// Field-level last-write-wins: each named field is replaced wholesale
    /// (arrays included), nested objects merge recursively, `null` removes.
    pub fn apply(&self, target: &mut Value) {
        merge_value(target, &self.0);
    }
}

fn diff_value(base: &Value, target: &Value) -> Option<Value> {
    match (base, target) {
        (Value::Object(base), Value::Object(target)) => {
            let mut patch = Map::new();
            for (key, base_value) in base {
                match target.get(key) {
                    Some(target_value) => {
                        if let Some(changed) = diff_value(base_value, target_value) {
                            patch.insert(key.clone(), changed);
                        }
                    }
                    None => {
                        patch.insert(key.clone(), Value::Null);
                    }
                }
            }
            for (key, target_value) in target {
                if !base.contains_key(key) {
                    patch.insert(key.clone(), target_value.clone());
                }
            }
            if patch.is_empty() {
                None
            } else {
                Some(Value::Object(patch))
            }
        }
        _ if base == target => None,
        _ => Some(target.clone()),
    }
}

fn merge_value(target: &mut Value, patch: &Value) {
    let Value::Object(patch) = patch else {
        *target = patch.clone();
        return;
    };
    if !target.is_object() {
        *target = Value::Object(Map::new());
    }
    if let Some(fields) = target.as_object_mut() {
        for (key, patch_value) in patch {
            if patch_value.is_null() {
                fields.remove(key);
            } else {
                merge_value(
                    fields.entry(key.clone()).or_insert(Value::Null),
                    patch_value,
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_diff_of_identical_documents_is_empty() {
        let doc = json!({"spec": {"source": "git://modules/network"}});
        assert!(MergePatch::diff(&doc, &doc).is_empty());
    }

    #[test]
    fn test_diff_carries_only_changed_fields() {
        let base = json!({"status": {"phase": "Pending", "plan": "old"}});
        let target = json!({"status": {"phase": "Planned", "plan": "old"}});

        let patch = MergePatch::diff(&base, &target);
        assert_eq!(patch.as_value(), &json!({"status": {"phase": "Planned"}}));
    }

    #[test]
    fn test_diff_encodes_removal_as_null() {
        let base = json!({"status": {"action": "Plan", "phase": "Pending"}});
        let target = json!({"status": {"phase": "Pending"}});

        let patch = MergePatch::diff(&base, &target);
        assert_eq!(patch.as_value(), &json!({"status": {"action": null}}));
    }

    #[test]
    fn test_apply_merges_and_removes() {
        let mut doc = json!({
            "spec": {"source": "git://modules/network", "destroy": false},
            "status": {"action": "Plan", "phase": "Pending"}
        });
        let patch = MergePatch::from_value(json!({
            "status": {"action": null, "phase": "Planned", "plan": "3 to add"}
        }));

        patch.apply(&mut doc);
        assert_eq!(
            doc,
            json!({
                "spec": {"source": "git://modules/network", "destroy": false},
                "status": {"phase": "Planned", "plan": "3 to add"}
            })
        );
    }

    #[test]
    fn test_apply_replaces_arrays_wholesale() {
        let mut doc = json!({"status": {"conditions": [{"kind": "Planned", "active": true}]}});
        let patch = MergePatch::from_value(json!({
            "status": {"conditions": [{"kind": "Applied", "active": true}]}
        }));

        patch.apply(&mut doc);
        assert_eq!(
            doc,
            json!({"status": {"conditions": [{"kind": "Applied", "active": true}]}})
        );
    }

    #[test]
    fn test_apply_preserves_unrelated_concurrent_fields() {
        // Base the diff on one snapshot, apply it to a document another
        // writer has touched in the meantime.
        let base = json!({"status": {"phase": "Pending", "message": "queued"}});
        let target = json!({"status": {"phase": "Planned", "message": "queued"}});
        let patch = MergePatch::diff(&base, &target);

        let mut live = json!({"status": {"phase": "Pending", "message": "picked up"}});
        patch.apply(&mut live);
        assert_eq!(
            live,
            json!({"status": {"phase": "Planned", "message": "picked up"}})
        );
    }

    #[test]
    fn test_diff_then_apply_round_trips() {
        let base = json!({
            "key": {"namespace": "infra", "name": "network-prod"},
            "spec": {"source": "git://modules/network", "vars": {"cidr": "10.0.0.0/16"}},
            "status": {"phase": "Pending", "action": "Plan"}
        });
        let target = json!({
            "key": {"namespace": "infra", "name": "network-prod"},
            "spec": {"source": "git://modules/network", "vars": {"cidr": "10.8.0.0/16"}},
            "status": {"phase": "Planned", "plan": "2 to add"}
        });

        let mut patched = base.clone();
        MergePatch::diff(&base, &target).apply(&mut patched);
        assert_eq!(patched, target);
    }

    #[test]
    fn test_apply_empty_patch_is_identity() {
        let mut doc = json!({"status": {"phase": "Applied"}});
        let patch = MergePatch::diff(&doc, &doc);

        patch.apply(&mut doc);
        assert_eq!(doc, json!({"status": {"phase": "Applied"}}));
    }
}
