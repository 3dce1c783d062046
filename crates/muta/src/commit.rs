//! Writing patches into real structures.

use muta_pointer::format_pointer;
use muta_value::{Key, Value};
use tracing::warn;

use crate::patch::{Assigned, Patch};

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Mutate nested containers where they are.
    InPlace,
    /// Replace every container on a patched path with an edited copy.
    Copy,
}

/// Applies `patch` to `target` in place.
///
/// Nested entries are applied first, into the matching child of `target`,
/// then this level's deletions, then its assignments. Deltas recorded
/// through the original structure therefore land in the original nested
/// containers, while [`Assigned::Patched`] entries are materialized from a
/// copy of their base and never touch it.
///
/// Entries that do not fit `target` (a nested patch for a key holding a
/// leaf, an index written into a mapping's sequence slot) are skipped with a
/// warning. The caller must not edit `target` through other handles while
/// the patch is being applied.
pub fn apply_patch(target: &Value, patch: &Patch) {
    apply_at(target, patch, Mode::InPlace, &mut Vec::new());
}

fn apply_at(target: &Value, patch: &Patch, mode: Mode, path: &mut Vec<Key>) {
    for (key, sub) in &patch.nested {
        let Some(child) = target.lookup(key).filter(Value::is_structured) else {
            warn!(path = %format_pointer(path), key = %key, "no structured value under nested patch entry; skipped");
            continue;
        };
        path.push(key.clone());
        match mode {
            Mode::InPlace => apply_at(&child, sub, mode, path),
            Mode::Copy => {
                let copy = child.shallow_copy();
                apply_at(&copy, sub, mode, path);
                target.put(key, copy);
            }
        }
        path.pop();
    }

    let mut deletions: Vec<&Key> = patch.delete.iter().collect();
    if matches!(target, Value::Sequence(_)) {
        // Highest index first, so trailing removals shorten the sequence.
        deletions.sort_by(|a, b| b.as_index().cmp(&a.as_index()));
    }
    for key in deletions {
        target.remove(key);
    }

    for (key, assigned) in &patch.assign {
        path.push(key.clone());
        let value = materialize_at(assigned, path);
        path.pop();
        if !target.put(key, value) {
            warn!(path = %format_pointer(path), key = %key, kind = target.kind(), "assignment does not fit target; skipped");
        }
    }
}

fn materialize_at(assigned: &Assigned, path: &mut Vec<Key>) -> Value {
    match assigned {
        Assigned::Value(value) => value.clone(),
        Assigned::Patched { base, patch } => {
            let copy = base.shallow_copy();
            apply_at(&copy, patch, Mode::Copy, path);
            copy
        }
    }
}

impl Assigned {
    /// The value this entry writes on commit.
    ///
    /// For [`Assigned::Patched`] this is a fresh copy of `base` with the
    /// nested patch applied; `base` itself is left untouched.
    pub fn materialize(&self) -> Value {
        materialize_at(self, &mut Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn delete_then_assign() {
        let target = Value::from_json(json!({"a": 1, "b": 2}));
        apply_patch(&target, &Patch::new().with_delete("a").with_assign("c", 3));
        assert_eq!(target.to_json(), json!({"b": 2, "c": 3}));
    }

    #[test]
    fn nested_entries_edit_children_in_place() {
        let inner = Value::map([("x", 1)]);
        let target = Value::map([("inner", inner.clone())]);
        apply_patch(
            &target,
            &Patch::new().with_nested("inner", Patch::new().with_assign("x", 2)),
        );
        assert!(target.lookup_own(&Key::from("inner")).unwrap().same(&inner));
        assert_eq!(inner.to_json(), json!({"x": 2}));
    }

    #[test]
    fn patched_entries_leave_base_untouched() {
        let deep = Value::map([("r", 1)]);
        let base = Value::map([("q", deep.clone()), ("s", Value::from(0))]);
        let assigned = Assigned::Patched {
            base: base.clone(),
            patch: Patch::new()
                .with_assign("s", 1)
                .with_nested("q", Patch::new().with_assign("r", 2)),
        };
        let value = assigned.materialize();
        assert_eq!(value.to_json(), json!({"q": {"r": 2}, "s": 1}));
        assert_eq!(base.to_json(), json!({"q": {"r": 1}, "s": 0}));
        assert_eq!(deep.to_json(), json!({"r": 1}));
    }

    #[test]
    fn sequence_deletions_trim_the_tail() {
        let target = Value::list([1, 2, 3]);
        apply_patch(&target, &Patch::new().with_delete(1usize).with_delete(2usize));
        assert_eq!(target.to_json(), json!([1]));
    }

    #[test]
    fn sequence_interior_deletion_leaves_null() {
        let target = Value::list([1, 2, 3]);
        apply_patch(&target, &Patch::new().with_delete(1usize));
        assert_eq!(target.to_json(), json!([1, null, 3]));
    }

    #[test]
    fn nested_entry_over_leaf_is_skipped() {
        let target = Value::from_json(json!({"a": 1}));
        apply_patch(
            &target,
            &Patch::new().with_nested("a", Patch::new().with_assign("b", 2)),
        );
        assert_eq!(target.to_json(), json!({"a": 1}));
    }
}
