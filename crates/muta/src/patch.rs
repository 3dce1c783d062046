//! The patch structure and its extraction from a node tree.

use indexmap::{IndexMap, IndexSet};
use muta_value::{Key, Value};

use crate::node::{Arena, NodeId};

/// Sparse, recursive description of the writes recorded by an overlay.
///
/// - `assign`: keys set at this level, with the value they were set to.
/// - `delete`: original keys removed at this level.
/// - `nested`: deltas found by descending into the *original* structure,
///   keyed by the child they belong to.
///
/// A key reassigned wholesale reports its nested changes inside its
/// `assign` entry ([`Assigned::Patched`]), never under `nested`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Patch {
    pub assign: IndexMap<Key, Assigned>,
    pub delete: IndexSet<Key>,
    pub nested: IndexMap<Key, Patch>,
}

/// An `assign` entry.
#[derive(Debug, Clone, PartialEq)]
pub enum Assigned {
    /// Write this value as-is.
    Value(Value),
    /// The assigned value was edited further through the overlay: write a
    /// copy of `base` with `patch` applied.
    Patched { base: Value, patch: Patch },
}

impl Patch {
    pub fn new() -> Self {
        Self::default()
    }

    /// True if the patch records nothing at any depth.
    pub fn is_empty(&self) -> bool {
        self.assign.is_empty() && self.delete.is_empty() && self.nested.is_empty()
    }

    pub fn with_assign(mut self, key: impl Into<Key>, value: impl Into<Value>) -> Self {
        self.assign.insert(key.into(), Assigned::Value(value.into()));
        self
    }

    pub fn with_patched(mut self, key: impl Into<Key>, base: Value, patch: Patch) -> Self {
        self.assign.insert(key.into(), Assigned::Patched { base, patch });
        self
    }

    pub fn with_delete(mut self, key: impl Into<Key>) -> Self {
        self.delete.insert(key.into());
        self
    }

    pub fn with_nested(mut self, key: impl Into<Key>, patch: Patch) -> Self {
        self.nested.insert(key.into(), patch);
        self
    }
}

impl Assigned {
    /// The plain value, if this entry carries no nested patch.
    pub fn value(&self) -> Option<&Value> {
        match self {
            Assigned::Value(v) => Some(v),
            Assigned::Patched { .. } => None,
        }
    }

    pub fn patch(&self) -> Option<&Patch> {
        match self {
            Assigned::Value(_) => None,
            Assigned::Patched { patch, .. } => Some(patch),
        }
    }
}

impl Arena {
    /// Builds the patch for the subtree rooted at `id`.
    pub(crate) fn extract(&self, id: NodeId) -> Patch {
        let node = self.node(id);
        let mut patch = Patch::new();
        for (key, value) in &node.assigned {
            let entry = match node.children.get(key) {
                Some(&child) if self.is_dirty(child) => Assigned::Patched {
                    base: self.node(child).target.clone(),
                    patch: self.extract(child),
                },
                _ => Assigned::Value(value.clone()),
            };
            patch.assign.insert(key.clone(), entry);
        }
        patch.delete = node.deleted.clone();
        for (key, &child) in &node.children {
            if node.assigned.contains_key(key) {
                continue;
            }
            let sub = self.extract(child);
            if !sub.is_empty() {
                patch.nested.insert(key.clone(), sub);
            }
        }
        patch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_patch() {
        assert!(Patch::new().is_empty());
        assert!(!Patch::new().with_delete("x").is_empty());
        assert!(!Patch::new().with_nested("a", Patch::new()).is_empty());
    }

    #[test]
    fn builders() {
        let patch = Patch::new()
            .with_assign("a", 1)
            .with_delete("b")
            .with_nested("c", Patch::new().with_assign("d", true));
        assert_eq!(patch.assign[&Key::from("a")].value(), Some(&Value::from(1)));
        assert!(patch.delete.contains(&Key::from("b")));
        assert_eq!(
            patch.nested[&Key::from("c")].assign[&Key::from("d")],
            Assigned::Value(Value::from(true))
        );
    }

    #[test]
    fn unchanged_children_contribute_nothing() {
        let mut arena = Arena::default();
        let root = arena.insert(Value::map([("a", Value::map([("b", 1)]))]));
        let _ = arena.get(root, &Key::from("a"));
        assert!(arena.extract(root).is_empty());
    }

    #[test]
    fn patched_entry_carries_base() {
        let inner = Value::map([("b", 1)]);
        let mut arena = Arena::default();
        let root = arena.insert(Value::empty_map());
        arena.assign(root, &Key::from("a"), inner.clone(), None);
        let child = match arena.get(root, &Key::from("a")) {
            crate::node::Lookup::Found(Some(crate::node::Slot::Node(id))) => id,
            _ => panic!("expected a child node"),
        };
        arena.delete(child, &Key::from("b"));

        let patch = arena.extract(root);
        match &patch.assign[&Key::from("a")] {
            Assigned::Patched { base, patch } => {
                assert!(base.same(&inner));
                assert_eq!(patch, &Patch::new().with_delete("b"));
            }
            other => panic!("expected a patched entry, got {other:?}"),
        }
    }
}
