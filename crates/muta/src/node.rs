//! Overlay nodes and the arena that owns them.
//!
//! Every wrapped position in a structure is one [`Node`]: the original value
//! at that position plus two patch buckets and a memo of child nodes. Nodes
//! live in an [`Arena`] owned by the root wrapper and refer to each other by
//! [`NodeId`], so a child handed out once keeps its identity (and keeps
//! recording writes) for as long as the parent still references it.
//!
//! A child the parent stops referencing (its key was reassigned, deleted, or
//! replaced behind the overlay's back) is released together with its
//! subtree. Its slot is reused; the generation in [`NodeId`] makes views of
//! the released node go dead instead of aliasing the new occupant.
//!
//! Invariants kept by every write:
//! - a key is never in both `assigned` and `deleted`;
//! - `deleted` only holds keys the original target has;
//! - a memoized child's target is the value currently resolved for its key.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use indexmap::{IndexMap, IndexSet};
use muta_value::{Invoke, Key, Value, MAX_SEQUENCE_INDEX};
use tracing::trace;

/// Slot index plus the generation the slot had when the node was created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct NodeId {
    index: usize,
    generation: u32,
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

pub(crate) type Shared = Rc<RefCell<Arena>>;

/// Strong reference to a node in some arena, used for inherited lookups.
#[derive(Clone)]
pub(crate) struct Link {
    pub arena: Shared,
    pub id: NodeId,
}

impl Link {
    pub fn downgrade(&self) -> (Weak<RefCell<Arena>>, NodeId) {
        (Rc::downgrade(&self.arena), self.id)
    }
}

pub(crate) struct Node {
    /// Original value at this position.
    pub target: Value,
    pub assigned: IndexMap<Key, Value>,
    pub deleted: IndexSet<Key>,
    pub children: IndexMap<Key, NodeId>,
    /// Independently wrapped ancestor consulted after the own target.
    pub inherit: Option<Link>,
    /// Invocation override for callables.
    pub invoke: Option<Invoke>,
}

impl Node {
    fn vacant() -> Self {
        Self::new(Value::null())
    }

    fn new(target: Value) -> Self {
        Self {
            target,
            assigned: IndexMap::new(),
            deleted: IndexSet::new(),
            children: IndexMap::new(),
            inherit: None,
            invoke: None,
        }
    }
}

/// What a read resolved to.
pub(crate) enum Slot {
    Leaf(Value),
    Node(NodeId),
}

/// A read answered here, or handed on to an inherited overlay.
pub(crate) enum Lookup<T> {
    Found(T),
    Inherit(Link),
}

/// Detached copy of a node subtree, used to adopt a view into another
/// position without aliasing its nodes.
pub(crate) struct Snapshot {
    target: Value,
    assigned: IndexMap<Key, Value>,
    deleted: IndexSet<Key>,
    children: Vec<(Key, Snapshot)>,
    inherit: Option<Link>,
    invoke: Option<Invoke>,
}

struct Entry {
    generation: u32,
    node: Node,
}

#[derive(Default)]
pub(crate) struct Arena {
    entries: Vec<Entry>,
    free: Vec<usize>,
}

impl Arena {
    pub fn insert(&mut self, target: Value) -> NodeId {
        let node = Node::new(target);
        if let Some(index) = self.free.pop() {
            let entry = &mut self.entries[index];
            entry.node = node;
            return NodeId {
                index,
                generation: entry.generation,
            };
        }
        self.entries.push(Entry {
            generation: 0,
            node,
        });
        NodeId {
            index: self.entries.len() - 1,
            generation: 0,
        }
    }

    /// True while `id` names a node that has not been released.
    pub fn contains(&self, id: NodeId) -> bool {
        self.entries
            .get(id.index)
            .map_or(false, |entry| entry.generation == id.generation)
    }

    /// Releases `id` and every memoized node below it.
    pub fn release(&mut self, id: NodeId) {
        if !self.contains(id) {
            return;
        }
        let entry = &mut self.entries[id.index];
        let node = std::mem::replace(&mut entry.node, Node::vacant());
        entry.generation = entry.generation.wrapping_add(1);
        self.free.push(id.index);
        trace!(node = %id, "released node");
        for &child in node.children.values() {
            self.release(child);
        }
    }

    /// Drops the memoized child for `key`, releasing it unless it is `keep`.
    fn forget_child(&mut self, id: NodeId, key: &Key, keep: Option<NodeId>) {
        if let Some(child) = self.node_mut(id).children.shift_remove(key) {
            if Some(child) != keep {
                self.release(child);
            }
        }
    }

    /// Number of nodes not released.
    pub fn node_count(&self) -> usize {
        self.entries.len() - self.free.len()
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.entries[id.index].node
    }

    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.entries[id.index].node
    }

    /// Brings `key` into the form the node's target is keyed by. `None` if
    /// the container cannot hold such a key.
    pub fn normalize(&self, id: NodeId, key: &Key) -> Option<Key> {
        match &self.node(id).target {
            Value::Mapping(_) | Value::Callable(_) => Some(key.clone().into_name()),
            Value::Sequence(_) => key.as_index().map(Key::Index),
            Value::Scalar(_) | Value::Opaque(_) => None,
        }
    }

    // ── Read path ─────────────────────────────────────────────────────────

    pub fn get(&mut self, id: NodeId, key: &Key) -> Lookup<Option<Slot>> {
        let Some(key) = self.normalize(id, key) else {
            return Lookup::Found(None);
        };
        let node = self.node(id);
        // A deleted key masks the own value only; inherited values of a
        // callable show through.
        let own = if node.deleted.contains(&key) {
            None
        } else {
            match node.assigned.get(&key) {
                Some(value) => Some(value.clone()),
                None => node.target.lookup_own(&key),
            }
        };
        let value = match own {
            Some(value) => value,
            None => {
                if let Some(link) = &node.inherit {
                    return Lookup::Inherit(link.clone());
                }
                match inherited(&node.target, &key) {
                    Some(value) => value,
                    None => return Lookup::Found(None),
                }
            }
        };
        Lookup::Found(Some(self.resolve_child(id, key, value)))
    }

    /// Wraps structured values as (memoized) child nodes.
    fn resolve_child(&mut self, id: NodeId, key: Key, value: Value) -> Slot {
        if !value.is_structured() {
            return Slot::Leaf(value);
        }
        if let Some(&child) = self.node(id).children.get(&key) {
            // A clean child whose value was replaced behind the overlay's
            // back is stale; one with pending deltas is kept.
            if self.node(child).target.same(&value) || self.is_dirty(child) {
                return Slot::Node(child);
            }
            trace!(parent = %id, child = %child, key = %key, "dropped stale child");
            self.forget_child(id, &key, None);
        }
        let child = self.insert(value);
        trace!(parent = %id, child = %child, key = %key, "wrapped child");
        self.node_mut(id).children.insert(key, child);
        Slot::Node(child)
    }

    pub fn has(&self, id: NodeId, key: &Key) -> Lookup<bool> {
        let Some(key) = self.normalize(id, key) else {
            return Lookup::Found(false);
        };
        let node = self.node(id);
        if !node.deleted.contains(&key)
            && (node.assigned.contains_key(&key) || node.target.contains_own(&key))
        {
            return Lookup::Found(true);
        }
        match &node.inherit {
            Some(link) => Lookup::Inherit(link.clone()),
            None => Lookup::Found(inherited(&node.target, &key).is_some()),
        }
    }

    /// Like [`Arena::normalize`], but also refuses sequence indices past
    /// [`MAX_SEQUENCE_INDEX`] that the original does not already hold.
    pub fn writable(&self, id: NodeId, key: &Key) -> Option<Key> {
        let key = self.normalize(id, key)?;
        match (&self.node(id).target, &key) {
            (Value::Sequence(list), Key::Index(idx))
                if *idx >= list.borrow().len() && *idx > MAX_SEQUENCE_INDEX =>
            {
                None
            }
            _ => Some(key),
        }
    }

    /// Target keys minus deleted ones, then keys that only exist through
    /// assignment. Sequence keys come out in index order.
    pub fn keys(&self, id: NodeId) -> Vec<Key> {
        let node = self.node(id);
        let mut keys: IndexSet<Key> = node
            .target
            .keys()
            .into_iter()
            .filter(|k| !node.deleted.contains(k))
            .collect();
        keys.extend(node.assigned.keys().cloned());
        let mut keys: Vec<Key> = keys.into_iter().collect();
        if matches!(node.target, Value::Sequence(_)) {
            keys.sort();
        }
        keys
    }

    /// Mappings and callables count their keys. A sequence is as long as
    /// one past its highest present index.
    pub fn len(&self, id: NodeId) -> usize {
        let keys = self.keys(id);
        match &self.node(id).target {
            Value::Sequence(_) => keys
                .last()
                .and_then(Key::as_index)
                .map_or(0, |i| i.saturating_add(1)),
            _ => keys.len(),
        }
    }

    // ── Write path ────────────────────────────────────────────────────────

    /// Records `key = value`.
    ///
    /// `adopted` is a node already carrying deltas for `value` (see
    /// [`Arena::restore`]). Without one, a memoized child is carried over
    /// only when `value` is the original value at `key` and that child has
    /// pending deltas; every other write replaces the child.
    pub fn assign(&mut self, id: NodeId, key: &Key, value: Value, adopted: Option<NodeId>) -> bool {
        let Some(key) = self.writable(id, key) else {
            return false;
        };
        let node = self.node(id);
        let same_as_original = node
            .target
            .lookup_own(&key)
            .map_or(false, |original| original.same(&value));
        let current = node.children.get(&key).copied();
        let memo = current.filter(|&child| self.node(child).target.same(&value));
        let carried = match adopted {
            Some(child) => Some(child),
            None if same_as_original => memo,
            None => None,
        }
        .filter(|&child| self.is_dirty(child));
        if let Some(unused) = adopted.filter(|&a| Some(a) != carried && Some(a) != current) {
            self.release(unused);
        }

        let node = self.node_mut(id);
        node.deleted.shift_remove(&key);
        if same_as_original && carried.is_none() {
            // Back to the original: keep a clean memoized child for it.
            node.assigned.shift_remove(&key);
            if memo.is_none() {
                self.forget_child(id, &key, None);
            }
            return true;
        }
        self.forget_child(id, &key, carried);
        if let Some(child) = carried {
            trace!(parent = %id, child = %child, key = %key, "carried child deltas into assignment");
            self.node_mut(id).children.insert(key.clone(), child);
        }
        self.node_mut(id).assigned.insert(key, value);
        true
    }

    pub fn delete(&mut self, id: NodeId, key: &Key) -> bool {
        let Some(key) = self.normalize(id, key) else {
            return false;
        };
        let node = self.node_mut(id);
        node.assigned.shift_remove(&key);
        if node.target.contains_own(&key) {
            node.deleted.insert(key.clone());
        }
        self.forget_child(id, &key, None);
        true
    }

    /// True if this node or any memoized descendant has pending deltas.
    pub fn is_dirty(&self, id: NodeId) -> bool {
        let node = self.node(id);
        !node.assigned.is_empty()
            || !node.deleted.is_empty()
            || node.children.values().any(|&child| self.is_dirty(child))
    }

    // ── Adoption ──────────────────────────────────────────────────────────

    pub fn snapshot(&self, id: NodeId) -> Snapshot {
        let node = self.node(id);
        Snapshot {
            target: node.target.clone(),
            assigned: node.assigned.clone(),
            deleted: node.deleted.clone(),
            children: node
                .children
                .iter()
                .map(|(key, &child)| (key.clone(), self.snapshot(child)))
                .collect(),
            inherit: node.inherit.clone(),
            invoke: node.invoke.clone(),
        }
    }

    /// Rebuilds a snapshot as fresh nodes in this arena.
    pub fn restore(&mut self, snapshot: Snapshot) -> NodeId {
        let id = self.insert(snapshot.target);
        let mut children = IndexMap::new();
        for (key, child) in snapshot.children {
            children.insert(key, self.restore(child));
        }
        let node = self.node_mut(id);
        node.assigned = snapshot.assigned;
        node.deleted = snapshot.deleted;
        node.children = children;
        node.inherit = snapshot.inherit;
        node.invoke = snapshot.invoke;
        id
    }

    // ── After commit ──────────────────────────────────────────────────────

    /// Clears pending deltas below `id` once they have been written into the
    /// target.
    ///
    /// Children created for assigned keys are released (the committed value
    /// may be a new copy). Children reached through the original structure
    /// are kept, so views handed out earlier stay valid, unless the target
    /// no longer holds their value.
    pub fn reset(&mut self, id: NodeId) {
        let node = self.node_mut(id);
        let assigned: Vec<Key> = node.assigned.drain(..).map(|(key, _)| key).collect();
        node.deleted.clear();
        for key in &assigned {
            self.forget_child(id, key, None);
        }
        let children: Vec<(Key, NodeId)> = self
            .node(id)
            .children
            .iter()
            .map(|(key, &child)| (key.clone(), child))
            .collect();
        for (key, child) in children {
            let live = self
                .node(id)
                .target
                .lookup(&key)
                .map_or(false, |value| value.same(&self.node(child).target));
            if live {
                self.reset(child);
            } else {
                self.forget_child(id, &key, None);
            }
        }
    }
}

/// A value a callable inherits for `key`, skipping its own properties.
fn inherited(target: &Value, key: &Key) -> Option<Value> {
    match target {
        Value::Callable(c) => c.parent()?.lookup(&key.to_name()),
        _ => None,
    }
}
