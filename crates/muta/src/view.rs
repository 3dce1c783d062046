//! Consumer-facing handles: [`Wrapper`], [`View`] and [`Prop`].

use std::cell::RefCell;
use std::fmt;
use std::ops::Deref;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;
use muta_pointer::{parse_pointer, validate_pointer};
use muta_value::{Invoke, Key, Value};
use tracing::{debug, warn};

use crate::commit::apply_patch;
use crate::error::Result;
use crate::node::{Arena, Link, Lookup, NodeId, Shared, Slot};
use crate::patch::Patch;

// ── Wrapper ───────────────────────────────────────────────────────────────

/// Owner of an overlay.
///
/// Holds every node created for the wrapped structure. Dropping it releases
/// them all; views into it then go dead. Dereferences to the root [`View`].
pub struct Wrapper {
    arena: Shared,
    root: View,
}

impl Wrapper {
    pub(crate) fn new(target: Value, inherit: Option<Link>) -> Self {
        let mut arena = Arena::default();
        let id = arena.insert(target);
        arena.node_mut(id).inherit = inherit;
        let arena = Rc::new(RefCell::new(arena));
        let root = View {
            arena: Rc::downgrade(&arena),
            id,
        };
        Self { arena, root }
    }

    /// The root view.
    pub fn view(&self) -> View {
        self.root.clone()
    }

    /// Number of nodes currently held (root included). Nodes released by
    /// reassignment or deletion are not counted.
    pub fn node_count(&self) -> usize {
        self.arena.borrow().node_count()
    }
}

impl Deref for Wrapper {
    type Target = View;

    fn deref(&self) -> &View {
        &self.root
    }
}

impl fmt::Debug for Wrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wrapper")
            .field("nodes", &self.node_count())
            .finish()
    }
}

// ── Prop ──────────────────────────────────────────────────────────────────

/// Result of reading a key through a view.
#[derive(Debug, Clone, PartialEq)]
pub enum Prop {
    /// A structured value, wrapped.
    Node(View),
    /// A scalar or opaque leaf, by reference.
    Leaf(Value),
}

impl Prop {
    pub fn as_view(&self) -> Option<&View> {
        match self {
            Prop::Node(view) => Some(view),
            Prop::Leaf(_) => None,
        }
    }

    pub fn into_view(self) -> Option<View> {
        match self {
            Prop::Node(view) => Some(view),
            Prop::Leaf(_) => None,
        }
    }

    pub fn as_leaf(&self) -> Option<&Value> {
        match self {
            Prop::Leaf(value) => Some(value),
            Prop::Node(_) => None,
        }
    }

    /// Effective value: leaves as-is, views materialized.
    pub fn materialize(&self) -> Value {
        match self {
            Prop::Leaf(value) => value.clone(),
            Prop::Node(view) => view.materialize().unwrap_or_else(Value::null),
        }
    }
}

impl From<View> for Prop {
    fn from(view: View) -> Self {
        Prop::Node(view)
    }
}

impl From<&View> for Prop {
    fn from(view: &View) -> Self {
        Prop::Node(view.clone())
    }
}

impl From<&Wrapper> for Prop {
    fn from(wrapper: &Wrapper) -> Self {
        Prop::Node(wrapper.view())
    }
}

impl From<Value> for Prop {
    fn from(value: Value) -> Self {
        Prop::Leaf(value)
    }
}

impl From<&Value> for Prop {
    fn from(value: &Value) -> Self {
        Prop::Leaf(value.clone())
    }
}

impl From<&Prop> for Prop {
    fn from(prop: &Prop) -> Self {
        prop.clone()
    }
}

// ── View ──────────────────────────────────────────────────────────────────

/// Handle to one wrapped position.
///
/// Reads combine the recorded writes with the original value; writes only
/// ever touch the overlay. Reading the same structured key twice yields
/// equal views (same node), and writes through either land in the same
/// patch.
///
/// A view does not keep its [`Wrapper`] alive. Once the wrapper is dropped,
/// reads through the view yield nothing and writes are ignored.
#[derive(Clone)]
pub struct View {
    arena: Weak<RefCell<Arena>>,
    id: NodeId,
}

impl View {
    fn from_link(link: &Link) -> View {
        let (arena, id) = link.downgrade();
        View { arena, id }
    }

    fn child(&self, id: NodeId) -> View {
        View {
            arena: self.arena.clone(),
            id,
        }
    }

    /// The arena, while both it and this view's node are alive.
    fn shared(&self) -> Option<Shared> {
        let shared = self.arena.upgrade()?;
        let live = shared.borrow().contains(self.id);
        live.then_some(shared)
    }

    fn shared_for_write(&self, op: &str) -> Option<Shared> {
        let shared = self.shared();
        if shared.is_none() {
            warn!(op, "write through a released view; ignored");
        }
        shared
    }

    pub(crate) fn link(&self) -> Option<Link> {
        self.shared().map(|arena| Link { arena, id: self.id })
    }

    /// False once the owning [`Wrapper`] has been dropped, or once the
    /// parent stopped referencing this node (its key was reassigned or
    /// deleted through the overlay).
    pub fn is_live(&self) -> bool {
        self.shared().is_some()
    }

    /// The original value at this position.
    pub fn target(&self) -> Option<Value> {
        let shared = self.shared()?;
        let target = shared.borrow().node(self.id).target.clone();
        Some(target)
    }

    // ── Reads ─────────────────────────────────────────────────────────────

    /// Reads `key`: absent if deleted, else the assigned value, else the
    /// original value (inherited values included for callables).
    /// Structured values come back wrapped.
    pub fn get(&self, key: impl Into<Key>) -> Option<Prop> {
        let key = key.into();
        let shared = self.shared()?;
        let lookup = shared.borrow_mut().get(self.id, &key);
        match lookup {
            Lookup::Found(None) => None,
            Lookup::Found(Some(Slot::Leaf(value))) => Some(Prop::Leaf(value)),
            Lookup::Found(Some(Slot::Node(id))) => Some(Prop::Node(self.child(id))),
            Lookup::Inherit(link) => View::from_link(&link).get(key),
        }
    }

    /// Reads a leaf value, `None` if absent or structured.
    pub fn get_value(&self, key: impl Into<Key>) -> Option<Value> {
        match self.get(key)? {
            Prop::Leaf(value) => Some(value),
            Prop::Node(_) => None,
        }
    }

    /// Reads a structured value as a view, `None` if absent or a leaf.
    pub fn get_view(&self, key: impl Into<Key>) -> Option<View> {
        self.get(key)?.into_view()
    }

    pub fn has(&self, key: impl Into<Key>) -> bool {
        let key = key.into();
        let Some(shared) = self.shared() else {
            return false;
        };
        let lookup = shared.borrow().has(self.id, &key);
        match lookup {
            Lookup::Found(found) => found,
            Lookup::Inherit(link) => View::from_link(&link).has(key),
        }
    }

    /// Own keys: original keys not deleted, then keys added by assignment.
    pub fn keys(&self) -> Vec<Key> {
        match self.shared() {
            Some(shared) => shared.borrow().keys(self.id),
            None => Vec::new(),
        }
    }

    /// Number of keys, or for sequences one past the highest present index.
    pub fn len(&self) -> usize {
        match self.shared() {
            Some(shared) => shared.borrow().len(self.id),
            None => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Follows a pointer (`"/foo/0/bar"`) through the overlay.
    ///
    /// `Ok(None)` if a step is absent or passes through a leaf.
    pub fn pointer(&self, pointer: &str) -> Result<Option<Prop>> {
        validate_pointer(pointer)?;
        let mut current = Prop::Node(self.clone());
        for key in parse_pointer(pointer) {
            let next = match &current {
                Prop::Node(view) => view.get(key),
                Prop::Leaf(_) => None,
            };
            match next {
                Some(prop) => current = prop,
                None => return Ok(None),
            }
        }
        Ok(Some(current))
    }

    /// Builds a fresh value equal to what this view currently shows.
    ///
    /// Sequence holes come out as nulls. Callables keep their body and get
    /// a fresh property map.
    pub fn materialize(&self) -> Option<Value> {
        let target = self.target()?;
        let mut entries = Vec::new();
        for key in self.keys() {
            if let Some(prop) = self.get(key.clone()) {
                entries.push((key, prop.materialize()));
            }
        }
        let value = match &target {
            Value::Sequence(_) => {
                let fresh = Value::list(Vec::<Value>::new());
                for (key, value) in entries {
                    fresh.put(&key, value);
                }
                fresh
            }
            Value::Callable(c) => {
                let props: IndexMap<String, Value> =
                    entries.into_iter().map(|(k, v)| (k.to_name(), v)).collect();
                Value::callable(c.with_props_map(Rc::new(RefCell::new(props))))
            }
            _ => Value::map(entries.into_iter().map(|(k, v)| (k.to_name(), v))),
        };
        Some(value)
    }

    // ── Writes ────────────────────────────────────────────────────────────

    /// Records `key = value` in the overlay.
    ///
    /// Setting a key back to its original value (the same reference, for
    /// structured values) removes the record, unless that original child
    /// was edited through this view; then the edits are kept and reported
    /// under the assignment. Returns `false` if the key does not fit the
    /// container or the wrapper is gone.
    pub fn set(&self, key: impl Into<Key>, value: impl Into<Value>) -> bool {
        let key = key.into();
        let Some(shared) = self.shared_for_write("set") else {
            return false;
        };
        let ok = shared.borrow_mut().assign(self.id, &key, value.into(), None);
        if !ok {
            warn!(key = %key, "key does not fit the wrapped container; set ignored");
        }
        ok
    }

    /// Assigns the structure behind `other`, including its pending edits.
    ///
    /// `other` may belong to this or another wrapper. Its edits are copied,
    /// so later writes through `other` do not show up here. On commit the
    /// value written is a copy of `other`'s original with those edits
    /// applied.
    pub fn set_view(&self, key: impl Into<Key>, other: &View) -> bool {
        let key = key.into();
        let Some(shared) = self.shared_for_write("set_view") else {
            return false;
        };
        let Some(foreign) = other.shared() else {
            warn!(key = %key, "assigned view was released; set ignored");
            return false;
        };
        let Some(normalized) = shared.borrow().writable(self.id, &key) else {
            warn!(key = %key, "key does not fit the wrapped container; set ignored");
            return false;
        };
        let (value, snapshot) = {
            let arena = foreign.borrow();
            let value = arena.node(other.id).target.clone();
            let snapshot = arena.is_dirty(other.id).then(|| arena.snapshot(other.id));
            (value, snapshot)
        };

        let mut arena = shared.borrow_mut();
        let memoized = Rc::ptr_eq(&shared, &foreign)
            && arena.node(self.id).children.get(&normalized) == Some(&other.id);
        let adopted = if memoized {
            Some(other.id).filter(|&id| arena.is_dirty(id))
        } else {
            snapshot.map(|snapshot| arena.restore(snapshot))
        };
        arena.assign(self.id, &normalized, value, adopted)
    }

    /// Removes `key` from the view. Original keys are masked; keys that
    /// only existed through assignment are simply forgotten.
    pub fn delete(&self, key: impl Into<Key>) -> bool {
        let key = key.into();
        let Some(shared) = self.shared_for_write("delete") else {
            return false;
        };
        let ok = shared.borrow_mut().delete(self.id, &key);
        if !ok {
            warn!(key = %key, "key does not fit the wrapped container; delete ignored");
        }
        ok
    }

    /// Appends to a sequence view.
    pub fn push(&self, value: impl Into<Value>) -> bool {
        let len = self.len();
        self.set(Key::Index(len), value)
    }

    /// Removes and returns the last element of a sequence view.
    pub fn pop(&self) -> Option<Prop> {
        let len = self.len();
        if len == 0 {
            return None;
        }
        let key = Key::Index(len - 1);
        let prop = self.get(key.clone());
        self.delete(key);
        prop
    }

    // ── Patch & commit ────────────────────────────────────────────────────

    /// True if anything was written through this view or its descendants.
    ///
    /// Edits made to the original structure directly are visible through
    /// the view but do not count.
    pub fn was_mutated(&self) -> bool {
        match self.shared() {
            Some(shared) => shared.borrow().is_dirty(self.id),
            None => false,
        }
    }

    /// The writes recorded below this view.
    pub fn patch(&self) -> Patch {
        match self.shared() {
            Some(shared) => shared.borrow().extract(self.id),
            None => Patch::new(),
        }
    }

    /// Writes the recorded patch into the original structure and clears the
    /// overlay. Returns `false` if the wrapper is gone.
    ///
    /// Views of original children stay valid and now show the committed
    /// state.
    pub fn commit(&self) -> bool {
        let Some(shared) = self.shared_for_write("commit") else {
            return false;
        };
        let (target, patch) = {
            let arena = shared.borrow();
            (arena.node(self.id).target.clone(), arena.extract(self.id))
        };
        debug!(
            node = %self.id,
            assign = patch.assign.len(),
            delete = patch.delete.len(),
            nested = patch.nested.len(),
            "committing overlay"
        );
        apply_patch(&target, &patch);
        shared.borrow_mut().reset(self.id);
        true
    }

    // ── Callables ─────────────────────────────────────────────────────────

    /// Invokes a callable view: the override set with
    /// [`View::set_invoke`], else the original body. `None` for
    /// non-callables.
    pub fn call(&self, args: &[Value]) -> Option<Value> {
        let shared = self.shared()?;
        let invoke = {
            let arena = shared.borrow();
            let node = arena.node(self.id);
            match (&node.invoke, &node.target) {
                (Some(invoke), _) => Rc::clone(invoke),
                (None, Value::Callable(c)) => c.invoker(),
                (None, _) => return None,
            }
        };
        Some(invoke(args))
    }

    /// Replaces the invocation body seen through this view. The original
    /// callable is not affected.
    pub fn set_invoke(&self, body: impl Fn(&[Value]) -> Value + 'static) -> bool {
        let Some(shared) = self.shared_for_write("set_invoke") else {
            return false;
        };
        let mut arena = shared.borrow_mut();
        let node = arena.node_mut(self.id);
        if !matches!(node.target, Value::Callable(_)) {
            warn!(kind = node.target.kind(), "invocation override on a non-callable; ignored");
            return false;
        }
        let invoke: Invoke = Rc::new(body);
        node.invoke = Some(invoke);
        true
    }
}

impl PartialEq for View {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && Weak::ptr_eq(&self.arena, &other.arena)
    }
}

impl fmt::Debug for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("View")
            .field("node", &self.id)
            .field("live", &self.is_live())
            .finish()
    }
}

