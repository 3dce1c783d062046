//! The [`Value`] type.

use std::cell::RefCell;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::callable::Callable;
use crate::key::Key;

/// Shared handle to a mapping's entries.
pub type MapRef = Rc<RefCell<IndexMap<String, Value>>>;

/// Shared handle to a sequence's elements.
pub type ListRef = Rc<RefCell<Vec<Value>>>;

/// Shared handle to an opaque binary blob.
pub type Blob = Rc<Vec<u8>>;

/// Highest index a write may grow a sequence to.
///
/// Slots below a sequence's current length can always be written; growing
/// past this index is refused.
pub const MAX_SEQUENCE_INDEX: usize = 1 << 20;

// ── Scalar ────────────────────────────────────────────────────────────────

/// A leaf scalar. Compared by value.
///
/// Integers and floats compare numerically across variants, so `Int(1)`
/// equals `Float(1.0)`.
#[derive(Debug, Clone)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
}

impl PartialEq for Scalar {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Scalar::Null, Scalar::Null) => true,
            (Scalar::Bool(a), Scalar::Bool(b)) => a == b,
            (Scalar::Int(a), Scalar::Int(b)) => a == b,
            (Scalar::Float(a), Scalar::Float(b)) => a == b,
            (Scalar::Int(a), Scalar::Float(b)) | (Scalar::Float(b), Scalar::Int(a)) => {
                (*a as f64) == *b
            }
            (Scalar::Str(a), Scalar::Str(b)) => a == b,
            _ => false,
        }
    }
}

impl Scalar {
    pub fn kind(&self) -> &'static str {
        match self {
            Scalar::Null => "null",
            Scalar::Bool(_) => "bool",
            Scalar::Int(_) => "int",
            Scalar::Float(_) => "float",
            Scalar::Str(_) => "string",
        }
    }
}

// ── Value ─────────────────────────────────────────────────────────────────

/// A hierarchical value.
///
/// `Mapping`, `Sequence` and `Callable` are *structured*: an overlay can
/// descend into them. `Scalar` and `Opaque` are leaves and are always handed
/// out as-is.
///
/// `Clone` is cheap and shares containers; use [`Value::deep_copy`] for an
/// independent tree. `==` compares content; [`Value::same`] compares
/// identity.
#[derive(Debug, Clone)]
pub enum Value {
    Scalar(Scalar),
    /// Binary blob, never descended into.
    Opaque(Blob),
    Mapping(MapRef),
    Sequence(ListRef),
    Callable(Rc<Callable>),
}

impl Value {
    pub fn null() -> Value {
        Value::Scalar(Scalar::Null)
    }

    /// Creates a fresh mapping from `(name, value)` pairs.
    pub fn map<K, V, I>(entries: I) -> Value
    where
        K: Into<String>,
        V: Into<Value>,
        I: IntoIterator<Item = (K, V)>,
    {
        let map: IndexMap<String, Value> = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Value::Mapping(Rc::new(RefCell::new(map)))
    }

    /// Creates a fresh, empty mapping.
    pub fn empty_map() -> Value {
        Value::Mapping(Rc::new(RefCell::new(IndexMap::new())))
    }

    /// Creates a fresh sequence.
    pub fn list<V, I>(items: I) -> Value
    where
        V: Into<Value>,
        I: IntoIterator<Item = V>,
    {
        let list: Vec<Value> = items.into_iter().map(Into::into).collect();
        Value::Sequence(Rc::new(RefCell::new(list)))
    }

    pub fn bytes(data: impl Into<Vec<u8>>) -> Value {
        Value::Opaque(Rc::new(data.into()))
    }

    pub fn callable(callable: Callable) -> Value {
        Value::Callable(Rc::new(callable))
    }

    /// Short name of the variant, used in diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Scalar(s) => s.kind(),
            Value::Opaque(_) => "bytes",
            Value::Mapping(_) => "mapping",
            Value::Sequence(_) => "sequence",
            Value::Callable(_) => "callable",
        }
    }

    /// True for values an overlay can descend into.
    pub fn is_structured(&self) -> bool {
        matches!(
            self,
            Value::Mapping(_) | Value::Sequence(_) | Value::Callable(_)
        )
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Scalar(Scalar::Null))
    }

    /// Identity comparison.
    ///
    /// Scalars compare by value. Blobs, containers and callables compare by
    /// reference: two separately built but equal mappings are not the same.
    pub fn same(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Scalar(a), Value::Scalar(b)) => a == b,
            (Value::Opaque(a), Value::Opaque(b)) => Rc::ptr_eq(a, b),
            (Value::Mapping(a), Value::Mapping(b)) => Rc::ptr_eq(a, b),
            (Value::Sequence(a), Value::Sequence(b)) => Rc::ptr_eq(a, b),
            (Value::Callable(a), Value::Callable(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    pub fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Value::Scalar(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Scalar(Scalar::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Scalar(Scalar::Int(i)) => Some(*i),
            Value::Scalar(Scalar::Float(f)) if f.fract() == 0.0 => Some(*f as i64),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Scalar(Scalar::Int(i)) => Some(*i as f64),
            Value::Scalar(Scalar::Float(f)) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Scalar(Scalar::Str(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Opaque(b) => Some(b.as_slice()),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&MapRef> {
        match self {
            Value::Mapping(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&ListRef> {
        match self {
            Value::Sequence(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_callable(&self) -> Option<&Rc<Callable>> {
        match self {
            Value::Callable(c) => Some(c),
            _ => None,
        }
    }

    // ── Plain (non-overlay) property access ───────────────────────────────

    /// Reads an own property. Leaves have no properties.
    pub fn lookup_own(&self, key: &Key) -> Option<Value> {
        match self {
            Value::Mapping(map) => map.borrow().get(&key.to_name()).cloned(),
            Value::Sequence(list) => {
                let idx = key.as_index()?;
                list.borrow().get(idx).cloned()
            }
            Value::Callable(c) => c.props().borrow().get(&key.to_name()).cloned(),
            Value::Scalar(_) | Value::Opaque(_) => None,
        }
    }

    /// Reads a property, following a callable's parent chain.
    pub fn lookup(&self, key: &Key) -> Option<Value> {
        match self {
            Value::Callable(c) => c.lookup(&key.to_name()),
            _ => self.lookup_own(key),
        }
    }

    pub fn contains_own(&self, key: &Key) -> bool {
        match self {
            Value::Mapping(map) => map.borrow().contains_key(&key.to_name()),
            Value::Sequence(list) => key
                .as_index()
                .map_or(false, |idx| idx < list.borrow().len()),
            Value::Callable(c) => c.props().borrow().contains_key(&key.to_name()),
            Value::Scalar(_) | Value::Opaque(_) => false,
        }
    }

    pub fn contains(&self, key: &Key) -> bool {
        match self {
            Value::Callable(c) => c.contains(&key.to_name()),
            _ => self.contains_own(key),
        }
    }

    /// Own keys in storage order. Mapping and callable keys are names,
    /// sequence keys are indices.
    pub fn keys(&self) -> Vec<Key> {
        match self {
            Value::Mapping(map) => map.borrow().keys().map(Key::from).collect(),
            Value::Sequence(list) => (0..list.borrow().len()).map(Key::Index).collect(),
            Value::Callable(c) => c.props().borrow().keys().map(Key::from).collect(),
            Value::Scalar(_) | Value::Opaque(_) => Vec::new(),
        }
    }

    /// Number of own properties.
    pub fn len(&self) -> usize {
        match self {
            Value::Mapping(map) => map.borrow().len(),
            Value::Sequence(list) => list.borrow().len(),
            Value::Callable(c) => c.props().borrow().len(),
            Value::Scalar(_) | Value::Opaque(_) => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Writes an own property in place.
    ///
    /// Sequence writes past the end pad the gap with nulls, up to
    /// [`MAX_SEQUENCE_INDEX`]. Returns `false` if the key does not fit the
    /// container (or the value is a leaf).
    pub fn put(&self, key: &Key, value: Value) -> bool {
        match self {
            Value::Mapping(map) => {
                map.borrow_mut().insert(key.to_name(), value);
                true
            }
            Value::Sequence(list) => {
                let Some(idx) = key.as_index() else {
                    return false;
                };
                let mut list = list.borrow_mut();
                if idx >= list.len() {
                    if idx > MAX_SEQUENCE_INDEX {
                        return false;
                    }
                    list.resize(idx, Value::null());
                    list.push(value);
                } else {
                    list[idx] = value;
                }
                true
            }
            Value::Callable(c) => {
                c.props().borrow_mut().insert(key.to_name(), value);
                true
            }
            Value::Scalar(_) | Value::Opaque(_) => false,
        }
    }

    /// Removes an own property in place, returning the previous value.
    ///
    /// Mapping order of the remaining entries is preserved. Sequences have
    /// no holes: removing the last element shortens the sequence, removing
    /// any other element leaves a null in its slot.
    pub fn remove(&self, key: &Key) -> Option<Value> {
        match self {
            Value::Mapping(map) => map.borrow_mut().shift_remove(&key.to_name()),
            Value::Sequence(list) => {
                let idx = key.as_index()?;
                let mut list = list.borrow_mut();
                if idx + 1 == list.len() {
                    list.pop()
                } else if idx < list.len() {
                    Some(std::mem::replace(&mut list[idx], Value::null()))
                } else {
                    None
                }
            }
            Value::Callable(c) => c.props().borrow_mut().shift_remove(&key.to_name()),
            Value::Scalar(_) | Value::Opaque(_) => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        crate::equal::deep_equal(self, other)
    }
}

// ── Conversions ───────────────────────────────────────────────────────────

impl From<Scalar> for Value {
    fn from(s: Scalar) -> Self {
        Value::Scalar(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Scalar(Scalar::Bool(b))
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Scalar(Scalar::Int(i64::from(i)))
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Scalar(Scalar::Int(i))
    }
}

impl From<u32> for Value {
    fn from(i: u32) -> Self {
        Value::Scalar(Scalar::Int(i64::from(i)))
    }
}

impl From<u64> for Value {
    fn from(u: u64) -> Self {
        match i64::try_from(u) {
            Ok(i) => Value::Scalar(Scalar::Int(i)),
            Err(_) => Value::Scalar(Scalar::Float(u as f64)),
        }
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Scalar(Scalar::Float(f))
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Scalar(Scalar::Str(s.to_string()))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Scalar(Scalar::Str(s))
    }
}

impl From<Callable> for Value {
    fn from(c: Callable) -> Self {
        Value::callable(c)
    }
}

impl From<Rc<Callable>> for Value {
    fn from(c: Rc<Callable>) -> Self {
        Value::Callable(c)
    }
}

impl From<&Value> for Value {
    fn from(v: &Value) -> Self {
        v.clone()
    }
}
