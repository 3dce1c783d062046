//! Callable values: an invocation body plus a property map.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::value::{MapRef, Value};

/// Shared invocation body.
pub type Invoke = Rc<dyn Fn(&[Value]) -> Value>;

/// A callable value.
///
/// Besides its body a callable owns a property map (for example a
/// `"prototype"` mapping of methods) and may inherit properties from a
/// parent callable. Property reads walk own properties first, then the
/// parent chain; writes only ever touch own properties.
pub struct Callable {
    name: String,
    invoke: Invoke,
    props: MapRef,
    parent: Option<Rc<Callable>>,
}

impl Callable {
    pub fn new(name: impl Into<String>, body: impl Fn(&[Value]) -> Value + 'static) -> Self {
        Self {
            name: name.into(),
            invoke: Rc::new(body),
            props: Rc::new(RefCell::new(IndexMap::new())),
            parent: None,
        }
    }

    /// Adds an own property.
    pub fn with_prop(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.props.borrow_mut().insert(name.into(), value.into());
        self
    }

    /// Sets the callable properties are inherited from.
    pub fn with_parent(mut self, parent: Rc<Callable>) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Own property map.
    pub fn props(&self) -> &MapRef {
        &self.props
    }

    pub fn parent(&self) -> Option<&Rc<Callable>> {
        self.parent.as_ref()
    }

    /// Returns the shared invocation body.
    pub fn invoker(&self) -> Invoke {
        Rc::clone(&self.invoke)
    }

    pub fn invoke(&self, args: &[Value]) -> Value {
        (self.invoke)(args)
    }

    /// Reads a property from this callable or the nearest ancestor that
    /// defines it.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        let mut current = Some(self);
        while let Some(callable) = current {
            if let Some(value) = callable.props.borrow().get(name) {
                return Some(value.clone());
            }
            current = callable.parent.as_deref();
        }
        None
    }

    pub fn contains(&self, name: &str) -> bool {
        let mut current = Some(self);
        while let Some(callable) = current {
            if callable.props.borrow().contains_key(name) {
                return true;
            }
            current = callable.parent.as_deref();
        }
        false
    }

    /// Builds a callable sharing this one's body and parent, with `props`
    /// as its own property map.
    pub fn with_props_map(&self, props: MapRef) -> Callable {
        Callable {
            name: self.name.clone(),
            invoke: Rc::clone(&self.invoke),
            props,
            parent: self.parent.clone(),
        }
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callable")
            .field("name", &self.name)
            .field("props", &self.props)
            .field("parent", &self.parent.as_ref().map(|p| p.name.clone()))
            .finish()
    }
}
