//! Copying values.
//!
//! Cloning a [`Value`] only clones handles. The functions here allocate new
//! containers.

use std::cell::RefCell;
use std::rc::Rc;

use crate::value::Value;

impl Value {
    /// Copies the outermost container.
    ///
    /// The copy is a new mapping, sequence or callable whose entries are the
    /// same child handles as the original. Leaves are returned as-is.
    pub fn shallow_copy(&self) -> Value {
        match self {
            Value::Mapping(map) => Value::Mapping(Rc::new(RefCell::new(map.borrow().clone()))),
            Value::Sequence(list) => Value::Sequence(Rc::new(RefCell::new(list.borrow().clone()))),
            Value::Callable(c) => {
                let props = Rc::new(RefCell::new(c.props().borrow().clone()));
                Value::callable(c.with_props_map(props))
            }
            Value::Scalar(_) | Value::Opaque(_) => self.clone(),
        }
    }

    /// Creates a deep copy: every nested mapping and sequence is new.
    ///
    /// Blobs stay shared (they are never written through). Callables get a
    /// fresh property map but keep their body and parent.
    pub fn deep_copy(&self) -> Value {
        match self {
            Value::Mapping(map) => {
                let copied = map
                    .borrow()
                    .iter()
                    .map(|(k, v)| (k.clone(), v.deep_copy()))
                    .collect();
                Value::Mapping(Rc::new(RefCell::new(copied)))
            }
            Value::Sequence(list) => {
                let copied = list.borrow().iter().map(Value::deep_copy).collect();
                Value::Sequence(Rc::new(RefCell::new(copied)))
            }
            Value::Callable(c) => {
                let copied = c
                    .props()
                    .borrow()
                    .iter()
                    .map(|(k, v)| (k.clone(), v.deep_copy()))
                    .collect();
                Value::callable(c.with_props_map(Rc::new(RefCell::new(copied))))
            }
            Value::Scalar(_) | Value::Opaque(_) => self.clone(),
        }
    }
}
