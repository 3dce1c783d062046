//! muta-value: the value model wrapped by `muta` overlays.
//!
//! Structured values ([`Value::Mapping`], [`Value::Sequence`],
//! [`Value::Callable`]) and opaque blobs are reference-counted, so two
//! handles can be compared by identity ([`Value::same`]) as well as by
//! content (`==`). Containers are shared behind `RefCell`: a caller holding
//! the original structure can keep editing it while an overlay is live.
//!
//! # Example
//!
//! ```
//! use muta_value::{Key, Value};
//!
//! let inner = Value::map([("bar", Value::from(123))]);
//! let doc = Value::map([("foo", inner.clone())]);
//!
//! let foo = doc.lookup(&Key::from("foo")).unwrap();
//! assert!(foo.same(&inner));
//! assert_eq!(foo, Value::map([("bar", Value::from(123))]));
//! ```

pub mod callable;
pub mod copy;
pub mod equal;
pub mod json;
pub mod key;
pub mod value;

pub use callable::{Callable, Invoke};
pub use equal::deep_equal;
pub use key::Key;
pub use value::{Blob, ListRef, MapRef, Scalar, Value, MAX_SEQUENCE_INDEX};
