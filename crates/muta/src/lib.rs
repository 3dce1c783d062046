//! muta: copy-on-write overlays over hierarchical values.
//!
//! [`wrap`] puts an overlay over a mapping, sequence or callable. Reads
//! through the returned view show the original structure with every write
//! made through the overlay layered on top; the original is never touched.
//! The writes are recorded as a sparse [`Patch`], which can be inspected
//! with [`get_patch`] and written into the original with [`commit`].
//!
//! # Example
//!
//! ```
//! use muta::{commit, get_patch, wrap, Patch, Value};
//! use serde_json::json;
//!
//! let doc = Value::from_json(json!({"foo": {"bar": 123}, "n": 5}));
//! let w = wrap(doc.clone()).unwrap();
//!
//! w.set("n", 6);
//! w.get_view("foo").unwrap().delete("bar");
//!
//! assert_eq!(w.get_value("n"), Some(Value::from(6)));
//! assert_eq!(doc.to_json(), json!({"foo": {"bar": 123}, "n": 5}));
//! assert_eq!(
//!     get_patch(&w).unwrap(),
//!     Patch::new()
//!         .with_assign("n", 6)
//!         .with_nested("foo", Patch::new().with_delete("bar"))
//! );
//!
//! commit(&w).unwrap();
//! assert_eq!(doc.to_json(), json!({"foo": {}, "n": 6}));
//! ```

mod codec;
mod commit;
mod error;
mod node;
mod patch;
mod view;

pub use codec::CodecOptions;
pub use commit::apply_patch;
pub use error::{MutaError, Result};
pub use muta_value::{Callable, Key, Scalar, Value, MAX_SEQUENCE_INDEX};
pub use patch::{Assigned, Patch};
pub use view::{Prop, View, Wrapper};

use tracing::trace;

/// Wraps a structured value in a fresh overlay.
///
/// Fails with [`MutaError::Unwrappable`] for scalars and opaque blobs.
pub fn wrap(value: Value) -> Result<Wrapper> {
    if !value.is_structured() {
        return Err(MutaError::Unwrappable { kind: value.kind() });
    }
    trace!(kind = value.kind(), "wrapping root");
    Ok(Wrapper::new(value, None))
}

/// Wraps a callable whose inherited properties are read through `parent`.
///
/// Keys missing from the callable's own properties resolve through the
/// parent overlay, so pending writes on `parent` are visible here. Writes
/// through the new wrapper stay in its own overlay.
pub fn wrap_with_parent(value: Value, parent: &View) -> Result<Wrapper> {
    if !matches!(value, Value::Callable(_)) {
        return Err(MutaError::NotCallable { kind: value.kind() });
    }
    let link = parent.link().ok_or(MutaError::InvalidArgument)?;
    Ok(Wrapper::new(value, Some(link)))
}

/// Writes the pending patch of a live view into its original structure and
/// clears it.
pub fn commit(candidate: impl Into<Prop>) -> Result<()> {
    let view = live_view(candidate.into())?;
    if view.commit() {
        Ok(())
    } else {
        Err(MutaError::InvalidArgument)
    }
}

/// The patch pending below a live view.
pub fn get_patch(candidate: impl Into<Prop>) -> Result<Patch> {
    Ok(live_view(candidate.into())?.patch())
}

/// True for a live overlay view.
pub fn is_wrapper(candidate: impl Into<Prop>) -> bool {
    live_view(candidate.into()).is_ok()
}

/// True if anything was written through `view` or its descendants.
pub fn was_mutated(view: &View) -> bool {
    view.was_mutated()
}

fn live_view(prop: Prop) -> Result<View> {
    match prop {
        Prop::Node(view) if view.is_live() => Ok(view),
        _ => Err(MutaError::InvalidArgument),
    }
}
