//! Pointer utilities for muta key paths.
//!
//! Pointers follow [JSON Pointer (RFC 6901)](https://tools.ietf.org/html/rfc6901)
//! syntax. Components parse to [`Key::Name`]; numeric names address sequence
//! slots, so the same pointer works for mappings and sequences.
//!
//! # Example
//!
//! ```
//! use muta_pointer::{format_pointer, get, parse_pointer};
//! use muta_value::{Key, Value};
//!
//! let path = parse_pointer("/foo/0");
//! assert_eq!(path, vec![Key::from("foo"), Key::from("0")]);
//! assert_eq!(format_pointer(&path), "/foo/0");
//!
//! let doc = Value::map([("foo", Value::list([42]))]);
//! assert_eq!(get(&doc, &path), Some(Value::from(42)));
//! ```

use muta_value::{Key, Value};

pub mod validate;
pub use validate::{validate_pointer, PointerError};

/// Unescapes a pointer component.
///
/// `~1` is replaced with `/` and `~0` is replaced with `~`.
///
/// # Example
///
/// ```
/// use muta_pointer::unescape_component;
///
/// assert_eq!(unescape_component("a~0b"), "a~b");
/// assert_eq!(unescape_component("c~1d"), "c/d");
/// ```
pub fn unescape_component(component: &str) -> String {
    if !component.contains('~') {
        return component.to_string();
    }
    // Order matters: ~1 must be replaced before ~0
    component.replace("~1", "/").replace("~0", "~")
}

/// Escapes a pointer component.
///
/// # Example
///
/// ```
/// use muta_pointer::escape_component;
///
/// assert_eq!(escape_component("a~b"), "a~0b");
/// assert_eq!(escape_component("c/d"), "c~1d");
/// ```
pub fn escape_component(component: &str) -> String {
    if !component.contains('/') && !component.contains('~') {
        return component.to_string();
    }
    // Order matters: ~ must be escaped before /
    component.replace('~', "~0").replace('/', "~1")
}

/// Parse a pointer string into a key path.
///
/// - Empty string returns the root (empty) path
/// - The leading `/` is stripped; a pointer without one is read as if it
///   had it
/// - Each component is unescaped
///
/// # Example
///
/// ```
/// use muta_pointer::parse_pointer;
/// use muta_value::Key;
///
/// assert!(parse_pointer("").is_empty());
/// assert_eq!(parse_pointer("/"), vec![Key::from("")]);
/// assert_eq!(parse_pointer("/a~0b/c~1d"), vec![Key::from("a~b"), Key::from("c/d")]);
/// ```
pub fn parse_pointer(pointer: &str) -> Vec<Key> {
    if pointer.is_empty() {
        return Vec::new();
    }
    pointer
        .strip_prefix('/')
        .unwrap_or(pointer)
        .split('/')
        .map(|component| Key::Name(unescape_component(component)))
        .collect()
}

/// Format a key path into a pointer string.
///
/// Returns an empty string for the root path.
pub fn format_pointer(path: &[Key]) -> String {
    let mut out = String::new();
    for key in path {
        out.push('/');
        out.push_str(&escape_component(&key.to_name()));
    }
    out
}

/// Plain lookup along `path`, without any overlay.
///
/// Returns `None` if a step is missing or passes through a leaf.
pub fn get(val: &Value, path: &[Key]) -> Option<Value> {
    let mut current = val.clone();
    for key in path {
        current = current.lookup(key)?;
    }
    Some(current)
}
