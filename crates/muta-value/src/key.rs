//! Property keys.

use std::fmt;

/// A property key: a mapping field name or a sequence index.
///
/// Mappings and callable property maps are keyed by name, sequences by
/// index. A numeric name addresses a sequence slot and an index addresses a
/// mapping field spelled with the same digits, so both forms can be used
/// interchangeably from the caller's side.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    Name(String),
    Index(usize),
}

impl Key {
    /// Returns the sequence index this key addresses, if any.
    ///
    /// Names are accepted when they are canonical non-negative integers
    /// (`"0"`, `"17"`, but not `"01"` or `"-1"`).
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Key::Index(i) => Some(*i),
            Key::Name(name) => {
                if !is_canonical_index(name) {
                    return None;
                }
                name.parse().ok()
            }
        }
    }

    /// Returns the field name this key addresses in a mapping.
    pub fn to_name(&self) -> String {
        match self {
            Key::Name(name) => name.clone(),
            Key::Index(i) => i.to_string(),
        }
    }

    /// Returns the key as a name key (`Index(3)` becomes `Name("3")`).
    pub fn into_name(self) -> Key {
        match self {
            Key::Name(_) => self,
            Key::Index(i) => Key::Name(i.to_string()),
        }
    }
}

fn is_canonical_index(s: &str) -> bool {
    if s.is_empty() {
        return false;
    }
    let bytes = s.as_bytes();
    if bytes.len() > 1 && bytes[0] == b'0' {
        return false;
    }
    bytes.iter().all(|b| b.is_ascii_digit())
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Name(name) => f.write_str(name),
            Key::Index(i) => write!(f, "{i}"),
        }
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::Name(s.to_string())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::Name(s)
    }
}

impl From<&String> for Key {
    fn from(s: &String) -> Self {
        Key::Name(s.clone())
    }
}

impl From<usize> for Key {
    fn from(i: usize) -> Self {
        Key::Index(i)
    }
}

impl From<&Key> for Key {
    fn from(k: &Key) -> Self {
        k.clone()
    }
}
