//! JSON encoding of patches.
//!
//! The patch structure keeps its buckets in named fields, so it can never be
//! confused with data. JSON has no such separation: the buckets are written
//! under marker keys, and nested entries under their own key next to them.
//!
//! ```text
//! { "@assign": { <key>: <value or nested patch>, ... },
//!   "@delete": [ <key>, ... ],
//!   <key>: <nested patch>, ... }
//! ```
//!
//! Pick markers that cannot occur as data keys with [`CodecOptions`].

use muta_value::Key;
use serde_json::{Map, Value as Json};

use crate::patch::{Assigned, Patch};

/// Options for [`Patch::to_json_with`].
#[derive(Debug, Clone)]
pub struct CodecOptions {
    /// Marker key for the assign bucket.
    pub assign_key: String,
    /// Marker key for the delete bucket.
    pub delete_key: String,
}

impl Default for CodecOptions {
    fn default() -> Self {
        Self {
            assign_key: "@assign".to_string(),
            delete_key: "@delete".to_string(),
        }
    }
}

impl Patch {
    /// Encodes the patch with the default markers.
    pub fn to_json(&self) -> Json {
        self.to_json_with(&CodecOptions::default())
    }

    pub fn to_json_with(&self, opts: &CodecOptions) -> Json {
        let mut out = Map::new();
        if !self.assign.is_empty() {
            let mut assign = Map::new();
            for (key, entry) in &self.assign {
                let encoded = match entry {
                    Assigned::Value(value) => value.to_json(),
                    Assigned::Patched { patch, .. } => patch.to_json_with(opts),
                };
                assign.insert(key.to_name(), encoded);
            }
            out.insert(opts.assign_key.clone(), Json::Object(assign));
        }
        if !self.delete.is_empty() {
            let delete = self.delete.iter().map(key_to_json).collect();
            out.insert(opts.delete_key.clone(), Json::Array(delete));
        }
        for (key, nested) in &self.nested {
            out.insert(key.to_name(), nested.to_json_with(opts));
        }
        Json::Object(out)
    }
}

fn key_to_json(key: &Key) -> Json {
    match key {
        Key::Name(name) => Json::String(name.clone()),
        Key::Index(i) => Json::Number((*i as u64).into()),
    }
}
