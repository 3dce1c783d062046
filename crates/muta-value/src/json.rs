//! Conversion to and from [`serde_json::Value`].
//!
//! # Round-Trip Warning
//!
//! Blobs encode as arrays of byte numbers and callables encode as `null`,
//! so `Value -> JSON -> Value` does not preserve those variants.

use serde_json::{Map, Number};

use crate::value::{Scalar, Value};

impl Value {
    /// Builds a fresh value tree from JSON.
    ///
    /// Integral numbers that fit `i64` become [`Scalar::Int`], everything
    /// else becomes [`Scalar::Float`].
    pub fn from_json(json: serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::null(),
            serde_json::Value::Bool(b) => Value::from(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::from(i)
                } else {
                    Value::from(n.as_f64().unwrap_or(0.0))
                }
            }
            serde_json::Value::String(s) => Value::from(s),
            serde_json::Value::Array(arr) => Value::list(arr.into_iter().map(Value::from_json)),
            serde_json::Value::Object(obj) => {
                Value::map(obj.into_iter().map(|(k, v)| (k, Value::from_json(v))))
            }
        }
    }

    /// Renders the value as JSON.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Scalar(s) => scalar_to_json(s),
            Value::Opaque(bytes) => serde_json::Value::Array(
                bytes.iter().map(|b| serde_json::Value::Number((*b).into())).collect(),
            ),
            Value::Mapping(map) => {
                let mut out = Map::new();
                for (key, val) in map.borrow().iter() {
                    out.insert(key.clone(), val.to_json());
                }
                serde_json::Value::Object(out)
            }
            Value::Sequence(list) => {
                serde_json::Value::Array(list.borrow().iter().map(Value::to_json).collect())
            }
            Value::Callable(_) => serde_json::Value::Null,
        }
    }
}

fn scalar_to_json(s: &Scalar) -> serde_json::Value {
    match s {
        Scalar::Null => serde_json::Value::Null,
        Scalar::Bool(b) => serde_json::Value::Bool(*b),
        Scalar::Int(i) => serde_json::Value::Number((*i).into()),
        Scalar::Float(f) => Number::from_f64(*f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Scalar::Str(s) => serde_json::Value::String(s.clone()),
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        Value::from_json(json)
    }
}

impl From<&Value> for serde_json::Value {
    fn from(v: &Value) -> Self {
        v.to_json()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callable::Callable;
    use serde_json::json;

    #[test]
    fn json_round_trip() {
        let doc = json!({"a": [1, 2.5, "x", null, true], "b": {"c": {}}});
        let value = Value::from_json(doc.clone());
        assert_eq!(value.to_json(), doc);
    }

    #[test]
    fn integers_stay_integers() {
        let value = Value::from_json(json!(124));
        assert_eq!(value.as_scalar(), Some(&Scalar::Int(124)));
        assert_eq!(value.to_json(), json!(124));
    }

    #[test]
    fn blob_encodes_as_byte_array() {
        assert_eq!(Value::bytes(vec![1, 2, 3]).to_json(), json!([1, 2, 3]));
    }

    #[test]
    fn callable_encodes_as_null() {
        let f = Value::callable(Callable::new("f", |_| Value::null()).with_prop("x", 1));
        assert_eq!(f.to_json(), json!(null));
    }

    #[test]
    fn non_finite_float_encodes_as_null() {
        assert_eq!(Value::from(f64::NAN).to_json(), json!(null));
    }
}
