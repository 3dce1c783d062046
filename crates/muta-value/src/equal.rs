use std::rc::Rc;

use crate::value::Value;

/// Performs a deep equality check between two values.
///
/// Scalars compare by value, blobs by content, mappings key-by-key
/// (regardless of entry order) and sequences element-by-element. Callables
/// have no structural notion of equality and compare by identity.
///
/// # Examples
///
/// ```
/// use muta_value::{deep_equal, Value};
///
/// let a = Value::map([("foo", Value::list([1, 2, 3]))]);
/// let b = Value::map([("foo", Value::list([1, 2, 3]))]);
/// let c = Value::map([("foo", Value::list([1, 2, 4]))]);
///
/// assert!(deep_equal(&a, &b));
/// assert!(!deep_equal(&a, &c));
/// ```
pub fn deep_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Scalar(a), Value::Scalar(b)) => a == b,
        (Value::Opaque(a), Value::Opaque(b)) => a == b,
        (Value::Callable(a), Value::Callable(b)) => Rc::ptr_eq(a, b),

        (Value::Sequence(arr_a), Value::Sequence(arr_b)) => {
            if Rc::ptr_eq(arr_a, arr_b) {
                return true;
            }
            let arr_a = arr_a.borrow();
            let arr_b = arr_b.borrow();
            if arr_a.len() != arr_b.len() {
                return false;
            }
            arr_a.iter().zip(arr_b.iter()).all(|(x, y)| deep_equal(x, y))
        }

        (Value::Mapping(obj_a), Value::Mapping(obj_b)) => {
            if Rc::ptr_eq(obj_a, obj_b) {
                return true;
            }
            let obj_a = obj_a.borrow();
            let obj_b = obj_b.borrow();
            if obj_a.len() != obj_b.len() {
                return false;
            }
            for (key, val_a) in obj_a.iter() {
                match obj_b.get(key) {
                    Some(val_b) => {
                        if !deep_equal(val_a, val_b) {
                            return false;
                        }
                    }
                    None => return false,
                }
            }
            true
        }

        // Different types are never equal
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callable::Callable;

    #[test]
    fn scalars() {
        assert!(deep_equal(&Value::null(), &Value::null()));
        assert!(deep_equal(&Value::from(2), &Value::from(2.0)));
        assert!(!deep_equal(&Value::from(true), &Value::from(1)));
        assert!(!deep_equal(&Value::from("a"), &Value::from("b")));
    }

    #[test]
    fn mapping_order_does_not_matter() {
        let a = Value::map([("x", 1), ("y", 2)]);
        let b = Value::map([("y", 2), ("x", 1)]);
        assert!(deep_equal(&a, &b));
    }

    #[test]
    fn sequence_order_matters() {
        assert!(!deep_equal(&Value::list([1, 2]), &Value::list([2, 1])));
        assert!(!deep_equal(&Value::list([1]), &Value::list([1, 1])));
    }

    #[test]
    fn blobs_by_content() {
        assert!(deep_equal(&Value::bytes(vec![1, 2]), &Value::bytes(vec![1, 2])));
        assert!(!deep_equal(&Value::bytes(vec![1, 2]), &Value::list([1, 2])));
    }

    #[test]
    fn callables_by_identity() {
        let f = Value::callable(Callable::new("f", |_| Value::null()));
        let g = Value::callable(Callable::new("f", |_| Value::null()));
        assert!(deep_equal(&f, &f.clone()));
        assert!(!deep_equal(&f, &g));
    }
}
