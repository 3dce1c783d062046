use muta::{commit, get_patch, wrap, Key, Patch, Value, MAX_SEQUENCE_INDEX};
use serde_json::json;

#[test]
fn pop_trims_and_commit_truncates() {
    let original = Value::from_json(json!([1, 2, 3]));
    let w = wrap(original.clone()).expect("sequence must wrap");
    assert_eq!(w.pop().and_then(|p| p.as_leaf().cloned()), Some(Value::from(3)));
    assert_eq!(w.len(), 2);
    assert_eq!(get_patch(&w).expect("live view"), Patch::new().with_delete(2usize));
    assert_eq!(get_patch(&w).expect("live view").to_json(), json!({"@delete": [2]}));

    commit(&w).expect("commit must succeed");
    assert_eq!(original.to_json(), json!([1, 2]));
}

#[test]
fn interior_deletes_are_holes() {
    let original = Value::from_json(json!(["a", "b", "c"]));
    let w = wrap(original.clone()).expect("sequence must wrap");
    w.delete(1usize);
    assert_eq!(w.len(), 3);
    assert!(!w.has(1usize));
    assert_eq!(w.keys(), vec![Key::Index(0), Key::Index(2)]);
    assert_eq!(w.materialize().expect("live view").to_json(), json!(["a", null, "c"]));

    commit(&w).expect("commit must succeed");
    assert_eq!(original.to_json(), json!(["a", null, "c"]));
}

#[test]
fn writes_past_the_end_pad_with_null() {
    let original = Value::from_json(json!([0]));
    let w = wrap(original.clone()).expect("sequence must wrap");
    w.set(3usize, 3);
    assert_eq!(w.len(), 4);
    assert_eq!(w.get(1usize), None);

    commit(&w).expect("commit must succeed");
    assert_eq!(original.to_json(), json!([0, null, null, 3]));
}

#[test]
fn numeric_names_address_elements() {
    let w = wrap(Value::from_json(json!([{"x": 1}]))).expect("sequence must wrap");
    let by_name = w.get_view("0").expect("element view");
    let by_index = w.get_view(0usize).expect("element view");
    assert_eq!(by_name, by_index);

    by_index.set("x", 2);
    assert_eq!(
        get_patch(&w).expect("live view"),
        Patch::new().with_nested(0usize, Patch::new().with_assign("x", 2))
    );
    assert_eq!(
        get_patch(&w).expect("live view").to_json(),
        json!({"0": {"@assign": {"x": 2}}})
    );
}

#[test]
fn push_then_pop_leaves_no_record() {
    let w = wrap(Value::from_json(json!([1]))).expect("sequence must wrap");
    w.push(2);
    w.pop();
    assert!(!w.was_mutated());
    assert_eq!(w.len(), 1);
}

#[test]
fn indices_past_the_growth_limit_are_refused() {
    let original = Value::from_json(json!([1, 2]));
    let w = wrap(original.clone()).expect("sequence must wrap");

    assert!(!w.set(Key::Index(usize::MAX), 9));
    assert!(!w.set("18446744073709551614", 9));
    assert!(!w.set(MAX_SEQUENCE_INDEX + 1, 9));
    assert!(!w.was_mutated());
    assert_eq!(w.len(), 2);
    assert_eq!(w.get(Key::Index(usize::MAX)), None);

    assert!(w.push(3));
    assert_eq!(w.pop().and_then(|p| p.as_leaf().cloned()), Some(Value::from(3)));
    assert_eq!(w.materialize().expect("live view").to_json(), json!([1, 2]));

    commit(&w).expect("commit must succeed");
    assert_eq!(original.to_json(), json!([1, 2]));
}

#[test]
fn deleting_a_huge_index_is_a_no_op() {
    let w = wrap(Value::from_json(json!([1]))).expect("sequence must wrap");
    assert!(w.delete(Key::Index(usize::MAX)));
    assert!(!w.was_mutated());
    assert_eq!(w.len(), 1);
}

#[test]
fn deleting_every_trailing_element_shortens_the_view() {
    let original = Value::from_json(json!([1, 2, 3, 4]));
    let w = wrap(original.clone()).expect("sequence must wrap");
    w.delete(1usize);
    w.delete(3usize);
    assert_eq!(w.len(), 3);
    w.delete(2usize);
    assert_eq!(w.len(), 1);

    commit(&w).expect("commit must succeed");
    assert_eq!(original.to_json(), json!([1]));
}
