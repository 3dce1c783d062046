use muta::{get_patch, wrap, Assigned, Key, Patch, Value, View};
use serde_json::{json, Value as Json};

fn patch_json(view: &View) -> Json {
    get_patch(view).expect("live view").to_json()
}

fn int(view: &View, key: &str) -> i64 {
    view.get_value(key)
        .and_then(|v| v.as_i64())
        .expect("key must hold an int")
}

#[test]
fn patch_snapshot_sequence() {
    let target = Value::from_json(json!({
        "bar": {"baz": 123},
        "xyz": {"abc": true},
        "y": 5
    }));
    let original_bar = target.lookup(&Key::from("bar")).expect("bar");
    let w = wrap(target.clone()).expect("mapping must wrap");

    // edits through an original child land under its key
    let bar = w.get_view("bar").expect("bar view");
    bar.set("baz", int(&bar, "baz") + 1);
    assert_eq!(patch_json(&w), json!({"bar": {"@assign": {"baz": 124}}}));

    // replacing the child drops its edits
    w.set("bar", Value::map([("x", 5)]));
    w.set("a", 1);
    assert_eq!(patch_json(&w), json!({"@assign": {"bar": {"x": 5}, "a": 1}}));

    // edits inside an assigned value are reported with the assignment
    w.get_view("bar").expect("bar view").delete("x");
    assert_eq!(
        patch_json(&w),
        json!({"@assign": {"bar": {"@delete": ["x"]}, "a": 1}})
    );

    // deleting an original key
    let xyz = w.get_view("xyz").expect("xyz view");
    xyz.delete("abc");
    assert_eq!(
        patch_json(&w),
        json!({"@assign": {"bar": {"@delete": ["x"]}, "a": 1}, "xyz": {"@delete": ["abc"]}})
    );

    // assigning over a deletion replaces it
    xyz.set("abc", 123);
    assert_eq!(
        patch_json(&w),
        json!({"@assign": {"bar": {"@delete": ["x"]}, "a": 1}, "xyz": {"@assign": {"abc": 123}}})
    );
    xyz.set("abc", 5);
    assert_eq!(
        patch_json(&w),
        json!({"@assign": {"bar": {"@delete": ["x"]}, "a": 1}, "xyz": {"@assign": {"abc": 5}}})
    );

    // deleting a key that only existed through assignment leaves no trace
    w.set("x", 5);
    w.delete("x");
    w.delete("a");
    assert_eq!(
        patch_json(&w),
        json!({"@assign": {"bar": {"@delete": ["x"]}}, "xyz": {"@assign": {"abc": 5}}})
    );

    // assigning the original value back collapses the entry
    w.set("y", int(&w, "y") + 1);
    w.set("y", int(&w, "y") - 1);
    assert_eq!(
        patch_json(&w),
        json!({"@assign": {"bar": {"@delete": ["x"]}}, "xyz": {"@assign": {"abc": 5}}})
    );

    // restoring the assigned value's key makes it clean again
    w.get_view("bar").expect("bar view").set("x", 5);
    assert_eq!(
        patch_json(&w),
        json!({"@assign": {"bar": {"x": 5}}, "xyz": {"@assign": {"abc": 5}}})
    );

    // delete then re-add an original value
    w.delete("y");
    w.set("y", 5);
    assert_eq!(
        patch_json(&w),
        json!({"@assign": {"bar": {"x": 5}}, "xyz": {"@assign": {"abc": 5}}})
    );

    // assigning the original reference back
    w.set("bar", original_bar.clone());
    assert_eq!(patch_json(&w), json!({"xyz": {"@assign": {"abc": 5}}}));

    // ...but edits made through it first are kept
    let bar = w.get_view("bar").expect("bar view");
    bar.set("baz", int(&bar, "baz") + 1);
    w.set("bar", original_bar.clone());
    assert_eq!(
        patch_json(&w),
        json!({"xyz": {"@assign": {"abc": 5}}, "@assign": {"bar": {"@assign": {"baz": 124}}}})
    );
    let patch = get_patch(&w).expect("live view");
    match &patch.assign[&Key::from("bar")] {
        Assigned::Patched { base, patch } => {
            assert!(base.same(&original_bar));
            assert_eq!(patch, &Patch::new().with_assign("baz", 124));
        }
        other => panic!("expected a patched entry, got {other:?}"),
    }
    assert_eq!(w.get_view("bar"), Some(bar.clone()));
    assert_eq!(bar.get_value("baz"), Some(Value::from(124)));

    assert_eq!(
        target.to_json(),
        json!({"bar": {"baz": 123}, "xyz": {"abc": true}, "y": 5})
    );
}

#[test]
fn committing_a_reassigned_original_copies_it() {
    let target = Value::from_json(json!({"bar": {"baz": 123, "deep": {"q": 1}}}));
    let original_bar = target.lookup(&Key::from("bar")).expect("bar");
    let w = wrap(target.clone()).expect("mapping must wrap");

    let bar = w.get_view("bar").expect("bar view");
    bar.set("baz", 124);
    bar.get_view("deep").expect("deep view").set("q", 2);
    w.set("bar", original_bar.clone());
    muta::commit(&w).expect("commit must succeed");

    let committed = target.lookup(&Key::from("bar")).expect("bar");
    assert!(!committed.same(&original_bar));
    assert_eq!(committed.to_json(), json!({"baz": 124, "deep": {"q": 2}}));
    assert_eq!(original_bar.to_json(), json!({"baz": 123, "deep": {"q": 1}}));
}
