mod common;

use common::Recorder;
use rxflow::object::diff_values;
use rxflow::{ArrayStream, ChangeKind, IndexChange, ObjectStream, PathChange, RxError};
use serde_json::{json, Value};

#[test]
fn test_object_stream_requires_an_object() {
    assert!(matches!(
        ObjectStream::new(json!([1, 2])),
        Err(RxError::InvalidConfig(_))
    ));
    let object = ObjectStream::new(json!({})).unwrap();
    assert!(object.set(json!("text")).is_err());
}

#[test]
fn test_object_initial_value_is_readable() {
    let object = ObjectStream::new(json!({"a": 1})).unwrap();
    assert_eq!(object.last(), json!({"a": 1}));
    assert_eq!(object.stream().last(), Some(json!({"a": 1})));
}

#[test]
fn test_update_merges_and_reports_changed_paths() {
    let object = ObjectStream::new(json!({"user": {"name": "ada", "age": 36}})).unwrap();
    let diffs = Recorder::attach(&object.on_diff());
    let values = Recorder::attach(&object.stream());

    object.update(json!({"user": {"age": 37}, "active": true})).unwrap();

    assert_eq!(
        object.last(),
        json!({"user": {"name": "ada", "age": 37}, "active": true})
    );
    assert_eq!(values.values(), vec![object.last()]);
    assert_eq!(
        diffs.values(),
        vec![vec![
            PathChange {
                path: "user.age".to_string(),
                previous: Some(json!(36)),
                value: Some(json!(37)),
                kind: ChangeKind::Changed,
            },
            PathChange {
                path: "active".to_string(),
                previous: None,
                value: Some(json!(true)),
                kind: ChangeKind::Added,
            },
        ]]
    );
}

#[test]
fn test_unchanged_write_emits_nothing() {
    let object = ObjectStream::new(json!({"a": 1})).unwrap();
    let diffs = Recorder::attach(&object.on_diff());
    let values = Recorder::attach(&object.stream());

    object.update(json!({"a": 1})).unwrap();
    object.set(json!({"a": 1})).unwrap();

    assert!(diffs.values().is_empty());
    assert!(values.values().is_empty());
}

#[test]
fn test_on_field_emits_only_for_touched_paths() {
    let object = ObjectStream::new(json!({"pos": {"x": 0, "y": 0}, "name": "p"})).unwrap();
    let xs = Recorder::attach(&object.on_field("pos.x"));
    let positions = Recorder::attach(&object.on_field("pos"));

    object.update_field("name", json!("q")).unwrap();
    object.update_field("pos.x", json!(4)).unwrap();
    object.update_field("pos.y", json!(2)).unwrap();

    assert_eq!(xs.values(), vec![json!(4)]);
    assert_eq!(
        positions.values(),
        vec![json!({"x": 4, "y": 0}), json!({"x": 4, "y": 2})]
    );
}

#[test]
fn test_removed_field_is_emitted_as_null() {
    let object = ObjectStream::new(json!({"a": 1, "b": 2})).unwrap();
    let bs = Recorder::attach(&object.on_field("b"));

    object.set(json!({"a": 1})).unwrap();

    assert_eq!(bs.values(), vec![Value::Null]);
}

#[test]
fn test_update_field_creates_intermediate_objects() {
    let object = ObjectStream::new(json!({})).unwrap();
    object.update_field("settings.theme.color", json!("blue")).unwrap();
    assert_eq!(object.last(), json!({"settings": {"theme": {"color": "blue"}}}));

    object.update_field("flag", json!(1)).unwrap();
    let err = object.update_field("flag.inner", json!(2)).unwrap_err();
    assert!(matches!(err, RxError::InvalidConfig(_)));
}

#[test]
fn test_disposed_object_rejects_writes() {
    let object = ObjectStream::new(json!({})).unwrap();
    let values = Recorder::attach(&object.stream());
    object.dispose("closed");

    assert!(matches!(
        object.update(json!({"a": 1})),
        Err(RxError::Disposed { .. })
    ));
    assert_eq!(values.done_context().as_deref(), Some("closed"));
}

#[test]
fn test_diff_values_treats_arrays_as_leaves() {
    let mut changes = Vec::new();
    diff_values(&json!({"list": [1, 2]}), &json!({"list": [1, 3]}), "", &mut changes);

    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].path, "list");
    assert_eq!(changes[0].kind, ChangeKind::Changed);
}

#[test]
fn test_array_stream_positional_changes() {
    let list = ArrayStream::new(vec!["a", "b"]);
    let diffs = Recorder::attach(&list.on_diff());
    let values = Recorder::attach(&list.stream());

    list.push("c").unwrap();
    list.set_at(0, "z").unwrap();

    assert_eq!(list.last(), vec!["z", "b", "c"]);
    assert_eq!(values.values(), vec![vec!["a", "b", "c"], vec!["z", "b", "c"]]);
    assert_eq!(
        diffs.values(),
        vec![
            vec![IndexChange {
                index: 2,
                previous: None,
                value: Some("c"),
                kind: ChangeKind::Added,
            }],
            vec![IndexChange {
                index: 0,
                previous: Some("a"),
                value: Some("z"),
                kind: ChangeKind::Changed,
            }],
        ]
    );
}

#[test]
fn test_array_delete_shifts_following_items() {
    let list = ArrayStream::new(vec![1, 2, 3]);
    let diffs = Recorder::attach(&list.on_diff());

    list.delete_at(0).unwrap();

    assert_eq!(list.last(), vec![2, 3]);
    let kinds: Vec<ChangeKind> = diffs.values()[0].iter().map(|change| change.kind).collect();
    assert_eq!(
        kinds,
        vec![ChangeKind::Changed, ChangeKind::Changed, ChangeKind::Removed]
    );
}

#[test]
fn test_array_out_of_range_writes_fail() {
    let list = ArrayStream::new(vec![1]);
    assert_eq!(
        list.set_at(3, 9),
        Err(RxError::IndexOutOfRange { index: 3, len: 1 })
    );
    assert_eq!(
        list.delete_at(1),
        Err(RxError::IndexOutOfRange { index: 1, len: 1 })
    );
    assert_eq!(list.last(), vec![1]);
}
