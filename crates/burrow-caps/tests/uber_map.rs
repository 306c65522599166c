use burrow::{Container, Error, Key, Value, PATHED, VIRAL};
use burrow_caps::{
    prototype_match, recursive_dup, recursive_merge_in_place, recursive_sort, uber_from_json, uber_map, INDIFFERENT,
    UBER_MAP,
};
use serde_json::json;

fn child(value: Value) -> Container {
    value.into_container().expect("container")
}

#[test]
fn starts_empty() {
    let map = uber_map().unwrap();
    assert!(map.is_empty());
    assert_eq!(map.container_type().name(), UBER_MAP);
    for capability in [VIRAL, INDIFFERENT, PATHED] {
        assert!(map.has_capability(capability), "{capability}");
    }
    assert!(uber_from_json(&json!(null)).unwrap().is_empty());
}

#[test]
fn rejects_non_objects() {
    assert!(matches!(uber_from_json(&json!([1, 2])), Err(Error::InvalidArgument(_))));
    assert!(matches!(uber_from_json(&json!("text")), Err(Error::InvalidArgument(_))));
}

#[test]
fn merges_recursively() {
    let map = uber_from_json(&json!({"foo": [1]})).unwrap();
    recursive_merge_in_place(&map, &Container::from_json(&json!({"foo": [2]})).unwrap(), true).unwrap();
    assert_eq!(child(map.get(Key::sym("foo")).unwrap()).len(), 2);
}

#[test]
fn reads_paths() {
    let map = uber_from_json(&json!({"foo": {"bar": 42}})).unwrap();
    assert_eq!(map.get("foo.bar").unwrap(), Value::Int(42));
    map.store("foo.baz.quux", "deep").unwrap();
    assert_eq!(map.to_json(), json!({"foo": {"bar": 42, "baz": {"quux": "deep"}}}));
}

#[test]
fn reads_indifferently() {
    let map = uber_from_json(&json!({"foo": 42})).unwrap();
    assert_eq!(map.get(Key::sym("foo")).unwrap(), Value::Int(42));

    let map = uber_map().unwrap();
    map.store(Key::sym("foo"), 42).unwrap();
    assert_eq!(map.get("foo").unwrap(), Value::Int(42));
}

#[test]
fn nested_mappings_share_the_type() {
    let map = uber_from_json(&json!({"some": {"nested": true}})).unwrap();
    let some = child(map.get(Key::sym("some")).unwrap());
    assert_eq!(some.container_type(), map.container_type());
    assert_eq!(some.path_prefix(), ".some");
    assert_eq!(some.get(Key::sym("nested")).unwrap(), Value::Bool(true));
}

#[test]
fn copies_keep_the_type() {
    let map = uber_from_json(&json!({"b": 1, "a": {"d": 1, "c": 2}})).unwrap();
    let copy = recursive_dup(&map).unwrap();
    assert_eq!(copy.container_type(), map.container_type());

    let sorted = recursive_sort(&map).unwrap();
    assert_eq!(sorted.keys(), vec![Key::from("a"), Key::from("b")]);
    assert_eq!(child(sorted.get("a").unwrap()).keys(), vec![Key::from("c"), Key::from("d")]);
}

#[test]
fn matches_prototypes() {
    let map = uber_from_json(&json!({"a": 1, "b": {"c": 2}})).unwrap();
    let proto = Container::from_json(&json!({"b": {"c": null}})).unwrap();
    assert!(prototype_match(&map, &proto, false).unwrap());
}

#[test]
fn separate_maps_have_separate_types() {
    let one = uber_map().unwrap();
    let two = uber_map().unwrap();
    assert_ne!(one.container_type(), two.container_type());
}
