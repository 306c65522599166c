use std::rc::Rc;

use burrow::{Container, Key, PathedAccess, Value, VIRAL};
use burrow_caps::{
    recursive_dup, recursive_sort, recursive_sort_by, recursive_sort_in_place, IndifferentAccess,
};
use serde_json::json;

fn keys(names: &[&str]) -> Vec<Key> {
    names.iter().map(|n| Key::from(*n)).collect()
}

fn nested(container: &Container, key: &str) -> Container {
    container
        .get_stored(&Key::from(key))
        .and_then(Value::into_container)
        .expect("nested container")
}

fn unsorted() -> Container {
    Container::from_json(&json!({
        "a": 1,
        "c": {"d": 4, "f": 6, "e": 5},
        "b": 2
    }))
    .unwrap()
}

#[test]
fn sorts_nested_mappings_in_place() {
    let map = unsorted();
    recursive_sort_in_place(&map);
    assert_eq!(map.keys(), keys(&["a", "b", "c"]));
    assert_eq!(nested(&map, "c").keys(), keys(&["d", "e", "f"]));
}

#[test]
fn sorted_copy_leaves_original_alone() {
    let map = unsorted();
    let sorted = recursive_sort(&map).unwrap();

    assert_eq!(map.keys(), keys(&["a", "c", "b"]));
    assert_eq!(nested(&map, "c").keys(), keys(&["d", "f", "e"]));
    assert_eq!(sorted.keys(), keys(&["a", "b", "c"]));
    assert_eq!(nested(&sorted, "c").keys(), keys(&["d", "e", "f"]));
    assert!(!nested(&map, "c").ptr_eq(&nested(&sorted, "c")));
}

#[test]
fn custom_order() {
    let map = unsorted();
    let sorted = recursive_sort_by(&map, &|a: &Key, b: &Key| b.cmp(a)).unwrap();
    assert_eq!(sorted.keys(), keys(&["c", "b", "a"]));
    assert_eq!(nested(&sorted, "c").keys(), keys(&["f", "e", "d"]));
}

#[test]
fn mappings_inside_sequences_are_left_alone() {
    let map = Container::from_json(&json!({"list": [{"b": 1, "a": 2}]})).unwrap();
    recursive_sort_in_place(&map);
    let list = nested(&map, "list");
    let item = list.get_stored(&Key::Int(0)).and_then(Value::into_container).unwrap();
    assert_eq!(item.keys(), keys(&["b", "a"]));
}

#[test]
fn sorting_with_coexisting_key_forms() {
    let map = Container::mapping();
    map.store("foo", 42).unwrap();
    map.store("bar", 123).unwrap();
    map.store(Key::sym("foo"), "foo from symbol").unwrap();
    map.store(Key::sym("bar"), "bar from symbol").unwrap();
    map.activate(Rc::new(IndifferentAccess::new())).unwrap();

    recursive_sort_in_place(&map);
    assert_eq!(
        map.keys(),
        vec![Key::sym("bar"), Key::sym("foo"), Key::from("bar"), Key::from("foo")]
    );
}

#[test]
fn dup_copies_every_level() {
    let map = Container::mapping();
    map.store("a", 1).unwrap();
    map.store(Key::sym("c"), Container::from_json(&json!({"d": 4, "f": 6})).unwrap()).unwrap();
    map.store("b", 2).unwrap();

    let copy = recursive_dup(&map).unwrap();
    assert!(!copy.ptr_eq(&map));
    let (original_c, copied_c) = (
        map.get_stored(&Key::sym("c")).and_then(Value::into_container).unwrap(),
        copy.get_stored(&Key::sym("c")).and_then(Value::into_container).unwrap(),
    );
    assert!(!original_c.ptr_eq(&copied_c));
    assert_eq!(copy, map);
}

#[test]
fn dup_keeps_metadata() {
    let map = Container::from_json(&json!({"a": {"b": 1}})).unwrap();
    map.set_separator("/");
    map.activate(Rc::new(PathedAccess)).unwrap();
    let a = map.get("a").unwrap().into_container().unwrap();

    let copy = recursive_dup(&a).unwrap();
    assert!(copy.has_capability(VIRAL));
    assert_eq!(copy.separator(), "/");
    assert_eq!(copy.path_prefix(), "/a");
    assert_eq!(copy.get("b").unwrap(), Value::Int(1));

    copy.store("b", 2).unwrap();
    assert_eq!(a.get("b").unwrap(), Value::Int(1));
}
