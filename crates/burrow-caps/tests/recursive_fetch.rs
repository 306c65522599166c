use std::rc::Rc;

use burrow::{Container, Key, Value, Viral};
use burrow_caps::{recursive_fetch_all, recursive_fetch_all_with, recursive_fetch_one, recursive_fetch_one_with};
use serde_json::json;

fn tester() -> Container {
    Container::from_json(&json!({
        "foo": 42,
        "bar": 123,
        "baz": {"foo": 321, "unique": "something"}
    }))
    .unwrap()
}

#[test]
fn fetch_one_returns_first_match() {
    let map = tester();
    assert_eq!(recursive_fetch_one(&map, "foo", Value::Null).unwrap(), Value::Int(42));
    assert_eq!(recursive_fetch_one(&map, "unique", Value::Null).unwrap(), Value::from("something"));
}

#[test]
fn fetch_all_collects_every_match() {
    let map = tester();
    assert_eq!(recursive_fetch_all(&map, "foo").unwrap(), vec![Value::Int(42), Value::Int(321)]);
}

#[test]
fn misses_use_the_default() {
    let map = tester();
    assert_eq!(recursive_fetch_one(&map, "does not exist", Value::Null).unwrap(), Value::Null);
    assert_eq!(recursive_fetch_one(&map, "does not exist", 42).unwrap(), Value::Int(42));
    assert!(recursive_fetch_all(&map, "does not exist").unwrap().is_empty());
}

#[test]
fn value_equal_to_default_is_skipped() {
    let map = tester();
    assert_eq!(recursive_fetch_one(&map, "foo", 42).unwrap(), Value::Int(321));
}

#[test]
fn fetch_one_calls_back_once() {
    let map = tester();
    let mut called = 0;
    let found = recursive_fetch_one_with(&map, "foo", Value::Null, |parent, value| {
        assert_eq!(parent.get_stored(&Key::from("foo")), Some(Value::Int(42)));
        assert_eq!(value, Value::Int(42));
        called += 1;
        value
    })
    .unwrap();
    assert_eq!(called, 1);
    assert_eq!(found, Value::Int(42));
}

#[test]
fn fetch_all_calls_back_per_match() {
    let map = tester();
    let mut called = 0;
    recursive_fetch_all_with(&map, "foo", |parent, value| {
        assert!(parent.get_stored(&Key::from("foo")).and_then(|v| v.as_i64()).is_some());
        assert!(value.as_i64().is_some());
        called += 1;
        value
    })
    .unwrap();
    assert_eq!(called, 2);
}

#[test]
fn callback_can_replace_the_value() {
    let map = tester();
    let found = recursive_fetch_one_with(&map, "foo", Value::Null, |_, _| Value::from("new value")).unwrap();
    assert_eq!(found, Value::from("new value"));
}

#[test]
fn viral_containers_hand_out_enhanced_parents() {
    let map = tester();
    map.activate(Rc::new(Viral)).unwrap();
    let mut prefixes = Vec::new();
    recursive_fetch_all_with(&map, "foo", |parent, value| {
        prefixes.push(parent.path_prefix());
        value
    })
    .unwrap();
    assert_eq!(prefixes, vec![".".to_string(), ".baz".to_string()]);
}
