use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use burrow::{Container, Key, PathedAccess, Value};
use burrow_caps::environment::candidate_names;
use burrow_caps::EnvironmentOverride;
use serde_json::json;

type Vars = Rc<RefCell<HashMap<String, String>>>;

fn vars(pairs: &[(&str, &str)]) -> Vars {
    let map = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Rc::new(RefCell::new(map))
}

fn overriding(vars: &Vars) -> Rc<EnvironmentOverride> {
    let vars = vars.clone();
    Rc::new(EnvironmentOverride::with_source(move |name| {
        vars.borrow().get(name).cloned()
    }))
}

fn tester(vars: &Vars, pathed: bool) -> Container {
    let doc = json!({
        "foo": {"bar": 42},
        "baz": [{"quux": 123}],
        "plain": "value"
    });
    let root = Container::from_json(&doc).unwrap();
    if pathed {
        root.activate(Rc::new(PathedAccess)).unwrap();
    }
    root.activate(overriding(vars)).unwrap();
    root
}

fn child(value: Value) -> Container {
    value.into_container().expect("container")
}

#[test]
fn plain_reads_without_variables() {
    let env = vars(&[]);
    let root = tester(&env, false);
    assert_eq!(root.get("plain").unwrap(), Value::from("value"));
    let foo = child(root.get("foo").unwrap());
    assert_eq!(foo.get("bar").unwrap(), Value::Int(42));
}

#[test]
fn variable_overrides_top_level_key() {
    let env = vars(&[("PLAIN", "override")]);
    let root = tester(&env, false);
    assert_eq!(root.get("plain").unwrap(), Value::from("override"));
    assert_eq!(root.get_stored(&Key::from("plain")), Some(Value::from("value")));
}

#[test]
fn nested_containers_inherit_the_override() {
    let env = vars(&[("BAR", "from env")]);
    let root = tester(&env, false);
    let foo = child(root.get("foo").unwrap());
    assert_eq!(foo.get("bar").unwrap(), Value::from("from env"));
}

#[test]
fn qualified_names_win_with_paths() {
    let env = vars(&[("FOO_BAR", "qualified"), ("BAR", "short")]);
    let root = tester(&env, true);
    let foo = child(root.get("foo").unwrap());
    assert_eq!(foo.get("bar").unwrap(), Value::from("qualified"));
    assert_eq!(root.get("foo.bar").unwrap(), Value::from("qualified"));

    env.borrow_mut().remove("FOO_BAR");
    assert_eq!(foo.get("bar").unwrap(), Value::from("short"));
}

#[test]
fn unsetting_restores_stored_value() {
    let env = vars(&[("PLAIN", "override")]);
    let root = tester(&env, false);
    assert_eq!(root.get("plain").unwrap(), Value::from("override"));

    env.borrow_mut().clear();
    assert_eq!(root.get("plain").unwrap(), Value::from("value"));
}

#[test]
fn fetch_and_contains_key_see_overrides() {
    let env = vars(&[("MISSING", "present")]);
    let root = tester(&env, false);
    assert_eq!(root.fetch("missing", 1234).unwrap(), Value::from("present"));
    assert!(root.contains_key("missing").unwrap());
    assert!(!root.contains_key("absent").unwrap());
    assert_eq!(root.fetch("absent", 1234).unwrap(), Value::Int(1234));
    assert!(!root.has_stored_key(&Key::from("missing")));
}

#[test]
fn json_contents_are_parsed() {
    let env = vars(&[("PLAIN", r#"{"json_key": "json_value"}"#), ("NUMBER", "17")]);
    let root = tester(&env, false);

    let parsed = child(root.get("plain").unwrap());
    assert!(parsed.is_mapping());
    assert_eq!(parsed.get("json_key").unwrap(), Value::from("json_value"));
    assert_eq!(root.get("number").unwrap(), Value::Int(17));
}

#[test]
fn sequence_elements_are_addressed_by_index() {
    let env = vars(&[("BAZ_0_QUUX", "override")]);
    let root = tester(&env, true);
    let baz = child(root.get("baz").unwrap());
    let first = child(baz.get(0).unwrap());
    assert_eq!(first.path_prefix(), ".baz.0");
    assert_eq!(first.get("quux").unwrap(), Value::from("override"));
    assert_eq!(root.get("baz.0.quux").unwrap(), Value::from("override"));
}

#[test]
fn equal_variable_is_not_an_override() {
    let env = vars(&[("PLAIN", "\"value\"")]);
    let root = tester(&env, false);
    assert_eq!(root.get("plain").unwrap(), Value::from("value"));
}

#[test]
fn null_variable_keeps_stored_value() {
    let env = vars(&[("PLAIN", "null")]);
    let root = tester(&env, false);
    assert_eq!(root.get("plain").unwrap(), Value::from("value"));
    assert!(!root.contains_key("missing").unwrap());

    env.borrow_mut().insert("MISSING".to_string(), "null".to_string());
    assert_eq!(root.get("missing").unwrap(), Value::Null);
    assert!(!root.contains_key("missing").unwrap());
}

#[test]
fn candidate_names_collapse_overlap_with_prefix() {
    let env = vars(&[]);
    let root = tester(&env, true);
    let foo = child(root.get("foo").unwrap());
    assert_eq!(candidate_names(&foo, &Key::from("bar")), vec!["FOO_BAR", "BAR"]);
    assert_eq!(candidate_names(&foo, &Key::from("foo.bar")), vec!["FOO_BAR", "BAR"]);
    assert_eq!(candidate_names(&root, &Key::from("foo.bar")), vec!["FOO_BAR", "BAR"]);
}
