//! Recursive merging.
//!
//! Mappings merge key by key, sequences concatenate, and for anything else
//! the incoming value wins only when `overwrite` is set. A `Null` on either
//! side counts as absent.

use std::collections::HashSet;

use burrow::{enhance_value, Container, Key, Result, Value, VIRAL};

use crate::dup::recursive_dup;
use crate::indifferent::{canonical_key, equivalent_keys, KeyPriority, INDIFFERENT};
use crate::literal_get;

/// Merges `other` into `container`.
///
/// # Example
///
/// ```
/// use burrow::Container;
/// use burrow_caps::recursive_merge_in_place;
/// use serde_json::json;
///
/// let base = Container::from_json(&json!({"a": {"x": 1}, "list": [1]})).unwrap();
/// let other = Container::from_json(&json!({"a": {"y": 2}, "list": [2]})).unwrap();
/// recursive_merge_in_place(&base, &other, true).unwrap();
/// assert_eq!(base.to_json(), json!({"a": {"x": 1, "y": 2}, "list": [1, 2]}));
/// ```
pub fn recursive_merge_in_place(container: &Container, other: &Container, overwrite: bool) -> Result<()> {
    merger(
        container,
        Value::Container(container.clone()),
        Value::Container(other.clone()),
        overwrite,
    )?;
    Ok(())
}

/// Merges `other` into a deep copy of `container` and returns the copy.
pub fn recursive_merge(container: &Container, other: &Container, overwrite: bool) -> Result<Container> {
    let copy = recursive_dup(container)?;
    recursive_merge_in_place(&copy, other, overwrite)?;
    Ok(copy)
}

fn merger(root: &Container, left: Value, right: Value, overwrite: bool) -> Result<Value> {
    match (left, right) {
        (Value::Container(a), Value::Container(b)) if a.is_mapping() && b.is_mapping() => {
            merge_mappings(root, a, &b, overwrite)
        }
        (Value::Container(a), Value::Container(b)) if a.is_sequence() && b.is_sequence() => {
            let joined = a.container_type().instantiate();
            joined.inherit_metadata(&a)?;
            joined.replace_items(a.values().into_iter().chain(b.values()).collect());
            enhanced(root, Value::Container(joined), None)
        }
        (left, right) => Ok(if overwrite { right } else { left }),
    }
}

fn merge_mappings(root: &Container, a: Container, b: &Container, overwrite: bool) -> Result<Value> {
    let a = match enhanced(root, Value::Container(a.clone()), None)? {
        Value::Container(upgraded) => upgraded,
        _ => a,
    };
    let mut merged = Vec::new();
    for key in merged_keys(root, &a, b) {
        let left = lookup(root, &a, &key)?;
        let right = lookup(root, b, &key)?;
        let value = match (left.is_null(), right.is_null()) {
            (false, false) => merger(root, left, right, overwrite)?,
            (false, true) => left,
            (true, _) => right,
        };
        merged.push((key, value));
    }
    a.replace_entries(merged);
    for (key, value) in a.entries() {
        let Value::Container(stored) = &value else {
            continue;
        };
        let stored = stored.clone();
        if let Value::Container(relocated) = enhanced(&a, value, Some(&key))? {
            if !relocated.ptr_eq(&stored) {
                a.replace_slot(&key, &stored, relocated);
            }
        }
    }
    Ok(Value::Container(a))
}

/// Propagates into `value` when the merge root is viral.
fn enhanced(root: &Container, value: Value, hint: Option<&Key>) -> Result<Value> {
    if root.has_capability(VIRAL) {
        enhance_value(root, value, hint)
    } else {
        Ok(value)
    }
}

/// Looks `key` up literally, falling back to its equivalent forms when the
/// root resolves keys indifferently.
fn lookup(root: &Container, container: &Container, key: &Key) -> Result<Value> {
    let value = literal_get(container, key)?;
    if !value.is_null() || !root.has_capability(INDIFFERENT) {
        return Ok(value);
    }
    Ok(equivalent_keys(key, &KeyPriority::default())
        .iter()
        .find_map(|candidate| container.get_stored(candidate))
        .unwrap_or_default())
}

/// Keys of `a` followed by the keys of `b` it lacks. When the root resolves
/// keys indifferently, keys that only differ in form count as present.
fn merged_keys(root: &Container, a: &Container, b: &Container) -> Vec<Key> {
    let indifferent = root.has_capability(INDIFFERENT);
    let form = |key: &Key| if indifferent { canonical_key(key) } else { key.clone() };
    let mut keys = a.keys();
    let mut known: HashSet<Key> = keys.iter().map(form).collect();
    for key in b.keys() {
        if known.insert(form(&key)) {
            keys.push(key);
        }
    }
    keys
}
