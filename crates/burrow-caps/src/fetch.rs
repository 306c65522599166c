//! Recursive lookups.
//!
//! A value equal to the default counts as not found, so a stored value that
//! equals the default is skipped.

use burrow::{enhance_value, Container, Key, Result, Value, VIRAL};

/// The first value stored under `key` in `container` or, depth first, in
/// any nested container. Returns `default` when nothing matches.
///
/// # Example
///
/// ```
/// use burrow::{Container, Value};
/// use burrow_caps::recursive_fetch_one;
/// use serde_json::json;
///
/// let doc = Container::from_json(&json!({"a": {"b": {"needle": 1}}})).unwrap();
/// assert_eq!(recursive_fetch_one(&doc, "needle", Value::Null).unwrap(), Value::Int(1));
/// assert_eq!(recursive_fetch_one(&doc, "hay", 0).unwrap(), Value::Int(0));
/// ```
pub fn recursive_fetch_one(container: &Container, key: impl Into<Key>, default: impl Into<Value>) -> Result<Value> {
    recursive_fetch_one_with(container, key, default, |_, value| value)
}

/// Like [`recursive_fetch_one`], passing a match and the container holding
/// it through `f`.
pub fn recursive_fetch_one_with<F>(
    container: &Container,
    key: impl Into<Key>,
    default: impl Into<Value>,
    mut f: F,
) -> Result<Value>
where
    F: FnMut(&Container, Value) -> Value,
{
    fetch_one(container, &key.into(), &default.into(), &mut f)
}

fn fetch_one<F>(container: &Container, key: &Key, default: &Value, f: &mut F) -> Result<Value>
where
    F: FnMut(&Container, Value) -> Value,
{
    let found = container.fetch(key.clone(), default.clone())?;
    if found != *default {
        return Ok(f(container, found));
    }
    for nested in nested_containers(container)? {
        let inner = fetch_one(&nested, key, default, f)?;
        if inner != *default {
            return Ok(inner);
        }
    }
    Ok(default.clone())
}

/// Every value stored under `key` in `container` and its nested containers,
/// outermost first.
pub fn recursive_fetch_all(container: &Container, key: impl Into<Key>) -> Result<Vec<Value>> {
    recursive_fetch_all_with(container, key, |_, value| value)
}

pub fn recursive_fetch_all_with<F>(container: &Container, key: impl Into<Key>, mut f: F) -> Result<Vec<Value>>
where
    F: FnMut(&Container, Value) -> Value,
{
    let mut out = Vec::new();
    fetch_all(container, &key.into(), &mut f, &mut out)?;
    Ok(out)
}

fn fetch_all<F>(container: &Container, key: &Key, f: &mut F, out: &mut Vec<Value>) -> Result<()>
where
    F: FnMut(&Container, Value) -> Value,
{
    let found = container.fetch(key.clone(), Value::Null)?;
    if !found.is_null() {
        out.push(f(container, found));
    }
    for nested in nested_containers(container)? {
        fetch_all(&nested, key, f, out)?;
    }
    Ok(())
}

/// Nested containers of `container`, propagated into when it is viral.
fn nested_containers(container: &Container) -> Result<Vec<Container>> {
    let viral = container.has_capability(VIRAL);
    let mut out = Vec::new();
    for (key, value) in container.entries() {
        let Value::Container(nested) = value else {
            continue;
        };
        if viral {
            if let Value::Container(enhanced) = enhance_value(container, Value::Container(nested.clone()), Some(&key))? {
                out.push(enhanced);
                continue;
            }
        }
        out.push(nested);
    }
    Ok(out)
}
