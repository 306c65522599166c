//! Recursive key sorting.

use std::cmp::Ordering;

use burrow::{Container, Key, Result, Value};

use crate::dup::recursive_dup;

/// Sorts the keys of `container` and of every mapping nested in mappings,
/// in place.
pub fn recursive_sort_in_place(container: &Container) {
    recursive_sort_by_in_place(container, &Key::cmp);
}

pub fn recursive_sort_by_in_place<F>(container: &Container, cmp: &F)
where
    F: Fn(&Key, &Key) -> Ordering,
{
    container.sort_keys_by(cmp);
    for value in container.values() {
        if let Value::Container(nested) = value {
            if nested.is_mapping() {
                recursive_sort_by_in_place(&nested, cmp);
            }
        }
    }
}

/// A sorted deep copy of `container`.
///
/// # Example
///
/// ```
/// use burrow::{Container, Key};
/// use burrow_caps::recursive_sort;
///
/// let map = Container::from_json(&serde_json::json!({"b": 1, "a": {"d": 2, "c": 3}})).unwrap();
/// let sorted = recursive_sort(&map).unwrap();
/// assert_eq!(sorted.keys(), vec![Key::from("a"), Key::from("b")]);
/// assert_eq!(map.keys(), vec![Key::from("b"), Key::from("a")]);
/// ```
pub fn recursive_sort(container: &Container) -> Result<Container> {
    recursive_sort_by(container, &Key::cmp)
}

pub fn recursive_sort_by<F>(container: &Container, cmp: &F) -> Result<Container>
where
    F: Fn(&Key, &Key) -> Ordering,
{
    let copy = recursive_dup(container)?;
    recursive_sort_by_in_place(&copy, cmp);
    Ok(copy)
}
