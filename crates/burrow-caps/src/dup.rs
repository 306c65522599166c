//! Deep copies.

use burrow::{Container, Result, Value};

/// Copies `container` and every container nested in it.
///
/// The copies keep the originals' types, capabilities, separators, path
/// prefixes and dynamic defaults. Scalars are cloned; nothing is shared
/// between the original and the copy.
///
/// # Example
///
/// ```
/// use burrow::{Container, Value};
/// use burrow_caps::recursive_dup;
/// use serde_json::json;
///
/// let original = Container::from_json(&json!({"a": {"b": 1}})).unwrap();
/// let copy = recursive_dup(&original).unwrap();
/// copy.get("a").unwrap().as_container().unwrap().store("b", 2).unwrap();
/// assert_eq!(original.to_json(), json!({"a": {"b": 1}}));
/// ```
pub fn recursive_dup(container: &Container) -> Result<Container> {
    let copy = container.container_type().instantiate();
    copy.inherit_metadata(container)?;
    let mut entries = Vec::with_capacity(container.len());
    for (key, value) in container.entries() {
        let value = match value {
            Value::Container(nested) => Value::Container(recursive_dup(&nested)?),
            scalar => scalar,
        };
        entries.push((key, value));
    }
    copy.replace_entries(entries);
    Ok(copy)
}
