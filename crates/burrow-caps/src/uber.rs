//! A mapping type bundling the everyday capabilities.
//!
//! Containers of the type returned by [`uber_type`] propagate, resolve keys
//! indifferently and accept paths. Nested mappings are upgraded to the same
//! type; recursive merge, sort, dup and fetch from this crate apply to them
//! directly.

use std::rc::Rc;

use burrow::{Container, ContainerType, Error, PathedAccess, Result, Shape, Value, Viral};

use crate::indifferent::{self, IndifferentAccess};

/// Name of the type returned by [`uber_type`].
pub const UBER_MAP: &str = "UberMap";

/// Creates a fresh `UberMap` type.
///
/// Each call yields an independent type, so decorators added to one tree's
/// type never reach another's.
pub fn uber_type() -> Result<ContainerType> {
    let ty = ContainerType::new(UBER_MAP, Shape::Mapping);
    ty.activate(Rc::new(Viral))?;
    ty.activate(Rc::new(IndifferentAccess::new()))?;
    ty.activate(Rc::new(PathedAccess))?;
    Ok(ty)
}

/// An empty map of a fresh `UberMap` type.
pub fn uber_map() -> Result<Container> {
    let map = uber_type()?.instantiate();
    map.set_default_provider(Some(indifferent::default_provider()));
    Ok(map)
}

/// A map of a fresh `UberMap` type holding the contents of a JSON object.
///
/// # Errors
///
/// [`Error::InvalidArgument`] unless `json` is an object or `null`.
///
/// # Example
///
/// ```
/// use burrow::{Key, Value};
/// use burrow_caps::uber_from_json;
/// use serde_json::json;
///
/// let map = uber_from_json(&json!({"foo": {"bar": [1, 2]}})).unwrap();
/// assert_eq!(map.get("foo.bar.1").unwrap(), Value::Int(2));
/// assert_eq!(map.get(Key::sym("foo")).unwrap().as_container().unwrap().path_prefix(), ".foo");
/// ```
pub fn uber_from_json(json: &serde_json::Value) -> Result<Container> {
    let map = uber_map()?;
    match Value::from(json) {
        Value::Container(contents) if contents.is_mapping() => {
            map.merge(&contents)?;
        }
        Value::Null => {}
        _ => {
            return Err(Error::InvalidArgument(
                "an uber map is built from a JSON object".to_string(),
            ))
        }
    }
    Ok(map)
}
