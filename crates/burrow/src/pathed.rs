//! Path-addressed keyed operations.
//!
//! With [`PathedAccess`] active, the key of `get`, `fetch`, `contains_key`,
//! `delete` and `store` is a path: `"foo.bar"` reads the `bar` entry of the
//! `foo` entry. Intermediate mappings are created on writes; reads through
//! missing intermediates see an empty mapping.
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use burrow::{Container, PathedAccess, Value};
//!
//! let root = Container::mapping();
//! root.activate(Rc::new(PathedAccess)).unwrap();
//!
//! root.store("a.b.c", 1).unwrap();
//! assert_eq!(root.get("a.b.c").unwrap(), Value::Int(1));
//! assert_eq!(root.get("a.x.c").unwrap(), Value::Null);
//!
//! let b = root.get("a.b").unwrap();
//! assert_eq!(b.as_container().unwrap().path_prefix(), ".a.b");
//! ```

use std::rc::Rc;

use burrow_path::{normalize_components, parse_index};

use crate::capability::Capability;
use crate::container::Container;
use crate::error::{Error, Result};
use crate::intercept::{wrap, Decorator, DecoratorId, Next, WrapOptions};
use crate::key::Key;
use crate::operation::{Args, Operation};
use crate::propagate::{enhance_value, Viral};
use crate::registry::Owner;
use crate::value::Value;

/// Name of the [`PathedAccess`] capability.
pub const PATHED: &str = "pathed_access";

pub const PATHED_READ: DecoratorId = DecoratorId::reserved(3);
pub const PATHED_WRITE: DecoratorId = DecoratorId::reserved(4);

/// Decorators to leave out when a key is already a single literal
/// component.
pub const PATHED_DECORATORS: [DecoratorId; 2] = [PATHED_READ, PATHED_WRITE];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Read,
    Write,
}

/// Treats keys of keyed operations as separator-delimited paths.
#[derive(Debug, Default, Clone, Copy)]
pub struct PathedAccess;

impl Capability for PathedAccess {
    fn name(&self) -> &str {
        PATHED
    }

    fn requires(&self) -> Vec<Rc<dyn Capability>> {
        vec![Rc::new(Viral)]
    }

    fn install(&self, owner: Owner<'_>) -> Result<()> {
        let options = WrapOptions::lenient();
        for operation in Operation::KEYED_READ {
            let read = Decorator::with_id(PATHED_READ, "pathed.read", |next, args| {
                pathed(next, args, Mode::Read)
            });
            wrap(owner, operation, read, options)?;
        }
        let write = Decorator::with_id(PATHED_WRITE, "pathed.write", |next, args| {
            pathed(next, args, Mode::Write)
        });
        wrap(owner, Operation::Store, write, options)
    }
}

fn pathed(next: &Next<'_>, args: Args, mode: Mode) -> Result<Value> {
    let Some(key) = args.key().cloned() else {
        return next.call(args);
    };
    let receiver = next.receiver();
    let components = receiver.path_components(key.text().into_owned());

    let Some((leaf, intermediate)) = components.split_last() else {
        return Ok(Value::Container(receiver.clone()));
    };
    if intermediate.is_empty() {
        return next.call(args.with_key(leaf_key(receiver, &key, leaf)));
    }
    let container = descend(receiver, intermediate, mode)?;
    container.invoke_excluding(
        next.operation(),
        args.with_key(leaf_key(&container, &key, leaf)),
        &PATHED_DECORATORS,
    )
}

/// The key a single path component addresses in `container`.
///
/// A key whose text is already the component keeps its type, so symbol and
/// integer keys survive; otherwise the component becomes a string key, or an
/// index for sequences.
pub fn leaf_key(container: &Container, key: &Key, component: &str) -> Key {
    if key.text() == component {
        return key.clone();
    }
    step_key(container, component)
}

fn step_key(container: &Container, component: &str) -> Key {
    if container.is_sequence() {
        if let Ok(index) = parse_index(component) {
            return Key::Int(index);
        }
    }
    Key::Str(component.to_string())
}

/// Walks `components` from `receiver`, returning the container the last
/// component is looked up in.
fn descend(receiver: &Container, components: &[String], mode: Mode) -> Result<Container> {
    let mut current = receiver.clone();
    for (depth, component) in components.iter().enumerate() {
        let key = step_key(&current, component);
        let found = current.invoke_excluding(Operation::Get, Args::keyed(key.clone()), &PATHED_DECORATORS)?;
        let child = match (found, mode) {
            (Value::Container(child), _) => child,
            (_, Mode::Read) => return throwaway(&current, &key),
            (Value::Null, Mode::Write) => create_intermediate(&current, &key, &components[..=depth])?,
            (_, Mode::Write) => {
                return Err(Error::NotAContainer(normalize_components(
                    &components[..=depth],
                    &receiver.separator(),
                )))
            }
        };
        current = into_container(enhance_value(&current, Value::Container(child), Some(&key))?)?;
    }
    Ok(current)
}

/// An empty mapping standing in for a missing intermediate on reads.
fn throwaway(parent: &Container, key: &Key) -> Result<Container> {
    into_container(enhance_value(parent, Value::Container(Container::mapping()), Some(key))?)
}

fn create_intermediate(parent: &Container, key: &Key, path: &[String]) -> Result<Container> {
    let store = Args::keyed(key.clone()).with_value(Container::mapping());
    parent.invoke_excluding(Operation::Store, store, &PATHED_DECORATORS)?;
    match parent.invoke_excluding(Operation::Get, Args::keyed(key.clone()), &PATHED_DECORATORS)? {
        Value::Container(child) => Ok(child),
        _ => Err(Error::NotAContainer(normalize_components(path, &parent.separator()))),
    }
}

fn into_container(value: Value) -> Result<Container> {
    value
        .into_container()
        .ok_or_else(|| Error::InvalidArgument("expected a container".to_string()))
}
