//! The propagation engine.
//!
//! A container carrying [`Viral`] hands its behaviour to every container
//! that passes through its operations. Read results and written values are
//! run through [`enhance_value`], which upgrades nested containers to the
//! right type, copies capabilities and the dynamic default, and records
//! where in the tree the value now lives.

use std::collections::HashSet;
use std::rc::Rc;

use tracing::trace;

use crate::capability::Capability;
use crate::container::Container;
use crate::error::Result;
use crate::intercept::{wrap, Decorator, DecoratorId, Next, WrapOptions};
use crate::key::Key;
use crate::operation::{Args, Operation};
use crate::registry::{self, Owner};
use crate::types::{ContainerType, Shape};
use crate::value::Value;

/// Name of the [`Viral`] capability.
pub const VIRAL: &str = "viral";

pub const VIRAL_READ: DecoratorId = DecoratorId::reserved(1);
pub const VIRAL_WRITE: DecoratorId = DecoratorId::reserved(2);

/// Propagates the owner's capabilities into nested containers.
#[derive(Debug, Default, Clone, Copy)]
pub struct Viral;

impl Capability for Viral {
    fn name(&self) -> &str {
        VIRAL
    }

    fn install(&self, owner: Owner<'_>) -> Result<()> {
        let options = WrapOptions::lenient();
        for operation in Operation::reads() {
            let read = Decorator::with_id(VIRAL_READ, "viral.read", read_decorator);
            wrap(owner, operation, read, options)?;
        }
        for operation in Operation::writes() {
            let write = Decorator::with_id(VIRAL_WRITE, "viral.write", write_decorator);
            wrap(owner, operation, write, options)?;
        }
        Ok(())
    }
}

/// Where a read or written value lives in the receiver, if known.
fn location_hint(receiver: &Container, operation: Operation, args: &Args) -> Option<Key> {
    let key = match operation {
        Operation::First => return Some(Key::Int(0)),
        Operation::Last => {
            let len = receiver.len();
            return (len > 0).then(|| Key::from(len - 1));
        }
        Operation::Push => return Some(Key::from(receiver.len())),
        _ => args.key()?.clone(),
    };
    if receiver.is_sequence() {
        if let Some(index) = key.as_index() {
            if index < 0 {
                // Insert addresses the gaps around elements, one more than their count.
                let slots = receiver.len() + usize::from(operation == Operation::Insert);
                let absolute = slots as i64 + index;
                return (absolute >= 0).then_some(Key::Int(absolute));
            }
            return Some(Key::Int(index));
        }
    }
    Some(key)
}

fn rebinds(operation: Operation) -> bool {
    matches!(
        operation,
        Operation::Get | Operation::Fetch | Operation::At | Operation::First | Operation::Last
    )
}

fn read_decorator(next: &Next<'_>, args: Args) -> Result<Value> {
    let receiver = next.receiver();
    let operation = next.operation();
    let hint = location_hint(receiver, operation, &args);
    let result = next.call(args)?;
    let Value::Container(stored) = &result else {
        return Ok(result);
    };
    let stored = stored.clone();
    let enhanced = enhance_value(receiver, result, hint.as_ref())?;
    if let (Some(key), Value::Container(upgraded)) = (&hint, &enhanced) {
        if rebinds(operation) && !upgraded.ptr_eq(&stored) {
            receiver.replace_slot(key, &stored, upgraded.clone());
        }
    }
    Ok(enhanced)
}

fn write_decorator(next: &Next<'_>, args: Args) -> Result<Value> {
    let receiver = next.receiver();
    let operation = next.operation();
    let mut args = args;
    let hint = location_hint(receiver, operation, &args);
    match operation {
        Operation::Store | Operation::StoreAt | Operation::Insert => {
            if let Some(value) = args.values_mut().first_mut() {
                *value = enhance_value(receiver, std::mem::take(value), hint.as_ref())?;
            }
        }
        Operation::Push | Operation::Unshift => {
            let base = if operation == Operation::Push { receiver.len() } else { 0 };
            for (offset, value) in args.values_mut().iter_mut().enumerate() {
                let position = Key::from(base + offset);
                *value = enhance_value(receiver, std::mem::take(value), Some(&position))?;
            }
        }
        Operation::Merge => {
            if let Some(value) = args.values_mut().first_mut() {
                *value = enhance_value(receiver, std::mem::take(value), None)?;
            }
        }
        _ => {}
    }
    let merged = match operation {
        Operation::Merge => args.value(0).and_then(Value::as_container).cloned(),
        _ => None,
    };

    let result = next.call(args)?;

    if let Some(other) = merged {
        for (key, _) in other.entries() {
            relocate_slot(receiver, &key)?;
        }
    }
    match operation {
        Operation::Pop | Operation::Shift => enhance_value(receiver, result, None),
        _ => Ok(result),
    }
}

fn relocate_slot(receiver: &Container, key: &Key) -> Result<()> {
    let Some(Value::Container(stored)) = receiver.get_stored(key) else {
        return Ok(());
    };
    if let Value::Container(enhanced) = enhance_value(receiver, Value::Container(stored.clone()), Some(key))? {
        if !enhanced.ptr_eq(&stored) {
            receiver.replace_slot(key, &stored, enhanced);
        }
    }
    Ok(())
}

/// Makes `value` behave like a child of `parent` located at `hint`.
///
/// Scalars are returned as they are. Containers are upgraded to the best
/// ancestor type (which constructs a new container), gain every capability
/// and the dynamic default of `parent`, and have their path prefix
/// tightened. Nested containers are handled the same way.
///
/// Calling it again on an already enhanced value only repeats relocation.
///
/// # Example
///
/// ```
/// use std::rc::Rc;
/// use burrow::{enhance_value, Container, Key, Value, Viral};
///
/// let root = Container::mapping();
/// root.activate(Rc::new(Viral)).unwrap();
///
/// let child = Container::mapping();
/// let enhanced = enhance_value(&root, Value::from(&child), Some(&Key::from("a"))).unwrap();
/// assert!(child.has_capability("viral"));
/// assert_eq!(enhanced.as_container().unwrap().path_prefix(), ".a");
/// ```
pub fn enhance_value(parent: &Container, value: Value, hint: Option<&Key>) -> Result<Value> {
    let mut visited = HashSet::new();
    enhance(parent, value, hint, &mut visited)
}

fn enhance(parent: &Container, value: Value, hint: Option<&Key>, visited: &mut HashSet<usize>) -> Result<Value> {
    let Value::Container(container) = value else {
        return Ok(value);
    };
    if container.ptr_eq(parent) || !visited.insert(container.identity()) {
        return Ok(Value::Container(container));
    }
    let target = best_ancestor(parent, &container);

    if is_settled(parent, &container, &target) {
        if relocate(parent, &container, hint)? {
            enhance_children(&container, visited)?;
        }
        return Ok(Value::Container(container));
    }

    if container.container_type() != target {
        return upgrade(parent, &container, &target, hint, visited).map(Value::Container);
    }
    adopt(parent, &container)?;
    relocate(parent, &container, hint)?;
    enhance_children(&container, visited)?;
    Ok(Value::Container(container))
}

/// The type a nested value of `value`'s shape should have under `parent`.
pub fn best_ancestor(parent: &Container, value: &Container) -> ContainerType {
    let shape = value.shape();
    let current = value.container_type();
    let usable = |ty: &ContainerType| !ty.is_builtin() && ty.shape() == shape;

    let target = value
        .explicit_ancestor(shape)
        .filter(usable)
        .or_else(|| parent.explicit_ancestor(shape).filter(usable))
        .or_else(|| Some(parent.container_type()).filter(usable));
    match target {
        // Subtypes already are what the parent asks for.
        Some(ty) if !current.is_a(&ty) => ty,
        _ => current,
    }
}

fn is_settled(parent: &Container, value: &Container, target: &ContainerType) -> bool {
    value.container_type() == *target
        && registry::has_decorator(Owner::Instance(value), Operation::Get, VIRAL_READ)
        && value.capabilities().is_superset_of(&parent.capabilities())
        && (parent.default_provider().is_none() || value.default_provider().is_some())
        && (parent.explicit_separator().is_none() || value.explicit_separator().is_some())
}

fn upgrade(
    parent: &Container,
    value: &Container,
    target: &ContainerType,
    hint: Option<&Key>,
    visited: &mut HashSet<usize>,
) -> Result<Container> {
    trace!(from = value.container_type().name(), to = target.name(), "upgrading container");
    let upgraded = target.instantiate();
    visited.insert(upgraded.identity());
    upgraded.inherit_metadata(value)?;
    adopt(parent, &upgraded)?;
    relocate(parent, &upgraded, hint)?;

    let mut entries = Vec::with_capacity(value.len());
    for (key, item) in value.entries() {
        let item = enhance(&upgraded, item, Some(&key), visited)?;
        entries.push((key, item));
    }
    upgraded.replace_entries(entries);
    Ok(upgraded)
}

fn adopt(parent: &Container, value: &Container) -> Result<()> {
    for capability in parent.capabilities().iter() {
        if !value.has_capability(capability.name()) {
            value.activate(capability.clone())?;
        }
    }
    if !registry::has_decorator(Owner::Instance(value), Operation::Get, VIRAL_READ) {
        value.activate(Rc::new(Viral))?;
    }
    if value.default_provider().is_none() {
        value.set_default_provider(parent.default_provider());
    }
    if value.explicit_separator().is_none() {
        if let Some(separator) = parent.explicit_separator() {
            value.set_separator(&separator);
        }
    }
    set_ancestors(parent, value);
    Ok(())
}

/// Records on `value` the ancestor types `parent` propagates.
fn set_ancestors(parent: &Container, value: &Container) {
    let parent_type = parent.container_type();
    for shape in [Shape::Mapping, Shape::Sequence] {
        if value.explicit_ancestor(shape).is_some() {
            continue;
        }
        let inherited = parent.explicit_ancestor(shape).or_else(|| {
            (!parent_type.is_builtin() && parent_type.shape() == shape).then(|| parent_type.clone())
        });
        if let Some(ty) = inherited {
            value.set_ancestor(ty);
        }
    }
}

/// Runs the relocate hooks. Returns whether the value's prefix changed.
fn relocate(parent: &Container, value: &Container, hint: Option<&Key>) -> Result<bool> {
    let before = value.path_prefix();
    match parent.container_type().relocate_hook() {
        Some(hook) => hook(parent, value, hint)?,
        None => default_relocate(parent, value, hint),
    }
    for capability in parent.capabilities().iter() {
        capability.relocate(parent, value, hint)?;
    }
    Ok(value.path_prefix() != before)
}

/// Tightens the value's prefix to the parent's prefix plus `hint`.
pub fn default_relocate(parent: &Container, value: &Container, hint: Option<&Key>) {
    let Some(hint) = hint else {
        return;
    };
    let mut components = parent.path_components(parent.path_prefix());
    components.push(hint.to_string());
    value.tighten_prefix(&components);
}

fn enhance_children(container: &Container, visited: &mut HashSet<usize>) -> Result<()> {
    for (key, child) in container.entries() {
        let Value::Container(stored) = &child else {
            continue;
        };
        let stored = stored.clone();
        if let Value::Container(enhanced) = enhance(container, child, Some(&key), visited)? {
            if !enhanced.ptr_eq(&stored) {
                container.replace_slot(&key, &stored, enhanced);
            }
        }
    }
    Ok(())
}
