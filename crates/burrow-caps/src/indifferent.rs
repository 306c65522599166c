//! Indifferent key access.
//!
//! `"1"`, `:1` and `1` (string, symbol and integer) name the same entry of a
//! container carrying [`IndifferentAccess`]. Reads try the equivalent forms
//! of the requested key in priority order and use the first one the
//! container holds; writes update an existing equivalent key rather than
//! adding a second entry.

use std::collections::HashSet;
use std::rc::Rc;

use burrow::{
    wrap, Args, Capability, Container, Decorator, DecoratorId, DefaultProvider, Key, KeyKind, Next,
    Operation, Owner, Result, Value, Viral, WrapOptions,
};
use serde::Deserialize;

/// Name of the [`IndifferentAccess`] capability.
pub const INDIFFERENT: &str = "indifferent_access";

/// The order in which equivalent key forms are tried.
///
/// Deserializes from a list such as `["int", "sym", "str"]`. Kinds left out
/// are tried last.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct KeyPriority {
    order: Vec<KeyKind>,
}

impl Default for KeyPriority {
    fn default() -> Self {
        KeyPriority {
            order: vec![KeyKind::Int, KeyKind::Sym, KeyKind::Str],
        }
    }
}

impl KeyPriority {
    pub fn new(order: Vec<KeyKind>) -> Self {
        KeyPriority { order }
    }

    fn rank(&self, kind: KeyKind) -> usize {
        self.order
            .iter()
            .position(|k| *k == kind)
            .unwrap_or(self.order.len())
    }
}

/// Every form of `key`, ordered by `priority`.
///
/// # Example
///
/// ```
/// use burrow::Key;
/// use burrow_caps::{equivalent_keys, KeyPriority};
///
/// let forms = equivalent_keys(&Key::from("1"), &KeyPriority::default());
/// assert_eq!(forms, vec![Key::Int(1), Key::sym("1"), Key::from("1")]);
///
/// let forms = equivalent_keys(&Key::sym("a"), &KeyPriority::default());
/// assert_eq!(forms, vec![Key::sym("a"), Key::from("a")]);
/// ```
pub fn equivalent_keys(key: &Key, priority: &KeyPriority) -> Vec<Key> {
    let text = key.text().into_owned();
    let mut forms = vec![Key::Str(text.clone()), Key::Sym(text)];
    if let Some(index) = key.as_index() {
        forms.push(Key::Int(index));
    }
    forms.sort_by_key(|k| priority.rank(k.kind()));
    forms
}

/// The canonical form of a key: integers for numeric-looking keys, strings
/// otherwise.
pub fn canonical_key(key: &Key) -> Key {
    match key.as_index() {
        Some(index) => Key::Int(index),
        None => Key::Str(key.text().into_owned()),
    }
}

/// Collapses indifferently equal keys, returning their canonical forms in
/// first-seen order.
pub fn unique_keys(keys: &[Key]) -> Vec<Key> {
    let mut seen = HashSet::new();
    keys.iter()
        .map(canonical_key)
        .filter(|k| seen.insert(k.clone()))
        .collect()
}

/// A dynamic-default provider that retries a missing string key as a symbol
/// and a missing symbol as a string.
pub fn default_provider() -> DefaultProvider {
    DefaultProvider::new(|container, key| {
        let swapped = match key {
            Key::Str(s) => Key::Sym(s.clone()),
            Key::Sym(s) => Key::Str(s.clone()),
            Key::Int(_) => return Ok(Value::Null),
        };
        Ok(container.get_stored(&swapped).unwrap_or_default())
    })
}

/// Resolves keys indifferently of their string, symbol or integer form.
#[derive(Debug, Clone)]
pub struct IndifferentAccess {
    priority: KeyPriority,
    read: DecoratorId,
    write: DecoratorId,
}

impl Default for IndifferentAccess {
    fn default() -> Self {
        Self::with_priority(KeyPriority::default())
    }
}

impl IndifferentAccess {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_priority(priority: KeyPriority) -> Self {
        IndifferentAccess {
            priority,
            read: DecoratorId::fresh(),
            write: DecoratorId::fresh(),
        }
    }
}

/// The first equivalent form of the requested key that `receiver` holds.
fn resolve(receiver: &Container, args: &Args, priority: &KeyPriority) -> Option<Key> {
    let key = args.key()?;
    equivalent_keys(key, priority)
        .into_iter()
        .find(|candidate| receiver.has_stored_key(candidate))
}

fn indifferent(next: &Next<'_>, args: Args, priority: &KeyPriority) -> Result<Value> {
    match resolve(next.receiver(), &args, priority) {
        Some(found) => next.call(args.with_key(found)),
        None => next.call(args),
    }
}

impl Capability for IndifferentAccess {
    fn name(&self) -> &str {
        INDIFFERENT
    }

    fn requires(&self) -> Vec<Rc<dyn Capability>> {
        vec![Rc::new(Viral)]
    }

    fn install(&self, owner: Owner<'_>) -> Result<()> {
        let options = WrapOptions::lenient();
        let priority = Rc::new(self.priority.clone());
        for operation in Operation::KEYED_READ {
            let priority = priority.clone();
            let read = Decorator::with_id(self.read, "indifferent.read", move |next, args| {
                indifferent(next, args, &priority)
            });
            wrap(owner, operation, read, options)?;
        }
        let write = Decorator::with_id(self.write, "indifferent.write", move |next, args| {
            indifferent(next, args, &priority)
        });
        wrap(owner, Operation::Store, write, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_priority_deserializes() {
        let priority: KeyPriority = serde_json::from_str(r#"["str", "sym"]"#).unwrap();
        let forms = equivalent_keys(&Key::Int(3), &priority);
        assert_eq!(forms, vec![Key::from("3"), Key::sym("3"), Key::Int(3)]);
    }

    #[test]
    fn test_unique_keys() {
        let keys = vec![Key::from("a"), Key::sym("a"), Key::Int(1), Key::from("1"), Key::from("b")];
        assert_eq!(unique_keys(&keys), vec![Key::from("a"), Key::Int(1), Key::from("b")]);
    }

    #[test]
    fn test_default_provider_swaps() {
        let map = Container::mapping();
        map.store(Key::sym("s"), 1).unwrap();
        map.store("t", 2).unwrap();
        map.set_default_provider(Some(default_provider()));
        assert_eq!(map.get("s").unwrap(), Value::Int(1));
        assert_eq!(map.get(Key::sym("t")).unwrap(), Value::Int(2));
        assert_eq!(map.get("u").unwrap(), Value::Null);
    }
}
