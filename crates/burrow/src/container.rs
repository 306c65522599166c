//! Shared, decorated container nodes.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

use burrow_path::{effective_separator, normalize_components, Path, DEFAULT_SEPARATOR};
use indexmap::IndexMap;

use crate::capability::{Capability, CapabilitySet};
use crate::error::{Error, Result};
use crate::intercept::{self, DecoratorId, Frame};
use crate::key::Key;
use crate::operation::{Args, Operation};
use crate::registry::{Owner, Registration};
use crate::types::{ContainerType, Shape};
use crate::value::Value;

/// Computes a value for a key a mapping does not hold.
pub type DefaultFn = dyn Fn(&Container, &Key) -> Result<Value>;

/// A dynamic-default provider, consulted by `Get` on a miss.
#[derive(Clone)]
pub struct DefaultProvider(Rc<DefaultFn>);

impl DefaultProvider {
    pub fn new<F>(func: F) -> Self
    where
        F: Fn(&Container, &Key) -> Result<Value> + 'static,
    {
        DefaultProvider(Rc::new(func))
    }

    pub fn call(&self, container: &Container, key: &Key) -> Result<Value> {
        (self.0)(container, key)
    }

    pub fn ptr_eq(&self, other: &DefaultProvider) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for DefaultProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DefaultProvider")
    }
}

enum Data {
    Mapping(IndexMap<Key, Value>),
    Sequence(Vec<Value>),
}

#[derive(Default)]
struct Meta {
    capabilities: CapabilitySet,
    default: Option<DefaultProvider>,
    separator: Option<String>,
    prefix: Option<String>,
    mapping_ancestor: Option<ContainerType>,
    sequence_ancestor: Option<ContainerType>,
}

struct Inner {
    ty: ContainerType,
    data: RefCell<Data>,
    meta: RefCell<Meta>,
    registrations: RefCell<Vec<Registration>>,
    frames: RefCell<Vec<Frame>>,
}

/// A handle to a mapping or sequence node.
///
/// Cloning the handle shares the node. Operations such as [`Container::get`]
/// and [`Container::store`] run through the node's decorator chain;
/// inspection methods such as [`Container::entries`] read storage directly.
///
/// # Example
///
/// ```
/// use burrow::{Container, Value};
///
/// let map = Container::mapping();
/// map.store("a", 1).unwrap();
/// assert_eq!(map.get("a").unwrap(), Value::Int(1));
/// assert_eq!(map.get("b").unwrap(), Value::Null);
/// ```
#[derive(Clone)]
pub struct Container {
    inner: Rc<Inner>,
}

fn resolve_index(len: usize, index: i64) -> Option<usize> {
    if index >= 0 {
        usize::try_from(index).ok()
    } else {
        let back = usize::try_from(index.unsigned_abs()).ok()?;
        len.checked_sub(back)
    }
}

/// Pads `items` with `Null` up to `len`.
fn pad_to(items: &mut Vec<Value>, len: usize, index: impl fmt::Display) -> Result<()> {
    if len > items.len() {
        items
            .try_reserve(len - items.len())
            .map_err(|_| Error::InvalidIndex(index.to_string()))?;
        items.resize(len, Value::Null);
    }
    Ok(())
}

fn required_key(operation: Operation, args: &Args) -> Result<&Key> {
    args.key()
        .ok_or_else(|| Error::InvalidArgument(format!("{operation} requires a key")))
}

fn required_index(operation: Operation, args: &Args) -> Result<i64> {
    let key = required_key(operation, args)?;
    key.as_index()
        .ok_or_else(|| Error::InvalidIndex(key.to_string()))
}

impl Container {
    // ── Construction ──────────────────────────────────────────────────────

    pub fn of_type(ty: &ContainerType) -> Self {
        let data = match ty.shape() {
            Shape::Mapping => Data::Mapping(IndexMap::new()),
            Shape::Sequence => Data::Sequence(Vec::new()),
        };
        Container {
            inner: Rc::new(Inner {
                ty: ty.clone(),
                data: RefCell::new(data),
                meta: RefCell::new(Meta::default()),
                registrations: RefCell::new(Vec::new()),
                frames: RefCell::new(Vec::new()),
            }),
        }
    }

    /// An empty undecorated mapping.
    pub fn mapping() -> Self {
        Self::of_type(&ContainerType::mapping())
    }

    /// An empty undecorated sequence.
    pub fn sequence() -> Self {
        Self::of_type(&ContainerType::sequence())
    }

    /// A container of the given shape with each capability activated.
    pub fn with_capabilities(shape: Shape, capabilities: &[Rc<dyn Capability>]) -> Result<Self> {
        let container = Self::of_type(&ContainerType::builtin(shape));
        for capability in capabilities {
            container.activate(capability.clone())?;
        }
        Ok(container)
    }

    /// Builds an undecorated container from a JSON object or array.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidArgument`] for JSON scalars.
    pub fn from_json(json: &serde_json::Value) -> Result<Self> {
        Value::from(json)
            .into_container()
            .ok_or_else(|| Error::InvalidArgument("expected a JSON object or array".to_string()))
    }

    // ── Identity & inspection ─────────────────────────────────────────────

    pub fn container_type(&self) -> ContainerType {
        self.inner.ty.clone()
    }

    pub fn shape(&self) -> Shape {
        self.inner.ty.shape()
    }

    pub fn is_mapping(&self) -> bool {
        self.shape() == Shape::Mapping
    }

    pub fn is_sequence(&self) -> bool {
        self.shape() == Shape::Sequence
    }

    /// Whether both handles share one node.
    pub fn ptr_eq(&self, other: &Container) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn identity(&self) -> usize {
        Rc::as_ptr(&self.inner) as *const () as usize
    }

    pub fn len(&self) -> usize {
        match &*self.inner.data.borrow() {
            Data::Mapping(map) => map.len(),
            Data::Sequence(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stored keys in order; sequences report their indexes.
    pub fn keys(&self) -> Vec<Key> {
        match &*self.inner.data.borrow() {
            Data::Mapping(map) => map.keys().cloned().collect(),
            Data::Sequence(items) => (0..items.len()).map(Key::from).collect(),
        }
    }

    pub fn values(&self) -> Vec<Value> {
        match &*self.inner.data.borrow() {
            Data::Mapping(map) => map.values().cloned().collect(),
            Data::Sequence(items) => items.clone(),
        }
    }

    pub fn entries(&self) -> Vec<(Key, Value)> {
        match &*self.inner.data.borrow() {
            Data::Mapping(map) => map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            Data::Sequence(items) => items
                .iter()
                .enumerate()
                .map(|(i, v)| (Key::from(i), v.clone()))
                .collect(),
        }
    }

    /// Whether storage holds `key`, without decorators or defaults.
    pub fn has_stored_key(&self, key: &Key) -> bool {
        match &*self.inner.data.borrow() {
            Data::Mapping(map) => map.contains_key(key),
            Data::Sequence(items) => key
                .as_index()
                .and_then(|i| resolve_index(items.len(), i))
                .is_some_and(|i| i < items.len()),
        }
    }

    /// Reads storage directly, without decorators or defaults.
    pub fn get_stored(&self, key: &Key) -> Option<Value> {
        match &*self.inner.data.borrow() {
            Data::Mapping(map) => map.get(key).cloned(),
            Data::Sequence(items) => key
                .as_index()
                .and_then(|i| resolve_index(items.len(), i))
                .and_then(|i| items.get(i).cloned()),
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match &*self.inner.data.borrow() {
            Data::Mapping(map) => serde_json::Value::Object(
                map.iter()
                    .map(|(k, v)| (k.to_string(), v.to_json()))
                    .collect(),
            ),
            Data::Sequence(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
        }
    }

    // ── Structural edits (not intercepted) ────────────────────────────────

    /// Replaces the contents. Sequences take the values in order and ignore
    /// the keys.
    pub fn replace_entries(&self, entries: Vec<(Key, Value)>) {
        let mut data = self.inner.data.borrow_mut();
        match &mut *data {
            Data::Mapping(map) => *map = entries.into_iter().collect(),
            Data::Sequence(items) => *items = entries.into_iter().map(|(_, v)| v).collect(),
        }
    }

    /// Replaces the contents with `items`. Mappings get the items under
    /// their indexes.
    pub fn replace_items(&self, items: Vec<Value>) {
        let mut data = self.inner.data.borrow_mut();
        match &mut *data {
            Data::Mapping(map) => {
                *map = items
                    .into_iter()
                    .enumerate()
                    .map(|(i, v)| (Key::from(i), v))
                    .collect()
            }
            Data::Sequence(stored) => *stored = items,
        }
    }

    /// Reorders a mapping's entries by key. Sequences are left alone.
    pub fn sort_keys_by<F>(&self, mut cmp: F)
    where
        F: FnMut(&Key, &Key) -> Ordering,
    {
        if let Data::Mapping(map) = &mut *self.inner.data.borrow_mut() {
            map.sort_by(|k1, _, k2, _| cmp(k1, k2));
        }
    }

    /// Replaces the value under `key` if it is still `expected`.
    pub fn replace_slot(&self, key: &Key, expected: &Container, replacement: Container) -> bool {
        let mut data = self.inner.data.borrow_mut();
        let slot = match &mut *data {
            Data::Mapping(map) => map.get_mut(key),
            Data::Sequence(items) => match key.as_index().and_then(|i| resolve_index(items.len(), i)) {
                Some(position) => items.get_mut(position),
                None => None,
            },
        };
        let Some(value) = slot else {
            return false;
        };
        let still_expected = matches!(&*value, Value::Container(current) if current.ptr_eq(expected));
        if still_expected {
            *value = Value::Container(replacement);
        }
        still_expected
    }

    pub(crate) fn put_stored(&self, key: Key, value: Value) -> Result<()> {
        let mut data = self.inner.data.borrow_mut();
        match &mut *data {
            Data::Mapping(map) => {
                map.insert(key, value);
            }
            Data::Sequence(items) => {
                let index = key
                    .as_index()
                    .ok_or_else(|| Error::InvalidIndex(key.to_string()))?;
                let position =
                    resolve_index(items.len(), index).ok_or_else(|| Error::InvalidIndex(key.to_string()))?;
                let len = position
                    .checked_add(1)
                    .ok_or_else(|| Error::InvalidIndex(key.to_string()))?;
                pad_to(items, len, &key)?;
                items[position] = value;
            }
        }
        Ok(())
    }

    fn remove_stored(&self, key: &Key) -> Option<Value> {
        let mut data = self.inner.data.borrow_mut();
        match &mut *data {
            Data::Mapping(map) => map.shift_remove(key),
            Data::Sequence(items) => {
                let position = key.as_index().and_then(|i| resolve_index(items.len(), i))?;
                (position < items.len()).then(|| items.remove(position))
            }
        }
    }

    fn sequence_mut<T>(&self, operation: Operation, f: impl FnOnce(&mut Vec<Value>) -> Result<T>) -> Result<T> {
        match &mut *self.inner.data.borrow_mut() {
            Data::Sequence(items) => f(items),
            Data::Mapping(_) => Err(Error::OperationNotFound {
                operation,
                owner: Owner::Instance(self).describe(),
            }),
        }
    }

    // ── Metadata ──────────────────────────────────────────────────────────

    /// The path separator, `"."` unless configured.
    pub fn separator(&self) -> String {
        self.inner
            .meta
            .borrow()
            .separator
            .clone()
            .unwrap_or_else(|| DEFAULT_SEPARATOR.to_string())
    }

    pub fn explicit_separator(&self) -> Option<String> {
        self.inner.meta.borrow().separator.clone()
    }

    /// Sets the path separator. An empty separator resets to the default.
    pub fn set_separator(&self, separator: &str) {
        let separator = (!separator.is_empty()).then(|| separator.to_string());
        self.inner.meta.borrow_mut().separator = separator;
    }

    /// Splits `path` with this container's separator.
    pub fn path_components(&self, path: impl Into<Path>) -> Vec<String> {
        path.into().components(&self.separator())
    }

    /// Normalizes `path` with this container's separator.
    pub fn normalize_path(&self, path: impl Into<Path>) -> String {
        path.into().normalize(&self.separator())
    }

    /// This container's absolute path; the bare separator for a root.
    pub fn path_prefix(&self) -> String {
        let explicit = self.inner.meta.borrow().prefix.clone();
        explicit.unwrap_or_else(|| effective_separator(&self.separator()).to_string())
    }

    pub fn set_path_prefix(&self, path: impl Into<Path>) {
        let normalized = self.normalize_path(path);
        self.inner.meta.borrow_mut().prefix = Some(normalized);
    }

    /// Replaces the prefix with `components` if that names a deeper
    /// location. Returns whether the prefix changed.
    pub fn tighten_prefix(&self, components: &[String]) -> bool {
        let current = self.path_components(self.path_prefix());
        if components.len() <= current.len() {
            return false;
        }
        let normalized = normalize_components(components, &self.separator());
        self.inner.meta.borrow_mut().prefix = Some(normalized);
        true
    }

    pub fn default_provider(&self) -> Option<DefaultProvider> {
        self.inner.meta.borrow().default.clone()
    }

    pub fn set_default_provider(&self, provider: Option<DefaultProvider>) {
        self.inner.meta.borrow_mut().default = provider;
    }

    /// The type nested values of `shape` are upgraded to: the one recorded
    /// on this container, else the one declared by its type.
    pub fn explicit_ancestor(&self, shape: Shape) -> Option<ContainerType> {
        let meta = self.inner.meta.borrow();
        let recorded = match shape {
            Shape::Mapping => meta.mapping_ancestor.clone(),
            Shape::Sequence => meta.sequence_ancestor.clone(),
        };
        drop(meta);
        recorded.or_else(|| self.inner.ty.ancestor(shape))
    }

    pub fn set_ancestor(&self, ty: ContainerType) {
        let mut meta = self.inner.meta.borrow_mut();
        match ty.shape() {
            Shape::Mapping => meta.mapping_ancestor = Some(ty),
            Shape::Sequence => meta.sequence_ancestor = Some(ty),
        }
    }

    /// Copies separator, prefix, default provider, recorded ancestors and
    /// instance capabilities from `source`.
    pub fn inherit_metadata(&self, source: &Container) -> Result<()> {
        let (capabilities, default, separator, prefix, mapping, sequence) = {
            let meta = source.inner.meta.borrow();
            (
                meta.capabilities.clone(),
                meta.default.clone(),
                meta.separator.clone(),
                meta.prefix.clone(),
                meta.mapping_ancestor.clone(),
                meta.sequence_ancestor.clone(),
            )
        };
        {
            let mut meta = self.inner.meta.borrow_mut();
            meta.default = default;
            meta.separator = separator;
            meta.prefix = prefix;
            meta.mapping_ancestor = mapping;
            meta.sequence_ancestor = sequence;
        }
        for capability in capabilities.iter() {
            self.activate(capability.clone())?;
        }
        Ok(())
    }

    // ── Capabilities ──────────────────────────────────────────────────────

    /// Capabilities of the type ancestry followed by instance ones.
    pub fn capabilities(&self) -> CapabilitySet {
        let mut set = self.inner.ty.capabilities();
        set.extend(&self.inner.meta.borrow().capabilities);
        set
    }

    pub fn has_capability(&self, name: &str) -> bool {
        self.inner.meta.borrow().capabilities.contains(name) || self.inner.ty.has_capability(name)
    }

    /// Activates a capability on this container only. Required capabilities
    /// are activated first.
    pub fn activate(&self, capability: Rc<dyn Capability>) -> Result<()> {
        for required in capability.requires() {
            self.activate(required)?;
        }
        if self.has_capability(capability.name()) {
            return Ok(());
        }
        capability.install(Owner::Instance(self))?;
        self.inner.meta.borrow_mut().capabilities.insert(capability);
        Ok(())
    }

    pub(crate) fn instance_registrations(&self) -> Vec<Registration> {
        self.inner.registrations.borrow().clone()
    }

    pub(crate) fn push_registration(&self, registration: Registration) {
        self.inner.registrations.borrow_mut().push(registration);
    }

    // ── Call frames ───────────────────────────────────────────────────────

    pub(crate) fn has_frame(&self, frame: &Frame) -> bool {
        self.inner.frames.borrow().contains(frame)
    }

    pub(crate) fn push_frame(&self, frame: Frame) {
        self.inner.frames.borrow_mut().push(frame);
    }

    pub(crate) fn pop_frame(&self) {
        self.inner.frames.borrow_mut().pop();
    }

    /// Number of decorators currently running on this container.
    pub fn frame_depth(&self) -> usize {
        self.inner.frames.borrow().len()
    }

    // ── Intercepted operations ────────────────────────────────────────────

    /// Runs `operation` through this container's decorator chain.
    pub fn invoke(&self, operation: Operation, args: Args) -> Result<Value> {
        intercept::invoke(self, operation, args)
    }

    /// Runs `operation` with the decorators in `excluded` left out.
    pub fn invoke_excluding(&self, operation: Operation, args: Args, excluded: &[DecoratorId]) -> Result<Value> {
        intercept::invoke_excluding(self, operation, args, excluded)
    }

    pub fn get(&self, key: impl Into<Key>) -> Result<Value> {
        self.invoke(Operation::Get, Args::keyed(key))
    }

    pub fn fetch(&self, key: impl Into<Key>, default: impl Into<Value>) -> Result<Value> {
        self.invoke(Operation::Fetch, Args::keyed(key).with_value(default))
    }

    pub fn contains_key(&self, key: impl Into<Key>) -> Result<bool> {
        Ok(self.invoke(Operation::ContainsKey, Args::keyed(key))?.is_truthy())
    }

    pub fn delete(&self, key: impl Into<Key>) -> Result<Value> {
        self.invoke(Operation::Delete, Args::keyed(key))
    }

    /// Stores `value` and returns what was stored, which decorators may have
    /// transformed.
    pub fn store(&self, key: impl Into<Key>, value: impl Into<Value>) -> Result<Value> {
        self.invoke(Operation::Store, Args::keyed(key).with_value(value))
    }

    /// Copies the entries of `other` into this mapping.
    pub fn merge(&self, other: &Container) -> Result<Value> {
        self.invoke(Operation::Merge, Args::new().with_value(other))
    }

    pub fn at(&self, index: i64) -> Result<Value> {
        self.invoke(Operation::At, Args::keyed(index))
    }

    pub fn first(&self) -> Result<Value> {
        self.invoke(Operation::First, Args::new())
    }

    pub fn last(&self) -> Result<Value> {
        self.invoke(Operation::Last, Args::new())
    }

    pub fn store_at(&self, index: i64, value: impl Into<Value>) -> Result<Value> {
        self.invoke(Operation::StoreAt, Args::keyed(index).with_value(value))
    }

    pub fn insert(&self, index: i64, value: impl Into<Value>) -> Result<Value> {
        self.invoke(Operation::Insert, Args::keyed(index).with_value(value))
    }

    pub fn push(&self, value: impl Into<Value>) -> Result<Value> {
        self.invoke(Operation::Push, Args::new().with_value(value))
    }

    pub fn pop(&self) -> Result<Value> {
        self.invoke(Operation::Pop, Args::new())
    }

    pub fn shift(&self) -> Result<Value> {
        self.invoke(Operation::Shift, Args::new())
    }

    pub fn unshift(&self, value: impl Into<Value>) -> Result<Value> {
        self.invoke(Operation::Unshift, Args::new().with_value(value))
    }

    // ── Raw operations ────────────────────────────────────────────────────

    /// The undecorated operation at the end of every chain.
    pub(crate) fn raw(&self, operation: Operation, args: Args) -> Result<Value> {
        if !operation.supports(self.shape()) {
            return Err(Error::OperationNotFound {
                operation,
                owner: Owner::Instance(self).describe(),
            });
        }
        match operation {
            Operation::Get => {
                let key = required_key(operation, &args)?;
                match self.get_stored(key) {
                    Some(value) => Ok(value),
                    None => self.synthesize_default(key),
                }
            }
            Operation::Fetch => {
                let key = required_key(operation, &args)?;
                Ok(self
                    .get_stored(key)
                    .or_else(|| args.value(0).cloned())
                    .unwrap_or_default())
            }
            Operation::ContainsKey => {
                let key = required_key(operation, &args)?;
                Ok(Value::Bool(self.has_stored_key(key)))
            }
            Operation::Delete => {
                let key = required_key(operation, &args)?;
                Ok(self.remove_stored(key).unwrap_or_default())
            }
            Operation::Store | Operation::StoreAt => {
                let key = required_key(operation, &args)?.clone();
                let value = args.value(0).cloned().unwrap_or_default();
                self.put_stored(key, value.clone())?;
                Ok(value)
            }
            Operation::Merge => {
                let other = args
                    .value(0)
                    .and_then(Value::as_container)
                    .filter(|c| c.is_mapping())
                    .ok_or_else(|| Error::InvalidArgument("merge expects a mapping".to_string()))?;
                for (key, value) in other.entries() {
                    self.put_stored(key, value)?;
                }
                Ok(Value::Container(self.clone()))
            }
            Operation::At => {
                let index = required_index(operation, &args)?;
                Ok(self.get_stored(&Key::Int(index)).unwrap_or_default())
            }
            Operation::First => Ok(self.get_stored(&Key::Int(0)).unwrap_or_default()),
            Operation::Last => Ok(self.get_stored(&Key::Int(-1)).unwrap_or_default()),
            Operation::Insert => {
                let index = required_index(operation, &args)?;
                let value = args.value(0).cloned().unwrap_or_default();
                self.sequence_mut(operation, |items| {
                    let position = resolve_index(items.len() + 1, index)
                        .ok_or_else(|| Error::InvalidIndex(index.to_string()))?;
                    pad_to(items, position, index)?;
                    items.insert(position, value.clone());
                    Ok(())
                })?;
                Ok(value)
            }
            Operation::Push => {
                self.sequence_mut(operation, |items| {
                    items.extend(args.all_values().iter().cloned());
                    Ok(())
                })?;
                Ok(Value::Container(self.clone()))
            }
            Operation::Unshift => {
                self.sequence_mut(operation, |items| {
                    items.splice(0..0, args.all_values().iter().cloned());
                    Ok(())
                })?;
                Ok(Value::Container(self.clone()))
            }
            Operation::Pop => self.sequence_mut(operation, |items| Ok(items.pop().unwrap_or_default())),
            Operation::Shift => self.sequence_mut(operation, |items| {
                Ok(if items.is_empty() {
                    Value::Null
                } else {
                    items.remove(0)
                })
            }),
        }
    }

    fn synthesize_default(&self, key: &Key) -> Result<Value> {
        match self.default_provider() {
            Some(provider) => provider.call(self, key),
            None => Ok(Value::Null),
        }
    }
}

impl PartialEq for Container {
    /// Structural equality; mapping entry order does not matter.
    fn eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        match (&*self.inner.data.borrow(), &*other.inner.data.borrow()) {
            (Data::Mapping(a), Data::Mapping(b)) => {
                a.len() == b.len() && a.iter().all(|(k, v)| b.get(k).is_some_and(|w| v == w))
            }
            (Data::Sequence(a), Data::Sequence(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner.ty.name())?;
        match &*self.inner.data.borrow() {
            Data::Mapping(map) => f.debug_map().entries(map.iter()).finish(),
            Data::Sequence(items) => f.debug_list().entries(items.iter()).finish(),
        }
    }
}
