//! The catalog of interceptable container operations.

use std::fmt;

use crate::key::Key;
use crate::types::Shape;
use crate::value::Value;

/// An operation that decorators can wrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Get,
    Fetch,
    ContainsKey,
    Delete,
    Store,
    Merge,
    At,
    First,
    Last,
    StoreAt,
    Insert,
    Push,
    Pop,
    Shift,
    Unshift,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationClass {
    KeyedRead,
    KeyedWrite,
    IndexedRead,
    IndexedWrite,
}

impl Operation {
    pub const KEYED_READ: [Operation; 4] = [
        Operation::Get,
        Operation::Fetch,
        Operation::ContainsKey,
        Operation::Delete,
    ];
    pub const KEYED_WRITE: [Operation; 2] = [Operation::Store, Operation::Merge];
    pub const INDEXED_READ: [Operation; 3] = [Operation::At, Operation::First, Operation::Last];
    pub const INDEXED_WRITE: [Operation; 6] = [
        Operation::StoreAt,
        Operation::Insert,
        Operation::Push,
        Operation::Pop,
        Operation::Shift,
        Operation::Unshift,
    ];

    pub const ALL: [Operation; 15] = [
        Operation::Get,
        Operation::Fetch,
        Operation::ContainsKey,
        Operation::Delete,
        Operation::Store,
        Operation::Merge,
        Operation::At,
        Operation::First,
        Operation::Last,
        Operation::StoreAt,
        Operation::Insert,
        Operation::Push,
        Operation::Pop,
        Operation::Shift,
        Operation::Unshift,
    ];

    pub fn class(self) -> OperationClass {
        match self {
            Operation::Get | Operation::Fetch | Operation::ContainsKey | Operation::Delete => {
                OperationClass::KeyedRead
            }
            Operation::Store | Operation::Merge => OperationClass::KeyedWrite,
            Operation::At | Operation::First | Operation::Last => OperationClass::IndexedRead,
            _ => OperationClass::IndexedWrite,
        }
    }

    pub fn is_read(self) -> bool {
        matches!(
            self.class(),
            OperationClass::KeyedRead | OperationClass::IndexedRead
        )
    }

    pub fn is_write(self) -> bool {
        !self.is_read()
    }

    /// All read operations, keyed first.
    pub fn reads() -> impl Iterator<Item = Operation> {
        Self::ALL.into_iter().filter(|op| op.is_read())
    }

    /// All write operations, keyed first.
    pub fn writes() -> impl Iterator<Item = Operation> {
        Self::ALL.into_iter().filter(|op| op.is_write())
    }

    /// Whether the operation addresses a slot through `Args::key`.
    pub fn takes_key(self) -> bool {
        matches!(
            self,
            Operation::Get
                | Operation::Fetch
                | Operation::ContainsKey
                | Operation::Delete
                | Operation::Store
                | Operation::At
                | Operation::StoreAt
                | Operation::Insert
        )
    }

    /// Whether a container of the given shape has this operation.
    pub fn supports(self, shape: Shape) -> bool {
        match self.class() {
            OperationClass::KeyedRead => true,
            OperationClass::KeyedWrite => self == Operation::Store || shape == Shape::Mapping,
            OperationClass::IndexedRead | OperationClass::IndexedWrite => shape == Shape::Sequence,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Operation::Get => "get",
            Operation::Fetch => "fetch",
            Operation::ContainsKey => "contains_key",
            Operation::Delete => "delete",
            Operation::Store => "store",
            Operation::Merge => "merge",
            Operation::At => "at",
            Operation::First => "first",
            Operation::Last => "last",
            Operation::StoreAt => "store_at",
            Operation::Insert => "insert",
            Operation::Push => "push",
            Operation::Pop => "pop",
            Operation::Shift => "shift",
            Operation::Unshift => "unshift",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Arguments of an operation invocation.
///
/// Keyed and index operations carry their key; `Store`-like operations carry
/// the written value first; `Fetch` carries its default; `Push`/`Unshift`
/// carry every pushed value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args {
    key: Option<Key>,
    values: Vec<Value>,
}

impl Args {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn keyed(key: impl Into<Key>) -> Self {
        Args {
            key: Some(key.into()),
            values: Vec::new(),
        }
    }

    pub fn values(values: Vec<Value>) -> Self {
        Args { key: None, values }
    }

    pub fn with_value(mut self, value: impl Into<Value>) -> Self {
        self.values.push(value.into());
        self
    }

    /// Returns a copy of these arguments addressed to another key.
    pub fn with_key(&self, key: impl Into<Key>) -> Self {
        Args {
            key: Some(key.into()),
            values: self.values.clone(),
        }
    }

    pub fn key(&self) -> Option<&Key> {
        self.key.as_ref()
    }

    pub fn value(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    pub fn all_values(&self) -> &[Value] {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut [Value] {
        &mut self.values
    }
}
