//! Values stored in containers, and their JSON bridge.

use crate::container::Container;
use crate::key::Key;
use crate::types::ContainerType;

/// A value held in a container slot.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Sym(String),
    Container(Container),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Null and `false` are falsy, everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Null | Value::Bool(false))
    }

    pub fn as_container(&self) -> Option<&Container> {
        match self {
            Value::Container(c) => Some(c),
            _ => None,
        }
    }

    pub fn into_container(self) -> Option<Container> {
        match self {
            Value::Container(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(n) => Some(*n as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) | Value::Sym(s) => Some(s),
            _ => None,
        }
    }

    /// Converts a scalar that can act as a key.
    pub fn to_key(&self) -> Option<Key> {
        match self {
            Value::Int(n) => Some(Key::Int(*n)),
            Value::Str(s) => Some(Key::Str(s.clone())),
            Value::Sym(s) => Some(Key::Sym(s.clone())),
            _ => None,
        }
    }

    /// Renders the value as JSON. Symbols become strings and non-finite
    /// floats become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Int(n) => serde_json::Value::from(*n),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Str(s) | Value::Sym(s) => serde_json::Value::String(s.clone()),
            Value::Container(c) => c.to_json(),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Sym(a), Value::Sym(b)) => a == b,
            (Value::Container(a), Value::Container(b)) => a == b,
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<i32> for Value {
    fn from(n: i32) -> Self {
        Value::Int(n as i64)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<Container> for Value {
    fn from(c: Container) -> Self {
        Value::Container(c)
    }
}

impl From<&Container> for Value {
    fn from(c: &Container) -> Self {
        Value::Container(c.clone())
    }
}

impl From<Key> for Value {
    fn from(key: Key) -> Self {
        match key {
            Key::Int(n) => Value::Int(n),
            Key::Sym(s) => Value::Sym(s),
            Key::Str(s) => Value::Str(s),
        }
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

impl From<&serde_json::Value> for Value {
    /// Objects become built-in mappings with string keys and arrays become
    /// built-in sequences.
    fn from(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::Str(s.clone()),
            serde_json::Value::Array(items) => {
                let container = Container::of_type(&ContainerType::sequence());
                container.replace_items(items.iter().map(Value::from).collect());
                Value::Container(container)
            }
            serde_json::Value::Object(entries) => {
                let container = Container::of_type(&ContainerType::mapping());
                container.replace_entries(
                    entries
                        .iter()
                        .map(|(k, v)| (Key::Str(k.clone()), Value::from(v)))
                        .collect(),
                );
                Value::Container(container)
            }
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        Value::from(&json)
    }
}
