//! Container keys.

use std::borrow::Cow;
use std::fmt;

use burrow_path::is_integer;
use serde::Deserialize;

/// A mapping key or sequence position.
///
/// `Sym` is a symbol-like key: it prints like a string but is a distinct
/// key, so `Sym("a")` and `Str("a")` can coexist in one mapping.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    Int(i64),
    Sym(String),
    Str(String),
}

/// The variant of a [`Key`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyKind {
    Int,
    Sym,
    Str,
}

impl Key {
    pub fn sym(name: impl Into<String>) -> Self {
        Key::Sym(name.into())
    }

    pub fn kind(&self) -> KeyKind {
        match self {
            Key::Int(_) => KeyKind::Int,
            Key::Sym(_) => KeyKind::Sym,
            Key::Str(_) => KeyKind::Str,
        }
    }

    /// Textual form used for path splitting and environment names.
    pub fn text(&self) -> Cow<'_, str> {
        match self {
            Key::Int(n) => Cow::Owned(n.to_string()),
            Key::Sym(s) | Key::Str(s) => Cow::Borrowed(s),
        }
    }

    /// Returns the key as an integer when it is one or looks like one.
    ///
    /// # Example
    ///
    /// ```
    /// use burrow::Key;
    ///
    /// assert_eq!(Key::Int(3).as_index(), Some(3));
    /// assert_eq!(Key::from("-1").as_index(), Some(-1));
    /// assert_eq!(Key::from("01").as_index(), None);
    /// ```
    pub fn as_index(&self) -> Option<i64> {
        match self {
            Key::Int(n) => Some(*n),
            Key::Sym(s) | Key::Str(s) if is_integer(s) => s.parse().ok(),
            _ => None,
        }
    }

    pub fn is_numeric(&self) -> bool {
        self.as_index().is_some()
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::Str(s.to_string())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::Str(s)
    }
}

impl From<&String> for Key {
    fn from(s: &String) -> Self {
        Key::Str(s.clone())
    }
}

impl From<i64> for Key {
    fn from(n: i64) -> Self {
        Key::Int(n)
    }
}

impl From<i32> for Key {
    fn from(n: i32) -> Self {
        Key::Int(n as i64)
    }
}

impl From<usize> for Key {
    fn from(n: usize) -> Self {
        Key::Int(n as i64)
    }
}

impl From<&Key> for Key {
    fn from(key: &Key) -> Self {
        key.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sym_and_str_are_distinct() {
        assert_ne!(Key::sym("a"), Key::from("a"));
        assert_eq!(Key::sym("a").text(), Key::from("a").text());
    }

    #[test]
    fn test_display() {
        assert_eq!(Key::Int(-4).to_string(), "-4");
        assert_eq!(Key::sym("foo").to_string(), "foo");
    }

    #[test]
    fn test_numeric() {
        assert!(Key::from("12").is_numeric());
        assert!(!Key::from("1.5").is_numeric());
        assert_eq!(Key::sym("7").as_index(), Some(7));
    }
}
