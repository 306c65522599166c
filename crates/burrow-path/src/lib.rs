//! Separator-delimited path utilities.
//!
//! Paths address values inside nested containers: `"foo.bar.0"` names the
//! first element of the `bar` entry of the `foo` entry. A separator preceded
//! by a backslash is part of the component rather than a boundary, and empty
//! components are dropped, so `"foo..bar."` and `".foo.bar"` name the same
//! location.
//!
//! # Example
//!
//! ```
//! use burrow_path::{path_components, normalize_path, join_path};
//!
//! let comps = path_components("foo..bar\\.baz.", ".");
//! assert_eq!(comps, vec!["foo".to_string(), "bar.baz".to_string()]);
//!
//! assert_eq!(join_path(&comps, "."), "foo.bar\\.baz");
//! assert_eq!(normalize_path("foo..bar..", "."), ".foo.bar");
//! ```

use thiserror::Error;

pub mod index;
pub use index::{is_integer, parse_index};

pub mod types;
pub use types::Path;

/// Separator used when none is configured.
pub const DEFAULT_SEPARATOR: &str = ".";

/// Escape character marking a literal separator inside a component.
pub const ESCAPE: char = '\\';

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("invalid index: {0}")]
    InvalidIndex(String),
}

/// Returns the separator to use, falling back to [`DEFAULT_SEPARATOR`] for
/// an empty one.
pub fn effective_separator(separator: &str) -> &str {
    if separator.is_empty() {
        DEFAULT_SEPARATOR
    } else {
        separator
    }
}

/// Escapes a path component.
///
/// Backslashes are doubled and every occurrence of the separator is
/// prefixed with a backslash.
///
/// # Example
///
/// ```
/// use burrow_path::escape_component;
///
/// assert_eq!(escape_component("a.b", "."), "a\\.b");
/// assert_eq!(escape_component("plain", "."), "plain");
/// ```
pub fn escape_component(component: &str, separator: &str) -> String {
    let separator = effective_separator(separator);
    if !component.contains(ESCAPE) && !component.contains(separator) {
        return component.to_string();
    }
    let mut out = String::with_capacity(component.len() + 2);
    let mut rest = component;
    while !rest.is_empty() {
        if let Some(after) = rest.strip_prefix(separator) {
            out.push(ESCAPE);
            out.push_str(separator);
            rest = after;
            continue;
        }
        let mut chars = rest.chars();
        if let Some(ch) = chars.next() {
            if ch == ESCAPE {
                out.push(ESCAPE);
            }
            out.push(ch);
        }
        rest = chars.as_str();
    }
    out
}

/// Splits a path on unescaped separators, keeping empty components.
///
/// # Example
///
/// ```
/// use burrow_path::split_path;
///
/// assert_eq!(split_path(".a..b", "."), vec!["", "a", "", "b"]);
/// ```
pub fn split_path(path: &str, separator: &str) -> Vec<String> {
    let separator = effective_separator(separator);
    let mut out = Vec::new();
    let mut current = String::new();
    let mut rest = path;

    while !rest.is_empty() {
        if let Some(escaped) = rest.strip_prefix(ESCAPE) {
            if let Some(after) = escaped.strip_prefix(separator) {
                current.push_str(separator);
                rest = after;
                continue;
            }
            if let Some(after) = escaped.strip_prefix(ESCAPE) {
                current.push(ESCAPE);
                rest = after;
                continue;
            }
        }
        if let Some(after) = rest.strip_prefix(separator) {
            out.push(std::mem::take(&mut current));
            rest = after;
            continue;
        }
        let mut chars = rest.chars();
        if let Some(ch) = chars.next() {
            current.push(ch);
        }
        rest = chars.as_str();
    }
    out.push(current);
    out
}

/// Drops empty components from an already split path.
pub fn filter_components<S: AsRef<str>>(components: &[S]) -> Vec<String> {
    components
        .iter()
        .map(AsRef::as_ref)
        .filter(|c| !c.is_empty())
        .map(str::to_string)
        .collect()
}

/// Splits a path into its non-empty components.
///
/// # Example
///
/// ```
/// use burrow_path::path_components;
///
/// assert_eq!(path_components("", "."), Vec::<String>::new());
/// assert_eq!(path_components(".", "."), Vec::<String>::new());
/// assert_eq!(path_components("a.b", "."), vec!["a", "b"]);
/// assert_eq!(path_components("a/b", "/"), vec!["a", "b"]);
/// ```
pub fn path_components(path: &str, separator: &str) -> Vec<String> {
    filter_components(&split_path(path, separator))
}

/// Joins components with the separator, escaping separators that occur
/// inside a component.
pub fn join_path<S: AsRef<str>>(components: &[S], separator: &str) -> String {
    let separator = effective_separator(separator);
    let mut out = String::new();
    for (i, component) in components.iter().enumerate() {
        if i > 0 {
            out.push_str(separator);
        }
        out.push_str(&escape_component(component.as_ref(), separator));
    }
    out
}

/// Formats components as an absolute path: the separator followed by the
/// joined non-empty components.
///
/// # Example
///
/// ```
/// use burrow_path::normalize_components;
///
/// assert_eq!(normalize_components(&["a", "", "b"], "."), ".a.b");
/// assert_eq!(normalize_components::<&str>(&[], "."), ".");
/// ```
pub fn normalize_components<S: AsRef<str>>(components: &[S], separator: &str) -> String {
    let separator = effective_separator(separator);
    let filtered = filter_components(components);
    let mut out = String::from(separator);
    out.push_str(&join_path(&filtered, separator));
    out
}

/// Normalizes a path string into its canonical absolute form.
pub fn normalize_path(path: &str, separator: &str) -> String {
    normalize_components(&path_components(path, separator), separator)
}
