//! Type definitions for paths.

use crate::{filter_components, normalize_components, path_components};

/// A path, either as raw text or already split into components.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Path {
    /// Text to be split on the separator.
    Raw(String),
    /// Components that were split by the caller.
    Split(Vec<String>),
}

impl Path {
    /// Returns the non-empty components of this path.
    pub fn components(&self, separator: &str) -> Vec<String> {
        match self {
            Path::Raw(text) => path_components(text, separator),
            Path::Split(components) => filter_components(components),
        }
    }

    /// Returns the canonical absolute form of this path.
    pub fn normalize(&self, separator: &str) -> String {
        normalize_components(&self.components(separator), separator)
    }
}

impl From<&str> for Path {
    fn from(text: &str) -> Self {
        Path::Raw(text.to_string())
    }
}

impl From<String> for Path {
    fn from(text: String) -> Self {
        Path::Raw(text)
    }
}

impl From<Vec<String>> for Path {
    fn from(components: Vec<String>) -> Self {
        Path::Split(components)
    }
}

impl From<&[&str]> for Path {
    fn from(components: &[&str]) -> Self {
        Path::Split(components.iter().map(|c| c.to_string()).collect())
    }
}
