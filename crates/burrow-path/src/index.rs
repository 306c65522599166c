//! Sequence index parsing for path components.

use crate::PathError;

/// Check if a string is the canonical text of an `i64`, optionally negative.
pub fn is_integer(s: &str) -> bool {
    match s.parse::<i64>() {
        Ok(n) => n.to_string() == s,
        Err(_) => false,
    }
}

/// Parses a component as a sequence index. Negative indexes count from the
/// end of the sequence.
///
/// # Errors
///
/// Returns [`PathError::InvalidIndex`] if the component is not the canonical
/// text of an integer.
///
/// # Example
///
/// ```
/// use burrow_path::parse_index;
///
/// assert_eq!(parse_index("3"), Ok(3));
/// assert_eq!(parse_index("-1"), Ok(-1));
/// assert!(parse_index("x").is_err());
/// ```
pub fn parse_index(component: &str) -> Result<i64, PathError> {
    if !is_integer(component) {
        return Err(PathError::InvalidIndex(component.to_string()));
    }
    component
        .parse()
        .map_err(|_| PathError::InvalidIndex(component.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_integer_rejects_padding() {
        assert!(is_integer("10"));
        assert!(is_integer("-10"));
        assert!(!is_integer("010"));
        assert!(!is_integer("+1"));
        assert!(!is_integer(""));
    }

    #[test]
    fn test_parse_index_overflow() {
        assert!(parse_index("99999999999999999999").is_err());
    }
}
