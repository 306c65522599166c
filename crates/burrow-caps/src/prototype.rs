//! Matching containers against prototypes.
//!
//! A prototype is a mapping whose keys a container must have. A `Null`
//! prototype value matches anything, a nested mapping is matched
//! recursively, and any other value must be equal.

use burrow::{Container, Result, Value};

use crate::{literal_contains, literal_get};

/// Score of a nested mapping prototype that met a non-mapping value.
pub const FAILURE: i64 = i32::MIN as i64;

/// Whether `container` matches `prototype` with a positive score.
pub fn prototype_match(container: &Container, prototype: &Container, strict: bool) -> Result<bool> {
    Ok(prototype_match_score(container, prototype, strict)? > 0)
}

/// Scores `container` against `prototype`.
///
/// Returns minus the number of prototype keys the container lacks and, in
/// strict mode, minus the number of keys the prototype lacks. Otherwise the
/// sum of per-key scores: `+1` for a `Null` prototype value or an equal
/// value, `-1` for an unequal value, the recursive score for nested
/// mappings, and [`FAILURE`] when a nested mapping prototype meets a
/// non-mapping value. Nested matches are never strict.
///
/// # Example
///
/// ```
/// use burrow::Container;
/// use burrow_caps::prototype_match_score;
/// use serde_json::json;
///
/// let doc = Container::from_json(&json!({"a": 1, "b": {"c": 2}, "d": 3})).unwrap();
/// let proto = Container::from_json(&json!({"a": null, "b": {"c": 2}})).unwrap();
/// assert_eq!(prototype_match_score(&doc, &proto, false).unwrap(), 2);
/// assert_eq!(prototype_match_score(&doc, &proto, true).unwrap(), -1);
/// ```
pub fn prototype_match_score(container: &Container, prototype: &Container, strict: bool) -> Result<i64> {
    let mut missing = 0;
    for key in prototype.keys() {
        if !literal_contains(container, &key)? {
            missing += 1;
        }
    }
    if missing > 0 {
        return Ok(-missing);
    }

    if strict {
        let mut extra = 0;
        for key in container.keys() {
            if !literal_contains(prototype, &key)? {
                extra += 1;
            }
        }
        if extra > 0 {
            return Ok(-extra);
        }
    }

    let mut score = 0;
    for (key, expected) in prototype.entries() {
        match &expected {
            Value::Null => score += 1,
            Value::Container(nested) if nested.is_mapping() => {
                let Value::Container(actual) = literal_get(container, &key)? else {
                    return Ok(FAILURE);
                };
                if !actual.is_mapping() {
                    return Ok(FAILURE);
                }
                let nested_score = prototype_match_score(&actual, nested, false)?;
                if nested_score < 0 {
                    return Ok(nested_score);
                }
                score += nested_score;
            }
            _ => {
                if literal_get(container, &key)? == expected {
                    score += 1;
                } else {
                    score -= 1;
                }
            }
        }
    }
    Ok(score)
}
