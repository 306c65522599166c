//! Capabilities and recursive helpers for [`burrow`] containers.
//!
//! - [`indifferent`]: string, symbol and integer keys that name the same
//!   entry.
//! - [`dup`], [`merge`], [`sort`], [`fetch`]: recursive copies, merges,
//!   key sorting and lookups.
//! - [`prototype`]: scoring a container against a prototype.
//! - [`environment`]: environment variables overriding reads.
//! - [`uber`]: a mapping type bundling the everyday capabilities.
//!
//! # Example
//!
//! ```
//! use burrow::Value;
//! use burrow_caps::uber::uber_from_json;
//! use serde_json::json;
//!
//! let config = uber_from_json(&json!({"server": {"port": 8080}})).unwrap();
//! assert_eq!(config.get("server.port").unwrap(), Value::Int(8080));
//! ```

pub mod dup;
pub mod environment;
pub mod fetch;
pub mod indifferent;
pub mod merge;
pub mod prototype;
pub mod sort;
pub mod uber;

pub use dup::recursive_dup;
pub use environment::{key_to_env, EnvironmentOverride, ENVIRONMENT_OVERRIDE};
pub use fetch::{recursive_fetch_all, recursive_fetch_all_with, recursive_fetch_one, recursive_fetch_one_with};
pub use indifferent::{equivalent_keys, unique_keys, IndifferentAccess, KeyPriority, INDIFFERENT};
pub use merge::{recursive_merge, recursive_merge_in_place};
pub use prototype::{prototype_match, prototype_match_score, FAILURE};
pub use sort::{recursive_sort, recursive_sort_by, recursive_sort_by_in_place, recursive_sort_in_place};
pub use uber::{uber_from_json, uber_map, uber_type, UBER_MAP};

use burrow::{Args, Container, Key, Operation, Result, Value, PATHED_DECORATORS};

/// Reads `key` as a literal key, never as a path.
pub(crate) fn literal_get(container: &Container, key: &Key) -> Result<Value> {
    container.invoke_excluding(Operation::Get, Args::keyed(key.clone()), &PATHED_DECORATORS)
}

pub(crate) fn literal_contains(container: &Container, key: &Key) -> Result<bool> {
    let found = container.invoke_excluding(Operation::ContainsKey, Args::keyed(key.clone()), &PATHED_DECORATORS)?;
    Ok(found.is_truthy())
}
