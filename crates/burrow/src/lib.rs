//! Nested mappings and sequences with propagating decorators.
//!
//! Operations on a [`Container`] run through a chain of decorators
//! registered on its [`ContainerType`] or on the container itself (see
//! [`intercept`]). Capabilities bundle decorators: [`Viral`] makes every
//! container reachable from a decorated root carry the root's capabilities,
//! and [`PathedAccess`] turns keys into dotted paths.
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use burrow::{Container, PathedAccess, Value};
//! use serde_json::json;
//!
//! let root = Container::from_json(&json!({"foo": {"bar": 42}})).unwrap();
//! root.activate(Rc::new(PathedAccess)).unwrap();
//!
//! assert_eq!(root.get("foo.bar").unwrap(), Value::Int(42));
//! root.store("foo.baz", "x").unwrap();
//!
//! let foo = root.get("foo").unwrap();
//! let foo = foo.as_container().unwrap();
//! assert_eq!(foo.to_json(), json!({"bar": 42, "baz": "x"}));
//! assert_eq!(foo.path_prefix(), ".foo");
//! assert!(foo.has_capability("pathed_access"));
//! ```

pub mod capability;
pub mod container;
pub mod error;
pub mod intercept;
pub mod key;
pub mod operation;
pub mod pathed;
pub mod propagate;
pub mod registry;
pub mod types;
pub mod value;

pub use capability::{Capability, CapabilitySet};
pub use container::{Container, DefaultFn, DefaultProvider};
pub use error::{Error, Result};
pub use intercept::{invoke, invoke_excluding, wrap, Decorator, DecoratorFn, DecoratorId, Next, WrapOptions};
pub use key::{Key, KeyKind};
pub use operation::{Args, Operation, OperationClass};
pub use pathed::{leaf_key, PathedAccess, PATHED, PATHED_DECORATORS, PATHED_READ, PATHED_WRITE};
pub use propagate::{best_ancestor, default_relocate, enhance_value, Viral, VIRAL, VIRAL_READ, VIRAL_WRITE};
pub use registry::{chain, has_decorator, wrappers, Owner, Registration};
pub use types::{ContainerType, RelocateFn, Shape};
pub use value::Value;
