//! The interception engine.
//!
//! [`wrap`] registers a [`Decorator`] around one operation of a type or a
//! single container. Invoking the operation runs the chain of decorators
//! outermost first; each receives a [`Next`] handle to continue with the
//! rest of the chain, which ends in the raw operation.
//!
//! Decorators routinely call back into the receiver (a read decorator that
//! needs another read, say). To keep that from recursing forever, each
//! container keeps a stack of active call frames, a frame being the
//! decorator id plus the receiver's type. A decorator whose frame is already
//! active on the receiver is skipped for the nested invocation.
//!
//! # Example
//!
//! ```
//! use burrow::{wrap, Args, Container, ContainerType, Decorator, Operation, Owner, Shape, Value, WrapOptions};
//!
//! let ty = ContainerType::new("Doubling", Shape::Mapping);
//! let double = Decorator::new("double", |next, args| {
//!     Ok(match next.call(args)? {
//!         Value::Int(n) => Value::Int(n * 2),
//!         other => other,
//!     })
//! });
//! wrap(Owner::Type(&ty), Operation::Get, double, WrapOptions::default()).unwrap();
//!
//! let map = ty.instantiate();
//! map.store("n", 21).unwrap();
//! assert_eq!(map.get("n").unwrap(), Value::Int(42));
//! ```

use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

use crate::container::Container;
use crate::error::{Error, Result};
use crate::operation::{Args, Operation};
use crate::registry::{self, Owner, Registration};
use crate::value::Value;

/// Identity of a decorator, shared by every registration of it.
///
/// Duplicate detection and loop detection compare ids, so a capability that
/// wraps several operations with the same behaviour reuses one id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DecoratorId(u64);

const FIRST_FRESH_ID: u64 = 1 << 32;

static NEXT_ID: AtomicU64 = AtomicU64::new(FIRST_FRESH_ID);

impl DecoratorId {
    /// A well-known id. Reserved ids are below `2^32`; fresh ids never
    /// collide with them.
    pub const fn reserved(id: u32) -> Self {
        DecoratorId(id as u64)
    }

    pub fn fresh() -> Self {
        DecoratorId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

pub type DecoratorFn = dyn Fn(&Next<'_>, Args) -> Result<Value>;

#[derive(Clone)]
pub struct Decorator {
    id: DecoratorId,
    name: Rc<str>,
    func: Rc<DecoratorFn>,
}

impl Decorator {
    /// A decorator with a fresh id.
    pub fn new<F>(name: &str, func: F) -> Self
    where
        F: Fn(&Next<'_>, Args) -> Result<Value> + 'static,
    {
        Self::with_id(DecoratorId::fresh(), name, func)
    }

    pub fn with_id<F>(id: DecoratorId, name: &str, func: F) -> Self
    where
        F: Fn(&Next<'_>, Args) -> Result<Value> + 'static,
    {
        Decorator {
            id,
            name: Rc::from(name),
            func: Rc::new(func),
        }
    }

    pub fn id(&self) -> DecoratorId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for Decorator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Decorator")
            .field("id", &self.id)
            .field("name", &self.name)
            .finish()
    }
}

/// Options for [`wrap`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WrapOptions {
    /// Fail with [`Error::OperationNotFound`] when the owner's shape lacks the
    /// operation. When false the registration is silently skipped.
    pub fail_if_missing: bool,
    /// Fail with [`Error::DuplicateRegistration`] when the decorator is
    /// already in the chain. When false the duplicate is ignored.
    pub prevent_duplicates: bool,
}

impl Default for WrapOptions {
    fn default() -> Self {
        WrapOptions {
            fail_if_missing: true,
            prevent_duplicates: false,
        }
    }
}

impl WrapOptions {
    /// Options that skip operations the owner does not have.
    pub fn lenient() -> Self {
        WrapOptions {
            fail_if_missing: false,
            ..Self::default()
        }
    }
}

/// Wraps `operation` of `owner` with `decorator`.
///
/// # Errors
///
/// - [`Error::OperationNotFound`] if the owner's shape lacks the operation
///   and `fail_if_missing` is set.
/// - [`Error::SealedType`] if the owner is a built-in type.
/// - [`Error::DuplicateRegistration`] if the decorator is already visible in
///   the owner's chain and `prevent_duplicates` is set.
pub fn wrap(owner: Owner<'_>, operation: Operation, decorator: Decorator, options: WrapOptions) -> Result<()> {
    if !operation.supports(owner.shape()) {
        if options.fail_if_missing {
            return Err(Error::OperationNotFound {
                operation,
                owner: owner.describe(),
            });
        }
        debug!(%operation, owner = %owner.describe(), decorator = decorator.name(), "operation missing, not wrapped");
        return Ok(());
    }
    if let Owner::Type(ty) = owner {
        if ty.is_builtin() {
            return Err(Error::SealedType(ty.name().to_string()));
        }
    }
    if registry::has_decorator(owner, operation, decorator.id()) {
        if options.prevent_duplicates {
            return Err(Error::DuplicateRegistration {
                operation,
                decorator: decorator.name().to_string(),
                owner: owner.describe(),
            });
        }
        debug!(%operation, owner = %owner.describe(), decorator = decorator.name(), "duplicate wrapper ignored");
        return Ok(());
    }
    owner.register(Registration::new(operation, decorator));
    Ok(())
}

// ── Call frames ───────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Frame {
    decorator: DecoratorId,
    receiver_type: usize,
}

struct FrameGuard<'a> {
    receiver: &'a Container,
}

impl<'a> FrameGuard<'a> {
    fn push(receiver: &'a Container, frame: Frame) -> Self {
        receiver.push_frame(frame);
        FrameGuard { receiver }
    }
}

impl Drop for FrameGuard<'_> {
    fn drop(&mut self) {
        self.receiver.pop_frame();
    }
}

// ── Invocation ────────────────────────────────────────────────────────────

/// Handle a decorator uses to continue the chain.
pub struct Next<'a> {
    receiver: &'a Container,
    operation: Operation,
    current: DecoratorId,
    inner: &'a [Registration],
}

impl<'a> Next<'a> {
    pub fn receiver(&self) -> &'a Container {
        self.receiver
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    /// Id of the decorator holding this handle.
    pub fn decorator(&self) -> DecoratorId {
        self.current
    }

    /// Runs the rest of the chain with `args`.
    pub fn call(&self, args: Args) -> Result<Value> {
        run(self.receiver, self.operation, self.inner, args)
    }

    /// Runs another operation on the same receiver, entering its chain just
    /// inside the current decorator. When the current decorator does not
    /// wrap `operation`, the whole chain of `operation` runs.
    pub fn dispatch(&self, operation: Operation, args: Args) -> Result<Value> {
        let chain = registry::chain(self.receiver, operation);
        let start = chain
            .iter()
            .position(|r| r.decorator().id() == self.current)
            .map_or(0, |i| i + 1);
        run(self.receiver, operation, &chain[start..], args)
    }
}

/// Runs `operation` on `receiver` through its full decorator chain.
pub fn invoke(receiver: &Container, operation: Operation, args: Args) -> Result<Value> {
    let chain = registry::chain(receiver, operation);
    run(receiver, operation, &chain, args)
}

/// Runs `operation` on `receiver` with the decorators in `excluded` left
/// out of the chain.
pub fn invoke_excluding(
    receiver: &Container,
    operation: Operation,
    args: Args,
    excluded: &[DecoratorId],
) -> Result<Value> {
    let chain: Vec<Registration> = registry::chain(receiver, operation)
        .into_iter()
        .filter(|r| !excluded.contains(&r.decorator().id()))
        .collect();
    run(receiver, operation, &chain, args)
}

fn run(receiver: &Container, operation: Operation, chain: &[Registration], args: Args) -> Result<Value> {
    let receiver_type = receiver.container_type().identity();
    let mut rest = chain;
    while let Some((head, inner)) = rest.split_first() {
        let decorator = head.decorator();
        let frame = Frame {
            decorator: decorator.id(),
            receiver_type,
        };
        if receiver.has_frame(&frame) {
            debug!(%operation, decorator = decorator.name(), "re-entrant call, decorator skipped");
            rest = inner;
            continue;
        }
        let _guard = FrameGuard::push(receiver, frame);
        let next = Next {
            receiver,
            operation,
            current: decorator.id(),
            inner,
        };
        return (decorator.func)(&next, args);
    }
    receiver.raw(operation, args)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_ids_are_unique_and_unreserved() {
        let a = DecoratorId::fresh();
        let b = DecoratorId::fresh();
        assert_ne!(a, b);
        assert!(a.get() >= FIRST_FRESH_ID);
        assert!(DecoratorId::reserved(u32::MAX).get() < FIRST_FRESH_ID);
    }

    #[test]
    fn test_frames_pop_on_error() {
        let ty = crate::ContainerType::new("Failing", crate::Shape::Mapping);
        let fail = Decorator::new("fail", |_, _| Err(Error::InvalidArgument("nope".into())));
        wrap(Owner::Type(&ty), Operation::Get, fail, WrapOptions::default()).unwrap();
        let map = ty.instantiate();
        assert!(map.get("a").is_err());
        assert!(map.get("a").is_err());
        assert_eq!(map.frame_depth(), 0);
    }
}
