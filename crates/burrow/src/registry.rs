//! Where wrapper registrations live and how a decorator chain is assembled.

use crate::container::Container;
use crate::intercept::{Decorator, DecoratorId};
use crate::operation::Operation;
use crate::types::{ContainerType, Shape};

/// The owner of a registration: every container of a type, or one
/// container.
#[derive(Debug, Clone, Copy)]
pub enum Owner<'a> {
    Type(&'a ContainerType),
    Instance(&'a Container),
}

impl Owner<'_> {
    pub fn shape(&self) -> Shape {
        match self {
            Owner::Type(ty) => ty.shape(),
            Owner::Instance(container) => container.shape(),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            Owner::Type(ty) => format!("type {}", ty.name()),
            Owner::Instance(container) => format!("{} instance", container.container_type().name()),
        }
    }

    pub(crate) fn register(&self, registration: Registration) {
        match self {
            Owner::Type(ty) => ty.push_registration(registration),
            Owner::Instance(container) => container.push_registration(registration),
        }
    }
}

/// A decorator wrapped around one operation.
#[derive(Debug, Clone)]
pub struct Registration {
    operation: Operation,
    decorator: Decorator,
}

impl Registration {
    pub fn new(operation: Operation, decorator: Decorator) -> Self {
        Registration {
            operation,
            decorator,
        }
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn decorator(&self) -> &Decorator {
        &self.decorator
    }
}

fn newest_first(registrations: &[Registration], operation: Operation, out: &mut Vec<Registration>) {
    out.extend(
        registrations
            .iter()
            .rev()
            .filter(|r| r.operation == operation)
            .cloned(),
    );
}

fn type_chain(ty: &ContainerType, operation: Operation, out: &mut Vec<Registration>) {
    for ancestor in ty.ancestry() {
        newest_first(&ancestor.registrations(), operation, out);
    }
}

/// The decorator chain for `operation` on `container`, outermost first:
/// instance registrations newest first, then the type's, then each
/// ancestor type's.
pub fn chain(container: &Container, operation: Operation) -> Vec<Registration> {
    let mut out = Vec::new();
    newest_first(&container.instance_registrations(), operation, &mut out);
    type_chain(&container.container_type(), operation, &mut out);
    out
}

/// The decorators visible from `owner` for `operation`, outermost first.
pub fn wrappers(owner: Owner<'_>, operation: Operation) -> Vec<Decorator> {
    let registrations = match owner {
        Owner::Instance(container) => chain(container, operation),
        Owner::Type(ty) => {
            let mut out = Vec::new();
            type_chain(ty, operation, &mut out);
            out
        }
    };
    registrations.into_iter().map(|r| r.decorator).collect()
}

pub fn has_decorator(owner: Owner<'_>, operation: Operation, id: DecoratorId) -> bool {
    wrappers(owner, operation).iter().any(|d| d.id() == id)
}
