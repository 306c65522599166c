//! Runtime container types.
//!
//! A [`ContainerType`] plays the role a class plays for the containers built
//! from it: it carries type-level decorator registrations and capabilities,
//! an ancestry, the ancestor types propagation should upgrade nested values
//! to, and an optional relocate hook. The built-in `Mapping` and `Sequence`
//! types are sealed so that decorating one tree never leaks into another.

use std::cell::{Ref, RefCell};
use std::fmt;
use std::rc::Rc;

use tracing::trace;

use crate::capability::{Capability, CapabilitySet};
use crate::container::Container;
use crate::error::{Error, Result};
use crate::key::Key;
use crate::registry::{Owner, Registration};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Shape {
    Mapping,
    Sequence,
}

/// Hook called as `(parent, value, hint)` when a value is propagated into a
/// container of the declaring type.
pub type RelocateFn = dyn Fn(&Container, &Container, Option<&Key>) -> Result<()>;

#[derive(Clone)]
pub struct ContainerType {
    def: Rc<TypeDef>,
}

struct TypeDef {
    name: String,
    shape: Shape,
    parent: Option<ContainerType>,
    sealed: bool,
    registrations: RefCell<Vec<Registration>>,
    capabilities: RefCell<CapabilitySet>,
    mapping_ancestor: RefCell<Option<ContainerType>>,
    sequence_ancestor: RefCell<Option<ContainerType>>,
    relocate: RefCell<Option<Rc<RelocateFn>>>,
}

thread_local! {
    static BUILTIN_MAPPING: ContainerType = ContainerType::build("Mapping", Shape::Mapping, None, true);
    static BUILTIN_SEQUENCE: ContainerType = ContainerType::build("Sequence", Shape::Sequence, None, true);
}

impl ContainerType {
    fn build(name: &str, shape: Shape, parent: Option<ContainerType>, sealed: bool) -> Self {
        ContainerType {
            def: Rc::new(TypeDef {
                name: name.to_string(),
                shape,
                parent,
                sealed,
                registrations: RefCell::new(Vec::new()),
                capabilities: RefCell::new(CapabilitySet::new()),
                mapping_ancestor: RefCell::new(None),
                sequence_ancestor: RefCell::new(None),
                relocate: RefCell::new(None),
            }),
        }
    }

    /// The built-in mapping type.
    pub fn mapping() -> Self {
        BUILTIN_MAPPING.with(Clone::clone)
    }

    /// The built-in sequence type.
    pub fn sequence() -> Self {
        BUILTIN_SEQUENCE.with(Clone::clone)
    }

    pub fn builtin(shape: Shape) -> Self {
        match shape {
            Shape::Mapping => Self::mapping(),
            Shape::Sequence => Self::sequence(),
        }
    }

    /// Creates a new type deriving from the built-in type of `shape`.
    pub fn new(name: impl Into<String>, shape: Shape) -> Self {
        Self::build(&name.into(), shape, Some(Self::builtin(shape)), false)
    }

    /// Creates a subtype. It sees every registration and capability of
    /// `self`, plus its own.
    pub fn derive(&self, name: impl Into<String>) -> Self {
        Self::build(&name.into(), self.def.shape, Some(self.clone()), false)
    }

    pub fn name(&self) -> &str {
        &self.def.name
    }

    pub fn shape(&self) -> Shape {
        self.def.shape
    }

    pub fn parent(&self) -> Option<&ContainerType> {
        self.def.parent.as_ref()
    }

    pub fn is_builtin(&self) -> bool {
        self.def.sealed
    }

    /// This type followed by its ancestors, nearest first.
    pub fn ancestry(&self) -> Vec<ContainerType> {
        let mut out = vec![self.clone()];
        let mut current = self.def.parent.clone();
        while let Some(ty) = current {
            current = ty.def.parent.clone();
            out.push(ty);
        }
        out
    }

    /// Whether `self` is `other` or derives from it.
    pub fn is_a(&self, other: &ContainerType) -> bool {
        self.ancestry().iter().any(|ty| ty == other)
    }

    /// Stable identity of this type for the lifetime of the descriptor.
    pub fn identity(&self) -> usize {
        Rc::as_ptr(&self.def) as *const () as usize
    }

    /// Builds an empty container of this type.
    pub fn instantiate(&self) -> Container {
        Container::of_type(self)
    }

    // ── Capabilities ──────────────────────────────────────────────────────

    /// Activates a capability for every container of this type and its
    /// subtypes.
    ///
    /// # Errors
    ///
    /// [`Error::SealedType`] for the built-in types, or whatever the
    /// capability's installation returns.
    pub fn activate(&self, capability: Rc<dyn Capability>) -> Result<()> {
        if self.is_builtin() {
            return Err(Error::SealedType(self.name().to_string()));
        }
        for required in capability.requires() {
            self.activate(required)?;
        }
        if self.has_capability(capability.name()) {
            return Ok(());
        }
        trace!(ty = self.name(), capability = capability.name(), "activating on type");
        capability.install(Owner::Type(self))?;
        self.def.capabilities.borrow_mut().insert(capability);
        Ok(())
    }

    /// Capabilities of this type and its ancestors, root first.
    pub fn capabilities(&self) -> CapabilitySet {
        let mut set = CapabilitySet::new();
        for ty in self.ancestry().iter().rev() {
            set.extend(&ty.def.capabilities.borrow());
        }
        set
    }

    pub fn has_capability(&self, name: &str) -> bool {
        self.ancestry()
            .iter()
            .any(|ty| ty.def.capabilities.borrow().contains(name))
    }

    // ── Propagation metadata ──────────────────────────────────────────────

    /// Declares the type nested mappings are upgraded to.
    pub fn set_mapping_ancestor(&self, ty: ContainerType) {
        *self.def.mapping_ancestor.borrow_mut() = Some(ty);
    }

    /// Declares the type nested sequences are upgraded to.
    pub fn set_sequence_ancestor(&self, ty: ContainerType) {
        *self.def.sequence_ancestor.borrow_mut() = Some(ty);
    }

    /// The declared ancestor for `shape`, searching up the ancestry.
    pub fn ancestor(&self, shape: Shape) -> Option<ContainerType> {
        self.ancestry().iter().find_map(|ty| match shape {
            Shape::Mapping => ty.def.mapping_ancestor.borrow().clone(),
            Shape::Sequence => ty.def.sequence_ancestor.borrow().clone(),
        })
    }

    /// Replaces the default relocation for values propagated into
    /// containers of this type.
    pub fn set_relocate<F>(&self, hook: F)
    where
        F: Fn(&Container, &Container, Option<&Key>) -> Result<()> + 'static,
    {
        *self.def.relocate.borrow_mut() = Some(Rc::new(hook));
    }

    pub(crate) fn relocate_hook(&self) -> Option<Rc<RelocateFn>> {
        self.ancestry()
            .iter()
            .find_map(|ty| ty.def.relocate.borrow().clone())
    }

    // ── Registrations ─────────────────────────────────────────────────────

    pub(crate) fn registrations(&self) -> Ref<'_, Vec<Registration>> {
        self.def.registrations.borrow()
    }

    pub(crate) fn push_registration(&self, registration: Registration) {
        self.def.registrations.borrow_mut().push(registration);
    }
}

impl PartialEq for ContainerType {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.def, &other.def)
    }
}

impl Eq for ContainerType {}

impl fmt::Debug for ContainerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ContainerType")
            .field("name", &self.def.name)
            .field("shape", &self.def.shape)
            .finish()
    }
}
