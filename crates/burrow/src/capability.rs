//! Named behaviour bundles that install decorators on an owner.

use std::fmt;
use std::rc::Rc;

use crate::container::Container;
use crate::error::Result;
use crate::key::Key;
use crate::registry::Owner;

/// A behaviour that can be activated on a container type or a single
/// container.
///
/// Activation first activates every capability returned by
/// [`Capability::requires`], so required capabilities sit further inside the
/// decorator chain than the capability that needs them. Among capabilities
/// activated on the same owner, the last one wraps outermost.
pub trait Capability {
    /// Unique name; a capability is activated at most once per owner.
    fn name(&self) -> &str;

    fn requires(&self) -> Vec<Rc<dyn Capability>> {
        Vec::new()
    }

    /// Registers this capability's decorators on `owner`.
    fn install(&self, owner: Owner<'_>) -> Result<()>;

    /// Called whenever `value` is propagated into `parent`, after the
    /// default relocation ran.
    fn relocate(&self, _parent: &Container, _value: &Container, _hint: Option<&Key>) -> Result<()> {
        Ok(())
    }
}

/// An ordered set of capabilities, unique by name.
#[derive(Clone, Default)]
pub struct CapabilitySet {
    entries: Vec<Rc<dyn Capability>>,
}

impl CapabilitySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|c| c.name() == name)
    }

    /// Adds the capability unless one with the same name is present.
    /// Returns whether it was added.
    pub fn insert(&mut self, capability: Rc<dyn Capability>) -> bool {
        if self.contains(capability.name()) {
            return false;
        }
        self.entries.push(capability);
        true
    }

    pub fn extend(&mut self, other: &CapabilitySet) {
        for capability in &other.entries {
            self.insert(capability.clone());
        }
    }

    pub fn is_superset_of(&self, other: &CapabilitySet) -> bool {
        other.entries.iter().all(|c| self.contains(c.name()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Rc<dyn Capability>> {
        self.entries.iter()
    }

    pub fn names(&self) -> Vec<String> {
        self.entries.iter().map(|c| c.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set()
            .entries(self.entries.iter().map(|c| c.name()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named(&'static str);

    impl Capability for Named {
        fn name(&self) -> &str {
            self.0
        }

        fn install(&self, _owner: Owner<'_>) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_insert_is_unique_by_name() {
        let mut set = CapabilitySet::new();
        assert!(set.insert(Rc::new(Named("a"))));
        assert!(!set.insert(Rc::new(Named("a"))));
        assert!(set.insert(Rc::new(Named("b"))));
        assert_eq!(set.names(), vec!["a", "b"]);
    }

    #[test]
    fn test_superset() {
        let mut small = CapabilitySet::new();
        small.insert(Rc::new(Named("a")));
        let mut big = small.clone();
        big.insert(Rc::new(Named("b")));
        assert!(big.is_superset_of(&small));
        assert!(!small.is_superset_of(&big));
        assert!(small.is_superset_of(&CapabilitySet::new()));
    }
}
