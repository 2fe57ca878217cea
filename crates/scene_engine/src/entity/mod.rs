//! Entity/component composition primitives
//!
//! An [`Entity`] owns an ordered [`EntityComponentCollection`]. Components
//! attach against a context type `C` (for scene nodes this is the node's
//! render-core binding) and release their [`ResourceScope`] on detach.

mod collection;
mod component;
mod resources;

pub use collection::EntityComponentCollection;
pub use component::{ComponentId, ComponentState, EntityComponent};
pub use resources::ResourceScope;

use std::sync::atomic::{AtomicU64, Ordering};

/// Stable unique identifier of an entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(u64);

impl EntityId {
    /// Allocate a fresh identifier
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Raw value
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Addressable object owning a component collection
pub trait Entity {
    /// Context handed to components on attach/detach
    type Context: ?Sized + 'static;

    /// Identifier of this entity
    fn entity_id(&self) -> EntityId;

    /// Components in registration order
    fn components(&self) -> &EntityComponentCollection<Self::Context>;

    /// Mutable access to the components
    fn components_mut(&mut self) -> &mut EntityComponentCollection<Self::Context>;
}

/// Implements the state and downcast accessors of [`EntityComponent`] for a
/// type holding its [`ComponentState`] in a field named `state`.
#[macro_export]
macro_rules! component_base {
    () => {
        fn state(&self) -> &$crate::entity::ComponentState {
            &self.state
        }

        fn state_mut(&mut self) -> &mut $crate::entity::ComponentState {
            &mut self.state
        }

        fn as_any(&self) -> &dyn ::std::any::Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
            self
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_ids_are_unique() {
        let a = EntityId::next();
        let b = EntityId::next();
        assert_ne!(a, b);
        assert!(b.raw() > a.raw());
    }
}
