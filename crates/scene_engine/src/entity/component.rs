//! Attachable unit of state and behaviour

use super::{EntityId, ResourceScope};
use std::any::Any;
use std::sync::atomic::{AtomicU64, Ordering};

/// Unique identifier of a component instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ComponentId(u64);

impl ComponentId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Bookkeeping shared by every component
#[derive(Debug)]
pub struct ComponentState {
    id: ComponentId,
    attached: bool,
    entity: Option<EntityId>,
    resources: ResourceScope,
}

impl ComponentState {
    /// Fresh, detached state with a new id
    pub fn new() -> Self {
        Self {
            id: ComponentId::next(),
            attached: false,
            entity: None,
            resources: ResourceScope::new(),
        }
    }

    /// Component id
    pub const fn id(&self) -> ComponentId {
        self.id
    }

    /// Whether the component is attached
    pub const fn is_attached(&self) -> bool {
        self.attached
    }

    /// Owning entity, if registered with one
    pub const fn entity(&self) -> Option<EntityId> {
        self.entity
    }

    /// Record the owning entity
    pub fn set_entity(&mut self, entity: Option<EntityId>) {
        self.entity = entity;
    }

    /// Resources released on detach
    pub const fn resources(&self) -> &ResourceScope {
        &self.resources
    }

    /// Mutable access to the resources released on detach
    pub fn resources_mut(&mut self) -> &mut ResourceScope {
        &mut self.resources
    }
}

impl Default for ComponentState {
    fn default() -> Self {
        Self::new()
    }
}

/// Unit of behaviour attached to exactly one entity at a time
///
/// `attach` and `detach` are idempotent. Implementors override the
/// `on_attach`/`on_detach` hooks; anything collected into the state's
/// [`ResourceScope`] is released after `on_detach` runs.
pub trait EntityComponent<C: ?Sized>: Any {
    /// Shared bookkeeping
    fn state(&self) -> &ComponentState;

    /// Mutable shared bookkeeping
    fn state_mut(&mut self) -> &mut ComponentState;

    /// Downcast support
    fn as_any(&self) -> &dyn Any;

    /// Mutable downcast support
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Attach hook; returning false leaves the component detached and
    /// releases whatever it collected
    fn on_attach(&mut self, _context: &mut C) -> bool {
        true
    }

    /// Detach hook
    fn on_detach(&mut self, _context: &mut C) {}

    /// Attach to the context; no-op when already attached
    fn attach(&mut self, context: &mut C) {
        if self.state().is_attached() {
            return;
        }
        let attached = self.on_attach(context);
        self.state_mut().attached = attached;
        if !attached {
            self.state_mut().resources.dispose_and_clear();
        }
    }

    /// Detach and release owned resources; no-op when not attached
    fn detach(&mut self, context: &mut C) {
        if !self.state().is_attached() {
            return;
        }
        self.state_mut().attached = false;
        self.on_detach(context);
        self.state_mut().resources.dispose_and_clear();
    }

    /// Component id
    fn id(&self) -> ComponentId {
        self.state().id()
    }

    /// Whether the component is attached
    fn is_attached(&self) -> bool {
        self.state().is_attached()
    }
}
