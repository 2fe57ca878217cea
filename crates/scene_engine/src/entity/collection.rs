//! Ordered component storage with dispose-on-remove

use super::{ComponentId, EntityComponent, EntityId};

/// Ordered, owning collection of components for one entity
///
/// Lookup by type is a linear scan in insertion order; per-node component
/// counts are small.
pub struct EntityComponentCollection<C: ?Sized + 'static> {
    owner: Option<EntityId>,
    components: Vec<Box<dyn EntityComponent<C>>>,
}

impl<C: ?Sized + 'static> EntityComponentCollection<C> {
    /// Empty collection owned by `owner`
    pub fn new(owner: Option<EntityId>) -> Self {
        Self {
            owner,
            components: Vec::new(),
        }
    }

    /// Append a component, taking ownership
    pub fn add<T: EntityComponent<C>>(&mut self, component: T) -> ComponentId {
        let index = self.components.len();
        self.insert(index, component)
    }

    /// Insert a component at `index` (clamped to the current length)
    pub fn insert<T: EntityComponent<C>>(&mut self, index: usize, mut component: T) -> ComponentId {
        component.state_mut().set_entity(self.owner);
        let id = component.id();
        let index = index.min(self.components.len());
        self.components.insert(index, Box::new(component));
        id
    }

    /// Dispose and remove the component with `id`
    pub fn remove(&mut self, id: ComponentId) -> bool {
        match self.components.iter().position(|c| c.id() == id) {
            Some(index) => self.remove_at(index),
            None => false,
        }
    }

    /// Dispose and remove the component at `index`
    pub fn remove_at(&mut self, index: usize) -> bool {
        let Some(component) = self.components.get_mut(index) else {
            return false;
        };
        component.state_mut().resources_mut().dispose_and_clear();
        let mut removed = self.components.remove(index);
        removed.state_mut().set_entity(None);
        true
    }

    /// First component of type `T`, in insertion order
    pub fn get<T: EntityComponent<C>>(&self) -> Option<&T> {
        self.components
            .iter()
            .find_map(|c| c.as_ref().as_any().downcast_ref::<T>())
    }

    /// Mutable access to the first component of type `T`
    pub fn get_mut<T: EntityComponent<C>>(&mut self) -> Option<&mut T> {
        self.components
            .iter_mut()
            .find_map(|c| c.as_mut().as_any_mut().downcast_mut::<T>())
    }

    /// Component at `index`
    pub fn at(&self, index: usize) -> Option<&dyn EntityComponent<C>> {
        self.components.get(index).map(|c| c.as_ref())
    }

    /// Attach every component in registration order
    pub fn attach_all(&mut self, context: &mut C) {
        for component in &mut self.components {
            component.attach(context);
        }
    }

    /// Detach every component in registration order
    pub fn detach_all(&mut self, context: &mut C) {
        for component in &mut self.components {
            component.detach(context);
        }
    }

    /// Dispose and remove everything
    pub fn clear(&mut self) {
        for component in &mut self.components {
            component.state_mut().resources_mut().dispose_and_clear();
        }
        self.components.clear();
    }

    /// Number of components
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// True when empty
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Iterate in registration order
    pub fn iter(&self) -> impl Iterator<Item = &dyn EntityComponent<C>> {
        self.components.iter().map(|c| c.as_ref())
    }
}

impl<C: ?Sized + 'static> Default for EntityComponentCollection<C> {
    fn default() -> Self {
        Self::new(None)
    }
}

impl<C: ?Sized + 'static> Drop for EntityComponentCollection<C> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<C: ?Sized + 'static> std::fmt::Debug for EntityComponentCollection<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityComponentCollection")
            .field("owner", &self.owner)
            .field("len", &self.components.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component_base;
    use crate::entity::ComponentState;

    #[derive(Default)]
    struct Material {
        state: ComponentState,
    }

    #[derive(Default)]
    struct Shadow {
        state: ComponentState,
        casts: bool,
    }

    impl EntityComponent<()> for Material {
        component_base!();

        fn on_attach(&mut self, _: &mut ()) -> bool {
            self.state.resources_mut().collect(vec![0_u8; 16]);
            true
        }
    }

    impl EntityComponent<()> for Shadow {
        component_base!();
    }

    #[test]
    fn test_get_by_type_in_insertion_order() {
        let mut collection = EntityComponentCollection::<()>::new(Some(EntityId::next()));
        collection.add(Shadow { casts: true, ..Default::default() });
        collection.add(Shadow::default());
        collection.add(Material::default());

        assert!(collection.get::<Shadow>().unwrap().casts);
        assert!(collection.get::<Material>().is_some());
        assert_eq!(collection.len(), 3);
    }

    #[test]
    fn test_add_records_owner() {
        let owner = EntityId::next();
        let mut collection = EntityComponentCollection::<()>::new(Some(owner));
        collection.add(Material::default());
        assert_eq!(collection.at(0).unwrap().state().entity(), Some(owner));
    }

    #[test]
    fn test_remove_disposes_resources() {
        let mut collection = EntityComponentCollection::<()>::default();
        let id = collection.add(Material::default());
        collection.attach_all(&mut ());
        assert_eq!(collection.get::<Material>().unwrap().state().resources().len(), 1);

        assert!(collection.remove(id));
        assert!(!collection.remove(id));
        assert!(collection.get::<Material>().is_none());
    }

    #[test]
    fn test_insert_and_remove_at() {
        let mut collection = EntityComponentCollection::<()>::default();
        collection.add(Material::default());
        collection.insert(0, Shadow::default());
        assert!(collection.at(0).unwrap().as_any().is::<Shadow>());

        assert!(collection.remove_at(0));
        assert!(!collection.remove_at(5));
        assert!(collection.at(0).unwrap().as_any().is::<Material>());
    }

    #[test]
    fn test_clear() {
        let mut collection = EntityComponentCollection::<()>::default();
        collection.add(Material::default());
        collection.add(Shadow::default());
        collection.attach_all(&mut ());
        collection.clear();
        assert!(collection.is_empty());
    }
}
