//! Shared render resources: techniques, geometry buffers, material variables
//!
//! Buffer and material-variable handles are reference counted through the
//! manager's table; the last handle dropped releases the entry. Components
//! keep their handles in a [`crate::entity::ResourceScope`], so detaching a
//! node releases them deterministically.

use super::material::{Material, MaterialId};
use super::technique::{pass_names, technique_names, RenderTechnique};
use crate::entity::ComponentId;
use crate::geometry::GeometryId;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Identity of a GPU geometry buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BufferKey {
    /// Buffer built from a single geometry, shared by every node using it
    Geometry(GeometryId),
    /// Merged buffer owned by one batched-geometry component
    Batch(ComponentId),
}

type BufferTable = Rc<RefCell<HashMap<BufferKey, usize>>>;

/// Reference-counted geometry buffers
#[derive(Debug, Default)]
pub struct GeometryBufferManager {
    table: BufferTable,
}

impl GeometryBufferManager {
    /// Acquire (creating if needed) the buffer for `key`
    pub fn acquire(&self, key: BufferKey) -> GeometryBufferHandle {
        let mut table = self.table.borrow_mut();
        let count = table.entry(key).or_insert(0);
        if *count == 0 {
            log::trace!("creating geometry buffer {key:?}");
        }
        *count += 1;
        GeometryBufferHandle {
            key,
            table: Rc::clone(&self.table),
        }
    }

    /// Number of live buffers
    pub fn live_buffers(&self) -> usize {
        self.table.borrow().len()
    }

    /// Live handle count for `key`
    pub fn references(&self, key: BufferKey) -> usize {
        self.table.borrow().get(&key).copied().unwrap_or(0)
    }
}

/// Handle keeping a geometry buffer alive
#[derive(Debug)]
pub struct GeometryBufferHandle {
    key: BufferKey,
    table: BufferTable,
}

impl GeometryBufferHandle {
    /// Buffer identity
    pub fn key(&self) -> BufferKey {
        self.key
    }
}

impl Clone for GeometryBufferHandle {
    fn clone(&self) -> Self {
        if let Some(count) = self.table.borrow_mut().get_mut(&self.key) {
            *count += 1;
        }
        Self {
            key: self.key,
            table: Rc::clone(&self.table),
        }
    }
}

impl Drop for GeometryBufferHandle {
    fn drop(&mut self) {
        let mut table = self.table.borrow_mut();
        if let Some(count) = table.get_mut(&self.key) {
            *count -= 1;
            if *count == 0 {
                table.remove(&self.key);
                log::trace!("released geometry buffer {:?}", self.key);
            }
        }
    }
}

#[derive(Debug, Default)]
struct MaterialTable {
    entries: HashMap<(MaterialId, String), (u16, usize)>,
    next_id: u16,
}

impl MaterialTable {
    /// Next non-zero id not held by a live entry
    fn allocate_id(&mut self) -> u16 {
        for _ in 0..u16::MAX {
            self.next_id = self.next_id.wrapping_add(1).max(1);
            let candidate = self.next_id;
            if !self.entries.values().any(|(id, _)| *id == candidate) {
                return candidate;
            }
        }
        log::warn!("all material variable ids are live, sharing id {}", self.next_id);
        self.next_id
    }
}

/// Per-technique material variables with small integer ids for sorting
#[derive(Debug, Default)]
pub struct MaterialVariableManager {
    table: Rc<RefCell<MaterialTable>>,
}

impl MaterialVariableManager {
    /// Register `material` for `technique`; equal pairs share one id
    pub fn register(&self, material: &Material, technique: &str) -> MaterialVariable {
        let mut table = self.table.borrow_mut();
        let key = (material.id, technique.to_string());
        let id = match table.entries.get_mut(&key) {
            Some((id, refs)) => {
                *refs += 1;
                *id
            }
            None => {
                let id = table.allocate_id();
                table.entries.insert(key.clone(), (id, 1));
                id
            }
        };
        MaterialVariable {
            id,
            key,
            table: Rc::clone(&self.table),
        }
    }

    /// Number of live material variables
    pub fn live_variables(&self) -> usize {
        self.table.borrow().entries.len()
    }
}

/// Handle to a registered material variable
#[derive(Debug)]
pub struct MaterialVariable {
    id: u16,
    key: (MaterialId, String),
    table: Rc<RefCell<MaterialTable>>,
}

impl MaterialVariable {
    /// Sort id, never 0
    pub fn id(&self) -> u16 {
        self.id
    }

    /// Material this variable was created for
    pub fn material_id(&self) -> MaterialId {
        self.key.0
    }
}

impl Clone for MaterialVariable {
    fn clone(&self) -> Self {
        if let Some((_, refs)) = self.table.borrow_mut().entries.get_mut(&self.key) {
            *refs += 1;
        }
        Self {
            id: self.id,
            key: self.key.clone(),
            table: Rc::clone(&self.table),
        }
    }
}

impl Drop for MaterialVariable {
    fn drop(&mut self) {
        let mut table = self.table.borrow_mut();
        if let Some((_, refs)) = table.entries.get_mut(&self.key) {
            *refs -= 1;
            if *refs == 0 {
                table.entries.remove(&self.key);
            }
        }
    }
}

/// Resource manager handed out by a render host
#[derive(Debug, Default)]
pub struct EffectsManager {
    techniques: Vec<Rc<RenderTechnique>>,
    geometry_buffers: GeometryBufferManager,
    material_variables: MaterialVariableManager,
}

impl EffectsManager {
    /// Manager without techniques
    pub fn new() -> Self {
        Self::default()
    }

    /// Manager with the standard technique set
    pub fn with_default_techniques() -> Self {
        let mut manager = Self::new();
        manager.add_technique(RenderTechnique::new(
            technique_names::MESH,
            [
                pass_names::MESH_DEFAULT,
                pass_names::WIREFRAME,
                pass_names::SHADOW,
                pass_names::DEPTH_PREPASS,
                pass_names::XRAY_STENCIL,
                pass_names::XRAY,
            ],
        ));
        manager.add_technique(RenderTechnique::new(technique_names::POINTS, [pass_names::POINTS]));
        manager.add_technique(RenderTechnique::new(technique_names::LINES, [pass_names::LINES]));
        manager.add_technique(RenderTechnique::new(
            technique_names::BILLBOARD,
            [pass_names::BILLBOARD],
        ));
        manager.add_technique(RenderTechnique::new(
            technique_names::SKYBOX,
            [pass_names::SKYBOX, pass_names::SKY_DOME],
        ));
        manager.add_technique(RenderTechnique::new(technique_names::LIGHT, [pass_names::LIGHT]));
        manager
    }

    /// Register a technique, replacing one with the same name
    pub fn add_technique(&mut self, technique: RenderTechnique) -> Rc<RenderTechnique> {
        let technique = Rc::new(technique);
        match self.techniques.iter_mut().find(|t| t.name() == technique.name()) {
            Some(slot) => *slot = Rc::clone(&technique),
            None => self.techniques.push(Rc::clone(&technique)),
        }
        technique
    }

    /// Technique by name
    pub fn technique(&self, name: &str) -> Option<Rc<RenderTechnique>> {
        self.techniques.iter().find(|t| t.name() == name).cloned()
    }

    /// First registered technique
    pub fn first_technique(&self) -> Option<Rc<RenderTechnique>> {
        self.techniques.first().cloned()
    }

    /// Technique names in registration order
    pub fn technique_names(&self) -> impl Iterator<Item = &str> {
        self.techniques.iter().map(|t| t.name())
    }

    /// Geometry buffer manager
    pub fn geometry_buffers(&self) -> &GeometryBufferManager {
        &self.geometry_buffers
    }

    /// Material variable manager
    pub fn material_variables(&self) -> &MaterialVariableManager {
        &self.material_variables
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Geometry3D;

    #[test]
    fn test_geometry_buffers_are_shared_and_released() {
        let manager = GeometryBufferManager::default();
        let key = BufferKey::Geometry(Geometry3D::unit_cube().id());

        let a = manager.acquire(key);
        let b = manager.acquire(key);
        let c = a.clone();
        assert_eq!(manager.live_buffers(), 1);
        assert_eq!(manager.references(key), 3);

        drop(a);
        drop(b);
        assert_eq!(manager.live_buffers(), 1);
        drop(c);
        assert_eq!(manager.live_buffers(), 0);
    }

    #[test]
    fn test_material_variables_share_ids() {
        let manager = MaterialVariableManager::default();
        let red = Material::default().with_name("red");
        let blue = Material::default().with_name("blue");

        let a = manager.register(&red, technique_names::MESH);
        let b = manager.register(&red, technique_names::MESH);
        let c = manager.register(&blue, technique_names::MESH);
        let d = manager.register(&red, technique_names::POINTS);
        assert_eq!(a.id(), b.id());
        assert_ne!(a.id(), c.id());
        assert_ne!(a.id(), d.id());
        assert_ne!(a.id(), 0);
        assert_eq!(manager.live_variables(), 3);

        drop((a, b, c, d));
        assert_eq!(manager.live_variables(), 0);
    }

    #[test]
    fn test_wrapped_ids_skip_live_variables() {
        let manager = MaterialVariableManager::default();
        let red = manager.register(&Material::default().with_name("red"), technique_names::MESH);
        assert_eq!(red.id(), 1);

        manager.table.borrow_mut().next_id = u16::MAX - 1;
        let blue = manager.register(&Material::default().with_name("blue"), technique_names::MESH);
        let green =
            manager.register(&Material::default().with_name("green"), technique_names::MESH);
        assert_eq!(blue.id(), u16::MAX);
        assert_eq!(green.id(), 2);
        assert_eq!(manager.live_variables(), 3);
    }

    #[test]
    fn test_default_techniques() {
        let manager = EffectsManager::with_default_techniques();
        assert_eq!(manager.first_technique().unwrap().name(), technique_names::MESH);
        assert!(manager.technique(technique_names::POINTS).is_some());
        assert!(manager.technique("Missing").is_none());
        assert!(manager
            .technique(technique_names::MESH)
            .unwrap()
            .has_pass(pass_names::SHADOW));
    }

    #[test]
    fn test_add_technique_replaces_by_name() {
        let mut manager = EffectsManager::new();
        manager.add_technique(RenderTechnique::new("Custom", ["A"]));
        manager.add_technique(RenderTechnique::new("Custom", ["B"]));
        assert_eq!(manager.technique_names().count(), 1);
        assert!(manager.technique("Custom").unwrap().has_pass("B"));
    }
}
