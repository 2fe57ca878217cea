//! Geometry binding of mesh, point, line and billboard nodes

use super::bound_manager::{BoundSource, GeometryBoundManager};
use super::require;
use crate::component_base;
use crate::entity::{ComponentState, EntityComponent};
use crate::error::SceneResult;
use crate::foundation::math::Mat4;
use crate::geometry::Geometry3D;
use crate::render::{BufferKey, CoreBinding, CoreCapabilities, GeometryBufferHandle};
use std::rc::Rc;

/// Geometry, instances and bounds of one node
///
/// A GPU buffer is acquired on attach only when the geometry passes the
/// node kind's validity predicate. The handle lives in the component's
/// resource scope and is released on detach.
#[derive(Debug)]
pub struct GeometryComponent {
    state: ComponentState,
    geometry: Option<Rc<Geometry3D>>,
    instances: Vec<Mat4>,
    bounds: GeometryBoundManager,
    frustum_check: bool,
}

impl GeometryComponent {
    /// Component validating geometries with `predicate`
    pub fn new(
        capabilities: CoreCapabilities,
        predicate: fn(&Geometry3D) -> bool,
    ) -> SceneResult<Self> {
        require(capabilities, CoreCapabilities::GEOMETRY, "GeometryComponent")?;
        Ok(Self {
            state: ComponentState::new(),
            geometry: None,
            instances: Vec::new(),
            bounds: GeometryBoundManager::new(predicate),
            frustum_check: true,
        })
    }

    /// Assigned geometry, valid or not
    pub fn geometry(&self) -> Option<&Rc<Geometry3D>> {
        self.geometry.as_ref()
    }

    /// Assigned geometry if it passed validation
    pub fn valid_geometry(&self) -> Option<&Rc<Geometry3D>> {
        self.geometry.as_ref().filter(|_| self.bounds.is_valid())
    }

    /// Whether the geometry passed validation
    pub fn is_valid(&self) -> bool {
        self.bounds.is_valid()
    }

    /// Per-instance matrices
    pub fn instances(&self) -> &[Mat4] {
        &self.instances
    }

    /// Bounds
    pub fn bounds(&self) -> &GeometryBoundManager {
        &self.bounds
    }

    /// Mutable bounds
    pub fn bounds_mut(&mut self) -> &mut GeometryBoundManager {
        &mut self.bounds
    }

    /// Whether the node takes part in frustum culling
    pub fn frustum_check(&self) -> bool {
        self.frustum_check
    }

    /// Toggle frustum culling for the node
    pub fn set_frustum_check(&mut self, enabled: bool) {
        self.frustum_check = enabled;
    }

    /// Replace the geometry, recompute bounds and rebind when attached
    pub fn set_geometry(
        &mut self,
        geometry: Option<Rc<Geometry3D>>,
        total: &Mat4,
        binding: Option<&mut CoreBinding>,
    ) {
        self.geometry = geometry;
        self.bounds.check(self.geometry.as_deref());
        self.refresh_bounds(total);
        if let Some(binding) = binding.filter(|_| self.state.is_attached()) {
            self.release_buffer(binding);
            self.bind_buffer(binding);
        }
    }

    /// Replace the instance matrices
    pub fn set_instances(
        &mut self,
        instances: Vec<Mat4>,
        total: &Mat4,
        binding: Option<&mut CoreBinding>,
    ) {
        self.instances = instances;
        self.refresh_bounds(total);
        if let Some(binding) = binding.filter(|_| self.state.is_attached()) {
            if let Some(core) = binding.core.geometry() {
                core.set_instances(self.instances.clone());
            }
        }
    }

    /// Recompute transformed bounds after a transform change
    pub fn update_transformed(&mut self, total: &Mat4) {
        self.bounds.update_transformed(total);
    }

    fn refresh_bounds(&mut self, total: &Mat4) {
        let source = match self.geometry.as_deref() {
            Some(geometry) => BoundSource::Single {
                geometry,
                instances: &self.instances,
            },
            None => BoundSource::None,
        };
        self.bounds.update(source, total);
    }

    fn bind_buffer(&mut self, binding: &mut CoreBinding) {
        let Some(geometry) = self.valid_geometry() else {
            return;
        };
        let Some(effects) = binding.effects.as_ref() else {
            return;
        };
        let handle = effects.geometry_buffers().acquire(BufferKey::Geometry(geometry.id()));
        if let Some(core) = binding.core.geometry() {
            core.set_geometry_buffer(Some(handle.clone()));
            core.set_instances(self.instances.clone());
        }
        self.state.resources_mut().collect(handle);
    }

    fn release_buffer(&mut self, binding: &mut CoreBinding) {
        if let Some(core) = binding.core.geometry() {
            core.set_geometry_buffer(None);
        }
        drop(self.state.resources_mut().take::<GeometryBufferHandle>());
    }
}

impl EntityComponent<CoreBinding> for GeometryComponent {
    component_base!();

    fn on_attach(&mut self, binding: &mut CoreBinding) -> bool {
        self.bind_buffer(binding);
        true
    }

    fn on_detach(&mut self, binding: &mut CoreBinding) {
        if let Some(core) = binding.core.geometry() {
            core.set_geometry_buffer(None);
            core.set_instances(Vec::new());
        }
    }
}
