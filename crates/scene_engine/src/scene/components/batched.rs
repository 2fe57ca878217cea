//! Merged multi-geometry binding of batched-mesh nodes

use super::bound_manager::{BoundSource, GeometryBoundManager};
use super::require;
use crate::component_base;
use crate::config::OctreeConfig;
use crate::entity::{ComponentState, EntityComponent};
use crate::error::SceneResult;
use crate::foundation::math::Mat4;
use crate::geometry::{BatchedMeshGeometryConfig, Geometry3D, HitResult, HitTestParams};
use crate::render::{BufferKey, CoreBinding, CoreCapabilities, GeometryBufferHandle};
use crate::spatial::{Octree, Ray};

/// Sub-geometries merged into one GPU buffer
///
/// The merged buffer is keyed by this component, so every batch owns its
/// own buffer. Hit tests still resolve to the individual sub-geometry.
#[derive(Debug)]
pub struct BatchedGeometryComponent {
    state: ComponentState,
    configs: Vec<BatchedMeshGeometryConfig>,
    bounds: GeometryBoundManager,
    octree: Option<Octree<usize>>,
}

impl BatchedGeometryComponent {
    /// Empty batch validating sub-geometries with `predicate`
    pub fn new(
        capabilities: CoreCapabilities,
        predicate: fn(&Geometry3D) -> bool,
    ) -> SceneResult<Self> {
        require(capabilities, CoreCapabilities::GEOMETRY, "BatchedGeometryComponent")?;
        Ok(Self {
            state: ComponentState::new(),
            configs: Vec::new(),
            bounds: GeometryBoundManager::new(predicate),
            octree: None,
        })
    }

    /// Sub-geometries
    pub fn configs(&self) -> &[BatchedMeshGeometryConfig] {
        &self.configs
    }

    /// Whether at least one sub-geometry is valid
    pub fn is_valid(&self) -> bool {
        self.bounds.is_valid()
    }

    /// Bounds
    pub fn bounds(&self) -> &GeometryBoundManager {
        &self.bounds
    }

    /// Mutable bounds
    pub fn bounds_mut(&mut self) -> &mut GeometryBoundManager {
        &mut self.bounds
    }

    /// Replace the sub-geometries, recompute bounds and rebind when attached
    pub fn set_configs(
        &mut self,
        configs: Vec<BatchedMeshGeometryConfig>,
        total: &Mat4,
        binding: Option<&mut CoreBinding>,
    ) {
        self.configs = configs;
        self.octree = None;
        self.bounds.check_batch(&self.configs);
        self.bounds.update(BoundSource::Batch(&self.configs), total);
        if let Some(binding) = binding.filter(|_| self.state.is_attached()) {
            if let Some(core) = binding.core.geometry() {
                core.set_geometry_buffer(None);
            }
            drop(self.state.resources_mut().take::<GeometryBufferHandle>());
            self.bind_buffer(binding);
        }
    }

    /// Recompute transformed bounds after a transform change
    pub fn update_transformed(&mut self, total: &Mat4) {
        self.bounds.update_transformed(total);
    }

    /// Build the sub-geometry octree if not built; returns whether one exists
    pub fn update_octree(&mut self, config: &OctreeConfig) -> bool {
        if self.octree.is_some() {
            return true;
        }
        if self.configs.is_empty() || self.bounds.bound().is_zero() {
            return false;
        }
        let bounds = &self.bounds;
        let items = self
            .configs
            .iter()
            .enumerate()
            .filter(|(_, c)| bounds.accepts(&c.geometry))
            .map(|(index, c)| {
                let placed = c.geometry.bound().transform(&c.model_transform);
                (index, placed.center(), placed.extents().magnitude())
            });
        self.octree = Some(Octree::build(self.bounds.bound().expand(1e-3), config.clone(), items));
        true
    }

    /// Whether the sub-geometry octree is built
    pub fn tree_built(&self) -> bool {
        self.octree.is_some()
    }

    /// Nearest hit over all sub-geometries placed by `total`
    pub fn hit_test(&self, total: &Mat4, ray: &Ray, params: &HitTestParams) -> Option<HitResult> {
        let candidates: Vec<usize> = match &self.octree {
            Some(tree) => {
                let local_ray = ray.transform(&total.try_inverse()?);
                let mut indices: Vec<usize> =
                    tree.query_ray(&local_ray).iter().map(|i| i.value).collect();
                indices.sort_unstable();
                indices
            }
            None => (0..self.configs.len()).collect(),
        };

        let mut best: Option<HitResult> = None;
        for index in candidates {
            let config = self.configs.get(index).filter(|c| self.bounds.accepts(&c.geometry));
            let Some(config) = config else {
                continue;
            };
            let model = total * config.model_transform;
            let Some(mut hit) = config.geometry.hit_test(&model, ray, params) else {
                continue;
            };
            if best.as_ref().is_some_and(|b| b.distance <= hit.distance) {
                continue;
            }
            hit.sub_geometry = Some(index);
            best = Some(hit);
        }
        best
    }

    fn bind_buffer(&mut self, binding: &mut CoreBinding) {
        if !self.bounds.is_valid() {
            return;
        }
        let Some(effects) = binding.effects.as_ref() else {
            return;
        };
        let handle = effects.geometry_buffers().acquire(BufferKey::Batch(self.id()));
        if let Some(core) = binding.core.geometry() {
            core.set_geometry_buffer(Some(handle.clone()));
        }
        self.state.resources_mut().collect(handle);
    }
}

impl EntityComponent<CoreBinding> for BatchedGeometryComponent {
    component_base!();

    fn on_attach(&mut self, binding: &mut CoreBinding) -> bool {
        self.bind_buffer(binding);
        true
    }

    fn on_detach(&mut self, binding: &mut CoreBinding) {
        if let Some(core) = binding.core.geometry() {
            core.set_geometry_buffer(None);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Mat4Ext, Vec3};
    use crate::render::core::MeshCore;
    use approx::assert_relative_eq;
    use std::rc::Rc;

    fn mesh(g: &Geometry3D) -> bool {
        !g.indices().is_empty()
    }

    fn whole_triangles(g: &Geometry3D) -> bool {
        mesh(g) && g.indices().len() % 3 == 0
    }

    fn params() -> HitTestParams {
        HitTestParams {
            screen_view_projection: Mat4::identity(),
            thickness: 1.0,
            fixed_size: false,
        }
    }

    fn batch() -> BatchedGeometryComponent {
        let cube = Rc::new(Geometry3D::unit_cube());
        let mut component = BatchedGeometryComponent::new(MeshCore::CAPABILITIES, mesh).unwrap();
        component.set_configs(
            vec![
                BatchedMeshGeometryConfig::new(Rc::clone(&cube), Mat4::translation(-3.0, 0.0, 0.0)),
                BatchedMeshGeometryConfig::new(cube, Mat4::translation(3.0, 0.0, 0.0)),
            ],
            &Mat4::identity(),
            None,
        );
        component
    }

    #[test]
    fn test_hit_reports_sub_geometry() {
        let component = batch();
        let ray = Ray::new(Vec3::new(3.1, 0.2, 10.0), -Vec3::z());
        let hit = component.hit_test(&Mat4::identity(), &ray, &params()).unwrap();
        assert_eq!(hit.sub_geometry, Some(1));
        assert_relative_eq!(hit.point, Vec3::new(3.1, 0.2, 0.5), epsilon = 1e-4);
    }

    #[test]
    fn test_hit_through_node_transform_and_octree() {
        let mut component = batch();
        assert!(component.update_octree(&OctreeConfig::default()));
        let total = Mat4::translation(0.0, 5.0, 0.0);
        let ray = Ray::new(Vec3::new(-2.9, 5.2, 10.0), -Vec3::z());
        let hit = component.hit_test(&total, &ray, &params()).unwrap();
        assert_eq!(hit.sub_geometry, Some(0));

        let miss = Ray::new(Vec3::new(0.0, 5.0, 10.0), -Vec3::z());
        assert!(component.hit_test(&total, &miss, &params()).is_none());
    }

    #[test]
    fn test_rejected_sub_geometry_never_hit() {
        let strip = Rc::new(Geometry3D::mesh(
            vec![Vec3::new(-1.0, -1.0, 0.0), Vec3::new(1.0, -1.0, 0.0), Vec3::new(0.0, 1.0, 0.0)],
            vec![0, 1, 2, 0],
        ));
        let mut component =
            BatchedGeometryComponent::new(MeshCore::CAPABILITIES, whole_triangles).unwrap();
        component.set_configs(
            vec![
                BatchedMeshGeometryConfig::new(
                    Rc::new(Geometry3D::unit_cube()),
                    Mat4::translation(3.0, 0.0, 0.0),
                ),
                BatchedMeshGeometryConfig::new(strip, Mat4::identity()),
            ],
            &Mat4::identity(),
            None,
        );
        assert!(component.is_valid());
        let ray = Ray::new(Vec3::new(0.0, 0.0, 10.0), -Vec3::z());
        assert!(component.hit_test(&Mat4::identity(), &ray, &params()).is_none());

        assert!(component.update_octree(&OctreeConfig::default()));
        assert!(component.hit_test(&Mat4::identity(), &ray, &params()).is_none());
        assert_relative_eq!(component.bounds().bound().min, Vec3::new(2.5, -0.5, -0.5));
    }
}
