//! Geometry and world bounds of a node

use crate::foundation::math::Mat4;
use crate::geometry::{BatchedMeshGeometryConfig, Geometry3D};
use crate::scene::events::NodeEvent;
use crate::spatial::{BoundingBox, BoundingSphere};

/// What original bounds are derived from
#[derive(Debug, Clone, Copy)]
pub enum BoundSource<'a> {
    /// No usable geometry
    None,
    /// One geometry, optionally instanced
    Single {
        /// Geometry
        geometry: &'a Geometry3D,
        /// Per-instance matrices; empty when not instanced
        instances: &'a [Mat4],
    },
    /// Merged sub-geometries of a batch
    Batch(&'a [BatchedMeshGeometryConfig]),
}

/// Owns the original and transformed bounds of one node
///
/// Recomputation runs in two phases: original bounds from the geometry,
/// then transformed bounds from the node's total transform. Each phase
/// queues its change events before the next phase starts. The zero-sized
/// box and sphere at the origin stand for "no geometry".
#[derive(Debug, Clone)]
pub struct GeometryBoundManager {
    predicate: fn(&Geometry3D) -> bool,
    valid: bool,
    bound: BoundingBox,
    bound_sphere: BoundingSphere,
    transform_bound: BoundingBox,
    transform_bound_sphere: BoundingSphere,
    events: Vec<NodeEvent>,
}

impl GeometryBoundManager {
    /// Manager accepting geometries for which `predicate` holds
    pub fn new(predicate: fn(&Geometry3D) -> bool) -> Self {
        Self {
            predicate,
            valid: false,
            bound: BoundingBox::zero(),
            bound_sphere: BoundingSphere::zero(),
            transform_bound: BoundingBox::zero(),
            transform_bound_sphere: BoundingSphere::zero(),
            events: Vec::new(),
        }
    }

    /// Run the validity predicate and remember the outcome
    pub fn check(&mut self, geometry: Option<&Geometry3D>) -> bool {
        self.valid = geometry.is_some_and(|g| (self.predicate)(g));
        self.valid
    }

    /// Mark a batch valid when it has at least one valid sub-geometry
    pub fn check_batch(&mut self, configs: &[BatchedMeshGeometryConfig]) -> bool {
        self.valid = configs.iter().any(|c| self.accepts(&c.geometry));
        self.valid
    }

    /// Whether `geometry` passes the validity predicate
    pub fn accepts(&self, geometry: &Geometry3D) -> bool {
        (self.predicate)(geometry)
    }

    /// Result of the last validity check
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Recompute both phases
    pub fn update(&mut self, source: BoundSource<'_>, total: &Mat4) {
        let (bound, sphere) = if self.valid {
            self.original_bounds(source)
        } else {
            (BoundingBox::zero(), BoundingSphere::zero())
        };
        self.set_original(bound, sphere);
        self.update_transformed(total);
    }

    /// Recompute transformed bounds only
    pub fn update_transformed(&mut self, total: &Mat4) {
        let (bound, sphere) = if self.bound.is_zero() && self.bound_sphere.is_zero() {
            (BoundingBox::zero(), BoundingSphere::zero())
        } else {
            (self.bound.transform(total), self.bound_sphere.transform(total))
        };
        let old = std::mem::replace(&mut self.transform_bound, bound);
        if old != bound {
            self.events.push(NodeEvent::TransformBoundChanged { old, new: bound });
        }
        let old = std::mem::replace(&mut self.transform_bound_sphere, sphere);
        if old != sphere {
            self.events.push(NodeEvent::TransformBoundSphereChanged { old, new: sphere });
        }
    }

    fn set_original(&mut self, bound: BoundingBox, sphere: BoundingSphere) {
        let old = std::mem::replace(&mut self.bound, bound);
        if old != bound {
            self.events.push(NodeEvent::BoundChanged { old, new: bound });
        }
        let old = std::mem::replace(&mut self.bound_sphere, sphere);
        if old != sphere {
            self.events.push(NodeEvent::BoundSphereChanged { old, new: sphere });
        }
    }

    fn original_bounds(&self, source: BoundSource<'_>) -> (BoundingBox, BoundingSphere) {
        let placed: Vec<(BoundingBox, BoundingSphere)> = match source {
            BoundSource::None => Vec::new(),
            BoundSource::Single { geometry, instances } if instances.is_empty() => {
                vec![(geometry.bound(), geometry.bound_sphere())]
            }
            BoundSource::Single { geometry, instances } => instances
                .iter()
                .map(|m| (geometry.bound().transform(m), geometry.bound_sphere().transform(m)))
                .collect(),
            BoundSource::Batch(configs) => configs
                .iter()
                .filter(|c| self.accepts(&c.geometry))
                .map(|c| {
                    (
                        c.geometry.bound().transform(&c.model_transform),
                        c.geometry.bound_sphere().transform(&c.model_transform),
                    )
                })
                .collect(),
        };
        placed
            .into_iter()
            .reduce(|(ab, asph), (bb, bsph)| (ab.merge(&bb), asph.merge(&bsph)))
            .unwrap_or_else(|| (BoundingBox::zero(), BoundingSphere::zero()))
    }

    /// Geometry-space box
    pub fn bound(&self) -> BoundingBox {
        self.bound
    }

    /// Geometry-space sphere
    pub fn bound_sphere(&self) -> BoundingSphere {
        self.bound_sphere
    }

    /// World-space box
    pub fn transform_bound(&self) -> BoundingBox {
        self.transform_bound
    }

    /// World-space sphere
    pub fn transform_bound_sphere(&self) -> BoundingSphere {
        self.transform_bound_sphere
    }

    /// Drain queued change events
    pub fn take_events(&mut self) -> Vec<NodeEvent> {
        std::mem::take(&mut self.events)
    }
}
