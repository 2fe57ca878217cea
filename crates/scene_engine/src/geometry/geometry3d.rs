//! Vertex/index collections with cached bounds and an optional primitive octree

use crate::config::OctreeConfig;
use crate::foundation::math::{Mat4, Vec2, Vec3};
use crate::spatial::{BoundingBox, BoundingSphere, Octree};
use std::cell::OnceCell;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Unique identifier of a geometry instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GeometryId(u64);

impl GeometryId {
    fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Primitive layout of a geometry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryKind {
    /// Indexed triangle list
    Mesh,
    /// Indexed segment list, two indices per segment
    Line,
    /// One point per position
    Point,
    /// One quad per position, sized by `sizes`
    Billboard,
}

/// Geometry data shared between nodes
#[derive(Debug)]
pub struct Geometry3D {
    id: GeometryId,
    kind: GeometryKind,
    positions: Vec<Vec3>,
    indices: Vec<u32>,
    sizes: Vec<Vec2>,
    bound: BoundingBox,
    bound_sphere: BoundingSphere,
    octree: OnceCell<Octree<usize>>,
}

impl Geometry3D {
    fn build(
        kind: GeometryKind,
        positions: Vec<Vec3>,
        indices: Vec<u32>,
        sizes: Vec<Vec2>,
    ) -> Self {
        let bound = BoundingBox::from_points(&positions).unwrap_or_default();
        let bound_sphere = BoundingSphere::from_points(&positions).unwrap_or_default();
        Self {
            id: GeometryId::next(),
            kind,
            positions,
            indices,
            sizes,
            bound,
            bound_sphere,
            octree: OnceCell::new(),
        }
    }

    /// Indexed triangle mesh
    pub fn mesh(positions: Vec<Vec3>, indices: Vec<u32>) -> Self {
        Self::build(GeometryKind::Mesh, positions, indices, Vec::new())
    }

    /// Indexed line list
    pub fn lines(positions: Vec<Vec3>, indices: Vec<u32>) -> Self {
        Self::build(GeometryKind::Line, positions, indices, Vec::new())
    }

    /// Point cloud
    pub fn points(positions: Vec<Vec3>) -> Self {
        Self::build(GeometryKind::Point, positions, Vec::new(), Vec::new())
    }

    /// Billboards; a missing size entry defaults to the last one given, or 1x1
    pub fn billboards(positions: Vec<Vec3>, sizes: Vec<Vec2>) -> Self {
        Self::build(GeometryKind::Billboard, positions, Vec::new(), sizes)
    }

    /// Axis-aligned unit cube centered at the origin (8 vertices at ±0.5)
    pub fn unit_cube() -> Self {
        let positions = (0..8)
            .map(|i| {
                Vec3::new(
                    if i & 1 == 0 { -0.5 } else { 0.5 },
                    if i & 2 == 0 { -0.5 } else { 0.5 },
                    if i & 4 == 0 { -0.5 } else { 0.5 },
                )
            })
            .collect();
        let indices = vec![
            0, 2, 1, 1, 2, 3, // -z
            4, 5, 6, 5, 7, 6, // +z
            0, 1, 4, 1, 5, 4, // -y
            2, 6, 3, 3, 6, 7, // +y
            0, 4, 2, 2, 4, 6, // -x
            1, 3, 5, 3, 7, 5, // +x
        ];
        Self::mesh(positions, indices)
    }

    /// Unique id
    pub fn id(&self) -> GeometryId {
        self.id
    }

    /// Primitive layout
    pub fn kind(&self) -> GeometryKind {
        self.kind
    }

    /// Vertex positions
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    /// Index buffer
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    /// Billboard size for item `index`
    pub fn size(&self, index: usize) -> Vec2 {
        self.sizes
            .get(index)
            .or_else(|| self.sizes.last())
            .copied()
            .unwrap_or_else(|| Vec2::new(1.0, 1.0))
    }

    /// Local-space bounding box; the zero sentinel when empty
    pub fn bound(&self) -> BoundingBox {
        self.bound
    }

    /// Local-space bounding sphere; the zero sentinel when empty
    pub fn bound_sphere(&self) -> BoundingSphere {
        self.bound_sphere
    }

    /// Number of triangles, segments, points or billboards
    pub fn primitive_count(&self) -> usize {
        match self.kind {
            GeometryKind::Mesh => self.indices.len() / 3,
            GeometryKind::Line => self.indices.len() / 2,
            GeometryKind::Point | GeometryKind::Billboard => self.positions.len(),
        }
    }

    /// Vertex indices of triangle `index`
    pub fn triangle_indices(&self, index: usize) -> Option<[u32; 3]> {
        let slice = self.indices.get(index * 3..index * 3 + 3)?;
        Some([slice[0], slice[1], slice[2]])
    }

    /// Vertices of triangle `index`; `None` for out-of-range indices
    pub fn triangle(&self, index: usize) -> Option<[Vec3; 3]> {
        let [a, b, c] = self.triangle_indices(index)?;
        Some([
            *self.positions.get(a as usize)?,
            *self.positions.get(b as usize)?,
            *self.positions.get(c as usize)?,
        ])
    }

    /// Endpoints of segment `index`
    pub fn segment(&self, index: usize) -> Option<(Vec3, Vec3)> {
        let slice = self.indices.get(index * 2..index * 2 + 2)?;
        Some((
            *self.positions.get(slice[0] as usize)?,
            *self.positions.get(slice[1] as usize)?,
        ))
    }

    /// Representative position and radius of primitive `index`
    fn primitive_extent(&self, index: usize) -> Option<(Vec3, f32)> {
        match self.kind {
            GeometryKind::Mesh => {
                let [a, b, c] = self.triangle(index)?;
                let centroid = (a + b + c) / 3.0;
                let radius = [a, b, c]
                    .iter()
                    .map(|v| (v - centroid).magnitude())
                    .fold(0.0, f32::max);
                Some((centroid, radius))
            }
            GeometryKind::Line => {
                let (a, b) = self.segment(index)?;
                Some(((a + b) * 0.5, (b - a).magnitude() * 0.5))
            }
            GeometryKind::Point => Some((*self.positions.get(index)?, 0.0)),
            GeometryKind::Billboard => {
                Some((*self.positions.get(index)?, self.size(index).magnitude() * 0.5))
            }
        }
    }

    /// Build the primitive octree if not built yet; returns whether a tree exists
    pub fn update_octree(&self, config: &OctreeConfig) -> bool {
        if self.positions.is_empty() {
            return false;
        }
        self.octree.get_or_init(|| {
            let items = (0..self.primitive_count())
                .filter_map(|i| self.primitive_extent(i).map(|(p, r)| (i, p, r)));
            Octree::build(self.bound.expand(1e-3), config.clone(), items)
        });
        true
    }

    /// Whether the primitive octree has been built
    pub fn tree_built(&self) -> bool {
        self.octree.get().is_some()
    }

    /// The primitive octree, when built
    pub fn octree(&self) -> Option<&Octree<usize>> {
        self.octree.get()
    }
}

/// One source mesh inside a batched-mesh node
#[derive(Debug, Clone)]
pub struct BatchedMeshGeometryConfig {
    /// Source geometry
    pub geometry: Rc<Geometry3D>,
    /// Placement of this geometry inside the batch
    pub model_transform: Mat4,
    /// Index into the batch's material list
    pub material_index: usize,
}

impl BatchedMeshGeometryConfig {
    /// Config placing `geometry` with `model_transform` and the first material
    pub fn new(geometry: Rc<Geometry3D>, model_transform: Mat4) -> Self {
        Self {
            geometry,
            model_transform,
            material_index: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_cube_bounds() {
        let cube = Geometry3D::unit_cube();
        assert_eq!(cube.bound().min, Vec3::repeat(-0.5));
        assert_eq!(cube.bound().max, Vec3::repeat(0.5));
        assert_eq!(cube.primitive_count(), 12);
        assert!((cube.bound_sphere().radius - 0.75_f32.sqrt()).abs() < 1e-6);
    }

    #[test]
    fn test_empty_geometry_uses_zero_sentinel() {
        let empty = Geometry3D::points(Vec::new());
        assert!(empty.bound().is_zero());
        assert!(empty.bound_sphere().is_zero());
        assert!(!empty.update_octree(&OctreeConfig::default()));
    }

    #[test]
    fn test_out_of_range_indices_are_skipped() {
        let mesh = Geometry3D::mesh(vec![Vec3::zeros(), Vec3::x(), Vec3::y()], vec![0, 1, 7]);
        assert!(mesh.triangle(0).is_none());
        assert!(mesh.triangle(1).is_none());
    }

    #[test]
    fn test_octree_built_once() {
        let cube = Geometry3D::unit_cube();
        assert!(!cube.tree_built());
        assert!(cube.update_octree(&OctreeConfig::default()));
        assert!(cube.tree_built());
        assert_eq!(cube.octree().unwrap().item_count(), 12);
    }

    #[test]
    fn test_billboard_size_fallback() {
        let boards = Geometry3D::billboards(
            vec![Vec3::zeros(), Vec3::x()],
            vec![Vec2::new(2.0, 3.0)],
        );
        assert_eq!(boards.size(1), Vec2::new(2.0, 3.0));
        let unsized_billboard = Geometry3D::billboards(vec![Vec3::zeros()], Vec::new());
        assert_eq!(unsized_billboard.size(0), Vec2::new(1.0, 1.0));
    }
}
