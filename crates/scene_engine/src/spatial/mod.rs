//! Spatial data structures
//!
//! Bounding volumes, rays, the view frustum and a generic octree used by
//! culling and hit testing.

mod bounds;
mod octree;

pub use bounds::{BoundingBox, BoundingSphere, Frustum, Plane, Ray};
pub use octree::{Octree, OctreeItem, OctreeNode};
