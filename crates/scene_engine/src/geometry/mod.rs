//! Geometry payloads consumed by scene nodes
//!
//! Geometry is immutable once built and shared through `Rc`; replacing a
//! node's geometry means assigning a new `Rc<Geometry3D>`.

mod geometry3d;

pub use geometry3d::{BatchedMeshGeometryConfig, Geometry3D, GeometryId, GeometryKind};
pub use hit_test::{HitResult, HitTestParams};
