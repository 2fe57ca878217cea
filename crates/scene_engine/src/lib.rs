//! # Scene Engine
//!
//! The logical core of a real-time 3D renderer: it decides what is drawn,
//! in what order, with what bounds, and what a pick ray hits.
//!
//! ## Features
//!
//! - **Scene graph**: arena-backed nodes with lazy hierarchical transforms
//! - **Node kinds**: mesh, batched mesh, line, point, billboard, light,
//!   environment map, depth prepass, X-ray post effect and group nodes
//! - **Components**: geometry, material, raster state, shadow, wireframe and
//!   post-effect state bound to a per-node render core
//! - **Bounds**: original and world-space box and sphere per node
//! - **Draw ordering**: render buckets and order keys that group nodes
//!   sharing a material
//! - **Hit testing**: ray tests against triangles, segments, points and
//!   billboards, accelerated by octrees
//!
//! ## Quick Start
//!
//! ```rust
//! use scene_engine::prelude::*;
//! use std::rc::Rc;
//!
//! let host: Rc<dyn RenderHost> = Rc::new(DefaultRenderHost::with_default_effects());
//! let mut graph = SceneGraph::default();
//! graph.attach(host);
//!
//! let mut cube = SceneNode::new(NodeType::Mesh)?;
//! cube.set_geometry(Some(Rc::new(Geometry3D::unit_cube())));
//! graph.insert(cube);
//!
//! let eye = Vec3::new(0.0, 0.0, 10.0);
//! let mut context = RenderContext::look_at(eye, Vec3::zeros(), 800.0, 600.0);
//! graph.update(&mut context);
//! graph.render(&mut context);
//! assert_eq!(graph.hit_test_pixel(&context, 400.0, 300.0).len(), 1);
//! # Ok::<(), SceneError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod entity;
pub mod error;
pub mod foundation;
pub mod geometry;
pub mod render;
pub mod scene;
pub mod spatial;

pub use error::{SceneError, SceneResult};

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        config::{Config, SceneConfig},
        entity::{Entity, EntityComponent, EntityId},
        error::{SceneError, SceneResult},
        foundation::math::{Color4, Mat4, Mat4Ext, Vec2, Vec3},
        geometry::{BatchedMeshGeometryConfig, Geometry3D, GeometryKind, HitResult},
        render::{
            DefaultRenderHost, DrawCommand, EffectAttributes, LightParams, Material, RenderContext,
            RenderHost, RenderType, XRaySettings,
        },
        scene::{FrameStats, NodeEvent, NodeType, SceneGraph, SceneNode},
        spatial::{BoundingBox, BoundingSphere, Ray},
    };
}
