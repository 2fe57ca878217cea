//! Scene-level scenarios: a graph attached to a host and driven frame by frame

mod hit_testing;
mod lifecycle;
mod pipeline;

use super::{FrameStats, NodeType, SceneGraph, SceneNode};
use crate::config::SceneConfig;
use crate::foundation::collections::NodeKey;
use crate::foundation::math::{Mat4, Vec3};
use crate::geometry::Geometry3D;
use crate::render::{DefaultRenderHost, RenderContext, RenderHost};
use std::rc::Rc;

/// Graph attached to a default host, camera at +10 Z looking at the origin
struct Fixture {
    host: Rc<DefaultRenderHost>,
    graph: SceneGraph,
    context: RenderContext,
}

impl Fixture {
    fn new() -> Self {
        Self::with_config(SceneConfig::default())
    }

    fn with_config(config: SceneConfig) -> Self {
        let host = Rc::new(DefaultRenderHost::with_default_effects());
        let mut graph = SceneGraph::new(config);
        let shared: Rc<dyn RenderHost> = host.clone();
        graph.attach(shared);
        Self {
            host,
            graph,
            context: RenderContext::look_at(Vec3::new(0.0, 0.0, 10.0), Vec3::zeros(), 800.0, 600.0),
        }
    }

    fn add(&mut self, node: SceneNode, local: Mat4) -> NodeKey {
        let key = self.graph.insert(node);
        self.graph.set_transform(key, local).unwrap();
        key
    }

    fn add_cube(&mut self, local: Mat4) -> NodeKey {
        self.add(cube(), local)
    }

    fn frame(&mut self) -> FrameStats {
        self.context.begin_frame();
        self.graph.update(&mut self.context)
    }

    fn node(&self, key: NodeKey) -> &SceneNode {
        self.graph.get(key).unwrap()
    }

    fn node_mut(&mut self, key: NodeKey) -> &mut SceneNode {
        self.graph.get_mut(key).unwrap()
    }

    fn live_buffers(&self) -> usize {
        self.host.effects_manager().unwrap().geometry_buffers().live_buffers()
    }

    fn live_material_variables(&self) -> usize {
        self.host.effects_manager().unwrap().material_variables().live_variables()
    }
}

fn cube() -> SceneNode {
    let mut node = SceneNode::new(NodeType::Mesh).unwrap();
    node.set_geometry(Some(Rc::new(Geometry3D::unit_cube())));
    node
}
