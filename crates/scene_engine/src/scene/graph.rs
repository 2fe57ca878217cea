//! Scene graph: node storage, the per-frame pipeline and hit testing

use super::events::{sort_for_delivery, SceneEvent, SceneObserver};
use super::node::SceneNode;
use super::transform::TransformTree;
use crate::config::SceneConfig;
use crate::entity::EntityId;
use crate::error::{SceneError, SceneResult};
use crate::foundation::collections::{NodeKey, SecondaryMap, SlotMap, TransformKey};
use crate::foundation::logging::{debug, info, trace};
use crate::foundation::math::Mat4;
use crate::geometry::HitResult;
use crate::render::{RenderContext, RenderHost, RenderType};
use crate::spatial::{BoundingBox, Octree, Ray};
use std::rc::Rc;

/// Counters of one [`SceneGraph::update`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    /// Transforms whose total changed
    pub transforms_changed: usize,
    /// Nodes renderable this frame
    pub renderable: usize,
    /// Renderable nodes rejected by the frustum
    pub culled: usize,
    /// Notifications delivered
    pub events: usize,
}

/// Owns the nodes of a scene and drives them frame by frame
///
/// Per frame, [`SceneGraph::update`] runs transform propagation, bound
/// recomputation, event delivery, frustum culling and renderable-list
/// construction in that order. [`SceneGraph::render`] then submits the
/// renderable list bucket by bucket.
pub struct SceneGraph {
    config: SceneConfig,
    nodes: SlotMap<NodeKey, SceneNode>,
    transforms: TransformTree,
    owners: SecondaryMap<TransformKey, NodeKey>,
    parents: SecondaryMap<NodeKey, NodeKey>,
    roots: Vec<NodeKey>,
    host: Option<Rc<dyn RenderHost>>,
    observers: Vec<SceneObserver>,
    index: Option<Octree<NodeKey>>,
    index_dirty: bool,
    renderables: Vec<NodeKey>,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new(SceneConfig::default())
    }
}

impl SceneGraph {
    /// Empty graph
    pub fn new(config: SceneConfig) -> Self {
        Self {
            config,
            nodes: SlotMap::with_key(),
            transforms: TransformTree::new(),
            owners: SecondaryMap::new(),
            parents: SecondaryMap::new(),
            roots: Vec::new(),
            host: None,
            observers: Vec::new(),
            index: None,
            index_dirty: true,
            renderables: Vec::new(),
        }
    }

    /// Configuration
    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the graph has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node by key
    pub fn get(&self, key: NodeKey) -> Option<&SceneNode> {
        self.nodes.get(key)
    }

    /// Mutable node by key
    pub fn get_mut(&mut self, key: NodeKey) -> Option<&mut SceneNode> {
        self.nodes.get_mut(key)
    }

    /// Key of the node with `id`
    pub fn find(&self, id: EntityId) -> Option<NodeKey> {
        self.nodes.iter().find(|(_, n)| n.id() == id).map(|(key, _)| key)
    }

    /// Nodes without a parent, in insertion order
    pub fn roots(&self) -> &[NodeKey] {
        &self.roots
    }

    /// Parent node of `key`
    pub fn parent(&self, key: NodeKey) -> Option<NodeKey> {
        self.parents.get(key).copied()
    }

    /// All nodes
    pub fn iter(&self) -> impl Iterator<Item = (NodeKey, &SceneNode)> {
        self.nodes.iter()
    }

    /// Renderable list built by the last update
    pub fn renderables(&self) -> &[NodeKey] {
        &self.renderables
    }

    /// Attached host
    pub fn host(&self) -> Option<&Rc<dyn RenderHost>> {
        self.host.as_ref()
    }

    /// Register an observer of every node's notifications
    pub fn subscribe(&mut self, observer: SceneObserver) {
        self.observers.push(observer);
    }

    // ---- structure ----

    /// Add a root node, attaching it when the graph has a host
    pub fn insert(&mut self, mut node: SceneNode) -> NodeKey {
        let transform = self.transforms.insert(Mat4::identity());
        node.set_transform_key(Some(transform));
        if let Some(host) = &self.host {
            node.attach(host);
        }
        let key = self.nodes.insert(node);
        self.owners.insert(transform, key);
        self.roots.push(key);
        self.index_dirty = true;
        key
    }

    /// Make `child` an item of `parent`, inheriting its transform
    ///
    /// Fails when `child` already has a different parent.
    pub fn add_child(&mut self, parent: NodeKey, child: NodeKey) -> SceneResult<()> {
        let parent_transform = self.transform_key(parent)?;
        let child_transform = self.transform_key(child)?;
        if self.parents.get(child) == Some(&parent) {
            return Ok(());
        }
        self.transforms.add_child(parent_transform, child_transform)?;
        self.roots.retain(|k| *k != child);
        self.parents.insert(child, parent);
        if let Some(node) = self.nodes.get_mut(parent) {
            node.items_mut().push(child);
        }
        self.invalidate_scene_graph();
        Ok(())
    }

    /// Detach `child` from `parent`; it becomes a root
    pub fn remove_child(&mut self, parent: NodeKey, child: NodeKey) -> bool {
        let (Ok(parent_transform), Ok(child_transform)) =
            (self.transform_key(parent), self.transform_key(child))
        else {
            return false;
        };
        if !self.transforms.remove_child(parent_transform, child_transform) {
            return false;
        }
        self.parents.remove(child);
        if let Some(node) = self.nodes.get_mut(parent) {
            node.items_mut().retain(|k| *k != child);
        }
        self.roots.push(child);
        self.invalidate_scene_graph();
        true
    }

    /// Remove a node, detaching it; its items become roots
    pub fn remove(&mut self, key: NodeKey) -> Option<SceneNode> {
        if let Some(parent) = self.parents.get(key).copied() {
            self.remove_child(parent, key);
        }
        let mut node = self.nodes.remove(key)?;
        node.detach();
        flush_node_events(key, &mut node, &mut self.observers);
        if let Some(transform) = node.transform_key() {
            self.transforms.remove(transform);
            self.owners.remove(transform);
        }
        node.set_transform_key(None);
        for item in std::mem::take(node.items_mut()) {
            self.parents.remove(item);
            self.roots.push(item);
        }
        self.roots.retain(|k| *k != key);
        self.renderables.retain(|k| *k != key);
        self.index_dirty = true;
        self.invalidate_scene_graph();
        Some(node)
    }

    /// Detach and drop every node
    pub fn clear(&mut self) {
        for (key, node) in &mut self.nodes {
            node.detach();
            flush_node_events(key, node, &mut self.observers);
            node.dispose();
        }
        self.nodes.clear();
        self.transforms = TransformTree::new();
        self.owners.clear();
        self.parents.clear();
        self.roots.clear();
        self.renderables.clear();
        self.index = None;
        self.index_dirty = true;
        info!("scene cleared");
    }

    // ---- transforms ----

    /// Local matrix of `key`
    pub fn local_transform(&self, key: NodeKey) -> Option<Mat4> {
        let transform = self.nodes.get(key)?.transform_key()?;
        self.transforms.get(transform).map(|t| *t.local())
    }

    /// Replace the local matrix of `key`; applied on the next update
    pub fn set_transform(&mut self, key: NodeKey, local: Mat4) -> SceneResult<()> {
        let transform = self.transform_key(key)?;
        self.transforms.set_local(transform, local)?;
        self.invalidate_render();
        Ok(())
    }

    fn transform_key(&self, key: NodeKey) -> SceneResult<TransformKey> {
        self.nodes
            .get(key)
            .and_then(SceneNode::transform_key)
            .ok_or(SceneError::UnknownNode)
    }

    // ---- host ----

    /// Attach every node to `host`
    pub fn attach(&mut self, host: Rc<dyn RenderHost>) {
        let mut attached = 0_usize;
        for (_, node) in &mut self.nodes {
            if node.attach(&host) {
                attached += 1;
            }
        }
        info!("scene attached to host: {attached} of {} nodes", self.nodes.len());
        self.host = Some(host);
    }

    /// Detach every node from the host
    pub fn detach(&mut self) {
        for (_, node) in &mut self.nodes {
            node.detach();
        }
        self.renderables.clear();
        if self.host.take().is_some() {
            info!("scene detached from host");
        }
    }

    // ---- per frame ----

    /// Run the per-frame pipeline and build the renderable list
    pub fn update(&mut self, context: &mut RenderContext) -> FrameStats {
        let mut stats = FrameStats {
            transforms_changed: self.propagate_transforms(),
            ..FrameStats::default()
        };

        for (_, node) in &mut self.nodes {
            if node.update() {
                node.update_not_render(&self.config);
            }
        }

        stats.events = self.dispatch_events();
        if self.config.spatial.scene_index && (self.index_dirty || self.index.is_none()) {
            self.rebuild_index();
        }

        let frustum = context.frustum();
        let cull = self.config.culling.frustum_culling;
        self.renderables.clear();
        let mut targets = Vec::new();
        for (key, node) in &self.nodes {
            if !node.is_renderable() {
                continue;
            }
            stats.renderable += 1;
            if cull && !node.test_frustum(&frustum) {
                stats.culled += 1;
                continue;
            }
            self.renderables.push(key);
            targets.extend(node.post_effect_target());
        }
        context.set_post_effect_targets(targets);

        trace!(
            "frame {}: {} renderable, {} culled, {} events",
            context.frame(),
            stats.renderable,
            stats.culled,
            stats.events
        );
        stats
    }

    /// Recompute dirty transforms parents-first; returns how many changed
    fn propagate_transforms(&mut self) -> usize {
        let order = self.transforms.depth_first();
        for &transform in &order {
            if self.transforms.needs_recompute(transform) {
                self.transforms.compute(transform, false);
            }
        }
        let mut changed = 0;
        for transform in order {
            let Some(total) = self.transforms.raise_transform_changed(transform) else {
                continue;
            };
            changed += 1;
            if let Some(node) = self.owners.get(transform).and_then(|k| self.nodes.get_mut(*k)) {
                node.on_transform_changed(total);
            }
        }
        changed
    }

    /// Deliver queued notifications, transform events before bound events
    fn dispatch_events(&mut self) -> usize {
        let mut events: Vec<SceneEvent> = Vec::new();
        for (key, node) in &mut self.nodes {
            let id = node.id();
            events.extend(
                node.take_events()
                    .into_iter()
                    .map(|event| SceneEvent { node: key, id, event }),
            );
        }
        if events.is_empty() {
            return 0;
        }
        sort_for_delivery(&mut events);
        for event in &events {
            if event.event.is_transformed_bound() {
                self.index_dirty = true;
            }
            if let Some(node) = self.nodes.get_mut(event.node) {
                node.deliver(&event.event);
            }
            for observer in &mut self.observers {
                observer(event);
            }
        }
        events.len()
    }

    fn rebuild_index(&mut self) {
        self.index_dirty = false;
        let items: Vec<(NodeKey, BoundingBox)> = self
            .nodes
            .iter()
            .filter(|(_, n)| n.kind().uses_bound_reject() && n.has_valid_geometry())
            .map(|(key, n)| (key, n.transform_bound()))
            .collect();
        let Some(bounds) = items.iter().map(|(_, b)| *b).reduce(|a, b| a.merge(&b)) else {
            self.index = None;
            return;
        };
        let entries = items
            .iter()
            .map(|(key, b)| (*key, b.center(), b.extents().magnitude()));
        let index = Octree::build(bounds.expand(1e-3), self.config.octree.clone(), entries);
        debug!("scene index rebuilt: {} of {} nodes indexed", index.item_count(), items.len());
        self.index = Some(index);
    }

    /// Submit the renderable list bucket by bucket; returns the draw count
    ///
    /// Buckets follow [`RenderType::ALL`]. Within a bucket nodes are sorted
    /// by order key; transparent nodes are sorted back to front instead when
    /// enabled.
    pub fn render(&mut self, context: &mut RenderContext) -> usize {
        let before = context.commands().len();
        let camera = context.camera_position();
        for bucket in RenderType::ALL {
            let mut keys: Vec<NodeKey> = self
                .renderables
                .iter()
                .copied()
                .filter(|k| self.nodes.get(*k).is_some_and(|n| n.render_type() == bucket))
                .collect();
            if bucket == RenderType::Transparent && self.config.culling.sort_transparent {
                let depth = |k: &NodeKey| {
                    self.nodes.get(*k).map_or(0.0, |n| {
                        (n.transform_bound().center() - camera).magnitude_squared()
                    })
                };
                keys.sort_by(|a, b| depth(b).total_cmp(&depth(a)));
            } else {
                keys.sort_by_key(|k| self.nodes.get(*k).map(SceneNode::order_key));
            }
            for key in keys {
                if let Some(node) = self.nodes.get_mut(key) {
                    node.render(context);
                }
            }
        }
        context.commands().len() - before
    }

    /// Record shadow draws of every renderable node
    pub fn render_shadows(&mut self, context: &mut RenderContext) {
        for key in &self.renderables {
            if let Some(node) = self.nodes.get_mut(*key) {
                node.render_shadow(context);
            }
        }
    }

    /// Record draws of every renderable node for a custom pass
    pub fn render_custom(&mut self, context: &mut RenderContext, pass: &str) {
        context.set_custom_pass(Some(pass.to_string()));
        for key in &self.renderables {
            if let Some(node) = self.nodes.get_mut(*key) {
                node.render_custom(context);
            }
        }
        context.set_custom_pass(None);
    }

    // ---- hit testing ----

    /// Every hit of `ray`, nearest first
    ///
    /// Runs against the state of the last update. At most one hit per node.
    pub fn hit_test(&self, context: &RenderContext, ray: &Ray) -> Vec<HitResult> {
        let mut hits = Vec::new();
        match self.index.as_ref().filter(|_| self.config.spatial.scene_index && !self.index_dirty) {
            Some(index) => {
                let mut candidates: Vec<NodeKey> =
                    index.query_ray(ray).iter().map(|i| i.value).collect();
                candidates.extend(
                    self.nodes
                        .iter()
                        .filter(|(_, n)| !n.kind().uses_bound_reject())
                        .map(|(key, _)| key),
                );
                for key in candidates {
                    if let Some(node) = self.nodes.get(key) {
                        node.hit_test(context, ray, &self.config, &mut hits);
                    }
                }
            }
            None => {
                for (_, node) in &self.nodes {
                    node.hit_test(context, ray, &self.config, &mut hits);
                }
            }
        }
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }

    /// Hits of the pick ray through pixel `(x, y)`, nearest first
    pub fn hit_test_pixel(&self, context: &RenderContext, x: f32, y: f32) -> Vec<HitResult> {
        context
            .pick_ray(x, y)
            .map_or_else(Vec::new, |ray| self.hit_test(context, &ray))
    }

    fn invalidate_render(&self) {
        if let Some(host) = &self.host {
            host.invalidate_render();
        }
    }

    fn invalidate_scene_graph(&self) {
        if let Some(host) = &self.host {
            host.invalidate_scene_graph();
        }
    }
}

/// Deliver the queued events of a node leaving the graph
///
/// The node is no longer reachable by the per-frame dispatch, so its final
/// notifications go out immediately, in delivery order.
fn flush_node_events(key: NodeKey, node: &mut SceneNode, observers: &mut [SceneObserver]) {
    let id = node.id();
    let mut events: Vec<SceneEvent> = node
        .take_events()
        .into_iter()
        .map(|event| SceneEvent { node: key, id, event })
        .collect();
    sort_for_delivery(&mut events);
    for event in &events {
        node.deliver(&event.event);
        for observer in observers.iter_mut() {
            observer(event);
        }
    }
}

impl std::fmt::Debug for SceneGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SceneGraph")
            .field("nodes", &self.nodes.len())
            .field("roots", &self.roots.len())
            .field("renderables", &self.renderables.len())
            .field("attached", &self.host.is_some())
            .finish_non_exhaustive()
    }
}
