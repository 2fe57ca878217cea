//! Scene nodes: one renderable or logical item of the scene graph

use super::events::{NodeEvent, NodeSubscriber};
use super::kinds::{NodeKind, NodeType};
use crate::config::SceneConfig;
use crate::entity::{ComponentId, Entity, EntityComponent, EntityComponentCollection, EntityId};
use crate::error::SceneResult;
use crate::foundation::collections::{NodeKey, TransformKey};
use crate::foundation::logging::debug;
use crate::foundation::math::{Color4, Mat4, Vec2};
use crate::geometry::{BatchedMeshGeometryConfig, Geometry3D, HitResult};
use crate::render::{
    CoreBinding, CoreFactory, EffectAttributes, EffectsManager, LightParams, Material, OrderKey,
    PostEffectTarget, RasterDescription, RenderContext, RenderCore, RenderHost, RenderTechnique,
    RenderType, XRaySettings,
};
use crate::spatial::{BoundingBox, BoundingSphere, Frustum, Ray};
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::rc::{Rc, Weak};

/// Picks a technique from the host's manager, overriding the default lookup
pub type TechniqueOverride = Box<dyn Fn(&EffectsManager) -> Option<Rc<RenderTechnique>>>;

/// One item of the scene graph
///
/// A node is created detached. [`SceneNode::attach`] creates the render core
/// on first use, binds it to a technique and attaches the kind's components;
/// [`SceneNode::detach`] reverses this and releases every GPU handle the
/// components hold. Change notifications are queued and drained by the
/// graph once per frame.
pub struct SceneNode {
    id: EntityId,
    name: String,
    wrapper: Option<Rc<dyn Any>>,

    visible: bool,
    hit_test_visible: bool,
    renderable: bool,
    attached: bool,

    render_type: RenderType,
    render_order: u16,
    order_key: OrderKey,

    host: Option<Weak<dyn RenderHost>>,
    technique_override: Option<TechniqueOverride>,
    factory: CoreFactory,
    binding: Option<CoreBinding>,

    transform: Option<TransformKey>,
    total: Mat4,
    post_effects: BTreeMap<String, EffectAttributes>,
    items: Vec<NodeKey>,

    events: Vec<NodeEvent>,
    subscribers: Vec<NodeSubscriber>,
    components: EntityComponentCollection<CoreBinding>,
    kind: NodeKind,
}

impl SceneNode {
    /// Node of `node_type` backed by its standard render core
    pub fn new(node_type: NodeType) -> SceneResult<Self> {
        Self::with_core(node_type, node_type.default_factory())
    }

    /// Node of `node_type` backed by cores from `factory`
    ///
    /// Fails with [`crate::SceneError::MissingCapability`] when the factory's
    /// cores lack a capability the kind's components need.
    pub fn with_core(node_type: NodeType, factory: CoreFactory) -> SceneResult<Self> {
        let kind = NodeKind::new(node_type, factory.capabilities())?;
        let id = EntityId::next();
        let render_order = node_type.default_render_order();
        Ok(Self {
            id,
            name: String::new(),
            wrapper: None,
            visible: true,
            hit_test_visible: true,
            renderable: false,
            attached: false,
            render_type: node_type.default_render_type(),
            render_order,
            order_key: OrderKey::new(render_order, 0),
            host: None,
            technique_override: None,
            factory,
            binding: None,
            transform: None,
            total: Mat4::identity(),
            post_effects: BTreeMap::new(),
            items: Vec::new(),
            events: Vec::new(),
            subscribers: Vec::new(),
            components: EntityComponentCollection::new(Some(id)),
            kind,
        })
    }

    /// Builder: set the display name
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Unique id
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Front-end object reported in hit results
    pub fn wrapper(&self) -> Option<&Rc<dyn Any>> {
        self.wrapper.as_ref()
    }

    /// Set the front-end object reported in hit results
    pub fn set_wrapper(&mut self, wrapper: Option<Rc<dyn Any>>) {
        self.wrapper = wrapper;
    }

    /// Kind tag
    pub fn node_type(&self) -> NodeType {
        self.kind.node_type()
    }

    /// Per-kind state
    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    /// Visibility flag
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Show or hide the node
    pub fn set_visible(&mut self, visible: bool) {
        if self.visible != visible {
            self.visible = visible;
            self.invalidate_scene_graph();
        }
    }

    /// Whether the node takes part in hit testing
    pub fn is_hit_test_visible(&self) -> bool {
        self.hit_test_visible
    }

    /// Include or exclude the node from hit testing
    pub fn set_hit_test_visible(&mut self, visible: bool) {
        self.hit_test_visible = visible;
    }

    /// Result of the last [`SceneNode::update`]
    pub fn is_renderable(&self) -> bool {
        self.renderable
    }

    /// Whether the node is attached to a host
    pub fn is_attached(&self) -> bool {
        self.attached
    }

    /// Effective bucket, after the transparency switch of mesh kinds
    pub fn render_type(&self) -> RenderType {
        self.kind
            .surface()
            .map_or(self.render_type, |surface| surface.transparent.apply(self.render_type))
    }

    /// Assign the bucket
    pub fn set_render_type(&mut self, render_type: RenderType) {
        if self.render_type != render_type {
            self.render_type = render_type;
            self.invalidate_scene_graph();
        }
    }

    /// Manual render order
    pub fn render_order(&self) -> u16 {
        self.render_order
    }

    /// Assign the manual render order and refresh the order key
    pub fn set_render_order(&mut self, order: u16) {
        if self.render_order != order {
            self.render_order = order;
            self.update_render_order_key();
            self.invalidate_scene_graph();
        }
    }

    /// Cached sort key
    pub fn order_key(&self) -> OrderKey {
        self.order_key
    }

    /// Recompute the sort key from render order and the kind's secondary key
    pub fn update_render_order_key(&mut self) {
        self.order_key = OrderKey::new(self.render_order, self.kind.order_secondary());
    }

    /// Replace the technique lookup used on attach
    pub fn set_technique_override(&mut self, select: Option<TechniqueOverride>) {
        self.technique_override = select;
    }

    /// Render core, once created
    pub fn core(&self) -> Option<&dyn RenderCore> {
        self.binding.as_ref().map(|b| b.core.as_ref())
    }

    /// Core binding, once created
    pub fn binding(&self) -> Option<&CoreBinding> {
        self.binding.as_ref()
    }

    /// Host the node is attached to, if still alive
    pub fn host(&self) -> Option<Rc<dyn RenderHost>> {
        self.host.as_ref().and_then(Weak::upgrade)
    }

    /// Transform slot assigned by the owning graph
    pub fn transform_key(&self) -> Option<TransformKey> {
        self.transform
    }

    pub(crate) fn set_transform_key(&mut self, key: Option<TransformKey>) {
        self.transform = key;
    }

    /// Cached world matrix
    pub fn total_transform(&self) -> &Mat4 {
        &self.total
    }

    /// Child nodes registered by the owning graph
    pub fn items(&self) -> &[NodeKey] {
        &self.items
    }

    pub(crate) fn items_mut(&mut self) -> &mut Vec<NodeKey> {
        &mut self.items
    }

    // ---- lifecycle ----

    /// Attach to `host`; returns whether the node is attached afterwards
    ///
    /// A no-op without a resource manager or without a resolvable technique.
    pub fn attach(&mut self, host: &Rc<dyn RenderHost>) -> bool {
        if self.attached {
            return true;
        }
        let Some(effects) = host.effects_manager() else {
            debug!("node {} not attached: host has no effects manager", self.id);
            return false;
        };
        let Some(technique) = self.resolve_technique(host.as_ref(), &effects) else {
            debug!("node {} not attached: no render technique", self.id);
            return false;
        };

        let id = self.id;
        let factory = &self.factory;
        let binding = self
            .binding
            .get_or_insert_with(|| CoreBinding::new(factory.create(id)));
        binding.effects = Some(effects);
        binding.technique = Some(Rc::clone(&technique));
        if !binding.core.attach(Rc::clone(&technique)) {
            debug!("node {} not attached: core refused technique {}", id, technique.name());
            binding.effects = None;
            binding.technique = None;
            return false;
        }
        binding.core.set_model_matrix(self.total);
        self.kind.attach_components(binding);
        self.components.attach_all(binding);
        self.kind.assign_defaults(binding);

        self.host = Some(Rc::downgrade(host));
        self.attached = true;
        self.update_render_order_key();
        self.events.push(NodeEvent::Attached);
        debug!("attached {} {} with technique {}", self.node_type().name(), id, technique.name());
        host.invalidate_scene_graph();
        true
    }

    /// Detach from the host and release GPU handles; a no-op when detached
    pub fn detach(&mut self) {
        if !self.attached {
            return;
        }
        self.attached = false;
        self.renderable = false;
        self.invalidate_scene_graph();
        if let Some(binding) = self.binding.as_mut() {
            self.kind.detach_components(binding);
            self.components.detach_all(binding);
            binding.core.detach();
            binding.technique = None;
            binding.effects = None;
        }
        self.host = None;
        self.events.push(NodeEvent::Detached);
        debug!("detached {} {}", self.node_type().name(), self.id);
    }

    /// Detach and drop subscriptions, items, post effects and extra components
    pub fn dispose(&mut self) {
        self.detach();
        let mut events = self.take_events();
        events.sort_by_key(NodeEvent::priority);
        for event in &events {
            self.deliver(event);
        }
        self.subscribers.clear();
        self.items.clear();
        self.post_effects.clear();
        self.components.clear();
        self.events.clear();
    }

    fn resolve_technique(
        &self,
        host: &dyn RenderHost,
        effects: &EffectsManager,
    ) -> Option<Rc<RenderTechnique>> {
        if let Some(select) = &self.technique_override {
            return select(effects);
        }
        self.node_type()
            .technique_name()
            .and_then(|name| effects.technique(name))
            .or_else(|| host.render_technique())
            .or_else(|| effects.first_technique())
    }

    // ---- per frame ----

    /// Recompute renderability; returns it
    ///
    /// Detached or hidden nodes are never renderable. Point and line nodes
    /// are not renderable under deferred lighting.
    pub fn update(&mut self) -> bool {
        let deferred = self.host().is_some_and(|h| h.is_deferred_lighting());
        self.renderable = self.visible && self.attached && self.kind.can_render(deferred);
        if self.renderable {
            self.update_render_order_key();
        }
        self.renderable
    }

    /// Non-drawing per-frame work such as octree construction
    pub fn update_not_render(&mut self, config: &SceneConfig) {
        if self.renderable {
            self.kind.update_not_render(config);
        }
    }

    /// Whether the node survives frustum culling
    ///
    /// Kinds without geometry bounds always pass.
    pub fn test_frustum(&self, frustum: &Frustum) -> bool {
        if !self.kind.frustum_check() {
            return true;
        }
        self.kind.bounds().map_or(true, |bounds| {
            frustum.intersects_box(&bounds.transform_bound())
                && frustum.intersects_sphere(&bounds.transform_bound_sphere())
        })
    }

    /// Record this node's draws
    pub fn render(&mut self, context: &mut RenderContext) {
        if !self.renderable {
            return;
        }
        if let Some(binding) = self.binding.as_mut() {
            binding.core.render(context);
        }
    }

    /// Record this node's shadow draws
    pub fn render_shadow(&mut self, context: &mut RenderContext) {
        if !self.renderable {
            return;
        }
        if let Some(binding) = self.binding.as_mut() {
            binding.core.render_shadow(context);
        }
    }

    /// Record this node's draws for the context's custom pass
    pub fn render_custom(&mut self, context: &mut RenderContext) {
        if !self.renderable {
            return;
        }
        if let Some(binding) = self.binding.as_mut() {
            binding.core.render_custom(context);
        }
    }

    /// Entry of the per-frame post-effect list, when the node carries effects
    pub fn post_effect_target(&self) -> Option<PostEffectTarget> {
        if !self.renderable || self.post_effects.is_empty() {
            return None;
        }
        Some(PostEffectTarget {
            node: self.id,
            model: self.total,
            material_variable: self.kind.order_secondary(),
            effects: self.post_effects.clone(),
        })
    }

    /// Store a new world matrix and recompute transformed bounds
    pub fn on_transform_changed(&mut self, total: Mat4) {
        self.total = total;
        self.kind.update_transformed(&total);
        if let Some(binding) = self.binding.as_mut() {
            binding.core.set_model_matrix(total);
        }
        self.events.push(NodeEvent::TransformChanged(total));
        self.collect_bound_events();
        self.invalidate_render();
    }

    // ---- bounds ----

    /// Geometry-space box; the zero sentinel without geometry
    pub fn bound(&self) -> BoundingBox {
        self.kind.bounds().map_or_else(BoundingBox::zero, |b| b.bound())
    }

    /// Geometry-space sphere; the zero sentinel without geometry
    pub fn bound_sphere(&self) -> BoundingSphere {
        self.kind.bounds().map_or_else(BoundingSphere::zero, |b| b.bound_sphere())
    }

    /// World-space box; the zero sentinel without geometry
    pub fn transform_bound(&self) -> BoundingBox {
        self.kind.bounds().map_or_else(BoundingBox::zero, |b| b.transform_bound())
    }

    /// World-space sphere; the zero sentinel without geometry
    pub fn transform_bound_sphere(&self) -> BoundingSphere {
        self.kind
            .bounds()
            .map_or_else(BoundingSphere::zero, |b| b.transform_bound_sphere())
    }

    /// Whether the assigned geometry passed validation
    pub fn has_valid_geometry(&self) -> bool {
        self.kind.bounds().is_some_and(|b| b.is_valid())
    }

    // ---- hit testing ----

    /// Test `ray` against the node, appending at most one hit to `hits`
    ///
    /// Returns whether a hit was appended. Hidden, unrenderable or
    /// hit-test-invisible nodes never hit.
    pub fn hit_test(
        &self,
        context: &RenderContext,
        ray: &Ray,
        config: &SceneConfig,
        hits: &mut Vec<HitResult>,
    ) -> bool {
        if !self.hit_test_visible || !self.renderable || !self.kind.can_hit_test() {
            return false;
        }
        if self.kind.uses_bound_reject() {
            let Some(bounds) = self.kind.bounds() else {
                return false;
            };
            if bounds.transform_bound().intersect_ray(ray).is_none()
                || bounds.transform_bound_sphere().intersect_ray(ray).is_none()
            {
                return false;
            }
        }
        let Some(mut hit) = self
            .kind
            .hit_test(&self.total, ray, context.screen_view_projection(), config)
        else {
            return false;
        };
        hit.node = Some(self.id);
        hit.model_hit = self.wrapper.clone();
        hits.push(hit);
        true
    }

    // ---- geometry ----

    /// Assign the geometry of mesh, line, point and billboard nodes
    ///
    /// Geometry failing the kind's predicate is kept but flagged invalid; the
    /// node then neither renders nor hits.
    pub fn set_geometry(&mut self, geometry: Option<Rc<Geometry3D>>) {
        let Some(component) = self.kind.geometry_mut() else {
            debug!("{} has no geometry", self.node_type().name());
            return;
        };
        component.set_geometry(geometry, &self.total, self.binding.as_mut());
        self.collect_bound_events();
        self.invalidate_scene_graph();
    }

    /// Assign per-instance matrices of mesh nodes
    pub fn set_instances(&mut self, instances: Vec<Mat4>) {
        let Some(component) = self.kind.geometry_mut() else {
            return;
        };
        component.set_instances(instances, &self.total, self.binding.as_mut());
        self.collect_bound_events();
        self.invalidate_scene_graph();
    }

    /// Assign the sub-geometries of a batched-mesh node
    pub fn set_batched_geometries(&mut self, configs: Vec<BatchedMeshGeometryConfig>) {
        let NodeKind::BatchedMesh(batched) = &mut self.kind else {
            return;
        };
        batched.batch.set_configs(configs, &self.total, self.binding.as_mut());
        self.collect_bound_events();
        self.invalidate_scene_graph();
    }

    /// Toggle frustum culling for geometry nodes
    pub fn set_frustum_check(&mut self, enabled: bool) {
        if let Some(component) = self.kind.geometry_mut() {
            component.set_frustum_check(enabled);
        }
    }

    // ---- surface ----

    /// Assign the material of mesh nodes
    pub fn set_material(&mut self, material: Option<Material>) {
        let Some(surface) = self.kind.surface_mut() else {
            return;
        };
        surface.material.set_material(material, self.binding.as_mut());
        self.events.push(NodeEvent::MaterialChanged);
        self.update_render_order_key();
        self.invalidate_render();
    }

    /// Edit the rasterizer state of mesh nodes
    pub fn modify_raster_state<F>(&mut self, edit: F)
    where
        F: FnOnce(&mut RasterDescription),
    {
        if let Some(surface) = self.kind.surface_mut() {
            surface.raster.modify(edit, self.binding.as_mut());
            self.invalidate_render();
        }
    }

    /// Toggle shadow casting of mesh nodes
    pub fn set_throw_shadow(&mut self, enabled: bool) {
        if let Some(surface) = self.kind.surface_mut() {
            surface.shadow.set_throw_shadow(enabled, self.binding.as_mut());
            self.invalidate_render();
        }
    }

    /// Toggle normal inversion of mesh nodes
    pub fn set_invert_normal(&mut self, invert: bool) {
        if let Some(surface) = self.kind.surface_mut() {
            surface.invert_normal.set_invert(invert, self.binding.as_mut());
            self.invalidate_render();
        }
    }

    /// Toggle the wireframe overlay of mesh nodes
    pub fn set_render_wireframe(&mut self, enabled: bool) {
        if let Some(surface) = self.kind.surface_mut() {
            surface.wireframe.set_enabled(enabled, self.binding.as_mut());
            self.invalidate_render();
        }
    }

    /// Colour of the wireframe overlay
    pub fn set_wireframe_color(&mut self, color: Color4) {
        if let Some(surface) = self.kind.surface_mut() {
            surface.wireframe.set_color(color, self.binding.as_mut());
            self.invalidate_render();
        }
    }

    /// Move mesh nodes between the opaque and transparent buckets
    pub fn set_transparent(&mut self, transparent: bool) {
        if let Some(surface) = self.kind.surface_mut() {
            surface.transparent.set_transparent(transparent);
            self.invalidate_scene_graph();
        }
    }

    // ---- primitives ----

    /// Colour of point, line and billboard nodes
    pub fn set_color(&mut self, color: Color4) {
        self.edit_primitive(|p| p.color = color);
    }

    /// Point size or line thickness in pixels
    pub fn set_size(&mut self, size: Vec2) {
        self.edit_primitive(|p| p.size = size);
    }

    /// Whether billboard sizes are in pixels
    pub fn set_fixed_size(&mut self, fixed: bool) {
        self.edit_primitive(|p| p.fixed_size = fixed);
    }

    /// Pixel tolerance for hit testing; `None` uses the configured default
    pub fn set_hit_test_thickness(&mut self, thickness: Option<f32>) {
        if let Some(p) = self.kind.primitive_mut() {
            p.hit_test_thickness = thickness;
        }
    }

    fn edit_primitive(&mut self, edit: impl FnOnce(&mut super::kinds::PrimitiveNode)) {
        let Some(p) = self.kind.primitive_mut() else {
            return;
        };
        edit(p);
        if let Some(binding) = self.binding.as_mut().filter(|_| self.attached) {
            p.apply_style(binding);
        }
        self.invalidate_render();
    }

    // ---- lights, environment, x-ray ----

    /// Parameters of light nodes
    pub fn set_light(&mut self, params: LightParams) {
        let NodeKind::Light(light) = &mut self.kind else {
            return;
        };
        light.params = params;
        if let Some(core) = self.binding.as_mut().and_then(|b| b.core.light()) {
            core.set_light(params);
        }
        self.invalidate_render();
    }

    /// Sky dome flag of environment-map nodes
    pub fn set_sky_dome(&mut self, enabled: bool) {
        let NodeKind::EnvironmentMap(env) = &mut self.kind else {
            return;
        };
        env.sky_dome = enabled;
        if let Some(core) = self.binding.as_mut().and_then(|b| b.core.skybox()) {
            core.set_sky_dome(enabled);
        }
        self.invalidate_render();
    }

    /// Settings of X-ray nodes
    pub fn set_xray_settings(&mut self, settings: XRaySettings) {
        let NodeKind::PostEffectXRay(xray) = &mut self.kind else {
            return;
        };
        xray.settings = settings.clone();
        if let Some(core) = self.binding.as_mut().and_then(|b| b.core.xray()) {
            core.set_xray_settings(settings);
        }
        self.invalidate_render();
    }

    // ---- post effects ----

    /// Effects attached to the node, by name
    pub fn post_effects(&self) -> &BTreeMap<String, EffectAttributes> {
        &self.post_effects
    }

    /// Attach an effect; an effect with the same name is kept
    pub fn add_post_effect(&mut self, effect: EffectAttributes) {
        if self.post_effects.contains_key(effect.name()) {
            return;
        }
        self.post_effects.insert(effect.name().to_string(), effect);
        self.invalidate_render();
    }

    /// Remove the named effect; returns whether it was present
    pub fn remove_post_effect(&mut self, name: &str) -> bool {
        let removed = self.post_effects.remove(name).is_some();
        if removed {
            self.invalidate_render();
        }
        removed
    }

    /// Whether the named effect is attached
    pub fn has_post_effect(&self, name: &str) -> bool {
        self.post_effects.contains_key(name)
    }

    /// The named effect, if attached
    pub fn try_get_post_effect(&self, name: &str) -> Option<&EffectAttributes> {
        self.post_effects.get(name)
    }

    /// Remove every effect
    pub fn clear_post_effects(&mut self) {
        if self.post_effects.is_empty() {
            return;
        }
        self.post_effects.clear();
        self.invalidate_render();
    }

    /// Replace the effects declared by text, e.g. `xray[color:#FF0000]`
    ///
    /// Effects added by name through [`SceneNode::add_post_effect`] are kept.
    pub fn set_post_effects_text(&mut self, text: &str) -> SceneResult<()> {
        let Some(component) = self.kind.post_effect_mut() else {
            return Ok(());
        };
        component.set_text(text, &mut self.post_effects)?;
        self.invalidate_render();
        Ok(())
    }

    // ---- extra components ----

    /// Register an additional component, attaching it when the node is attached
    pub fn add_component<T: EntityComponent<CoreBinding>>(
        &mut self,
        mut component: T,
    ) -> ComponentId {
        if let Some(binding) = self.binding.as_mut().filter(|_| self.attached) {
            component.attach(binding);
        }
        self.components.add(component)
    }

    /// First additional component of type `T`
    pub fn component<T: EntityComponent<CoreBinding>>(&self) -> Option<&T> {
        self.components.get::<T>()
    }

    /// Detach and remove an additional component
    pub fn remove_component(&mut self, id: ComponentId) -> bool {
        self.components.remove(id)
    }

    // ---- notifications ----

    /// Register a per-node subscriber
    pub fn subscribe(&mut self, subscriber: NodeSubscriber) {
        self.subscribers.push(subscriber);
    }

    /// Take queued notifications
    pub fn take_events(&mut self) -> Vec<NodeEvent> {
        self.collect_bound_events();
        std::mem::take(&mut self.events)
    }

    /// Whether notifications are queued
    pub fn has_pending_events(&self) -> bool {
        !self.events.is_empty()
    }

    pub(crate) fn deliver(&mut self, event: &NodeEvent) {
        for subscriber in &mut self.subscribers {
            subscriber(event);
        }
    }

    fn collect_bound_events(&mut self) {
        if let Some(bounds) = self.kind.bounds_mut() {
            self.events.extend(bounds.take_events());
        }
    }

    fn invalidate_render(&self) {
        if let Some(host) = self.host() {
            host.invalidate_render();
        }
    }

    fn invalidate_scene_graph(&self) {
        if let Some(host) = self.host() {
            host.invalidate_scene_graph();
        }
    }
}

impl Entity for SceneNode {
    type Context = CoreBinding;

    fn entity_id(&self) -> EntityId {
        self.id
    }

    fn components(&self) -> &EntityComponentCollection<CoreBinding> {
        &self.components
    }

    fn components_mut(&mut self) -> &mut EntityComponentCollection<CoreBinding> {
        &mut self.components
    }
}

impl fmt::Debug for SceneNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneNode")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("type", &self.node_type())
            .field("visible", &self.visible)
            .field("renderable", &self.renderable)
            .field("attached", &self.attached)
            .field("render_type", &self.render_type())
            .field("order_key", &self.order_key)
            .finish_non_exhaustive()
    }
}

impl Drop for SceneNode {
    fn drop(&mut self) {
        self.detach();
    }
}
