//! Node kinds and their component sets
//!
//! Each kind is a variant of [`NodeKind`] holding exactly the components it
//! needs as named fields. Per-kind behaviour is a `match` over the variant.

use super::components::{
    BatchedGeometryComponent, GeometryBoundManager, GeometryComponent, InvertNormalComponent,
    IsTransparentComponent, MaterialComponent, PostEffectComponent, RasterStateComponent,
    RenderWireframeComponent, ShadowComponent,
};
use crate::config::SceneConfig;
use crate::entity::EntityComponent;
use crate::error::{SceneError, SceneResult};
use crate::foundation::math::{Color4, Mat4, Vec2};
use crate::geometry::{Geometry3D, GeometryKind, HitResult, HitTestParams};
use crate::render::core::{
    DepthPrepassCore, EmptyCore, LightCore, MeshCore, PrimitiveCore, SkyboxCore, XRayCore,
};
use crate::render::{
    technique_names, CoreBinding, CoreCapabilities, CoreFactory, LightParams, RenderType,
    XRaySettings,
};
use crate::spatial::Ray;

/// Fieldless tag of a node kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    /// Triangle mesh
    Mesh,
    /// Line list
    Line,
    /// Point list
    Point,
    /// Billboards
    Billboard,
    /// Several meshes merged into one draw
    BatchedMesh,
    /// Light source
    Light,
    /// Skybox or sky dome
    EnvironmentMap,
    /// Depth-only prepass
    DepthPrepass,
    /// X-ray outline post effect
    PostEffectXRay,
    /// Pure container
    Group,
}

impl NodeType {
    /// Kind name for logs and errors
    pub fn name(self) -> &'static str {
        match self {
            Self::Mesh => "MeshNode",
            Self::Line => "LineNode",
            Self::Point => "PointNode",
            Self::Billboard => "BillboardNode",
            Self::BatchedMesh => "BatchedMeshNode",
            Self::Light => "LightNode",
            Self::EnvironmentMap => "EnvironmentMapNode",
            Self::DepthPrepass => "DepthPrepassNode",
            Self::PostEffectXRay => "PostEffectXRayNode",
            Self::Group => "GroupNode",
        }
    }

    /// Technique looked up first on attach
    pub fn technique_name(self) -> Option<&'static str> {
        match self {
            Self::Mesh | Self::BatchedMesh | Self::DepthPrepass | Self::PostEffectXRay => {
                Some(technique_names::MESH)
            }
            Self::Line => Some(technique_names::LINES),
            Self::Point => Some(technique_names::POINTS),
            Self::Billboard => Some(technique_names::BILLBOARD),
            Self::Light => Some(technique_names::LIGHT),
            Self::EnvironmentMap => Some(technique_names::SKYBOX),
            Self::Group => None,
        }
    }

    /// Capabilities the kind's render core must provide
    pub fn required_capabilities(self) -> CoreCapabilities {
        match self {
            Self::Mesh | Self::BatchedMesh => MeshCore::CAPABILITIES,
            Self::Line | Self::Point | Self::Billboard => PrimitiveCore::CAPABILITIES,
            Self::Light => CoreCapabilities::LIGHT,
            Self::EnvironmentMap => CoreCapabilities::SKYBOX,
            Self::PostEffectXRay => CoreCapabilities::XRAY,
            Self::DepthPrepass | Self::Group => CoreCapabilities::empty(),
        }
    }

    /// Factory for the kind's standard render core
    pub fn default_factory(self) -> CoreFactory {
        let caps = self.required_capabilities();
        match self {
            Self::Mesh => CoreFactory::new(caps, |id| Box::new(MeshCore::new(id))),
            Self::BatchedMesh => CoreFactory::new(caps, |id| Box::new(MeshCore::batched(id))),
            Self::Line => CoreFactory::new(caps, |id| Box::new(PrimitiveCore::lines(id))),
            Self::Point => CoreFactory::new(caps, |id| Box::new(PrimitiveCore::points(id))),
            Self::Billboard => CoreFactory::new(caps, |id| Box::new(PrimitiveCore::billboards(id))),
            Self::Light => CoreFactory::new(caps, |id| Box::new(LightCore::new(id))),
            Self::EnvironmentMap => CoreFactory::new(caps, |id| Box::new(SkyboxCore::new(id))),
            Self::DepthPrepass => CoreFactory::new(caps, |id| Box::new(DepthPrepassCore::new(id))),
            Self::PostEffectXRay => CoreFactory::new(caps, |id| Box::new(XRayCore::new(id))),
            Self::Group => CoreFactory::new(caps, |id| Box::new(EmptyCore::new(id))),
        }
    }

    /// Bucket a new node of this kind starts in
    pub fn default_render_type(self) -> RenderType {
        match self {
            Self::Light => RenderType::Light,
            Self::DepthPrepass => RenderType::PreProc,
            Self::PostEffectXRay => RenderType::PostEffect,
            _ => RenderType::Opaque,
        }
    }

    /// Manual render order a new node of this kind starts with
    pub fn default_render_order(self) -> u16 {
        match self {
            Self::EnvironmentMap => 1000,
            _ => 0,
        }
    }
}

fn is_mesh(geometry: &Geometry3D) -> bool {
    geometry.kind() == GeometryKind::Mesh
        && !geometry.positions().is_empty()
        && !geometry.indices().is_empty()
        && geometry.indices().len() % 3 == 0
}

fn is_line(geometry: &Geometry3D) -> bool {
    geometry.kind() == GeometryKind::Line
        && !geometry.positions().is_empty()
        && !geometry.indices().is_empty()
        && geometry.indices().len() % 2 == 0
}

fn is_point(geometry: &Geometry3D) -> bool {
    geometry.kind() == GeometryKind::Point && !geometry.positions().is_empty()
}

fn is_billboard(geometry: &Geometry3D) -> bool {
    geometry.kind() == GeometryKind::Billboard && !geometry.positions().is_empty()
}

/// Surface state shared by mesh and batched-mesh nodes
#[derive(Debug)]
pub struct MeshSurface {
    /// Material
    pub material: MaterialComponent,
    /// Rasterizer state
    pub raster: RasterStateComponent,
    /// Shadow casting
    pub shadow: ShadowComponent,
    /// Normal inversion
    pub invert_normal: InvertNormalComponent,
    /// Wireframe overlay
    pub wireframe: RenderWireframeComponent,
    /// Opaque or transparent bucket
    pub transparent: IsTransparentComponent,
    /// Post effects
    pub post_effect: PostEffectComponent,
}

impl MeshSurface {
    fn new(caps: CoreCapabilities) -> SceneResult<Self> {
        Ok(Self {
            material: MaterialComponent::new(caps)?,
            raster: RasterStateComponent::new(caps)?,
            shadow: ShadowComponent::new(caps)?,
            invert_normal: InvertNormalComponent::new(caps)?,
            wireframe: RenderWireframeComponent::new(caps)?,
            transparent: IsTransparentComponent::new(),
            post_effect: PostEffectComponent::new(),
        })
    }

    fn attach(&mut self, binding: &mut CoreBinding) {
        self.material.attach(binding);
        self.raster.attach(binding);
        self.shadow.attach(binding);
        self.invert_normal.attach(binding);
        self.wireframe.attach(binding);
        self.transparent.attach(binding);
        self.post_effect.attach(binding);
    }

    fn detach(&mut self, binding: &mut CoreBinding) {
        self.material.detach(binding);
        self.raster.detach(binding);
        self.shadow.detach(binding);
        self.invert_normal.detach(binding);
        self.wireframe.detach(binding);
        self.transparent.detach(binding);
        self.post_effect.detach(binding);
    }
}

/// Components of a mesh node
#[derive(Debug)]
pub struct MeshNode {
    /// Geometry and bounds
    pub geometry: GeometryComponent,
    /// Surface state
    pub surface: MeshSurface,
}

/// Components of a batched-mesh node
#[derive(Debug)]
pub struct BatchedMeshNode {
    /// Sub-geometries and bounds
    pub batch: BatchedGeometryComponent,
    /// Surface state
    pub surface: MeshSurface,
}

/// Components of a point, line or billboard node
#[derive(Debug)]
pub struct PrimitiveNode {
    /// Geometry and bounds
    pub geometry: GeometryComponent,
    /// Post effects
    pub post_effect: PostEffectComponent,
    /// Primitive colour
    pub color: Color4,
    /// Point size or line thickness in pixels
    pub size: Vec2,
    /// Billboard sizes are in pixels
    pub fixed_size: bool,
    /// Hit-test pixel tolerance; the configured default when unset
    pub hit_test_thickness: Option<f32>,
}

impl PrimitiveNode {
    fn new(
        caps: CoreCapabilities,
        predicate: fn(&Geometry3D) -> bool,
        color: Color4,
        size: Vec2,
    ) -> SceneResult<Self> {
        Ok(Self {
            geometry: GeometryComponent::new(caps, predicate)?,
            post_effect: PostEffectComponent::new(),
            color,
            size,
            fixed_size: true,
            hit_test_thickness: None,
        })
    }

    /// Push colour and size into the core
    pub fn apply_style(&self, binding: &mut CoreBinding) {
        if let Some(style) = binding.core.primitive_style() {
            style.set_color(self.color);
            style.set_size(self.size);
        }
    }
}

/// Components of a light node
#[derive(Debug, Default)]
pub struct LightNode {
    /// Light parameters
    pub params: LightParams,
}

/// Components of an environment-map node
#[derive(Debug, Default)]
pub struct EnvironmentMapNode {
    /// Draw a sky dome instead of a cube
    pub sky_dome: bool,
}

/// Components of an X-ray node
#[derive(Debug, Default)]
pub struct XRayNode {
    /// Outline settings
    pub settings: XRaySettings,
}

/// Per-kind state of a scene node
#[derive(Debug)]
pub enum NodeKind {
    /// Triangle mesh
    Mesh(MeshNode),
    /// Line list
    Line(PrimitiveNode),
    /// Point list
    Point(PrimitiveNode),
    /// Billboards
    Billboard(PrimitiveNode),
    /// Batched meshes
    BatchedMesh(BatchedMeshNode),
    /// Light
    Light(LightNode),
    /// Environment map
    EnvironmentMap(EnvironmentMapNode),
    /// Depth prepass
    DepthPrepass,
    /// X-ray post effect
    PostEffectXRay(XRayNode),
    /// Container
    Group,
}

impl NodeKind {
    /// Components for `node_type` bound to a core providing `caps`
    pub fn new(node_type: NodeType, caps: CoreCapabilities) -> SceneResult<Self> {
        let kind = match node_type {
            NodeType::Mesh => Self::Mesh(MeshNode {
                geometry: GeometryComponent::new(caps, is_mesh)?,
                surface: MeshSurface::new(caps)?,
            }),
            NodeType::BatchedMesh => Self::BatchedMesh(BatchedMeshNode {
                batch: BatchedGeometryComponent::new(caps, is_mesh)?,
                surface: MeshSurface::new(caps)?,
            }),
            NodeType::Line => Self::Line(PrimitiveNode::new(
                caps,
                is_line,
                Color4::new(0.0, 0.0, 0.0, 1.0),
                Vec2::new(1.0, 1.0),
            )?),
            NodeType::Point => Self::Point(PrimitiveNode::new(
                caps,
                is_point,
                Color4::new(0.0, 0.0, 0.0, 1.0),
                Vec2::new(4.0, 4.0),
            )?),
            NodeType::Billboard => Self::Billboard(PrimitiveNode::new(
                caps,
                is_billboard,
                Color4::new(1.0, 1.0, 1.0, 1.0),
                Vec2::new(1.0, 1.0),
            )?),
            NodeType::Light => Self::Light(LightNode::default()),
            NodeType::EnvironmentMap => Self::EnvironmentMap(EnvironmentMapNode::default()),
            NodeType::DepthPrepass => Self::DepthPrepass,
            NodeType::PostEffectXRay => Self::PostEffectXRay(XRayNode::default()),
            NodeType::Group => Self::Group,
        };
        if let Some(missing) = (node_type.required_capabilities() - caps).iter().next() {
            return Err(SceneError::MissingCapability {
                component: node_type.name(),
                capability: missing.describe(),
            });
        }
        Ok(kind)
    }

    /// Tag of this kind
    pub fn node_type(&self) -> NodeType {
        match self {
            Self::Mesh(_) => NodeType::Mesh,
            Self::Line(_) => NodeType::Line,
            Self::Point(_) => NodeType::Point,
            Self::Billboard(_) => NodeType::Billboard,
            Self::BatchedMesh(_) => NodeType::BatchedMesh,
            Self::Light(_) => NodeType::Light,
            Self::EnvironmentMap(_) => NodeType::EnvironmentMap,
            Self::DepthPrepass => NodeType::DepthPrepass,
            Self::PostEffectXRay(_) => NodeType::PostEffectXRay,
            Self::Group => NodeType::Group,
        }
    }

    /// Attach the kind's components in registration order
    pub fn attach_components(&mut self, binding: &mut CoreBinding) {
        match self {
            Self::Mesh(mesh) => {
                mesh.geometry.attach(binding);
                mesh.surface.attach(binding);
            }
            Self::BatchedMesh(batched) => {
                batched.batch.attach(binding);
                batched.surface.attach(binding);
            }
            Self::Line(p) | Self::Point(p) | Self::Billboard(p) => {
                p.geometry.attach(binding);
                p.post_effect.attach(binding);
            }
            _ => {}
        }
    }

    /// Detach the kind's components in registration order
    pub fn detach_components(&mut self, binding: &mut CoreBinding) {
        match self {
            Self::Mesh(mesh) => {
                mesh.geometry.detach(binding);
                mesh.surface.detach(binding);
            }
            Self::BatchedMesh(batched) => {
                batched.batch.detach(binding);
                batched.surface.detach(binding);
            }
            Self::Line(p) | Self::Point(p) | Self::Billboard(p) => {
                p.geometry.detach(binding);
                p.post_effect.detach(binding);
            }
            _ => {}
        }
    }

    /// Push kind-level defaults into a freshly attached core
    pub fn assign_defaults(&self, binding: &mut CoreBinding) {
        match self {
            Self::Line(p) | Self::Point(p) | Self::Billboard(p) => p.apply_style(binding),
            Self::Light(light) => {
                if let Some(core) = binding.core.light() {
                    core.set_light(light.params);
                }
            }
            Self::EnvironmentMap(env) => {
                if let Some(core) = binding.core.skybox() {
                    core.set_sky_dome(env.sky_dome);
                }
            }
            Self::PostEffectXRay(xray) => {
                if let Some(core) = binding.core.xray() {
                    core.set_xray_settings(xray.settings.clone());
                }
            }
            _ => {}
        }
    }

    /// Kind-specific renderability on top of visible and attached
    pub fn can_render(&self, deferred_lighting: bool) -> bool {
        match self {
            Self::Mesh(mesh) => mesh.geometry.is_valid(),
            Self::Billboard(p) => p.geometry.is_valid(),
            Self::Line(p) | Self::Point(p) => p.geometry.is_valid() && !deferred_lighting,
            Self::BatchedMesh(batched) => {
                !batched.batch.configs().is_empty() && batched.batch.is_valid()
            }
            Self::Group => false,
            _ => true,
        }
    }

    /// Secondary sort key: the material variable id of meshes
    pub fn order_secondary(&self) -> u16 {
        match self {
            Self::Mesh(mesh) => mesh.surface.material.variable_id(),
            Self::BatchedMesh(batched) => batched.surface.material.variable_id(),
            _ => 0,
        }
    }

    /// Bound manager of geometric kinds
    pub fn bounds(&self) -> Option<&GeometryBoundManager> {
        match self {
            Self::Mesh(mesh) => Some(mesh.geometry.bounds()),
            Self::Line(p) | Self::Point(p) | Self::Billboard(p) => Some(p.geometry.bounds()),
            Self::BatchedMesh(batched) => Some(batched.batch.bounds()),
            _ => None,
        }
    }

    /// Mutable bound manager of geometric kinds
    pub fn bounds_mut(&mut self) -> Option<&mut GeometryBoundManager> {
        match self {
            Self::Mesh(mesh) => Some(mesh.geometry.bounds_mut()),
            Self::Line(p) | Self::Point(p) | Self::Billboard(p) => Some(p.geometry.bounds_mut()),
            Self::BatchedMesh(batched) => Some(batched.batch.bounds_mut()),
            _ => None,
        }
    }

    /// Geometry component of single-geometry kinds
    pub fn geometry_mut(&mut self) -> Option<&mut GeometryComponent> {
        match self {
            Self::Mesh(mesh) => Some(&mut mesh.geometry),
            Self::Line(p) | Self::Point(p) | Self::Billboard(p) => Some(&mut p.geometry),
            _ => None,
        }
    }

    /// Surface of mesh kinds
    pub fn surface(&self) -> Option<&MeshSurface> {
        match self {
            Self::Mesh(mesh) => Some(&mesh.surface),
            Self::BatchedMesh(batched) => Some(&batched.surface),
            _ => None,
        }
    }

    /// Mutable surface of mesh kinds
    pub fn surface_mut(&mut self) -> Option<&mut MeshSurface> {
        match self {
            Self::Mesh(mesh) => Some(&mut mesh.surface),
            Self::BatchedMesh(batched) => Some(&mut batched.surface),
            _ => None,
        }
    }

    /// Primitive state of point, line and billboard kinds
    pub fn primitive_mut(&mut self) -> Option<&mut PrimitiveNode> {
        match self {
            Self::Line(p) | Self::Point(p) | Self::Billboard(p) => Some(p),
            _ => None,
        }
    }

    /// Post-effect component, when the kind has one
    pub fn post_effect_mut(&mut self) -> Option<&mut PostEffectComponent> {
        match self {
            Self::Mesh(mesh) => Some(&mut mesh.surface.post_effect),
            Self::BatchedMesh(batched) => Some(&mut batched.surface.post_effect),
            Self::Line(p) | Self::Point(p) | Self::Billboard(p) => Some(&mut p.post_effect),
            _ => None,
        }
    }

    /// Recompute transformed bounds
    pub fn update_transformed(&mut self, total: &Mat4) {
        match self {
            Self::Mesh(mesh) => mesh.geometry.update_transformed(total),
            Self::Line(p) | Self::Point(p) | Self::Billboard(p) => {
                p.geometry.update_transformed(total);
            }
            Self::BatchedMesh(batched) => batched.batch.update_transformed(total),
            _ => {}
        }
    }

    /// Whether the node takes part in frustum culling
    ///
    /// Kinds without geometry bounds bypass culling.
    pub fn frustum_check(&self) -> bool {
        match self {
            Self::Mesh(mesh) => mesh.geometry.frustum_check(),
            Self::Line(p) | Self::Point(p) | Self::Billboard(p) => p.geometry.frustum_check(),
            Self::BatchedMesh(_) => true,
            _ => false,
        }
    }

    /// Kinds whose world bounds must be hit before exact testing
    pub fn uses_bound_reject(&self) -> bool {
        matches!(self, Self::Mesh(_) | Self::BatchedMesh(_))
    }

    /// Kind-specific hit-test guard
    pub fn can_hit_test(&self) -> bool {
        match self {
            Self::Mesh(mesh) => mesh.geometry.is_valid(),
            Self::Line(p) | Self::Point(p) | Self::Billboard(p) => p.geometry.is_valid(),
            Self::BatchedMesh(batched) => {
                batched.batch.is_valid() && batched.surface.material.material().is_some()
            }
            _ => false,
        }
    }

    /// Nearest hit of `ray` against the kind's geometry placed by `total`
    pub fn hit_test(
        &self,
        total: &Mat4,
        ray: &Ray,
        screen_view_projection: Mat4,
        config: &SceneConfig,
    ) -> Option<HitResult> {
        let params = |thickness: f32, fixed_size: bool| HitTestParams {
            screen_view_projection,
            thickness,
            fixed_size,
        };
        match self {
            Self::Mesh(mesh) => {
                let geometry = mesh.geometry.valid_geometry()?;
                let params = params(0.0, false);
                if mesh.geometry.instances().is_empty() {
                    return geometry.hit_test(total, ray, &params);
                }
                mesh.geometry
                    .instances()
                    .iter()
                    .filter_map(|instance| geometry.hit_test(&(total * instance), ray, &params))
                    .min_by(|a, b| a.distance.total_cmp(&b.distance))
            }
            Self::Point(p) => {
                let thickness = p.hit_test_thickness.unwrap_or(config.hit_test.point_thickness);
                p.geometry.valid_geometry()?.hit_test(total, ray, &params(thickness, false))
            }
            Self::Line(p) => {
                let thickness = p.hit_test_thickness.unwrap_or(config.hit_test.line_thickness);
                p.geometry.valid_geometry()?.hit_test(total, ray, &params(thickness, false))
            }
            Self::Billboard(p) => {
                let thickness = p.hit_test_thickness.unwrap_or(0.0);
                p.geometry.valid_geometry()?.hit_test(total, ray, &params(thickness, p.fixed_size))
            }
            Self::BatchedMesh(batched) => batched.batch.hit_test(total, ray, &params(0.0, false)),
            _ => None,
        }
    }

    /// Per-frame work that does not draw: octree construction
    pub fn update_not_render(&mut self, config: &SceneConfig) {
        if !config.spatial.build_geometry_octrees {
            return;
        }
        let min = config.spatial.octree_min_primitives;
        match self {
            Self::Mesh(mesh) => build_geometry_octree(&mesh.geometry, min, config),
            Self::Line(p) | Self::Point(p) | Self::Billboard(p) => {
                build_geometry_octree(&p.geometry, min, config);
            }
            Self::BatchedMesh(batched) => {
                let primitives: usize = batched
                    .batch
                    .configs()
                    .iter()
                    .map(|c| c.geometry.primitive_count())
                    .sum();
                if primitives >= min {
                    batched.batch.update_octree(&config.octree);
                }
            }
            _ => {}
        }
    }
}

fn build_geometry_octree(
    component: &GeometryComponent,
    min_primitives: usize,
    config: &SceneConfig,
) {
    if let Some(geometry) = component.valid_geometry() {
        if geometry.primitive_count() >= min_primitives && !geometry.tree_built() {
            geometry.update_octree(&config.octree);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_factories_satisfy_requirements() {
        for node_type in [
            NodeType::Mesh,
            NodeType::Line,
            NodeType::Point,
            NodeType::Billboard,
            NodeType::BatchedMesh,
            NodeType::Light,
            NodeType::EnvironmentMap,
            NodeType::DepthPrepass,
            NodeType::PostEffectXRay,
            NodeType::Group,
        ] {
            let caps = node_type.default_factory().capabilities();
            let kind = NodeKind::new(node_type, caps).unwrap();
            assert_eq!(kind.node_type(), node_type);
        }
    }

    #[test]
    fn test_light_needs_light_capability() {
        let err = NodeKind::new(NodeType::Light, CoreCapabilities::SKYBOX).unwrap_err();
        assert!(matches!(
            err,
            SceneError::MissingCapability { component: "LightNode", capability: "light" }
        ));
    }

    #[test]
    fn test_geometry_predicates() {
        let cube = Geometry3D::unit_cube();
        assert!(is_mesh(&cube));
        assert!(!is_line(&cube));
        assert!(!is_mesh(&Geometry3D::mesh(Vec::new(), Vec::new())));
        assert!(is_point(&Geometry3D::points(vec![crate::foundation::math::Vec3::zeros()])));
    }
}
