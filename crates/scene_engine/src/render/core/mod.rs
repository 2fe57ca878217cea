//! Render cores: the GPU-facing counterpart of a scene node
//!
//! A node owns exactly one core, created on first attach. The scene graph
//! never knows which pipeline backs a core; components reach into it only
//! through the typed capability queries on [`RenderCore`], each of which
//! returns `None` when the core does not support that capability.

mod cores;

pub use cores::{
    DepthPrepassCore, EmptyCore, LightCore, MeshCore, PrimitiveCore, SkyboxCore, XRayCore,
};

use super::context::{DrawCommand, DrawKind, RenderContext};
use super::effects::{EffectsManager, GeometryBufferHandle, MaterialVariable};
use super::technique::RenderTechnique;
use crate::entity::EntityId;
use crate::foundation::math::{Color4, Mat4, Vec2, Vec3};
use bitflags::bitflags;
use std::fmt;
use std::rc::Rc;

bitflags! {
    /// Capability interfaces a render core implements
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CoreCapabilities: u16 {
        /// Geometry and instance buffers
        const GEOMETRY = 1;
        /// Material variable binding
        const MATERIAL = 1 << 1;
        /// Rasterizer state
        const RASTER_STATE = 1 << 2;
        /// Normal inversion
        const INVERT_NORMAL = 1 << 3;
        /// Wireframe overlay
        const WIREFRAME = 1 << 4;
        /// Shadow casting
        const SHADOW = 1 << 5;
        /// Colour and size of points, lines and billboards
        const PRIMITIVE_STYLE = 1 << 6;
        /// Environment map
        const SKYBOX = 1 << 7;
        /// Light parameters
        const LIGHT = 1 << 8;
        /// X-ray post effect
        const XRAY = 1 << 9;
    }
}

impl CoreCapabilities {
    /// Flag name for error reporting
    pub fn describe(self) -> &'static str {
        match self {
            Self::GEOMETRY => "geometry",
            Self::MATERIAL => "material",
            Self::RASTER_STATE => "raster state",
            Self::INVERT_NORMAL => "invert normal",
            Self::WIREFRAME => "wireframe",
            Self::SHADOW => "shadow",
            Self::PRIMITIVE_STYLE => "primitive style",
            Self::SKYBOX => "skybox",
            Self::LIGHT => "light",
            Self::XRAY => "xray",
            _ => "multiple",
        }
    }
}

/// Bookkeeping shared by every core
#[derive(Debug, Clone)]
pub struct CoreState {
    /// Node that owns the core
    pub owner: EntityId,
    /// Attached to a technique
    pub attached: bool,
    /// Technique assigned on attach
    pub technique: Option<Rc<RenderTechnique>>,
    /// World matrix pushed by the node each frame
    pub model_matrix: Mat4,
}

impl CoreState {
    /// Detached state for `owner`
    pub fn new(owner: EntityId) -> Self {
        Self {
            owner,
            attached: false,
            technique: None,
            model_matrix: Mat4::identity(),
        }
    }

    /// Draw of `pass`; `None` unless attached to a technique declaring the pass
    pub fn draw(&self, pass: &str, kind: DrawKind) -> Option<DrawCommand> {
        let technique = self.technique.as_ref().filter(|t| self.attached && t.has_pass(pass))?;
        Some(DrawCommand {
            node: self.owner,
            technique: technique.name().to_string(),
            pass: pass.to_string(),
            kind,
            material_variable: 0,
            instance_count: 1,
            model: self.model_matrix,
            color: None,
            outline_fading: None,
        })
    }
}

/// GPU resource holder of one node
pub trait RenderCore: fmt::Debug {
    /// Shared bookkeeping
    fn state(&self) -> &CoreState;

    /// Shared bookkeeping, mutable
    fn state_mut(&mut self) -> &mut CoreState;

    /// Capability interfaces this core implements
    fn capabilities(&self) -> CoreCapabilities;

    /// Hook run by [`RenderCore::attach`]; returning false aborts the attach
    fn on_attach(&mut self, _technique: &RenderTechnique) -> bool {
        true
    }

    /// Hook run by [`RenderCore::detach`]
    fn on_detach(&mut self) {}

    /// Bind to `technique`; idempotent
    fn attach(&mut self, technique: Rc<RenderTechnique>) -> bool {
        if self.state().attached {
            return true;
        }
        if !self.on_attach(&technique) {
            return false;
        }
        let state = self.state_mut();
        state.technique = Some(technique);
        state.attached = true;
        true
    }

    /// Release the technique; idempotent
    fn detach(&mut self) {
        if !self.state().attached {
            return;
        }
        self.on_detach();
        let state = self.state_mut();
        state.attached = false;
        state.technique = None;
    }

    /// Whether the core is bound to a technique
    fn is_attached(&self) -> bool {
        self.state().attached
    }

    /// Set the world matrix used by subsequent draws
    fn set_model_matrix(&mut self, model: Mat4) {
        self.state_mut().model_matrix = model;
    }

    /// Record the main draws
    fn render(&mut self, context: &mut RenderContext);

    /// Record shadow-map draws
    fn render_shadow(&mut self, _context: &mut RenderContext) {}

    /// Record draws for the context's custom pass
    fn render_custom(&mut self, _context: &mut RenderContext) {}

    /// Geometry buffer capability
    fn geometry(&mut self) -> Option<&mut dyn GeometryCapability> {
        None
    }

    /// Material capability
    fn material(&mut self) -> Option<&mut dyn MaterialCapability> {
        None
    }

    /// Raster-state capability
    fn raster_state(&mut self) -> Option<&mut dyn RasterStateCapability> {
        None
    }

    /// Normal inversion capability
    fn invert_normal(&mut self) -> Option<&mut dyn InvertNormalCapability> {
        None
    }

    /// Wireframe capability
    fn wireframe(&mut self) -> Option<&mut dyn WireframeCapability> {
        None
    }

    /// Shadow capability
    fn shadow(&mut self) -> Option<&mut dyn ShadowCapability> {
        None
    }

    /// Point, line and billboard style capability
    fn primitive_style(&mut self) -> Option<&mut dyn PrimitiveStyleCapability> {
        None
    }

    /// Environment map capability
    fn skybox(&mut self) -> Option<&mut dyn SkyboxCapability> {
        None
    }

    /// Light capability
    fn light(&mut self) -> Option<&mut dyn LightCapability> {
        None
    }

    /// X-ray capability
    fn xray(&mut self) -> Option<&mut dyn XRayCapability> {
        None
    }
}

/// Geometry and instance buffer binding
pub trait GeometryCapability {
    /// Bind or clear the geometry buffer
    fn set_geometry_buffer(&mut self, buffer: Option<GeometryBufferHandle>);
    /// Bound geometry buffer
    fn geometry_buffer(&self) -> Option<&GeometryBufferHandle>;
    /// Replace the per-instance world matrices; empty means not instanced
    fn set_instances(&mut self, instances: Vec<Mat4>);
    /// Number of instances, 0 when not instanced
    fn instance_count(&self) -> usize;
}

/// Material variable binding
pub trait MaterialCapability {
    /// Bind or clear the material variable
    fn set_material_variable(&mut self, variable: Option<MaterialVariable>);
    /// Bound variable id, 0 when none
    fn material_variable_id(&self) -> u16;
}

/// Polygon fill mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FillMode {
    /// Filled triangles
    #[default]
    Solid,
    /// Triangle edges only
    Wireframe,
}

/// Face culling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CullMode {
    /// Draw both faces
    #[default]
    None,
    /// Cull front faces
    Front,
    /// Cull back faces
    Back,
}

/// Rasterizer state of a mesh
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RasterDescription {
    /// Fill mode
    pub fill_mode: FillMode,
    /// Face culling
    pub cull_mode: CullMode,
    /// Constant depth bias
    pub depth_bias: i32,
    /// Maximum depth bias
    pub depth_bias_clamp: f32,
    /// Depth bias scaled by polygon slope
    pub slope_scaled_depth_bias: f32,
    /// Counter-clockwise winding is front facing
    pub front_counter_clockwise: bool,
    /// Clip against the near and far planes
    pub depth_clip: bool,
    /// Scissor test
    pub scissor: bool,
    /// Multisample anti-aliasing
    pub multisample: bool,
}

impl Default for RasterDescription {
    fn default() -> Self {
        Self {
            fill_mode: FillMode::Solid,
            cull_mode: CullMode::None,
            depth_bias: 0,
            depth_bias_clamp: 0.0,
            slope_scaled_depth_bias: 0.0,
            front_counter_clockwise: true,
            depth_clip: true,
            scissor: true,
            multisample: true,
        }
    }
}

/// Rasterizer state binding
pub trait RasterStateCapability {
    /// Replace the raster description
    fn set_raster_description(&mut self, description: RasterDescription);
    /// Current raster description
    fn raster_description(&self) -> RasterDescription;
}

/// Normal inversion flag
pub trait InvertNormalCapability {
    /// Flip shading normals
    fn set_invert_normal(&mut self, invert: bool);
    /// Whether normals are flipped
    fn is_normal_inverted(&self) -> bool;
}

/// Wireframe overlay
pub trait WireframeCapability {
    /// Toggle the overlay pass
    fn set_wireframe(&mut self, enabled: bool);
    /// Whether the overlay pass is drawn
    fn is_wireframe(&self) -> bool;
    /// Overlay colour
    fn set_wireframe_color(&mut self, color: Color4);
    /// Current overlay colour
    fn wireframe_color(&self) -> Color4;
}

/// Shadow casting flag
pub trait ShadowCapability {
    /// Toggle shadow-map rendering
    fn set_throw_shadow(&mut self, enabled: bool);
    /// Whether the node is drawn into shadow maps
    fn is_throwing_shadow(&self) -> bool;
}

/// Colour and size of points, lines and billboards
pub trait PrimitiveStyleCapability {
    /// Primitive colour
    fn set_color(&mut self, color: Color4);
    /// Current colour
    fn color(&self) -> Color4;
    /// Point size or line thickness in pixels
    fn set_size(&mut self, size: Vec2);
    /// Current size
    fn size(&self) -> Vec2;
}

/// Environment map settings
pub trait SkyboxCapability {
    /// Render as a sky dome instead of a cube
    fn set_sky_dome(&mut self, enabled: bool);
    /// Whether a sky dome is drawn
    fn is_sky_dome(&self) -> bool;
}

/// Light type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LightKind {
    /// Uniform ambient term
    Ambient,
    /// Parallel rays along `direction`
    #[default]
    Directional,
    /// Omni light at `position`
    Point,
    /// Cone light at `position` along `direction`
    Spot,
}

/// Parameters of one light
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightParams {
    /// Light type
    pub kind: LightKind,
    /// Light colour
    pub color: Color4,
    /// World direction for directional and spot lights
    pub direction: Vec3,
    /// World position for point and spot lights
    pub position: Vec3,
    /// Attenuation range
    pub range: f32,
}

impl Default for LightParams {
    fn default() -> Self {
        Self {
            kind: LightKind::Directional,
            color: Color4::new(1.0, 1.0, 1.0, 1.0),
            direction: -Vec3::y(),
            position: Vec3::zeros(),
            range: 100.0,
        }
    }
}

/// Light parameter binding
pub trait LightCapability {
    /// Replace the light parameters
    fn set_light(&mut self, light: LightParams);
    /// Current light parameters
    fn light_params(&self) -> LightParams;
}

/// Default X-ray effect name
pub const XRAY_EFFECT_NAME: &str = "xray";

/// X-ray outline settings
#[derive(Debug, Clone, PartialEq)]
pub struct XRaySettings {
    /// Effect name looked up on target nodes
    pub effect_name: String,
    /// Colour used when a target carries no colour attribute
    pub color: Color4,
    /// Outline fade exponent
    pub outline_fading_factor: f32,
    /// Draw a stencil pass first so only occluded parts are shaded
    pub double_pass: bool,
}

impl Default for XRaySettings {
    fn default() -> Self {
        Self {
            effect_name: XRAY_EFFECT_NAME.to_string(),
            color: Color4::new(0.0, 0.0, 1.0, 1.0),
            outline_fading_factor: 1.5,
            double_pass: false,
        }
    }
}

/// X-ray settings binding
pub trait XRayCapability {
    /// Replace the settings
    fn set_xray_settings(&mut self, settings: XRaySettings);
    /// Current settings
    fn xray_settings(&self) -> &XRaySettings;
}

/// Geometry binding shared by mesh and primitive cores
#[derive(Debug, Default)]
pub struct GeometrySlot {
    buffer: Option<GeometryBufferHandle>,
    instances: Vec<Mat4>,
}

impl GeometrySlot {
    /// Instances to draw, 1 when not instanced
    pub fn draw_count(&self) -> usize {
        self.instances.len().max(1)
    }
}

impl GeometryCapability for GeometrySlot {
    fn set_geometry_buffer(&mut self, buffer: Option<GeometryBufferHandle>) {
        self.buffer = buffer;
    }

    fn geometry_buffer(&self) -> Option<&GeometryBufferHandle> {
        self.buffer.as_ref()
    }

    fn set_instances(&mut self, instances: Vec<Mat4>) {
        self.instances = instances;
    }

    fn instance_count(&self) -> usize {
        self.instances.len()
    }
}

/// Creates render cores for one node kind
pub struct CoreFactory {
    capabilities: CoreCapabilities,
    create: Box<dyn Fn(EntityId) -> Box<dyn RenderCore>>,
}

impl CoreFactory {
    /// Factory whose cores implement `capabilities`
    pub fn new<F>(capabilities: CoreCapabilities, create: F) -> Self
    where
        F: Fn(EntityId) -> Box<dyn RenderCore> + 'static,
    {
        Self {
            capabilities,
            create: Box::new(create),
        }
    }

    /// Declared capabilities
    pub fn capabilities(&self) -> CoreCapabilities {
        self.capabilities
    }

    /// Build the core for `owner`
    pub fn create(&self, owner: EntityId) -> Box<dyn RenderCore> {
        let core = (self.create)(owner);
        if !core.capabilities().contains(self.capabilities) {
            log::warn!(
                "render core for {owner} lacks declared capabilities {:?}",
                self.capabilities - core.capabilities()
            );
        }
        core
    }
}

impl fmt::Debug for CoreFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoreFactory")
            .field("capabilities", &self.capabilities)
            .finish_non_exhaustive()
    }
}

/// What components bind to: the node's core and the host's resources
#[derive(Debug)]
pub struct CoreBinding {
    /// The node's render core
    pub core: Box<dyn RenderCore>,
    /// Resource manager of the attached host
    pub effects: Option<Rc<EffectsManager>>,
    /// Technique resolved on attach
    pub technique: Option<Rc<RenderTechnique>>,
}

impl CoreBinding {
    /// Detached binding around `core`
    pub fn new(core: Box<dyn RenderCore>) -> Self {
        Self {
            core,
            effects: None,
            technique: None,
        }
    }

    /// Name of the bound technique, empty when detached
    pub fn technique_name(&self) -> &str {
        self.technique.as_deref().map_or("", RenderTechnique::name)
    }
}
