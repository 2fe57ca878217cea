//! Concrete render cores, one per node family

use super::{
    CoreCapabilities, CoreState, GeometryCapability, GeometrySlot, InvertNormalCapability,
    LightCapability, LightParams, MaterialCapability, PrimitiveStyleCapability,
    RasterDescription, RasterStateCapability, RenderCore, ShadowCapability, SkyboxCapability,
    WireframeCapability, XRayCapability, XRaySettings,
};
use crate::entity::EntityId;
use crate::foundation::math::{Color4, Vec2};
use crate::render::context::{DrawKind, RenderContext};
use crate::render::effects::MaterialVariable;
use crate::render::post_effect::{COLOR_ATTRIBUTE, OUTLINE_FADING_ATTRIBUTE};
use crate::render::technique::pass_names;

/// Triangle mesh core, also used for batched meshes
#[derive(Debug)]
pub struct MeshCore {
    state: CoreState,
    geometry: GeometrySlot,
    material: Option<MaterialVariable>,
    raster: RasterDescription,
    invert_normal: bool,
    wireframe: bool,
    wireframe_color: Color4,
    throw_shadow: bool,
    batched: bool,
}

impl MeshCore {
    /// Mesh core for `owner`
    pub fn new(owner: EntityId) -> Self {
        Self {
            state: CoreState::new(owner),
            geometry: GeometrySlot::default(),
            material: None,
            raster: RasterDescription::default(),
            invert_normal: false,
            wireframe: false,
            wireframe_color: Color4::new(0.0, 0.0, 1.0, 1.0),
            throw_shadow: false,
            batched: false,
        }
    }

    /// Mesh core drawing a merged batch
    pub fn batched(owner: EntityId) -> Self {
        Self {
            batched: true,
            ..Self::new(owner)
        }
    }

    /// Capabilities of every mesh core
    pub const CAPABILITIES: CoreCapabilities = CoreCapabilities::GEOMETRY
        .union(CoreCapabilities::MATERIAL)
        .union(CoreCapabilities::RASTER_STATE)
        .union(CoreCapabilities::INVERT_NORMAL)
        .union(CoreCapabilities::WIREFRAME)
        .union(CoreCapabilities::SHADOW);

    fn record(&self, context: &mut RenderContext, pass: &str) -> bool {
        if self.geometry.geometry_buffer().is_none() {
            return false;
        }
        let kind = if self.batched { DrawKind::BatchedMesh } else { DrawKind::Mesh };
        let Some(mut command) = self.state.draw(pass, kind) else {
            return false;
        };
        command.material_variable = self.material_variable_id();
        command.instance_count = self.geometry.draw_count();
        if pass == pass_names::WIREFRAME {
            command.color = Some(self.wireframe_color);
        }
        context.record(command);
        true
    }
}

impl RenderCore for MeshCore {
    fn state(&self) -> &CoreState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut CoreState {
        &mut self.state
    }

    fn capabilities(&self) -> CoreCapabilities {
        Self::CAPABILITIES
    }

    fn render(&mut self, context: &mut RenderContext) {
        if self.record(context, pass_names::MESH_DEFAULT) && self.wireframe {
            self.record(context, pass_names::WIREFRAME);
        }
    }

    fn render_shadow(&mut self, context: &mut RenderContext) {
        if self.throw_shadow {
            self.record(context, pass_names::SHADOW);
        }
    }

    fn render_custom(&mut self, context: &mut RenderContext) {
        if let Some(pass) = context.custom_pass().map(str::to_string) {
            self.record(context, &pass);
        }
    }

    fn geometry(&mut self) -> Option<&mut dyn GeometryCapability> {
        Some(&mut self.geometry)
    }

    fn material(&mut self) -> Option<&mut dyn MaterialCapability> {
        Some(self)
    }

    fn raster_state(&mut self) -> Option<&mut dyn RasterStateCapability> {
        Some(self)
    }

    fn invert_normal(&mut self) -> Option<&mut dyn InvertNormalCapability> {
        Some(self)
    }

    fn wireframe(&mut self) -> Option<&mut dyn WireframeCapability> {
        Some(self)
    }

    fn shadow(&mut self) -> Option<&mut dyn ShadowCapability> {
        Some(self)
    }
}

impl MaterialCapability for MeshCore {
    fn set_material_variable(&mut self, variable: Option<MaterialVariable>) {
        self.material = variable;
    }

    fn material_variable_id(&self) -> u16 {
        self.material.as_ref().map_or(0, MaterialVariable::id)
    }
}

impl RasterStateCapability for MeshCore {
    fn set_raster_description(&mut self, description: RasterDescription) {
        self.raster = description;
    }

    fn raster_description(&self) -> RasterDescription {
        self.raster
    }
}

impl InvertNormalCapability for MeshCore {
    fn set_invert_normal(&mut self, invert: bool) {
        self.invert_normal = invert;
    }

    fn is_normal_inverted(&self) -> bool {
        self.invert_normal
    }
}

impl WireframeCapability for MeshCore {
    fn set_wireframe(&mut self, enabled: bool) {
        self.wireframe = enabled;
    }

    fn is_wireframe(&self) -> bool {
        self.wireframe
    }

    fn set_wireframe_color(&mut self, color: Color4) {
        self.wireframe_color = color;
    }

    fn wireframe_color(&self) -> Color4 {
        self.wireframe_color
    }
}

impl ShadowCapability for MeshCore {
    fn set_throw_shadow(&mut self, enabled: bool) {
        self.throw_shadow = enabled;
    }

    fn is_throwing_shadow(&self) -> bool {
        self.throw_shadow
    }
}

/// Point, line or billboard core
#[derive(Debug)]
pub struct PrimitiveCore {
    state: CoreState,
    geometry: GeometrySlot,
    kind: DrawKind,
    pass: &'static str,
    color: Color4,
    size: Vec2,
}

impl PrimitiveCore {
    /// Capabilities of every primitive core
    pub const CAPABILITIES: CoreCapabilities =
        CoreCapabilities::GEOMETRY.union(CoreCapabilities::PRIMITIVE_STYLE);

    fn new(owner: EntityId, kind: DrawKind, pass: &'static str, size: Vec2) -> Self {
        Self {
            state: CoreState::new(owner),
            geometry: GeometrySlot::default(),
            kind,
            pass,
            color: Color4::new(0.0, 0.0, 0.0, 1.0),
            size,
        }
    }

    /// Point list core
    pub fn points(owner: EntityId) -> Self {
        Self::new(owner, DrawKind::Points, pass_names::POINTS, Vec2::new(4.0, 4.0))
    }

    /// Line list core
    pub fn lines(owner: EntityId) -> Self {
        Self::new(owner, DrawKind::Lines, pass_names::LINES, Vec2::new(1.0, 1.0))
    }

    /// Billboard core
    pub fn billboards(owner: EntityId) -> Self {
        let mut core =
            Self::new(owner, DrawKind::Billboard, pass_names::BILLBOARD, Vec2::new(1.0, 1.0));
        core.color = Color4::new(1.0, 1.0, 1.0, 1.0);
        core
    }
}

impl RenderCore for PrimitiveCore {
    fn state(&self) -> &CoreState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut CoreState {
        &mut self.state
    }

    fn capabilities(&self) -> CoreCapabilities {
        Self::CAPABILITIES
    }

    fn render(&mut self, context: &mut RenderContext) {
        if self.geometry.geometry_buffer().is_none() {
            return;
        }
        if let Some(mut command) = self.state.draw(self.pass, self.kind) {
            command.instance_count = self.geometry.draw_count();
            command.color = Some(self.color);
            context.record(command);
        }
    }

    fn geometry(&mut self) -> Option<&mut dyn GeometryCapability> {
        Some(&mut self.geometry)
    }

    fn primitive_style(&mut self) -> Option<&mut dyn PrimitiveStyleCapability> {
        Some(self)
    }
}

impl PrimitiveStyleCapability for PrimitiveCore {
    fn set_color(&mut self, color: Color4) {
        self.color = color;
    }

    fn color(&self) -> Color4 {
        self.color
    }

    fn set_size(&mut self, size: Vec2) {
        self.size = size;
    }

    fn size(&self) -> Vec2 {
        self.size
    }
}

/// Environment map core
#[derive(Debug)]
pub struct SkyboxCore {
    state: CoreState,
    sky_dome: bool,
}

impl SkyboxCore {
    /// Skybox core for `owner`
    pub fn new(owner: EntityId) -> Self {
        Self {
            state: CoreState::new(owner),
            sky_dome: false,
        }
    }
}

impl RenderCore for SkyboxCore {
    fn state(&self) -> &CoreState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut CoreState {
        &mut self.state
    }

    fn capabilities(&self) -> CoreCapabilities {
        CoreCapabilities::SKYBOX
    }

    fn render(&mut self, context: &mut RenderContext) {
        let pass = if self.sky_dome { pass_names::SKY_DOME } else { pass_names::SKYBOX };
        if let Some(command) = self.state.draw(pass, DrawKind::Skybox) {
            context.record(command);
        }
    }

    fn skybox(&mut self) -> Option<&mut dyn SkyboxCapability> {
        Some(self)
    }
}

impl SkyboxCapability for SkyboxCore {
    fn set_sky_dome(&mut self, enabled: bool) {
        self.sky_dome = enabled;
    }

    fn is_sky_dome(&self) -> bool {
        self.sky_dome
    }
}

/// Light core
#[derive(Debug)]
pub struct LightCore {
    state: CoreState,
    light: LightParams,
}

impl LightCore {
    /// Light core for `owner`
    pub fn new(owner: EntityId) -> Self {
        Self {
            state: CoreState::new(owner),
            light: LightParams::default(),
        }
    }
}

impl RenderCore for LightCore {
    fn state(&self) -> &CoreState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut CoreState {
        &mut self.state
    }

    fn capabilities(&self) -> CoreCapabilities {
        CoreCapabilities::LIGHT
    }

    fn render(&mut self, context: &mut RenderContext) {
        if let Some(mut command) = self.state.draw(pass_names::LIGHT, DrawKind::Light) {
            command.color = Some(self.light.color);
            context.record(command);
        }
    }

    fn light(&mut self) -> Option<&mut dyn LightCapability> {
        Some(self)
    }
}

impl LightCapability for LightCore {
    fn set_light(&mut self, light: LightParams) {
        self.light = light;
    }

    fn light_params(&self) -> LightParams {
        self.light
    }
}

/// Depth-only prepass marker
#[derive(Debug)]
pub struct DepthPrepassCore {
    state: CoreState,
}

impl DepthPrepassCore {
    /// Prepass core for `owner`
    pub fn new(owner: EntityId) -> Self {
        Self {
            state: CoreState::new(owner),
        }
    }
}

impl RenderCore for DepthPrepassCore {
    fn state(&self) -> &CoreState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut CoreState {
        &mut self.state
    }

    fn capabilities(&self) -> CoreCapabilities {
        CoreCapabilities::empty()
    }

    fn render(&mut self, context: &mut RenderContext) {
        if let Some(command) = self.state.draw(pass_names::DEPTH_PREPASS, DrawKind::DepthPrepass) {
            context.record(command);
        }
    }
}

/// X-ray outline over every node carrying the effect
#[derive(Debug)]
pub struct XRayCore {
    state: CoreState,
    settings: XRaySettings,
}

impl XRayCore {
    /// X-ray core for `owner`
    pub fn new(owner: EntityId) -> Self {
        Self {
            state: CoreState::new(owner),
            settings: XRaySettings::default(),
        }
    }
}

impl RenderCore for XRayCore {
    fn state(&self) -> &CoreState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut CoreState {
        &mut self.state
    }

    fn capabilities(&self) -> CoreCapabilities {
        CoreCapabilities::XRAY
    }

    fn render(&mut self, context: &mut RenderContext) {
        let mut commands = Vec::new();
        for target in context.post_effect_targets() {
            let Some(effect) = target.effects.get(&self.settings.effect_name) else {
                continue;
            };
            let color = effect.color(COLOR_ATTRIBUTE).unwrap_or(self.settings.color);
            let fading = effect
                .float(OUTLINE_FADING_ATTRIBUTE)
                .unwrap_or(self.settings.outline_fading_factor);
            if self.settings.double_pass {
                let stencil = self.state.draw(pass_names::XRAY_STENCIL, DrawKind::PostEffect);
                if let Some(mut stencil) = stencil {
                    stencil.node = target.node;
                    stencil.model = target.model;
                    stencil.material_variable = target.material_variable;
                    commands.push(stencil);
                }
            }
            if let Some(mut draw) = self.state.draw(pass_names::XRAY, DrawKind::PostEffect) {
                draw.node = target.node;
                draw.model = target.model;
                draw.material_variable = target.material_variable;
                draw.color = Some(color);
                draw.outline_fading = Some(fading);
                commands.push(draw);
            }
        }
        for command in commands {
            context.record(command);
        }
    }

    fn xray(&mut self) -> Option<&mut dyn XRayCapability> {
        Some(self)
    }
}

impl XRayCapability for XRayCore {
    fn set_xray_settings(&mut self, settings: XRaySettings) {
        self.settings = settings;
    }

    fn xray_settings(&self) -> &XRaySettings {
        &self.settings
    }
}

/// Core of nodes that draw nothing
#[derive(Debug)]
pub struct EmptyCore {
    state: CoreState,
}

impl EmptyCore {
    /// Empty core for `owner`
    pub fn new(owner: EntityId) -> Self {
        Self {
            state: CoreState::new(owner),
        }
    }
}

impl RenderCore for EmptyCore {
    fn state(&self) -> &CoreState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut CoreState {
        &mut self.state
    }

    fn capabilities(&self) -> CoreCapabilities {
        CoreCapabilities::empty()
    }

    fn render(&mut self, _context: &mut RenderContext) {}
}
