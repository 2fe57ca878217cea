//! Small state components pushed straight into the render core

use super::require;
use crate::component_base;
use crate::entity::{ComponentState, EntityComponent};
use crate::error::SceneResult;
use crate::foundation::math::Color4;
use crate::render::{CoreBinding, CoreCapabilities, RasterDescription, RenderType};

/// Rasterizer state of a mesh node
#[derive(Debug)]
pub struct RasterStateComponent {
    state: ComponentState,
    description: RasterDescription,
}

impl RasterStateComponent {
    /// Component with the default description
    pub fn new(capabilities: CoreCapabilities) -> SceneResult<Self> {
        require(capabilities, CoreCapabilities::RASTER_STATE, "RasterStateComponent")?;
        Ok(Self {
            state: ComponentState::new(),
            description: RasterDescription::default(),
        })
    }

    /// Current description
    pub fn description(&self) -> RasterDescription {
        self.description
    }

    /// Edit the description; pushed to the core when attached
    pub fn modify<F>(&mut self, edit: F, binding: Option<&mut CoreBinding>)
    where
        F: FnOnce(&mut RasterDescription),
    {
        edit(&mut self.description);
        if let Some(binding) = binding.filter(|_| self.state.is_attached()) {
            self.apply(binding);
        }
    }

    fn apply(&self, binding: &mut CoreBinding) {
        if let Some(core) = binding.core.raster_state() {
            core.set_raster_description(self.description);
        }
    }
}

impl EntityComponent<CoreBinding> for RasterStateComponent {
    component_base!();

    fn on_attach(&mut self, binding: &mut CoreBinding) -> bool {
        self.apply(binding);
        true
    }
}

/// Shadow casting flag
#[derive(Debug)]
pub struct ShadowComponent {
    state: ComponentState,
    throw_shadow: bool,
}

impl ShadowComponent {
    /// Component that does not cast shadows
    pub fn new(capabilities: CoreCapabilities) -> SceneResult<Self> {
        require(capabilities, CoreCapabilities::SHADOW, "ShadowComponent")?;
        Ok(Self {
            state: ComponentState::new(),
            throw_shadow: false,
        })
    }

    /// Whether the node casts shadows
    pub fn is_throwing_shadow(&self) -> bool {
        self.throw_shadow
    }

    /// Toggle shadow casting
    pub fn set_throw_shadow(&mut self, enabled: bool, binding: Option<&mut CoreBinding>) {
        self.throw_shadow = enabled;
        if let Some(binding) = binding.filter(|_| self.state.is_attached()) {
            self.apply(binding);
        }
    }

    fn apply(&self, binding: &mut CoreBinding) {
        if let Some(core) = binding.core.shadow() {
            core.set_throw_shadow(self.throw_shadow);
        }
    }
}

impl EntityComponent<CoreBinding> for ShadowComponent {
    component_base!();

    fn on_attach(&mut self, binding: &mut CoreBinding) -> bool {
        self.apply(binding);
        true
    }
}

/// Normal inversion flag
#[derive(Debug)]
pub struct InvertNormalComponent {
    state: ComponentState,
    invert: bool,
}

impl InvertNormalComponent {
    /// Component with normals as authored
    pub fn new(capabilities: CoreCapabilities) -> SceneResult<Self> {
        require(capabilities, CoreCapabilities::INVERT_NORMAL, "InvertNormalComponent")?;
        Ok(Self {
            state: ComponentState::new(),
            invert: false,
        })
    }

    /// Whether normals are flipped
    pub fn is_inverted(&self) -> bool {
        self.invert
    }

    /// Flip or restore normals
    pub fn set_invert(&mut self, invert: bool, binding: Option<&mut CoreBinding>) {
        self.invert = invert;
        if let Some(binding) = binding.filter(|_| self.state.is_attached()) {
            self.apply(binding);
        }
    }

    fn apply(&self, binding: &mut CoreBinding) {
        if let Some(core) = binding.core.invert_normal() {
            core.set_invert_normal(self.invert);
        }
    }
}

impl EntityComponent<CoreBinding> for InvertNormalComponent {
    component_base!();

    fn on_attach(&mut self, binding: &mut CoreBinding) -> bool {
        self.apply(binding);
        true
    }
}

/// Wireframe overlay flag and colour
#[derive(Debug)]
pub struct RenderWireframeComponent {
    state: ComponentState,
    enabled: bool,
    color: Color4,
}

impl RenderWireframeComponent {
    /// Disabled overlay, blue
    pub fn new(capabilities: CoreCapabilities) -> SceneResult<Self> {
        require(capabilities, CoreCapabilities::WIREFRAME, "RenderWireframeComponent")?;
        Ok(Self {
            state: ComponentState::new(),
            enabled: false,
            color: Color4::new(0.0, 0.0, 1.0, 1.0),
        })
    }

    /// Whether the overlay is drawn
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Overlay colour
    pub fn color(&self) -> Color4 {
        self.color
    }

    /// Toggle the overlay
    pub fn set_enabled(&mut self, enabled: bool, binding: Option<&mut CoreBinding>) {
        self.enabled = enabled;
        if let Some(binding) = binding.filter(|_| self.state.is_attached()) {
            self.apply(binding);
        }
    }

    /// Change the overlay colour
    pub fn set_color(&mut self, color: Color4, binding: Option<&mut CoreBinding>) {
        self.color = color;
        if let Some(binding) = binding.filter(|_| self.state.is_attached()) {
            self.apply(binding);
        }
    }

    fn apply(&self, binding: &mut CoreBinding) {
        if let Some(core) = binding.core.wireframe() {
            core.set_wireframe(self.enabled);
            core.set_wireframe_color(self.color);
        }
    }
}

impl EntityComponent<CoreBinding> for RenderWireframeComponent {
    component_base!();

    fn on_attach(&mut self, binding: &mut CoreBinding) -> bool {
        self.apply(binding);
        true
    }
}

/// Moves a node between the opaque and transparent buckets
#[derive(Debug, Default)]
pub struct IsTransparentComponent {
    state: ComponentState,
    transparent: bool,
}

impl IsTransparentComponent {
    /// Opaque by default
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the node is flagged transparent
    pub fn is_transparent(&self) -> bool {
        self.transparent
    }

    /// Set the flag
    pub fn set_transparent(&mut self, transparent: bool) {
        self.transparent = transparent;
    }

    /// Render type implied by the flag
    ///
    /// Only swaps between opaque and transparent; any other type is kept.
    pub fn apply(&self, render_type: RenderType) -> RenderType {
        match (self.transparent, render_type) {
            (true, RenderType::Opaque) => RenderType::Transparent,
            (false, RenderType::Transparent) => RenderType::Opaque,
            (_, other) => other,
        }
    }
}

impl EntityComponent<CoreBinding> for IsTransparentComponent {
    component_base!();
}
