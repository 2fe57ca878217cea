//! Named shader-pass collections resolved at attach time

/// Names of the techniques registered by [`super::EffectsManager::with_default_techniques`]
pub mod technique_names {
    /// Triangle meshes, batched meshes, depth prepass and X-ray
    pub const MESH: &str = "Mesh";
    /// Point clouds
    pub const POINTS: &str = "Points";
    /// Line lists
    pub const LINES: &str = "Lines";
    /// Billboards
    pub const BILLBOARD: &str = "Billboard";
    /// Environment map
    pub const SKYBOX: &str = "Skybox";
    /// Lights
    pub const LIGHT: &str = "Light";
}

/// Pass names used by the logical render cores
pub mod pass_names {
    /// Default mesh pass
    pub const MESH_DEFAULT: &str = "MeshDefault";
    /// Wireframe overlay
    pub const WIREFRAME: &str = "Wireframe";
    /// Shadow map pass
    pub const SHADOW: &str = "RenderShadow";
    /// Depth-only prepass
    pub const DEPTH_PREPASS: &str = "DepthPrepass";
    /// X-ray stencil pass
    pub const XRAY_STENCIL: &str = "XRayStencil";
    /// X-ray draw pass
    pub const XRAY: &str = "XRay";
    /// Points
    pub const POINTS: &str = "Points";
    /// Lines
    pub const LINES: &str = "Lines";
    /// Billboards
    pub const BILLBOARD: &str = "Billboard";
    /// Cube skybox
    pub const SKYBOX: &str = "Skybox";
    /// Sky dome
    pub const SKY_DOME: &str = "SkyDome";
    /// Light accumulation
    pub const LIGHT: &str = "Light";
}

/// Named collection of shader passes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderTechnique {
    name: String,
    passes: Vec<String>,
}

impl RenderTechnique {
    /// Technique with the given passes
    pub fn new<S: Into<String>>(
        name: impl Into<String>,
        passes: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            name: name.into(),
            passes: passes.into_iter().map(Into::into).collect(),
        }
    }

    /// Technique name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Pass names in declaration order
    pub fn passes(&self) -> &[String] {
        &self.passes
    }

    /// Whether the technique declares `pass`
    pub fn has_pass(&self, pass: &str) -> bool {
        self.passes.iter().any(|p| p == pass)
    }
}
