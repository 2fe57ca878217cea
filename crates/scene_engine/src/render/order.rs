//! Render buckets and draw-order keys

/// Bucket a node is drawn in; buckets are submitted in declaration order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum RenderType {
    /// Light accumulation
    Light,
    /// Pre-processing passes such as depth prepass
    PreProc,
    /// Opaque geometry, sorted by order key
    #[default]
    Opaque,
    /// Alpha-blended geometry
    Transparent,
    /// Particle systems
    Particle,
    /// Post-processing effects
    PostEffect,
}

impl RenderType {
    /// All buckets in submission order
    pub const ALL: [Self; 6] = [
        Self::Light,
        Self::PreProc,
        Self::Opaque,
        Self::Transparent,
        Self::Particle,
        Self::PostEffect,
    ];
}

/// Sort key: manual render order in the high 16 bits, a kind-specific
/// secondary key (material variable id for meshes) in the low 16 bits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct OrderKey(u32);

impl OrderKey {
    /// Combine render order and secondary key
    pub const fn new(render_order: u16, secondary: u16) -> Self {
        Self(((render_order as u32) << 16) | secondary as u32)
    }

    /// Manual render order
    pub const fn render_order(self) -> u16 {
        (self.0 >> 16) as u16
    }

    /// Secondary key
    pub const fn secondary(self) -> u16 {
        (self.0 & 0xFFFF) as u16
    }

    /// Packed value
    pub const fn raw(self) -> u32 {
        self.0
    }
}
