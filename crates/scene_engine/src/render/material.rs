//! Material parameter sets

use crate::foundation::math::Color4;
use std::sync::atomic::{AtomicU32, Ordering};

/// Unique identifier for materials
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialId(pub u32);

impl MaterialId {
    fn next() -> Self {
        static NEXT: AtomicU32 = AtomicU32::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

/// Phong-style material parameters
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    /// Unique identifier for this material
    pub id: MaterialId,
    /// Optional name for debugging
    pub name: Option<String>,
    /// Diffuse colour; alpha below 1 suggests transparency
    pub diffuse: Color4,
    /// Emissive colour
    pub emissive: Color4,
    /// Specular exponent
    pub shininess: f32,
}

impl Material {
    /// New material with a fresh id
    pub fn new(diffuse: Color4) -> Self {
        Self {
            id: MaterialId::next(),
            name: None,
            diffuse,
            emissive: Color4::new(0.0, 0.0, 0.0, 1.0),
            shininess: 32.0,
        }
    }

    /// Builder: attach a debug name
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::new(Color4::new(1.0, 1.0, 1.0, 1.0))
    }
}
