//! Render-side collaborators of the scene graph
//!
//! Nothing in here talks to a GPU. Cores record [`DrawCommand`]s into a
//! [`RenderContext`]; a backend replays them.

pub mod context;
pub mod core;
pub mod effects;
pub mod host;
pub mod material;
pub mod order;
pub mod post_effect;
pub mod technique;

pub use context::{DrawCommand, DrawKind, PostEffectTarget, RenderContext};
pub use self::core::{
    CoreBinding, CoreCapabilities, CoreFactory, CoreState, CullMode, FillMode, LightKind,
    LightParams, RasterDescription, RenderCore, XRaySettings,
};
pub use effects::{
    BufferKey, EffectsManager, GeometryBufferHandle, GeometryBufferManager, MaterialVariable,
    MaterialVariableManager,
};
pub use host::{DefaultRenderHost, InvalidateFlags, RenderHost};
pub use material::{Material, MaterialId};
pub use order::{OrderKey, RenderType};
pub use post_effect::{parse_color, EffectAttributes};
pub use technique::{pass_names, technique_names, RenderTechnique};
