//! Components composed onto scene nodes
//!
//! Every component binds to the node's render core through a
//! [`CoreBinding`](crate::render::CoreBinding). Constructors take the
//! capabilities declared by the node's core factory and fail when the
//! capability the component drives is missing.

mod batched;
mod bound_manager;
mod geometry;
mod material;
mod post_effect;
mod render_state;

pub use batched::BatchedGeometryComponent;
pub use bound_manager::{BoundSource, GeometryBoundManager};
pub use geometry::GeometryComponent;
pub use material::MaterialComponent;
pub use post_effect::PostEffectComponent;
pub use render_state::{
    InvertNormalComponent, IsTransparentComponent, RasterStateComponent, RenderWireframeComponent,
    ShadowComponent,
};

use crate::error::{SceneError, SceneResult};
use crate::render::CoreCapabilities;

fn require(
    available: CoreCapabilities,
    needed: CoreCapabilities,
    component: &'static str,
) -> SceneResult<()> {
    if available.contains(needed) {
        Ok(())
    } else {
        Err(SceneError::MissingCapability {
            component,
            capability: needed.describe(),
        })
    }
}
