//! Frame driver boundary consumed by scene nodes

use super::effects::EffectsManager;
use super::technique::RenderTechnique;
use bitflags::bitflags;
use std::cell::Cell;
use std::rc::Rc;

bitflags! {
    /// Pending invalidation requests
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct InvalidateFlags: u8 {
        /// Redraw needed
        const RENDER = 1;
        /// Graph structure or attachment changed; re-sort and re-cull
        const SCENE_GRAPH = 1 << 1;
        /// Per-frame renderable lists must be rebuilt
        const PER_FRAME_RENDERABLES = 1 << 2;
    }
}

/// The render host a node attaches to
///
/// Nodes keep only a weak reference to their host. All methods take `&self`;
/// hosts use interior mutability for their invalidation state.
pub trait RenderHost {
    /// Resource manager; attach is a no-op without one
    fn effects_manager(&self) -> Option<Rc<EffectsManager>>;

    /// Host-preferred technique, consulted before the manager's first one
    fn render_technique(&self) -> Option<Rc<RenderTechnique>> {
        None
    }

    /// Deferred lighting disables point and line rendering
    fn is_deferred_lighting(&self) -> bool {
        false
    }

    /// Request a redraw
    fn invalidate_render(&self);

    /// Request a scene-graph rebuild
    fn invalidate_scene_graph(&self);

    /// Request the per-frame renderable lists to be rebuilt
    fn invalidate_per_frame_renderables(&self);
}

/// Render host that records invalidations as flags
#[derive(Debug, Default)]
pub struct DefaultRenderHost {
    effects: Option<Rc<EffectsManager>>,
    technique: Option<Rc<RenderTechnique>>,
    deferred_lighting: Cell<bool>,
    flags: Cell<InvalidateFlags>,
}

impl DefaultRenderHost {
    /// Host serving `effects`
    pub fn new(effects: Rc<EffectsManager>) -> Self {
        Self {
            effects: Some(effects),
            ..Self::default()
        }
    }

    /// Host with the standard technique set
    pub fn with_default_effects() -> Self {
        Self::new(Rc::new(EffectsManager::with_default_techniques()))
    }

    /// Host without a resource manager; nodes cannot attach to it
    pub fn without_effects() -> Self {
        Self::default()
    }

    /// Builder: prefer the named technique for nodes without their own
    pub fn with_technique(mut self, name: &str) -> Self {
        self.technique = self.effects.as_ref().and_then(|e| e.technique(name));
        self
    }

    /// Toggle deferred lighting
    pub fn set_deferred_lighting(&self, enabled: bool) {
        self.deferred_lighting.set(enabled);
        self.invalidate_scene_graph();
    }

    /// Pending requests without clearing them
    pub fn pending(&self) -> InvalidateFlags {
        self.flags.get()
    }

    /// Pending requests, clearing them
    pub fn take_invalidations(&self) -> InvalidateFlags {
        self.flags.replace(InvalidateFlags::empty())
    }

    fn raise(&self, flags: InvalidateFlags) {
        self.flags.set(self.flags.get() | flags);
    }
}

impl RenderHost for DefaultRenderHost {
    fn effects_manager(&self) -> Option<Rc<EffectsManager>> {
        self.effects.clone()
    }

    fn render_technique(&self) -> Option<Rc<RenderTechnique>> {
        self.technique.clone()
    }

    fn is_deferred_lighting(&self) -> bool {
        self.deferred_lighting.get()
    }

    fn invalidate_render(&self) {
        self.raise(InvalidateFlags::RENDER);
    }

    fn invalidate_scene_graph(&self) {
        self.raise(InvalidateFlags::SCENE_GRAPH | InvalidateFlags::RENDER);
    }

    fn invalidate_per_frame_renderables(&self) {
        self.raise(InvalidateFlags::PER_FRAME_RENDERABLES | InvalidateFlags::RENDER);
    }
}
