//! Per-frame camera state and the recorded draw stream

use super::post_effect::EffectAttributes;
use crate::entity::EntityId;
use crate::foundation::math::{constants, utils, Color4, Mat4, Mat4Ext, Vec2, Vec3};
use crate::geometry::HitTestParams;
use crate::spatial::{Frustum, Ray};
use std::collections::BTreeMap;

/// Primitive family of a draw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DrawKind {
    /// Triangle mesh
    Mesh,
    /// Merged batch of meshes
    BatchedMesh,
    /// Point list
    Points,
    /// Line list
    Lines,
    /// Billboards
    Billboard,
    /// Environment map
    Skybox,
    /// Light
    Light,
    /// Depth prepass
    DepthPrepass,
    /// Post-effect pass over another node's geometry
    PostEffect,
}

/// One recorded draw
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCommand {
    /// Node whose geometry is drawn
    pub node: EntityId,
    /// Technique name
    pub technique: String,
    /// Pass name
    pub pass: String,
    /// Primitive family
    pub kind: DrawKind,
    /// Material variable id, 0 without a material
    pub material_variable: u16,
    /// Instance count, 1 for non-instanced draws
    pub instance_count: usize,
    /// World matrix
    pub model: Mat4,
    /// Colour override for wireframe and post-effect passes
    pub color: Option<Color4>,
    /// Outline fade exponent of X-ray draws
    pub outline_fading: Option<f32>,
}

/// A node carrying post effects this frame
#[derive(Debug, Clone)]
pub struct PostEffectTarget {
    /// Node id
    pub node: EntityId,
    /// World matrix of the node
    pub model: Mat4,
    /// Material variable id of the node
    pub material_variable: u16,
    /// Effects attached to the node
    pub effects: BTreeMap<String, EffectAttributes>,
}

/// Camera, viewport and the draw stream of one frame
#[derive(Debug, Clone)]
pub struct RenderContext {
    view: Mat4,
    projection: Mat4,
    viewport: Vec2,
    frame: u64,
    custom_pass: Option<String>,
    post_effect_targets: Vec<PostEffectTarget>,
    commands: Vec<DrawCommand>,
}

impl RenderContext {
    /// Context for the given camera matrices and viewport size in pixels
    pub fn new(view: Mat4, projection: Mat4, width: f32, height: f32) -> Self {
        Self {
            view,
            projection,
            viewport: Vec2::new(width, height),
            frame: 0,
            custom_pass: None,
            post_effect_targets: Vec::new(),
            commands: Vec::new(),
        }
    }

    /// Perspective camera looking from `eye` at `target`, 45 degree vertical field of view
    pub fn look_at(eye: Vec3, target: Vec3, width: f32, height: f32) -> Self {
        let view = Mat4::look_at(eye, target, Vec3::y());
        let projection = Mat4::perspective(constants::QUARTER_PI, width / height, 0.1, 1000.0);
        Self::new(view, projection, width, height)
    }

    /// View matrix
    pub fn view(&self) -> &Mat4 {
        &self.view
    }

    /// Projection matrix
    pub fn projection(&self) -> &Mat4 {
        &self.projection
    }

    /// Replace the camera matrices
    pub fn set_camera(&mut self, view: Mat4, projection: Mat4) {
        self.view = view;
        self.projection = projection;
    }

    /// Viewport size in pixels
    pub fn viewport(&self) -> Vec2 {
        self.viewport
    }

    /// Projection times view
    pub fn view_projection(&self) -> Mat4 {
        self.projection * self.view
    }

    /// World to pixel transform
    pub fn screen_view_projection(&self) -> Mat4 {
        Mat4::viewport(self.viewport.x, self.viewport.y) * self.view_projection()
    }

    /// View frustum in world space
    pub fn frustum(&self) -> Frustum {
        Frustum::from_matrix(&self.view_projection())
    }

    /// Camera position in world space
    pub fn camera_position(&self) -> Vec3 {
        self.view
            .try_inverse()
            .map_or_else(Vec3::zeros, |inv| utils::transform_point(&inv, &Vec3::zeros()))
    }

    /// World ray through pixel `(x, y)`
    pub fn pick_ray(&self, x: f32, y: f32) -> Option<Ray> {
        let inverse = self.screen_view_projection().try_inverse()?;
        let near = utils::transform_point(&inverse, &Vec3::new(x, y, -1.0));
        let far = utils::transform_point(&inverse, &Vec3::new(x, y, 1.0));
        let direction = far - near;
        (direction.magnitude_squared() > 0.0).then(|| Ray::new(self.camera_position(), direction))
    }

    /// Screen-space parameters for hit testing
    pub fn hit_test_params(&self, thickness: f32, fixed_size: bool) -> HitTestParams {
        HitTestParams {
            screen_view_projection: self.screen_view_projection(),
            thickness,
            fixed_size,
        }
    }

    /// Frame counter
    pub fn frame(&self) -> u64 {
        self.frame
    }

    /// Advance the frame counter and drop last frame's draws
    pub fn begin_frame(&mut self) {
        self.frame += 1;
        self.commands.clear();
        self.post_effect_targets.clear();
    }

    /// Pass requested by custom rendering, if any
    pub fn custom_pass(&self) -> Option<&str> {
        self.custom_pass.as_deref()
    }

    /// Set the pass used by custom rendering
    pub fn set_custom_pass(&mut self, pass: Option<String>) {
        self.custom_pass = pass;
    }

    /// Nodes carrying post effects this frame
    pub fn post_effect_targets(&self) -> &[PostEffectTarget] {
        &self.post_effect_targets
    }

    /// Replace the per-frame post-effect list
    pub fn set_post_effect_targets(&mut self, targets: Vec<PostEffectTarget>) {
        self.post_effect_targets = targets;
    }

    /// Append a draw
    pub fn record(&mut self, command: DrawCommand) {
        self.commands.push(command);
    }

    /// Draws recorded so far
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Take the recorded draws
    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_camera_position() {
        let ctx = RenderContext::look_at(Vec3::new(1.0, 2.0, 10.0), Vec3::zeros(), 800.0, 600.0);
        assert_relative_eq!(ctx.camera_position(), Vec3::new(1.0, 2.0, 10.0), epsilon = 1e-4);
    }

    #[test]
    fn test_pick_ray_through_center() {
        let ctx = RenderContext::look_at(Vec3::new(0.0, 0.0, 10.0), Vec3::zeros(), 800.0, 600.0);
        let ray = ctx.pick_ray(400.0, 300.0).unwrap();
        assert_relative_eq!(ray.origin, Vec3::new(0.0, 0.0, 10.0), epsilon = 1e-4);
        assert_relative_eq!(ray.direction, -Vec3::z(), epsilon = 1e-4);
    }

    #[test]
    fn test_begin_frame_clears_draws() {
        let mut ctx =
            RenderContext::look_at(Vec3::new(0.0, 0.0, 10.0), Vec3::zeros(), 800.0, 600.0);
        ctx.record(DrawCommand {
            node: EntityId::next(),
            technique: "Mesh".into(),
            pass: "MeshDefault".into(),
            kind: DrawKind::Mesh,
            material_variable: 0,
            instance_count: 1,
            model: Mat4::identity(),
            color: None,
            outline_fading: None,
        });
        assert_eq!(ctx.commands().len(), 1);
        ctx.begin_frame();
        assert!(ctx.commands().is_empty());
        assert_eq!(ctx.frame(), 1);
    }
}
