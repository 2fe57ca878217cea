//! Math utilities and types
//!
//! Column-vector conventions throughout: a point is transformed as `M * p`,
//! and a child's world matrix is `parent_total * local`.

pub use nalgebra::{Matrix4, Vector2, Vector3, Vector4};

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// 3D vector type
pub type Vec3 = Vector3<f32>;

/// 4D vector type
pub type Vec4 = Vector4<f32>;

/// 4x4 matrix type
pub type Mat4 = Matrix4<f32>;

/// 3D point type
pub type Point3 = nalgebra::Point3<f32>;

/// Linear RGBA colour
pub type Color4 = Vec4;

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// Pi / 4
    pub const QUARTER_PI: f32 = PI * 0.25;
}

/// Math utility functions
pub mod utils {
    use super::{Mat4, Point3, Vec3};

    /// Transform a position (w = 1) with perspective divide
    pub fn transform_point(matrix: &Mat4, point: &Vec3) -> Vec3 {
        matrix.transform_point(&Point3::from(*point)).coords
    }

    /// Transform a direction (w = 0)
    pub fn transform_vector(matrix: &Mat4, vector: &Vec3) -> Vec3 {
        matrix.transform_vector(vector)
    }

    /// Largest axis scale encoded in the upper 3x3 block
    pub fn max_scale(matrix: &Mat4) -> f32 {
        (0..3)
            .map(|c| Vec3::new(matrix[(0, c)], matrix[(1, c)], matrix[(2, c)]).magnitude())
            .fold(0.0, f32::max)
    }

    /// Exact element-wise comparison, the dirty test used by transform propagation
    pub fn bitwise_eq(a: &Mat4, b: &Mat4) -> bool {
        a.iter().zip(b.iter()).all(|(x, y)| x.to_bits() == y.to_bits())
    }
}

/// Extension trait for Mat4 with additional convenience methods
pub trait Mat4Ext {
    /// Translation matrix
    fn translation(x: f32, y: f32, z: f32) -> Mat4;

    /// Create a rotation matrix around the Y axis
    fn rotation_y(angle: f32) -> Mat4;

    /// OpenGL-style perspective projection, depth mapped to [-1, 1]
    fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4;

    /// Right-handed look-at view matrix
    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4;

    /// Maps normalized device coordinates to pixels, y pointing down
    fn viewport(width: f32, height: f32) -> Mat4;
}

impl Mat4Ext for Mat4 {
    fn translation(x: f32, y: f32, z: f32) -> Mat4 {
        Mat4::new_translation(&Vec3::new(x, y, z))
    }

    fn rotation_y(angle: f32) -> Mat4 {
        Mat4::from_axis_angle(&Vec3::y_axis(), angle)
    }

    fn perspective(fov_y: f32, aspect: f32, near: f32, far: f32) -> Mat4 {
        Mat4::new_perspective(aspect, fov_y, near, far)
    }

    fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Mat4 {
        Mat4::look_at_rh(&Point3::from(eye), &Point3::from(target), &up)
    }

    fn viewport(width: f32, height: f32) -> Mat4 {
        let hw = width * 0.5;
        let hh = height * 0.5;
        Mat4::new(
            hw, 0.0, 0.0, hw,
            0.0, -hh, 0.0, hh,
            0.0, 0.0, 1.0, 0.0,
            0.0, 0.0, 0.0, 1.0,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_translation_moves_points() {
        let m = Mat4::translation(1.0, 2.0, 3.0);
        let p = utils::transform_point(&m, &Vec3::zeros());
        assert_relative_eq!(p, Vec3::new(1.0, 2.0, 3.0));
        // Directions ignore translation
        let v = utils::transform_vector(&m, &Vec3::x());
        assert_relative_eq!(v, Vec3::x());
    }

    #[test]
    fn test_viewport_maps_ndc_corners() {
        let vp = Mat4::viewport(800.0, 600.0);
        let top_left = utils::transform_point(&vp, &Vec3::new(-1.0, 1.0, 0.0));
        let bottom_right = utils::transform_point(&vp, &Vec3::new(1.0, -1.0, 0.0));
        assert_relative_eq!(top_left.x, 0.0);
        assert_relative_eq!(top_left.y, 0.0);
        assert_relative_eq!(bottom_right.x, 800.0);
        assert_relative_eq!(bottom_right.y, 600.0);
    }

    #[test]
    fn test_max_scale() {
        let m = Mat4::new_nonuniform_scaling(&Vec3::new(2.0, 5.0, 3.0));
        assert_relative_eq!(utils::max_scale(&m), 5.0);
    }

    #[test]
    fn test_bitwise_eq() {
        let a = Mat4::translation(1.0, 0.0, 0.0);
        let mut b = a;
        assert!(utils::bitwise_eq(&a, &b));
        b[(0, 3)] = 1.000_001;
        assert!(!utils::bitwise_eq(&a, &b));
    }
}
