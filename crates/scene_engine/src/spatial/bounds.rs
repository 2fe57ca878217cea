//! Bounding volumes, rays and the view frustum

use crate::foundation::math::{utils, Mat4, Vec3};

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Minimum corner of the bounding box
    pub min: Vec3,
    /// Maximum corner of the bounding box
    pub max: Vec3,
}

impl BoundingBox {
    /// Create a new box from min and max points
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Zero-sized box at the origin, used as the "no geometry" sentinel
    pub fn zero() -> Self {
        Self::new(Vec3::zeros(), Vec3::zeros())
    }

    /// Create a box centered at a point with given half-extents
    pub fn from_center_extents(center: Vec3, extents: Vec3) -> Self {
        Self {
            min: center - extents,
            max: center + extents,
        }
    }

    /// Tightest box around `points`; `None` when empty
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Vec3>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        Some(iter.fold(Self::new(first, first), |b, p| Self {
            min: b.min.inf(p),
            max: b.max.sup(p),
        }))
    }

    /// Center of the box
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Half-size of the box
    pub fn extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// True for the zero sentinel
    pub fn is_zero(&self) -> bool {
        self.min == Vec3::zeros() && self.max == Vec3::zeros()
    }

    /// The eight corners
    pub fn corners(&self) -> [Vec3; 8] {
        std::array::from_fn(|i| {
            Vec3::new(
                if i & 1 == 0 { self.min.x } else { self.max.x },
                if i & 2 == 0 { self.min.y } else { self.max.y },
                if i & 4 == 0 { self.min.z } else { self.max.z },
            )
        })
    }

    /// Check if this box contains a point (inclusive)
    pub fn contains_point(&self, point: Vec3) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
            && point.z >= self.min.z
            && point.z <= self.max.z
    }

    /// Check if this box overlaps another
    pub fn intersects(&self, other: &Self) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    /// Smallest box enclosing both
    pub fn merge(&self, other: &Self) -> Self {
        Self::new(self.min.inf(&other.min), self.max.sup(&other.max))
    }

    /// Grow every side by `amount`
    pub fn expand(&self, amount: f32) -> Self {
        let delta = Vec3::repeat(amount);
        Self::new(self.min - delta, self.max + delta)
    }

    /// Axis-aligned box enclosing this box after `matrix`
    pub fn transform(&self, matrix: &Mat4) -> Self {
        let corners = self.corners().map(|c| utils::transform_point(matrix, &c));
        Self::from_points(corners.iter()).unwrap_or(*self)
    }

    /// Slab test; distance to the entry point (0 when inside)
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f32> {
        let mut t_min = f32::NEG_INFINITY;
        let mut t_max = f32::INFINITY;

        for axis in 0..3 {
            let origin = ray.origin[axis];
            let dir = ray.direction[axis];
            if dir.abs() < f32::EPSILON {
                // Parallel to the slab: must already be inside it
                if origin < self.min[axis] || origin > self.max[axis] {
                    return None;
                }
                continue;
            }
            let inv = 1.0 / dir;
            let t1 = (self.min[axis] - origin) * inv;
            let t2 = (self.max[axis] - origin) * inv;
            t_min = t_min.max(t1.min(t2));
            t_max = t_max.min(t1.max(t2));
        }

        if t_max >= t_min && t_max >= 0.0 {
            Some(t_min.max(0.0))
        } else {
            None
        }
    }
}

impl Default for BoundingBox {
    fn default() -> Self {
        Self::zero()
    }
}

/// Bounding sphere
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    /// Center of the sphere
    pub center: Vec3,
    /// Radius of the sphere
    pub radius: f32,
}

impl BoundingSphere {
    /// Creates a new bounding sphere with the given center and radius
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Zero-radius sphere at the origin, the "no geometry" sentinel
    pub fn zero() -> Self {
        Self::new(Vec3::zeros(), 0.0)
    }

    /// Sphere centered on the bounding box of `points`
    pub fn from_points(points: &[Vec3]) -> Option<Self> {
        let center = BoundingBox::from_points(points)?.center();
        let radius = points
            .iter()
            .map(|p| (p - center).magnitude())
            .fold(0.0, f32::max);
        Some(Self::new(center, radius))
    }

    /// Sphere circumscribing a box
    pub fn from_box(bounds: &BoundingBox) -> Self {
        Self::new(bounds.center(), bounds.extents().magnitude())
    }

    /// True for the zero sentinel
    pub fn is_zero(&self) -> bool {
        self.radius == 0.0 && self.center == Vec3::zeros()
    }

    /// Smallest sphere enclosing both
    pub fn merge(&self, other: &Self) -> Self {
        let offset = other.center - self.center;
        let distance = offset.magnitude();
        if distance + other.radius <= self.radius {
            return *self;
        }
        if distance + self.radius <= other.radius {
            return *other;
        }
        let radius = (distance + self.radius + other.radius) * 0.5;
        let center = self.center + offset * ((radius - self.radius) / distance);
        Self::new(center, radius)
    }

    /// Sphere after `matrix`, radius scaled by the largest axis scale
    pub fn transform(&self, matrix: &Mat4) -> Self {
        Self::new(
            utils::transform_point(matrix, &self.center),
            self.radius * utils::max_scale(matrix),
        )
    }

    /// Check if this sphere overlaps a box
    pub fn intersects_box(&self, bounds: &BoundingBox) -> bool {
        let closest = self.center.sup(&bounds.min).inf(&bounds.max);
        (closest - self.center).magnitude_squared() <= self.radius * self.radius
    }

    /// Ray parameter of the first hit in front of the origin
    pub fn intersect_ray(&self, ray: &Ray) -> Option<f32> {
        let oc = ray.origin - self.center;
        let a = ray.direction.dot(&ray.direction);
        let b = 2.0 * oc.dot(&ray.direction);
        let c = oc.dot(&oc) - self.radius * self.radius;

        let discriminant = b * b - 4.0 * a * c;
        if discriminant < 0.0 {
            return None;
        }

        let sqrt_discriminant = discriminant.sqrt();
        let t1 = (-b - sqrt_discriminant) / (2.0 * a);
        let t2 = (-b + sqrt_discriminant) / (2.0 * a);

        if t1 >= 0.0 {
            Some(t1)
        } else if t2 >= 0.0 {
            Some(t2)
        } else {
            None
        }
    }
}

impl Default for BoundingSphere {
    fn default() -> Self {
        Self::zero()
    }
}

/// A ray for picking
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Origin point
    pub origin: Vec3,
    /// Unit direction
    pub direction: Vec3,
}

impl Ray {
    /// Creates a new ray; the direction is normalized
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    /// Point along the ray at parameter t
    pub fn point_at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Ray expressed in another space
    pub fn transform(&self, matrix: &Mat4) -> Self {
        Self::new(
            utils::transform_point(matrix, &self.origin),
            utils::transform_vector(matrix, &self.direction),
        )
    }

    /// Closest points between this ray and the segment `a`-`b`
    ///
    /// Returns `(ray_point, segment_point)`.
    pub fn closest_points_to_segment(&self, a: Vec3, b: Vec3) -> (Vec3, Vec3) {
        let d1 = self.direction;
        let d2 = b - a;
        let r = self.origin - a;
        let e = d2.dot(&d2);
        let f = d2.dot(&r);
        let c = d1.dot(&r);
        let bb = d1.dot(&d2);
        let denom = e - bb * bb;

        let mut s = if e > f32::EPSILON && denom.abs() > f32::EPSILON {
            ((bb * f - c * e) / denom).max(0.0)
        } else {
            0.0
        };
        let mut t = if e > f32::EPSILON { ((bb * s + f) / e).clamp(0.0, 1.0) } else { 0.0 };
        // Re-project the ray parameter after clamping the segment parameter
        s = (t * bb - c).max(0.0);
        if e > f32::EPSILON {
            t = ((bb * s + f) / e).clamp(0.0, 1.0);
        }
        (self.point_at(s), a + d2 * t)
    }
}

/// Plane as `normal · p + distance = 0`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Unit normal
    pub normal: Vec3,
    /// Signed offset from the origin
    pub distance: f32,
}

impl Plane {
    /// Create a new plane from normal and distance
    pub fn new(normal: Vec3, distance: f32) -> Self {
        Self {
            normal: normal.normalize(),
            distance,
        }
    }

    /// Plane from raw coefficients, normalized
    pub fn from_coefficients(a: f32, b: f32, c: f32, d: f32) -> Self {
        let length = Vec3::new(a, b, c).magnitude();
        if length <= f32::EPSILON {
            return Self { normal: Vec3::zeros(), distance: d };
        }
        Self {
            normal: Vec3::new(a, b, c) / length,
            distance: d / length,
        }
    }

    /// Signed distance from plane to point
    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        self.normal.dot(&point) + self.distance
    }
}

/// View frustum, planes facing inwards
#[derive(Debug, Clone, PartialEq)]
pub struct Frustum {
    /// Left, right, bottom, top, near, far
    pub planes: [Plane; 6],
}

impl Frustum {
    /// Gribb-Hartmann extraction from a view-projection matrix with
    /// OpenGL clip depth in [-1, 1]
    pub fn from_matrix(view_projection: &Mat4) -> Self {
        let m = view_projection;
        let row = |i: usize| [m[(i, 0)], m[(i, 1)], m[(i, 2)], m[(i, 3)]];
        let r0 = row(0);
        let r1 = row(1);
        let r2 = row(2);
        let r3 = row(3);
        let plane = |sign: f32, r: [f32; 4]| {
            Plane::from_coefficients(
                r3[0] + sign * r[0],
                r3[1] + sign * r[1],
                r3[2] + sign * r[2],
                r3[3] + sign * r[3],
            )
        };
        Self {
            planes: [
                plane(1.0, r0),
                plane(-1.0, r0),
                plane(1.0, r1),
                plane(-1.0, r1),
                plane(1.0, r2),
                plane(-1.0, r2),
            ],
        }
    }

    /// Check if a box is inside or intersects the frustum
    pub fn intersects_box(&self, bounds: &BoundingBox) -> bool {
        for plane in &self.planes {
            // Corner furthest along the plane normal
            let mut p = bounds.min;
            if plane.normal.x >= 0.0 { p.x = bounds.max.x; }
            if plane.normal.y >= 0.0 { p.y = bounds.max.y; }
            if plane.normal.z >= 0.0 { p.z = bounds.max.z; }

            if plane.distance_to_point(p) < 0.0 {
                return false;
            }
        }
        true
    }

    /// Check if a sphere is inside or intersects the frustum
    pub fn intersects_sphere(&self, sphere: &BoundingSphere) -> bool {
        self.planes
            .iter()
            .all(|plane| plane.distance_to_point(sphere.center) >= -sphere.radius)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{constants, Mat4Ext};
    use approx::assert_relative_eq;

    fn unit_cube() -> BoundingBox {
        BoundingBox::new(Vec3::repeat(-0.5), Vec3::repeat(0.5))
    }

    #[test]
    fn test_box_from_points() {
        let points = [Vec3::new(1.0, -2.0, 0.0), Vec3::new(-1.0, 3.0, 2.0)];
        let bounds = BoundingBox::from_points(&points).unwrap();
        assert_eq!(bounds.min, Vec3::new(-1.0, -2.0, 0.0));
        assert_eq!(bounds.max, Vec3::new(1.0, 3.0, 2.0));
        assert!(BoundingBox::from_points(&[] as &[Vec3]).is_none());
    }

    #[test]
    fn test_box_transform_translates() {
        let moved = unit_cube().transform(&Mat4::translation(2.0, 0.0, 0.0));
        assert_relative_eq!(moved.min, Vec3::new(1.5, -0.5, -0.5));
        assert_relative_eq!(moved.max, Vec3::new(2.5, 0.5, 0.5));
    }

    #[test]
    fn test_box_ray_hit_and_miss() {
        let hit = unit_cube().intersect_ray(&Ray::new(Vec3::new(0.0, 0.0, 5.0), -Vec3::z()));
        assert_relative_eq!(hit.unwrap(), 4.5);

        let miss = unit_cube().intersect_ray(&Ray::new(Vec3::new(2.0, 0.0, 5.0), -Vec3::z()));
        assert!(miss.is_none());

        let behind = unit_cube().intersect_ray(&Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::z()));
        assert!(behind.is_none());
    }

    #[test]
    fn test_flat_box_ray_on_boundary() {
        let flat = BoundingBox::new(Vec3::new(-1.0, -1.0, 0.0), Vec3::new(1.0, 1.0, 0.0));
        let ray = Ray::new(Vec3::new(1.0, 0.0, 5.0), -Vec3::z());
        assert_relative_eq!(flat.intersect_ray(&ray).unwrap(), 5.0);
    }

    #[test]
    fn test_sphere_merge_encloses_both() {
        let a = BoundingSphere::new(Vec3::zeros(), 1.0);
        let b = BoundingSphere::new(Vec3::new(4.0, 0.0, 0.0), 1.0);
        let merged = a.merge(&b);
        assert_relative_eq!(merged.center, Vec3::new(2.0, 0.0, 0.0));
        assert_relative_eq!(merged.radius, 3.0);
        assert_eq!(a.merge(&BoundingSphere::new(Vec3::zeros(), 0.5)), a);
    }

    #[test]
    fn test_sphere_ray_from_inside() {
        let sphere = BoundingSphere::new(Vec3::zeros(), 2.0);
        let t = sphere.intersect_ray(&Ray::new(Vec3::zeros(), Vec3::x())).unwrap();
        assert_relative_eq!(t, 2.0);
    }

    #[test]
    fn test_ray_segment_closest_points() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), -Vec3::z());
        let (on_ray, on_segment) =
            ray.closest_points_to_segment(Vec3::new(-1.0, 0.5, 0.0), Vec3::new(1.0, 0.5, 0.0));
        assert_relative_eq!(on_ray, Vec3::new(0.0, 0.0, 0.0), epsilon = 1e-5);
        assert_relative_eq!(on_segment, Vec3::new(0.0, 0.5, 0.0), epsilon = 1e-5);
    }

    #[test]
    fn test_frustum_culls_behind_camera() {
        let view = Mat4::look_at(Vec3::new(0.0, 0.0, 10.0), Vec3::zeros(), Vec3::y());
        let projection = Mat4::perspective(constants::QUARTER_PI, 4.0 / 3.0, 0.1, 100.0);
        let frustum = Frustum::from_matrix(&(projection * view));

        assert!(frustum.intersects_box(&unit_cube()));
        let behind = BoundingBox::from_center_extents(Vec3::new(0.0, 0.0, 20.0), Vec3::repeat(0.5));
        assert!(!frustum.intersects_box(&behind));
        let far_left =
            BoundingBox::from_center_extents(Vec3::new(-50.0, 0.0, 0.0), Vec3::repeat(0.5));
        assert!(!frustum.intersects_box(&far_left));
        assert!(frustum.intersects_sphere(&BoundingSphere::new(Vec3::zeros(), 1.0)));
    }
}
