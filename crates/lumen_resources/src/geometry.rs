//! Geometry Buffers
//!
//! A [`GeometryBuffers`] value is the renderer-facing half of a geometry:
//! the device buffer handles of one drawable primitive plus the index counts
//! for its triangle and line topologies. Uploading vertex data is the job of
//! whoever owns the device; the renderer only binds and draws.

use glam::{Affine3A, Vec3};

/// Opaque handle of a buffer object living on the graphics device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BufferId(pub u32);

/// Sphere enclosing a set of points, used for frustum culling.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BoundingSphere {
    pub center: Vec3,
    pub radius: f32,
}

impl BoundingSphere {
    #[must_use]
    pub const fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Computes a sphere centered on the axis-aligned bounds of `points`.
    ///
    /// The radius is the largest distance from that center to any point. An
    /// empty slice yields a zero sphere at the origin.
    #[must_use]
    pub fn from_points(points: &[Vec3]) -> Self {
        let Some(first) = points.first() else {
            return Self::default();
        };

        let (min, max) = points
            .iter()
            .fold((*first, *first), |(min, max), p| (min.min(*p), max.max(*p)));
        let center = (min + max) * 0.5;

        let radius_sq = points
            .iter()
            .map(|p| center.distance_squared(*p))
            .fold(0.0_f32, f32::max);

        Self {
            center,
            radius: radius_sq.sqrt(),
        }
    }

    /// Returns the sphere transformed into the space of `matrix`.
    ///
    /// The radius is scaled by the largest axis scale so non-uniform scales
    /// stay conservative.
    #[must_use]
    pub fn transformed(&self, matrix: &Affine3A) -> Self {
        let max_scale = matrix
            .matrix3
            .x_axis
            .length()
            .max(matrix.matrix3.y_axis.length())
            .max(matrix.matrix3.z_axis.length());

        Self {
            center: matrix.transform_point3(self.center),
            radius: self.radius * max_scale,
        }
    }

    /// Smallest sphere enclosing both `self` and `other`.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        let offset = other.center - self.center;
        let distance = offset.length();

        if distance + other.radius <= self.radius {
            return *self;
        }
        if distance + self.radius <= other.radius {
            return *other;
        }

        let radius = (distance + self.radius + other.radius) * 0.5;
        let center = self.center + offset * ((radius - self.radius) / distance);
        Self { center, radius }
    }
}

/// Device-side buffers of one drawable primitive.
///
/// `faces` indexes triangles and `lines` indexes the wireframe edges; both
/// hold unsigned 16-bit indices.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeometryBuffers {
    pub vertices: BufferId,
    pub colors: Option<BufferId>,
    pub uvs: Option<BufferId>,
    pub faces: BufferId,
    pub face_count: u32,
    pub lines: Option<BufferId>,
    pub line_count: u32,
    pub bounding_sphere: Option<BoundingSphere>,
}

impl GeometryBuffers {
    /// Creates buffers for a triangle list with `face_count` indices.
    #[must_use]
    pub fn new(vertices: BufferId, faces: BufferId, face_count: u32) -> Self {
        Self {
            vertices,
            colors: None,
            uvs: None,
            faces,
            face_count,
            lines: None,
            line_count: 0,
            bounding_sphere: None,
        }
    }

    #[must_use]
    pub fn with_colors(mut self, colors: BufferId) -> Self {
        self.colors = Some(colors);
        self
    }

    #[must_use]
    pub fn with_uvs(mut self, uvs: BufferId) -> Self {
        self.uvs = Some(uvs);
        self
    }

    /// Attaches the wireframe index buffer holding `line_count` indices.
    #[must_use]
    pub fn with_lines(mut self, lines: BufferId, line_count: u32) -> Self {
        self.lines = Some(lines);
        self.line_count = line_count;
        self
    }

    #[must_use]
    pub fn with_bounding_sphere(mut self, sphere: BoundingSphere) -> Self {
        self.bounding_sphere = Some(sphere);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sphere_from_points() {
        let points = [
            Vec3::new(-1.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, 2.0, 0.0),
        ];
        let sphere = BoundingSphere::from_points(&points);

        assert_eq!(sphere.center, Vec3::new(0.0, 1.0, 0.0));
        assert!((sphere.radius - 2.0_f32.sqrt()).abs() < 1e-5);
    }

    #[test]
    fn test_sphere_from_no_points() {
        assert_eq!(BoundingSphere::from_points(&[]), BoundingSphere::default());
    }

    #[test]
    fn test_sphere_transform_uses_max_scale() {
        let sphere = BoundingSphere::new(Vec3::ZERO, 1.0);
        let m = Affine3A::from_scale_rotation_translation(
            Vec3::new(1.0, 3.0, 2.0),
            glam::Quat::IDENTITY,
            Vec3::new(0.0, 0.0, -5.0),
        );
        let t = sphere.transformed(&m);

        assert_eq!(t.center, Vec3::new(0.0, 0.0, -5.0));
        assert!((t.radius - 3.0).abs() < 1e-5);
    }

    #[test]
    fn test_sphere_union() {
        let a = BoundingSphere::new(Vec3::new(-2.0, 0.0, 0.0), 1.0);
        let b = BoundingSphere::new(Vec3::new(2.0, 0.0, 0.0), 1.0);
        let u = a.union(&b);

        assert!(u.center.length() < 1e-5);
        assert!((u.radius - 3.0).abs() < 1e-5);

        let inner = BoundingSphere::new(Vec3::new(-2.0, 0.0, 0.0), 0.5);
        assert_eq!(a.union(&inner), a);
    }
}
