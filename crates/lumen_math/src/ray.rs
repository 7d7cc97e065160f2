use crate::{Mat4, Vec3};

/// A ray in 3D space: an origin and a unit-length direction.
///
/// The direction is normalized on construction and whenever it is replaced,
/// so hit distances reported along the ray are true Euclidean distances in
/// the space the ray lives in.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    direction: Vec3,
}

impl Ray {
    /// Create a new ray. `direction` must be non-zero; it is normalized.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    /// Get the unit direction vector of the ray.
    #[inline]
    pub fn direction(&self) -> Vec3 {
        self.direction
    }

    /// Replace the direction, normalizing it.
    pub fn set_direction(&mut self, direction: Vec3) {
        self.direction = direction.normalize();
    }

    /// Get the point along the ray at parameter t.
    ///
    /// Returns: origin + t * direction
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Move the ray into the space described by `matrix`.
    ///
    /// The origin is transformed as a point and the direction as a vector,
    /// then renormalized. Distances along the result are measured in the
    /// target space, not the source space.
    pub fn transform(&self, matrix: &Mat4) -> Ray {
        Ray::new(
            matrix.transform_point3(self.origin),
            matrix.transform_vector3(self.direction),
        )
    }
}
