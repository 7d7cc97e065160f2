//! Triangle primitive for ray tracing.
//!
//! Intersection works in two steps: the ray is first hit against the
//! triangle's plane, then the hit point is expressed in barycentric
//! coordinates by projecting it onto the triangle's height vectors.

use lumen_math::{Aabb, Ray, Vec3, EPSILON};

/// Below this cosine between ray and plane normal the ray is treated as
/// running parallel to the triangle.
const PARALLEL_COSINE: f32 = 1e-7;

/// Squared height-to-edge ratio below which a triangle is too thin to
/// resolve barycentric coordinates.
const MIN_HEIGHT_RATIO_SQ: f32 = 1e-12;

/// Three vertex positions, copied out of a mesh's vertex buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub a: Vec3,
    pub b: Vec3,
    pub c: Vec3,
}

/// A ray/triangle hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TriangleHit {
    /// Distance along the ray, never negative.
    pub distance: f32,
    /// Weights `(alpha, beta, gamma)` of vertices `(a, b, c)`; they sum to 1.
    pub barycentric: Vec3,
}

/// Projection of `from` onto the direction of `to`.
#[inline]
fn project(to: Vec3, from: Vec3) -> Vec3 {
    to * (to.dot(from) / to.length_squared())
}

impl Triangle {
    pub fn new(a: Vec3, b: Vec3, c: Vec3) -> Self {
        Self { a, b, c }
    }

    /// Vertex by position in the triangle (0 = a, 1 = b, 2 = c).
    #[inline]
    pub fn vertex(&self, i: usize) -> Vec3 {
        match i {
            0 => self.a,
            1 => self.b,
            _ => self.c,
        }
    }

    #[inline]
    pub fn vertices(&self) -> [Vec3; 3] {
        [self.a, self.b, self.c]
    }

    /// Smallest and largest coordinate of the three vertices on `axis`.
    #[inline]
    pub fn axis_range(&self, axis: usize) -> (f32, f32) {
        let (a, b, c) = (self.a[axis], self.b[axis], self.c[axis]);
        (a.min(b).min(c), a.max(b).max(c))
    }

    pub fn bounds(&self) -> Aabb {
        let mut aabb = Aabb::from_points(self.a, self.b);
        aabb.add_point(self.c);
        aabb
    }

    pub fn centroid(&self) -> Vec3 {
        (self.a + self.b + self.c) / 3.0
    }

    /// Unit normal following the counter-clockwise winding `a -> b -> c`,
    /// or zero for a degenerate triangle.
    pub fn normal(&self) -> Vec3 {
        (self.b - self.a).cross(self.c - self.a).normalize_or_zero()
    }

    pub fn area(&self) -> f32 {
        (self.b - self.a).cross(self.c - self.a).length() * 0.5
    }

    /// True for zero-area triangles, which can never be hit.
    pub fn is_degenerate(&self) -> bool {
        (self.b - self.a).cross(self.c - self.a).length_squared() == 0.0
    }

    /// Intersect the ray with both faces of the triangle.
    ///
    /// Barycentric coordinates down to `-EPSILON` are accepted so rays
    /// through an edge shared by two triangles hit at least one of them.
    pub fn intersect(&self, ray: &Ray) -> Option<TriangleHit> {
        let ab = self.b - self.a;
        let bc = self.c - self.b;
        let ca = self.a - self.c;

        // Any two edges span the plane; this order gives the clockwise normal
        let normal = ab.cross(ca);
        let normal_length = normal.length();
        if normal_length == 0.0 {
            return None;
        }

        let dir = ray.direction();
        let denom = normal.dot(dir);
        if (denom / normal_length).abs() < PARALLEL_COSINE {
            return None;
        }

        // d = proj(N, A - O) / proj(N, D)
        let distance = normal.dot(self.a - ray.origin) / denom;
        if distance.is_nan() || distance < 0.0 {
            return None;
        }

        let hit = ray.origin + dir * distance;

        // Height vectors for a and b: each edge with the component along the
        // opposite edge removed.
        let ha = ab - project(bc, ab);
        let hb = bc - project(ca, bc);

        // ha . ab = |ha|^2, so both denominators are non-negative
        let denom = ha.dot(ab);
        if denom <= MIN_HEIGHT_RATIO_SQ * ab.length_squared() {
            return None;
        }
        let alpha = 1.0 - ha.dot(hit - self.a) / denom;
        if alpha + EPSILON < 0.0 {
            return None;
        }

        let denom = hb.dot(bc);
        if denom <= MIN_HEIGHT_RATIO_SQ * bc.length_squared() {
            return None;
        }
        let beta = 1.0 - hb.dot(hit - self.b) / denom;
        if beta + EPSILON < 0.0 {
            return None;
        }

        let gamma = 1.0 - (alpha + beta);
        if gamma + EPSILON < 0.0 {
            return None;
        }

        Some(TriangleHit {
            distance,
            barycentric: Vec3::new(alpha, beta, gamma),
        })
    }
}
