use crate::{Interval, Ray, Vec3};

/// Axis-Aligned Bounding Box used as the spatial bound of meshes and
/// kd-tree cells.
///
/// A cleared box has `min = +inf` and `max = -inf` on every axis, so any
/// point or box union immediately makes it meaningful and
/// `any(min > max)` signals emptiness. Boxes only grow.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for Aabb {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Aabb {
    /// An empty box (contains nothing).
    pub const EMPTY: Aabb = Aabb {
        min: Vec3::INFINITY,
        max: Vec3::NEG_INFINITY,
    };

    /// Create a box from its corners. No reordering is done.
    pub const fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create an empty AABB (contains nothing).
    pub fn empty() -> Self {
        Self::EMPTY
    }

    /// Create the tightest box around two arbitrary points.
    pub fn from_points(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Create an AABB that surrounds two other AABBs.
    pub fn surrounding(box0: &Aabb, box1: &Aabb) -> Self {
        Self {
            min: box0.min.min(box1.min),
            max: box0.max.max(box1.max),
        }
    }

    /// Reset to the empty box.
    pub fn clear(&mut self) {
        *self = Self::EMPTY;
    }

    /// Grow the box to contain `point`.
    pub fn add_point(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    /// Grow the box to contain `other`.
    pub fn add_aabb(&mut self, other: &Aabb) {
        *self = Self::surrounding(self, other);
    }

    /// True if the box contains nothing on at least one axis.
    pub fn is_empty(&self) -> bool {
        self.min.cmpgt(self.max).any()
    }

    /// Width, height and depth of the box.
    pub fn extent(&self) -> Vec3 {
        self.max - self.min
    }

    /// Get the interval for a specific axis (0=X, 1=Y, 2=Z).
    pub fn axis_interval(&self, axis: usize) -> Interval {
        Interval::new(self.min[axis], self.max[axis])
    }

    /// Returns the index (0=X, 1=Y, 2=Z) of the axis with the longest extent.
    /// Ties resolve to the lower axis.
    pub fn longest_axis(&self) -> usize {
        let e = self.extent();
        if e.x >= e.y && e.x >= e.z {
            0
        } else if e.y >= e.z {
            1
        } else {
            2
        }
    }

    /// Returns the center point of the bounding box.
    pub fn centroid(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Surface area `2(wh + hd + dw)`. Zero for empty boxes; flat boxes
    /// are valid and may report zero too.
    pub fn surface_area(&self) -> f32 {
        if self.is_empty() {
            return 0.0;
        }
        let e = self.extent();
        2.0 * (e.x * e.y + e.y * e.z + e.z * e.x)
    }

    /// Cut the box with the plane `axis = position`.
    ///
    /// Returns `(left, right)` where left holds the smaller coordinates.
    pub fn split(&self, axis: usize, position: f32) -> (Aabb, Aabb) {
        let mut left = *self;
        let mut right = *self;
        left.max[axis] = position;
        right.min[axis] = position;
        (left, right)
    }

    /// Slab test. Returns the `(near, far)` ray parameters at which the ray
    /// enters and leaves the box, or `None` on a miss.
    ///
    /// `near` is negative when the ray origin is already inside the box;
    /// callers decide how to treat that. Zero direction components rely on
    /// IEEE division producing infinities; the `0 / 0` case (origin exactly
    /// on a slab plane while moving parallel to it) counts as inside that
    /// slab.
    pub fn intersect(&self, ray: &Ray) -> Option<Interval> {
        let dir = ray.direction();

        // NaN rays come from zero directions or singular transforms
        if self.is_empty() || dir.is_nan() || ray.origin.is_nan() {
            return None;
        }

        let t0 = (self.min - ray.origin) / dir;
        let t1 = (self.max - ray.origin) / dir;
        let t0 = Vec3::select(t0.is_nan_mask(), Vec3::NEG_INFINITY, t0);
        let t1 = Vec3::select(t1.is_nan_mask(), Vec3::INFINITY, t1);

        let near = t0.min(t1).max_element();
        let far = t0.max(t1).min_element();

        // Ray misses the box
        if near > far {
            return None;
        }

        // Box lies entirely behind the ray
        if far < 0.0 {
            return None;
        }

        Some(Interval::new(near, far))
    }
}
