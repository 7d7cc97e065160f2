// Transform utilities for Mat4
//
// Extends glam::Mat4 with the bounding-box and normal transforms needed when
// moving hits between object and world space.

use glam::{Mat3, Mat4, Vec3};

use crate::Aabb;

/// Extension trait for Mat4 to provide additional transform utilities
pub trait Mat4Ext {
    /// Transform an axis-aligned bounding box.
    /// Computes the bounding box of all 8 transformed corners; an empty box
    /// stays empty.
    fn transform_aabb(&self, aabb: &Aabb) -> Aabb;

    /// Transform a surface normal using the inverse-transpose of the upper
    /// 3x3 block, so normals stay perpendicular under non-uniform scale.
    /// The result is normalized.
    fn transform_normal(&self, normal: Vec3) -> Vec3;
}

impl Mat4Ext for Mat4 {
    fn transform_aabb(&self, aabb: &Aabb) -> Aabb {
        if aabb.is_empty() {
            return Aabb::EMPTY;
        }

        let (min, max) = (aabb.min, aabb.max);
        let corners = [
            Vec3::new(min.x, min.y, min.z),
            Vec3::new(max.x, min.y, min.z),
            Vec3::new(min.x, max.y, min.z),
            Vec3::new(max.x, max.y, min.z),
            Vec3::new(min.x, min.y, max.z),
            Vec3::new(max.x, min.y, max.z),
            Vec3::new(min.x, max.y, max.z),
            Vec3::new(max.x, max.y, max.z),
        ];

        corners.iter().fold(Aabb::EMPTY, |mut acc, &corner| {
            acc.add_point(self.transform_point3(corner));
            acc
        })
    }

    fn transform_normal(&self, normal: Vec3) -> Vec3 {
        let normal_matrix = Mat3::from_mat4(*self).inverse().transpose();
        (normal_matrix * normal).normalize_or_zero()
    }
}
