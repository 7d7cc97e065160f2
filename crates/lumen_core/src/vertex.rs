//! Mesh vertex layout.

use lumen_math::{Vec2, Vec3};

/// One vertex of a mesh. Only `position` takes part in intersection; the
/// other attributes are interpolated at hit points for shading.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vertex {
    pub position: Vec3,
    pub tex_coord: Vec2,
    pub normal: Vec3,
    pub tangent: Vec3,
}

impl Vertex {
    pub fn new(position: Vec3, tex_coord: Vec2, normal: Vec3, tangent: Vec3) -> Self {
        Self {
            position,
            tex_coord,
            normal,
            tangent,
        }
    }

    /// Vertex with only a position; remaining attributes are zero.
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }
}
