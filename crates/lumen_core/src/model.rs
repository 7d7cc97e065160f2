//! World-space wrapper around one or more meshes.
//!
//! Meshes are stored and built in local space. A model carries the
//! local-to-world transform, moves each query ray into local space, and maps
//! the hit back to world space. Several models may share one mesh.

use std::sync::Arc;

use lumen_math::{Aabb, Mat4, Mat4Ext, Ray, Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::Mesh;

/// Opaque handle into the renderer's material table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct MaterialId(pub u32);

impl MaterialId {
    pub const fn new(id: u32) -> Self {
        Self(id)
    }
}

/// A mesh paired with the material it is shaded with.
#[derive(Debug, Clone)]
pub struct Surface {
    pub mesh: Arc<Mesh>,
    pub material: MaterialId,
}

/// Nearest hit of a world-space ray against a model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelIntersection {
    /// World-space distance from the ray origin
    pub distance: f32,
    /// World-space hit position
    pub position: Vec3,
    pub tex_coord: Vec2,
    /// World-space shading normal
    pub normal: Vec3,
    /// World-space tangent
    pub tangent: Vec3,
    pub material: MaterialId,
    /// Index of the surface that was hit
    pub surface: usize,
    /// Triangle index within that surface's mesh
    pub triangle: u32,
}

/// A set of surfaces placed in the world by one transform.
#[derive(Debug, Clone)]
pub struct Model {
    /// Local to world
    transform: Mat4,
    /// World to local
    inverse: Mat4,
    surfaces: Vec<Surface>,
    /// Local-space union of the surface bounds
    aabb: Aabb,
}

impl Model {
    /// Create an empty model placed by `transform`.
    pub fn new(transform: Mat4) -> Self {
        let determinant = transform.determinant();
        if determinant == 0.0 || !determinant.is_finite() {
            log::warn!("Model transform is not invertible; every ray will miss");
        }

        Self {
            transform,
            inverse: transform.inverse(),
            surfaces: Vec::new(),
            aabb: Aabb::EMPTY,
        }
    }

    pub fn with_surface(mut self, mesh: Arc<Mesh>, material: MaterialId) -> Self {
        self.add_surface(mesh, material);
        self
    }

    pub fn add_surface(&mut self, mesh: Arc<Mesh>, material: MaterialId) {
        self.aabb.add_aabb(&mesh.aabb);
        self.surfaces.push(Surface { mesh, material });
    }

    /// Recompute the local bound from the surfaces' current bounds.
    pub fn recalculate_aabb(&mut self) {
        self.aabb.clear();
        for surface in &self.surfaces {
            self.aabb.add_aabb(&surface.mesh.aabb);
        }
    }

    pub fn transform(&self) -> Mat4 {
        self.transform
    }

    pub fn surfaces(&self) -> &[Surface] {
        &self.surfaces
    }

    /// Local-space bound.
    pub fn local_bounds(&self) -> Aabb {
        self.aabb
    }

    /// World-space bound of the transformed local box.
    pub fn world_bounds(&self) -> Aabb {
        self.transform.transform_aabb(&self.aabb)
    }

    /// Find the nearest surface hit by a world-space ray.
    pub fn intersect(&self, ray: &Ray) -> Option<ModelIntersection> {
        let local_ray = ray.transform(&self.inverse);
        self.aabb.intersect(&local_ray)?;

        // Local distances are comparable across surfaces since they share
        // the same local ray.
        let (index, hit) = self
            .surfaces
            .iter()
            .enumerate()
            .filter_map(|(i, surface)| surface.mesh.intersect(&local_ray).map(|hit| (i, hit)))
            .min_by(|(_, a), (_, b)| a.distance.total_cmp(&b.distance))?;

        let surface = &self.surfaces[index];
        let point = surface.mesh.surface_at(&hit);
        let world_hit = self.transform.transform_point3(local_ray.at(hit.distance));

        Some(ModelIntersection {
            distance: (world_hit - ray.origin).length(),
            position: self.transform.transform_point3(point.position),
            tex_coord: point.tex_coord,
            normal: self.transform.transform_normal(point.normal),
            tangent: self.transform.transform_vector3(point.tangent).normalize_or_zero(),
            material: surface.material,
            surface: index,
            triangle: hit.triangle_index,
        })
    }
}
