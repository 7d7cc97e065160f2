//! Triangle mesh with a kd-tree for ray queries.
//!
//! Vertex and index buffers are filled by scene import. After any change to
//! vertex positions the caller must run [`Mesh::recalculate_aabb`] and then
//! [`Mesh::build_kd_tree`]; nothing tracks staleness, and a stale tree
//! silently answers for the old geometry. Edits to the index buffer must
//! keep every index in range; [`Mesh::validate`] checks this.

use lumen_math::{Aabb, Ray, UVec3, Vec2, Vec3};
use rayon::prelude::*;

use crate::error::{MeshError, MeshResult};
use crate::kd_tree::{self, KdNode};
use crate::{KdTreeConfig, Triangle, Vertex};

/// Nearest hit of a ray against a mesh.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeshIntersection {
    /// Distance along the ray, never negative
    pub distance: f32,
    /// Weights of the triangle's three vertices, in index order
    pub barycentric: Vec3,
    /// Index into [`Mesh::triangles`]
    pub triangle_index: u32,
}

/// Vertex attributes interpolated at a hit point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfacePoint {
    pub position: Vec3,
    pub tex_coord: Vec2,
    /// Interpolated shading normal, normalized (zero if all inputs are zero)
    pub normal: Vec3,
    pub tangent: Vec3,
}

/// An indexed triangle mesh.
#[derive(Debug, Clone, Default)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,

    /// Vertex index triples, one per triangle. Every index must be below
    /// `vertices.len()`; `new` checks this, later edits must preserve it.
    pub triangles: Vec<UVec3>,

    /// Bound of all vertex positions
    pub aabb: Aabb,

    kd_tree: Option<KdNode>,
}

impl Mesh {
    /// Create a mesh, validating every index and computing its bounds.
    ///
    /// The kd-tree is not built; call [`Mesh::build_kd_tree`] before
    /// intersecting.
    pub fn new(vertices: Vec<Vertex>, triangles: Vec<UVec3>) -> MeshResult<Self> {
        let mut mesh = Self {
            vertices,
            triangles,
            aabb: Aabb::EMPTY,
            kd_tree: None,
        };
        mesh.validate()?;
        mesh.recalculate_aabb();
        Ok(mesh)
    }

    /// Create a mesh from bare positions; other vertex attributes are zero.
    pub fn from_positions(positions: &[Vec3], triangles: Vec<UVec3>) -> MeshResult<Self> {
        let vertices = positions.iter().copied().map(Vertex::from_position).collect();
        Self::new(vertices, triangles)
    }

    /// Check that every triangle references existing vertices and that the
    /// triangle count fits the tree's 32-bit indices.
    pub fn validate(&self) -> MeshResult<()> {
        if u32::try_from(self.triangles.len()).is_err() {
            return Err(MeshError::TooManyTriangles(self.triangles.len()));
        }

        let vertex_count = self.vertices.len();
        for (triangle, indices) in self.triangles.iter().enumerate() {
            for index in indices.to_array() {
                if index as usize >= vertex_count {
                    return Err(MeshError::IndexOutOfBounds {
                        triangle,
                        index,
                        vertex_count,
                    });
                }
            }
        }

        Ok(())
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Positions of triangle `index`.
    pub fn triangle(&self, index: usize) -> Triangle {
        let [a, b, c] = self.triangles[index].to_array();
        Triangle::new(
            self.vertices[a as usize].position,
            self.vertices[b as usize].position,
            self.vertices[c as usize].position,
        )
    }

    /// Recompute the bounds from the current vertex positions.
    pub fn recalculate_aabb(&mut self) {
        self.aabb.clear();
        for vertex in &self.vertices {
            self.aabb.add_point(vertex.position);
        }
    }

    /// The built tree, if any.
    pub fn kd_tree(&self) -> Option<&KdNode> {
        self.kd_tree.as_ref()
    }

    /// Build the kd-tree with the SAH (`use_sah`) or median strategy,
    /// replacing any previous tree.
    pub fn build_kd_tree(&mut self, use_sah: bool, max_depth: u8) {
        self.build_kd_tree_with(&KdTreeConfig::new(use_sah, max_depth));
    }

    /// Build the kd-tree from a configuration, replacing any previous tree.
    ///
    /// Panics if the index buffer references missing vertices.
    pub fn build_kd_tree_with(&mut self, config: &KdTreeConfig) {
        debug_assert!(
            self.validate().is_ok(),
            "invalid index buffer: {:?}",
            self.validate()
        );
        let start = std::time::Instant::now();

        let triangles: Vec<Triangle> = (0..self.triangles.len()).map(|i| self.triangle(i)).collect();
        let indices: Vec<u32> = (0..triangles.len() as u32).collect();

        let degenerate = triangles.iter().filter(|t| t.is_degenerate()).count();
        if degenerate > 0 {
            log::warn!(
                "Mesh has {} zero-area triangles out of {}; they can never be hit",
                degenerate,
                triangles.len()
            );
        }

        let root = kd_tree::build(triangles, indices, self.aabb, config);
        let stats = root.stats();
        log::debug!(
            "Built {:?} kd-tree for {} triangles in {:?}: {} branches, {} leaves, depth {}, {} triangle refs, largest leaf {}",
            config.strategy,
            self.triangles.len(),
            start.elapsed(),
            stats.branches,
            stats.leaves,
            stats.depth,
            stats.triangle_refs,
            stats.max_leaf_size
        );

        self.kd_tree = Some(root);
    }

    /// Find the nearest triangle hit by `ray` (given in mesh space).
    ///
    /// Rays that miss the mesh box return without touching any triangle.
    /// Before the first [`Mesh::build_kd_tree`] every ray misses.
    pub fn intersect(&self, ray: &Ray) -> Option<MeshIntersection> {
        let outer = self.aabb.intersect(ray)?;
        let root = self.kd_tree.as_ref()?;
        kd_tree::intersect(root, ray, outer)
    }

    /// Intersect many rays in parallel. Results are in ray order.
    pub fn intersect_batch(&self, rays: &[Ray]) -> Vec<Option<MeshIntersection>> {
        rays.par_iter().map(|ray| self.intersect(ray)).collect()
    }

    /// Test every triangle without the tree. Slow; meant as ground truth.
    pub fn intersect_brute_force(&self, ray: &Ray) -> Option<MeshIntersection> {
        (0..self.triangles.len())
            .filter_map(|i| {
                self.triangle(i).intersect(ray).map(|hit| MeshIntersection {
                    distance: hit.distance,
                    barycentric: hit.barycentric,
                    triangle_index: i as u32,
                })
            })
            .min_by(|a, b| a.distance.total_cmp(&b.distance))
    }

    /// Interpolate vertex attributes at a hit on this mesh.
    pub fn surface_at(&self, hit: &MeshIntersection) -> SurfacePoint {
        let [a, b, c] = self.triangles[hit.triangle_index as usize]
            .to_array()
            .map(|i| &self.vertices[i as usize]);
        let w = hit.barycentric;

        SurfacePoint {
            position: a.position * w.x + b.position * w.y + c.position * w.z,
            tex_coord: a.tex_coord * w.x + b.tex_coord * w.y + c.tex_coord * w.z,
            normal: (a.normal * w.x + b.normal * w.y + c.normal * w.z).normalize_or_zero(),
            tangent: (a.tangent * w.x + b.tangent * w.y + c.tangent * w.z).normalize_or_zero(),
        }
    }
}
