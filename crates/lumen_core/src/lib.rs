//! lumen core - kd-tree acceleration and ray intersection.
//!
//! Builds a kd-tree over the triangles of each mesh, with either median or
//! Surface Area Heuristic splits, and answers nearest-hit ray queries
//! against it. [`Model`] places meshes in the world.

mod config;
mod error;
pub mod kd_tree;
mod mesh;
mod model;
mod triangle;
mod vertex;

pub use config::{KdTreeConfig, SplitStrategy, MAX_KD_DEPTH};
pub use error::{MeshError, MeshResult};
pub use kd_tree::{KdNode, KdTreeStats};
pub use mesh::{Mesh, MeshIntersection, SurfacePoint};
pub use model::{MaterialId, Model, ModelIntersection, Surface};
pub use triangle::{Triangle, TriangleHit};
pub use vertex::Vertex;

/// Re-export the math types used in the public API
pub use lumen_math::{Aabb, Interval, Mat4, Ray, UVec3, Vec2, Vec3, EPSILON};
