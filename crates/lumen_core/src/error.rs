//! Error types for mesh construction.
//!
//! Only malformed input data is an error. Ray misses, degenerate triangles
//! and builds that find no useful split are ordinary results.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MeshError {
    /// A triangle references a vertex that does not exist.
    #[error("triangle {triangle} references vertex {index}, but the mesh has {vertex_count} vertices")]
    IndexOutOfBounds {
        triangle: usize,
        index: u32,
        vertex_count: usize,
    },

    /// Triangle indices stored in the kd-tree are 32-bit.
    #[error("mesh has {0} triangles, more than a kd-tree can index")]
    TooManyTriangles(usize),
}

/// Convenience alias for `Result<T, MeshError>`.
pub type MeshResult<T> = Result<T, MeshError>;
