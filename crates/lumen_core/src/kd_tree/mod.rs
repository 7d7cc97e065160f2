//! kd-tree over mesh triangles.
//!
//! The tree is built once per mesh (see [`build`]) and is read-only
//! afterwards, so any number of threads may traverse it at the same time.
//! Children are owned exclusively by their parent; there are no back
//! pointers and no shared subtrees.

mod build;
mod traverse;

pub use build::{
    build, median_split, partition, sah_split, Partition, SplitPlane, PARALLEL_BUILD_THRESHOLD,
};
pub use traverse::intersect;

use crate::Triangle;

/// kd-tree node - either a branch cut by an axis-aligned plane or a leaf
/// holding triangles.
#[derive(Debug, Clone, PartialEq)]
pub enum KdNode {
    /// Internal node. A missing child means there is no geometry on that
    /// side of the plane.
    Branch {
        /// Split axis (0=X, 1=Y, 2=Z)
        axis: u8,
        /// Position of the split plane along `axis`
        split: f32,
        /// Child holding coordinates below `split`
        left: Option<Box<KdNode>>,
        /// Child holding coordinates at or above `split`
        right: Option<Box<KdNode>>,
    },
    /// Leaf node. `indices[i]` is the mesh triangle that `triangles[i]` was
    /// copied from. A triangle straddling a split plane appears in leaves on
    /// both sides.
    Leaf {
        triangles: Vec<Triangle>,
        indices: Vec<u32>,
    },
}

/// Shape summary of a built tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KdTreeStats {
    pub branches: usize,
    pub leaves: usize,
    /// Leaves without any triangles
    pub empty_leaves: usize,
    /// Branch children left out because their side held no geometry
    pub missing_children: usize,
    /// Depth of the deepest leaf; a lone root leaf has depth 0
    pub depth: usize,
    /// Triangle references over all leaves, duplicates included
    pub triangle_refs: usize,
    pub max_leaf_size: usize,
}

impl KdNode {
    pub(crate) fn leaf(mut triangles: Vec<Triangle>, mut indices: Vec<u32>) -> Self {
        triangles.shrink_to_fit();
        indices.shrink_to_fit();
        KdNode::Leaf { triangles, indices }
    }

    pub fn is_leaf(&self) -> bool {
        matches!(self, KdNode::Leaf { .. })
    }

    /// Iterate over the `(triangles, indices)` lists of every leaf.
    pub fn leaves(&self) -> Leaves<'_> {
        Leaves { stack: vec![self] }
    }

    /// Walk the whole tree and summarize its shape.
    pub fn stats(&self) -> KdTreeStats {
        let mut stats = KdTreeStats::default();
        let mut stack = vec![(self, 0usize)];

        while let Some((node, depth)) = stack.pop() {
            match node {
                KdNode::Branch { left, right, .. } => {
                    stats.branches += 1;
                    for child in [left, right] {
                        match child.as_deref() {
                            Some(child) => stack.push((child, depth + 1)),
                            None => stats.missing_children += 1,
                        }
                    }
                }
                KdNode::Leaf { triangles, .. } => {
                    stats.leaves += 1;
                    if triangles.is_empty() {
                        stats.empty_leaves += 1;
                    }
                    stats.depth = stats.depth.max(depth);
                    stats.triangle_refs += triangles.len();
                    stats.max_leaf_size = stats.max_leaf_size.max(triangles.len());
                }
            }
        }

        stats
    }
}

/// Depth-first iterator over the leaves of a [`KdNode`].
pub struct Leaves<'a> {
    stack: Vec<&'a KdNode>,
}

impl<'a> Iterator for Leaves<'a> {
    type Item = (&'a [Triangle], &'a [u32]);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(node) = self.stack.pop() {
            match node {
                KdNode::Branch { left, right, .. } => {
                    self.stack.extend(right.as_deref());
                    self.stack.extend(left.as_deref());
                }
                KdNode::Leaf { triangles, indices } => return Some((triangles, indices)),
            }
        }
        None
    }
}
