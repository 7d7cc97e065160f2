//! Nearest-hit traversal.
//!
//! The tree is walked front to back with an explicit stack of
//! `(node, min_dist, max_dist)` frames. Each frame only accepts hits within
//! its own slice of the ray, so the first leaf that produces an accepted hit
//! holds the nearest one and the walk stops there.

use lumen_math::{Interval, Ray};

use super::KdNode;
use crate::{MeshIntersection, Triangle, TriangleHit};

/// Frames pushed per traversal rarely exceed the tree depth.
const STACK_CAPACITY: usize = 32;

/// Relative rounding allowance on a frame's distance bounds, a few ULPs.
const FRAME_TOLERANCE: f32 = 16.0 * f32::EPSILON;

/// Slack on a frame bound, so that a hit lying exactly on a split plane or
/// on the mesh box survives rounding. It must stay far below any real gap
/// between hits: a straddling triangle in the near leaf may not claim a hit
/// past the plane ahead of a closer triangle in the far leaf.
#[inline]
fn slack(distance: f32) -> f32 {
    FRAME_TOLERANCE * distance.abs().max(1.0)
}

/// Find the nearest triangle hit by `ray` within `outer`.
///
/// `outer` is normally the ray's interval through the mesh box, as returned
/// by `Aabb::intersect`; its `min` may be negative when the ray starts inside.
pub fn intersect(root: &KdNode, ray: &Ray, outer: Interval) -> Option<MeshIntersection> {
    let origin = ray.origin;
    let dir = ray.direction();

    let mut stack: Vec<(&KdNode, f32, f32)> = Vec::with_capacity(STACK_CAPACITY);
    stack.push((root, outer.min, outer.max));

    while let Some((mut node, min_dist, mut max_dist)) = stack.pop() {
        // Explore down the tree until we reach a leaf
        let leaf = loop {
            let (axis, split, left, right) = match node {
                KdNode::Leaf { triangles, indices } => break Some((triangles, indices)),
                KdNode::Branch {
                    axis,
                    split,
                    left,
                    right,
                } => (*axis as usize, *split, left.as_deref(), right.as_deref()),
            };

            // The child on the origin's side is visited first
            let (near, far) = if origin[axis] < split {
                (left, right)
            } else {
                (right, left)
            };

            let next = if dir[axis] == 0.0 {
                // Parallel to the plane: it can never be crossed
                near
            } else {
                let split_dist = (split - origin[axis]) / dir[axis];

                if split_dist < 0.0 || split_dist > max_dist {
                    // Plane is behind the ray or past this frame
                    near
                } else if split_dist < min_dist {
                    // Plane is crossed before this frame starts
                    far
                } else {
                    if let Some(far) = far {
                        stack.push((far, split_dist, max_dist));
                    }
                    max_dist = split_dist;
                    near
                }
            };

            match next {
                Some(child) => node = child,
                None => break None,
            }
        };

        let Some((triangles, indices)) = leaf else {
            continue;
        };

        let bounds = Interval::new(min_dist - slack(min_dist), max_dist + slack(max_dist));
        if let Some((hit, i)) = nearest_in_leaf(triangles, ray, bounds) {
            return Some(MeshIntersection {
                distance: hit.distance,
                barycentric: hit.barycentric,
                triangle_index: indices[i],
            });
        }
    }

    None
}

/// Closest hit among `triangles` whose distance lies in `bounds`, with its
/// position in the leaf.
fn nearest_in_leaf(
    triangles: &[Triangle],
    ray: &Ray,
    bounds: Interval,
) -> Option<(TriangleHit, usize)> {
    let mut nearest: Option<(TriangleHit, usize)> = None;

    for (i, triangle) in triangles.iter().enumerate() {
        let Some(hit) = triangle.intersect(ray) else {
            continue;
        };
        if !bounds.contains(hit.distance) {
            continue;
        }
        if nearest.map_or(true, |(best, _)| hit.distance < best.distance) {
            nearest = Some((hit, i));
        }
    }

    nearest
}
