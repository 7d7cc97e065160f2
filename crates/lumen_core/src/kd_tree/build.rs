//! kd-tree construction.
//!
//! Both strategies recurse until `max_depth` is exhausted or no useful
//! split exists. A node whose chosen plane does not separate its triangles
//! (one side empty, or every triangle on both sides) becomes a leaf, which
//! guarantees progress on every branch.

use lumen_math::{Aabb, EPSILON};

use super::KdNode;
use crate::{KdTreeConfig, SplitStrategy, Triangle};

/// Nodes with at least this many triangles build their two children on
/// separate rayon tasks. The resulting tree is identical to a sequential
/// build.
pub const PARALLEL_BUILD_THRESHOLD: usize = 4096;

/// An axis-aligned split plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SplitPlane {
    /// Split axis (0=X, 1=Y, 2=Z)
    pub axis: usize,
    pub position: f32,
}

/// Triangles of a node distributed over the two sides of a split plane.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Partition {
    pub left_triangles: Vec<Triangle>,
    pub left_indices: Vec<u32>,
    pub right_triangles: Vec<Triangle>,
    pub right_indices: Vec<u32>,
}

impl Partition {
    /// True if the split made progress: both sides hold something and at
    /// least one side holds less than the whole node.
    pub fn separates(&self, total: usize) -> bool {
        let (left, right) = (self.left_triangles.len(), self.right_triangles.len());
        left > 0 && right > 0 && (left < total || right < total)
    }
}

/// Build a tree over `triangles` inside `bounds`.
///
/// `indices[i]` is carried along with `triangles[i]` into whichever leaves
/// the triangle ends up in. `bounds` should enclose every triangle.
pub fn build(
    triangles: Vec<Triangle>,
    indices: Vec<u32>,
    bounds: Aabb,
    config: &KdTreeConfig,
) -> KdNode {
    debug_assert_eq!(triangles.len(), indices.len());

    let config = config.validated();
    build_node(config.strategy, bounds, triangles, indices, config.max_depth)
}

fn build_node(
    strategy: SplitStrategy,
    bounds: Aabb,
    triangles: Vec<Triangle>,
    indices: Vec<u32>,
    depth: u8,
) -> KdNode {
    // Create leaf node once we've reached maximum depth
    if depth == 0 || triangles.is_empty() {
        return KdNode::leaf(triangles, indices);
    }

    let plane = match strategy {
        SplitStrategy::Median => Some(median_split(&bounds)),
        SplitStrategy::Sah => sah_split(&bounds, &triangles).map(|(plane, _)| plane),
    };
    let Some(plane) = plane else {
        return KdNode::leaf(triangles, indices);
    };

    let parts = partition(&triangles, &indices, plane);
    if !parts.separates(triangles.len()) {
        log::trace!(
            "kd-tree: plane {:?} does not separate {} triangles, making leaf",
            plane,
            triangles.len()
        );
        return KdNode::leaf(triangles, indices);
    }

    let count = triangles.len();
    drop(triangles);
    drop(indices);

    let (left_bounds, right_bounds) = bounds.split(plane.axis, plane.position);
    let Partition {
        left_triangles,
        left_indices,
        right_triangles,
        right_indices,
    } = parts;

    let (left, right) = if count >= PARALLEL_BUILD_THRESHOLD {
        rayon::join(
            || build_child(strategy, left_bounds, left_triangles, left_indices, depth - 1),
            || build_child(strategy, right_bounds, right_triangles, right_indices, depth - 1),
        )
    } else {
        (
            build_child(strategy, left_bounds, left_triangles, left_indices, depth - 1),
            build_child(strategy, right_bounds, right_triangles, right_indices, depth - 1),
        )
    };

    KdNode::Branch {
        axis: plane.axis as u8,
        split: plane.position,
        left,
        right,
    }
}

/// A side without triangles gets no node at all.
fn build_child(
    strategy: SplitStrategy,
    bounds: Aabb,
    triangles: Vec<Triangle>,
    indices: Vec<u32>,
    depth: u8,
) -> Option<Box<KdNode>> {
    if triangles.is_empty() {
        return None;
    }
    Some(Box::new(build_node(strategy, bounds, triangles, indices, depth)))
}

/// Midpoint of the longest axis of `bounds`.
pub fn median_split(bounds: &Aabb) -> SplitPlane {
    let axis = bounds.longest_axis();
    let extent = bounds.extent();
    SplitPlane {
        axis,
        position: bounds.min[axis] + extent[axis] * 0.5,
    }
}

/// Cheapest split plane under the Surface Area Heuristic, with its cost.
///
/// For every axis the triangles' extents are swept as sorted start/end
/// events. Candidates sit halfway between consecutive distinct event
/// coordinates and just outside the first and last event; only planes
/// strictly inside `bounds` with triangles on both sides are eligible.
/// The cost of a plane is `left_count * left_area + right_count *
/// right_area`. Returns `None` unless some plane costs strictly less than
/// keeping the node whole (`triangle_count * area`).
pub fn sah_split(bounds: &Aabb, triangles: &[Triangle]) -> Option<(SplitPlane, f32)> {
    let count = triangles.len();
    let base_cost = count as f32 * bounds.surface_area();
    let mut best: Option<(SplitPlane, f32)> = None;
    let mut best_cost = base_cost;

    // (coordinate, is_start)
    let mut events: Vec<(f32, bool)> = Vec::with_capacity(count * 2);

    for axis in 0..3 {
        events.clear();
        for triangle in triangles {
            let (start, end) = triangle.axis_range(axis);
            events.push((start, true));
            events.push((end, false));
        }
        events.sort_by(|a, b| a.0.total_cmp(&b.0));

        let (Some(&(first, _)), Some(&(last, _))) = (events.first(), events.last()) else {
            continue;
        };

        let mut left_count = 0usize;
        let mut right_count = count;

        for i in 0..=events.len() {
            let split = if i == 0 {
                first - EPSILON
            } else if i == events.len() {
                // Last event is always an end
                right_count -= 1;
                last + EPSILON
            } else {
                let (prev, prev_is_start) = events[i - 1];
                let (next, _) = events[i];

                if prev_is_start {
                    left_count += 1;
                } else {
                    right_count -= 1;
                }

                if prev == next {
                    continue;
                }
                (prev + next) * 0.5
            };

            // Accumulate events until we enter the box
            if split <= bounds.min[axis] {
                continue;
            }
            if split >= bounds.max[axis] {
                break;
            }
            if left_count == 0 || right_count == 0 {
                continue;
            }

            let (left_bounds, right_bounds) = bounds.split(axis, split);
            let cost = left_count as f32 * left_bounds.surface_area()
                + right_count as f32 * right_bounds.surface_area();

            if cost < best_cost {
                best_cost = cost;
                best = Some((
                    SplitPlane {
                        axis,
                        position: split,
                    },
                    cost,
                ));
            }
        }
    }

    if let Some((plane, cost)) = best {
        log::trace!(
            "kd-tree: SAH split {:?} for {} triangles, cost {} < {}",
            plane,
            count,
            cost,
            base_cost
        );
    }
    best
}

/// Distribute triangles over both sides of `plane`.
///
/// A triangle goes left if any vertex lies below the plane and right if any
/// vertex lies on or above it, so straddling triangles land on both sides
/// and nothing is lost.
pub fn partition(triangles: &[Triangle], indices: &[u32], plane: SplitPlane) -> Partition {
    let mut parts = Partition {
        left_triangles: Vec::with_capacity(triangles.len()),
        left_indices: Vec::with_capacity(indices.len()),
        right_triangles: Vec::with_capacity(triangles.len()),
        right_indices: Vec::with_capacity(indices.len()),
    };

    for (triangle, &index) in triangles.iter().zip(indices) {
        let mut left = false;
        let mut right = false;

        for vertex in triangle.vertices() {
            if vertex[plane.axis] < plane.position {
                left = true;
            } else {
                right = true;
            }
        }

        if left {
            parts.left_triangles.push(*triangle);
            parts.left_indices.push(index);
        }
        if right {
            parts.right_triangles.push(*triangle);
            parts.right_indices.push(index);
        }
    }

    parts
}
