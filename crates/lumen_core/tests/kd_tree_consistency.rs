//! Ground-truth checks for the kd-tree: every query must agree with testing
//! all triangles directly.

use std::collections::BTreeSet;

use lumen_core::kd_tree::{partition, sah_split, SplitPlane};
use lumen_core::{
    Aabb, KdNode, KdTreeConfig, Mesh, MeshIntersection, Ray, SplitStrategy, UVec3, Vec3,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

fn random_point(rng: &mut StdRng, extent: f32) -> Vec3 {
    Vec3::new(
        rng.gen_range(-extent..extent),
        rng.gen_range(-extent..extent),
        rng.gen_range(-extent..extent),
    )
}

/// Soup of small random triangles scattered through a cube.
fn triangle_soup(rng: &mut StdRng, count: usize) -> Mesh {
    let mut positions = Vec::with_capacity(count * 3);
    let mut triangles = Vec::with_capacity(count);

    for i in 0..count as u32 {
        let center = random_point(rng, 10.0);
        for _ in 0..3 {
            positions.push(center + random_point(rng, 1.5));
        }
        triangles.push(UVec3::new(i * 3, i * 3 + 1, i * 3 + 2));
    }

    Mesh::from_positions(&positions, triangles).unwrap()
}

/// Rays from outside the soup, half aimed at a triangle and half at random.
fn random_rays(rng: &mut StdRng, mesh: &Mesh, count: usize) -> Vec<Ray> {
    (0..count)
        .map(|i| {
            let origin = random_point(rng, 1.0).normalize_or_zero() * 30.0 + random_point(rng, 2.0);
            let target = if i % 2 == 0 {
                let index = rng.gen_range(0..mesh.triangle_count());
                mesh.triangle(index).centroid()
            } else {
                random_point(rng, 12.0)
            };
            Ray::new(origin, target - origin)
        })
        .collect()
}

/// The tree must return exactly the brute-force nearest hit. A different
/// triangle is only allowed on an exact distance tie.
fn assert_same_hit(ray: &Ray, expected: Option<MeshIntersection>, actual: Option<MeshIntersection>) {
    match (expected, actual) {
        (None, None) => {}
        (Some(expected), Some(actual)) => {
            assert_eq!(
                expected.distance.to_bits(),
                actual.distance.to_bits(),
                "ray {:?}: brute force {:?} vs tree {:?}",
                ray,
                expected,
                actual
            );
            if expected.triangle_index == actual.triangle_index {
                assert_eq!(expected, actual);
            }
        }
        (expected, actual) => panic!("ray {:?}: brute force {:?} vs tree {:?}", ray, expected, actual),
    }
}

fn assert_matches_brute_force(mesh: &Mesh, rays: &[Ray]) {
    let mut hits = 0;

    for ray in rays {
        let expected = mesh.intersect_brute_force(ray);
        let actual = mesh.intersect(ray);
        if expected.is_some() {
            hits += 1;
        }
        assert_same_hit(ray, expected, actual);
    }

    assert!(hits > rays.len() / 4, "too few rays hit to be meaningful: {}", hits);
}

#[test]
fn test_median_tree_matches_brute_force() {
    let mut rng = StdRng::seed_from_u64(42);
    let mut mesh = triangle_soup(&mut rng, 400);
    mesh.build_kd_tree(false, 16);

    let rays = random_rays(&mut rng, &mesh, 500);
    assert_matches_brute_force(&mesh, &rays);
}

#[test]
fn test_sah_tree_matches_brute_force() {
    let mut rng = StdRng::seed_from_u64(42);
    let mut mesh = triangle_soup(&mut rng, 400);
    mesh.build_kd_tree(true, 25);

    let rays = random_rays(&mut rng, &mesh, 500);
    assert_matches_brute_force(&mesh, &rays);
}

#[test]
fn test_rays_from_inside_match_brute_force() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut mesh = triangle_soup(&mut rng, 300);

    for use_sah in [false, true] {
        mesh.build_kd_tree(use_sah, 20);

        let rays: Vec<Ray> = (0..300)
            .map(|_| Ray::new(random_point(&mut rng, 8.0), random_point(&mut rng, 1.0)))
            .collect();

        for ray in &rays {
            assert_same_hit(ray, mesh.intersect_brute_force(ray), mesh.intersect(ray));
        }
    }
}

#[test]
fn test_axis_aligned_rays_match_brute_force() {
    // Zero direction components exercise the parallel-to-plane path
    let mut rng = StdRng::seed_from_u64(3);
    let mut mesh = triangle_soup(&mut rng, 300);
    mesh.build_kd_tree(true, 20);

    let axes = [Vec3::X, Vec3::NEG_X, Vec3::Y, Vec3::NEG_Y, Vec3::Z, Vec3::NEG_Z];
    for i in 0..600 {
        let dir = axes[i % axes.len()];
        let origin = random_point(&mut rng, 10.0) - dir * 30.0;
        let ray = Ray::new(origin, dir);

        assert_same_hit(&ray, mesh.intersect_brute_force(&ray), mesh.intersect(&ray));
    }
}

#[test]
fn test_far_triangle_beats_straddling_one_at_large_coordinates() {
    let positions = [
        // Tilted, crossing x = 1000; the ray meets it at x = 1000.05
        Vec3::new(999.45, -1.0, -1.0),
        Vec3::new(999.45, -1.0, 2.0),
        Vec3::new(1000.95, 2.0, 0.5),
        // Flat at x = 1000.02, entirely past the plane
        Vec3::new(1000.02, -1.0, -1.0),
        Vec3::new(1000.02, 2.0, -1.0),
        Vec3::new(1000.02, -1.0, 2.0),
        // Small triangles off the ray that stretch the box to x in [996, 1004]
        Vec3::new(996.0, 5.0, 5.0),
        Vec3::new(996.5, 5.0, 5.5),
        Vec3::new(996.0, 5.5, 5.0),
        Vec3::new(1004.0, 5.0, 5.0),
        Vec3::new(1003.5, 5.0, 5.5),
        Vec3::new(1004.0, 5.5, 5.0),
    ];
    let triangles = (0..4).map(|i| UVec3::new(i * 3, i * 3 + 1, i * 3 + 2)).collect();
    let mut mesh = Mesh::from_positions(&positions, triangles).unwrap();
    mesh.build_kd_tree(false, 1);

    let Some(KdNode::Branch { axis, split, .. }) = mesh.kd_tree() else {
        panic!("expected a split at the root");
    };
    assert_eq!((*axis, *split), (0, 1000.0));

    let ray = Ray::new(Vec3::new(-10.0, 0.2, 0.2), Vec3::X);
    let expected = mesh.intersect_brute_force(&ray);
    let actual = mesh.intersect(&ray);

    assert_eq!(actual.map(|hit| hit.triangle_index), Some(1));
    assert_same_hit(&ray, expected, actual);
}

#[test]
fn test_rebuild_gives_bit_identical_hits() {
    let mut rng = StdRng::seed_from_u64(11);
    let mut mesh = triangle_soup(&mut rng, 200);
    let rays = random_rays(&mut rng, &mesh, 200);

    for use_sah in [false, true] {
        mesh.build_kd_tree(use_sah, 18);
        let first_tree = mesh.kd_tree().cloned();
        let first: Vec<_> = rays.iter().map(|ray| mesh.intersect(ray)).collect();

        mesh.build_kd_tree(use_sah, 18);
        let second: Vec<_> = rays.iter().map(|ray| mesh.intersect(ray)).collect();

        assert_eq!(first_tree.as_ref(), mesh.kd_tree());
        for (a, b) in first.iter().zip(&second) {
            assert_eq!(a.map(|h| h.distance.to_bits()), b.map(|h| h.distance.to_bits()));
            assert_eq!(a, b);
        }
    }
}

#[test]
fn test_every_triangle_reaches_a_leaf() {
    let mut rng = StdRng::seed_from_u64(5);
    let mut mesh = triangle_soup(&mut rng, 500);

    for config in [
        KdTreeConfig::new(false, 12),
        KdTreeConfig::new(true, 25),
        KdTreeConfig { strategy: SplitStrategy::Sah, max_depth: 3 },
    ] {
        mesh.build_kd_tree_with(&config);
        let tree = mesh.kd_tree().unwrap();

        let found: BTreeSet<u32> = tree.leaves().flat_map(|(_, indices)| indices.iter().copied()).collect();
        assert_eq!(found.len(), mesh.triangle_count(), "{:?}", config);

        // Leaf triangles are copies of the mesh triangles they index
        for (triangles, indices) in tree.leaves() {
            assert_eq!(triangles.len(), indices.len());
            for (triangle, &index) in triangles.iter().zip(indices) {
                assert_eq!(*triangle, mesh.triangle(index as usize));
            }
        }

        let stats = tree.stats();
        assert!(stats.depth <= config.max_depth as usize);
        assert!(stats.triangle_refs >= mesh.triangle_count());
    }
}

/// Check every branch of an SAH tree against a fresh SAH evaluation of the
/// triangles beneath it.
fn check_sah_branches(mesh: &Mesh, node: &KdNode, bounds: Aabb) {
    let KdNode::Branch { axis, split, left, right } = node else {
        return;
    };

    let indices: Vec<u32> = node
        .leaves()
        .flat_map(|(_, indices)| indices.iter().copied())
        .collect::<BTreeSet<u32>>()
        .into_iter()
        .collect();
    let triangles: Vec<_> = indices.iter().map(|&i| mesh.triangle(i as usize)).collect();

    let plane = SplitPlane { axis: *axis as usize, position: *split };
    let baseline = triangles.len() as f32 * bounds.surface_area();
    let (chosen, cost) = sah_split(&bounds, &triangles).expect("branch must come from an improving split");

    assert_eq!(chosen, plane);
    assert!(cost < baseline, "cost {} not below baseline {}", cost, baseline);

    // Both sides of a branch hold triangles and at least one is a strict subset
    let parts = partition(&triangles, &indices, plane);
    assert!(parts.separates(triangles.len()));

    let (left_bounds, right_bounds) = bounds.split(plane.axis, plane.position);

    if let Some(left) = left {
        check_sah_branches(mesh, left, left_bounds);
    }
    if let Some(right) = right {
        check_sah_branches(mesh, right, right_bounds);
    }
}

#[test]
fn test_sah_branches_beat_baseline() {
    let mut rng = StdRng::seed_from_u64(19);
    let mut mesh = triangle_soup(&mut rng, 250);
    mesh.build_kd_tree(true, 25);

    let tree = mesh.kd_tree().unwrap();
    assert!(!tree.is_leaf());
    check_sah_branches(&mesh, tree, mesh.aabb);
}

#[test]
fn test_batch_matches_single_rays() {
    let mut rng = StdRng::seed_from_u64(23);
    let mut mesh = triangle_soup(&mut rng, 300);
    mesh.build_kd_tree(true, 20);

    let rays = random_rays(&mut rng, &mesh, 400);
    let batch = mesh.intersect_batch(&rays);

    assert_eq!(batch.len(), rays.len());
    for (ray, hit) in rays.iter().zip(batch) {
        assert_eq!(hit, mesh.intersect(ray));
    }
}
