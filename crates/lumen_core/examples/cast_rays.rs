//! Example: build kd-trees over a procedural sphere and cast a grid of rays.
//!
//! Run with: cargo run --example cast_rays -- [segments] [config-json]
//!
//! e.g. cargo run --example cast_rays -- 256 '{"strategy":"median","max_depth":20}'

use std::env;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{bail, Context, Result};
use lumen_core::{
    KdTreeConfig, MaterialId, Mat4, Mesh, Model, Ray, SplitStrategy, UVec3, Vec2, Vec3, Vertex,
};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const IMAGE_SIZE: usize = 256;

/// UV sphere of radius 1 with `segments` slices and `segments / 2` stacks.
fn uv_sphere(segments: u32) -> Result<Mesh> {
    let stacks = (segments / 2).max(2);
    let mut vertices = Vec::new();
    let mut triangles = Vec::new();

    for stack in 0..=stacks {
        let v = stack as f32 / stacks as f32;
        let phi = v * std::f32::consts::PI;
        for slice in 0..=segments {
            let u = slice as f32 / segments as f32;
            let theta = u * std::f32::consts::TAU;
            let normal = Vec3::new(phi.sin() * theta.cos(), phi.cos(), phi.sin() * theta.sin());
            let tangent = Vec3::new(-theta.sin(), 0.0, theta.cos());
            vertices.push(Vertex::new(normal, Vec2::new(u, v), normal, tangent));
        }
    }

    let row = segments + 1;
    for stack in 0..stacks {
        for slice in 0..segments {
            let a = stack * row + slice;
            let b = a + row;
            triangles.push(UVec3::new(a, b, a + 1));
            triangles.push(UVec3::new(a + 1, b, b + 1));
        }
    }

    Mesh::new(vertices, triangles).context("building sphere mesh")
}

/// Orthographic grid of rays looking down -Z at the unit sphere.
fn camera_rays() -> Vec<Ray> {
    (0..IMAGE_SIZE * IMAGE_SIZE)
        .map(|i| {
            let x = (i % IMAGE_SIZE) as f32 / IMAGE_SIZE as f32 * 2.4 - 1.2;
            let y = (i / IMAGE_SIZE) as f32 / IMAGE_SIZE as f32 * 2.4 - 1.2;
            Ray::new(Vec3::new(x, y, 5.0), Vec3::NEG_Z)
        })
        .collect()
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let segments: u32 = match args.get(1) {
        Some(arg) => arg.parse().with_context(|| format!("invalid segment count '{}'", arg))?,
        None => 128,
    };
    if segments < 3 {
        bail!("need at least 3 segments, got {}", segments);
    }
    let user_config: Option<KdTreeConfig> = match args.get(2) {
        Some(json) => Some(serde_json::from_str(json).context("parsing kd-tree config")?),
        None => None,
    };

    let mut mesh = uv_sphere(segments)?;
    println!(
        "Sphere: {} vertices, {} triangles",
        mesh.vertex_count(),
        mesh.triangle_count()
    );

    let rays = camera_rays();
    let configs = match user_config {
        Some(config) => vec![config],
        None => vec![
            KdTreeConfig { strategy: SplitStrategy::Median, max_depth: 20 },
            KdTreeConfig::default(),
        ],
    };

    for config in &configs {
        let start = Instant::now();
        mesh.build_kd_tree_with(config);
        let build_time = start.elapsed();

        let stats = mesh.kd_tree().map(|tree| tree.stats()).unwrap_or_default();

        let start = Instant::now();
        let hits = mesh.intersect_batch(&rays);
        let cast_time = start.elapsed();
        let hit_count = hits.iter().filter(|hit| hit.is_some()).count();

        println!("\n=== {:?}, max depth {} ===", config.strategy, config.max_depth);
        println!("  Build: {:.2?}", build_time);
        println!(
            "  Tree: {} branches, {} leaves, depth {}, {} triangle refs, largest leaf {}",
            stats.branches, stats.leaves, stats.depth, stats.triangle_refs, stats.max_leaf_size
        );
        println!(
            "  Cast {} rays in {:.2?}: {} hits",
            rays.len(),
            cast_time,
            hit_count
        );

        // Spot-check against testing every triangle
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..64 {
            let i = rng.gen_range(0..rays.len());
            let expected = mesh.intersect_brute_force(&rays[i]);
            let actual = hits[i];
            // A different triangle is only acceptable on an exact tie
            let agree = match (expected, actual) {
                (Some(e), Some(a)) => e.distance.to_bits() == a.distance.to_bits(),
                (e, a) => e.is_none() && a.is_none(),
            };
            if !agree {
                bail!("ray {} disagrees: brute force {:?}, kd-tree {:?}", i, expected, actual);
            }
        }
        println!("  Brute-force spot check passed");
    }

    // Place the same mesh twice in the world
    let mesh = Arc::new(mesh);
    let models = [
        Model::new(Mat4::from_translation(Vec3::new(-1.5, 0.0, 0.0))).with_surface(mesh.clone(), MaterialId(0)),
        Model::new(Mat4::from_scale_rotation_translation(
            Vec3::splat(0.5),
            Default::default(),
            Vec3::new(1.5, 0.0, 0.0),
        ))
        .with_surface(mesh, MaterialId(1)),
    ];

    println!("\n--- Models ---");
    for x in [-1.5f32, 0.0, 1.5] {
        let ray = Ray::new(Vec3::new(x, 0.1, 10.0), Vec3::NEG_Z);
        let nearest = models
            .iter()
            .filter_map(|model| model.intersect(&ray))
            .min_by(|a, b| a.distance.total_cmp(&b.distance));

        match nearest {
            Some(hit) => println!(
                "  x={:>4.1}: material {:?} at {:.3} ({:.2}, {:.2}, {:.2}), normal ({:.2}, {:.2}, {:.2})",
                x,
                hit.material,
                hit.distance,
                hit.position.x,
                hit.position.y,
                hit.position.z,
                hit.normal.x,
                hit.normal.y,
                hit.normal.z
            ),
            None => println!("  x={:>4.1}: miss", x),
        }
    }

    Ok(())
}
