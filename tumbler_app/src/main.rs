//! Tumbler demo
//!
//! Fills a world with randomly scattered shapes, compares the grid and
//! tree broad phases on the same data, casts a few rays, then drops
//! everything into a rigid-body simulation and reports throughput and
//! energy as the pile settles.

use impact_engine::foundation::math::{Rotation3, Vec3};
use impact_engine::prelude::*;
use log::{info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashSet;
use std::time::Instant;

const WORLD_EXTENT: f32 = 50.0;
const SHAPE_COUNT: usize = 2000;
const SIM_BODIES: usize = 300;
const SIM_STEPS: usize = 600;
const RNG_SEED: u64 = 0x00c0_ffee;

fn random_shape(rng: &mut StdRng) -> Shape<3> {
    let margin = 4.0;
    let center = Vec3::new(
        rng.gen_range(-WORLD_EXTENT + margin..WORLD_EXTENT - margin),
        rng.gen_range(-WORLD_EXTENT + margin..WORLD_EXTENT - margin),
        rng.gen_range(-WORLD_EXTENT + margin..WORLD_EXTENT - margin),
    );
    match rng.gen_range(0..3) {
        0 => Shape::sphere(center, rng.gen_range(0.3..1.5)),
        1 => {
            let half = Vec3::new(
                rng.gen_range(0.3..1.5),
                rng.gen_range(0.3..1.5),
                rng.gen_range(0.3..1.5),
            );
            Shape::aabb(center - half, center + half)
        }
        _ => {
            let half = Vec3::new(
                rng.gen_range(0.3..1.2),
                rng.gen_range(0.3..1.2),
                rng.gen_range(0.3..1.2),
            );
            let rotation =
                Rotation3::from_axis_angle(&Vec3::y_axis(), rng.gen_range(0.0..std::f32::consts::TAU));
            Shape::obb(center, half, rotation)
        }
    }
}

fn compare_broad_phases(shapes: &[Shape<3>], world: &Aabb<3>) {
    let mut grid: Grid<u32, 3> = Grid::new(*world);
    let start = Instant::now();
    grid.insert(shapes).expect("shape count fits u32 ids");
    let grid_pairs = grid.get_collisions();
    let grid_time = start.elapsed();
    info!(
        "grid:   scale {:>3}, {:>6} pairs in {:>8.2?}",
        grid.get_scale(),
        grid_pairs.len(),
        grid_time
    );

    let mut tree: Tree<u32, 3> = Tree::new(*world);
    let start = Instant::now();
    tree.insert(shapes).expect("shape count fits u32 ids");
    let tree_pairs = tree.get_collisions();
    let tree_time = start.elapsed();
    info!(
        "tree:   depth {:>3}, {:>6} pairs in {:>8.2?} ({} nodes)",
        tree.depth(),
        tree_pairs.len(),
        tree_time,
        tree.node_count()
    );

    let grid_set: HashSet<(u32, u32)> = grid_pairs.into_iter().collect();
    let tree_set: HashSet<(u32, u32)> = tree_pairs.into_iter().collect();
    if grid_set == tree_set {
        info!("broad phases agree on {} colliding pairs", grid_set.len());
    } else {
        warn!(
            "broad phases disagree: {} grid-only, {} tree-only",
            grid_set.difference(&tree_set).count(),
            tree_set.difference(&grid_set).count()
        );
    }

    // A few rays through the soup, from outside the world toward random
    // interior targets.
    let mut rng = StdRng::seed_from_u64(RNG_SEED ^ 0xdead);
    for i in 0..5 {
        let target = Vec3::new(
            rng.gen_range(-20.0..20.0),
            rng.gen_range(-20.0..20.0),
            rng.gen_range(-20.0..20.0),
        );
        let ray = Ray::from_points(Vec3::new(-60.0, i as f32 * 5.0, 0.0), target);
        let hits = grid.get_collisions_ray(&ray);
        match hits.first() {
            Some((id, point)) => info!(
                "ray {i}: first hit shape {id} at ({:.2}, {:.2}, {:.2})",
                point.x, point.y, point.z
            ),
            None => info!("ray {i}: no hit"),
        }
    }
}

fn settle_pile(shapes: &[Shape<3>], world_shape: &Shape<3>) {
    let config = SolverConfig {
        dt: 1.0 / 60.0,
        damping: 0.2,
        ..SolverConfig::default()
    };
    let gravity = Vec3::from_column_slice(&config.gravity);

    let index = Box::new(Grid::<u32, 3>::new(world_shape.bounds()));
    let mut sim = Simulation::new(*world_shape, gravity, index);
    sim.set_tolerance(config.tolerance);

    // A static slab at the bottom of the world plus dynamic bodies above.
    let floor = Shape::aabb(
        Vec3::new(-WORLD_EXTENT, -WORLD_EXTENT, -WORLD_EXTENT),
        Vec3::new(WORLD_EXTENT, -WORLD_EXTENT + 2.0, WORLD_EXTENT),
    );
    let floor_id = sim.add_body(floor, 0.0);
    sim.body_mut(floor_id)
        .set_layers(CollisionLayers::WORLD, CollisionLayers::ALL);

    for shape in shapes.iter().take(SIM_BODIES) {
        let mass = shape.bounding_radius().powi(3).max(0.1);
        let id = sim.add_body(*shape, mass);
        sim.body_mut(id)
            .set_layers(CollisionLayers::DEFAULT, CollisionLayers::ALL);
    }

    info!(
        "simulating {} bodies for {} steps at dt {:.4}",
        sim.body_count(),
        SIM_STEPS,
        config.dt
    );
    let start = Instant::now();
    for step in 0..SIM_STEPS {
        if let Err(err) = sim.solve(config.dt, config.damping) {
            warn!("solve failed at step {step}: {err}");
            return;
        }
        if step % 120 == 0 {
            info!(
                "step {:>4}: total energy {:>12.1}",
                step,
                sim.get_total_energy()
            );
        }
    }
    let elapsed = start.elapsed();
    info!(
        "settled: final energy {:.1}, {:.1} steps/s",
        sim.get_total_energy(),
        SIM_STEPS as f64 / elapsed.as_secs_f64()
    );
}

fn main() {
    impact_engine::foundation::logging::init();

    let world = Aabb::new(Vec3::repeat(-WORLD_EXTENT), Vec3::repeat(WORLD_EXTENT));
    let world_shape = Shape::Aabb(world);

    let mut rng = StdRng::seed_from_u64(RNG_SEED);
    let shapes: Vec<Shape<3>> = (0..SHAPE_COUNT).map(|_| random_shape(&mut rng)).collect();
    info!("scattered {} shapes in ±{WORLD_EXTENT}", shapes.len());

    compare_broad_phases(&shapes, &world);
    settle_pile(&shapes, &world_shape);
}
