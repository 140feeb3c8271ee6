//! # Impact Engine
//!
//! Spatial partitioning, broad-phase collision detection, and discrete
//! rigid-body physics, generic over 2D/3D/4D coordinates.
//!
//! ## Features
//!
//! - **Primitives**: axis-aligned boxes, oriented boxes, spheres, and rays
//!   with pairwise intersection, contact points, and penetration resolution
//! - **Spatial indices**: a uniform grid and a hierarchical region tree
//!   behind one trait, reporting deduplicated colliding pairs, point and
//!   region queries, and ray casts
//! - **Physics**: a deterministic fixed-step solver with damped impulse
//!   response, world-bound containment, and energy accounting
//!
//! ## Quick Start
//!
//! ```rust
//! use impact_engine::prelude::*;
//!
//! // A 3D world, a grid index over it, and a simulation with gravity.
//! let world = Shape::aabb(Vec3::repeat(-10.0), Vec3::repeat(10.0));
//! let index = Box::new(Grid::<u32, 3>::new(world.bounds()));
//! let mut sim = Simulation::new(world, Vec3::new(0.0, -9.81, 0.0), index);
//!
//! let ball = sim.add_body(Shape::sphere(Vec3::new(0.0, 5.0, 0.0), 1.0), 1.0);
//! sim.solve(1.0 / 60.0, 0.01)?;
//! assert!(sim.body(ball).position().y < 5.0);
//! # Ok::<(), impact_engine::physics::PhysicsError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod config;
pub mod foundation;
pub mod geometry;
pub mod physics;
pub mod spatial;

/// Common imports for engine users
pub mod prelude {
    pub use crate::config::{Config, GridConfig, SolverConfig, TreeConfig};
    pub use crate::foundation::math::{Point, Rot, Vec2, Vec3, Vec4, Vector};
    pub use crate::geometry::{
        intersect, intersect_contact, intersect_ray, resolve, Aabb, Obb, Ray, Resolution, Shape,
        Sphere,
    };
    pub use crate::physics::{Body, BodyFlags, BodyId, CollisionLayers, Simulation};
    pub use crate::spatial::{Grid, ShapeId, SpatialIndex, Tree};
}
