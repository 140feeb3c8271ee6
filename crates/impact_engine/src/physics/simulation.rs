//! Discrete rigid-body simulation
//!
//! Owns the bodies and a spatial index, and advances them with a fixed
//! per-call pipeline: accumulate forces, integrate, rebuild the index from
//! the moved shapes, resolve the candidate pairs it reports, and clamp
//! everything back into the world bound. The solver itself is free of
//! randomness — identical body states produce identical results.

use crate::foundation::math::{Point, Vector};
use crate::geometry::{resolve, Shape};
use crate::physics::body::{Body, BodyFlags, BodyId};
use crate::physics::layers::CollisionLayers;
use crate::spatial::{SpatialError, SpatialIndex};
use log::trace;
use thiserror::Error;

/// Errors surfaced by the simulation
#[derive(Error, Debug)]
pub enum PhysicsError {
    /// The spatial index rejected the rebuild
    #[error(transparent)]
    Spatial(#[from] SpatialError),
}

/// Default tolerance added to penetration depths during resolution.
const DEFAULT_TOLERANCE: f32 = 1e-3;

/// A rigid-body simulation over a world bound
///
/// The spatial index is chosen at construction (grid or tree, boxed behind
/// the shared trait) and rebuilt wholesale from the body shapes on every
/// [`solve`](Simulation::solve). Bodies are created through
/// [`add_body`](Simulation::add_body) and live as long as the simulation;
/// there is no individual removal. Body accessors panic on an out-of-range
/// id — that is a programming error, not a runtime condition.
pub struct Simulation<const D: usize> {
    world: Shape<D>,
    gravity: Vector<D>,
    bodies: Vec<Body<D>>,
    index: Box<dyn SpatialIndex<u32, D>>,
    tolerance: f32,
    /// Shape snapshot handed to the index each solve; kept to reuse the
    /// allocation.
    scratch_shapes: Vec<Shape<D>>,
}

impl<const D: usize> Simulation<D> {
    /// Creates a simulation over `world` with the given gravity and index
    pub fn new(world: Shape<D>, gravity: Vector<D>, index: Box<dyn SpatialIndex<u32, D>>) -> Self {
        Self {
            world,
            gravity,
            bodies: Vec::new(),
            index,
            tolerance: DEFAULT_TOLERANCE,
            scratch_shapes: Vec::new(),
        }
    }

    /// The world bound bodies are contained in
    pub fn world(&self) -> &Shape<D> {
        &self.world
    }

    /// Gravitational acceleration applied to every non-static body
    pub fn gravity(&self) -> &Vector<D> {
        &self.gravity
    }

    /// Replaces the gravity vector
    pub fn set_gravity(&mut self, gravity: Vector<D>) {
        self.gravity = gravity;
    }

    /// Tolerance added to penetration depths when separating bodies
    pub fn tolerance(&self) -> f32 {
        self.tolerance
    }

    /// Replaces the resolution tolerance
    pub fn set_tolerance(&mut self, tolerance: f32) {
        self.tolerance = tolerance;
    }

    /// Creates a body wrapping `shape` and returns its id
    ///
    /// A mass of zero makes the body static.
    pub fn add_body(&mut self, shape: Shape<D>, mass: f32) -> BodyId {
        let id = self.bodies.len() as BodyId;
        self.bodies.push(Body::new(shape, mass));
        id
    }

    /// Number of bodies in the simulation
    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    /// Borrows a body; panics on a bad id
    pub fn body(&self, id: BodyId) -> &Body<D> {
        &self.bodies[id as usize]
    }

    /// Mutably borrows a body; panics on a bad id
    pub fn body_mut(&mut self, id: BodyId) -> &mut Body<D> {
        &mut self.bodies[id as usize]
    }

    /// Accumulates a force on a body for the next solve
    pub fn add_force(&mut self, id: BodyId, force: Vector<D>) {
        self.bodies[id as usize].add_force(force);
    }

    /// Advances the simulation by `dt` seconds
    ///
    /// `damping` in `[0, 1]` sets how much velocity contacts bleed off:
    /// contact responses and world-bound bounces keep a `1 - damping`
    /// fraction of the velocity along the contact normal, so total
    /// mechanical energy cannot grow without bound for any positive
    /// damping.
    pub fn solve(&mut self, dt: f32, damping: f32) -> Result<(), PhysicsError> {
        let damping = damping.clamp(0.0, 1.0);
        let retention = 1.0 - damping;

        for body in &mut self.bodies {
            body.integrate(&self.gravity, dt);
        }

        self.scratch_shapes.clear();
        self.scratch_shapes
            .extend(self.bodies.iter().map(|body| *body.shape()));
        self.index.insert(&self.scratch_shapes)?;
        let candidates = self.index.get_collisions();
        trace!("solve: {} candidate pairs from broad phase", candidates.len());

        for (id_a, id_b) in candidates {
            self.resolve_pair(id_a as usize, id_b as usize, damping);
        }

        let world_bounds = self.world.bounds();
        for body in &mut self.bodies {
            body.contain(&world_bounds, retention);
        }
        Ok(())
    }

    /// Narrow phase and response for one candidate pair.
    fn resolve_pair(&mut self, a: usize, b: usize, damping: f32) {
        if !CollisionLayers::should_collide(
            self.bodies[a].layer(),
            self.bodies[a].mask(),
            self.bodies[b].layer(),
            self.bodies[b].mask(),
        ) {
            return;
        }

        let shape_a = *self.bodies[a].shape();
        let shape_b = *self.bodies[b].shape();
        let Some(resolution) = resolve(&shape_a, &shape_b, self.tolerance) else {
            return;
        };

        let sensor = self.bodies[a].flags().contains(BodyFlags::SENSOR)
            || self.bodies[b].flags().contains(BodyFlags::SENSOR);
        if sensor {
            return;
        }

        let inv_a = self.bodies[a].inv_mass();
        let inv_b = self.bodies[b].inv_mass();
        let inv_sum = inv_a + inv_b;
        if inv_sum == 0.0 {
            return;
        }

        // Inelastic impulse along the contact normal, then a damped
        // retention of what remains of the normal components.
        let normal = resolution.normal;
        let relative = self.bodies[a].velocity() - self.bodies[b].velocity();
        let closing = relative.dot(&normal);
        if closing < 0.0 {
            let impulse = -closing / inv_sum;
            let va = self.bodies[a].velocity() + normal * (impulse * inv_a);
            let vb = self.bodies[b].velocity() - normal * (impulse * inv_b);
            self.bodies[a].set_velocity(va - normal * (va.dot(&normal) * damping));
            self.bodies[b].set_velocity(vb - normal * (vb.dot(&normal) * damping));
        }

        // Split the separating displacement by inverse mass so a static
        // body never moves.
        let correction = resolution.offset;
        if inv_a > 0.0 {
            let position = shape_a.center() + correction * (inv_a / inv_sum);
            self.bodies[a].set_position(position);
        }
        if inv_b > 0.0 {
            let position = shape_b.center() - correction * (inv_b / inv_sum);
            self.bodies[b].set_position(position);
        }
    }

    /// Total mechanical energy: kinetic plus gravitational potential
    ///
    /// Potential energy is measured from the world bound's minimum corner
    /// along the direction opposing gravity. Static bodies contribute
    /// nothing. Exposed as a diagnostic — under positive damping the total
    /// must not grow without bound.
    pub fn get_total_energy(&self) -> f32 {
        let g = self.gravity.norm();
        let up = if g > 0.0 {
            -self.gravity / g
        } else {
            Vector::zeros()
        };
        let origin: Point<D> = self.world.bounds().min;

        self.bodies
            .iter()
            .filter(|body| !body.is_static())
            .map(|body| {
                let mass = body.mass();
                let kinetic = 0.5 * mass * body.velocity().norm_squared();
                let height = (body.position() - origin).dot(&up);
                kinetic + mass * g * height
            })
            .sum()
    }
}
