//! Rigid body state

use crate::foundation::math::{orthonormalize, Matrix, Point, Rot, Rotation, Vector};
use crate::geometry::{Aabb, Shape};
use crate::physics::layers::CollisionLayers;
use bitflags::bitflags;

/// Handle to a body inside a simulation (its index in creation order)
pub type BodyId = u32;

bitflags! {
    /// Behavior flags for a rigid body
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct BodyFlags: u32 {
        /// Never integrates or responds; an immovable obstacle
        const STATIC = 1 << 0;
        /// Takes part in detection but receives no collision response
        const SENSOR = 1 << 1;
    }
}

/// One rigid body: a bounding volume plus linear and angular state
///
/// The body's position lives inside its shape; mass is stored inverted so
/// a static body is simply `inv_mass == 0`. Forces accumulate between
/// solves and are consumed by the integration step.
#[derive(Debug, Clone)]
pub struct Body<const D: usize> {
    shape: Shape<D>,
    velocity: Vector<D>,
    orientation: Rot<D>,
    /// Angular velocity as an antisymmetric generator matrix
    spin: Matrix<D>,
    inv_mass: f32,
    force: Vector<D>,
    flags: BodyFlags,
    layer: u32,
    mask: u32,
}

impl<const D: usize> Body<D> {
    /// Creates a body wrapping `shape` with the given mass
    ///
    /// A mass of zero (or less) makes the body static.
    pub fn new(shape: Shape<D>, mass: f32) -> Self {
        let (inv_mass, flags) = if mass > 0.0 {
            (1.0 / mass, BodyFlags::empty())
        } else {
            (0.0, BodyFlags::STATIC)
        };
        Self {
            shape,
            velocity: Vector::zeros(),
            orientation: Rot::identity(),
            spin: Matrix::zeros(),
            inv_mass,
            force: Vector::zeros(),
            flags,
            layer: CollisionLayers::DEFAULT,
            mask: CollisionLayers::ALL,
        }
    }

    /// The body's bounding volume
    pub fn shape(&self) -> &Shape<D> {
        &self.shape
    }

    /// Center position in world space
    pub fn position(&self) -> Point<D> {
        self.shape.center()
    }

    /// Moves the body, keeping its velocity
    pub fn set_position(&mut self, position: Point<D>) {
        self.shape.set_position(position);
    }

    /// Current orientation
    pub fn rotation(&self) -> &Rot<D> {
        &self.orientation
    }

    /// Replaces the orientation (and the shape's rotation, for boxes)
    pub fn set_rotation(&mut self, rotation: Rot<D>) {
        self.orientation = rotation;
        self.shape.set_rotation(rotation);
    }

    /// Linear velocity
    pub fn velocity(&self) -> &Vector<D> {
        &self.velocity
    }

    /// Replaces the linear velocity
    pub fn set_velocity(&mut self, velocity: Vector<D>) {
        self.velocity = velocity;
    }

    /// Angular velocity as an antisymmetric spin matrix
    ///
    /// Build one with [`spin2`](crate::foundation::math::spin2) or
    /// [`spin3`](crate::foundation::math::spin3).
    pub fn angular_velocity(&self) -> &Matrix<D> {
        &self.spin
    }

    /// Replaces the angular velocity
    pub fn set_angular_velocity(&mut self, spin: Matrix<D>) {
        self.spin = spin;
    }

    /// Inverse mass; zero for static bodies
    pub fn inv_mass(&self) -> f32 {
        self.inv_mass
    }

    /// Mass; infinite for static bodies
    pub fn mass(&self) -> f32 {
        if self.inv_mass > 0.0 {
            1.0 / self.inv_mass
        } else {
            f32::INFINITY
        }
    }

    /// Accumulates a force for the next solve step
    pub fn add_force(&mut self, force: Vector<D>) {
        self.force += force;
    }

    /// Behavior flags
    pub fn flags(&self) -> BodyFlags {
        self.flags
    }

    /// Replaces the behavior flags
    pub fn set_flags(&mut self, flags: BodyFlags) {
        self.flags = flags;
    }

    /// Collision layer this body is on
    pub fn layer(&self) -> u32 {
        self.layer
    }

    /// Collision mask this body tests against
    pub fn mask(&self) -> u32 {
        self.mask
    }

    /// Sets the collision layer and mask
    pub fn set_layers(&mut self, layer: u32, mask: u32) {
        self.layer = layer;
        self.mask = mask;
    }

    /// Whether the body is immovable
    pub fn is_static(&self) -> bool {
        self.flags.contains(BodyFlags::STATIC) || self.inv_mass == 0.0
    }

    /// Semi-implicit Euler step: velocity from accumulated forces, then
    /// position from the new velocity. Consumes the force accumulator.
    pub(crate) fn integrate(&mut self, gravity: &Vector<D>, dt: f32) {
        if self.is_static() {
            self.force = Vector::zeros();
            return;
        }

        let acceleration = gravity + self.force * self.inv_mass;
        self.velocity += acceleration * dt;
        let position = self.shape.center() + self.velocity * dt;
        self.shape.set_position(position);

        if self.spin != Matrix::<D>::zeros() {
            // First-order orientation update, re-orthonormalized to keep
            // the matrix a rotation.
            let current = self.orientation.into_inner();
            let mut next = current + (self.spin * current) * dt;
            orthonormalize(&mut next);
            self.orientation = Rotation::from_matrix_unchecked(next);
            self.shape.set_rotation(self.orientation);
        }

        self.force = Vector::zeros();
    }

    /// Clamps the body into the world bound, reflecting the velocity
    /// component that carried it out (scaled by `retention`).
    pub(crate) fn contain(&mut self, world: &Aabb<D>, retention: f32) {
        if self.is_static() {
            return;
        }

        let bounds = self.shape.bounds();
        let mut center = self.shape.center();
        let mut moved = false;
        for i in 0..D {
            if bounds.min[i] < world.min[i] {
                center[i] += world.min[i] - bounds.min[i];
                if self.velocity[i] < 0.0 {
                    self.velocity[i] = -self.velocity[i] * retention;
                }
                moved = true;
            } else if bounds.max[i] > world.max[i] {
                center[i] -= bounds.max[i] - world.max[i];
                if self.velocity[i] > 0.0 {
                    self.velocity[i] = -self.velocity[i] * retention;
                }
                moved = true;
            }
        }
        if moved {
            self.shape.set_position(center);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{spin2, Vec2};
    use approx::assert_relative_eq;

    #[test]
    fn test_static_body_never_integrates() {
        let mut body = Body::new(Shape::sphere(Vec2::zeros(), 1.0), 0.0);
        assert!(body.is_static());
        body.add_force(Vec2::new(100.0, 0.0));
        body.integrate(&Vec2::new(0.0, -10.0), 0.1);
        assert_eq!(body.position(), Vec2::zeros());
        assert_eq!(*body.velocity(), Vec2::zeros());
    }

    #[test]
    fn test_semi_implicit_euler_order() {
        // Velocity updates first, the position step uses the new velocity.
        let mut body = Body::new(Shape::sphere(Vec2::zeros(), 1.0), 2.0);
        body.add_force(Vec2::new(4.0, 0.0));
        body.integrate(&Vec2::zeros(), 0.5);
        assert_relative_eq!(body.velocity().x, 1.0, epsilon = 1e-6);
        assert_relative_eq!(body.position().x, 0.5, epsilon = 1e-6);
        // Force accumulator was consumed.
        body.integrate(&Vec2::zeros(), 0.5);
        assert_relative_eq!(body.velocity().x, 1.0, epsilon = 1e-6);
    }

    #[test]
    fn test_orientation_advances_under_spin() {
        let mut body = Body::new(
            Shape::obb(Vec2::zeros(), Vec2::new(1.0, 0.5), Rot::identity()),
            1.0,
        );
        body.set_angular_velocity(spin2(1.0));
        for _ in 0..10 {
            body.integrate(&Vec2::zeros(), 0.01);
        }
        let angle = body.rotation().angle();
        assert_relative_eq!(angle, 0.1, epsilon = 1e-3);
    }

    #[test]
    fn test_contain_reflects_velocity() {
        let world = Aabb::new(Vec2::new(-5.0, -5.0), Vec2::new(5.0, 5.0));
        let mut body = Body::new(Shape::sphere(Vec2::new(-4.9, 0.0), 1.0), 1.0);
        body.set_velocity(Vec2::new(-2.0, 0.0));
        body.contain(&world, 0.5);
        assert_relative_eq!(body.position().x, -4.0, epsilon = 1e-5);
        assert_relative_eq!(body.velocity().x, 1.0, epsilon = 1e-5);
    }
}
