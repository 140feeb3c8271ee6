//! High-level bounding-volume abstraction
//!
//! The spatial indices and the rigid-body solver handle shapes through this
//! closed enum rather than trait objects, keeping the hot pair tests
//! monomorphic and dispatchable by a `match` on the kind pair.

use crate::foundation::math::{Point, Rot, Vector};
use crate::geometry::aabb::Aabb;
use crate::geometry::obb::Obb;
use crate::geometry::sphere::Sphere;

/// Bounding-volume variants understood by the indices and the solver
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Shape<const D: usize> {
    /// Axis-aligned box
    Aabb(Aabb<D>),
    /// Oriented box
    Obb(Obb<D>),
    /// Sphere
    Sphere(Sphere<D>),
}

impl<const D: usize> Shape<D> {
    /// Axis-aligned box from corner points
    pub fn aabb(min: Point<D>, max: Point<D>) -> Self {
        Self::Aabb(Aabb::new(min, max))
    }

    /// Oriented box from center, half-extents, and rotation
    pub fn obb(center: Point<D>, half_extents: Vector<D>, rotation: Rot<D>) -> Self {
        Self::Obb(Obb::new(center, half_extents, rotation))
    }

    /// Sphere from center and radius
    pub fn sphere(center: Point<D>, radius: f32) -> Self {
        Self::Sphere(Sphere::new(center, radius))
    }

    /// Center position in world space
    pub fn center(&self) -> Point<D> {
        match self {
            Self::Aabb(aabb) => aabb.center(),
            Self::Obb(obb) => obb.center,
            Self::Sphere(sphere) => sphere.center,
        }
    }

    /// World-space axis-aligned bounds
    pub fn bounds(&self) -> Aabb<D> {
        match self {
            Self::Aabb(aabb) => *aabb,
            Self::Obb(obb) => obb.bounds(),
            Self::Sphere(sphere) => sphere.bounds(),
        }
    }

    /// Radius of the sphere circumscribing the shape
    pub fn bounding_radius(&self) -> f32 {
        match self {
            Self::Aabb(aabb) => aabb.bounding_radius(),
            Self::Obb(obb) => obb.half_extents.norm(),
            Self::Sphere(sphere) => sphere.radius,
        }
    }

    /// Check if the shape contains a point (inclusive on the boundary)
    pub fn contains_point(&self, point: &Point<D>) -> bool {
        match self {
            Self::Aabb(aabb) => aabb.contains_point(point),
            Self::Obb(obb) => obb.contains_point(point),
            Self::Sphere(sphere) => sphere.contains_point(point),
        }
    }

    /// Closest point on or inside the shape to `point`
    pub fn closest_point(&self, point: &Point<D>) -> Point<D> {
        match self {
            Self::Aabb(aabb) => aabb.closest_point(point),
            Self::Obb(obb) => obb.closest_point(point),
            Self::Sphere(sphere) => sphere.closest_point(point),
        }
    }

    /// Moves the shape so its center lands on `center`
    pub fn set_position(&mut self, center: Point<D>) {
        match self {
            Self::Aabb(aabb) => aabb.set_position(center),
            Self::Obb(obb) => obb.set_position(center),
            Self::Sphere(sphere) => sphere.center = center,
        }
    }

    /// Replaces the rotation of an oriented box; no-op for the other kinds
    pub fn set_rotation(&mut self, rotation: Rot<D>) {
        if let Self::Obb(obb) = self {
            obb.set_rotation(rotation);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Rotation2, Vec2};

    #[test]
    fn test_set_position_preserves_extents() {
        let mut shape = Shape::aabb(Vec2::new(0.0, 0.0), Vec2::new(2.0, 4.0));
        shape.set_position(Vec2::new(10.0, 10.0));
        let bounds = shape.bounds();
        assert_eq!(bounds.min, Vec2::new(9.0, 8.0));
        assert_eq!(bounds.max, Vec2::new(11.0, 12.0));
    }

    #[test]
    fn test_bounds_cover_all_kinds() {
        let sphere = Shape::sphere(Vec2::new(1.0, 1.0), 2.0);
        assert_eq!(sphere.bounds().min, Vec2::new(-1.0, -1.0));

        let obb = Shape::obb(Vec2::zeros(), Vec2::new(1.0, 1.0), Rotation2::identity());
        assert_eq!(obb.bounds().max, Vec2::new(1.0, 1.0));
    }

    #[test]
    fn test_set_rotation_only_affects_obb() {
        let mut sphere = Shape::sphere(Vec2::zeros(), 1.0);
        sphere.set_rotation(Rotation2::new(1.0));
        assert_eq!(sphere, Shape::sphere(Vec2::zeros(), 1.0));
    }
}
