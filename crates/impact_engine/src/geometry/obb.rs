//! Oriented bounding box

use crate::foundation::math::{Point, Rot, Vector};
use crate::geometry::aabb::Aabb;

/// Oriented Bounding Box: a box with arbitrary rotation
///
/// Stored as center, half-extents along its local axes, and the rotation
/// carrying local axes into world space. Half-extents are non-negative;
/// zero-extent boxes are permitted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obb<const D: usize> {
    /// Center position in world space
    pub center: Point<D>,
    /// Half-extents along the local axes
    pub half_extents: Vector<D>,
    /// Rotation from local to world space
    pub rotation: Rot<D>,
}

impl<const D: usize> Obb<D> {
    /// Creates an oriented box from center, half-extents, and rotation
    pub fn new(center: Point<D>, half_extents: Vector<D>, rotation: Rot<D>) -> Self {
        Self {
            center,
            half_extents,
            rotation,
        }
    }

    /// The world-space direction of the i-th local axis
    pub fn axis(&self, i: usize) -> Vector<D> {
        self.rotation.matrix().column(i).clone_owned()
    }

    /// Transforms a world-space point into the box's local frame
    pub fn to_local(&self, point: &Point<D>) -> Point<D> {
        self.rotation.inverse() * (point - self.center)
    }

    /// Transforms a local-frame point back into world space
    pub fn to_world(&self, local: &Point<D>) -> Point<D> {
        self.rotation * local + self.center
    }

    /// Check if this box contains a point (inclusive on faces)
    pub fn contains_point(&self, point: &Point<D>) -> bool {
        let local = self.to_local(point);
        (0..D).all(|i| local[i].abs() <= self.half_extents[i])
    }

    /// Closest point on or inside the box to `point`
    pub fn closest_point(&self, point: &Point<D>) -> Point<D> {
        let local = self.to_local(point);
        let clamped =
            Point::from_fn(|i, _| local[i].clamp(-self.half_extents[i], self.half_extents[i]));
        self.to_world(&clamped)
    }

    /// World-space axis-aligned box bounding this box
    ///
    /// Projects the half-extents onto each world axis: the bound along world
    /// axis `j` is the sum of `|R[j][i]| * h[i]` over the local axes.
    pub fn bounds(&self) -> Aabb<D> {
        let m = self.rotation.matrix();
        let extents = Vector::from_fn(|j, _| {
            (0..D).map(|i| m[(j, i)].abs() * self.half_extents[i]).sum()
        });
        Aabb::from_center_extents(self.center, extents)
    }

    /// Moves the box center
    pub fn set_position(&mut self, center: Point<D>) {
        self.center = center;
    }

    /// Replaces the box rotation
    pub fn set_rotation(&mut self, rotation: Rot<D>) {
        self.rotation = rotation;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Rotation2, Vec2};
    use approx::assert_relative_eq;
    use std::f32::consts::FRAC_PI_4;

    #[test]
    fn test_identity_behaves_like_aabb() {
        let obb = Obb::new(Vec2::new(1.0, 1.0), Vec2::new(2.0, 1.0), Rotation2::identity());
        assert!(obb.contains_point(&Vec2::new(2.5, 1.5)));
        assert!(!obb.contains_point(&Vec2::new(3.5, 1.0)));
        let bounds = obb.bounds();
        assert_eq!(bounds.min, Vec2::new(-1.0, 0.0));
        assert_eq!(bounds.max, Vec2::new(3.0, 2.0));
    }

    #[test]
    fn test_rotated_contains_point() {
        // Unit square rotated 45 degrees: corners land on the axes at sqrt(2).
        let obb = Obb::new(Vec2::zeros(), Vec2::new(1.0, 1.0), Rotation2::new(FRAC_PI_4));
        assert!(obb.contains_point(&Vec2::new(1.4, 0.0)));
        assert!(!obb.contains_point(&Vec2::new(1.1, 1.1)));
    }

    #[test]
    fn test_rotated_bounds() {
        let obb = Obb::new(Vec2::zeros(), Vec2::new(1.0, 1.0), Rotation2::new(FRAC_PI_4));
        let bounds = obb.bounds();
        let expected = 2f32.sqrt();
        assert_relative_eq!(bounds.max.x, expected, epsilon = 1e-5);
        assert_relative_eq!(bounds.max.y, expected, epsilon = 1e-5);
    }

    #[test]
    fn test_closest_point_roundtrip() {
        let obb = Obb::new(Vec2::new(5.0, 0.0), Vec2::new(1.0, 1.0), Rotation2::new(FRAC_PI_4));
        let q = obb.closest_point(&Vec2::new(5.0, 10.0));
        // Closest point sits on the top corner of the rotated square.
        assert_relative_eq!(q.x, 5.0, epsilon = 1e-5);
        assert_relative_eq!(q.y, 2f32.sqrt(), epsilon = 1e-4);
        // Points inside map to themselves.
        let inside = Vec2::new(5.1, 0.2);
        let same = obb.closest_point(&inside);
        assert_relative_eq!(same.x, inside.x, epsilon = 1e-5);
        assert_relative_eq!(same.y, inside.y, epsilon = 1e-5);
    }
}
