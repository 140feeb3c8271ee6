//! Ray type for ray casting and picking

use crate::foundation::math::{Point, Vector};

/// A ray for ray casting against shapes and spatial indices
///
/// The direction is stored as given, not normalized; parametric distances
/// from intersection tests are therefore in units of the direction's length.
/// The component-wise inverse direction is precomputed for slab tests; axes
/// with a zero direction component hold an infinity there and are
/// special-cased by every consumer before dividing.
#[derive(Debug, Clone, Copy)]
pub struct Ray<const D: usize> {
    /// The origin point of the ray in world space
    pub origin: Point<D>,
    /// The direction of the ray
    pub direction: Vector<D>,
    /// Component-wise reciprocal of the direction
    pub inv_direction: Vector<D>,
}

impl<const D: usize> Ray<D> {
    /// Creates a new ray with the given origin and direction
    pub fn new(origin: Point<D>, direction: Vector<D>) -> Self {
        Self {
            origin,
            direction,
            inv_direction: direction.map(|c| 1.0 / c),
        }
    }

    /// Creates a ray passing from `from` toward `to`
    pub fn from_points(from: Point<D>, to: Point<D>) -> Self {
        Self::new(from, to - from)
    }

    /// Get a point along the ray at parametric distance t
    pub fn point_at(&self, t: f32) -> Point<D> {
        self.origin + self.direction * t
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;

    #[test]
    fn test_from_points_direction() {
        let ray = Ray::from_points(Vec3::new(3.0, 3.0, 3.0), Vec3::zeros());
        assert_eq!(ray.direction, Vec3::new(-3.0, -3.0, -3.0));
        assert_eq!(ray.point_at(1.0), Vec3::zeros());
    }

    #[test]
    fn test_inverse_direction() {
        let ray = Ray::new(Vec3::zeros(), Vec3::new(2.0, -4.0, 0.0));
        assert_eq!(ray.inv_direction.x, 0.5);
        assert_eq!(ray.inv_direction.y, -0.25);
        assert!(ray.inv_direction.z.is_infinite());
    }
}
