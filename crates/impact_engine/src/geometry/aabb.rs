//! Axis-aligned bounding box

use crate::foundation::math::{Point, Vector};
use crate::geometry::ray::Ray;

/// Axis-Aligned Bounding Box for spatial queries
///
/// Invariant: `min` components are less than or equal to their counterparts
/// in `max`. Zero-extent (point) boxes are permitted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb<const D: usize> {
    /// Minimum corner of the bounding box
    pub min: Point<D>,
    /// Maximum corner of the bounding box
    pub max: Point<D>,
}

impl<const D: usize> Aabb<D> {
    /// Create a new AABB from min and max points
    pub fn new(min: Point<D>, max: Point<D>) -> Self {
        Self { min, max }
    }

    /// Create an AABB centered at a point with given half-extents
    pub fn from_center_extents(center: Point<D>, extents: Vector<D>) -> Self {
        Self {
            min: center - extents,
            max: center + extents,
        }
    }

    /// Get the center of the AABB
    pub fn center(&self) -> Point<D> {
        (self.min + self.max) * 0.5
    }

    /// Get the extents (half-size) of the AABB
    pub fn extents(&self) -> Vector<D> {
        (self.max - self.min) * 0.5
    }

    /// Radius of the sphere circumscribing the box
    pub fn bounding_radius(&self) -> f32 {
        self.extents().norm()
    }

    /// Check if this AABB contains a point (inclusive on faces)
    pub fn contains_point(&self, point: &Point<D>) -> bool {
        (0..D).all(|i| point[i] >= self.min[i] && point[i] <= self.max[i])
    }

    /// Check if this AABB intersects another AABB (inclusive on faces)
    pub fn intersects(&self, other: &Self) -> bool {
        (0..D).all(|i| self.min[i] <= other.max[i] && self.max[i] >= other.min[i])
    }

    /// Closest point on or inside the box to `point`
    pub fn closest_point(&self, point: &Point<D>) -> Point<D> {
        Point::from_fn(|i, _| point[i].clamp(self.min[i], self.max[i]))
    }

    /// Smallest box containing both boxes
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.inf(&other.min),
            max: self.max.sup(&other.max),
        }
    }

    /// Move the box so its center lands on `center`, keeping its extents
    pub fn set_position(&mut self, center: Point<D>) {
        let extents = self.extents();
        self.min = center - extents;
        self.max = center + extents;
    }

    /// Test ray intersection with this AABB using the slab method
    ///
    /// Returns the parametric distance to the entry point if the ray
    /// intersects, `None` otherwise. An origin inside the box reports entry
    /// at distance zero. Axes the ray runs parallel to are checked against
    /// the slab bounds before any division so a zero direction component
    /// never produces a `0/0`.
    pub fn intersect_ray(&self, ray: &Ray<D>) -> Option<f32> {
        let mut t_near = f32::NEG_INFINITY;
        let mut t_far = f32::INFINITY;

        for i in 0..D {
            if ray.direction[i] == 0.0 {
                if ray.origin[i] < self.min[i] || ray.origin[i] > self.max[i] {
                    return None;
                }
            } else {
                let t1 = (self.min[i] - ray.origin[i]) * ray.inv_direction[i];
                let t2 = (self.max[i] - ray.origin[i]) * ray.inv_direction[i];
                let (near, far) = if t1 <= t2 { (t1, t2) } else { (t2, t1) };
                t_near = t_near.max(near);
                t_far = t_far.min(far);
                if t_near > t_far {
                    return None;
                }
            }
        }

        if t_far < 0.0 {
            return None;
        }
        Some(t_near.max(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::{Vec2, Vec3};

    #[test]
    fn test_center_extents_roundtrip() {
        let aabb = Aabb::from_center_extents(Vec3::new(1.0, 2.0, 3.0), Vec3::new(0.5, 1.0, 1.5));
        assert_eq!(aabb.min, Vec3::new(0.5, 1.0, 1.5));
        assert_eq!(aabb.max, Vec3::new(1.5, 3.0, 4.5));
        assert_eq!(aabb.center(), Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_contains_point_inclusive() {
        let aabb = Aabb::new(Vec2::new(-1.0, -1.0), Vec2::new(1.0, 1.0));
        assert!(aabb.contains_point(&Vec2::new(0.0, 0.0)));
        assert!(aabb.contains_point(&Vec2::new(1.0, 1.0)));
        assert!(!aabb.contains_point(&Vec2::new(1.0001, 0.0)));
    }

    #[test]
    fn test_degenerate_point_box() {
        let point = Vec3::new(2.0, 2.0, 2.0);
        let aabb = Aabb::new(point, point);
        assert!(aabb.contains_point(&point));
        assert!(aabb.intersects(&Aabb::new(Vec3::new(1.0, 1.0, 1.0), Vec3::new(3.0, 3.0, 3.0))));
        assert_eq!(aabb.bounding_radius(), 0.0);
    }

    #[test]
    fn test_ray_parallel_to_slab() {
        let aabb = Aabb::new(Vec2::new(-2.0, -2.0), Vec2::new(2.0, 2.0));
        // Runs parallel to x outside the y slab.
        let miss = Ray::new(Vec2::new(-5.0, 3.0), Vec2::new(1.0, 0.0));
        assert_eq!(aabb.intersect_ray(&miss), None);
        // Same direction, inside the y slab.
        let hit = Ray::new(Vec2::new(-5.0, 0.0), Vec2::new(1.0, 0.0));
        assert_eq!(aabb.intersect_ray(&hit), Some(3.0));
    }
}
