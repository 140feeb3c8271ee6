//! Bounding sphere

use crate::foundation::math::{Point, Vector};
use crate::geometry::aabb::Aabb;
use crate::geometry::ray::Ray;

/// A bounding sphere for collision detection
///
/// Invariant: `radius >= 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere<const D: usize> {
    /// The center position of the sphere in world space
    pub center: Point<D>,
    /// The radius of the sphere
    pub radius: f32,
}

impl<const D: usize> Sphere<D> {
    /// Creates a new bounding sphere with the given center and radius
    pub fn new(center: Point<D>, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Check if this sphere contains a point (inclusive on the surface)
    pub fn contains_point(&self, point: &Point<D>) -> bool {
        (point - self.center).norm_squared() <= self.radius * self.radius
    }

    /// Closest point on or inside the sphere to `point`
    pub fn closest_point(&self, point: &Point<D>) -> Point<D> {
        let delta = point - self.center;
        let dist = delta.norm();
        if dist <= self.radius || dist == 0.0 {
            *point
        } else {
            self.center + delta * (self.radius / dist)
        }
    }

    /// World-space box bounding the sphere
    pub fn bounds(&self) -> Aabb<D> {
        Aabb::from_center_extents(self.center, Vector::repeat(self.radius))
    }

    /// Test ray intersection with this sphere
    ///
    /// Geometric form of the quadratic solution. An origin inside the sphere
    /// is an immediate hit at distance zero; a sphere behind the ray is a
    /// miss, as is a negative discriminant.
    pub fn intersect_ray(&self, ray: &Ray<D>) -> Option<f32> {
        let oc = ray.origin - self.center;
        if oc.norm_squared() <= self.radius * self.radius {
            return Some(0.0);
        }

        let a = ray.direction.norm_squared();
        if a == 0.0 {
            return None;
        }
        let b = 2.0 * oc.dot(&ray.direction);
        let c = oc.norm_squared() - self.radius * self.radius;

        let discriminant = b * b - 4.0 * a * c;
        if discriminant < 0.0 {
            return None;
        }

        let t = (-b - discriminant.sqrt()) / (2.0 * a);
        if t < 0.0 {
            return None;
        }
        Some(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::Vec3;
    use approx::assert_relative_eq;

    #[test]
    fn test_contains_point_boundary() {
        let sphere = Sphere::new(Vec3::zeros(), 2.0);
        assert!(sphere.contains_point(&Vec3::new(2.0, 0.0, 0.0)));
        assert!(!sphere.contains_point(&Vec3::new(2.001, 0.0, 0.0)));
    }

    #[test]
    fn test_closest_point() {
        let sphere = Sphere::new(Vec3::zeros(), 1.0);
        let outside = sphere.closest_point(&Vec3::new(3.0, 0.0, 0.0));
        assert_relative_eq!(outside.x, 1.0, epsilon = 1e-6);
        let inside = Vec3::new(0.2, 0.1, 0.0);
        assert_eq!(sphere.closest_point(&inside), inside);
    }

    #[test]
    fn test_ray_hits_near_surface() {
        let sphere = Sphere::new(Vec3::new(5.0, 0.0, 0.0), 1.0);
        let ray = Ray::new(Vec3::zeros(), Vec3::new(1.0, 0.0, 0.0));
        let t = sphere.intersect_ray(&ray).unwrap();
        assert_relative_eq!(t, 4.0, epsilon = 1e-5);
    }

    #[test]
    fn test_ray_origin_inside_hits_at_origin() {
        let sphere = Sphere::new(Vec3::zeros(), 2.0);
        let ray = Ray::new(Vec3::new(0.5, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(sphere.intersect_ray(&ray), Some(0.0));
    }

    #[test]
    fn test_ray_behind_misses() {
        let sphere = Sphere::new(Vec3::new(-5.0, 0.0, 0.0), 1.0);
        let ray = Ray::new(Vec3::zeros(), Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(sphere.intersect_ray(&ray), None);
    }
}
