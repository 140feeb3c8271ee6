//! Geometric primitives and intersection tests
//!
//! Value-type bounding volumes (axis-aligned box, oriented box, sphere), a
//! ray type, pairwise intersection/contact kernels, and penetration
//! resolution. Everything is generic over the coordinate dimension.

pub mod aabb;
pub mod intersect;
pub mod obb;
pub mod ray;
pub mod resolve;
pub mod shape;
pub mod sphere;

pub use aabb::Aabb;
pub use intersect::{intersect, intersect_contact, intersect_ray};
pub use obb::Obb;
pub use ray::Ray;
pub use resolve::{resolve, Resolution};
pub use shape::Shape;
pub use sphere::Sphere;
