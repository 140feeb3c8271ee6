//! Penetration resolution for intersecting shape pairs
//!
//! Given a pair already known (or suspected) to overlap, computes the
//! minimum-translation direction, the penetration depth, an approximate
//! contact point, and the displacement that separates the first shape from
//! the second. The tolerance argument is added to the penetration depth so
//! the displaced shape ends up slightly past exact contact instead of
//! re-colliding on the next test through floating-point roundoff.

use crate::foundation::math::{Point, Vector};
use crate::geometry::intersect::{box_data, boxes_min_penetration, sphere_box_penetration};
use crate::geometry::shape::Shape;

/// Outcome of resolving an intersecting pair `(A, B)`
#[derive(Debug, Clone, Copy)]
pub struct Resolution<const D: usize> {
    /// Unit contact normal pointing from B toward A
    pub normal: Vector<D>,
    /// Approximate contact point in world space
    pub contact: Point<D>,
    /// Displacement to apply to A: `normal * (penetration + tolerance)`
    pub offset: Vector<D>,
}

/// Resolves the penetration of shape `a` into shape `b`
///
/// Returns `None` when the shapes do not overlap. Box pairs pick the axis of
/// least penetration among both boxes' face axes; an exact tie keeps the
/// axis tested first (A's lowest axis index). Sphere pairs separate along
/// the center-to-center direction.
pub fn resolve<const D: usize>(a: &Shape<D>, b: &Shape<D>, tolerance: f32) -> Option<Resolution<D>> {
    match (a, b) {
        (Shape::Sphere(sa), Shape::Sphere(sb)) => {
            let rsum = sa.radius + sb.radius;
            let delta = sa.center - sb.center;
            let dist_sq = delta.norm_squared();
            if dist_sq > rsum * rsum {
                return None;
            }
            let dist = dist_sq.sqrt();
            let normal = if dist > f32::EPSILON {
                delta / dist
            } else {
                // Coincident centers: any direction separates; use axis 0.
                Vector::from_fn(|i, _| if i == 0 { 1.0 } else { 0.0 })
            };
            Some(Resolution {
                normal,
                contact: sb.center + normal * sb.radius,
                offset: normal * (rsum - dist + tolerance),
            })
        }
        (Shape::Sphere(sphere), other) => {
            let (bc, bh, brot) = box_data(other)?;
            let (normal, penetration) =
                sphere_box_penetration(&sphere.center, sphere.radius, &bc, &bh, &brot)?;
            Some(Resolution {
                normal,
                contact: sphere.center - normal * sphere.radius,
                offset: normal * (penetration + tolerance),
            })
        }
        (other, Shape::Sphere(sphere)) => {
            let (bc, bh, brot) = box_data(other)?;
            let (toward_sphere, penetration) =
                sphere_box_penetration(&sphere.center, sphere.radius, &bc, &bh, &brot)?;
            // The kernel's normal points from the box (A) toward the sphere
            // (B); flip it so it points from B toward A.
            let normal = -toward_sphere;
            Some(Resolution {
                normal,
                contact: sphere.center + normal * sphere.radius,
                offset: normal * (penetration + tolerance),
            })
        }
        (a, b) => {
            let (ca, ha, ra) = box_data(a)?;
            let (cb, hb, rb) = box_data(b)?;
            let (normal, penetration) = boxes_min_penetration(&ca, &ha, &ra, &cb, &hb, &rb)?;
            let on_a = a.closest_point(&cb);
            let on_b = b.closest_point(&ca);
            Some(Resolution {
                normal,
                contact: (on_a + on_b) * 0.5,
                offset: normal * (penetration + tolerance),
            })
        }
    }
}
