//! Pairwise and ray intersection tests
//!
//! Boolean overlap tests between any two of {AABB, OBB, sphere}, contact
//! point variants, and ray casts against each shape kind. Box pairs use the
//! Separating Axis Theorem over each box's local face axes; sphere pairs
//! reduce to "closest point within radius". All boundary comparisons are
//! inclusive, so shapes touching exactly on a face or at a tangent point
//! count as intersecting.

use crate::foundation::math::{Point, Rot, Vector};
use crate::geometry::aabb::Aabb;
use crate::geometry::ray::Ray;
use crate::geometry::shape::Shape;

/// Direction lengths below this are treated as degenerate when normalizing.
const DEGENERATE_EPS: f32 = 1e-6;

/// Center, half-extents, and orientation of a box-like shape.
pub(crate) fn box_data<const D: usize>(shape: &Shape<D>) -> Option<(Point<D>, Vector<D>, Rot<D>)> {
    match shape {
        Shape::Aabb(aabb) => Some((aabb.center(), aabb.extents(), Rot::identity())),
        Shape::Obb(obb) => Some((obb.center, obb.half_extents, obb.rotation)),
        Shape::Sphere(_) => None,
    }
}

/// Half-length of a box's projection onto `axis` (axis must be unit length).
fn projected_radius<const D: usize>(
    axis: &Vector<D>,
    half: &Vector<D>,
    rotation: &Rot<D>,
) -> f32 {
    let m = rotation.matrix();
    (0..D)
        .map(|i| {
            let dot: f32 = (0..D).map(|j| axis[j] * m[(j, i)]).sum();
            dot.abs() * half[i]
        })
        .sum()
}

/// SAT over the face axes of both boxes.
///
/// Returns `false` as soon as a separating axis is found.
fn boxes_intersect<const D: usize>(
    ca: &Point<D>,
    ha: &Vector<D>,
    ra: &Rot<D>,
    cb: &Point<D>,
    hb: &Vector<D>,
    rb: &Rot<D>,
) -> bool {
    let delta = cb - ca;
    for owner in 0..2 {
        let rot = if owner == 0 { ra } else { rb };
        let m = rot.matrix();
        for k in 0..D {
            let axis: Vector<D> = m.column(k).clone_owned();
            let span = projected_radius(&axis, ha, ra) + projected_radius(&axis, hb, rb);
            if delta.dot(&axis).abs() > span {
                return false;
            }
        }
    }
    true
}

/// SAT returning the axis of least penetration.
///
/// Axes are tested in A's local order then B's; the strict `<` while
/// tracking the minimum means an exact tie keeps the earlier axis, so equal
/// penetrations break deterministically toward A's lowest axis index. The
/// returned normal points from B toward A.
pub(crate) fn boxes_min_penetration<const D: usize>(
    ca: &Point<D>,
    ha: &Vector<D>,
    ra: &Rot<D>,
    cb: &Point<D>,
    hb: &Vector<D>,
    rb: &Rot<D>,
) -> Option<(Vector<D>, f32)> {
    let delta = cb - ca;
    let mut best_axis = Vector::<D>::zeros();
    let mut best_overlap = f32::INFINITY;

    for owner in 0..2 {
        let rot = if owner == 0 { ra } else { rb };
        let m = rot.matrix();
        for k in 0..D {
            let axis: Vector<D> = m.column(k).clone_owned();
            let span = projected_radius(&axis, ha, ra) + projected_radius(&axis, hb, rb);
            let overlap = span - delta.dot(&axis).abs();
            if overlap < 0.0 {
                return None;
            }
            if overlap < best_overlap {
                best_overlap = overlap;
                best_axis = axis;
            }
        }
    }

    if (ca - cb).dot(&best_axis) < 0.0 {
        best_axis = -best_axis;
    }
    Some((best_axis, best_overlap))
}

/// Penetration of a sphere into a box.
///
/// Returns the normal pointing from the box toward the sphere center and the
/// penetration depth, or `None` when separated. A center buried inside the
/// box exits through the nearest face.
pub(crate) fn sphere_box_penetration<const D: usize>(
    sphere_center: &Point<D>,
    radius: f32,
    bc: &Point<D>,
    bh: &Vector<D>,
    brot: &Rot<D>,
) -> Option<(Vector<D>, f32)> {
    let local = brot.inverse() * (sphere_center - bc);
    let inside = (0..D).all(|i| local[i].abs() <= bh[i]);

    if inside {
        let mut best = 0;
        let mut best_dist = f32::INFINITY;
        for i in 0..D {
            let face_dist = bh[i] - local[i].abs();
            if face_dist < best_dist {
                best_dist = face_dist;
                best = i;
            }
        }
        let sign = if local[best] >= 0.0 { 1.0 } else { -1.0 };
        let mut local_normal = Vector::<D>::zeros();
        local_normal[best] = sign;
        return Some((brot * local_normal, best_dist + radius));
    }

    let clamped = Point::from_fn(|i, _| local[i].clamp(-bh[i], bh[i]));
    let closest = brot * clamped + bc;
    let delta = sphere_center - closest;
    let dist = delta.norm();
    if dist > radius {
        return None;
    }
    Some((delta / dist, radius - dist))
}

/// Returns whether two shapes overlap (inclusive on boundaries)
pub fn intersect<const D: usize>(a: &Shape<D>, b: &Shape<D>) -> bool {
    match (a, b) {
        (Shape::Sphere(sa), Shape::Sphere(sb)) => {
            let rsum = sa.radius + sb.radius;
            (sa.center - sb.center).norm_squared() <= rsum * rsum
        }
        (Shape::Aabb(ba), Shape::Aabb(bb)) => ba.intersects(bb),
        (Shape::Sphere(sphere), other) | (other, Shape::Sphere(sphere)) => {
            let closest = other.closest_point(&sphere.center);
            (closest - sphere.center).norm_squared() <= sphere.radius * sphere.radius
        }
        (a, b) => {
            // Remaining combinations are box-box with at least one OBB.
            let (Some((ca, ha, ra)), Some((cb, hb, rb))) = (box_data(a), box_data(b)) else {
                unreachable!("sphere pairs are handled above");
            };
            boxes_intersect(&ca, &ha, &ra, &cb, &hb, &rb)
        }
    }
}

/// Overlap test that also reports an approximate contact point
///
/// Box-box pairs report the midpoint of the mutual closest points; pairs
/// involving a sphere report the point on the sphere surface toward the
/// other shape.
pub fn intersect_contact<const D: usize>(a: &Shape<D>, b: &Shape<D>) -> Option<Point<D>> {
    if !intersect(a, b) {
        return None;
    }
    Some(contact_point(a, b))
}

fn contact_point<const D: usize>(a: &Shape<D>, b: &Shape<D>) -> Point<D> {
    match (a, b) {
        (Shape::Sphere(sphere), other) | (other, Shape::Sphere(sphere)) => {
            let toward = other.closest_point(&sphere.center) - sphere.center;
            let dist = toward.norm();
            if dist > DEGENERATE_EPS {
                sphere.center + toward * (sphere.radius / dist)
            } else {
                sphere.center
            }
        }
        (a, b) => {
            let on_a = a.closest_point(&b.center());
            let on_b = b.closest_point(&a.center());
            (on_a + on_b) * 0.5
        }
    }
}

/// Casts a ray against a shape, returning the world-space hit point
///
/// Boxes use the slab method (an OBB transforms the ray into its local
/// frame first); spheres use the geometric quadratic. An origin inside the
/// shape hits immediately at the origin.
pub fn intersect_ray<const D: usize>(shape: &Shape<D>, ray: &Ray<D>) -> Option<Point<D>> {
    match shape {
        Shape::Aabb(aabb) => aabb.intersect_ray(ray).map(|t| ray.point_at(t)),
        Shape::Sphere(sphere) => sphere.intersect_ray(ray).map(|t| ray.point_at(t)),
        Shape::Obb(obb) => {
            let local_ray = Ray::new(
                obb.to_local(&ray.origin),
                obb.rotation.inverse() * ray.direction,
            );
            let local_box = Aabb::from_center_extents(Point::zeros(), obb.half_extents);
            // Rotation preserves the parameter, so t maps straight back.
            local_box.intersect_ray(&local_ray).map(|t| ray.point_at(t))
        }
    }
}
