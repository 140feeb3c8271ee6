//! Math utilities and types
//!
//! Provides the fundamental math types for collision detection and physics.
//! Everything is built on nalgebra's statically-sized vectors so the same
//! code serves 2D, 3D, and 4D worlds.

pub use nalgebra::{Rotation, Rotation2, Rotation3, SMatrix, SVector, Unit};

/// Coordinate vector in `D` dimensions
pub type Vector<const D: usize> = SVector<f32, D>;

/// Point in `D`-dimensional space (same representation as [`Vector`])
pub type Point<const D: usize> = SVector<f32, D>;

/// Rotation in `D` dimensions, stored as an orthonormal matrix
pub type Rot<const D: usize> = Rotation<f32, D>;

/// Square `D x D` matrix
pub type Matrix<const D: usize> = SMatrix<f32, D, D>;

/// 2D vector type
pub type Vec2 = SVector<f32, 2>;

/// 3D vector type
pub type Vec3 = SVector<f32, 3>;

/// 4D vector type
pub type Vec4 = SVector<f32, 4>;

/// Builds the antisymmetric spin matrix for a 2D angular velocity (rad/s).
pub fn spin2(omega: f32) -> Matrix<2> {
    SMatrix::<f32, 2, 2>::new(0.0, -omega, omega, 0.0)
}

/// Builds the antisymmetric spin matrix for a 3D angular velocity vector.
///
/// The vector's direction is the rotation axis and its magnitude the rate in
/// rad/s; the result is the usual cross-product matrix.
pub fn spin3(omega: Vec3) -> Matrix<3> {
    SMatrix::<f32, 3, 3>::new(
        0.0, -omega.z, omega.y,
        omega.z, 0.0, -omega.x,
        -omega.y, omega.x, 0.0,
    )
}

/// Re-orthonormalizes the columns of a matrix with one Gram-Schmidt pass.
///
/// Used after first-order integration of an orientation matrix, which drifts
/// away from orthonormality a little each step.
pub fn orthonormalize<const D: usize>(m: &mut Matrix<D>) {
    for i in 0..D {
        let mut col = m.column(i).clone_owned();
        for j in 0..i {
            let prev = m.column(j).clone_owned();
            col -= prev * prev.dot(&col);
        }
        let norm = col.norm();
        if norm > f32::EPSILON {
            col /= norm;
        }
        m.set_column(i, &col);
    }
}

/// Math utility functions
pub mod utils {
    /// Linear interpolation
    pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
        a + (b - a) * t
    }

    /// Rounds up to the next power of two, with a floor of 1.
    pub fn next_pow2(value: u32) -> u32 {
        value.max(1).next_power_of_two()
    }

    /// Rounds down to the previous power of two, with a floor of 1.
    pub fn prev_pow2(value: u32) -> u32 {
        let value = value.max(1);
        if value.is_power_of_two() {
            value
        } else {
            value.next_power_of_two() >> 1
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_spin3_matches_cross_product() {
        let omega = Vec3::new(0.3, -1.2, 2.0);
        let v = Vec3::new(1.0, 2.0, 3.0);
        let spun = spin3(omega) * v;
        let crossed = omega.cross(&v);
        assert_relative_eq!(spun.x, crossed.x, epsilon = 1e-6);
        assert_relative_eq!(spun.y, crossed.y, epsilon = 1e-6);
        assert_relative_eq!(spun.z, crossed.z, epsilon = 1e-6);
    }

    #[test]
    fn test_orthonormalize_restores_rotation() {
        let rot = Rotation3::from_axis_angle(&Vec3::z_axis(), 0.7);
        let mut drifted = rot.into_inner() * 1.001;
        orthonormalize(&mut drifted);
        for i in 0..3 {
            assert_relative_eq!(drifted.column(i).norm(), 1.0, epsilon = 1e-5);
        }
        let dot = drifted.column(0).dot(&drifted.column(1));
        assert_relative_eq!(dot, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_pow2_helpers() {
        assert_eq!(utils::next_pow2(0), 1);
        assert_eq!(utils::next_pow2(3), 4);
        assert_eq!(utils::prev_pow2(3), 2);
        assert_eq!(utils::prev_pow2(8), 8);
    }
}
