use nalgebra::{SVector, SimdComplexField};

use crate::shared::Float;

/// Contribution of a source of mass `mass` seen from a query point, where
/// `displacement = query - source`.
///
/// Any `Fn(F, &SVector<F, D>) -> SVector<F, D>` is a force law. The
/// evaluators never call a law with a zero displacement.
pub trait ForceLaw<F: Float, const D: usize> {
    fn force(&self, mass: F, displacement: &SVector<F, D>) -> SVector<F, D>;
}

impl<F, const D: usize, T> ForceLaw<F, D> for T
where
    F: Float,
    T: Fn(F, &SVector<F, D>) -> SVector<F, D>,
{
    fn force(&self, mass: F, displacement: &SVector<F, D>) -> SVector<F, D> {
        self(mass, displacement)
    }
}

/// Softened Newtonian attraction: `-g * m * d / (|d|^2 + softening^2)^(3/2)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InverseSquare<F: Float> {
    pub g: F,
    pub softening: F,
}

impl<F: Float> InverseSquare<F> {
    pub fn new(g: F, softening: F) -> Self {
        Self { g, softening }
    }
}

impl<F: Float> Default for InverseSquare<F> {
    fn default() -> Self {
        Self::new(F::one(), F::zero())
    }
}

impl<F: Float, const D: usize> ForceLaw<F, D> for InverseSquare<F> {
    fn force(&self, mass: F, displacement: &SVector<F, D>) -> SVector<F, D> {
        let r2 = displacement.norm_squared() + self.softening * self.softening;
        let r_dist = SimdComplexField::simd_sqrt(r2);
        let r_cubed = r_dist * r_dist * r_dist;
        displacement * (-(self.g * mass) / r_cubed)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use nalgebra::{Vector2, Vector3};

    use super::*;

    #[test]
    fn inverse_square_points_at_the_source() {
        let law = InverseSquare::new(1.0, 0.0);
        let f = law.force(2.0, &Vector3::new(2.0, 0.0, 0.0));

        assert_relative_eq!(f, Vector3::new(-0.5, 0.0, 0.0));
    }

    #[test]
    fn inverse_square_falls_off_with_distance_squared() {
        let law = InverseSquare::<f64>::default();
        let near = law.force(1.0, &Vector2::new(1.0, 0.0)).norm();
        let far = law.force(1.0, &Vector2::new(2.0, 0.0)).norm();

        assert_relative_eq!(near / far, 4.0);
    }

    #[test]
    fn softening_bounds_close_encounters() {
        let law = InverseSquare::new(1.0, 0.1);
        let f = law.force(1.0, &Vector2::new(1e-9, 0.0));

        assert!(f.norm() < 1e-3);
    }

    #[test]
    fn closures_are_force_laws() {
        let constant = |m: f64, _d: &Vector2<f64>| Vector2::new(m, 0.0);

        assert_eq!(constant.force(3.0, &Vector2::new(1.0, 1.0)), Vector2::new(3.0, 0.0));
    }
}
