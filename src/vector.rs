use nalgebra::SVector;

use crate::shared::Float;

/// Position, displacement and force vectors. Magnitude, scaling, addition,
/// subtraction and the dot product come from nalgebra; the traits below add
/// what it lacks or defines differently.
pub type Vector<F, const D: usize> = SVector<F, D>;

pub trait VectorExt {
    /// Direction of the vector. The zero vector maps to itself instead of NaN.
    fn unit(&self) -> Self;
}

impl<F: Float, const D: usize> VectorExt for SVector<F, D> {
    fn unit(&self) -> Self {
        let magnitude = self.norm();
        if magnitude == F::zero() {
            Self::zeros()
        } else {
            self.unscale(magnitude)
        }
    }
}

/// Cross product. In 3D this is the usual vector; in 2D it is the signed
/// area `x1 * y2 - x2 * y1`, i.e. the z component of the 3D product of the
/// two vectors embedded at z = 0.
pub trait Cross<Rhs = Self> {
    type Output;

    fn cross_product(&self, rhs: &Rhs) -> Self::Output;
}

impl<F: Float> Cross for SVector<F, 2> {
    type Output = F;

    fn cross_product(&self, rhs: &Self) -> F {
        self.x * rhs.y - rhs.x * self.y
    }
}

impl<F: Float> Cross for SVector<F, 3> {
    type Output = SVector<F, 3>;

    fn cross_product(&self, rhs: &Self) -> SVector<F, 3> {
        self.cross(rhs)
    }
}
