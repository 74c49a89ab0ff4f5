// This file defines the scalar, particle and region types shared by the tree and the evaluators.

use nalgebra::{RealField, SVector};
use num_traits::NumCast;

use crate::force::InverseSquare;

/// Scalar type the tree is generic over. Implemented for `f32` and `f64`.
pub trait Float: RealField + Copy + NumCast {}

impl<T: RealField + Copy + NumCast> Float for T {}

pub(crate) fn is_finite<F: Float>(x: F) -> bool {
    num_traits::cast::<F, f64>(x).is_some_and(f64::is_finite)
}

pub trait Particle<F: Float, const D: usize> {
    fn position(&self) -> &SVector<F, D>;
    fn mass(&self) -> F;
}

#[derive(Clone, Debug, PartialEq)]
pub struct PointParticle<F: Float, const D: usize> {
    pub position: SVector<F, D>,
    pub mass: F,
}

impl<F: Float, const D: usize> PointParticle<F, D> {
    pub fn new(position: SVector<F, D>, mass: F) -> Self {
        Self { position, mass }
    }
}

impl<F: Float, const D: usize> Particle<F, D> for PointParticle<F, D> {
    fn position(&self) -> &SVector<F, D> {
        &self.position
    }

    fn mass(&self) -> F {
        self.mass
    }
}

pub trait AABB<F: Float, const D: usize> {
    fn min(&self) -> SVector<F, D>;
    fn max(&self) -> SVector<F, D>;
}

/// Axis-aligned box given by its center and full width along each axis.
///
/// The box is closed: points on any face are inside.
#[derive(Clone, Debug, PartialEq)]
pub struct Bounds<F: Float, const D: usize> {
    pub center: SVector<F, D>,
    pub extents: SVector<F, D>,
}

impl<F: Float, const D: usize> Bounds<F, D> {
    pub fn new(center: SVector<F, D>, extents: SVector<F, D>) -> Self {
        Self { center, extents }
    }

    pub fn cube(center: SVector<F, D>, width: F) -> Self {
        Self::new(center, SVector::repeat(width))
    }

    pub fn half_extents(&self) -> SVector<F, D> {
        self.extents * nalgebra::convert::<f64, F>(0.5)
    }

    /// Longest side of the box, used as the node size in the opening-angle test.
    pub fn width(&self) -> F {
        self.extents
            .iter()
            .fold(F::zero(), |width, &e| if e > width { e } else { width })
    }

    /// Every extent is finite and strictly positive.
    pub fn is_valid(&self) -> bool {
        self.extents
            .iter()
            .all(|&e| is_finite(e) && e > F::zero())
            && self.center.iter().all(|&c| is_finite(c))
    }

    pub fn contains(&self, point: &SVector<F, D>) -> bool {
        let (min, max) = (self.min(), self.max());
        (0..D).all(|i| point[i] >= min[i] && point[i] <= max[i])
    }

    /// Bit `i` of the result is set when `point[i] >= center[i]`, so points on a
    /// splitting plane always land on the greater-or-equal side.
    pub fn get_orthant(&self, point: &SVector<F, D>) -> usize {
        (0..D)
            .filter(|&i| point[i] >= self.center[i])
            .fold(0, |index, i| index | (1 << i))
    }

    pub fn create_orthant(&self, orthant: usize) -> Self {
        let quarter = self.extents * nalgebra::convert::<f64, F>(0.25);
        let center = SVector::<F, D>::from_fn(|i, _| {
            if orthant & (1 << i) != 0 {
                self.center[i] + quarter[i]
            } else {
                self.center[i] - quarter[i]
            }
        });
        Self::new(center, self.half_extents())
    }
}

impl<F: Float, const D: usize> AABB<F, D> for Bounds<F, D> {
    fn min(&self) -> SVector<F, D> {
        self.center - self.half_extents()
    }

    fn max(&self) -> SVector<F, D> {
        self.center + self.half_extents()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TreeSettings {
    /// Nodes at this depth never split; extra particles share the leaf.
    pub max_depth: usize,
    /// Particles a leaf holds before it splits.
    pub leaf_capacity: usize,
}

impl Default for TreeSettings {
    fn default() -> Self {
        Self {
            max_depth: 32,
            leaf_capacity: 1,
        }
    }
}

impl TreeSettings {
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            max_depth,
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct EvalSettings<F: Float> {
    pub theta: F,
    pub g: F,
    pub softening: F,
}

impl<F: Float> Default for EvalSettings<F> {
    fn default() -> Self {
        Self {
            theta: nalgebra::convert::<f64, F>(0.5),
            g: F::one(),
            softening: F::zero(),
        }
    }
}

impl<F: Float> EvalSettings<F> {
    pub fn law(&self) -> InverseSquare<F> {
        InverseSquare::new(self.g, self.softening)
    }
}

#[cfg(test)]
mod tests {
    use nalgebra::{Vector2, Vector3};

    use super::*;

    #[test]
    fn orthant_selection_covers_every_octant() {
        let bounds = Bounds::cube(Vector3::zeros(), 10.0);

        assert_eq!(bounds.get_orthant(&Vector3::new(-1.0, -1.0, -1.0)), 0);
        assert_eq!(bounds.get_orthant(&Vector3::new(1.0, -1.0, -1.0)), 1);
        assert_eq!(bounds.get_orthant(&Vector3::new(-1.0, 1.0, -1.0)), 2);
        assert_eq!(bounds.get_orthant(&Vector3::new(1.0, 1.0, -1.0)), 3);
        assert_eq!(bounds.get_orthant(&Vector3::new(-1.0, -1.0, 1.0)), 4);
        assert_eq!(bounds.get_orthant(&Vector3::new(1.0, -1.0, 1.0)), 5);
        assert_eq!(bounds.get_orthant(&Vector3::new(-1.0, 1.0, 1.0)), 6);
        assert_eq!(bounds.get_orthant(&Vector3::new(1.0, 1.0, 1.0)), 7);
    }

    #[test]
    fn points_on_splitting_planes_go_to_the_upper_side() {
        let bounds = Bounds::cube(Vector2::new(1.0, 1.0), 4.0);

        assert_eq!(bounds.get_orthant(&Vector2::new(1.0, 1.0)), 3);
        assert_eq!(bounds.get_orthant(&Vector2::new(1.0, 0.0)), 1);
        assert_eq!(bounds.get_orthant(&Vector2::new(0.0, 1.0)), 2);
    }

    #[test]
    fn orthant_boxes_halve_every_axis() {
        let bounds = Bounds::new(Vector3::zeros(), Vector3::new(10.0, 10.0, 10.0));

        let low = bounds.create_orthant(0);
        assert_eq!(low.center, Vector3::new(-2.5, -2.5, -2.5));
        assert_eq!(low.extents, Vector3::new(5.0, 5.0, 5.0));

        let mixed = bounds.create_orthant(5);
        assert_eq!(mixed.center, Vector3::new(2.5, -2.5, 2.5));

        let high = bounds.create_orthant(7);
        assert_eq!(high.center, Vector3::new(2.5, 2.5, 2.5));
    }

    #[test]
    fn anisotropic_boxes_keep_their_aspect() {
        let bounds = Bounds::new(Vector2::zeros(), Vector2::new(8.0, 2.0));
        let child = bounds.create_orthant(1);

        assert_eq!(child.center, Vector2::new(2.0, -0.5));
        assert_eq!(child.extents, Vector2::new(4.0, 1.0));
        assert_eq!(bounds.width(), 8.0);
    }

    #[test]
    fn contains_is_closed() {
        let bounds = Bounds::cube(Vector2::zeros(), 4.0);

        assert!(bounds.contains(&Vector2::new(2.0, -2.0)));
        assert!(bounds.contains(&Vector2::zeros()));
        assert!(!bounds.contains(&Vector2::new(2.0 + 1e-9, 0.0)));
        assert!(!bounds.contains(&Vector2::new(f64::NAN, 0.0)));
    }

    #[test]
    fn degenerate_boxes_are_invalid() {
        assert!(Bounds::cube(Vector2::zeros(), 1.0).is_valid());
        assert!(!Bounds::new(Vector2::zeros(), Vector2::new(1.0, 0.0)).is_valid());
        assert!(!Bounds::new(Vector2::zeros(), Vector2::new(-1.0, 1.0)).is_valid());
        assert!(!Bounds::cube(Vector2::zeros(), f64::INFINITY).is_valid());
        assert!(!Bounds::cube(Vector2::new(f64::NAN, 0.0), 1.0).is_valid());
    }
}
