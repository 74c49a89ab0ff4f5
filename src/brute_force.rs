// Exact O(N) per query / O(N^2) total summation, the reference for the tree.

use nalgebra::SVector;
use rayon::prelude::*;

use crate::{
    force::ForceLaw,
    shared::{Float, Particle},
};

/// Sums `law` over every particle, skipping massless ones and any particle
/// located exactly at `query`.
pub fn direct_sum<F, const D: usize, P, L>(
    particles: &[P],
    query: &SVector<F, D>,
    law: &L,
) -> SVector<F, D>
where
    F: Float,
    P: Particle<F, D>,
    L: ForceLaw<F, D> + ?Sized,
{
    particles
        .iter()
        .filter(|p| p.mass() != F::zero() && p.position() != query)
        .fold(SVector::zeros(), |acc, p| {
            acc + law.force(p.mass(), &(query - p.position()))
        })
}

pub fn direct_sum_all<F, const D: usize, P, L>(particles: &[P], law: &L) -> Vec<SVector<F, D>>
where
    F: Float,
    P: Particle<F, D> + Sync,
    L: ForceLaw<F, D> + Sync + ?Sized,
{
    particles
        .par_iter()
        .map(|particle| direct_sum(particles, particle.position(), law))
        .collect()
}

/// Total mass and mass-weighted mean position, or `None` if the set carries no mass.
pub fn center_of_mass<F, const D: usize, P>(particles: &[P]) -> Option<(F, SVector<F, D>)>
where
    F: Float,
    P: Particle<F, D>,
{
    let (mass, weighted) = particles
        .iter()
        .fold((F::zero(), SVector::<F, D>::zeros()), |(m, w), p| {
            (m + p.mass(), w + p.position() * p.mass())
        });
    (mass > F::zero()).then(|| (mass, weighted / mass))
}
