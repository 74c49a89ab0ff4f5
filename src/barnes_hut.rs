// Barnes-Hut evaluation over a built tree.

use nalgebra::SVector;
use rayon::prelude::*;

use crate::{
    force::ForceLaw,
    shared::{Float, Particle},
    tree::{ROOT, Tree},
};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Evaluation<F: Float, const D: usize> {
    pub force: SVector<F, D>,
    /// Number of force-law calls, exact and approximated together.
    pub interactions: usize,
}

/// Net contribution of every particle in `tree` at `query`.
///
/// An internal node whose `width / distance` falls below `theta` is replaced
/// by a point of its total mass at its center of mass. `theta = 0` never
/// approximates and reproduces direct summation. Nodes whose region contains
/// `query` are always opened, and particles located exactly at `query` are
/// skipped, so a particle never acts on itself.
pub fn evaluate<F, const D: usize, P, L>(
    tree: &Tree<'_, F, D, P>,
    query: &SVector<F, D>,
    theta: F,
    law: &L,
) -> SVector<F, D>
where
    F: Float,
    P: Particle<F, D>,
    L: ForceLaw<F, D> + ?Sized,
{
    evaluate_with_stats(tree, query, theta, law).force
}

pub fn evaluate_with_stats<F, const D: usize, P, L>(
    tree: &Tree<'_, F, D, P>,
    query: &SVector<F, D>,
    theta: F,
    law: &L,
) -> Evaluation<F, D>
where
    F: Float,
    P: Particle<F, D>,
    L: ForceLaw<F, D> + ?Sized,
{
    let mut evaluation = Evaluation {
        force: SVector::zeros(),
        interactions: 0,
    };
    accumulate(tree, query, theta, law, &mut evaluation);
    evaluation
}

fn accumulate<F, const D: usize, P, L>(
    tree: &Tree<'_, F, D, P>,
    query: &SVector<F, D>,
    theta: F,
    law: &L,
    out: &mut Evaluation<F, D>,
) where
    F: Float,
    P: Particle<F, D>,
    L: ForceLaw<F, D> + ?Sized,
{
    let particles = tree.particles();
    let mut stack = vec![ROOT];

    while let Some(node_idx) = stack.pop() {
        let node = tree.node(node_idx);
        let Some(center_of_mass) = node.center_of_mass() else {
            continue;
        };

        let Some(children) = node.children() else {
            for &index in node.contents() {
                let particle = &particles[index];
                let mass = particle.mass();
                if mass == F::zero() || particle.position() == query {
                    continue;
                }
                out.force += law.force(mass, &(query - particle.position()));
                out.interactions += 1;
            }
            continue;
        };

        // a node around the query may hold the query's own particle
        if !node.bounds().contains(query) {
            let r = query - center_of_mass;
            let distance = r.norm();
            if distance > F::zero() && node.width() / distance < theta {
                out.force += law.force(node.mass(), &r);
                out.interactions += 1;
                continue;
            }
        }
        stack.extend(children.rev());
    }
}

/// Evaluates at every particle of the tree, in parallel. Results follow
/// particle order.
pub fn evaluate_all<F, const D: usize, P, L>(
    tree: &Tree<'_, F, D, P>,
    theta: F,
    law: &L,
) -> Vec<SVector<F, D>>
where
    F: Float,
    P: Particle<F, D> + Sync,
    L: ForceLaw<F, D> + Sync + ?Sized,
{
    tree.particles()
        .par_iter()
        .map(|particle| evaluate(tree, particle.position(), theta, law))
        .collect()
}

/// Evaluates at arbitrary query points, in parallel.
pub fn evaluate_many<F, const D: usize, P, L>(
    tree: &Tree<'_, F, D, P>,
    queries: &[SVector<F, D>],
    theta: F,
    law: &L,
) -> Vec<SVector<F, D>>
where
    F: Float,
    P: Particle<F, D> + Sync,
    L: ForceLaw<F, D> + Sync + ?Sized,
{
    queries
        .par_iter()
        .map(|query| evaluate(tree, query, theta, law))
        .collect()
}
