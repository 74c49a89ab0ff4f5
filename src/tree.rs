use std::ops::Range;

use nalgebra::SVector;
use smallvec::SmallVec;

use crate::{
    error::{TreeError, describe},
    shared::{Bounds, Float, Particle, TreeSettings, is_finite},
};

/// Arena index of the root node.
pub const ROOT: usize = 0;

#[derive(Clone, Debug)]
pub struct Node<F: Float, const D: usize> {
    bounds: Bounds<F, D>,
    depth: usize,
    contents: SmallVec<[usize; 1]>,
    // first of 2^D contiguous children, in orthant order
    children: Option<usize>,
    mass: F,
    center_of_mass: SVector<F, D>,
}

impl<F: Float, const D: usize> Node<F, D> {
    fn new(bounds: Bounds<F, D>, depth: usize) -> Self {
        Self {
            center_of_mass: bounds.center,
            bounds,
            depth,
            contents: SmallVec::new(),
            children: None,
            mass: F::zero(),
        }
    }

    pub fn bounds(&self) -> &Bounds<F, D> {
        &self.bounds
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Indices of the particles held directly by this node. Always empty for
    /// internal nodes.
    pub fn contents(&self) -> &[usize] {
        &self.contents
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    /// Arena indices of the children; child `k` covers orthant `k` of this node.
    pub fn children(&self) -> Option<Range<usize>> {
        self.children.map(|first| first..first + (1 << D))
    }

    pub fn mass(&self) -> F {
        self.mass
    }

    /// `None` when the subtree carries no mass.
    pub fn center_of_mass(&self) -> Option<SVector<F, D>> {
        (self.mass > F::zero()).then_some(self.center_of_mass)
    }

    pub fn width(&self) -> F {
        self.bounds.width()
    }
}

/// Quadtree (`D = 2`) or octree (`D = 3`) over a borrowed particle slice.
///
/// Nodes live in a flat arena and refer to each other by index. Children are
/// always pushed after their parent, so iterating the arena backwards visits
/// every child before its parent. The tree is immutable once built; rebuild it
/// whenever the particles move.
#[derive(Clone, Debug)]
pub struct Tree<'a, F: Float, const D: usize, P: Particle<F, D>> {
    particles: &'a [P],
    nodes: Vec<Node<F, D>>,
    settings: TreeSettings,
}

impl<'a, F: Float, const D: usize, P: Particle<F, D>> Tree<'a, F, D, P> {
    /// Builds the tree over `particles` inside `bounds`.
    ///
    /// Every particle is validated before the first insertion, so an error
    /// never leaves a partial tree behind.
    pub fn build(
        particles: &'a [P],
        bounds: Bounds<F, D>,
        settings: &TreeSettings,
    ) -> Result<Self, TreeError> {
        if !bounds.is_valid() {
            return Err(TreeError::InvalidRegion {
                extents: describe(&bounds.extents),
            });
        }
        if settings.leaf_capacity == 0 {
            return Err(TreeError::InvalidCapacity);
        }
        for (index, particle) in particles.iter().enumerate() {
            let mass = particle.mass();
            if !is_finite(mass) || mass < F::zero() {
                return Err(TreeError::InvalidMass {
                    index,
                    mass: format!("{mass:?}"),
                });
            }
            if !bounds.contains(particle.position()) {
                return Err(TreeError::OutOfBounds {
                    index,
                    position: describe(particle.position()),
                });
            }
        }

        let mut tree = Self {
            particles,
            nodes: Vec::with_capacity(estimate_node_count(particles.len(), D)),
            settings: settings.clone(),
        };
        tree.nodes.push(Node::new(bounds, 0));

        for index in 0..particles.len() {
            tree.insert(ROOT, index);
        }
        tree.compute_aggregates();

        log::debug!(
            "built {}-d tree: {} particles, {} nodes, depth {}",
            D,
            particles.len(),
            tree.nodes.len(),
            tree.nodes.iter().map(Node::depth).max().unwrap_or(0),
        );
        Ok(tree)
    }

    fn insert(&mut self, mut node_idx: usize, index: usize) {
        let particles = self.particles;
        let position = particles[index].position();

        loop {
            let node = &self.nodes[node_idx];
            if let Some(first) = node.children {
                node_idx = first + node.bounds.get_orthant(position);
                continue;
            }

            let full = node.contents.len() >= self.settings.leaf_capacity;
            if !full || node.depth >= self.settings.max_depth {
                if full {
                    log::trace!(
                        "particle {index} shares a leaf at max depth {}",
                        node.depth
                    );
                }
                self.nodes[node_idx].contents.push(index);
                return;
            }

            self.subdivide(node_idx);
        }
    }

    /// Turns a full leaf into an internal node and pushes its particles down.
    fn subdivide(&mut self, node_idx: usize) {
        let first = self.nodes.len();
        let depth = self.nodes[node_idx].depth + 1;
        for orthant in 0..1 << D {
            let bounds = self.nodes[node_idx].bounds.create_orthant(orthant);
            self.nodes.push(Node::new(bounds, depth));
        }

        let node = &mut self.nodes[node_idx];
        node.children = Some(first);
        let held = std::mem::take(&mut node.contents);
        log::trace!("split node {node_idx} at depth {}", depth - 1);

        for index in held {
            self.insert(node_idx, index);
        }
    }

    fn compute_aggregates(&mut self) {
        for idx in (0..self.nodes.len()).rev() {
            let node = &self.nodes[idx];
            let (mass, weighted) = match node.children() {
                None => node
                    .contents
                    .iter()
                    .map(|&i| &self.particles[i])
                    .fold((F::zero(), SVector::<F, D>::zeros()), |(m, w), p| {
                        (m + p.mass(), w + p.position() * p.mass())
                    }),
                Some(children) => children
                    .map(|c| &self.nodes[c])
                    .filter(|child| child.mass > F::zero())
                    .fold((F::zero(), SVector::<F, D>::zeros()), |(m, w), child| {
                        (m + child.mass, w + child.center_of_mass * child.mass)
                    }),
            };

            let node = &mut self.nodes[idx];
            node.mass = mass;
            if mass > F::zero() {
                node.center_of_mass = weighted / mass;
            }
        }
    }

    pub fn root(&self) -> &Node<F, D> {
        &self.nodes[ROOT]
    }

    pub fn node(&self, idx: usize) -> &Node<F, D> {
        &self.nodes[idx]
    }

    pub fn nodes(&self) -> &[Node<F, D>] {
        &self.nodes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn particles(&self) -> &'a [P] {
        self.particles
    }

    pub fn settings(&self) -> &TreeSettings {
        &self.settings
    }

    /// Breadth-first walk yielding `(arena index, node)`.
    pub fn iter(&self) -> NodeIterator<'_, F, D> {
        NodeIterator {
            nodes: &self.nodes,
            current: vec![ROOT],
            next: Vec::new(),
            current_index: 0,
        }
    }

    pub fn leaves(&self) -> impl Iterator<Item = (usize, &Node<F, D>)> {
        self.iter().filter(|(_, node)| node.is_leaf())
    }

    pub fn stats(&self) -> TreeStats {
        let mut stats = TreeStats {
            nodes: self.nodes.len(),
            ..TreeStats::default()
        };
        for node in self.nodes.iter() {
            stats.max_depth = stats.max_depth.max(node.depth);
            if node.is_leaf() {
                stats.leaves += 1;
                if !node.contents.is_empty() {
                    stats.occupied_leaves += 1;
                }
                stats.largest_leaf = stats.largest_leaf.max(node.contents.len());
            }
        }
        stats
    }
}

impl<'t, 'a, F: Float, const D: usize, P: Particle<F, D>> IntoIterator for &'t Tree<'a, F, D, P> {
    type Item = (usize, &'t Node<F, D>);
    type IntoIter = NodeIterator<'t, F, D>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Convenience form of [`Tree::build`] with the default leaf capacity.
pub fn build_tree<F: Float, const D: usize, P: Particle<F, D>>(
    particles: &[P],
    center: SVector<F, D>,
    extents: SVector<F, D>,
    max_depth: usize,
) -> Result<Tree<'_, F, D, P>, TreeError> {
    Tree::build(
        particles,
        Bounds::new(center, extents),
        &TreeSettings::with_max_depth(max_depth),
    )
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TreeStats {
    pub nodes: usize,
    pub leaves: usize,
    pub occupied_leaves: usize,
    pub largest_leaf: usize,
    pub max_depth: usize,
}

pub struct NodeIterator<'t, F: Float, const D: usize> {
    nodes: &'t [Node<F, D>],
    current: Vec<usize>,
    next: Vec<usize>,
    current_index: usize,
}

impl<'t, F: Float, const D: usize> Iterator for NodeIterator<'t, F, D> {
    type Item = (usize, &'t Node<F, D>);

    fn next(&mut self) -> Option<Self::Item> {
        while self.current_index >= self.current.len() {
            if self.next.is_empty() {
                return None;
            }
            std::mem::swap(&mut self.current, &mut self.next);
            self.next.clear();
            self.current_index = 0;
        }

        let idx = self.current[self.current_index];
        let node = &self.nodes[idx];
        if let Some(children) = node.children() {
            self.next.extend(children);
        }
        self.current_index += 1;
        Some((idx, node))
    }
}

fn estimate_node_count(n: usize, dim: usize) -> usize {
    if n == 0 {
        return 1;
    }
    // each split adds 2^D nodes and a uniform cloud needs roughly n / 2 of them
    1 + n.div_ceil(2) * (1 << dim)
}
