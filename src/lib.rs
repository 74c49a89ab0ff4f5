pub mod barnes_hut;
pub mod brute_force;
pub mod error;
pub mod force;
pub mod shared;
pub mod tree;
pub mod vector;

pub use barnes_hut::{Evaluation, evaluate, evaluate_all, evaluate_many, evaluate_with_stats};
pub use brute_force::{center_of_mass, direct_sum, direct_sum_all};
pub use error::TreeError;
pub use force::{ForceLaw, InverseSquare};
pub use shared::{AABB, Bounds, EvalSettings, Float, Particle, PointParticle, TreeSettings};
pub use tree::{Node, NodeIterator, Tree, TreeStats, build_tree};
pub use vector::{Cross, Vector, VectorExt};
