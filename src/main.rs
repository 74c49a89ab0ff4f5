use clap::Parser;
use nalgebra::SVector;
use orthtree::{
    Bounds, EvalSettings, PointParticle, Tree, TreeError, TreeSettings, direct_sum_all,
    evaluate_all,
};
use rand::{Rng, SeedableRng, rngs::StdRng};
use web_time::Instant;

/// Builds a Barnes-Hut tree over a random cloud and compares it with direct summation.
#[derive(Parser, Debug)]
struct Args {
    /// Number of particles
    #[arg(short = 'n', long, default_value_t = 2000)]
    particles: usize,

    /// Spatial dimension (2 or 3)
    #[arg(short, long, default_value_t = 3, value_parser = clap::value_parser!(u8).range(2..=3))]
    dim: u8,

    /// Opening angle
    #[arg(short, long, default_value_t = 0.5)]
    theta: f64,

    #[arg(long, default_value_t = TreeSettings::default().max_depth)]
    max_depth: usize,

    #[arg(long, default_value_t = TreeSettings::default().leaf_capacity)]
    leaf_capacity: usize,

    #[arg(long, default_value_t = 0.01)]
    softening: f64,

    #[arg(long, default_value_t = 42)]
    seed: u64,
}

fn init_logger() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}

fn random_cloud<const D: usize>(n: usize, seed: u64) -> Vec<PointParticle<f64, D>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|_| {
            let position = SVector::<f64, D>::from_fn(|_, _| rng.random_range(-0.5..0.5));
            PointParticle::new(position, rng.random_range(0.5..1.5))
        })
        .collect()
}

fn run<const D: usize>(args: &Args) -> Result<(), TreeError> {
    let particles = random_cloud::<D>(args.particles, args.seed);
    let settings = TreeSettings {
        max_depth: args.max_depth,
        leaf_capacity: args.leaf_capacity,
    };
    let eval = EvalSettings {
        theta: args.theta,
        g: 1.0,
        softening: args.softening,
    };
    let law = eval.law();

    let start = Instant::now();
    let tree = Tree::build(&particles, Bounds::cube(SVector::zeros(), 1.0), &settings)?;
    let build_time = start.elapsed();

    let stats = tree.stats();
    log::info!(
        "tree: {} nodes, {} leaves ({} occupied), depth {}, built in {:?}",
        stats.nodes,
        stats.leaves,
        stats.occupied_leaves,
        stats.max_depth,
        build_time
    );

    let start = Instant::now();
    let approx = evaluate_all(&tree, eval.theta, &law);
    let bh_time = start.elapsed();

    let start = Instant::now();
    let exact = direct_sum_all(&particles, &law);
    let direct_time = start.elapsed();

    let (num, den) = approx
        .iter()
        .zip(&exact)
        .fold((0.0, 0.0), |(num, den), (a, e)| {
            (num + (a - e).norm_squared(), den + e.norm_squared())
        });
    let error = if den > 0.0 { (num / den).sqrt() } else { 0.0 };

    log::info!(
        "N = {}, D = {}, theta = {}: barnes-hut {:?}, direct {:?}, relative rms error {:.3e}",
        particles.len(),
        D,
        eval.theta,
        bh_time,
        direct_time,
        error
    );
    Ok(())
}

fn main() -> Result<(), TreeError> {
    init_logger();
    let args = Args::parse();

    match args.dim {
        2 => run::<2>(&args),
        _ => run::<3>(&args),
    }
}
