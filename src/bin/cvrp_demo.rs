//! Solve a CVRP instance and print the result as JSON.
//!
//! Without `--problem` a random Euclidean instance with a depot at visit 0
//! is generated.

use clap::Parser;
use ga_cvrp::capacity::{metrics, Capacity, CapacityConstraint};
use ga_cvrp::utils::{format_duration, save_candidate};
use ga_cvrp::{Config, CvrpSolver, Problem, SolverError};
use log::{info, warn};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    /// A problem in JSON format, replaces the random instance
    #[arg(short, long)]
    problem: Option<PathBuf>,

    /// Number of visits of the random instance, depot included
    #[arg(short, long, default_value_t = 50)]
    visits: usize,

    /// Maximum travel cost of a single tour
    #[arg(short, long, default_value_t = 400.0)]
    capacity: f64,

    /// Maximum demand served by a single tour
    #[arg(short, long, default_value_t = 50.0)]
    load: f64,

    /// Seed for the instance and the solver
    #[arg(short, long)]
    seed: Option<u64>,

    /// Time limit in seconds
    #[arg(short, long)]
    time_limit: Option<u64>,

    /// Maximum number of generations
    #[arg(short, long, default_value_t = 1000)]
    generations: usize,

    /// Write a plain-text listing of the solution to this file
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Serialize)]
struct Report {
    name: String,
    fitness: Option<f64>,
    feasible: bool,
    tours: Vec<Vec<usize>>,
    unplaced: Vec<usize>,
    generations: usize,
    runtime: String,
}

fn random_problem(
    visits: usize,
    capacity: f64,
    load: f64,
    seed: u64,
) -> Result<Problem, SolverError> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let n = visits.max(2);

    let points: Vec<(f64, f64)> = (0..n)
        .map(|_| (rng.gen_range(0.0..100.0), rng.gen_range(0.0..100.0)))
        .collect();
    let demands: Vec<f64> = (0..n)
        .map(|v| if v == 0 { 0.0 } else { rng.gen_range(1..=10) as f64 })
        .collect();

    let capacity = Capacity::new(metrics::DISTANCE, capacity)
        .with_constraint(CapacityConstraint::new(metrics::WEIGHT, load, demands));
    let euclidean =
        Problem::from_points(format!("random-{}-{}", n, seed), &points, None, capacity)?;

    Problem::new(
        euclidean.name,
        euclidean.weights,
        None,
        euclidean.capacity,
        Some(0),
        Some(0),
    )
}

fn load_problem(path: &PathBuf) -> Result<Problem, Box<dyn std::error::Error>> {
    let text = fs::read_to_string(path)?;
    let parsed: Problem = serde_json::from_str(&text)?;
    let problem = Problem::new(
        parsed.name,
        parsed.weights,
        parsed.visit_costs,
        parsed.capacity,
        parsed.departure,
        parsed.arrival,
    )?;
    Ok(problem)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    let seed = cli.seed.unwrap_or_else(rand::random);
    let problem = match &cli.problem {
        Some(path) => load_problem(path)?,
        None => random_problem(cli.visits, cli.capacity, cli.load, seed)?,
    };
    info!("loaded problem {} with {} visits", problem.name, problem.len());

    let mut config = Config::new()
        .with_seed(seed)
        .with_max_generations(cli.generations);
    if let Some(secs) = cli.time_limit {
        config = config.with_time_limit(Duration::from_secs(secs));
    }

    let mut solver = CvrpSolver::new(problem.clone(), config);
    let result = solver.run();
    let statistics = solver.statistics();
    info!("{}", statistics.format());

    let best = match result {
        Ok(best) => best,
        Err(SolverError::Infeasible { unplaced }) => {
            warn!("{} visits cannot be served: {:?}", unplaced.len(), unplaced);
            solver.best.clone().unwrap_or_default()
        }
        Err(e) => return Err(e.into()),
    };

    if let Some(path) = &cli.output {
        save_candidate(&best, &problem, path)?;
    }

    let report = Report {
        name: problem.name.clone(),
        fitness: best.is_feasible().then_some(best.fitness),
        feasible: best.is_feasible(),
        tours: best.tour_visits(),
        unplaced: best.unplaced.clone(),
        generations: statistics.generations,
        runtime: format_duration(statistics.runtime),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(())
}
