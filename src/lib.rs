//! # GA-CVRP
//!
//! A solver engine for the Capacitated Vehicle Routing Problem (CVRP).
//!
//! Candidates are built with a seeded cheapest insertion heuristic, improved
//! with inter-tour local search and evolved by a steady-state genetic
//! algorithm that exchanges whole tours between parents.
//!
//! The building blocks are usable on their own: [`tour::Tour`] is a compact
//! successor-linked tour, [`objective::CvrpObjective`] evaluates and applies
//! inter-tour moves and [`construction::SeededCheapestInsertion`] builds
//! candidates from scratch.

pub mod candidate;
pub mod capacity;
pub mod config;
pub mod construction;
pub mod error;
pub mod genetic;
pub mod local_search;
pub mod objective;
pub mod population;
pub mod problem;
pub mod tour;
pub mod utils;

pub use crate::candidate::Candidate;
pub use crate::config::Config;
pub use crate::error::SolverError;
pub use crate::problem::Problem;

use crate::construction::SeededCheapestInsertion;
use crate::genetic::{
    CrossoverOperator, Generator, MutationOperator, RedoPlacement, TourExchangeCrossover,
};
use crate::objective::strategies::{AlwaysOverlaps, RandomSeed};
use crate::objective::CvrpObjective;
use crate::population::{Population, SelectionOperator, TournamentSelection};
use crate::utils::SearchStatistics;

use log::{debug, info};
use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use std::time::{Duration, Instant};

/// The main solver structure that orchestrates the genetic search.
pub struct CvrpSolver {
    pub problem: Problem,
    pub config: Config,
    pub objective: CvrpObjective,
    pub generator: Box<dyn Generator>,
    pub crossover: Box<dyn CrossoverOperator>,
    pub mutation: Box<dyn MutationOperator>,
    pub selection: Box<dyn SelectionOperator>,
    pub population: Population,
    pub best: Option<Candidate>,
    pub run_time: Duration,
    pub generations: usize,
    pub generations_without_improvement: usize,
    pub improvements: usize,
    pub start_time: Instant,
    rng: ChaCha8Rng,
}

impl CvrpSolver {
    /// Create a solver with the default operators for the given problem.
    pub fn new(problem: Problem, config: Config) -> Self {
        let objective = CvrpObjective::new(
            Box::new(RandomSeed),
            Box::new(AlwaysOverlaps),
            config.localization_factor,
        );
        let generator = Box::new(SeededCheapestInsertion::from_config(&config));
        let crossover = Box::new(TourExchangeCrossover::from_config(&config));
        let mutation = Box::new(RedoPlacement::from_config(&config));
        let selection = Box::new(TournamentSelection::new(config.tournament_size));

        CvrpSolver::with_operators(
            problem, config, objective, generator, crossover, mutation, selection,
        )
    }

    /// Create a solver with explicitly chosen operators.
    pub fn with_operators(
        problem: Problem,
        config: Config,
        objective: CvrpObjective,
        generator: Box<dyn Generator>,
        crossover: Box<dyn CrossoverOperator>,
        mutation: Box<dyn MutationOperator>,
        selection: Box<dyn SelectionOperator>,
    ) -> Self {
        let rng = match config.seed {
            Some(seed) => ChaCha8Rng::seed_from_u64(seed),
            None => ChaCha8Rng::from_entropy(),
        };

        CvrpSolver {
            problem,
            config,
            objective,
            generator,
            crossover,
            mutation,
            selection,
            population: Population::new(Vec::new()),
            best: None,
            run_time: Duration::from_secs(0),
            generations: 0,
            generations_without_improvement: 0,
            improvements: 0,
            start_time: Instant::now(),
            rng,
        }
    }

    /// Build the initial population in parallel.
    ///
    /// Every candidate gets its own generator seeded from the master seed, so
    /// the result does not depend on the thread schedule.
    pub fn initialize(&mut self) {
        let size = self.config.population_size.max(1);
        let seeds: Vec<u64> = (0..size).map(|_| self.rng.next_u64()).collect();

        let problem = &self.problem;
        let objective = &self.objective;
        let generator = self.generator.as_ref();
        let candidates: Vec<Candidate> = seeds
            .into_par_iter()
            .map(|seed| {
                let mut rng = ChaCha8Rng::seed_from_u64(seed);
                generator.generate(problem, objective, &mut rng)
            })
            .collect();

        self.population = Population::new(candidates);
        self.best = self.population.best().cloned();

        if let Some(best) = &self.best {
            info!(
                "initial population of {} candidates, best fitness {:.2} with {} tours",
                self.population.len(),
                best.fitness,
                best.count()
            );
        }
    }

    /// Run the search until the termination criteria are met.
    ///
    /// Returns the best candidate found, or [`SolverError::Infeasible`] when
    /// even the best candidate leaves visits unserved.
    pub fn run(&mut self) -> Result<Candidate, SolverError> {
        self.start_time = Instant::now();
        info!(
            "solving {} ({} visits) with {}, {} and {}",
            self.problem.name,
            self.problem.len(),
            self.generator.name(),
            self.crossover.name(),
            self.mutation.name()
        );

        self.initialize();

        while !self.should_terminate() {
            self.generations += 1;
            if self.step() {
                self.generations_without_improvement = 0;
            } else {
                self.generations_without_improvement += 1;
            }
        }

        self.run_time = self.start_time.elapsed();

        let best = self.best.clone().unwrap_or_default();
        info!(
            "finished after {} generations in {:.2?}: fitness {:.2}, {} tours",
            self.generations,
            self.run_time,
            best.fitness,
            best.count()
        );

        if best.is_feasible() {
            Ok(best)
        } else {
            Err(SolverError::Infeasible {
                unplaced: best.unplaced,
            })
        }
    }

    /// Create the offspring of one generation; returns true on a new best.
    fn step(&mut self) -> bool {
        let mut improved = false;
        let probability = self.config.mutation_probability.clamp(0.0, 1.0);

        for _ in 0..self.config.offspring_per_generation.max(1) {
            let Some((parent1, parent2)) = self
                .population
                .select_parents(self.selection.as_ref(), &mut self.rng)
            else {
                return false;
            };

            let mut child = self.crossover.crossover(
                &self.problem,
                &self.objective,
                self.population.get(parent1),
                self.population.get(parent2),
                &mut self.rng,
            );

            if self.rng.gen_bool(probability) {
                self.mutation
                    .mutate(&self.problem, &self.objective, &mut child, &mut self.rng);
            }

            let is_best = self
                .best
                .as_ref()
                .map_or(true, |best| child.fitness < best.fitness);
            if is_best {
                info!(
                    "generation {}: new best fitness {:.2} with {} tours",
                    self.generations,
                    child.fitness,
                    child.count()
                );
                self.best = Some(child.clone());
                self.improvements += 1;
                improved = true;
            }

            if !self.population.replace_worst(child) {
                debug!("generation {}: offspring rejected", self.generations);
            }
        }

        improved
    }

    /// Check if the termination criteria are met.
    fn should_terminate(&self) -> bool {
        if self.generations >= self.config.max_generations {
            return true;
        }

        if self.generations_without_improvement >= self.config.stagnation_limit {
            return true;
        }

        if let Some(time_limit) = self.config.time_limit {
            if Instant::now().duration_since(self.start_time) >= time_limit {
                return true;
            }
        }

        false
    }

    /// Statistics about the last run.
    pub fn statistics(&self) -> SearchStatistics {
        let best = self.best.as_ref();
        SearchStatistics {
            generations: self.generations,
            runtime: self.run_time,
            best_fitness: best.map_or(Candidate::INFINITE, |b| b.fitness),
            best_is_feasible: best.map_or(false, |b| b.is_feasible()),
            best_tours: best.map_or(0, |b| b.count()),
            population_size: self.population.len(),
            improvements: self.improvements,
        }
    }
}
