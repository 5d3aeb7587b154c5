//! Configuration parameters for the genetic CVRP solver.

use crate::construction::PlacementMode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration settings for the solver and its operators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Number of candidates in the population
    pub population_size: usize,
    /// Maximum number of generations
    pub max_generations: usize,
    /// Number of generations without a new best before stopping
    pub stagnation_limit: usize,
    /// Optional time limit for the search
    pub time_limit: Option<Duration>,
    /// Offspring created per generation
    pub offspring_per_generation: usize,
    /// Number of candidates competing in a tournament
    pub tournament_size: usize,
    /// Probability to mutate an offspring
    pub mutation_probability: f64,
    /// Placement mode of the construction heuristic
    pub construction_mode: PlacementMode,
    /// Fraction of visits below which the remainder is spread over all tours
    pub remaining_threshold: f64,
    /// Relative tour growth between two improvement passes
    pub improvements_threshold: f64,
    /// Weight of the distance to the tour seed when inserting
    pub localization_factor: f64,
    /// Number of tours removed by the placement mutation
    pub tour_remove_count: usize,
    /// Restore a candidate when its mutation did not improve it
    pub revert_failed_mutation: bool,
    /// Let the crossover take tours from both parents instead of the first only
    pub crossover_second_parent: bool,
    /// Largest sequence considered by sequence moves, boundaries included
    pub max_seq_size: usize,
    /// Maximum rounds of the local search
    pub max_local_search_rounds: usize,
    /// Master seed, entropy when unset
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            population_size: 30,
            max_generations: 1000,
            stagnation_limit: 200,
            time_limit: None,
            offspring_per_generation: 1,
            tournament_size: 3,
            mutation_probability: 0.5,
            construction_mode: PlacementMode::LastTour,
            remaining_threshold: 0.03,
            improvements_threshold: 0.25,
            localization_factor: 0.5,
            tour_remove_count: 2,
            revert_failed_mutation: false,
            crossover_second_parent: false,
            max_seq_size: 4,
            max_local_search_rounds: 100,
            seed: None,
        }
    }
}

impl Config {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Config::default()
    }

    /// Set the population size.
    pub fn with_population_size(mut self, size: usize) -> Self {
        self.population_size = size;
        self
    }

    /// Set the maximum number of generations.
    pub fn with_max_generations(mut self, generations: usize) -> Self {
        self.max_generations = generations;
        self
    }

    /// Set the number of generations without improvement before stopping.
    pub fn with_stagnation_limit(mut self, generations: usize) -> Self {
        self.stagnation_limit = generations;
        self
    }

    /// Set the time limit.
    pub fn with_time_limit(mut self, duration: Duration) -> Self {
        self.time_limit = Some(duration);
        self
    }

    pub fn with_offspring_per_generation(mut self, offspring: usize) -> Self {
        self.offspring_per_generation = offspring;
        self
    }

    /// Set the tournament size.
    pub fn with_tournament_size(mut self, size: usize) -> Self {
        self.tournament_size = size;
        self
    }

    pub fn with_mutation_probability(mut self, probability: f64) -> Self {
        self.mutation_probability = probability;
        self
    }

    /// Set the placement mode of the construction heuristic.
    pub fn with_construction_mode(mut self, mode: PlacementMode) -> Self {
        self.construction_mode = mode;
        self
    }

    pub fn with_remaining_threshold(mut self, threshold: f64) -> Self {
        self.remaining_threshold = threshold;
        self
    }

    pub fn with_improvements_threshold(mut self, threshold: f64) -> Self {
        self.improvements_threshold = threshold;
        self
    }

    /// Set the localization factor, zero disables it.
    pub fn with_localization_factor(mut self, factor: f64) -> Self {
        self.localization_factor = factor;
        self
    }

    pub fn with_tour_remove_count(mut self, count: usize) -> Self {
        self.tour_remove_count = count;
        self
    }

    pub fn with_revert_failed_mutation(mut self, revert: bool) -> Self {
        self.revert_failed_mutation = revert;
        self
    }

    pub fn with_crossover_second_parent(mut self, enabled: bool) -> Self {
        self.crossover_second_parent = enabled;
        self
    }

    /// Set the largest sequence size.
    pub fn with_max_seq_size(mut self, size: usize) -> Self {
        self.max_seq_size = size;
        self
    }

    pub fn with_max_local_search_rounds(mut self, rounds: usize) -> Self {
        self.max_local_search_rounds = rounds;
        self
    }

    /// Set the master seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}
