//! Inter-tour local search operators.

pub mod exchange;
pub mod multi_exchange;
pub mod multi_relocate;
pub mod relocate;

use crate::candidate::Candidate;
use crate::config::Config;
use crate::objective::CvrpObjective;
use crate::problem::Problem;
use itertools::Itertools;
use log::debug;

/// Improves a candidate by moving and exchanging visits between tours.
///
/// Holds no state between calls; a single instance can be shared by all
/// candidates and threads.
#[derive(Debug, Clone, Copy)]
pub struct LocalSearch {
    /// Largest sequence considered, boundaries included.
    pub max_seq_size: usize,
    /// Maximum number of rounds over all neighborhoods.
    pub max_rounds: usize,
}

impl LocalSearch {
    /// Create a new local search instance.
    pub fn new(max_seq_size: usize, max_rounds: usize) -> Self {
        LocalSearch {
            max_seq_size,
            max_rounds,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        LocalSearch::new(config.max_seq_size, config.max_local_search_rounds)
    }

    /// Run all neighborhoods until none improves or the round budget is spent.
    ///
    /// Returns true if the candidate improved.
    pub fn improve(
        &self,
        problem: &Problem,
        objective: &CvrpObjective,
        candidate: &mut Candidate,
    ) -> bool {
        let before = candidate.fitness;
        let mut improved = false;

        for _ in 0..self.max_rounds {
            let mut improvement = false;

            improvement |= self.relocate_neighborhood(problem, objective, candidate);
            improvement |= self.exchange_neighborhood(problem, objective, candidate);
            improvement |= self.multi_relocate_neighborhood(problem, objective, candidate);
            improvement |= self.multi_exchange_neighborhood(problem, objective, candidate);

            if !improvement {
                break;
            }
            improved = true;
        }

        if improved {
            debug!(
                "local search improved fitness {:.2} -> {:.2}",
                before, candidate.fitness
            );
        }
        improved
    }

    /// Ordered pairs of distinct tours worth an inter-tour scan.
    pub(crate) fn ordered_tour_pairs(
        &self,
        problem: &Problem,
        objective: &CvrpObjective,
        candidate: &Candidate,
    ) -> Vec<(usize, usize)> {
        let count = candidate.count();
        (0..count)
            .cartesian_product(0..count)
            .filter(|&(t1, t2)| t1 != t2)
            .filter(|&(t1, t2)| objective.have_to_try_inter(problem, candidate, t1, t2))
            .collect()
    }

    /// Unordered pairs of distinct tours worth an inter-tour scan.
    pub(crate) fn tour_pairs(
        &self,
        problem: &Problem,
        objective: &CvrpObjective,
        candidate: &Candidate,
    ) -> Vec<(usize, usize)> {
        (0..candidate.count())
            .tuple_combinations()
            .filter(|&(t1, t2)| objective.have_to_try_inter(problem, candidate, t1, t2))
            .collect()
    }
}

impl Default for LocalSearch {
    fn default() -> Self {
        LocalSearch::new(4, 100)
    }
}
