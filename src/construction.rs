//! Seeded cheapest insertion construction heuristic.

use crate::candidate::Candidate;
use crate::config::Config;
use crate::genetic::Generator;
use crate::local_search::LocalSearch;
use crate::objective::CvrpObjective;
use crate::problem::Problem;
use log::debug;
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Where remaining visits are placed after a new tour was seeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PlacementMode {
    /// Only the newest tour, filling tours one by one.
    LastTour,
    /// The cheapest place over all tours.
    AnyTour,
}

/// Builds tours by seeding a visit and greedily inserting the cheapest
/// remaining visits until capacity is reached.
#[derive(Debug, Clone)]
pub struct SeededCheapestInsertion {
    pub mode: PlacementMode,
    /// Fraction of the visits below which the remainder is spread over all tours.
    pub remaining_threshold: f64,
    /// Relative growth in tours between two improvement passes.
    pub improvements_threshold: f64,
    /// Inter-tour improvement applied while constructing, if any.
    pub local_search: Option<LocalSearch>,
}

impl SeededCheapestInsertion {
    pub fn new(mode: PlacementMode, remaining_threshold: f64, improvements_threshold: f64) -> Self {
        SeededCheapestInsertion {
            mode,
            remaining_threshold,
            improvements_threshold,
            local_search: None,
        }
    }

    /// The heuristic as configured, with inter-tour improvements enabled.
    pub fn from_config(config: &Config) -> Self {
        SeededCheapestInsertion::new(
            config.construction_mode,
            config.remaining_threshold,
            config.improvements_threshold,
        )
        .with_local_search(LocalSearch::from_config(config))
    }

    pub fn with_local_search(mut self, local_search: LocalSearch) -> Self {
        self.local_search = Some(local_search);
        self
    }

    /// Build a new candidate serving every potential visit.
    pub fn build(
        &self,
        problem: &Problem,
        objective: &CvrpObjective,
        rng: &mut dyn RngCore,
    ) -> Candidate {
        let mut candidate = objective.new_solution(problem);
        let mut visits = objective.potential_visits(problem);
        self.place(problem, objective, &mut candidate, &mut visits, rng);
        candidate
    }

    /// Place `visits` into the candidate.
    ///
    /// Existing tours are filled first, then new tours are seeded until no
    /// visit remains. Visits that cannot be served at all end up in
    /// [`Candidate::unplaced`].
    pub fn place(
        &self,
        problem: &Problem,
        objective: &CvrpObjective,
        candidate: &mut Candidate,
        visits: &mut Vec<usize>,
        rng: &mut dyn RngCore,
    ) {
        let total = visits.len().max(1) as f64;
        let mut improved_at = candidate.count();

        if candidate.count() > 0 {
            while objective.try_place_any(problem, candidate, visits) {}
        }

        while let Some(t) = objective.seed_next(problem, candidate, visits, rng) {
            match self.mode {
                PlacementMode::LastTour => {
                    while objective.try_place_any_in(problem, candidate, t, visits) {}
                }
                PlacementMode::AnyTour => {
                    while objective.try_place_any(problem, candidate, visits) {}
                }
            }

            if !visits.is_empty() && visits.len() as f64 <= self.remaining_threshold * total {
                while objective.try_place_any(problem, candidate, visits) {}
            }

            if let Some(local_search) = &self.local_search {
                let count = candidate.count();
                let grown = improved_at as f64 * (1.0 + self.improvements_threshold);
                if count > 1 && count as f64 >= grown {
                    local_search.improve(problem, objective, candidate);
                    improved_at = count;
                }
            }
        }

        candidate.update_fitness();
        debug!(
            "placed visits into {} tours, fitness {:.2}, {} unplaced",
            candidate.count(),
            candidate.fitness,
            candidate.unplaced.len()
        );
    }
}

impl Generator for SeededCheapestInsertion {
    fn name(&self) -> &str {
        "SCI"
    }

    fn generate(
        &self,
        problem: &Problem,
        objective: &CvrpObjective,
        rng: &mut dyn RngCore,
    ) -> Candidate {
        self.build(problem, objective, rng)
    }
}
