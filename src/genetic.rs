//! Genetic operators for the CVRP solver: generation, crossover and mutation.

use crate::candidate::Candidate;
use crate::capacity::CapacityTracker;
use crate::config::Config;
use crate::construction::SeededCheapestInsertion;
use crate::local_search::LocalSearch;
use crate::objective::CvrpObjective;
use crate::problem::Problem;
use log::debug;
use rand::{Rng, RngCore};
use std::collections::HashSet;

/// Builds new candidates from scratch.
pub trait Generator: Send + Sync {
    fn name(&self) -> &str;

    fn generate(
        &self,
        problem: &Problem,
        objective: &CvrpObjective,
        rng: &mut dyn RngCore,
    ) -> Candidate;
}

/// Combines two parents into a new candidate.
pub trait CrossoverOperator: Send + Sync {
    fn name(&self) -> &str;

    fn crossover(
        &self,
        problem: &Problem,
        objective: &CvrpObjective,
        parent1: &Candidate,
        parent2: &Candidate,
        rng: &mut dyn RngCore,
    ) -> Candidate;
}

/// Modifies a candidate in place; returns true if its fitness improved.
pub trait MutationOperator: Send + Sync {
    fn name(&self) -> &str;

    fn mutate(
        &self,
        problem: &Problem,
        objective: &CvrpObjective,
        candidate: &mut Candidate,
        rng: &mut dyn RngCore,
    ) -> bool;
}

/// Builds a child from whole tours of a parent.
///
/// Tours are copied from the first parent, preferring the tour with the least
/// overlap with the visits already copied. What is left is placed with the
/// construction heuristic.
pub struct TourExchangeCrossover {
    pub placement: SeededCheapestInsertion,
    /// Improvement applied to the child, if any.
    pub post: Option<LocalSearch>,
    /// Take every other tour from the second parent.
    pub use_second_parent: bool,
}

impl TourExchangeCrossover {
    pub fn new(placement: SeededCheapestInsertion) -> Self {
        TourExchangeCrossover {
            placement,
            post: None,
            use_second_parent: false,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        TourExchangeCrossover::new(SeededCheapestInsertion::from_config(config))
            .with_post(LocalSearch::from_config(config))
            .with_second_parent(config.crossover_second_parent)
    }

    pub fn with_post(mut self, local_search: LocalSearch) -> Self {
        self.post = Some(local_search);
        self
    }

    pub fn with_second_parent(mut self, use_second_parent: bool) -> Self {
        self.use_second_parent = use_second_parent;
        self
    }

    /// Pick a tour of `source` and copy its unplaced visits into `target`.
    ///
    /// Returns false when no visit is left or no tour qualifies.
    fn select_and_copy_tour(
        &self,
        problem: &Problem,
        objective: &CvrpObjective,
        visits: &mut HashSet<usize>,
        source: &Candidate,
        target: &mut Candidate,
        rng: &mut dyn RngCore,
    ) -> bool {
        if visits.is_empty() || source.count() == 0 {
            return false;
        }

        let t = if target.count() == 0 {
            rng.gen_range(0..source.count())
        } else {
            let mut best: Option<(usize, usize)> = None;
            for (t, tour) in source.tours.iter().enumerate() {
                let mut overlap = 0;
                let mut has_unplaced = false;
                for v in tour.iter().filter(|&v| !problem.is_fixed(v)) {
                    if visits.contains(&v) {
                        has_unplaced = true;
                    } else {
                        overlap += 1;
                    }
                }

                if overlap > tour.count() / 4 || !has_unplaced {
                    continue;
                }
                if best.map_or(true, |(_, o)| overlap < o) {
                    best = Some((t, overlap));
                }
            }

            match best {
                Some((t, _)) => t,
                None => return false,
            }
        };

        let order: Vec<usize> = source
            .tour(t)
            .iter()
            .filter(|v| visits.contains(v))
            .collect();
        let (seed, rest) = match order.split_first() {
            Some((&seed, rest)) => (seed, rest),
            None => return false,
        };
        let (mut tour, mut content) = match objective.open_tour(problem, seed) {
            Some(opened) => opened,
            None => return false,
        };
        visits.remove(&seed);

        let mut previous = seed;
        for &v in rest {
            if !problem.capacity.can_add(&content, v) {
                continue;
            }
            tour.insert_after(previous, v);
            let updated = objective.content_of(problem, &tour);
            if problem.capacity.is_respected(&updated) {
                content = updated;
                previous = v;
                visits.remove(&v);
            } else {
                tour.remove(v);
            }
        }

        target.fitness += content.weight;
        target.add_tour(tour, content);
        true
    }
}

impl CrossoverOperator for TourExchangeCrossover {
    fn name(&self) -> &str {
        "CROSS_EX_TOURS"
    }

    fn crossover(
        &self,
        problem: &Problem,
        objective: &CvrpObjective,
        parent1: &Candidate,
        parent2: &Candidate,
        rng: &mut dyn RngCore,
    ) -> Candidate {
        let other = if self.use_second_parent {
            parent2
        } else {
            parent1
        };
        let mut child = objective.new_solution(problem);
        let mut visits: HashSet<usize> =
            objective.potential_visits(problem).into_iter().collect();

        let mut success = true;
        while success {
            success = false;
            success |= self.select_and_copy_tour(
                problem,
                objective,
                &mut visits,
                parent1,
                &mut child,
                rng,
            );
            success |= self.select_and_copy_tour(
                problem,
                objective,
                &mut visits,
                other,
                &mut child,
                rng,
            );
        }

        let copied = child.count();
        let mut remaining: Vec<usize> = visits.into_iter().collect();
        remaining.sort_unstable();
        self.placement
            .place(problem, objective, &mut child, &mut remaining, rng);

        if let Some(post) = &self.post {
            post.improve(problem, objective, &mut child);
            child.update_fitness();
        }

        debug!(
            "crossover copied {} tours, child has {} tours with fitness {:.2}",
            copied,
            child.count(),
            child.fitness
        );
        child
    }
}

/// Removes a few random tours and places their visits again.
pub struct RedoPlacement {
    pub placement: SeededCheapestInsertion,
    pub tour_remove_count: usize,
    /// Restore the candidate when the placement made it worse.
    pub revert_on_worse: bool,
}

impl RedoPlacement {
    pub fn new(placement: SeededCheapestInsertion, tour_remove_count: usize) -> Self {
        RedoPlacement {
            placement,
            tour_remove_count,
            revert_on_worse: false,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        RedoPlacement::new(
            SeededCheapestInsertion::from_config(config),
            config.tour_remove_count,
        )
        .with_revert_on_worse(config.revert_failed_mutation)
    }

    pub fn with_revert_on_worse(mut self, revert: bool) -> Self {
        self.revert_on_worse = revert;
        self
    }
}

impl MutationOperator for RedoPlacement {
    fn name(&self) -> &str {
        "REDO_SCI"
    }

    fn mutate(
        &self,
        problem: &Problem,
        objective: &CvrpObjective,
        candidate: &mut Candidate,
        rng: &mut dyn RngCore,
    ) -> bool {
        let before = candidate.fitness;
        let backup = if self.revert_on_worse {
            Some(candidate.clone())
        } else {
            None
        };

        let mut visits = std::mem::take(&mut candidate.unplaced);
        let target = candidate.count().saturating_sub(self.tour_remove_count);
        while candidate.count() > target {
            let t = rng.gen_range(0..candidate.count());
            let (tour, _) = candidate.remove_tour(t);
            visits.extend(tour.iter().filter(|&v| !problem.is_fixed(v)));
        }
        candidate.update_fitness();

        self.placement
            .place(problem, objective, candidate, &mut visits, rng);

        let improved = candidate.fitness < before;
        if let Some(backup) = backup {
            if candidate.fitness > before {
                *candidate = backup;
            }
        }

        debug!(
            "{} mutation: {:.2} -> {:.2}",
            self.name(),
            before,
            candidate.fitness
        );
        improved
    }
}
