//! Pluggable strategies used by the objective: seed selection, localization
//! bias and the inter-tour overlap filter.

use crate::candidate::Candidate;
use crate::problem::Problem;
use crate::tour::Tour;
use rand::seq::SliceRandom;
use rand::RngCore;

/// The seed recorded when the tour was opened.
///
/// A tour built by hand around a fixed departure has no seed of its own; the
/// visit after the departure stands in for it.
pub fn tour_seed(problem: &Problem, tour: &Tour) -> usize {
    match problem.departure {
        Some(departure) if tour.seed() == departure => {
            tour.next(departure).unwrap_or(departure)
        }
        _ => tour.seed(),
    }
}

/// Chooses the visit used to start a new tour.
pub trait SeedSelector: Send + Sync {
    fn name(&self) -> &str;

    /// Pick one of `visits`, `None` when there is nothing to pick.
    fn select(
        &self,
        problem: &Problem,
        candidate: &Candidate,
        visits: &[usize],
        rng: &mut dyn RngCore,
    ) -> Option<usize>;
}

/// Picks a random remaining visit.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomSeed;

impl SeedSelector for RandomSeed {
    fn name(&self) -> &str {
        "RANDOM"
    }

    fn select(
        &self,
        _problem: &Problem,
        _candidate: &Candidate,
        visits: &[usize],
        rng: &mut dyn RngCore,
    ) -> Option<usize> {
        visits.choose(rng).copied()
    }
}

/// Picks the visit farthest away from the seeds of the existing tours.
///
/// Falls back to a random visit while there are no tours.
#[derive(Debug, Clone, Copy, Default)]
pub struct FarthestSeed;

impl SeedSelector for FarthestSeed {
    fn name(&self) -> &str {
        "FARTHEST"
    }

    fn select(
        &self,
        problem: &Problem,
        candidate: &Candidate,
        visits: &[usize],
        rng: &mut dyn RngCore,
    ) -> Option<usize> {
        if candidate.count() == 0 {
            return RandomSeed.select(problem, candidate, visits, rng);
        }

        let seeds: Vec<usize> = candidate
            .tours
            .iter()
            .map(|t| tour_seed(problem, t))
            .collect();

        visits
            .iter()
            .map(|&v| {
                let closest = seeds
                    .iter()
                    .map(|&s| problem.weight(s, v) + problem.weight(v, s))
                    .fold(f64::INFINITY, f64::min);
                (v, closest)
            })
            .max_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(v, _)| v)
    }
}

/// An artificial extra cost steering construction toward compact tours.
pub trait LocalizationCost: Send + Sync {
    fn cost(&self, problem: &Problem, seed: usize, visit: usize) -> f64;
}

/// Round-trip cost between the seed and the visit, scaled by a factor.
#[derive(Debug, Clone, Copy)]
pub struct SeedDistance {
    pub factor: f64,
}

impl LocalizationCost for SeedDistance {
    fn cost(&self, problem: &Problem, seed: usize, visit: usize) -> f64 {
        (problem.weight(seed, visit) + problem.weight(visit, seed)) * self.factor
    }
}

/// Decides whether two tours are close enough for inter-tour moves to pay off.
pub trait OverlapPredicate: Send + Sync {
    fn overlaps(&self, problem: &Problem, tour1: &Tour, tour2: &Tour) -> bool;
}

/// Every pair of tours is worth trying.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysOverlaps;

impl OverlapPredicate for AlwaysOverlaps {
    fn overlaps(&self, _problem: &Problem, _tour1: &Tour, _tour2: &Tour) -> bool {
        true
    }
}

/// Two tours overlap when a visit of the first has one of its `k` nearest
/// neighbours in the second.
#[derive(Debug, Clone)]
pub struct NearestNeighbourOverlap {
    neighbours: Vec<Vec<usize>>,
}

impl NearestNeighbourOverlap {
    /// Precompute the `k` nearest neighbours of every visit.
    pub fn new(problem: &Problem, k: usize) -> Self {
        let neighbours = (0..problem.len())
            .map(|v| problem.nearest_neighbours(v, k))
            .collect();
        NearestNeighbourOverlap { neighbours }
    }
}

impl OverlapPredicate for NearestNeighbourOverlap {
    fn overlaps(&self, problem: &Problem, tour1: &Tour, tour2: &Tour) -> bool {
        tour1
            .iter()
            .filter(|&v| !problem.is_fixed(v))
            .any(|v| self.neighbours[v].iter().any(|&u| tour2.contains(u)))
    }
}
