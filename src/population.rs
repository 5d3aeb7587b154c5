//! Population management for the genetic algorithm.

use crate::candidate::Candidate;
use rand::{Rng, RngCore};

/// Picks a parent from the population.
pub trait SelectionOperator: Send + Sync {
    fn name(&self) -> &str;

    /// Index of the selected candidate, `None` for an empty population.
    ///
    /// `exclude` is never returned while another candidate exists.
    fn select(
        &self,
        population: &Population,
        exclude: Option<usize>,
        rng: &mut dyn RngCore,
    ) -> Option<usize>;
}

/// Tournament selection: the fittest of `size` random candidates wins.
#[derive(Debug, Clone, Copy)]
pub struct TournamentSelection {
    pub size: usize,
}

impl TournamentSelection {
    pub fn new(size: usize) -> Self {
        TournamentSelection { size: size.max(1) }
    }
}

impl SelectionOperator for TournamentSelection {
    fn name(&self) -> &str {
        "TOURNAMENT"
    }

    fn select(
        &self,
        population: &Population,
        exclude: Option<usize>,
        rng: &mut dyn RngCore,
    ) -> Option<usize> {
        let len = population.len();
        let pool = match exclude {
            Some(e) if e < len => len - 1,
            _ => len,
        };
        if pool == 0 {
            return None;
        }

        let mut best: Option<usize> = None;
        for _ in 0..self.size {
            // draw from the indices without the excluded one
            let mut i = rng.gen_range(0..pool);
            if let Some(e) = exclude {
                if i >= e {
                    i += 1;
                }
            }

            if best.map_or(true, |b| {
                population.candidates[i].fitness < population.candidates[b].fitness
            }) {
                best = Some(i);
            }
        }
        best
    }
}

/// A fixed-size population of candidates.
pub struct Population {
    pub candidates: Vec<Candidate>,
}

impl Population {
    /// Create a population from the initial candidates.
    pub fn new(candidates: Vec<Candidate>) -> Self {
        Population { candidates }
    }

    /// Get the population size.
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn get(&self, i: usize) -> &Candidate {
        &self.candidates[i]
    }

    /// Select two distinct parents.
    ///
    /// With a single candidate both parents are the same.
    pub fn select_parents(
        &self,
        selection: &dyn SelectionOperator,
        rng: &mut dyn RngCore,
    ) -> Option<(usize, usize)> {
        let parent1 = selection.select(self, None, rng)?;
        let parent2 = selection.select(self, Some(parent1), rng).unwrap_or(parent1);
        Some((parent1, parent2))
    }

    /// Index of the fittest candidate.
    pub fn best_index(&self) -> Option<usize> {
        self.candidates
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.fitness.total_cmp(&b.1.fitness))
            .map(|(i, _)| i)
    }

    /// Get the fittest candidate.
    pub fn best(&self) -> Option<&Candidate> {
        self.best_index().map(|i| &self.candidates[i])
    }

    /// Index of the least fit candidate.
    pub fn worst_index(&self) -> Option<usize> {
        self.candidates
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.fitness.total_cmp(&b.1.fitness))
            .map(|(i, _)| i)
    }

    /// Returns true if a candidate with the same tours is already present.
    pub fn contains_clone(&self, candidate: &Candidate) -> bool {
        let mut tours = candidate.tour_visits();
        tours.sort();
        self.candidates
            .iter()
            .filter(|c| c.count() == candidate.count())
            .filter(|c| (c.fitness - candidate.fitness).abs() < 1e-9)
            .any(|c| {
                let mut other = c.tour_visits();
                other.sort();
                other == tours
            })
    }

    /// Replace the worst candidate if `candidate` is fitter and not a clone.
    ///
    /// Returns true if the candidate entered the population.
    pub fn replace_worst(&mut self, candidate: Candidate) -> bool {
        let Some(worst) = self.worst_index() else {
            return false;
        };
        if candidate.fitness >= self.candidates[worst].fitness || self.contains_clone(&candidate) {
            return false;
        }
        self.candidates[worst] = candidate;
        true
    }
}
