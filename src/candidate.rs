//! Candidate solutions: tours with their contents.

use crate::capacity::Content;
use crate::tour::Tour;
use std::fmt;

/// A complete solution under evaluation.
///
/// Tours and contents are parallel vectors addressed by tour index. The
/// problem is not stored; operators receive it alongside the candidate.
#[derive(Clone)]
pub struct Candidate {
    pub tours: Vec<Tour>,
    pub contents: Vec<Content>,
    /// Sum of the tour weights, [`Candidate::INFINITE`] when infeasible.
    pub fitness: f64,
    /// Visits that cannot be served by a tour of their own.
    pub unplaced: Vec<usize>,
}

impl Candidate {
    /// Fitness of an infeasible candidate.
    pub const INFINITE: f64 = f64::MAX;

    /// Create a new, empty candidate.
    pub fn new() -> Self {
        Candidate {
            tours: Vec::new(),
            contents: Vec::new(),
            fitness: 0.0,
            unplaced: Vec::new(),
        }
    }

    /// Number of tours.
    pub fn count(&self) -> usize {
        self.tours.len()
    }

    pub fn tour(&self, t: usize) -> &Tour {
        &self.tours[t]
    }

    pub fn content(&self, t: usize) -> &Content {
        &self.contents[t]
    }

    /// Add a tour with its content and return its index.
    pub fn add_tour(&mut self, tour: Tour, content: Content) -> usize {
        self.tours.push(tour);
        self.contents.push(content);
        self.tours.len() - 1
    }

    /// Remove a tour, shifting the following tour indices down by one.
    pub fn remove_tour(&mut self, t: usize) -> (Tour, Content) {
        let tour = self.tours.remove(t);
        let content = self.contents.remove(t);
        (tour, content)
    }

    /// Recompute the fitness from the tour contents.
    pub fn update_fitness(&mut self) {
        self.fitness = if self.unplaced.is_empty() {
            self.contents.iter().map(|c| c.weight).sum()
        } else {
            Self::INFINITE
        };
    }

    /// Returns true if all visits are served.
    pub fn is_feasible(&self) -> bool {
        self.unplaced.is_empty() && self.fitness < Self::INFINITE
    }

    /// The visits of every tour, in tour order.
    pub fn tour_visits(&self) -> Vec<Vec<usize>> {
        self.tours.iter().map(|t| t.visits()).collect()
    }

    /// The index of the first tour containing the visit.
    ///
    /// A departure or arrival is shared by every tour, so it reports tour 0.
    pub fn find_tour(&self, visit: usize) -> Option<usize> {
        self.tours.iter().position(|t| t.contains(visit))
    }
}

impl Default for Candidate {
    fn default() -> Self {
        Candidate::new()
    }
}

impl fmt::Debug for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Candidate:")?;
        writeln!(f, "  Fitness: {:.2}", self.fitness)?;
        writeln!(f, "  Feasible: {}", self.is_feasible())?;
        writeln!(f, "  Tours: {}", self.tours.len())?;

        for (i, (tour, content)) in self.tours.iter().zip(&self.contents).enumerate() {
            writeln!(
                f,
                "  Tour {}: {:?} (Weight: {:.2}, Quantities: {:?})",
                i,
                tour.visits(),
                content.weight,
                content.quantities
            )?;
        }

        if !self.unplaced.is_empty() {
            writeln!(f, "  Unplaced: {:?}", self.unplaced)?;
        }

        Ok(())
    }
}
