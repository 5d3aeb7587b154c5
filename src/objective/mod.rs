//! The CVRP objective: cost calculation, move evaluation and the placement
//! steps used by the construction heuristic.

pub mod moves;
pub mod strategies;

use crate::candidate::Candidate;
use crate::capacity::{CapacityTracker, Content};
use crate::error::SolverError;
use crate::problem::Problem;
use crate::tour::{Insertion, Pair, Tour, TourEnd, Triple};
use log::trace;
use rand::RngCore;

use self::moves::{Exchange, Relocate, SeqExchange, SeqRelocate};
use self::strategies::{
    tour_seed, AlwaysOverlaps, LocalizationCost, OverlapPredicate, RandomSeed, SeedDistance,
    SeedSelector,
};

/// A contiguous run of visits of a tour.
///
/// The first and last visits are the boundaries that stay in place; the
/// visits in between are the ones being moved or exchanged.
#[derive(Debug, Clone, PartialEq)]
pub struct Seq {
    pub visits: Vec<usize>,
    /// Travel and visit costs strictly inside the boundaries.
    pub between: f64,
    /// `between` for the sequence as it currently appears in its tour.
    pub between_original: f64,
}

impl Seq {
    /// Build a sequence and compute its interior cost.
    pub fn new(problem: &Problem, visits: Vec<usize>) -> Self {
        let between = if visits.len() < 3 {
            0.0
        } else {
            let inner = &visits[1..visits.len() - 1];
            let travel: f64 = inner.windows(2).map(|w| problem.weight(w[0], w[1])).sum();
            let visit_costs: f64 = inner.iter().map(|&v| problem.visit_cost(v)).sum();
            travel + visit_costs
        };

        Seq {
            visits,
            between,
            between_original: between,
        }
    }

    pub fn len(&self) -> usize {
        self.visits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visits.is_empty()
    }

    pub fn first(&self) -> usize {
        self.visits[0]
    }

    pub fn last(&self) -> usize {
        self.visits[self.visits.len() - 1]
    }

    /// The visits between the boundaries.
    pub fn interior(&self) -> &[usize] {
        &self.visits[1..self.visits.len() - 1]
    }

    fn interior_first(&self) -> usize {
        self.visits[1]
    }

    fn interior_last(&self) -> usize {
        self.visits[self.visits.len() - 2]
    }
}

/// Lazy iterator over the sequences of a tour, shortest first.
pub struct Sequences<'a> {
    problem: &'a Problem,
    visits: Vec<usize>,
    size: usize,
    max_size: usize,
    start: usize,
}

impl Iterator for Sequences<'_> {
    type Item = Seq;

    fn next(&mut self) -> Option<Seq> {
        while self.size <= self.max_size && self.size <= self.visits.len() {
            if self.start + self.size <= self.visits.len() {
                let window = self.visits[self.start..self.start + self.size].to_vec();
                self.start += 1;
                return Some(Seq::new(self.problem, window));
            }
            self.size += 1;
            self.start = 0;
        }
        None
    }
}

/// The objective of a CVRP: minimize the total weight of all tours.
pub struct CvrpObjective {
    seed_selector: Box<dyn SeedSelector>,
    overlaps: Box<dyn OverlapPredicate>,
    localization: Option<Box<dyn LocalizationCost>>,
}

impl CvrpObjective {
    /// Create an objective; a zero `localization_factor` disables the seed bias.
    pub fn new(
        seed_selector: Box<dyn SeedSelector>,
        overlaps: Box<dyn OverlapPredicate>,
        localization_factor: f64,
    ) -> Self {
        let localization: Option<Box<dyn LocalizationCost>> = if localization_factor != 0.0 {
            Some(Box::new(SeedDistance {
                factor: localization_factor,
            }))
        } else {
            None
        };

        CvrpObjective {
            seed_selector,
            overlaps,
            localization,
        }
    }

    /// Create an objective with a custom localization cost.
    pub fn with_localization(
        seed_selector: Box<dyn SeedSelector>,
        overlaps: Box<dyn OverlapPredicate>,
        localization: Option<Box<dyn LocalizationCost>>,
    ) -> Self {
        CvrpObjective {
            seed_selector,
            overlaps,
            localization,
        }
    }

    pub fn name(&self) -> String {
        format!("CVRP_{}", self.seed_selector.name())
    }

    /// Calculate the weight of a tour from scratch.
    pub fn calculate_tour(&self, problem: &Problem, tour: &Tour) -> f64 {
        let visits: f64 = tour.iter().map(|v| problem.visit_cost(v)).sum();
        let travel: f64 = tour.pairs().map(|p| problem.weight(p.from, p.to)).sum();
        visits + travel
    }

    /// Calculate the total weight of all tours from scratch.
    pub fn calculate(&self, problem: &Problem, candidate: &Candidate) -> f64 {
        candidate
            .tours
            .iter()
            .map(|t| self.calculate_tour(problem, t))
            .sum()
    }

    /// Build the content of a tour from scratch.
    pub fn content_of(&self, problem: &Problem, tour: &Tour) -> Content {
        let mut content = problem.capacity.empty();
        problem.capacity.update_costs(&mut content, tour.iter());
        content.weight = self.calculate_tour(problem, tour);
        content
    }

    /// Recompute every content and the fitness of the candidate.
    pub fn update_content(&self, problem: &Problem, candidate: &mut Candidate) {
        candidate.contents = candidate
            .tours
            .iter()
            .map(|t| self.content_of(problem, t))
            .collect();
        candidate.update_fitness();
    }

    /// Try to move the middle of `visit` from `t1` to the cheapest place in `t2`.
    ///
    /// Returns the fitness improvement if the move was applied.
    pub fn try_move(
        &self,
        problem: &Problem,
        candidate: &mut Candidate,
        t1: usize,
        t2: usize,
        visit: Triple,
    ) -> Option<f64> {
        let relocate = Relocate::evaluate(problem, candidate, t1, t2, visit)?;
        if !relocate.is_improving() || !relocate.is_feasible(problem, candidate) {
            return None;
        }

        relocate.apply(problem, candidate);
        trace!(
            "relocated {} from tour {} to tour {}: -{:.2}",
            visit.along,
            t1,
            t2,
            relocate.delta
        );
        Some(relocate.delta)
    }

    /// Try to exchange the middles of `visit1` in `t1` and `visit2` in `t2`.
    pub fn try_swap(
        &self,
        problem: &Problem,
        candidate: &mut Candidate,
        t1: usize,
        t2: usize,
        visit1: Triple,
        visit2: Triple,
    ) -> Option<f64> {
        let exchange = Exchange::evaluate(problem, candidate, t1, t2, visit1, visit2)?;
        if !exchange.is_improving() || !exchange.is_feasible(problem, candidate) {
            return None;
        }

        exchange.apply(problem, candidate);
        trace!(
            "exchanged {} (tour {}) and {} (tour {}): -{:.2}",
            visit1.along,
            t1,
            visit2.along,
            t2,
            exchange.delta
        );
        Some(exchange.delta)
    }

    /// Try to exchange the interiors of two sequences.
    pub fn try_swap_seq(
        &self,
        problem: &Problem,
        candidate: &mut Candidate,
        t1: usize,
        t2: usize,
        seq1: &Seq,
        seq2: &Seq,
    ) -> Option<f64> {
        let exchange = SeqExchange::evaluate(problem, candidate, t1, t2, seq1, seq2)?;
        if !exchange.is_improving() || !exchange.is_feasible(problem, candidate) {
            return None;
        }

        exchange.apply(problem, candidate);
        trace!(
            "exchanged {:?} (tour {}) and {:?} (tour {}): -{:.2}",
            seq1.interior(),
            t1,
            seq2.interior(),
            t2,
            exchange.delta
        );
        Some(exchange.delta)
    }

    /// Try to move the interior of `seq` from `t1` in between `pair` in `t2`.
    pub fn try_move_seq(
        &self,
        problem: &Problem,
        candidate: &mut Candidate,
        t1: usize,
        t2: usize,
        seq: &Seq,
        pair: Pair,
    ) -> Option<f64> {
        let relocate = SeqRelocate::evaluate(problem, candidate, t1, t2, seq, pair)?;
        if !relocate.is_improving() || !relocate.is_feasible(problem, candidate) {
            return None;
        }

        relocate.apply(problem, candidate);
        trace!(
            "relocated {:?} from tour {} to tour {}: -{:.2}",
            seq.interior(),
            t1,
            t2,
            relocate.delta
        );
        Some(relocate.delta)
    }

    /// Enumerate the sequences of a tour with a length in `[min_size, max_size]`.
    ///
    /// Sequences shorter than three visits have no interior and are skipped.
    /// A closed tour may use its first visit as the closing boundary, never
    /// as an interior visit.
    pub fn seq_and_smaller<'a>(
        &self,
        problem: &'a Problem,
        tour: &Tour,
        min_size: usize,
        max_size: usize,
    ) -> Sequences<'a> {
        let mut visits = tour.visits();
        if tour.is_closed() {
            visits.push(tour.first());
        }

        Sequences {
            problem,
            visits,
            size: min_size.max(3),
            max_size,
            start: 0,
        }
    }

    /// Reverse a sequence.
    pub fn reverse(&self, _problem: &Problem, _sequence: &Seq) -> Result<Seq, SolverError> {
        Err(SolverError::Unsupported("reversing a sequence"))
    }

    /// Create a new, empty solution.
    pub fn new_solution(&self, _problem: &Problem) -> Candidate {
        Candidate::new()
    }

    /// The visits to place, excluding a fixed departure or arrival.
    pub fn potential_visits(&self, problem: &Problem) -> Vec<usize> {
        (0..problem.len()).filter(|&v| !problem.is_fixed(v)).collect()
    }

    /// Build a tour serving only `seed`, `None` if even that violates capacity.
    pub fn open_tour(&self, problem: &Problem, seed: usize) -> Option<(Tour, Content)> {
        let n = problem.len();
        let tour = match problem.departure {
            None => Tour::new(seed, TourEnd::Closed, n),
            Some(departure) => {
                let end = match problem.arrival {
                    Some(arrival) => TourEnd::Fixed(arrival),
                    None => TourEnd::Open,
                };
                let mut tour = Tour::new(departure, end, n);
                tour.insert_after(departure, seed);
                tour.set_seed(seed);
                tour
            }
        };

        let content = self.content_of(problem, &tour);
        if !problem.capacity.is_respected(&content) {
            return None;
        }
        Some((tour, content))
    }

    /// Seed a new tour with one of the remaining visits.
    ///
    /// Visits that cannot be served even on their own are moved to
    /// [`Candidate::unplaced`]. Returns the index of the new tour, `None`
    /// when no visit is left.
    pub fn seed_next(
        &self,
        problem: &Problem,
        candidate: &mut Candidate,
        visits: &mut Vec<usize>,
        rng: &mut dyn RngCore,
    ) -> Option<usize> {
        loop {
            let seed = self.seed_selector.select(problem, candidate, visits, rng)?;
            visits.retain(|&v| v != seed);

            match self.open_tour(problem, seed) {
                Some((tour, content)) => {
                    if candidate.unplaced.is_empty() {
                        candidate.fitness += content.weight;
                    }
                    return Some(candidate.add_tour(tour, content));
                }
                None => {
                    candidate.unplaced.push(seed);
                    candidate.fitness = Candidate::INFINITE;
                }
            }
        }
    }

    /// The cheapest insertion of any of `visits` into tour `t`, ranked with
    /// the localization bias.
    fn cheapest_in(
        &self,
        problem: &Problem,
        candidate: &Candidate,
        t: usize,
        visits: &[usize],
    ) -> Option<Insertion> {
        let content = candidate.content(t);
        let candidates: Vec<usize> = visits
            .iter()
            .copied()
            .filter(|&v| problem.capacity.can_add(content, v))
            .collect();

        let tour = candidate.tour(t);
        match &self.localization {
            Some(localization) => {
                let seed = tour_seed(problem, tour);
                tour.cheapest_insertion_any(&problem.weights, &candidates, |v| {
                    localization.cost(problem, seed, v)
                })
            }
            None => tour.cheapest_insertion_any(&problem.weights, &candidates, |_| 0.0),
        }
    }

    /// Commit an insertion if the tour's capacity allows it.
    fn place(
        &self,
        problem: &Problem,
        candidate: &mut Candidate,
        t: usize,
        insertion: Insertion,
        visits: &mut Vec<usize>,
    ) -> bool {
        let increase = insertion.cost + problem.visit_cost(insertion.visit);
        let potential_weight = candidate.contents[t].weight + increase;
        if !problem.capacity.update_and_check_costs(
            &mut candidate.contents[t],
            potential_weight,
            insertion.visit,
        ) {
            return false;
        }

        candidate.tours[t].insert_after(insertion.after, insertion.visit);
        visits.retain(|&v| v != insertion.visit);
        candidate.fitness += increase;
        true
    }

    /// Place the cheapest of `visits` in tour `t`.
    ///
    /// Returns false when the cheapest placement violates capacity.
    pub fn try_place_any_in(
        &self,
        problem: &Problem,
        candidate: &mut Candidate,
        t: usize,
        visits: &mut Vec<usize>,
    ) -> bool {
        match self.cheapest_in(problem, candidate, t, visits) {
            Some(insertion) => self.place(problem, candidate, t, insertion, visits),
            None => false,
        }
    }

    /// Place the cheapest of `visits` in whichever tour it is cheapest.
    pub fn try_place_any(
        &self,
        problem: &Problem,
        candidate: &mut Candidate,
        visits: &mut Vec<usize>,
    ) -> bool {
        let best = (0..candidate.count())
            .filter_map(|t| {
                self.cheapest_in(problem, candidate, t, visits)
                    .map(|insertion| (t, insertion))
            })
            .min_by(|a, b| a.1.score.total_cmp(&b.1.score));

        match best {
            Some((t, insertion)) => self.place(problem, candidate, t, insertion, visits),
            None => false,
        }
    }

    /// Returns true if inter-tour moves between the two tours could pay off.
    pub fn have_to_try_inter(
        &self,
        problem: &Problem,
        candidate: &Candidate,
        t1: usize,
        t2: usize,
    ) -> bool {
        self.overlaps
            .overlaps(problem, candidate.tour(t1), candidate.tour(t2))
    }
}

impl Default for CvrpObjective {
    fn default() -> Self {
        CvrpObjective::new(Box::new(RandomSeed), Box::new(AlwaysOverlaps), 0.5)
    }
}
