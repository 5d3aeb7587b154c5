//! Inter-tour moves: evaluation without mutation, then commit.
//!
//! Every move is computed by `evaluate`, which never touches the candidate.
//! `is_improving` and `is_feasible` decide acceptance and `apply` commits the
//! change to both tours, both contents and the candidate fitness.

use crate::candidate::Candidate;
use crate::capacity::CapacityTracker;
use crate::objective::Seq;
use crate::problem::Problem;
use crate::tour::{Insertion, Pair, Triple};

/// Move a single visit from one tour to its cheapest place in another.
#[derive(Debug, Clone, Copy)]
pub struct Relocate {
    pub t1: usize,
    pub t2: usize,
    pub visit: Triple,
    pub insertion: Insertion,
    /// Cost saved in the first tour by removing the visit.
    pub removal_gain: f64,
    pub delta: f64,
    pub weight1: f64,
    pub weight2: f64,
}

impl Relocate {
    pub const EPSILON: f64 = 0.1;

    /// `None` when the visit is the first of its tour or the second tour has
    /// nowhere to put it.
    pub fn evaluate(
        problem: &Problem,
        candidate: &Candidate,
        t1: usize,
        t2: usize,
        visit: Triple,
    ) -> Option<Self> {
        debug_assert_ne!(t1, t2);
        // the first visit cannot be moved.
        if candidate.tour(t1).first() == visit.along {
            return None;
        }

        let removal_gain = problem.weight(visit.from, visit.along)
            + problem.weight(visit.along, visit.to)
            - problem.weight(visit.from, visit.to);
        let insertion = candidate
            .tour(t2)
            .cheapest_insertion(&problem.weights, visit.along)?;
        let visit_cost = problem.visit_cost(visit.along);

        Some(Relocate {
            t1,
            t2,
            visit,
            insertion,
            removal_gain,
            delta: removal_gain - insertion.cost,
            weight1: candidate.content(t1).weight - removal_gain - visit_cost,
            weight2: candidate.content(t2).weight + insertion.cost + visit_cost,
        })
    }

    pub fn is_improving(&self) -> bool {
        self.delta > Self::EPSILON
    }

    /// Both tours must stay within the weight limit; with directed weights
    /// the giving tour can get heavier.
    pub fn is_feasible(&self, problem: &Problem, candidate: &Candidate) -> bool {
        problem.capacity.weight_fits(self.weight1)
            && problem.capacity.weight_fits(self.weight2)
            && problem
                .capacity
                .can_add(candidate.content(self.t2), self.visit.along)
    }

    pub fn apply(&self, problem: &Problem, candidate: &mut Candidate) {
        let along = self.visit.along;

        let tour1 = &mut candidate.tours[self.t1];
        tour1.replace_edge_from(self.visit.from, self.visit.to);
        tour1.release(along);
        candidate.tours[self.t2].insert_after(self.insertion.after, along);

        let content1 = &mut candidate.contents[self.t1];
        problem.capacity.remove(content1, along);
        content1.weight = self.weight1;
        let content2 = &mut candidate.contents[self.t2];
        problem.capacity.add(content2, along);
        content2.weight = self.weight2;

        candidate.fitness -= self.delta;

        candidate.tours[self.t1].verify(problem.len());
        candidate.tours[self.t2].verify(problem.len());
    }
}

/// Exchange two single visits between two tours.
#[derive(Debug, Clone, Copy)]
pub struct Exchange {
    pub t1: usize,
    pub t2: usize,
    pub visit1: Triple,
    pub visit2: Triple,
    pub delta: f64,
    pub weight1: f64,
    pub weight2: f64,
}

impl Exchange {
    pub const EPSILON: f64 = 0.01;

    /// `None` when either visit is the first of its tour.
    pub fn evaluate(
        problem: &Problem,
        candidate: &Candidate,
        t1: usize,
        t2: usize,
        visit1: Triple,
        visit2: Triple,
    ) -> Option<Self> {
        debug_assert_ne!(t1, t2);
        if candidate.tour(t1).first() == visit1.along || candidate.tour(t2).first() == visit2.along
        {
            return None;
        }

        let weight1 =
            problem.weight(visit1.from, visit1.along) + problem.weight(visit1.along, visit1.to);
        let weight2 =
            problem.weight(visit2.from, visit2.along) + problem.weight(visit2.along, visit2.to);
        let weight1_swapped =
            problem.weight(visit1.from, visit2.along) + problem.weight(visit2.along, visit1.to);
        let weight2_swapped =
            problem.weight(visit2.from, visit1.along) + problem.weight(visit1.along, visit2.to);

        let visit1_cost = problem.visit_cost(visit1.along);
        let visit2_cost = problem.visit_cost(visit2.along);

        Some(Exchange {
            t1,
            t2,
            visit1,
            visit2,
            delta: (weight1 + weight2) - (weight1_swapped + weight2_swapped),
            weight1: candidate.content(t1).weight - weight1 + weight1_swapped - visit1_cost
                + visit2_cost,
            weight2: candidate.content(t2).weight - weight2 + weight2_swapped - visit2_cost
                + visit1_cost,
        })
    }

    pub fn is_improving(&self) -> bool {
        self.delta > Self::EPSILON
    }

    pub fn is_feasible(&self, problem: &Problem, candidate: &Candidate) -> bool {
        let capacity = &problem.capacity;
        let (a1, a2) = (self.visit1.along, self.visit2.along);

        capacity.weight_fits(self.weight1)
            && capacity.weight_fits(self.weight2)
            && capacity.exchange_is_possible(candidate.content(self.t1), &[a1], &[a2])
            && capacity.exchange_is_possible(candidate.content(self.t2), &[a2], &[a1])
    }

    pub fn apply(&self, problem: &Problem, candidate: &mut Candidate) {
        let (v1, v2) = (self.visit1, self.visit2);

        let tour1 = &mut candidate.tours[self.t1];
        tour1.release(v1.along);
        tour1.replace_edge_from(v1.from, v2.along);
        tour1.replace_edge_from(v2.along, v1.to);

        let tour2 = &mut candidate.tours[self.t2];
        tour2.release(v2.along);
        tour2.replace_edge_from(v2.from, v1.along);
        tour2.replace_edge_from(v1.along, v2.to);

        let content1 = &mut candidate.contents[self.t1];
        problem
            .capacity
            .update_exchange(content1, &[v1.along], &[v2.along]);
        content1.weight = self.weight1;
        let content2 = &mut candidate.contents[self.t2];
        problem
            .capacity
            .update_exchange(content2, &[v2.along], &[v1.along]);
        content2.weight = self.weight2;

        candidate.fitness -= self.delta;

        candidate.tours[self.t1].verify(problem.len());
        candidate.tours[self.t2].verify(problem.len());
    }
}

/// Exchange the interiors of two sequences between two tours.
#[derive(Debug, Clone, Copy)]
pub struct SeqExchange<'s> {
    pub t1: usize,
    pub t2: usize,
    pub seq1: &'s Seq,
    pub seq2: &'s Seq,
    pub delta: f64,
    pub weight1: f64,
    pub weight2: f64,
}

impl<'s> SeqExchange<'s> {
    pub const EPSILON: f64 = 0.01;

    /// `None` when a sequence has no interior or its interior holds the first
    /// visit of its tour.
    pub fn evaluate(
        problem: &Problem,
        candidate: &Candidate,
        t1: usize,
        t2: usize,
        seq1: &'s Seq,
        seq2: &'s Seq,
    ) -> Option<Self> {
        debug_assert_ne!(t1, t2);
        if seq1.len() < 3 || seq2.len() < 3 {
            return None;
        }
        if seq1.interior().contains(&candidate.tour(t1).first())
            || seq2.interior().contains(&candidate.tour(t2).first())
        {
            return None;
        }

        let (s1_start, s1_end) = (seq1.interior_first(), seq1.interior_last());
        let (s2_start, s2_end) = (seq2.interior_first(), seq2.interior_last());

        let tour1_current = problem.weight(seq1.first(), s1_start)
            + problem.weight(s1_end, seq1.last())
            + seq1.between_original;
        let tour1_future = problem.weight(seq1.first(), s2_start)
            + problem.weight(s2_end, seq1.last())
            + seq2.between;
        let tour2_current = problem.weight(seq2.first(), s2_start)
            + problem.weight(s2_end, seq2.last())
            + seq2.between_original;
        let tour2_future = problem.weight(seq2.first(), s1_start)
            + problem.weight(s1_end, seq2.last())
            + seq1.between;

        Some(SeqExchange {
            t1,
            t2,
            seq1,
            seq2,
            delta: tour1_current - tour1_future + tour2_current - tour2_future,
            weight1: candidate.content(t1).weight - tour1_current + tour1_future,
            weight2: candidate.content(t2).weight - tour2_current + tour2_future,
        })
    }

    pub fn is_improving(&self) -> bool {
        self.delta > Self::EPSILON
    }

    pub fn is_feasible(&self, problem: &Problem, candidate: &Candidate) -> bool {
        let capacity = &problem.capacity;
        let (i1, i2) = (self.seq1.interior(), self.seq2.interior());

        capacity.weight_fits(self.weight1)
            && capacity.weight_fits(self.weight2)
            && capacity.exchange_is_possible(candidate.content(self.t1), i1, i2)
            && capacity.exchange_is_possible(candidate.content(self.t2), i2, i1)
    }

    pub fn apply(&self, problem: &Problem, candidate: &mut Candidate) {
        let (i1, i2) = (self.seq1.interior(), self.seq2.interior());

        // seq2 -> tour1
        let tour1 = &mut candidate.tours[self.t1];
        for &visit in i1 {
            tour1.release(visit);
        }
        let mut previous = self.seq1.first();
        for &visit in i2 {
            tour1.replace_edge_from(previous, visit);
            previous = visit;
        }
        tour1.replace_edge_from(previous, self.seq1.last());

        // seq1 -> tour2
        let tour2 = &mut candidate.tours[self.t2];
        for &visit in i2 {
            tour2.release(visit);
        }
        let mut previous = self.seq2.first();
        for &visit in i1 {
            tour2.replace_edge_from(previous, visit);
            previous = visit;
        }
        tour2.replace_edge_from(previous, self.seq2.last());

        let content1 = &mut candidate.contents[self.t1];
        problem.capacity.update_exchange(content1, i1, i2);
        content1.weight = self.weight1;
        let content2 = &mut candidate.contents[self.t2];
        problem.capacity.update_exchange(content2, i2, i1);
        content2.weight = self.weight2;

        candidate.fitness -= self.delta;

        candidate.tours[self.t1].verify(problem.len());
        candidate.tours[self.t2].verify(problem.len());
    }
}

/// Move the interior of a sequence from one tour into an edge of another.
#[derive(Debug, Clone, Copy)]
pub struct SeqRelocate<'s> {
    pub t1: usize,
    pub t2: usize,
    pub seq: &'s Seq,
    pub pair: Pair,
    pub delta: f64,
    pub weight1: f64,
    pub weight2: f64,
}

impl<'s> SeqRelocate<'s> {
    pub const EPSILON: f64 = 0.01;

    /// `None` when the sequence has no interior or its interior holds the
    /// first visit of its tour.
    pub fn evaluate(
        problem: &Problem,
        candidate: &Candidate,
        t1: usize,
        t2: usize,
        seq: &'s Seq,
        pair: Pair,
    ) -> Option<Self> {
        debug_assert_ne!(t1, t2);
        debug_assert_eq!(candidate.tour(t2).next(pair.from), Some(pair.to));
        if seq.len() < 3 || seq.interior().contains(&candidate.tour(t1).first()) {
            return None;
        }

        let (s_start, s_end) = (seq.interior_first(), seq.interior_last());

        let tour1_current =
            problem.weight(seq.first(), s_start) + problem.weight(s_end, seq.last());
        let tour1_future = problem.weight(seq.first(), seq.last());
        let tour2_current = problem.weight(pair.from, pair.to);
        let tour2_future = problem.weight(pair.from, s_start) + problem.weight(s_end, pair.to);

        Some(SeqRelocate {
            t1,
            t2,
            seq,
            pair,
            delta: tour1_current + tour2_current - tour1_future - tour2_future,
            weight1: candidate.content(t1).weight - tour1_current - seq.between + tour1_future,
            weight2: candidate.content(t2).weight - tour2_current + seq.between + tour2_future,
        })
    }

    pub fn is_improving(&self) -> bool {
        self.delta > Self::EPSILON
    }

    pub fn is_feasible(&self, problem: &Problem, candidate: &Candidate) -> bool {
        let capacity = &problem.capacity;

        capacity.weight_fits(self.weight1)
            && capacity.weight_fits(self.weight2)
            && capacity.can_add_all(candidate.content(self.t2), self.seq.interior())
    }

    pub fn apply(&self, problem: &Problem, candidate: &mut Candidate) {
        let interior = self.seq.interior();

        let tour1 = &mut candidate.tours[self.t1];
        tour1.replace_edge_from(self.seq.first(), self.seq.last());
        for &visit in interior {
            tour1.release(visit);
        }

        let tour2 = &mut candidate.tours[self.t2];
        let mut previous = self.pair.from;
        for &visit in interior {
            tour2.replace_edge_from(previous, visit);
            previous = visit;
        }
        tour2.replace_edge_from(previous, self.pair.to);

        for &visit in interior {
            problem.capacity.remove(&mut candidate.contents[self.t1], visit);
            problem.capacity.add(&mut candidate.contents[self.t2], visit);
        }
        candidate.contents[self.t1].weight = self.weight1;
        candidate.contents[self.t2].weight = self.weight2;

        candidate.fitness -= self.delta;

        candidate.tours[self.t1].verify(problem.len());
        candidate.tours[self.t2].verify(problem.len());
    }
}
