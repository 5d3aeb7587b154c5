//! Successor-linked tour representation.
//!
//! A tour stores, for every visit of the problem, the visit that follows it.
//! Splicing, inserting and rewiring edges are constant-time; walking the tour
//! starts at the fixed first visit.

use serde::{Deserialize, Serialize};

/// Marks a visit that is not part of the tour.
pub const NOT_SET: usize = usize::MAX;
/// Marks the last visit of a tour that does not wrap around.
const END: usize = usize::MAX - 1;

/// How a tour ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TourEnd {
    /// The last visit links back to the first.
    Closed,
    /// The tour always ends at the given visit.
    Fixed(usize),
    /// The tour ends wherever its last visit is.
    Open,
}

/// A directed edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pair {
    pub from: usize,
    pub to: usize,
}

impl Pair {
    pub fn new(from: usize, to: usize) -> Self {
        Pair { from, to }
    }
}

/// A visit together with its predecessor and successor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Triple {
    pub from: usize,
    pub along: usize,
    pub to: usize,
}

impl Triple {
    pub fn new(from: usize, along: usize, to: usize) -> Self {
        Triple { from, along, to }
    }
}

/// The place where a visit can be inserted and what it costs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Insertion {
    /// The visit the new one goes after.
    pub after: usize,
    /// The visit the new one goes before, `None` when appended to an open tour.
    pub before: Option<usize>,
    pub visit: usize,
    /// Increase in travel cost.
    pub cost: f64,
    /// The cost used to rank insertions, including any extra per-visit cost.
    pub score: f64,
}

/// A tour over a subset of the visits of a problem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tour {
    first: usize,
    /// The visit the tour was opened for; stays put as visits are inserted.
    seed: usize,
    end: TourEnd,
    tail: usize,
    next: Vec<usize>,
}

impl Tour {
    /// Create a tour containing `first` (and the fixed end, if any) for a
    /// problem with `n` visits.
    pub fn new(first: usize, end: TourEnd, n: usize) -> Self {
        let mut next = vec![NOT_SET; n];
        let (end, tail) = match end {
            TourEnd::Fixed(last) if last == first => (TourEnd::Closed, first),
            TourEnd::Closed => (TourEnd::Closed, first),
            TourEnd::Fixed(last) => {
                next[last] = END;
                (TourEnd::Fixed(last), last)
            }
            TourEnd::Open => (TourEnd::Open, first),
        };
        next[first] = match end {
            TourEnd::Closed => first,
            TourEnd::Fixed(last) => last,
            TourEnd::Open => END,
        };

        Tour {
            first,
            seed: first,
            end,
            tail,
            next,
        }
    }

    /// Create a tour visiting `visits` in order. A fixed end is appended.
    ///
    /// # Panics
    ///
    /// Panics if `visits` is empty.
    pub fn from_visits(visits: &[usize], end: TourEnd, n: usize) -> Self {
        assert!(!visits.is_empty(), "a tour needs at least one visit");

        let mut tour = Tour::new(visits[0], end, n);
        let mut previous = visits[0];
        for &visit in &visits[1..] {
            tour.insert_after(previous, visit);
            previous = visit;
        }
        tour
    }

    /// The fixed first visit.
    pub fn first(&self) -> usize {
        self.first
    }

    /// The seed of the tour, `first` unless set otherwise.
    pub fn seed(&self) -> usize {
        self.seed
    }

    pub fn set_seed(&mut self, seed: usize) {
        self.seed = seed;
    }

    pub fn end(&self) -> TourEnd {
        self.end
    }

    pub fn is_closed(&self) -> bool {
        self.end == TourEnd::Closed
    }

    /// The last visit of an open tour or the fixed end. A closed tour
    /// reports its first visit.
    pub fn tail(&self) -> usize {
        self.tail
    }

    /// Returns true if the visit is part of this tour.
    pub fn contains(&self, visit: usize) -> bool {
        self.next[visit] != NOT_SET
    }

    /// Number of visits in the tour.
    pub fn count(&self) -> usize {
        self.iter().count()
    }

    /// The successor of a visit, `None` at the end of a tour that does not wrap.
    pub fn next(&self, visit: usize) -> Option<usize> {
        match self.next[visit] {
            NOT_SET | END => None,
            next => Some(next),
        }
    }

    /// The predecessor of a visit. Walks the tour.
    pub fn previous(&self, visit: usize) -> Option<usize> {
        self.pairs().find(|p| p.to == visit).map(|p| p.from)
    }

    /// Iterate the visits starting at the first one.
    pub fn iter(&self) -> TourIter<'_> {
        TourIter {
            tour: self,
            current: Some(self.first),
        }
    }

    /// The visits in tour order.
    pub fn visits(&self) -> Vec<usize> {
        self.iter().collect()
    }

    /// Iterate consecutive edges, including the wrap-around edge of a closed tour.
    pub fn pairs(&self) -> Pairs<'_> {
        Pairs {
            tour: self,
            current: Some(self.first),
        }
    }

    /// Iterate every visit that has both a predecessor and a successor.
    pub fn triples(&self) -> Triples<'_> {
        Triples {
            pairs: self.pairs(),
            closed: self.is_closed(),
            first_pair: None,
            previous: None,
        }
    }

    /// Rewire the successor of `from`.
    ///
    /// `from` may be a visit that is being linked in. The caller is
    /// responsible for keeping the tour consistent: the visit previously
    /// following `from` must be relinked or released.
    pub fn replace_edge_from(&mut self, from: usize, to: usize) {
        debug_assert!(
            !(self.end == TourEnd::Open && from == self.tail),
            "cannot rewire the open end"
        );
        self.next[from] = to;
    }

    /// Insert `visit` directly after `after`.
    pub fn insert_after(&mut self, after: usize, visit: usize) {
        debug_assert!(self.contains(after), "visit {} is not in the tour", after);
        debug_assert!(!self.contains(visit), "visit {} is already in the tour", visit);

        let next = self.next[after];
        self.next[after] = visit;
        self.next[visit] = next;
        if next == END {
            self.tail = visit;
        }
    }

    /// Remove a visit, linking its predecessor to its successor.
    ///
    /// Returns false if the visit is not in the tour. The first visit and a
    /// fixed end cannot be removed.
    pub fn remove(&mut self, visit: usize) -> bool {
        if visit == self.first || self.end == TourEnd::Fixed(visit) || !self.contains(visit) {
            return false;
        }
        let Some(previous) = self.previous(visit) else {
            return false;
        };

        let next = self.next[visit];
        self.next[previous] = next;
        self.next[visit] = NOT_SET;
        if next == END {
            self.tail = previous;
        }
        true
    }

    /// Forget a visit that has already been spliced out with
    /// [`Tour::replace_edge_from`].
    pub fn release(&mut self, visit: usize) {
        debug_assert!(visit != self.first, "cannot release the first visit");
        self.next[visit] = NOT_SET;
    }

    /// Every place a new visit can go: all edges plus, for an open tour, after
    /// the last visit.
    fn slots(&self) -> impl Iterator<Item = (usize, Option<usize>)> + '_ {
        let append = match self.end {
            TourEnd::Open => Some((self.tail, None)),
            _ => None,
        };
        self.pairs()
            .map(|p| (p.from, Some(p.to)))
            .chain(append)
    }

    /// The cheapest place to insert `visit`.
    pub fn cheapest_insertion(&self, weights: &[Vec<f64>], visit: usize) -> Option<Insertion> {
        self.cheapest_insertion_any(weights, &[visit], |_| 0.0)
    }

    /// The cheapest insertion of any of the given visits.
    ///
    /// Insertions are ranked by travel cost plus `extra_cost(visit)`; the
    /// returned [`Insertion::cost`] excludes the extra cost.
    pub fn cheapest_insertion_any<F>(
        &self,
        weights: &[Vec<f64>],
        visits: &[usize],
        extra_cost: F,
    ) -> Option<Insertion>
    where
        F: Fn(usize) -> f64,
    {
        let mut best: Option<Insertion> = None;

        for (after, before) in self.slots() {
            let removed = before.map_or(0.0, |b| weights[after][b]);
            for &visit in visits {
                debug_assert!(!self.contains(visit));
                let cost = match before {
                    Some(b) => weights[after][visit] + weights[visit][b] - removed,
                    None => weights[after][visit],
                };
                let score = cost + extra_cost(visit);
                if best.map_or(true, |b| score < b.score) {
                    best = Some(Insertion {
                        after,
                        before,
                        visit,
                        cost,
                        score,
                    });
                }
            }
        }

        best
    }

    /// Assert that every linked visit is reachable exactly once.
    ///
    /// Only checks in debug builds.
    pub fn verify(&self, n: usize) {
        if !cfg!(debug_assertions) {
            return;
        }

        let mut seen = vec![false; n];
        let mut count = 0;
        for visit in self.iter() {
            debug_assert!(visit < n, "visit {} out of range", visit);
            debug_assert!(!seen[visit], "visit {} appears twice", visit);
            seen[visit] = true;
            count += 1;
            debug_assert!(count <= n, "the tour does not terminate");
        }
        for (visit, &next) in self.next.iter().enumerate().take(n) {
            debug_assert_eq!(
                next != NOT_SET,
                seen[visit],
                "visit {} is linked but unreachable",
                visit
            );
        }
    }
}

/// Iterator over the visits of a tour.
pub struct TourIter<'a> {
    tour: &'a Tour,
    current: Option<usize>,
}

impl Iterator for TourIter<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let current = self.current?;
        self.current = match self.tour.next[current] {
            NOT_SET | END => None,
            next if next == self.tour.first => None,
            next => Some(next),
        };
        Some(current)
    }
}

/// Iterator over the edges of a tour.
pub struct Pairs<'a> {
    tour: &'a Tour,
    current: Option<usize>,
}

impl Iterator for Pairs<'_> {
    type Item = Pair;

    fn next(&mut self) -> Option<Pair> {
        let from = self.current?;
        match self.tour.next[from] {
            NOT_SET | END => {
                self.current = None;
                None
            }
            to => {
                self.current = if to == self.tour.first { None } else { Some(to) };
                Some(Pair { from, to })
            }
        }
    }
}

/// Iterator over the visits of a tour with their neighbours.
pub struct Triples<'a> {
    pairs: Pairs<'a>,
    closed: bool,
    first_pair: Option<Pair>,
    previous: Option<Pair>,
}

impl Iterator for Triples<'_> {
    type Item = Triple;

    fn next(&mut self) -> Option<Triple> {
        loop {
            match self.pairs.next() {
                Some(pair) => match self.previous.replace(pair) {
                    Some(previous) => return Some(Triple::new(previous.from, pair.from, pair.to)),
                    None => self.first_pair = Some(pair),
                },
                None => {
                    if !self.closed {
                        return None;
                    }
                    // wrap around the first visit, once.
                    let last = self.previous.take()?;
                    let first = self.first_pair.take()?;
                    return Some(Triple::new(last.from, first.from, first.to));
                }
            }
        }
    }
}
