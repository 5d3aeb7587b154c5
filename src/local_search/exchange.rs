//! Exchange neighborhood for local search.

use crate::candidate::Candidate;
use crate::objective::CvrpObjective;
use crate::problem::Problem;
use crate::tour::Triple;

use super::LocalSearch;

impl LocalSearch {
    /// Swap single visits between two tours.
    pub fn exchange_neighborhood(
        &self,
        problem: &Problem,
        objective: &CvrpObjective,
        candidate: &mut Candidate,
    ) -> bool {
        let mut improvement = false;

        'sweep: loop {
            for (t1, t2) in self.tour_pairs(problem, objective, candidate) {
                let triples1: Vec<Triple> = candidate.tour(t1).triples().collect();
                let triples2: Vec<Triple> = candidate.tour(t2).triples().collect();

                for &visit1 in &triples1 {
                    for &visit2 in &triples2 {
                        if objective
                            .try_swap(problem, candidate, t1, t2, visit1, visit2)
                            .is_some()
                        {
                            improvement = true;
                            continue 'sweep;
                        }
                    }
                }
            }
            break;
        }

        improvement
    }
}
