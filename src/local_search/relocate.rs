//! Relocate neighborhood for local search.

use crate::candidate::Candidate;
use crate::objective::CvrpObjective;
use crate::problem::Problem;
use crate::tour::Triple;

use super::LocalSearch;

impl LocalSearch {
    /// Move single visits to the cheapest place in another tour.
    pub fn relocate_neighborhood(
        &self,
        problem: &Problem,
        objective: &CvrpObjective,
        candidate: &mut Candidate,
    ) -> bool {
        let mut improvement = false;

        'sweep: loop {
            for (t1, t2) in self.ordered_tour_pairs(problem, objective, candidate) {
                let triples: Vec<Triple> = candidate.tour(t1).triples().collect();

                for triple in triples {
                    if objective
                        .try_move(problem, candidate, t1, t2, triple)
                        .is_some()
                    {
                        // the tours changed, start over.
                        improvement = true;
                        continue 'sweep;
                    }
                }
            }
            break;
        }

        improvement
    }
}
