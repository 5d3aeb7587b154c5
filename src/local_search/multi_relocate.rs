//! Sequence relocate neighborhood.

use crate::candidate::Candidate;
use crate::objective::{CvrpObjective, Seq};
use crate::problem::Problem;
use crate::tour::Pair;

use super::LocalSearch;

impl LocalSearch {
    /// Move short sequences of visits into an edge of another tour.
    pub fn multi_relocate_neighborhood(
        &self,
        problem: &Problem,
        objective: &CvrpObjective,
        candidate: &mut Candidate,
    ) -> bool {
        let mut improvement = false;

        'sweep: loop {
            for (t1, t2) in self.ordered_tour_pairs(problem, objective, candidate) {
                let sequences: Vec<Seq> = objective
                    .seq_and_smaller(problem, candidate.tour(t1), 3, self.max_seq_size)
                    .collect();
                let pairs: Vec<Pair> = candidate.tour(t2).pairs().collect();

                for seq in &sequences {
                    for &pair in &pairs {
                        if objective
                            .try_move_seq(problem, candidate, t1, t2, seq, pair)
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
