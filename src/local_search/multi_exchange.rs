//! Sequence exchange neighborhood.

use crate::candidate::Candidate;
use crate::objective::{CvrpObjective, Seq};
use crate::problem::Problem;

use super::LocalSearch;

impl LocalSearch {
    /// Exchange short sequences of visits between two tours.
    pub fn multi_exchange_neighborhood(
        &self,
        problem: &Problem,
        objective: &CvrpObjective,
        candidate: &mut Candidate,
    ) -> bool {
        let mut improvement = false;

        'sweep: loop {
            for (t1, t2) in self.tour_pairs(problem, objective, candidate) {
                let sequences1: Vec<Seq> = objective
                    .seq_and_smaller(problem, candidate.tour(t1), 3, self.max_seq_size)
                    .collect();
                let sequences2: Vec<Seq> = objective
                    .seq_and_smaller(problem, candidate.tour(t2), 3, self.max_seq_size)
                    .collect();

                for seq1 in &sequences1 {
                    for seq2 in &sequences2 {
                        if objective
                            .try_swap_seq(problem, candidate, t1, t2, seq1, seq2)
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
