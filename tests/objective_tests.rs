//! Tests for the CVRP objective: evaluation, inter-tour moves and placement.

use ga_cvrp::capacity::{metrics, Capacity, CapacityConstraint};
use ga_cvrp::objective::moves::SeqExchange;
use ga_cvrp::objective::strategies::{tour_seed, AlwaysOverlaps, FarthestSeed, RandomSeed};
use ga_cvrp::objective::{CvrpObjective, Seq};
use ga_cvrp::tour::{Pair, Tour, TourEnd, Triple};
use ga_cvrp::{Candidate, Problem, SolverError};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// A symmetric matrix with 10 everywhere except the given edges.
fn matrix(n: usize, edges: &[(usize, usize, f64)]) -> Vec<Vec<f64>> {
    let mut weights = vec![vec![10.0; n]; n];
    for (i, row) in weights.iter_mut().enumerate() {
        row[i] = 0.0;
    }
    for &(a, b, w) in edges {
        weights[a][b] = w;
        weights[b][a] = w;
    }
    weights
}

/// Integer-valued asymmetric weights so float arithmetic stays exact.
fn integer_weights(n: usize) -> Vec<Vec<f64>> {
    (0..n)
        .map(|i| {
            (0..n)
                .map(|j| {
                    if i == j {
                        0.0
                    } else {
                        ((i * 7 + j * 3) % 11 + 1) as f64
                    }
                })
                .collect()
        })
        .collect()
}

fn create_test_problem(weights: Vec<Vec<f64>>, max: f64) -> Problem {
    Problem::new(
        "test".to_string(),
        weights,
        None,
        Capacity::new(metrics::TIME, max),
        None,
        None,
    )
    .unwrap()
}

/// Build a candidate of closed tours with exact contents.
fn create_candidate(
    problem: &Problem,
    objective: &CvrpObjective,
    tours: &[&[usize]],
) -> Candidate {
    let mut candidate = Candidate::new();
    for visits in tours {
        let tour = Tour::from_visits(visits, TourEnd::Closed, problem.len());
        let content = objective.content_of(problem, &tour);
        candidate.add_tour(tour, content);
    }
    candidate.update_fitness();
    candidate
}

fn assert_consistent(problem: &Problem, objective: &CvrpObjective, candidate: &Candidate) {
    for (t, tour) in candidate.tours.iter().enumerate() {
        let expected = objective.content_of(problem, tour);
        assert!(
            (candidate.content(t).weight - expected.weight).abs() < 1e-9,
            "tour {} weight {} != {}",
            t,
            candidate.content(t).weight,
            expected.weight
        );
        assert_eq!(candidate.content(t).quantities, expected.quantities);
    }
    assert!((candidate.fitness - objective.calculate(problem, candidate)).abs() < 1e-9);
}

/// Three tours where moving visit 1 out of the first tour saves 5 and
/// inserting it into the second costs 2.
fn create_relocate_problem(max: f64) -> Problem {
    let weights = matrix(
        7,
        &[
            (0, 1, 3.0),
            (1, 2, 3.0),
            (0, 2, 1.0),
            (3, 4, 4.0),
            (3, 1, 3.0),
            (1, 4, 3.0),
        ],
    );
    create_test_problem(weights, max)
}

#[test]
fn test_calculate() {
    let problem = create_relocate_problem(1000.0);
    let objective = CvrpObjective::default();
    let candidate = create_candidate(&problem, &objective, &[&[0, 1, 2], &[3, 4], &[5, 6]]);

    assert_eq!(objective.calculate_tour(&problem, candidate.tour(0)), 7.0);
    assert_eq!(objective.calculate_tour(&problem, candidate.tour(1)), 8.0);
    assert_eq!(objective.calculate_tour(&problem, candidate.tour(2)), 20.0);
    assert_eq!(candidate.fitness, 35.0);
    assert_eq!(objective.calculate(&problem, &candidate), 35.0);
}

#[test]
fn test_visit_costs_count_towards_weight() {
    let problem = Problem::new(
        "costs".to_string(),
        matrix(3, &[]),
        Some(vec![1.0, 2.0, 3.0]),
        Capacity::new(metrics::TIME, 100.0),
        None,
        None,
    )
    .unwrap();
    let objective = CvrpObjective::default();
    let tour = Tour::from_visits(&[0, 2], TourEnd::Closed, 3);

    assert_eq!(objective.calculate_tour(&problem, &tour), 24.0);
}

#[test]
fn test_try_move_delta() {
    let problem = create_relocate_problem(1000.0);
    let objective = CvrpObjective::default();
    let mut candidate = create_candidate(&problem, &objective, &[&[0, 1, 2], &[3, 4], &[5, 6]]);

    let delta = objective.try_move(&problem, &mut candidate, 0, 1, Triple::new(0, 1, 2));

    assert_eq!(delta, Some(3.0));
    assert_eq!(candidate.tour(0).visits(), vec![0, 2]);
    assert!(candidate.tour(1).contains(1));
    assert_eq!(candidate.tour(1).count(), 3);
    assert_eq!(candidate.tour(2).visits(), vec![5, 6]);
    assert_eq!(candidate.fitness, 32.0);
    assert_consistent(&problem, &objective, &candidate);
}

#[test]
fn test_try_move_respects_capacity() {
    // the second tour would weigh 10
    let problem = create_relocate_problem(9.0);
    let objective = CvrpObjective::default();
    let mut candidate = create_candidate(&problem, &objective, &[&[0, 1, 2], &[3, 4], &[5, 6]]);
    let before = candidate.clone();

    let delta = objective.try_move(&problem, &mut candidate, 0, 1, Triple::new(0, 1, 2));

    assert_eq!(delta, None);
    assert_eq!(candidate.tours, before.tours);
    assert_eq!(candidate.fitness, before.fitness);
}

#[test]
fn test_try_move_respects_constraints() {
    let capacity = Capacity::new(metrics::TIME, 1000.0).with_constraint(CapacityConstraint::new(
        metrics::WEIGHT,
        2.0,
        vec![1.0; 7],
    ));
    let problem = Problem::new(
        "constraint".to_string(),
        create_relocate_problem(1000.0).weights,
        None,
        capacity,
        None,
        None,
    )
    .unwrap();
    let objective = CvrpObjective::default();
    let mut candidate = create_candidate(&problem, &objective, &[&[0, 1, 2], &[3, 4], &[5, 6]]);

    let delta = objective.try_move(&problem, &mut candidate, 0, 1, Triple::new(0, 1, 2));
    assert_eq!(delta, None);
}

/// Directed weights where dropping visit 1 from [0, 1, 2] makes that tour
/// heavier (5 -> 11) while [3, 4] gets lighter (10 -> 0).
fn create_directed_problem(max: f64) -> Problem {
    let mut weights = matrix(5, &[]);
    for &(a, b, w) in &[
        (0, 1, 1.0),
        (1, 2, 1.0),
        (2, 0, 3.0),
        (0, 2, 8.0),
        (3, 4, 10.0),
        (4, 3, 0.0),
        (3, 1, 0.0),
        (1, 4, 0.0),
    ] {
        weights[a][b] = w;
    }
    create_test_problem(weights, max)
}

#[test]
fn test_try_move_checks_the_giving_tour() {
    let objective = CvrpObjective::default();

    let roomy = create_directed_problem(20.0);
    let mut candidate = create_candidate(&roomy, &objective, &[&[0, 1, 2], &[3, 4]]);
    let delta = objective.try_move(&roomy, &mut candidate, 0, 1, Triple::new(0, 1, 2));
    assert_eq!(delta, Some(4.0));
    assert_eq!(candidate.content(0).weight, 11.0);
    assert_eq!(candidate.content(1).weight, 0.0);
    assert_consistent(&roomy, &objective, &candidate);

    // with a limit of 10 the first tour would end up over capacity
    let tight = create_directed_problem(10.0);
    let mut candidate = create_candidate(&tight, &objective, &[&[0, 1, 2], &[3, 4]]);
    let before = candidate.clone();
    let delta = objective.try_move(&tight, &mut candidate, 0, 1, Triple::new(0, 1, 2));
    assert_eq!(delta, None);
    assert_eq!(candidate.tours, before.tours);
    assert_eq!(candidate.contents, before.contents);
    for content in &candidate.contents {
        assert!(tight.capacity.is_respected(content));
    }
}

#[test]
fn test_try_move_first_visit_is_fixed() {
    let problem = create_relocate_problem(1000.0);
    let objective = CvrpObjective::default();
    let mut candidate = create_candidate(&problem, &objective, &[&[0, 1, 2], &[3, 4], &[5, 6]]);

    let delta = objective.try_move(&problem, &mut candidate, 0, 1, Triple::new(2, 0, 1));
    assert_eq!(delta, None);
    assert_eq!(candidate.tour(0).visits(), vec![0, 1, 2]);
}

#[test]
fn test_try_move_not_improving() {
    let problem = create_relocate_problem(1000.0);
    let objective = CvrpObjective::default();
    let mut candidate = create_candidate(&problem, &objective, &[&[0, 1, 2], &[3, 4], &[5, 6]]);

    // removing visit 4 saves 8, inserting it costs at least 10
    let delta = objective.try_move(&problem, &mut candidate, 1, 0, Triple::new(3, 4, 3));
    assert_eq!(delta, None);
    assert_eq!(candidate.tour(1).visits(), vec![3, 4]);
}

#[test]
fn test_try_swap() {
    let weights = matrix(
        6,
        &[(0, 4, 1.0), (4, 2, 1.0), (3, 1, 1.0), (1, 5, 1.0)],
    );
    let problem = create_test_problem(weights, 1000.0);
    let objective = CvrpObjective::default();
    let mut candidate = create_candidate(&problem, &objective, &[&[0, 1, 2], &[3, 4, 5]]);

    let delta = objective.try_swap(
        &problem,
        &mut candidate,
        0,
        1,
        Triple::new(0, 1, 2),
        Triple::new(3, 4, 5),
    );

    assert_eq!(delta, Some(36.0));
    assert_eq!(candidate.tour(0).visits(), vec![0, 4, 2]);
    assert_eq!(candidate.tour(1).visits(), vec![3, 1, 5]);
    assert_eq!(candidate.fitness, 24.0);
    assert_consistent(&problem, &objective, &candidate);

    // swapping back is worse and rejected
    let delta = objective.try_swap(
        &problem,
        &mut candidate,
        0,
        1,
        Triple::new(0, 4, 2),
        Triple::new(3, 1, 5),
    );
    assert_eq!(delta, None);
}

#[test]
fn test_seq_and_smaller_closed() {
    let problem = create_test_problem(integer_weights(5), 1000.0);
    let objective = CvrpObjective::default();
    let tour = Tour::from_visits(&[0, 1, 2, 3], TourEnd::Closed, 5);

    let sequences: Vec<Vec<usize>> = objective
        .seq_and_smaller(&problem, &tour, 1, 4)
        .map(|s| s.visits)
        .collect();

    assert_eq!(
        sequences,
        vec![
            vec![0, 1, 2],
            vec![1, 2, 3],
            vec![2, 3, 0],
            vec![0, 1, 2, 3],
            vec![1, 2, 3, 0],
        ]
    );
}

#[test]
fn test_seq_and_smaller_open() {
    let problem = create_test_problem(integer_weights(5), 1000.0);
    let objective = CvrpObjective::default();
    let tour = Tour::from_visits(&[0, 1, 2], TourEnd::Open, 5);

    let sequences: Vec<Seq> = objective.seq_and_smaller(&problem, &tour, 3, 10).collect();
    assert_eq!(sequences.len(), 1);
    assert_eq!(sequences[0].visits, vec![0, 1, 2]);
    assert_eq!(sequences[0].interior(), &[1]);
}

#[test]
fn test_seq_between() {
    let problem = Problem::new(
        "between".to_string(),
        integer_weights(5),
        Some(vec![1.0, 1.0, 1.0, 1.0, 1.0]),
        Capacity::new(metrics::TIME, 1000.0),
        None,
        None,
    )
    .unwrap();

    let seq = Seq::new(&problem, vec![0, 1, 2, 3]);
    assert_eq!(seq.between, problem.weight(1, 2) + 2.0);
    assert_eq!(seq.between_original, seq.between);
    assert_eq!(seq.first(), 0);
    assert_eq!(seq.last(), 3);
    assert_eq!(seq.interior(), &[1, 2]);
}

#[test]
fn test_reverse_is_unsupported() {
    let problem = create_test_problem(integer_weights(4), 1000.0);
    let objective = CvrpObjective::default();
    let seq = Seq::new(&problem, vec![0, 1, 2]);

    assert_eq!(
        objective.reverse(&problem, &seq),
        Err(SolverError::Unsupported("reversing a sequence"))
    );
}

#[test]
fn test_sequence_exchange_involution() {
    let problem = create_test_problem(integer_weights(8), 1000.0);
    let objective = CvrpObjective::default();
    let mut candidate = create_candidate(&problem, &objective, &[&[0, 1, 2, 3], &[4, 5, 6, 7]]);
    let original = candidate.clone();

    let seq1 = Seq::new(&problem, vec![0, 1, 2, 3]);
    let seq2 = Seq::new(&problem, vec![4, 5, 6, 7]);
    let exchange = SeqExchange::evaluate(&problem, &candidate, 0, 1, &seq1, &seq2).unwrap();
    exchange.apply(&problem, &mut candidate);

    assert_eq!(candidate.tour(0).visits(), vec![0, 5, 6, 3]);
    assert_eq!(candidate.tour(1).visits(), vec![4, 1, 2, 7]);
    assert_consistent(&problem, &objective, &candidate);

    let back1 = Seq::new(&problem, vec![0, 5, 6, 3]);
    let back2 = Seq::new(&problem, vec![4, 1, 2, 7]);
    let back = SeqExchange::evaluate(&problem, &candidate, 0, 1, &back1, &back2).unwrap();
    assert_eq!(back.delta, -exchange.delta);
    back.apply(&problem, &mut candidate);

    assert_eq!(candidate.tours, original.tours);
    assert_eq!(candidate.contents, original.contents);
    assert_eq!(candidate.fitness, original.fitness);
}

#[test]
fn test_try_move_seq() {
    // 1 and 2 sit next to 3 and 4 but are served by the first tour
    let weights = matrix(
        6,
        &[
            (0, 5, 1.0),
            (1, 2, 1.0),
            (3, 1, 1.0),
            (2, 4, 1.0),
            (3, 4, 10.0),
        ],
    );
    let problem = create_test_problem(weights, 1000.0);
    let objective = CvrpObjective::default();
    let mut candidate = create_candidate(&problem, &objective, &[&[0, 1, 2, 5], &[3, 4]]);

    let seq = Seq::new(&problem, vec![0, 1, 2, 5]);
    let delta = objective.try_move_seq(&problem, &mut candidate, 0, 1, &seq, Pair::new(3, 4));

    // removes 10 + 10 and 10, adds 1 and 1 + 1
    assert_eq!(delta, Some(27.0));
    assert_eq!(candidate.tour(0).visits(), vec![0, 5]);
    assert_eq!(candidate.tour(1).visits(), vec![3, 1, 2, 4]);
    assert_consistent(&problem, &objective, &candidate);
}

#[test]
fn test_try_swap_seq() {
    let weights = matrix(
        8,
        &[
            (0, 5, 1.0),
            (5, 6, 1.0),
            (6, 3, 1.0),
            (4, 1, 1.0),
            (1, 2, 1.0),
            (2, 7, 1.0),
        ],
    );
    let problem = create_test_problem(weights, 1000.0);
    let objective = CvrpObjective::default();
    let mut candidate = create_candidate(&problem, &objective, &[&[0, 1, 2, 3], &[4, 5, 6, 7]]);

    let seq1 = Seq::new(&problem, vec![0, 1, 2, 3]);
    let seq2 = Seq::new(&problem, vec![4, 5, 6, 7]);
    let delta = objective.try_swap_seq(&problem, &mut candidate, 0, 1, &seq1, &seq2);

    assert_eq!(delta, Some(36.0));
    assert_eq!(candidate.tour(0).visits(), vec![0, 5, 6, 3]);
    assert_eq!(candidate.tour(1).visits(), vec![4, 1, 2, 7]);
    assert_consistent(&problem, &objective, &candidate);
}

#[test]
fn test_open_tour_with_depot() {
    let problem = Problem::new(
        "depot".to_string(),
        integer_weights(4),
        None,
        Capacity::new(metrics::TIME, 1000.0),
        Some(0),
        Some(3),
    )
    .unwrap();
    let objective = CvrpObjective::default();

    assert_eq!(objective.potential_visits(&problem), vec![1, 2]);

    let (tour, content) = objective.open_tour(&problem, 1).unwrap();
    assert_eq!(tour.visits(), vec![0, 1, 3]);
    assert_eq!(content.weight, problem.weight(0, 1) + problem.weight(1, 3));
}

#[test]
fn test_seed_survives_insertions_next_to_the_depot() {
    let problem = Problem::new(
        "depot".to_string(),
        integer_weights(5),
        None,
        Capacity::new(metrics::TIME, 1000.0),
        Some(0),
        None,
    )
    .unwrap();
    let objective = CvrpObjective::default();

    let (mut tour, _) = objective.open_tour(&problem, 3).unwrap();
    assert_eq!(tour.seed(), 3);
    assert_eq!(tour_seed(&problem, &tour), 3);

    tour.insert_after(0, 1);
    tour.insert_after(3, 2);
    assert_eq!(tour.visits(), vec![0, 1, 3, 2]);
    assert_eq!(tour.seed(), 3);
    assert_eq!(tour_seed(&problem, &tour), 3);
}

#[test]
fn test_open_tour_over_capacity() {
    let problem = create_test_problem(matrix(3, &[]), 1000.0);
    let objective = CvrpObjective::default();
    assert!(objective.open_tour(&problem, 1).is_some());

    let costly = Problem::new(
        "costly".to_string(),
        matrix(3, &[]),
        Some(vec![0.0, 5.0, 0.0]),
        Capacity::new(metrics::TIME, 3.0),
        None,
        None,
    )
    .unwrap();
    assert!(objective.open_tour(&costly, 1).is_none());
}

#[test]
fn test_seed_next_marks_unplaceable() {
    let problem = Problem::new(
        "unplaceable".to_string(),
        matrix(3, &[]),
        Some(vec![5.0, 5.0, 5.0]),
        Capacity::new(metrics::TIME, 3.0),
        None,
        None,
    )
    .unwrap();
    let objective = CvrpObjective::default();
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let mut candidate = objective.new_solution(&problem);
    let mut visits = objective.potential_visits(&problem);

    assert_eq!(objective.seed_next(&problem, &mut candidate, &mut visits, &mut rng), None);
    assert!(visits.is_empty());
    assert_eq!(candidate.count(), 0);
    let mut unplaced = candidate.unplaced.clone();
    unplaced.sort_unstable();
    assert_eq!(unplaced, vec![0, 1, 2]);
    assert_eq!(candidate.fitness, Candidate::INFINITE);
    assert!(!candidate.is_feasible());
}

#[test]
fn test_seed_next_and_place() {
    let problem = create_test_problem(integer_weights(6), 1000.0);
    let objective = CvrpObjective::new(Box::new(RandomSeed), Box::new(AlwaysOverlaps), 0.0);
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let mut candidate = objective.new_solution(&problem);
    let mut visits = objective.potential_visits(&problem);

    let t = objective
        .seed_next(&problem, &mut candidate, &mut visits, &mut rng)
        .unwrap();
    assert_eq!(t, 0);
    assert_eq!(visits.len(), 5);

    while objective.try_place_any_in(&problem, &mut candidate, t, &mut visits) {}

    assert!(visits.is_empty());
    assert_eq!(candidate.tour(0).count(), 6);
    assert_consistent(&problem, &objective, &candidate);
}

#[test]
fn test_try_place_any_respects_capacity() {
    // a tour with one visit weighs 1, with two at least 8
    let problem = Problem::new(
        "tight".to_string(),
        matrix(
            4,
            &[
                (0, 1, 3.0),
                (0, 2, 3.0),
                (0, 3, 3.0),
                (1, 2, 3.0),
                (1, 3, 3.0),
                (2, 3, 3.0),
            ],
        ),
        Some(vec![1.0; 4]),
        Capacity::new(metrics::TIME, 5.0),
        None,
        None,
    )
    .unwrap();
    let objective = CvrpObjective::default();
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let mut candidate = objective.new_solution(&problem);
    let mut visits = objective.potential_visits(&problem);

    objective
        .seed_next(&problem, &mut candidate, &mut visits, &mut rng)
        .unwrap();
    assert!(!objective.try_place_any(&problem, &mut candidate, &mut visits));
    assert_eq!(visits.len(), 3);
    assert_eq!(candidate.tour(0).count(), 1);
}

#[test]
fn test_farthest_seed() {
    let problem = Problem::from_points(
        "line".to_string(),
        &[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (10.0, 0.0)],
        None,
        Capacity::new(metrics::DISTANCE, 1000.0),
    )
    .unwrap();
    let objective = CvrpObjective::new(Box::new(FarthestSeed), Box::new(AlwaysOverlaps), 0.5);
    let mut rng = ChaCha8Rng::seed_from_u64(11);
    let mut candidate = create_candidate(&problem, &objective, &[&[0]]);
    let mut visits = vec![1, 2, 3];

    let t = objective
        .seed_next(&problem, &mut candidate, &mut visits, &mut rng)
        .unwrap();
    assert_eq!(candidate.tour(t).first(), 3);
    assert_eq!(objective.name(), "CVRP_FARTHEST");
}
