//! Unit tests for the genetic operators and the population.

use ga_cvrp::capacity::{metrics, Capacity, CapacityConstraint};
use ga_cvrp::construction::{PlacementMode, SeededCheapestInsertion};
use ga_cvrp::genetic::{
    CrossoverOperator, Generator, MutationOperator, RedoPlacement, TourExchangeCrossover,
};
use ga_cvrp::local_search::LocalSearch;
use ga_cvrp::objective::CvrpObjective;
use ga_cvrp::population::{Population, SelectionOperator, TournamentSelection};
use ga_cvrp::tour::{Tour, TourEnd};
use ga_cvrp::{Candidate, Config, Problem};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// A depot at the centre and 16 visits on a 4x4 grid, 5 units of load per tour.
fn create_test_problem() -> Problem {
    let mut points = vec![(15.0, 15.0)];
    let mut demands = vec![0.0];
    for i in 0..4 {
        for j in 0..4 {
            points.push((i as f64 * 10.0, j as f64 * 10.0));
            demands.push(1.0 + ((i + j) % 2) as f64);
        }
    }

    let capacity = Capacity::new(metrics::DISTANCE, 500.0)
        .with_constraint(CapacityConstraint::new(metrics::WEIGHT, 5.0, demands));
    let euclidean = Problem::from_points("grid".to_string(), &points, None, capacity).unwrap();

    Problem::new(
        euclidean.name,
        euclidean.weights,
        None,
        euclidean.capacity,
        Some(0),
        Some(0),
    )
    .unwrap()
}

fn create_heuristic() -> SeededCheapestInsertion {
    SeededCheapestInsertion::new(PlacementMode::LastTour, 0.03, 0.25)
        .with_local_search(LocalSearch::default())
}

fn create_candidates(problem: &Problem, objective: &CvrpObjective, count: u64) -> Vec<Candidate> {
    let heuristic = create_heuristic();
    (0..count)
        .map(|seed| heuristic.generate(problem, objective, &mut ChaCha8Rng::seed_from_u64(seed)))
        .collect()
}

fn assert_valid(problem: &Problem, objective: &CvrpObjective, candidate: &Candidate) {
    let mut served: Vec<usize> = candidate
        .tours
        .iter()
        .flat_map(|t| t.visits())
        .filter(|&v| !problem.is_fixed(v))
        .chain(candidate.unplaced.iter().copied())
        .collect();
    served.sort_unstable();
    assert_eq!(served, objective.potential_visits(problem));

    for (t, tour) in candidate.tours.iter().enumerate() {
        let expected = objective.content_of(problem, tour);
        assert!((candidate.content(t).weight - expected.weight).abs() < 1e-6);
        assert_eq!(candidate.content(t).quantities, expected.quantities);
        assert!(problem.capacity.is_respected(candidate.content(t)));
    }
    assert!(candidate.is_feasible());
    assert!((candidate.fitness - objective.calculate(problem, candidate)).abs() < 1e-6);
}

#[test]
fn test_tour_exchange_crossover() {
    let problem = create_test_problem();
    let objective = CvrpObjective::default();
    let parents = create_candidates(&problem, &objective, 2);
    let crossover = TourExchangeCrossover::new(create_heuristic());
    let mut rng = ChaCha8Rng::seed_from_u64(10);

    assert_eq!(crossover.name(), "CROSS_EX_TOURS");

    for _ in 0..10 {
        let child = crossover.crossover(&problem, &objective, &parents[0], &parents[1], &mut rng);
        assert_valid(&problem, &objective, &child);
    }
}

#[test]
fn test_crossover_of_identical_parents() {
    let problem = create_test_problem();
    let objective = CvrpObjective::default();
    let mut parent = create_candidates(&problem, &objective, 1).remove(0);
    // drop tours emptied by the local search
    let mut t = 0;
    while t < parent.count() {
        if parent.tour(t).visits().iter().all(|&v| problem.is_fixed(v)) {
            parent.remove_tour(t);
        } else {
            t += 1;
        }
    }
    parent.update_fitness();
    let crossover = TourExchangeCrossover::new(create_heuristic());
    let mut rng = ChaCha8Rng::seed_from_u64(1);

    // every tour of the parent is copied as a whole
    let child = crossover.crossover(&problem, &objective, &parent, &parent, &mut rng);
    assert_valid(&problem, &objective, &child);
    assert_eq!(child.count(), parent.count());
    assert!((child.fitness - parent.fitness).abs() < 1e-6);
}

/// A candidate of closed depot tours with exact contents.
fn create_candidate(problem: &Problem, objective: &CvrpObjective, tours: &[&[usize]]) -> Candidate {
    let mut candidate = Candidate::new();
    for visits in tours {
        let mut all = vec![0];
        all.extend_from_slice(visits);
        let tour = Tour::from_visits(&all, TourEnd::Closed, problem.len());
        let content = objective.content_of(problem, &tour);
        candidate.add_tour(tour, content);
    }
    candidate.update_fitness();
    candidate
}

/// Two parents without a tour in common: groups of visits and single visits.
fn create_disjoint_parents(problem: &Problem, objective: &CvrpObjective) -> (Candidate, Candidate) {
    let groups: [&[usize]; 6] = [
        &[1, 2, 3],
        &[4, 5, 6],
        &[7, 8, 9],
        &[10, 11, 12],
        &[13, 14],
        &[15, 16],
    ];
    let singles: Vec<[usize; 1]> = (1..=16).map(|v| [v]).collect();
    let singles: Vec<&[usize]> = singles.iter().map(|v| &v[..]).collect();

    (
        create_candidate(problem, objective, &groups),
        create_candidate(problem, objective, &singles),
    )
}

fn sorted_tours(candidate: &Candidate) -> Vec<Vec<usize>> {
    let mut tours = candidate.tour_visits();
    tours.sort();
    tours
}

#[test]
fn test_crossover_copies_from_first_parent() {
    let problem = create_test_problem();
    let objective = CvrpObjective::default();
    let (parent1, parent2) = create_disjoint_parents(&problem, &objective);
    let crossover = TourExchangeCrossover::new(create_heuristic());
    assert!(!crossover.use_second_parent);

    for seed in 0..5 {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let child = crossover.crossover(&problem, &objective, &parent1, &parent2, &mut rng);

        assert_valid(&problem, &objective, &child);
        assert_eq!(sorted_tours(&child), sorted_tours(&parent1));
    }
}

#[test]
fn test_crossover_with_second_parent() {
    let problem = create_test_problem();
    let objective = CvrpObjective::default();
    let (parent1, parent2) = create_disjoint_parents(&problem, &objective);
    let config = Config::new().with_crossover_second_parent(true);
    let crossover = TourExchangeCrossover::from_config(&config).with_post(LocalSearch::new(4, 0));
    let mut rng = ChaCha8Rng::seed_from_u64(6);

    assert!(crossover.use_second_parent);
    let child = crossover.crossover(&problem, &objective, &parent1, &parent2, &mut rng);

    // a single-visit tour can only come from the second parent
    assert_valid(&problem, &objective, &child);
    assert!(child.tours.iter().any(|t| t.count() == 2));
}

#[test]
fn test_crossover_with_post_local_search() {
    let problem = create_test_problem();
    let objective = CvrpObjective::default();
    let parents = create_candidates(&problem, &objective, 2);
    let crossover = TourExchangeCrossover::from_config(&Config::default());
    let mut rng = ChaCha8Rng::seed_from_u64(5);

    assert!(crossover.post.is_some());
    let child = crossover.crossover(&problem, &objective, &parents[0], &parents[1], &mut rng);
    assert_valid(&problem, &objective, &child);
}

#[test]
fn test_redo_placement() {
    let problem = create_test_problem();
    let objective = CvrpObjective::default();
    let mutation = RedoPlacement::new(create_heuristic(), 2);
    let mut rng = ChaCha8Rng::seed_from_u64(3);

    assert_eq!(mutation.name(), "REDO_SCI");

    for mut candidate in create_candidates(&problem, &objective, 5) {
        let before = candidate.fitness;
        let improved = mutation.mutate(&problem, &objective, &mut candidate, &mut rng);

        assert_eq!(improved, candidate.fitness < before);
        assert_valid(&problem, &objective, &candidate);
    }
}

#[test]
fn test_redo_placement_reverts_on_worse() {
    let problem = create_test_problem();
    let objective = CvrpObjective::default();
    let config = Config::new()
        .with_tour_remove_count(3)
        .with_revert_failed_mutation(true);
    let mutation = RedoPlacement::from_config(&config);
    let mut rng = ChaCha8Rng::seed_from_u64(8);

    assert!(mutation.revert_on_worse);
    assert_eq!(mutation.tour_remove_count, 3);

    for mut candidate in create_candidates(&problem, &objective, 5) {
        let before = candidate.fitness;
        mutation.mutate(&problem, &objective, &mut candidate, &mut rng);

        assert!(candidate.fitness <= before);
        assert_valid(&problem, &objective, &candidate);
    }
}

#[test]
fn test_redo_placement_removes_all_tours() {
    let problem = create_test_problem();
    let objective = CvrpObjective::default();
    let mutation = RedoPlacement::new(create_heuristic(), 100);
    let mut rng = ChaCha8Rng::seed_from_u64(4);

    let mut candidate = create_candidates(&problem, &objective, 1).remove(0);
    mutation.mutate(&problem, &objective, &mut candidate, &mut rng);
    assert_valid(&problem, &objective, &candidate);
}

#[test]
fn test_tournament_selection() {
    let problem = create_test_problem();
    let objective = CvrpObjective::default();
    let population = Population::new(create_candidates(&problem, &objective, 6));
    let selection = TournamentSelection::new(population.len() * 4);
    let mut rng = ChaCha8Rng::seed_from_u64(2);

    assert_eq!(selection.name(), "TOURNAMENT");

    let best = population.best_index().unwrap();
    for _ in 0..20 {
        let (parent1, parent2) = population.select_parents(&selection, &mut rng).unwrap();
        assert_ne!(parent1, parent2);
        assert!(parent1 < population.len());
        assert!(parent2 < population.len());
    }

    // the excluded candidate is never returned
    for _ in 0..20 {
        let selected = selection.select(&population, Some(best), &mut rng).unwrap();
        assert_ne!(selected, best);
    }
}

#[test]
fn test_selection_on_small_populations() {
    let selection = TournamentSelection::new(3);
    let mut rng = ChaCha8Rng::seed_from_u64(0);

    let empty = Population::new(Vec::new());
    assert!(empty.is_empty());
    assert_eq!(empty.select_parents(&selection, &mut rng), None);

    let single = Population::new(vec![Candidate::new()]);
    assert_eq!(single.select_parents(&selection, &mut rng), Some((0, 0)));
}

#[test]
fn test_replace_worst() {
    let problem = create_test_problem();
    let objective = CvrpObjective::default();
    let mut population = Population::new(create_candidates(&problem, &objective, 4));

    let worst = population.worst_index().unwrap();
    let worst_fitness = population.get(worst).fitness;

    // a clone of an existing candidate never enters
    let best = population.best().unwrap().clone();
    assert!(!population.replace_worst(best));

    // neither does a worse candidate
    let mut worse = population.get(worst).clone();
    worse.fitness = worst_fitness + 1.0;
    assert!(!population.replace_worst(worse));

    let mut better = Candidate::new();
    better.fitness = 1.0;
    assert!(population.replace_worst(better));
    assert_eq!(population.len(), 4);
    assert_eq!(population.best().unwrap().fitness, 1.0);
}
