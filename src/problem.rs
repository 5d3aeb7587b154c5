//! Problem definition for the CVRP.

use crate::capacity::Capacity;
use crate::error::SolverError;
use serde::{Deserialize, Serialize};

/// An immutable CVRP instance.
///
/// Visits are identified by their index in the weight matrix. The matrix holds
/// directed edge costs, `weights[from][to]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Problem {
    pub name: String,
    pub weights: Vec<Vec<f64>>,
    pub visit_costs: Option<Vec<f64>>,
    pub capacity: Capacity,
    pub departure: Option<usize>,
    pub arrival: Option<usize>,
}

impl Problem {
    /// Create a new problem, validating its dimensions.
    pub fn new(
        name: String,
        weights: Vec<Vec<f64>>,
        visit_costs: Option<Vec<f64>>,
        capacity: Capacity,
        departure: Option<usize>,
        arrival: Option<usize>,
    ) -> Result<Self, SolverError> {
        let problem = Problem {
            name,
            weights,
            visit_costs,
            capacity,
            departure,
            arrival,
        };
        problem.validate()?;
        Ok(problem)
    }

    /// Create a problem from planar coordinates using Euclidean distances.
    pub fn from_points(
        name: String,
        points: &[(f64, f64)],
        visit_costs: Option<Vec<f64>>,
        capacity: Capacity,
    ) -> Result<Self, SolverError> {
        let weights = Self::compute_distance_matrix(points);
        Problem::new(name, weights, visit_costs, capacity, None, None)
    }

    fn validate(&self) -> Result<(), SolverError> {
        let n = self.weights.len();
        if n == 0 {
            return Err(SolverError::InvalidProblem(
                "the weight matrix is empty".to_string(),
            ));
        }
        for (i, row) in self.weights.iter().enumerate() {
            if row.len() != n {
                return Err(SolverError::InvalidProblem(format!(
                    "row {} of the weight matrix has {} entries, expected {}",
                    i,
                    row.len(),
                    n
                )));
            }
            if row.iter().any(|w| w.is_nan()) {
                return Err(SolverError::InvalidProblem(format!(
                    "row {} of the weight matrix contains NaN",
                    i
                )));
            }
        }
        if let Some(costs) = &self.visit_costs {
            if costs.len() != n {
                return Err(SolverError::InvalidProblem(format!(
                    "{} visit costs given for {} visits",
                    costs.len(),
                    n
                )));
            }
            if costs.iter().any(|c| c.is_nan()) {
                return Err(SolverError::InvalidProblem(
                    "visit costs contain NaN".to_string(),
                ));
            }
        }
        for constraint in &self.capacity.constraints {
            if constraint.values.len() != n {
                return Err(SolverError::InvalidProblem(format!(
                    "constraint '{}' has {} values for {} visits",
                    constraint.metric,
                    constraint.values.len(),
                    n
                )));
            }
        }
        if let Some(departure) = self.departure {
            if departure >= n {
                return Err(SolverError::InvalidProblem(format!(
                    "departure {} out of range",
                    departure
                )));
            }
        }
        match (self.departure, self.arrival) {
            (None, Some(_)) => Err(SolverError::InvalidProblem(
                "an arrival requires a departure".to_string(),
            )),
            (_, Some(arrival)) if arrival >= n => Err(SolverError::InvalidProblem(format!(
                "arrival {} out of range",
                arrival
            ))),
            _ => Ok(()),
        }
    }

    /// Number of visits, including a fixed departure or arrival.
    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    /// Travel cost of the edge `from -> to`.
    #[inline]
    pub fn weight(&self, from: usize, to: usize) -> f64 {
        self.weights[from][to]
    }

    /// Standalone cost of a visit, zero when the problem has none.
    #[inline]
    pub fn visit_cost(&self, visit: usize) -> f64 {
        match &self.visit_costs {
            Some(costs) => costs[visit],
            None => 0.0,
        }
    }

    /// Returns true if the visit is a fixed departure or arrival.
    pub fn is_fixed(&self, visit: usize) -> bool {
        self.departure == Some(visit) || self.arrival == Some(visit)
    }

    /// The `k` visits closest to `visit` (by round-trip cost), excluding fixed visits.
    pub fn nearest_neighbours(&self, visit: usize, k: usize) -> Vec<usize> {
        let mut distances: Vec<(usize, f64)> = (0..self.len())
            .filter(|&other| other != visit && !self.is_fixed(other))
            .map(|other| (other, self.weight(visit, other) + self.weight(other, visit)))
            .collect();

        distances.sort_by(|a, b| a.1.total_cmp(&b.1));
        distances.truncate(k);

        distances.into_iter().map(|(idx, _)| idx).collect()
    }

    /// Generate the full Euclidean distance matrix for the given points.
    fn compute_distance_matrix(points: &[(f64, f64)]) -> Vec<Vec<f64>> {
        let n = points.len();
        let mut matrix = vec![vec![0.0; n]; n];

        for i in 0..n {
            for j in 0..n {
                if i != j {
                    let dx = points[i].0 - points[j].0;
                    let dy = points[i].1 - points[j].1;
                    matrix[i][j] = (dx * dx + dy * dy).sqrt();
                }
            }
        }

        matrix
    }
}
