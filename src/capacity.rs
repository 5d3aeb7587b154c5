//! Capacity constraints and the per-tour content they track.

use serde::{Deserialize, Serialize};

/// Default metric names.
pub mod metrics {
    pub const TIME: &str = "time";
    pub const DISTANCE: &str = "distance";
    pub const WEIGHT: &str = "weight";
    pub const COUNT: &str = "count";
}

/// Aggregate state of one tour: its weight and the usage of every constraint.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Content {
    /// Travel plus visit costs along the tour.
    pub weight: f64,
    /// Usage per capacity constraint, in constraint order.
    pub quantities: Vec<f64>,
}

/// A limit on a per-visit metric, e.g. parcel weight or the number of stops.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CapacityConstraint {
    pub metric: String,
    pub max: f64,
    /// The amount of the metric each visit consumes.
    pub values: Vec<f64>,
}

impl CapacityConstraint {
    pub fn new(metric: impl Into<String>, max: f64, values: Vec<f64>) -> Self {
        CapacityConstraint {
            metric: metric.into(),
            max,
            values,
        }
    }

    #[inline]
    fn value(&self, visit: usize) -> f64 {
        self.values[visit]
    }

    fn sum(&self, visits: &[usize]) -> f64 {
        visits.iter().map(|&v| self.value(v)).sum()
    }
}

/// Check/commit operations on a tour's [`Content`].
///
/// Every check leaves the content untouched; only the commit operations mutate.
pub trait CapacityTracker {
    /// Content of a new tour without any visits.
    fn empty(&self) -> Content;

    /// Returns true if the weight respects the weight-bearing metric.
    fn weight_fits(&self, weight: f64) -> bool;

    /// Fast pre-check before trying to insert a visit.
    fn can_add(&self, content: &Content, visit: usize) -> bool {
        self.can_add_all(content, &[visit])
    }

    /// Returns true if all given visits can be added together.
    fn can_add_all(&self, content: &Content, visits: &[usize]) -> bool;

    fn add(&self, content: &mut Content, visit: usize);

    fn remove(&self, content: &mut Content, visit: usize);

    /// Validates `new_weight` and the usage after adding `visit`; commits both
    /// only if everything fits.
    fn update_and_check_costs(&self, content: &mut Content, new_weight: f64, visit: usize)
        -> bool;

    /// Returns true if `removed` can be replaced by `added` in the tour.
    fn exchange_is_possible(&self, content: &Content, removed: &[usize], added: &[usize])
        -> bool;

    fn update_exchange(&self, content: &mut Content, removed: &[usize], added: &[usize]);

    /// Recompute all usage from scratch for the given visits.
    fn update_costs<I: IntoIterator<Item = usize>>(&self, content: &mut Content, visits: I);
}

/// The capacity of a vehicle: a maximum on the tour weight plus any number
/// of per-visit metric constraints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Capacity {
    /// Name of the weight-bearing metric, usually time.
    pub metric: String,
    /// Maximum tour weight.
    pub max: f64,
    pub constraints: Vec<CapacityConstraint>,
}

impl Capacity {
    pub fn new(metric: impl Into<String>, max: f64) -> Self {
        Capacity {
            metric: metric.into(),
            max,
            constraints: Vec::new(),
        }
    }

    /// Add a constraint on a per-visit metric.
    pub fn with_constraint(mut self, constraint: CapacityConstraint) -> Self {
        self.constraints.push(constraint);
        self
    }

    /// Returns true if every limit holds for the given content.
    pub fn is_respected(&self, content: &Content) -> bool {
        self.weight_fits(content.weight)
            && self
                .constraints
                .iter()
                .zip(&content.quantities)
                .all(|(c, &q)| q <= c.max)
    }
}

impl CapacityTracker for Capacity {
    fn empty(&self) -> Content {
        Content {
            weight: 0.0,
            quantities: vec![0.0; self.constraints.len()],
        }
    }

    fn weight_fits(&self, weight: f64) -> bool {
        weight <= self.max
    }

    fn can_add_all(&self, content: &Content, visits: &[usize]) -> bool {
        self.constraints
            .iter()
            .zip(&content.quantities)
            .all(|(c, &q)| q + c.sum(visits) <= c.max)
    }

    fn add(&self, content: &mut Content, visit: usize) {
        for (c, q) in self.constraints.iter().zip(content.quantities.iter_mut()) {
            *q += c.value(visit);
        }
    }

    fn remove(&self, content: &mut Content, visit: usize) {
        for (c, q) in self.constraints.iter().zip(content.quantities.iter_mut()) {
            *q -= c.value(visit);
        }
    }

    fn update_and_check_costs(
        &self,
        content: &mut Content,
        new_weight: f64,
        visit: usize,
    ) -> bool {
        if !self.weight_fits(new_weight) || !self.can_add(content, visit) {
            return false;
        }
        content.weight = new_weight;
        self.add(content, visit);
        true
    }

    fn exchange_is_possible(
        &self,
        content: &Content,
        removed: &[usize],
        added: &[usize],
    ) -> bool {
        self.constraints
            .iter()
            .zip(&content.quantities)
            .all(|(c, &q)| q - c.sum(removed) + c.sum(added) <= c.max)
    }

    fn update_exchange(&self, content: &mut Content, removed: &[usize], added: &[usize]) {
        for (c, q) in self.constraints.iter().zip(content.quantities.iter_mut()) {
            *q = *q - c.sum(removed) + c.sum(added);
        }
    }

    fn update_costs<I: IntoIterator<Item = usize>>(&self, content: &mut Content, visits: I) {
        content.quantities = vec![0.0; self.constraints.len()];
        for visit in visits {
            self.add(content, visit);
        }
    }
}
