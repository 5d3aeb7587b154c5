//! Utility functions and structures for reporting on a search.

use std::fmt;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::time::Duration;

use crate::candidate::Candidate;
use crate::problem::Problem;

/// Format a duration as hours, minutes, and seconds.
pub fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs();
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    format!("{}h {:02}m {:02}s", hours, minutes, seconds)
}

/// A plain-text tour listing of a candidate.
pub struct CandidateListing<'a> {
    pub candidate: &'a Candidate,
    pub problem: &'a Problem,
}

impl fmt::Display for CandidateListing<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (candidate, problem) = (self.candidate, self.problem);

        writeln!(f, "CVRP solution for instance: {}", problem.name)?;
        writeln!(f, "Total weight: {:.2}", candidate.fitness)?;
        writeln!(f, "Is feasible: {}", candidate.is_feasible())?;
        writeln!(f, "Number of tours: {}", candidate.count())?;

        for (i, (tour, content)) in candidate.tours.iter().zip(&candidate.contents).enumerate() {
            let mut visits: Vec<String> = tour.iter().map(|v| v.to_string()).collect();
            if tour.is_closed() {
                visits.push(tour.first().to_string());
            }
            writeln!(f)?;
            writeln!(f, "Tour #{}: {}", i + 1, visits.join(" -> "))?;
            writeln!(
                f,
                "  Weight: {:.2} / {:.2}",
                content.weight, problem.capacity.max
            )?;
            let constraints = problem.capacity.constraints.iter();
            for (constraint, quantity) in constraints.zip(&content.quantities) {
                writeln!(
                    f,
                    "  {}: {:.2} / {:.2}",
                    constraint.metric, quantity, constraint.max
                )?;
            }
        }

        if !candidate.unplaced.is_empty() {
            writeln!(f)?;
            writeln!(f, "Unplaced: {:?}", candidate.unplaced)?;
        }

        Ok(())
    }
}

/// Render a candidate as a plain-text tour listing.
pub fn format_candidate(candidate: &Candidate, problem: &Problem) -> String {
    CandidateListing { candidate, problem }.to_string()
}

/// Save a candidate to a file.
pub fn save_candidate<P: AsRef<Path>>(
    candidate: &Candidate,
    problem: &Problem,
    path: P,
) -> std::io::Result<()> {
    let mut file = File::create(path)?;
    write!(file, "{}", CandidateListing { candidate, problem })
}

/// Statistics about a finished search.
#[derive(Debug, Clone)]
pub struct SearchStatistics {
    pub generations: usize,
    pub runtime: Duration,
    pub best_fitness: f64,
    pub best_is_feasible: bool,
    pub best_tours: usize,
    pub population_size: usize,
    pub improvements: usize,
}

impl SearchStatistics {
    /// Format the statistics as a string.
    pub fn format(&self) -> String {
        format!(
            "Search Statistics:
- Generations: {}
- Runtime: {}
- Best Fitness: {:.2}
- Best Feasible: {}
- Best Tours: {}
- Population Size: {}
- Improvements: {}",
            self.generations,
            format_duration(self.runtime),
            self.best_fitness,
            self.best_is_feasible,
            self.best_tours,
            self.population_size,
            self.improvements
        )
    }
}
