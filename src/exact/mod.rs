//! Exact solvers module.
//!
//! The Held-Karp pipeline runs in three strictly sequential stages: build the
//! distance matrix, fill the DP table, read the tour back out. Every call owns
//! its own matrix and table.

pub mod brute_force;
pub mod held_karp;
pub mod reconstruct;

pub use held_karp::DpTable;
pub use reconstruct::ReconstructionMode;

use std::time::Instant;

use crate::distance::DistanceMatrix;
use crate::error::{Result, SolverError};
use crate::instance::{Instance, Point};
use crate::solution::Solution;

/// Default ceiling on the number of points.
pub const DEFAULT_MAX_POINTS: usize = 20;

/// Hard ceiling; `max_points` above this is clamped.
pub const ABSOLUTE_MAX_POINTS: usize = 24;

#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// Largest accepted instance. Larger requests fail before any allocation.
    pub max_points: usize,
    pub reconstruction: ReconstructionMode,
    /// Use the layer-parallel relaxation
    pub parallel: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            max_points: DEFAULT_MAX_POINTS,
            reconstruction: ReconstructionMode::Predecessor,
            parallel: false,
        }
    }
}

impl SolverConfig {
    /// Ceiling actually enforced
    pub fn effective_max_points(&self) -> usize {
        self.max_points.min(ABSOLUTE_MAX_POINTS)
    }
}

/// Exact closed-tour solver based on Held-Karp dynamic programming.
pub struct HeldKarpSolver {
    pub config: SolverConfig,
}

impl HeldKarpSolver {
    pub fn new(config: SolverConfig) -> Self {
        HeldKarpSolver { config }
    }

    /// Solve an ordered point set; point 0 is the origin.
    pub fn solve_points(&self, points: &[Point]) -> Result<Solution> {
        self.check_capacity(points.len())?;
        let start = Instant::now();
        let dist = DistanceMatrix::from_points(points)?;
        log::debug!("Built {}x{} distance matrix in {:?}", dist.size(), dist.size(), start.elapsed());
        self.solve_matrix(&dist)
    }

    pub fn solve_instance(&self, instance: &Instance) -> Result<Solution> {
        self.solve_points(&instance.points)
    }

    /// Solve from a precomputed symmetric distance matrix.
    pub fn solve_matrix(&self, dist: &DistanceMatrix) -> Result<Solution> {
        let n = dist.size();
        self.check_capacity(n)?;
        let start = Instant::now();

        let mut table = DpTable::new(n)?;
        if self.config.parallel {
            table.relax_parallel(dist);
        } else {
            table.relax(dist);
        }
        log::debug!(
            "Relaxed {} DP states for n={} in {:?} (parallel: {})",
            table.num_states(),
            n,
            start.elapsed(),
            self.config.parallel
        );

        let (tour, length) = reconstruct::reconstruct(&table, dist, self.config.reconstruction)?;

        if self.config.reconstruction == ReconstructionMode::Legacy {
            if let Some((_, optimum)) = table.best_terminal(dist) {
                if length > optimum + 1e-9 * optimum.max(1.0) {
                    log::warn!(
                        "Legacy reconstruction returned length {:.4}, optimum is {:.4}",
                        length,
                        optimum
                    );
                }
            }
        }

        Ok(Solution {
            tour,
            length,
            algorithm: format!("HeldKarp-{}", self.config.reconstruction),
            computation_time: start.elapsed().as_secs_f64(),
            states: Some(table.num_states()),
        })
    }

    fn check_capacity(&self, n: usize) -> Result<()> {
        if n == 0 {
            return Err(SolverError::invalid("at least one point is required"));
        }
        let max = self.config.effective_max_points();
        if n > max {
            return Err(SolverError::CapacityExceeded { points: n, max });
        }
        Ok(())
    }
}

impl Default for HeldKarpSolver {
    fn default() -> Self {
        Self::new(SolverConfig::default())
    }
}

/// Solve with the default configuration.
pub fn solve(points: &[Point]) -> Result<Solution> {
    HeldKarpSolver::default().solve_points(points)
}

/// Exhaustive search wrapped in a [`Solution`].
pub fn solve_brute_force(dist: &DistanceMatrix) -> Result<Solution> {
    let start = Instant::now();
    let (tour, length) = brute_force::solve(dist)?;
    Ok(Solution {
        tour,
        length,
        algorithm: "BruteForce".to_string(),
        computation_time: start.elapsed().as_secs_f64(),
        states: None,
    })
}
