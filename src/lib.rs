//! Exact TSP Solver Library
//!
//! Computes a minimum-length closed tour over a small set of 2-D points,
//! starting and ending at point 0, using Held-Karp bitmask dynamic
//! programming.
//!
//! # Features
//!
//! - Dense distance matrix built from coordinates or explicit symmetric data
//! - Held-Karp relaxation over a single contiguous DP table, serial or layer-parallel
//! - Tour reconstruction by stored predecessors, by recomputation, or in a
//!   compatibility mode matching the canvas front end
//! - Brute-force reference solver for cross-checking small instances
//! - Turn-by-turn directions, benchmarking and CSV export
//!
//! # Example
//!
//! ```
//! use exact_tsp_solver::instance::Instance;
//! use exact_tsp_solver::exact::HeldKarpSolver;
//!
//! let instance = Instance::parse_inline("0,0 1,0 1,1 0,1", None).unwrap();
//! let solution = HeldKarpSolver::default().solve_instance(&instance).unwrap();
//!
//! assert_eq!(solution.tour[0], 0);
//! assert!((solution.length - 4.0).abs() < 1e-9);
//! ```

pub mod error;
pub mod instance;
pub mod distance;
pub mod solution;
pub mod exact;
pub mod directions;
pub mod benchmark;

pub use error::SolverError;
pub use distance::DistanceMatrix;
pub use exact::{solve, HeldKarpSolver, ReconstructionMode, SolverConfig};
pub use instance::{Instance, Point};
pub use solution::Solution;
