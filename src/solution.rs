//! Solution representation for closed tours.
//!
//! A solution is an ordered visiting sequence starting at the origin, read as
//! a cycle, together with its total length and some bookkeeping about how it
//! was produced.

use crate::distance::DistanceMatrix;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Represents a solved tour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Solution {
    /// The tour as a sequence of point indices, starting at 0; the return edge is implicit
    pub tour: Vec<usize>,
    /// Total length including the closing edge
    pub length: f64,
    /// Algorithm that generated this solution
    pub algorithm: String,
    /// Computation time in seconds
    pub computation_time: f64,
    /// Number of DP states allocated (if applicable)
    pub states: Option<usize>,
}

/// One edge of a tour
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Leg {
    pub from: usize,
    pub to: usize,
    pub distance: f64,
}

impl Solution {
    /// Create a solution from a tour, computing its length from the matrix
    pub fn from_tour(dist: &DistanceMatrix, tour: Vec<usize>, algorithm: &str) -> Self {
        let length = dist.tour_length(&tour);
        Solution {
            tour,
            length,
            algorithm: algorithm.to_string(),
            computation_time: 0.0,
            states: None,
        }
    }

    /// Number of points in the tour
    pub fn len(&self) -> usize {
        self.tour.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tour.is_empty()
    }

    /// Check the tour is a permutation of `0..n` beginning with 0
    pub fn is_complete(&self, n: usize) -> bool {
        if self.tour.len() != n || self.tour.first() != Some(&0) {
            return false;
        }

        let unique: HashSet<usize> = self.tour.iter().cloned().collect();
        unique.len() == n && self.tour.iter().all(|&p| p < n)
    }

    /// Length recomputed edge by edge from the matrix
    pub fn recompute_length(&self, dist: &DistanceMatrix) -> f64 {
        dist.tour_length(&self.tour)
    }

    /// Every edge of the cycle, ending with the return to the origin.
    ///
    /// A single-point tour has no legs.
    pub fn legs(&self, dist: &DistanceMatrix) -> Vec<Leg> {
        if self.tour.len() < 2 {
            return Vec::new();
        }
        (0..self.tour.len())
            .map(|i| {
                let from = self.tour[i];
                let to = self.tour[(i + 1) % self.tour.len()];
                Leg { from, to, distance: dist.get(from, to) }
            })
            .collect()
    }

    /// Get the position of a point in the tour
    pub fn position(&self, point: usize) -> Option<usize> {
        self.tour.iter().position(|&p| p == point)
    }

    /// Get the point at a given position (circular); `None` for an empty tour
    pub fn node_at(&self, pos: usize) -> Option<usize> {
        if self.tour.is_empty() {
            return None;
        }
        Some(self.tour[pos % self.tour.len()])
    }

    /// Get the successor of a point in the tour
    pub fn successor(&self, point: usize) -> Option<usize> {
        self.position(point).and_then(|pos| self.node_at(pos + 1))
    }

    /// Get the predecessor of a point in the tour
    pub fn predecessor(&self, point: usize) -> Option<usize> {
        self.position(point).map(|pos| {
            if pos == 0 {
                self.tour[self.tour.len() - 1]
            } else {
                self.tour[pos - 1]
            }
        })
    }

    /// Whether two solutions describe the same cycle, in either direction
    pub fn same_cycle(&self, other: &Solution) -> bool {
        if self.tour.len() != other.tour.len() || self.tour.first() != other.tour.first() {
            return false;
        }
        if self.tour == other.tour {
            return true;
        }
        let mut reversed = other.tour.clone();
        reversed[1..].reverse();
        self.tour == reversed
    }
}

impl std::fmt::Display for Solution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Solution ({})", self.algorithm)?;
        writeln!(f, "  Length: {:.2}", self.length)?;
        writeln!(f, "  Time: {:.4}s", self.computation_time)?;
        if let Some(states) = self.states {
            writeln!(f, "  DP states: {}", states)?;
        }
        writeln!(f, "  Tour: {:?}", self.tour)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::Instance;

    fn square() -> DistanceMatrix {
        Instance::from_coordinates("square", &[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)])
            .distance_matrix()
            .unwrap()
    }

    #[test]
    fn test_from_tour() {
        let dist = square();
        let sol = Solution::from_tour(&dist, vec![0, 1, 2, 3], "test");
        assert!((sol.length - 4.0).abs() < 1e-12);
        assert!(sol.is_complete(4));
        assert_eq!(sol.states, None);
    }

    #[test]
    fn test_is_complete() {
        let dist = square();
        assert!(!Solution::from_tour(&dist, vec![1, 0, 2, 3], "t").is_complete(4));
        assert!(!Solution::from_tour(&dist, vec![0, 1, 1, 3], "t").is_complete(4));
        assert!(!Solution::from_tour(&dist, vec![0, 1, 2], "t").is_complete(4));
    }

    #[test]
    fn test_legs_close_the_cycle() {
        let dist = square();
        let sol = Solution::from_tour(&dist, vec![0, 1, 2, 3], "test");
        let legs = sol.legs(&dist);
        assert_eq!(legs.len(), 4);
        assert_eq!(legs[3], Leg { from: 3, to: 0, distance: 1.0 });
        let total: f64 = legs.iter().map(|l| l.distance).sum();
        assert!((total - sol.length).abs() < 1e-12);
    }

    #[test]
    fn test_neighbours() {
        let dist = square();
        let sol = Solution::from_tour(&dist, vec![0, 2, 1, 3], "test");
        assert_eq!(sol.successor(3), Some(0));
        assert_eq!(sol.predecessor(0), Some(3));
        assert_eq!(sol.successor(2), Some(1));
        assert_eq!(sol.position(7), None);
        assert_eq!(sol.node_at(5), Some(2));
    }

    #[test]
    fn test_empty_tour_has_no_neighbours() {
        let dist = square();
        let sol = Solution::from_tour(&dist, Vec::new(), "empty");
        assert!(sol.is_empty());
        assert_eq!(sol.node_at(0), None);
        assert_eq!(sol.successor(0), None);
        assert_eq!(sol.predecessor(0), None);
        assert!(sol.legs(&dist).is_empty());
    }

    #[test]
    fn test_same_cycle() {
        let dist = square();
        let a = Solution::from_tour(&dist, vec![0, 1, 2, 3], "a");
        let b = Solution::from_tour(&dist, vec![0, 3, 2, 1], "b");
        let c = Solution::from_tour(&dist, vec![0, 2, 1, 3], "c");
        assert!(a.same_cycle(&b));
        assert!(!a.same_cycle(&c));
    }
}
