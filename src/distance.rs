//! Dense pairwise distance matrix.

use crate::error::{Result, SolverError};
use crate::instance::Point;

/// Tolerance used when checking explicit matrices for symmetry.
const SYMMETRY_TOLERANCE: f64 = 1e-9;

/// An n×n distance matrix stored row-major in a single allocation.
///
/// The diagonal is always zero and, when built from coordinates, the matrix
/// is symmetric. It is never mutated after construction.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    data: Vec<f64>,
    size: usize,
}

impl DistanceMatrix {
    /// Compute the Euclidean distance matrix of an ordered point set.
    ///
    /// Fails with `InvalidInput` when `points` is empty, a coordinate is not
    /// finite, or the distances are too large to add up to a finite tour.
    pub fn from_points(points: &[Point]) -> Result<Self> {
        let n = points.len();
        if n == 0 {
            return Err(SolverError::invalid("at least one point is required"));
        }
        if let Some(p) = points.iter().find(|p| !p.x.is_finite() || !p.y.is_finite()) {
            return Err(SolverError::invalid(format!(
                "point {} has a non-finite coordinate ({}, {})",
                p.id, p.x, p.y
            )));
        }

        let mut data = vec![0.0; n * n];
        for i in 0..n {
            for j in (i + 1)..n {
                let d = points[i].distance_to(&points[j]);
                if !d.is_finite() {
                    return Err(SolverError::invalid(format!(
                        "distance between points {} and {} overflows",
                        points[i].id, points[j].id
                    )));
                }
                data[i * n + j] = d;
                data[j * n + i] = d;
            }
        }

        let matrix = DistanceMatrix { data, size: n };
        matrix.check_total()?;
        Ok(matrix)
    }

    /// Build a matrix from explicit row-major data.
    ///
    /// Any symmetric, non-negative matrix with a zero diagonal is accepted.
    pub fn from_data(size: usize, data: Vec<f64>) -> Result<Self> {
        if size == 0 {
            return Err(SolverError::invalid("distance matrix must have at least one row"));
        }
        if data.len() != size * size {
            return Err(SolverError::invalid(format!(
                "expected {} entries for a {}x{} matrix, got {}",
                size * size,
                size,
                size,
                data.len()
            )));
        }
        if let Some(pos) = data.iter().position(|d| !d.is_finite() || *d < 0.0) {
            return Err(SolverError::invalid(format!(
                "entry ({}, {}) is negative or not finite",
                pos / size,
                pos % size
            )));
        }

        let matrix = DistanceMatrix { data, size };
        for i in 0..size {
            if matrix.get(i, i) != 0.0 {
                return Err(SolverError::invalid(format!("diagonal entry {} is not zero", i)));
            }
        }
        if !matrix.is_symmetric(SYMMETRY_TOLERANCE) {
            return Err(SolverError::invalid("distance matrix is not symmetric"));
        }
        matrix.check_total()?;

        Ok(matrix)
    }

    /// The sum of all entries bounds every path and tour cost, so it must be finite.
    fn check_total(&self) -> Result<()> {
        let total: f64 = self.data.iter().sum();
        if !total.is_finite() {
            return Err(SolverError::invalid("distances are too large for a finite tour length"));
        }
        Ok(())
    }

    /// Distance from `from` to `to`.
    #[inline]
    pub fn get(&self, from: usize, to: usize) -> f64 {
        self.data[from * self.size + to]
    }

    /// Number of points covered by the matrix.
    #[inline]
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn row(&self, from: usize) -> &[f64] {
        &self.data[from * self.size..(from + 1) * self.size]
    }

    pub fn is_symmetric(&self, tol: f64) -> bool {
        for i in 0..self.size {
            for j in (i + 1)..self.size {
                if (self.get(i, j) - self.get(j, i)).abs() > tol {
                    return false;
                }
            }
        }
        true
    }

    /// Length of a closed tour, including the edge from the last point back to the first.
    pub fn tour_length(&self, tour: &[usize]) -> f64 {
        if tour.len() < 2 {
            return 0.0;
        }

        let mut length = 0.0;
        for pair in tour.windows(2) {
            length += self.get(pair[0], pair[1]);
        }

        length += self.get(tour[tour.len() - 1], tour[0]);

        length
    }

    /// Distances between distinct pairs `i < j`.
    pub fn pairwise(&self) -> impl Iterator<Item = f64> + '_ {
        (0..self.size).flat_map(move |i| ((i + 1)..self.size).map(move |j| self.get(i, j)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points(coords: &[(f64, f64)]) -> Vec<Point> {
        coords.iter().enumerate().map(|(i, &(x, y))| Point::new(i, x, y)).collect()
    }

    #[test]
    fn test_distance_calculation() {
        let matrix = DistanceMatrix::from_points(&points(&[(0.0, 0.0), (3.0, 4.0)])).unwrap();

        assert!((matrix.get(0, 1) - 5.0).abs() < 1e-10);
        assert!((matrix.get(1, 0) - 5.0).abs() < 1e-10);
        assert_eq!(matrix.get(0, 0), 0.0);
        assert_eq!(matrix.size(), 2);
    }

    #[test]
    fn test_symmetric_from_points() {
        let matrix = DistanceMatrix::from_points(&points(&[(0.0, 0.0), (3.0, 4.0), (-2.0, 7.5)])).unwrap();
        assert!(matrix.is_symmetric(0.0));
        for i in 0..3 {
            assert_eq!(matrix.get(i, i), 0.0);
        }
    }

    #[test]
    fn test_empty_points_rejected() {
        let err = DistanceMatrix::from_points(&[]).unwrap_err();
        assert!(matches!(err, SolverError::InvalidInput(_)));
    }

    #[test]
    fn test_non_finite_coordinate_rejected() {
        let err = DistanceMatrix::from_points(&points(&[(0.0, 0.0), (f64::NAN, 1.0)])).unwrap_err();
        assert!(matches!(err, SolverError::InvalidInput(_)));
    }

    #[test]
    fn test_large_finite_coordinates() {
        let matrix = DistanceMatrix::from_points(&points(&[(0.0, 0.0), (1e200, 0.0), (0.0, 1e200)])).unwrap();
        assert_eq!(matrix.get(0, 1), 1e200);
        assert!((matrix.get(1, 2) / (2f64.sqrt() * 1e200) - 1.0).abs() < 1e-12);

        // A single distance overflows.
        let err = DistanceMatrix::from_points(&points(&[(-1e308, 0.0), (1e308, 0.0)])).unwrap_err();
        assert!(matches!(err, SolverError::InvalidInput(_)));

        // Each distance fits but their sum does not.
        let err = DistanceMatrix::from_points(&points(&[(0.0, 0.0), (1e308, 0.0), (0.0, 1e308)])).unwrap_err();
        assert!(matches!(err, SolverError::InvalidInput(_)));

        let err = DistanceMatrix::from_data(2, vec![0.0, 1e308, 1e308, 0.0]).unwrap_err();
        assert!(matches!(err, SolverError::InvalidInput(_)));
    }

    #[test]
    fn test_from_data() {
        let matrix = DistanceMatrix::from_data(2, vec![0.0, 5.0, 5.0, 0.0]).unwrap();
        assert_eq!(matrix.get(0, 1), 5.0);
        assert_eq!(matrix.row(1), &[5.0, 0.0]);
    }

    #[test]
    fn test_from_data_rejects_bad_matrices() {
        assert!(DistanceMatrix::from_data(2, vec![0.0, 1.0, 2.0]).is_err());
        assert!(DistanceMatrix::from_data(2, vec![0.0, 1.0, 2.0, 0.0]).is_err());
        assert!(DistanceMatrix::from_data(2, vec![0.0, -1.0, -1.0, 0.0]).is_err());
        assert!(DistanceMatrix::from_data(2, vec![1.0, 1.0, 1.0, 0.0]).is_err());
        assert!(DistanceMatrix::from_data(0, vec![]).is_err());
    }

    #[test]
    fn test_tour_length() {
        let matrix = DistanceMatrix::from_points(&points(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)])).unwrap();
        assert!((matrix.tour_length(&[0, 1, 2, 3]) - 4.0).abs() < 1e-12);
        assert_eq!(matrix.tour_length(&[0]), 0.0);
        assert!((matrix.tour_length(&[0, 2]) - 2.0 * 2f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_pairwise_count() {
        let matrix = DistanceMatrix::from_points(&points(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)])).unwrap();
        assert_eq!(matrix.pairwise().count(), 6);
    }
}
