//! Exhaustive reference solver.
//!
//! Enumerates all (n-1)! orders with point 0 fixed first. Only meant for
//! cross-checking the DP on very small instances.

use crate::distance::DistanceMatrix;
use crate::error::{Result, SolverError};

/// Largest instance the enumeration accepts (9! orders).
pub const BRUTE_FORCE_MAX_POINTS: usize = 10;

/// Best closed tour by enumeration. Ties keep the lexicographically first order.
pub fn solve(dist: &DistanceMatrix) -> Result<(Vec<usize>, f64)> {
    let n = dist.size();
    if n > BRUTE_FORCE_MAX_POINTS {
        return Err(SolverError::CapacityExceeded { points: n, max: BRUTE_FORCE_MAX_POINTS });
    }
    if n == 1 {
        return Ok((vec![0], 0.0));
    }

    let mut rest: Vec<usize> = (1..n).collect();
    let mut best_tour = Vec::new();
    let mut best_length = f64::INFINITY;

    loop {
        let length = closed_length(dist, &rest);
        if length < best_length {
            best_length = length;
            best_tour = rest.clone();
        }
        if !next_permutation(&mut rest) {
            break;
        }
    }

    let mut tour = Vec::with_capacity(n);
    tour.push(0);
    tour.extend(best_tour);
    Ok((tour, best_length))
}

fn closed_length(dist: &DistanceMatrix, rest: &[usize]) -> f64 {
    let mut length = dist.get(0, rest[0]);
    for pair in rest.windows(2) {
        length += dist.get(pair[0], pair[1]);
    }
    length + dist.get(rest[rest.len() - 1], 0)
}

/// Advance to the next lexicographic permutation; false once the last one was seen.
fn next_permutation(items: &mut [usize]) -> bool {
    if items.len() < 2 {
        return false;
    }
    let mut i = items.len() - 1;
    while i > 0 && items[i - 1] >= items[i] {
        i -= 1;
    }
    if i == 0 {
        return false;
    }
    let mut j = items.len() - 1;
    while items[j] <= items[i - 1] {
        j -= 1;
    }
    items.swap(i - 1, j);
    items[i..].reverse();
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::Instance;

    #[test]
    fn test_next_permutation_count() {
        let mut items = vec![1, 2, 3, 4];
        let mut count = 1;
        while next_permutation(&mut items) {
            count += 1;
        }
        assert_eq!(count, 24);
        assert_eq!(items, vec![4, 3, 2, 1]);
    }

    #[test]
    fn test_square() {
        let dist = Instance::from_coordinates("square", &[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)])
            .distance_matrix()
            .unwrap();
        let (tour, length) = solve(&dist).unwrap();
        assert_eq!(tour, vec![0, 1, 2, 3]);
        assert!((length - 4.0).abs() < 1e-12);
    }

    #[test]
    fn test_small_sizes() {
        let dist = DistanceMatrix::from_data(1, vec![0.0]).unwrap();
        assert_eq!(solve(&dist).unwrap(), (vec![0], 0.0));

        let dist = DistanceMatrix::from_data(2, vec![0.0, 2.5, 2.5, 0.0]).unwrap();
        assert_eq!(solve(&dist).unwrap(), (vec![0, 1], 5.0));
    }

    #[test]
    fn test_too_large() {
        let coords: Vec<(f64, f64)> = (0..11).map(|i| (i as f64, 0.0)).collect();
        let dist = Instance::from_coordinates("line", &coords).distance_matrix().unwrap();
        assert!(matches!(solve(&dist), Err(SolverError::CapacityExceeded { points: 11, .. })));
    }
}
