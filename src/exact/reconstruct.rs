//! Recovering the visiting order from a completed [`DpTable`].

use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use super::held_karp::DpTable;
use crate::distance::DistanceMatrix;
use crate::error::{Result, SolverError};

/// Relative tolerance for the relaxation equation in [`ReconstructionMode::Scan`].
const SCAN_TOLERANCE: f64 = 1e-9;

/// How the tour is read back out of the DP table.
#[derive(Copy, Clone, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub enum ReconstructionMode {
    /// Follow the predecessor stored with each state. O(n).
    #[default]
    Predecessor,
    /// Recompute each predecessor by searching for the `u` that satisfies
    /// `dp[mask][v] == dp[mask \ {v}][u] + d(u, v)`. O(n^2).
    Scan,
    /// Compatibility with the canvas front end: greedily take the cheapest
    /// entry of each shrinking mask's row. Does not follow the
    /// relaxation chain and is not guaranteed to be optimal.
    Legacy,
}

impl std::fmt::Display for ReconstructionMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ReconstructionMode::Predecessor => "predecessor",
            ReconstructionMode::Scan => "scan",
            ReconstructionMode::Legacy => "legacy",
        };
        write!(f, "{}", name)
    }
}

/// Rebuild a closed tour starting at 0 and return it with its length.
pub fn reconstruct(
    table: &DpTable,
    dist: &DistanceMatrix,
    mode: ReconstructionMode,
) -> Result<(Vec<usize>, f64)> {
    match mode {
        ReconstructionMode::Predecessor => backtrack(table, dist, |mask, v| table.predecessor(mask, v)),
        ReconstructionMode::Scan => backtrack(table, dist, |mask, v| scan_predecessor(table, dist, mask, v)),
        ReconstructionMode::Legacy => Ok(legacy(table, dist)),
    }
}

/// Walk from the best terminal state back to `{0}` using `find_pred`.
fn backtrack<F>(table: &DpTable, dist: &DistanceMatrix, find_pred: F) -> Result<(Vec<usize>, f64)>
where
    F: Fn(usize, usize) -> Option<usize>,
{
    let n = table.num_points();
    let full = table.full_mask();
    let (terminal, length) = table
        .best_terminal(dist)
        .ok_or(SolverError::ReconstructionFailure { mask: full, point: 0 })?;

    let mut tour = Vec::with_capacity(n);
    let mut mask = full;
    let mut v = terminal;

    while mask != 1 {
        tour.push(v);
        let u = find_pred(mask, v)
            .ok_or(SolverError::ReconstructionFailure { mask, point: v })?;
        let prev = mask & !(1 << v);
        if prev & (1 << u) == 0 {
            return Err(SolverError::ReconstructionFailure { mask, point: v });
        }
        mask = prev;
        v = u;
    }

    if v != 0 {
        return Err(SolverError::ReconstructionFailure { mask, point: v });
    }
    tour.push(0);
    tour.reverse();

    Ok((tour, length))
}

fn scan_predecessor(table: &DpTable, dist: &DistanceMatrix, mask: usize, v: usize) -> Option<usize> {
    let target = table.cost(mask, v);
    if !target.is_finite() {
        return None;
    }
    let prev = mask & !(1 << v);
    (0..table.num_points())
        .filter(|&u| prev & (1 << u) != 0)
        .find(|&u| {
            let candidate = table.cost(prev, u) + dist.get(u, v);
            candidate.is_finite() && (candidate - target).abs() <= SCAN_TOLERANCE * target.max(1.0)
        })
}

/// Greedy scan kept for output compatibility with the canvas front end.
fn legacy(table: &DpTable, dist: &DistanceMatrix) -> (Vec<usize>, f64) {
    let n = table.num_points();
    let mut mask = table.full_mask();
    let mut tour = Vec::with_capacity(n);
    tour.push(0);

    for _ in 1..n {
        let row = table.row(mask);
        // min_by_key keeps the first minimum, matching a strict `<` scan.
        let v = (0..n)
            .filter(|&j| mask & (1 << j) != 0)
            .min_by_key(|&j| OrderedFloat(row[j]))
            .unwrap_or(0);
        mask ^= 1 << v;
        tour.push(v);
    }

    let length = dist.tour_length(&tour);
    (tour, length)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::Instance;
    use rand::prelude::*;
    use rand_chacha::ChaCha8Rng;

    fn solved(coords: &[(f64, f64)]) -> (DpTable, DistanceMatrix) {
        let dist = Instance::from_coordinates("test", coords).distance_matrix().unwrap();
        let mut table = DpTable::new(coords.len()).unwrap();
        table.relax(&dist);
        (table, dist)
    }

    fn random_coords(n: usize, rng: &mut ChaCha8Rng) -> Vec<(f64, f64)> {
        (0..n).map(|_| (rng.gen_range(0.0..50.0), rng.gen_range(0.0..50.0))).collect()
    }

    #[test]
    fn test_predecessor_reconstruction() {
        let (table, dist) = solved(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]);
        let (tour, length) = reconstruct(&table, &dist, ReconstructionMode::Predecessor).unwrap();

        assert_eq!(tour[0], 0);
        assert!((length - 4.0).abs() < 1e-12);
        assert!((dist.tour_length(&tour) - length).abs() < 1e-12);
    }

    #[test]
    fn test_scan_matches_predecessor() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..10 {
            let (table, dist) = solved(&random_coords(7, &mut rng));
            let by_pred = reconstruct(&table, &dist, ReconstructionMode::Predecessor).unwrap();
            let by_scan = reconstruct(&table, &dist, ReconstructionMode::Scan).unwrap();
            assert_eq!(by_pred.0, by_scan.0);
            assert_eq!(by_pred.1, by_scan.1);
        }
    }

    #[test]
    fn test_single_point() {
        let (table, dist) = solved(&[(2.0, 3.0)]);
        for mode in [ReconstructionMode::Predecessor, ReconstructionMode::Scan, ReconstructionMode::Legacy] {
            let (tour, length) = reconstruct(&table, &dist, mode).unwrap();
            assert_eq!(tour, vec![0]);
            assert_eq!(length, 0.0);
        }
    }

    #[test]
    fn test_legacy_is_a_permutation() {
        let mut rng = ChaCha8Rng::seed_from_u64(21);
        for n in 2..8 {
            let (table, dist) = solved(&random_coords(n, &mut rng));
            let (tour, length) = reconstruct(&table, &dist, ReconstructionMode::Legacy).unwrap();
            let mut sorted = tour.clone();
            sorted.sort_unstable();
            assert_eq!(sorted, (0..n).collect::<Vec<_>>());
            assert_eq!(tour[0], 0);
            assert!((dist.tour_length(&tour) - length).abs() < 1e-9);

            let (_, optimum) = reconstruct(&table, &dist, ReconstructionMode::Predecessor).unwrap();
            assert!(length >= optimum - 1e-9);
        }
    }

    #[test]
    fn test_legacy_starts_from_cheapest_full_row_entry() {
        let (table, dist) = solved(&[(0.0, 0.0), (5.0, 0.0), (5.0, 1.0), (0.0, 3.0)]);
        let (tour, _) = reconstruct(&table, &dist, ReconstructionMode::Legacy).unwrap();

        let full = table.full_mask();
        let cheapest = (0..4)
            .min_by_key(|&j| OrderedFloat(table.cost(full, j)))
            .unwrap();
        assert_eq!(tour[1], cheapest);
    }

    #[test]
    fn test_missing_predecessor_is_reported() {
        let dist = DistanceMatrix::from_data(3, vec![0.0, 1.0, 1.0, 1.0, 0.0, 1.0, 1.0, 1.0, 0.0]).unwrap();
        // Never relaxed: every terminal state is still infinite.
        let table = DpTable::new(3).unwrap();
        let err = reconstruct(&table, &dist, ReconstructionMode::Predecessor).unwrap_err();
        assert!(matches!(err, SolverError::ReconstructionFailure { .. }));
    }
}
