//! Held-Karp bitmask dynamic programming.
//!
//! `dp[mask][v]` holds the cheapest path that starts at point 0, visits
//! exactly the points in `mask` and currently stands at `v`. Costs and
//! predecessors live in two parallel flat arrays indexed by `mask * n + v`.

use rayon::prelude::*;

use super::ABSOLUTE_MAX_POINTS;
use crate::distance::DistanceMatrix;
use crate::error::{Result, SolverError};

/// Marker for states that were never reached by a relaxation.
pub const NO_PREDECESSOR: u8 = u8::MAX;

/// Completed (or in-progress) DP table for one solve call.
#[derive(Debug, Clone)]
pub struct DpTable {
    n: usize,
    cost: Vec<f64>,
    predecessor: Vec<u8>,
}

impl DpTable {
    /// Allocate a table for `n` points with every state at +infinity except `dp[{0}][0] = 0`.
    ///
    /// Fails with `InvalidInput` for `n == 0` and with `CapacityExceeded`
    /// above [`ABSOLUTE_MAX_POINTS`], before anything is allocated.
    pub fn new(n: usize) -> Result<Self> {
        if n == 0 {
            return Err(SolverError::invalid("at least one point is required"));
        }
        if n > ABSOLUTE_MAX_POINTS {
            return Err(SolverError::CapacityExceeded { points: n, max: ABSOLUTE_MAX_POINTS });
        }
        let states = (1usize << n) * n;
        let mut table = DpTable {
            n,
            cost: vec![f64::INFINITY; states],
            predecessor: vec![NO_PREDECESSOR; states],
        };
        let origin = table.index(1, 0);
        table.cost[origin] = 0.0;
        Ok(table)
    }

    #[inline]
    fn index(&self, mask: usize, point: usize) -> usize {
        mask * self.n + point
    }

    pub fn num_points(&self) -> usize {
        self.n
    }

    /// Mask with every point set.
    #[inline]
    pub fn full_mask(&self) -> usize {
        (1usize << self.n) - 1
    }

    /// Number of (mask, point) entries.
    pub fn num_states(&self) -> usize {
        self.cost.len()
    }

    #[inline]
    pub fn cost(&self, mask: usize, point: usize) -> f64 {
        self.cost[self.index(mask, point)]
    }

    /// Point visited just before `point` on the best path for `(mask, point)`.
    #[inline]
    pub fn predecessor(&self, mask: usize, point: usize) -> Option<usize> {
        match self.predecessor[self.index(mask, point)] {
            NO_PREDECESSOR => None,
            u => Some(u as usize),
        }
    }

    /// Costs of every endpoint for one mask.
    pub fn row(&self, mask: usize) -> &[f64] {
        let start = mask * self.n;
        &self.cost[start..start + self.n]
    }

    /// Serial push relaxation.
    ///
    /// Masks are visited in increasing order, so every subset is final before
    /// any superset reads it. Ties keep the first relaxation, which is the
    /// lowest `u`.
    pub fn relax(&mut self, dist: &DistanceMatrix) {
        let n = self.n;
        for mask in 1..=self.full_mask() {
            if mask & 1 == 0 {
                continue;
            }
            for u in 0..n {
                if mask & (1 << u) == 0 {
                    continue;
                }
                let base = self.cost[self.index(mask, u)];
                if !base.is_finite() {
                    continue;
                }
                for v in 0..n {
                    if mask & (1 << v) != 0 {
                        continue;
                    }
                    let target = self.index(mask | (1 << v), v);
                    let candidate = base + dist.get(u, v);
                    if candidate < self.cost[target] {
                        self.cost[target] = candidate;
                        self.predecessor[target] = u as u8;
                    }
                }
            }
        }
    }

    /// Layer-parallel pull relaxation.
    ///
    /// Masks are grouped by population count. Each state of layer `k + 1`
    /// reads only its unique predecessor mask in layer `k`, so the states of a
    /// layer are independent. Scanning `u` upward with a strict comparison
    /// reproduces the serial tie-break exactly.
    ///
    /// Each layer is written into one flat scratch buffer of `layer.len() * n`
    /// entries, allocated once for the widest layer, then copied into the table.
    pub fn relax_parallel(&mut self, dist: &DistanceMatrix) {
        let n = self.n;
        let layers = self.layers();
        let widest = layers.iter().map(Vec::len).max().unwrap_or(0);
        let mut scratch: Vec<(f64, u8)> = Vec::with_capacity(widest * n);

        for layer in layers.iter().skip(1) {
            scratch.clear();
            scratch.resize(layer.len() * n, (f64::INFINITY, NO_PREDECESSOR));
            {
                let table = &*self;
                scratch
                    .par_chunks_mut(n)
                    .zip(layer.par_iter())
                    .for_each(|(row, &mask)| {
                        for (v, slot) in row.iter_mut().enumerate() {
                            *slot = table.pull(dist, mask, v);
                        }
                    });
            }

            for (row, &mask) in scratch.chunks(n).zip(layer) {
                let start = self.index(mask, 0);
                for (v, &(cost, pred)) in row.iter().enumerate() {
                    self.cost[start + v] = cost;
                    self.predecessor[start + v] = pred;
                }
            }
        }
    }

    /// Best way to reach `(mask, v)` from `mask \ {v}`.
    fn pull(&self, dist: &DistanceMatrix, mask: usize, v: usize) -> (f64, u8) {
        if v == 0 || mask & (1 << v) == 0 {
            return (f64::INFINITY, NO_PREDECESSOR);
        }
        let prev = mask & !(1 << v);
        let mut best = (f64::INFINITY, NO_PREDECESSOR);
        for u in 0..self.n {
            if prev & (1 << u) == 0 {
                continue;
            }
            let base = self.cost(prev, u);
            if !base.is_finite() {
                continue;
            }
            let candidate = base + dist.get(u, v);
            if candidate < best.0 {
                best = (candidate, u as u8);
            }
        }
        best
    }

    /// Masks containing the origin, grouped by number of set bits.
    fn layers(&self) -> Vec<Vec<usize>> {
        let mut layers = vec![Vec::new(); self.n];
        for mask in (1..=self.full_mask()).filter(|m| m & 1 == 1) {
            layers[mask.count_ones() as usize - 1].push(mask);
        }
        layers
    }

    /// Terminal point of the optimal closed tour and its length.
    ///
    /// Minimises `dp[full][v] + d(v, 0)`; the lowest index wins ties. For a
    /// single point the tour is just the origin with length 0.
    pub fn best_terminal(&self, dist: &DistanceMatrix) -> Option<(usize, f64)> {
        let full = self.full_mask();
        if self.n == 1 {
            return Some((0, 0.0));
        }
        let mut best: Option<(usize, f64)> = None;
        for v in 1..self.n {
            let cost = self.cost(full, v);
            if !cost.is_finite() {
                continue;
            }
            let total = cost + dist.get(v, 0);
            if best.map_or(true, |(_, b)| total < b) {
                best = Some((v, total));
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instance::Instance;
    use rand::prelude::*;
    use rand_chacha::ChaCha8Rng;

    fn random_matrix(n: usize, seed: u64) -> DistanceMatrix {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let coords: Vec<(f64, f64)> = (0..n)
            .map(|_| (rng.gen_range(0.0..100.0), rng.gen_range(0.0..100.0)))
            .collect();
        Instance::from_coordinates("random", &coords).distance_matrix().unwrap()
    }

    #[test]
    fn test_initial_state() {
        let table = DpTable::new(3).unwrap();
        assert_eq!(table.num_states(), 8 * 3);
        assert_eq!(table.cost(1, 0), 0.0);
        assert!(table.cost(1, 1).is_infinite());
        assert_eq!(table.predecessor(1, 0), None);
        assert_eq!(table.full_mask(), 0b111);
    }

    #[test]
    fn test_new_rejects_out_of_range_sizes() {
        assert!(matches!(DpTable::new(0), Err(SolverError::InvalidInput(_))));
        assert!(matches!(
            DpTable::new(ABSOLUTE_MAX_POINTS + 1),
            Err(SolverError::CapacityExceeded { points, max }) if points == ABSOLUTE_MAX_POINTS + 1 && max == ABSOLUTE_MAX_POINTS
        ));
        assert!(matches!(DpTable::new(64), Err(SolverError::CapacityExceeded { .. })));
        assert!(DpTable::new(1).is_ok());
    }

    #[test]
    fn test_two_point_relaxation() {
        let dist = DistanceMatrix::from_data(2, vec![0.0, 3.0, 3.0, 0.0]).unwrap();
        let mut table = DpTable::new(2).unwrap();
        table.relax(&dist);

        assert_eq!(table.cost(0b11, 1), 3.0);
        assert_eq!(table.predecessor(0b11, 1), Some(0));
        assert_eq!(table.best_terminal(&dist), Some((1, 6.0)));
    }

    #[test]
    fn test_origin_never_an_endpoint() {
        let dist = random_matrix(5, 3);
        let mut table = DpTable::new(5).unwrap();
        table.relax(&dist);
        for mask in (3..=table.full_mask()).filter(|m| m & 1 == 1) {
            assert!(table.cost(mask, 0).is_infinite());
        }
    }

    #[test]
    fn test_relaxation_invariant() {
        let dist = random_matrix(7, 11);
        let mut table = DpTable::new(7).unwrap();
        table.relax(&dist);

        let full = table.full_mask();
        for v in 1..7 {
            let u = table.predecessor(full, v).unwrap();
            let prev = full & !(1 << v);
            let expected = table.cost(prev, u) + dist.get(u, v);
            assert_eq!(table.cost(full, v), expected);
            for w in 0..7 {
                if prev & (1 << w) != 0 {
                    assert!(table.cost(full, v) <= table.cost(prev, w) + dist.get(w, v));
                }
            }
        }
    }

    #[test]
    fn test_parallel_matches_serial() {
        for seed in 0..5 {
            let dist = random_matrix(8, seed);
            let mut serial = DpTable::new(8).unwrap();
            serial.relax(&dist);
            let mut parallel = DpTable::new(8).unwrap();
            parallel.relax_parallel(&dist);

            assert_eq!(serial.cost, parallel.cost);
            assert_eq!(serial.predecessor, parallel.predecessor);
        }
    }

    #[test]
    fn test_parallel_matches_serial_with_ties() {
        let dist = DistanceMatrix::from_data(4, vec![
            0.0, 1.0, 1.0, 1.0,
            1.0, 0.0, 1.0, 1.0,
            1.0, 1.0, 0.0, 1.0,
            1.0, 1.0, 1.0, 0.0,
        ]).unwrap();
        let mut serial = DpTable::new(4).unwrap();
        serial.relax(&dist);
        let mut parallel = DpTable::new(4).unwrap();
        parallel.relax_parallel(&dist);

        assert_eq!(serial.predecessor, parallel.predecessor);
        assert_eq!(serial.best_terminal(&dist), Some((1, 4.0)));
    }
}
