//! Benchmarking and experimentation module.
//!
//! Runs the exact solver variants on seeded random instances, checks them
//! against the brute-force reference where it is affordable, collects
//! statistics and exports them.

use crate::distance::DistanceMatrix;
use crate::error::Result;
use crate::exact::{solve_brute_force, HeldKarpSolver, ReconstructionMode, SolverConfig};
use crate::exact::brute_force::BRUTE_FORCE_MAX_POINTS;
use crate::instance::Instance;
use crate::solution::Solution;

use indicatif::{ProgressBar, ProgressStyle};
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

/// Result of running a single algorithm on an instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlgorithmResult {
    /// Algorithm name
    pub algorithm: String,
    /// Instance name
    pub instance: String,
    /// Number of points
    pub dimension: usize,
    /// Reported tour length
    pub length: f64,
    /// Computation time in seconds
    pub time: f64,
    /// DP states allocated (if applicable)
    pub states: Option<usize>,
    /// Gap to the exact optimum in percent
    pub gap_to_optimal: Option<f64>,
}

/// Aggregated statistics for an algorithm
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlgorithmStatistics {
    pub algorithm: String,
    pub num_instances: usize,
    /// Runs that matched the optimum within tolerance
    pub num_optimal: usize,
    pub avg_time: f64,
    pub std_time: f64,
    pub total_time: f64,
    pub avg_gap: Option<f64>,
    pub max_gap: Option<f64>,
}

/// Benchmark configuration
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    /// Smallest instance size
    pub min_points: usize,
    /// Largest instance size
    pub max_points: usize,
    /// Random instances per size
    pub instances_per_size: usize,
    /// Seed for instance generation
    pub seed: u64,
    /// Side length of the square the points are drawn from
    pub extent: f64,
    /// Largest size checked with brute force
    pub brute_force_max: usize,
    /// Also time the layer-parallel relaxation
    pub parallel: bool,
    /// Show a progress bar
    pub progress: bool,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        BenchmarkConfig {
            min_points: 4,
            max_points: 12,
            instances_per_size: 5,
            seed: 42,
            extent: 100.0,
            brute_force_max: 8,
            parallel: true,
            progress: false,
        }
    }
}

/// Relative tolerance for treating a length as optimal
const OPTIMALITY_TOLERANCE: f64 = 1e-9;

/// Benchmarking engine
pub struct Benchmark {
    config: BenchmarkConfig,
    results: Vec<AlgorithmResult>,
    optimum: HashMap<String, f64>,
}

impl Benchmark {
    pub fn new(config: BenchmarkConfig) -> Self {
        Benchmark {
            config,
            results: Vec::new(),
            optimum: HashMap::new(),
        }
    }

    /// Generate a uniform random instance of `n` points
    pub fn random_instance(n: usize, extent: f64, rng: &mut ChaCha8Rng, name: &str) -> Instance {
        let coords: Vec<(f64, f64)> = (0..n)
            .map(|_| (rng.gen_range(0.0..extent), rng.gen_range(0.0..extent)))
            .collect();
        Instance::from_coordinates(name, &coords)
    }

    /// Instances for every configured size, in increasing size
    pub fn generate_instances(&self) -> Vec<Instance> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.config.seed);
        let mut instances = Vec::new();
        for n in self.config.min_points.max(1)..=self.config.max_points {
            for k in 0..self.config.instances_per_size {
                let name = format!("rand-n{}-{}", n, k);
                instances.push(Self::random_instance(n, self.config.extent, &mut rng, &name));
            }
        }
        instances
    }

    /// Run every exact variant on one instance
    pub fn run_exact(&mut self, instance: &Instance) -> Result<()> {
        let dist = instance.distance_matrix()?;

        let mut variants = vec![
            SolverConfig::default(),
            SolverConfig { reconstruction: ReconstructionMode::Scan, ..Default::default() },
            SolverConfig { reconstruction: ReconstructionMode::Legacy, ..Default::default() },
        ];
        if self.config.parallel {
            variants.push(SolverConfig { parallel: true, ..Default::default() });
        }

        for config in variants {
            let parallel = config.parallel;
            let mut solution = HeldKarpSolver::new(config).solve_matrix(&dist)?;
            if parallel {
                solution.algorithm.push_str("-parallel");
            }
            if solution.algorithm == "HeldKarp-predecessor" {
                self.optimum.insert(instance.name.clone(), solution.length);
            }
            self.record_result(instance, &solution);
        }

        Ok(())
    }

    /// Cross-check with exhaustive search when the instance is small enough
    pub fn run_brute_force(&mut self, instance: &Instance, dist: &DistanceMatrix) -> Result<Option<Solution>> {
        let n = instance.dimension();
        if n > self.config.brute_force_max.min(BRUTE_FORCE_MAX_POINTS) {
            return Ok(None);
        }
        let solution = solve_brute_force(dist)?;
        if let Some(&optimum) = self.optimum.get(&instance.name) {
            if !Self::is_optimal(solution.length, optimum) {
                log::error!(
                    "Brute force found {:.6} on {} but Held-Karp reported {:.6}",
                    solution.length,
                    instance.name,
                    optimum
                );
            }
        }
        self.record_result(instance, &solution);
        Ok(Some(solution))
    }

    /// Run full benchmark on an instance
    pub fn run_full_benchmark(&mut self, instance: &Instance) -> Result<()> {
        log::info!("Running benchmark on instance: {} (n={})", instance.name, instance.dimension());
        self.run_exact(instance)?;
        let dist = instance.distance_matrix()?;
        self.run_brute_force(instance, &dist)?;
        Ok(())
    }

    /// Run benchmark on multiple instances
    pub fn run_on_instances(&mut self, instances: &[Instance]) -> Result<()> {
        let bar = if self.config.progress {
            let bar = ProgressBar::new(instances.len() as u64);
            if let Ok(style) = ProgressStyle::with_template("[{elapsed_precise}] {bar:40} {pos}/{len} {msg}") {
                bar.set_style(style);
            }
            bar
        } else {
            ProgressBar::hidden()
        };

        for instance in instances {
            bar.set_message(instance.name.clone());
            self.run_full_benchmark(instance)?;
            bar.inc(1);
        }
        bar.finish_and_clear();
        Ok(())
    }

    fn is_optimal(length: f64, optimum: f64) -> bool {
        (length - optimum).abs() <= OPTIMALITY_TOLERANCE * optimum.max(1.0)
    }

    /// Record a result
    fn record_result(&mut self, instance: &Instance, solution: &Solution) {
        let gap_to_optimal = self.optimum.get(&instance.name).map(|&best| {
            if best > 0.0 {
                (solution.length - best) / best * 100.0
            } else {
                0.0
            }
        });

        self.results.push(AlgorithmResult {
            algorithm: solution.algorithm.clone(),
            instance: instance.name.clone(),
            dimension: instance.dimension(),
            length: solution.length,
            time: solution.computation_time,
            states: solution.states,
            gap_to_optimal,
        });
    }

    /// Compute statistics for each algorithm
    pub fn compute_statistics(&self) -> Vec<AlgorithmStatistics> {
        let mut stats_map: HashMap<String, Vec<&AlgorithmResult>> = HashMap::new();

        for result in &self.results {
            stats_map.entry(result.algorithm.clone())
                .or_default()
                .push(result);
        }

        let mut statistics = Vec::new();

        for (algo, results) in stats_map {
            let times: Vec<f64> = results.iter().map(|r| r.time).collect();
            let gaps: Vec<f64> = results.iter().filter_map(|r| r.gap_to_optimal).collect();

            let num_optimal = results.iter()
                .filter(|r| self.optimum.get(&r.instance).map_or(false, |&best| Self::is_optimal(r.length, best)))
                .count();

            let std_time = times.iter().std_dev();
            let (avg_gap, max_gap) = if gaps.is_empty() {
                (None, None)
            } else {
                (Some(gaps.iter().mean()), Some(gaps.iter().cloned().fold(f64::NEG_INFINITY, f64::max)))
            };

            statistics.push(AlgorithmStatistics {
                algorithm: algo,
                num_instances: results.len(),
                num_optimal,
                avg_time: times.iter().mean(),
                std_time: if std_time.is_nan() { 0.0 } else { std_time },
                total_time: times.iter().sum(),
                avg_gap,
                max_gap,
            });
        }

        statistics.sort_by(|a, b| a.algorithm.cmp(&b.algorithm));

        statistics
    }

    /// Export results to CSV
    pub fn export_to_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);

        for result in &self.results {
            writer.serialize(result).map_err(std::io::Error::from)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Export statistics to CSV
    pub fn export_statistics_csv<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);

        for stat in self.compute_statistics() {
            writer.serialize(stat).map_err(std::io::Error::from)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Generate summary report
    pub fn generate_report(&self) -> String {
        let mut report = String::new();

        report.push_str("========================================\n");
        report.push_str("      Exact TSP Benchmark Report\n");
        report.push_str("========================================\n");
        report.push_str(&format!("Generated: {}\n\n", chrono::Local::now().format("%Y-%m-%d %H:%M:%S")));

        let stats = self.compute_statistics();

        report.push_str("Algorithm Performance Summary:\n");
        report.push_str("-".repeat(80).as_str());
        report.push('\n');
        report.push_str(&format!("{:<28} {:>10} {:>12} {:>12} {:>14}\n",
            "Algorithm", "Optimal", "Avg Gap%", "Max Gap%", "Avg Time"));
        report.push_str("-".repeat(80).as_str());
        report.push('\n');

        for stat in &stats {
            let avg_gap = stat.avg_gap
                .map(|g| format!("{:.2}%", g))
                .unwrap_or_else(|| "-".to_string());
            let max_gap = stat.max_gap
                .map(|g| format!("{:.2}%", g))
                .unwrap_or_else(|| "-".to_string());

            report.push_str(&format!("{:<28} {:>10} {:>12} {:>12} {:>14.6}\n",
                stat.algorithm,
                format!("{}/{}", stat.num_optimal, stat.num_instances),
                avg_gap,
                max_gap,
                stat.avg_time));
        }

        report.push_str("-".repeat(80).as_str());
        report.push('\n');

        report.push_str("\nAverage Held-Karp time per size:\n");
        let mut per_size: HashMap<usize, Vec<f64>> = HashMap::new();
        for result in self.results.iter().filter(|r| r.algorithm == "HeldKarp-predecessor") {
            per_size.entry(result.dimension).or_default().push(result.time);
        }
        let mut sizes: Vec<_> = per_size.into_iter().collect();
        sizes.sort_by_key(|(n, _)| *n);
        for (n, times) in sizes {
            report.push_str(&format!("  n={:<3} {:.6}s\n", n, times.iter().mean()));
        }

        report
    }

    /// Get all results
    pub fn results(&self) -> &[AlgorithmResult] {
        &self.results
    }

    /// Exact optimum per instance
    pub fn optimum(&self) -> &HashMap<String, f64> {
        &self.optimum
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> BenchmarkConfig {
        BenchmarkConfig {
            min_points: 3,
            max_points: 6,
            instances_per_size: 2,
            brute_force_max: 6,
            ..Default::default()
        }
    }

    #[test]
    fn test_benchmark_config() {
        let config = BenchmarkConfig::default();
        assert_eq!(config.instances_per_size, 5);
        assert!(config.brute_force_max <= BRUTE_FORCE_MAX_POINTS);
    }

    #[test]
    fn test_generate_instances_is_deterministic() {
        let bench = Benchmark::new(small_config());
        let a = bench.generate_instances();
        let b = bench.generate_instances();
        assert_eq!(a.len(), 8);
        assert_eq!(a[0].points, b[0].points);
        assert_eq!(a[7].dimension(), 6);
    }

    #[test]
    fn test_exact_variants_are_optimal() {
        let mut bench = Benchmark::new(small_config());
        let instances = bench.generate_instances();
        bench.run_on_instances(&instances).unwrap();

        let stats = bench.compute_statistics();
        for name in ["HeldKarp-predecessor", "HeldKarp-scan", "HeldKarp-predecessor-parallel", "BruteForce"] {
            let stat = stats.iter().find(|s| s.algorithm == name).unwrap();
            assert_eq!(stat.num_optimal, stat.num_instances, "{}", name);
        }
        let legacy = stats.iter().find(|s| s.algorithm == "HeldKarp-legacy").unwrap();
        assert!(legacy.avg_gap.unwrap() > -1e-6);
    }

    #[test]
    fn test_report_and_csv() {
        let mut bench = Benchmark::new(BenchmarkConfig {
            min_points: 4,
            max_points: 4,
            instances_per_size: 1,
            ..Default::default()
        });
        let instances = bench.generate_instances();
        bench.run_on_instances(&instances).unwrap();

        let report = bench.generate_report();
        assert!(report.contains("HeldKarp-predecessor"));
        assert!(report.contains("n=4"));

        let path = std::env::temp_dir().join(format!("exact_tsp_bench_{}.csv", std::process::id()));
        bench.export_to_csv(&path).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert!(content.starts_with("algorithm,instance,dimension,length,time,states,gap_to_optimal"));
        assert_eq!(content.lines().count(), 1 + bench.results().len());
    }
}
