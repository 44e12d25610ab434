//! Exact TSP Solver - Command Line Interface
//!
//! Solves small closed-tour instances to optimality and prints directions.

use clap::{Parser, Subcommand, ValueEnum};
use exact_tsp_solver::benchmark::{Benchmark, BenchmarkConfig};
use exact_tsp_solver::directions;
use exact_tsp_solver::error::SolverError;
use exact_tsp_solver::exact::{self, HeldKarpSolver, ReconstructionMode, SolverConfig, DEFAULT_MAX_POINTS};
use exact_tsp_solver::instance::Instance;

use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(name = "exact-tsp-solver")]
#[command(version = "1.0")]
#[command(about = "Exact Held-Karp solver for small closed-tour TSP instances")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve an instance and print directions
    Solve {
        #[command(flatten)]
        input: InputArgs,

        /// Reconstruction strategy
        #[arg(short, long, value_enum, default_value = "predecessor")]
        mode: Mode,

        /// Maximum number of points accepted
        #[arg(long, default_value_t = DEFAULT_MAX_POINTS)]
        max_points: usize,

        /// Use the layer-parallel relaxation
        #[arg(long)]
        parallel: bool,

        /// Output solution to file (JSON)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Analyze an instance
    Analyze {
        #[command(flatten)]
        input: InputArgs,
    },

    /// Compare reconstruction modes and brute force on an instance
    Compare {
        #[command(flatten)]
        input: InputArgs,

        /// Output CSV file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run benchmarks on random instances
    Benchmark {
        /// Smallest instance size
        #[arg(long, default_value = "4")]
        min_points: usize,

        /// Largest instance size
        #[arg(long, default_value = "12")]
        max_points: usize,

        /// Instances per size
        #[arg(short, long, default_value = "5")]
        runs: usize,

        /// Random seed
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Largest size cross-checked with brute force
        #[arg(long, default_value = "8")]
        brute_force_max: usize,

        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,
    },
}

#[derive(clap::Args)]
struct InputArgs {
    /// Path to the instance file (.json or TSP-LIB)
    #[arg(short, long, conflicts_with = "points")]
    instance: Option<PathBuf>,

    /// Inline coordinates, e.g. "0,0 3,4 6,0"
    #[arg(short, long)]
    points: Option<String>,

    /// Expected number of inline coordinates
    #[arg(short, long, requires = "points")]
    count: Option<usize>,
}

impl InputArgs {
    fn load(&self) -> Result<Instance, SolverError> {
        match (&self.instance, &self.points) {
            (Some(path), _) => Instance::from_file(path),
            (None, Some(points)) => Instance::parse_inline(points, self.count),
            (None, None) => Err(SolverError::invalid("either --instance or --points is required")),
        }
    }
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum, Debug)]
enum Mode {
    /// Follow stored predecessors
    Predecessor,
    /// Recompute predecessors from the relaxation equation
    Scan,
    /// Greedy row scan of the canvas front end (not guaranteed optimal)
    Legacy,
}

impl From<Mode> for ReconstructionMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Predecessor => ReconstructionMode::Predecessor,
            Mode::Scan => ReconstructionMode::Scan,
            Mode::Legacy => ReconstructionMode::Legacy,
        }
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Solve { input, mode, max_points, parallel, output, verbose } => {
            let config = SolverConfig { max_points, reconstruction: mode.into(), parallel };
            solve_instance(&input, config, output, verbose)
        }

        Commands::Analyze { input } => analyze_instance(&input),

        Commands::Compare { input, output } => compare_algorithms(&input, output),

        Commands::Benchmark { min_points, max_points, runs, seed, brute_force_max, output } => {
            let config = BenchmarkConfig {
                min_points,
                max_points,
                instances_per_size: runs,
                seed,
                brute_force_max,
                progress: true,
                ..Default::default()
            };
            run_benchmark(config, &output)
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn solve_instance(
    input: &InputArgs,
    config: SolverConfig,
    output: Option<PathBuf>,
    verbose: bool,
) -> Result<(), SolverError> {
    let instance = input.load()?;

    if verbose {
        println!("{}", instance.statistics()?);
        println!("Reconstruction: {}", config.reconstruction);
    }

    let dist = instance.distance_matrix()?;
    let solver = HeldKarpSolver::new(config);
    let solution = solver.solve_matrix(&dist)?;

    println!("{}", directions::render(&solution, &dist));

    if verbose {
        println!("\n{}", solution);
    }

    if let Some(out_path) = output {
        let json = serde_json::to_string_pretty(&solution)?;
        std::fs::write(&out_path, json)?;
        println!("\nSolution saved to {:?}", out_path);
    }

    Ok(())
}

fn analyze_instance(input: &InputArgs) -> Result<(), SolverError> {
    let instance = input.load()?;

    println!("========== Instance Analysis ==========\n");
    println!("{}", instance.statistics()?);

    let n = instance.dimension();
    let max = SolverConfig::default().effective_max_points();
    if n > max {
        println!("Too large for the exact solver (limit {} points)", max);
        return Ok(());
    }

    let table_bytes = (1u64 << n) * n as u64 * (std::mem::size_of::<f64>() + 1) as u64;
    println!("DP table memory: {:.2} MiB", table_bytes as f64 / (1024.0 * 1024.0));

    let solution = exact::solve(&instance.points)?;
    println!("Optimal length: {:.2} ({:.4}s)", solution.length, solution.computation_time);

    Ok(())
}

fn compare_algorithms(input: &InputArgs, output: Option<PathBuf>) -> Result<(), SolverError> {
    let instance = input.load()?;
    let dist = instance.distance_matrix()?;

    println!("Comparing solvers on {} (n={})...\n", instance.name, instance.dimension());

    let mut rows = Vec::new();
    for mode in [ReconstructionMode::Predecessor, ReconstructionMode::Scan, ReconstructionMode::Legacy] {
        for parallel in [false, true] {
            let config = SolverConfig { reconstruction: mode, parallel, ..Default::default() };
            let start = Instant::now();
            let solution = HeldKarpSolver::new(config).solve_matrix(&dist)?;
            let name = if parallel {
                format!("{}-parallel", solution.algorithm)
            } else {
                solution.algorithm.clone()
            };
            rows.push((name, solution.length, start.elapsed().as_secs_f64(), solution.tour));
        }
    }

    match exact::solve_brute_force(&dist) {
        Ok(solution) => rows.push((solution.algorithm.clone(), solution.length, solution.computation_time, solution.tour)),
        Err(SolverError::CapacityExceeded { max, .. }) => {
            log::info!("Skipping brute force: instance exceeds {} points", max);
        }
        Err(e) => return Err(e),
    }

    println!("{:<32} {:>12} {:>12}  Tour", "Algorithm", "Length", "Time");
    println!("{}", "-".repeat(72));
    for (name, length, time, tour) in &rows {
        println!("{:<32} {:>12.4} {:>12.6}  {:?}", name, length, time, tour);
    }

    if let Some(out_path) = output {
        let mut csv = String::new();
        csv.push_str("algorithm,length,time\n");
        for (name, length, time, _) in &rows {
            csv.push_str(&format!("{},{:.6},{:.6}\n", name, length, time));
        }
        std::fs::write(&out_path, csv)?;
        println!("\nResults exported to {:?}", out_path);
    }

    Ok(())
}

fn run_benchmark(config: BenchmarkConfig, output: &Path) -> Result<(), SolverError> {
    let mut benchmark = Benchmark::new(config);
    let instances = benchmark.generate_instances();

    println!("Generated {} instances", instances.len());
    if instances.is_empty() {
        eprintln!("No instances to run!");
        return Ok(());
    }

    std::fs::create_dir_all(output)?;

    benchmark.run_on_instances(&instances)?;

    let results_path = output.join("results.csv");
    benchmark.export_to_csv(&results_path)?;
    println!("\nResults exported to {:?}", results_path);

    let stats_path = output.join("statistics.csv");
    benchmark.export_statistics_csv(&stats_path)?;
    println!("Statistics exported to {:?}", stats_path);

    let report = benchmark.generate_report();
    println!("\n{}", report);

    let report_path = output.join("report.txt");
    std::fs::write(&report_path, &report)?;
    println!("Report saved to {:?}", report_path);

    Ok(())
}
