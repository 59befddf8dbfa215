use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use log::info;
use rand::distributions::{Distribution, Standard};

use spmv_bench::constants::{DEFAULT_RELATIVE_TOLERANCE, DEFAULT_TRIALS, DEFAULT_VECTOR_SEED};
use spmv_bench::{
    read_matrix, run_benchmark, BenchConfig, DuplicatePolicy, Element, HostDevice,
    HostDeviceConfig, SpmvAlgorithm,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Algorithm {
    Adaptive,
    RowSplit,
}

impl From<Algorithm> for SpmvAlgorithm {
    fn from(a: Algorithm) -> Self {
        match a {
            Algorithm::Adaptive => SpmvAlgorithm::Adaptive,
            Algorithm::RowSplit => SpmvAlgorithm::RowSplit,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Duplicates {
    LastWins,
    Sum,
}

impl From<Duplicates> for DuplicatePolicy {
    fn from(d: Duplicates) -> Self {
        match d {
            Duplicates::LastWins => DuplicatePolicy::LastWins,
            Duplicates::Sum => DuplicatePolicy::Sum,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Precision {
    F32,
    F64,
}

/// Time CSR SpMV on the accelerator against a sequential reference.
/// Exits non-zero if any element of the results differs beyond tolerance.
#[derive(Parser, Debug)]
#[command(name = "spmv-bench", version)]
struct Cli {
    /// Matrix Market coordinate file holding a square real matrix
    matrix: PathBuf,

    /// Number of timed accelerator trials
    #[arg(long, default_value_t = DEFAULT_TRIALS)]
    trials: usize,

    /// Relative tolerance of the final comparison
    #[arg(long, default_value_t = DEFAULT_RELATIVE_TOLERANCE)]
    tolerance: f64,

    /// Seed of the input vector
    #[arg(long, default_value_t = DEFAULT_VECTOR_SEED)]
    seed: u64,

    /// Accelerator SpMV algorithm
    #[arg(long, value_enum, default_value_t = Algorithm::Adaptive)]
    algorithm: Algorithm,

    /// Resolution of repeated coordinates in the file
    #[arg(long, value_enum, default_value_t = Duplicates::LastWins)]
    duplicates: Duplicates,

    /// Element precision
    #[arg(long, value_enum, default_value_t = Precision::F32)]
    precision: Precision,

    /// Device worker threads [default: all cores]
    #[arg(long)]
    threads: Option<usize>,
}

impl Cli {
    fn config(&self) -> BenchConfig {
        let config = BenchConfig::default()
            .with_trials(self.trials)
            .with_tolerance(self.tolerance)
            .with_seed(self.seed)
            .with_algorithm(self.algorithm.into())
            .with_duplicate_policy(self.duplicates.into());
        match self.threads {
            Some(n) => config.with_threads(n),
            None => config,
        }
    }
}

fn run<T>(path: &Path, config: &BenchConfig) -> Result<bool>
where
    T: Element,
    Standard: Distribution<T>,
{
    config.validate()?;

    let matrix = read_matrix::<T, _>(path, config.duplicate_policy)
        .with_context(|| format!("loading {}", path.display()))?;
    info!(
        "Loaded {} x {} matrix with {} nonzeros",
        matrix.n_rows,
        matrix.n_cols,
        matrix.nnz()
    );

    let device = HostDevice::with_config(HostDeviceConfig {
        n_threads: config.n_threads,
        memory_limit: None,
    })
    .context("initialising device")?;

    let result = run_benchmark(&device, &matrix, config).context("running benchmark")?;

    for m in &result.comparison.mismatches {
        println!(
            "Mismatch at {}: reference = {}, accelerated = {}, diff = {:e} (allowed {:e})",
            m.index, m.reference, m.accelerated, m.diff, m.allowed
        );
    }
    println!("{}", result);

    Ok(result.passed())
}

fn main() -> Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = cli.config();

    let passed = match cli.precision {
        Precision::F32 => run::<f32>(&cli.matrix, &config)?,
        Precision::F64 => run::<f64>(&cli.matrix, &config)?,
    };

    Ok(if passed {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
