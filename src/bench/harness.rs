//! Timed comparison of the accelerated kernel against the reference

use std::fmt;
use std::time::{Duration, Instant};

use log::info;
use rand::distributions::{Distribution, Standard};

use crate::bench::compare::{compare_relative, Comparison};
use crate::bench::config::BenchConfig;
use crate::device::{AcceleratedSpmv, SparseDevice};
use crate::element::Element;
use crate::error::BenchError;
use crate::matrix::{reference_spmv, SparseMatrixCSR};
use crate::vector::generate_vector;

fn millis(d: Duration) -> f64 {
    d.as_secs_f64() * 1000.0
}

/// Timings and verdict of one benchmark run
#[derive(Debug, Clone)]
pub struct BenchmarkResult<T> {
    pub device_name: String,
    pub n_rows: usize,
    pub n_cols: usize,
    pub nnz: usize,
    pub reference_time: Duration,
    /// One entry per accelerated trial, each covering transfer and compute
    pub trial_times: Vec<Duration>,
    /// Final accelerated output against the reference output
    pub comparison: Comparison<T>,
}

impl<T> BenchmarkResult<T> {
    pub fn passed(&self) -> bool {
        self.comparison.is_match()
    }

    pub fn min_trial_time(&self) -> Option<Duration> {
        self.trial_times.iter().min().copied()
    }

    pub fn mean_trial_time(&self) -> Option<Duration> {
        if self.trial_times.is_empty() {
            return None;
        }
        let total: Duration = self.trial_times.iter().sum();
        Some(total.div_f64(self.trial_times.len() as f64))
    }
}

impl<T> fmt::Display for BenchmarkResult<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Device:        {}", self.device_name)?;
        writeln!(
            f,
            "Matrix:        {} x {}, {} nonzeros",
            self.n_rows, self.n_cols, self.nnz
        )?;
        writeln!(f, "Reference:     {:.3} ms", millis(self.reference_time))?;
        if let (Some(min), Some(mean)) = (self.min_trial_time(), self.mean_trial_time()) {
            writeln!(
                f,
                "Accelerated:   {} trials, min {:.3} ms, mean {:.3} ms",
                self.trial_times.len(),
                millis(min),
                millis(mean)
            )?;
        }
        writeln!(f, "Max abs diff:  {:e}", self.comparison.max_abs_diff)?;
        write!(
            f,
            "Result:        {} ({} of {} elements mismatched)",
            if self.passed() { "PASSED" } else { "FAILED" },
            self.comparison.mismatch_count(),
            self.comparison.len
        )
    }
}

/// Runs the reference kernel once and the accelerated kernel `config.trials`
/// times on the same seeded input vector, then compares the final
/// accelerated output against the reference
pub fn run_benchmark<D, T>(
    device: &D,
    matrix: &SparseMatrixCSR<T>,
    config: &BenchConfig,
) -> Result<BenchmarkResult<T>, BenchError>
where
    D: SparseDevice + ?Sized,
    T: Element,
    Standard: Distribution<T>,
{
    config.validate()?;
    if !matrix.is_square() {
        return Err(BenchError::NotSquare {
            rows: matrix.n_rows,
            cols: matrix.n_cols,
        });
    }

    let x: Vec<T> = generate_vector(matrix.n_cols, config.seed);

    info!("Running reference SpMV");
    let start = Instant::now();
    let y_reference = reference_spmv(matrix, &x);
    let reference_time = start.elapsed();
    info!("Reference SpMV: {:.3} ms", millis(reference_time));

    let spmv = AcceleratedSpmv::new(device, matrix, config.algorithm)?;
    let device_name = spmv.device_name();
    info!("Running accelerated SpMV on {} ({:?})", device_name, spmv.algorithm());

    let mut y_accelerated = vec![T::zero(); matrix.n_rows];
    let mut trial_times = Vec::with_capacity(config.trials);
    for trial in 1..=config.trials {
        let start = Instant::now();
        spmv.run(&x, &mut y_accelerated)?;
        let elapsed = start.elapsed();
        info!("Trial {}/{}: {:.3} ms", trial, config.trials, millis(elapsed));
        trial_times.push(elapsed);
    }

    let comparison = compare_relative(&y_reference, &y_accelerated, config.tolerance)?;

    Ok(BenchmarkResult {
        device_name,
        n_rows: matrix.n_rows,
        n_cols: matrix.n_cols,
        nnz: matrix.nnz(),
        reference_time,
        trial_times,
        comparison,
    })
}
