use crate::constants::{DEFAULT_RELATIVE_TOLERANCE, DEFAULT_TRIALS, DEFAULT_VECTOR_SEED};
use crate::device::SpmvAlgorithm;
use crate::error::BenchError;
use crate::matrix::DuplicatePolicy;

/// Configuration of a benchmark run
#[derive(Debug, Clone, PartialEq)]
pub struct BenchConfig {
    /// Number of timed accelerator trials (at least 1)
    pub trials: usize,

    /// Relative tolerance for the final comparison
    pub tolerance: f64,

    /// Seed of the shared input vector
    pub seed: u64,

    /// Accelerator SpMV algorithm
    pub algorithm: SpmvAlgorithm,

    /// Resolution of repeated coordinates when loading
    pub duplicate_policy: DuplicatePolicy,

    /// Worker threads of the host device
    pub n_threads: usize,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            trials: DEFAULT_TRIALS,
            tolerance: DEFAULT_RELATIVE_TOLERANCE,
            seed: DEFAULT_VECTOR_SEED,
            algorithm: SpmvAlgorithm::default(),
            duplicate_policy: DuplicatePolicy::default(),
            n_threads: num_cpus::get(),
        }
    }
}

impl BenchConfig {
    pub fn with_trials(mut self, trials: usize) -> Self {
        self.trials = trials;
        self
    }

    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_algorithm(mut self, algorithm: SpmvAlgorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    pub fn with_duplicate_policy(mut self, policy: DuplicatePolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }

    pub fn with_threads(mut self, n_threads: usize) -> Self {
        self.n_threads = n_threads;
        self
    }

    /// Rejects settings no run can use
    pub fn validate(&self) -> Result<(), BenchError> {
        if self.trials == 0 {
            return Err(BenchError::Config("at least one trial is required".into()));
        }
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(BenchError::Config(format!(
                "tolerance must be finite and non-negative, got {}",
                self.tolerance
            )));
        }
        if self.n_threads == 0 {
            return Err(BenchError::Config("at least one device thread is required".into()));
        }
        Ok(())
    }
}
