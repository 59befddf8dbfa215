//! Benchmark driver: configuration, timed trials and result comparison

pub mod compare;
pub mod config;
pub mod example;
pub mod harness;

pub use compare::{compare_exact, compare_relative, Comparison, Mismatch};
pub use config::BenchConfig;
pub use example::{example_matrix, run_fixed_example, ExampleOutcome};
pub use harness::{run_benchmark, BenchmarkResult};
