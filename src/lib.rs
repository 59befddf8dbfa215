//! # spmv-bench: correctness and performance harness for CSR SpMV
//!
//! Loads a square sparse matrix from a Matrix Market coordinate file,
//! multiplies it by a seeded random vector with a sequential reference
//! kernel and with an accelerator, times the accelerator over repeated
//! trials and checks the two results against a relative tolerance.
//!
//! ## Components
//!
//! 1. **Loading**: [`read_matrix`] parses the file and assembles canonical
//!    CSR arrays (sorted columns, one entry per coordinate).
//!
//! 2. **Reference kernel**: [`reference_spmv`] is the sequential oracle.
//!
//! 3. **Input vector**: [`generate_vector`] draws reproducible values in
//!    `[0, 1)` from a ChaCha8 stream.
//!
//! 4. **Accelerator**: [`SparseDevice`] describes the accelerator runtime;
//!    [`AcceleratedSpmv`] stages a matrix on any device and runs the
//!    two-phase multiply. [`HostDevice`] is an in-process device built on
//!    aligned buffers and a rayon pool.
//!
//! 5. **Benchmark**: [`run_benchmark`] times both kernels and compares the
//!    results; [`run_fixed_example`] is the embedded 4x4 self-test.
//!
//! ## Usage
//!
//! ```
//! use spmv_bench::{run_benchmark, BenchConfig, HostDevice, SparseMatrixCSR};
//!
//! let a = SparseMatrixCSR::<f64>::identity(8);
//! let device = HostDevice::new().unwrap();
//! let config = BenchConfig::default().with_trials(2);
//!
//! let result = run_benchmark(&device, &a, &config).unwrap();
//! assert!(result.passed());
//! ```

pub mod bench;
pub mod constants;
pub mod device;
pub mod element;
pub mod error;
pub mod io;
pub mod matrix;
pub mod utils;
pub mod vector;

// Re-export primary components
pub use bench::{
    compare_exact, compare_relative, run_benchmark, run_fixed_example, BenchConfig,
    BenchmarkResult, Comparison, ExampleOutcome, Mismatch,
};
pub use device::{
    accelerated_spmv, AcceleratedSpmv, DataType, HostDevice, HostDeviceConfig, ScalarValue,
    SparseDevice, SpmvAlgorithm,
};
pub use element::Element;
pub use error::{BenchError, DeviceError, LoadError, MatrixError};
pub use io::{parse_matrix, read_matrix, write_matrix, write_matrix_file, MatrixMarketBanner};
pub use matrix::{reference_spmv, reference_spmv_into, DuplicatePolicy, SparseMatrixCSR, TripletBuilder};
pub use utils::{to_dense, to_sprs_csr};
pub use vector::{generate_vector, VectorGenerator};

/// Version information for the spmv-bench library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
