//! The embedded 4x4 self-test

use log::info;

use crate::bench::compare::compare_exact;
use crate::constants::{
    EXAMPLE_COL_IDX, EXAMPLE_DIM, EXAMPLE_EXPECTED_Y, EXAMPLE_ROW_PTR, EXAMPLE_VALUES, EXAMPLE_X,
};
use crate::device::{AcceleratedSpmv, SparseDevice, SpmvAlgorithm};
use crate::error::BenchError;
use crate::matrix::SparseMatrixCSR;

/// The embedded example matrix
pub fn example_matrix() -> Result<SparseMatrixCSR<f32>, BenchError> {
    let matrix = SparseMatrixCSR::try_new(
        EXAMPLE_DIM,
        EXAMPLE_DIM,
        EXAMPLE_ROW_PTR.to_vec(),
        EXAMPLE_COL_IDX.to_vec(),
        EXAMPLE_VALUES.to_vec(),
    )?;
    Ok(matrix)
}

/// Result of the embedded example
#[derive(Debug, Clone, PartialEq)]
pub struct ExampleOutcome {
    pub device_name: String,
    pub computed: Vec<f32>,
    pub expected: Vec<f32>,
    /// First index where `computed` differs from `expected`
    pub first_mismatch: Option<usize>,
}

impl ExampleOutcome {
    pub fn passed(&self) -> bool {
        self.first_mismatch.is_none()
    }
}

/// Runs the embedded example once and checks the result for exact equality
pub fn run_fixed_example<D>(device: &D, algorithm: SpmvAlgorithm) -> Result<ExampleOutcome, BenchError>
where
    D: SparseDevice + ?Sized,
{
    let matrix = example_matrix()?;
    let spmv = AcceleratedSpmv::new(device, &matrix, algorithm)?;
    let device_name = spmv.device_name();
    info!("Running embedded example on {}", device_name);

    let mut computed = vec![0.0f32; EXAMPLE_DIM];
    spmv.run(&EXAMPLE_X, &mut computed)?;

    let expected = EXAMPLE_EXPECTED_Y.to_vec();
    let first_mismatch = compare_exact(&expected, &computed)?;

    Ok(ExampleOutcome {
        device_name,
        computed,
        expected,
        first_mismatch,
    })
}
