//! Centralized constants for the SpMV benchmarking harness
//!
//! This module contains all hardcoded constants used throughout the codebase.
//! Constants are organized by category for easy reference and maintenance.

// ============================================================================
// BENCHMARK DEFAULTS
// ============================================================================

/// Number of timed accelerator trials for a file-driven run
pub const DEFAULT_TRIALS: usize = 10;

/// Relative tolerance used when comparing reference and accelerated results
///
/// Element `i` mismatches when `|ref[i] - acc[i]| > tol * |acc[i]|`.
pub const DEFAULT_RELATIVE_TOLERANCE: f64 = 0.02;

/// Seed for the shared input vector
pub const DEFAULT_VECTOR_SEED: u64 = 54321;

// ============================================================================
// DEVICE PARAMETERS
// ============================================================================

/// Alignment of every device allocation in bytes
pub const DEVICE_BUFFER_ALIGNMENT: usize = 64;

/// Target number of nonzeros per row block for the adaptive kernel
pub const ADAPTIVE_BLOCK_NNZ: usize = 1024;

/// Size in bytes of one row-block boundary stored in the workspace
pub const ADAPTIVE_BOUNDARY_BYTES: usize = std::mem::size_of::<u32>();

// ============================================================================
// FIXED EXAMPLE
// ============================================================================

/// Dimension of the embedded example matrix
pub const EXAMPLE_DIM: usize = 4;

/// Row pointers of the embedded example matrix
pub const EXAMPLE_ROW_PTR: [usize; 5] = [0, 3, 4, 7, 9];

/// Column indices of the embedded example matrix
pub const EXAMPLE_COL_IDX: [usize; 9] = [0, 2, 3, 1, 0, 2, 3, 1, 3];

/// Values of the embedded example matrix
pub const EXAMPLE_VALUES: [f32; 9] = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0];

/// Input vector of the embedded example
pub const EXAMPLE_X: [f32; 4] = [1.0, 2.0, 3.0, 4.0];

/// Expected output of the embedded example
pub const EXAMPLE_EXPECTED_Y: [f32; 4] = [19.0, 8.0, 51.0, 52.0];

// ============================================================================
// DISPLAY
// ============================================================================

/// Rows shown by the sampled `Debug` rendering of a CSR matrix
pub const DEBUG_MAX_ROWS: usize = 5;

/// Entries per row shown by the sampled `Debug` rendering
pub const DEBUG_MAX_ENTRIES: usize = 5;
