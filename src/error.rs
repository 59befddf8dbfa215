//! Error types for loading, device dispatch and benchmarking

use std::path::PathBuf;

use crate::device::{BufferId, DataType, DescriptorId, HandleId};

/// Violations of the CSR structural invariants
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MatrixError {
    /// `row_ptr` does not have `n_rows + 1` entries
    #[error("row_ptr has length {len}, expected {expected}")]
    RowPtrLength { len: usize, expected: usize },

    /// `row_ptr[0]` is not zero
    #[error("row_ptr must start at 0, found {0}")]
    RowPtrStart(usize),

    /// `row_ptr` decreases somewhere
    #[error("row_ptr decreases at row {row}: {start} > {end}")]
    RowPtrNotMonotonic { row: usize, start: usize, end: usize },

    /// `row_ptr[n_rows]` disagrees with the stored entry count
    #[error("row_ptr ends at {row_ptr_end} but {nnz} entries are stored")]
    NnzMismatch { row_ptr_end: usize, nnz: usize },

    /// `col_idx` and `values` differ in length
    #[error("{col_idx} column indices but {values} values")]
    LengthMismatch { col_idx: usize, values: usize },

    /// A row index lies outside `[0, n_rows)`
    #[error("row index {row} out of bounds (n_rows = {n_rows})")]
    RowOutOfBounds { row: usize, n_rows: usize },

    /// A column index lies outside `[0, n_cols)`
    #[error("column index {col} in row {row} out of bounds (n_cols = {n_cols})")]
    ColumnOutOfBounds { row: usize, col: usize, n_cols: usize },

    /// Column indices of a row are not strictly ascending
    #[error("column indices of row {row} are not strictly ascending")]
    ColumnsNotSorted { row: usize },
}

/// Failures while reading a Matrix Market file
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// The file could not be opened or read
    #[error("could not read matrix file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reading from an already opened stream failed
    #[error("read error: {0}")]
    Read(#[from] std::io::Error),

    /// The first line is not a `%%MatrixMarket` banner
    #[error("could not process Matrix Market banner: {0}")]
    InvalidBanner(String),

    /// The banner is well formed but names a type this harness rejects
    #[error("unsupported Matrix Market type: [{0}]")]
    Unsupported(String),

    /// The size line is missing or malformed
    #[error("invalid size line: {0:?}")]
    InvalidSize(String),

    /// Only square matrices are benchmarked
    #[error("matrix must be square, declared {rows} x {cols}")]
    NotSquare { rows: usize, cols: usize },

    /// An entry line could not be parsed
    #[error("line {line}: malformed entry {text:?}")]
    InvalidEntry { line: usize, text: String },

    /// An entry addresses a coordinate outside the declared shape
    #[error("line {line}: entry ({row}, {col}) outside {rows} x {cols} (indices are 1-based)")]
    IndexOutOfRange {
        line: usize,
        row: i64,
        col: i64,
        rows: usize,
        cols: usize,
    },

    /// The input ended before all declared entries were read
    #[error("expected {expected} entries, found only {found}")]
    TruncatedEntries { expected: usize, found: usize },

    /// The assembled matrix violates a CSR invariant
    #[error(transparent)]
    Matrix(#[from] MatrixError),
}

/// Failures reported by an accelerator
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DeviceError {
    /// An allocation exceeded the available device memory
    #[error("out of device memory: requested {requested} bytes, {available} available")]
    OutOfMemory { requested: usize, available: usize },

    /// The handle does not exist or was already destroyed
    #[error("invalid handle {0:?}")]
    InvalidHandle(HandleId),

    /// The buffer does not exist or was already freed
    #[error("invalid buffer {0:?}")]
    InvalidBuffer(BufferId),

    /// The descriptor does not exist, was destroyed, or has the wrong kind
    #[error("invalid descriptor {0:?}")]
    InvalidDescriptor(DescriptorId),

    /// A transfer or binding does not match the buffer size
    #[error("size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },

    /// Operand data types disagree with the compute type
    #[error("data type mismatch: expected {expected:?}, found {found:?}")]
    TypeMismatch { expected: DataType, found: DataType },

    /// The scratch workspace is smaller than the size query reported
    #[error("workspace too small: {required} bytes required, {provided} provided")]
    WorkspaceTooSmall { required: usize, provided: usize },

    /// Operand dimensions are inconsistent
    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),

    /// The device-resident CSR arrays are malformed
    #[error("malformed device matrix: {0}")]
    InvalidMatrix(String),

    /// A host index does not fit the 32-bit device index type
    #[error("index {0} does not fit a 32-bit device index")]
    IndexOverflow(usize),

    /// The device execution resources could not be created
    #[error("device initialisation failed: {0}")]
    Init(String),
}

/// Failures of a benchmark run
#[derive(Debug, thiserror::Error)]
pub enum BenchError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Device(#[from] DeviceError),

    #[error(transparent)]
    Matrix(#[from] MatrixError),

    /// Only square matrices are benchmarked
    #[error("matrix must be square, got {rows} x {cols}")]
    NotSquare { rows: usize, cols: usize },

    /// The benchmark configuration is unusable
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The two result vectors cannot be compared
    #[error("result length mismatch: reference {reference}, accelerated {accelerated}")]
    LengthMismatch { reference: usize, accelerated: usize },
}
