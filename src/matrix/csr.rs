//! Compressed Sparse Row (CSR) matrix format implementation

use std::fmt;
use num_traits::Num;

use crate::constants::{DEBUG_MAX_ENTRIES, DEBUG_MAX_ROWS};
use crate::error::MatrixError;

/// A sparse matrix in Compressed Sparse Row (CSR) format
///
/// The CSR format stores a sparse matrix using three arrays:
/// - row_ptr: Array of size n_rows + 1 containing indices into col_idx and values arrays
/// - col_idx: Array of size nnz containing column indices of non-zero elements
/// - values: Array of size nnz containing the non-zero values
///
/// Matrices built by the loader are canonical: column indices are strictly
/// ascending within each row and no coordinate appears twice. A matrix is
/// never mutated after it has been built.
#[derive(Clone, PartialEq)]
pub struct SparseMatrixCSR<T> {
    /// Number of rows in the matrix
    pub n_rows: usize,

    /// Number of columns in the matrix
    pub n_cols: usize,

    /// Row pointers (size: n_rows + 1)
    /// row_ptr[i] is the index in col_idx and values where row i starts
    /// row_ptr[n_rows] is equal to nnz
    pub row_ptr: Vec<usize>,

    /// Column indices (size: nnz)
    pub col_idx: Vec<usize>,

    /// Non-zero values (size: nnz)
    pub values: Vec<T>,
}

impl<T> SparseMatrixCSR<T>
where
    T: Copy + Num,
{
    /// Creates a new CSR matrix with the given dimensions and data
    ///
    /// # Arguments
    ///
    /// * `n_rows` - Number of rows
    /// * `n_cols` - Number of columns
    /// * `row_ptr` - Row pointers
    /// * `col_idx` - Column indices
    /// * `values` - Non-zero values
    ///
    /// # Panics
    ///
    /// Panics if the input arrays are inconsistent:
    /// - row_ptr.len() must be n_rows + 1
    /// - col_idx.len() must equal values.len()
    /// - row_ptr[n_rows] must equal col_idx.len()
    pub fn new(
        n_rows: usize,
        n_cols: usize,
        row_ptr: Vec<usize>,
        col_idx: Vec<usize>,
        values: Vec<T>,
    ) -> Self {
        assert_eq!(row_ptr.len(), n_rows + 1, "row_ptr.len() must be n_rows + 1");
        assert_eq!(col_idx.len(), values.len(), "col_idx.len() must equal values.len()");
        assert_eq!(
            row_ptr[n_rows], col_idx.len(),
            "row_ptr[n_rows] must equal col_idx.len()"
        );

        // Check that column indices are within bounds
        for &col in &col_idx {
            assert!(col < n_cols, "Column index {} out of bounds (n_cols = {})", col, n_cols);
        }

        Self {
            n_rows,
            n_cols,
            row_ptr,
            col_idx,
            values,
        }
    }

    /// Creates a CSR matrix after checking every structural invariant
    ///
    /// Unlike [`SparseMatrixCSR::new`], this also requires `row_ptr` to start
    /// at zero and never decrease, and column indices to be strictly
    /// ascending within each row.
    pub fn try_new(
        n_rows: usize,
        n_cols: usize,
        row_ptr: Vec<usize>,
        col_idx: Vec<usize>,
        values: Vec<T>,
    ) -> Result<Self, MatrixError> {
        let matrix = Self {
            n_rows,
            n_cols,
            row_ptr,
            col_idx,
            values,
        };
        matrix.validate()?;
        Ok(matrix)
    }

    /// Checks the CSR invariants of this matrix
    pub fn validate(&self) -> Result<(), MatrixError> {
        if self.row_ptr.len() != self.n_rows + 1 {
            return Err(MatrixError::RowPtrLength {
                len: self.row_ptr.len(),
                expected: self.n_rows + 1,
            });
        }
        if self.col_idx.len() != self.values.len() {
            return Err(MatrixError::LengthMismatch {
                col_idx: self.col_idx.len(),
                values: self.values.len(),
            });
        }
        if self.row_ptr[0] != 0 {
            return Err(MatrixError::RowPtrStart(self.row_ptr[0]));
        }
        if self.row_ptr[self.n_rows] != self.col_idx.len() {
            return Err(MatrixError::NnzMismatch {
                row_ptr_end: self.row_ptr[self.n_rows],
                nnz: self.col_idx.len(),
            });
        }

        for (row, w) in self.row_ptr.windows(2).enumerate() {
            if w[0] > w[1] {
                return Err(MatrixError::RowPtrNotMonotonic {
                    row,
                    start: w[0],
                    end: w[1],
                });
            }
        }

        // row_ptr is now non-decreasing and ends at nnz, so every range is in bounds
        for row in 0..self.n_rows {
            let cols = &self.col_idx[self.row_ptr[row]..self.row_ptr[row + 1]];
            if let Some(&col) = cols.iter().find(|&&col| col >= self.n_cols) {
                return Err(MatrixError::ColumnOutOfBounds {
                    row,
                    col,
                    n_cols: self.n_cols,
                });
            }
            if cols.windows(2).any(|w| w[0] >= w[1]) {
                return Err(MatrixError::ColumnsNotSorted { row });
            }
        }

        Ok(())
    }

    /// Returns the number of non-zero elements in the matrix
    pub fn nnz(&self) -> usize {
        self.values.len()
    }

    /// Returns true when the matrix has as many rows as columns
    pub fn is_square(&self) -> bool {
        self.n_rows == self.n_cols
    }

    /// Returns an iterator over the non-zero elements in row i
    ///
    /// Each item is a tuple (col_idx, value) representing a non-zero element
    pub fn row_iter(&self, i: usize) -> impl Iterator<Item = (usize, &T)> {
        assert!(i < self.n_rows, "Row index out of bounds");

        let start = self.row_ptr[i];
        let end = self.row_ptr[i + 1];

        self.col_idx[start..end]
            .iter()
            .zip(&self.values[start..end])
            .map(|(&col, val)| (col, val))
    }

    /// Expands the matrix back into `(row, col, value)` triples in row-major order
    pub fn triplets(&self) -> impl Iterator<Item = (usize, usize, T)> + '_ {
        (0..self.n_rows).flat_map(move |i| self.row_iter(i).map(move |(j, &v)| (i, j, v)))
    }

    /// Creates an empty matrix with the given dimensions
    pub fn zeros(n_rows: usize, n_cols: usize) -> Self {
        let row_ptr = vec![0; n_rows + 1];
        let col_idx = Vec::new();
        let values = Vec::new();

        Self {
            n_rows,
            n_cols,
            row_ptr,
            col_idx,
            values,
        }
    }

    /// Creates an identity matrix of the given size
    pub fn identity(n: usize) -> Self {
        Self {
            n_rows: n,
            n_cols: n,
            row_ptr: (0..=n).collect(),
            col_idx: (0..n).collect(),
            values: vec![T::one(); n],
        }
    }
}

impl<T: fmt::Debug + Copy + Num> fmt::Debug for SparseMatrixCSR<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "SparseMatrixCSR {{")?;
        writeln!(f, "  dimensions: {} × {}", self.n_rows, self.n_cols)?;
        writeln!(f, "  nnz: {}", self.nnz())?;

        let max_rows_to_print = DEBUG_MAX_ROWS.min(self.n_rows);

        if max_rows_to_print > 0 {
            writeln!(f, "  content sample:")?;

            for i in 0..max_rows_to_print {
                write!(f, "    row {}: ", i)?;
                let start = self.row_ptr[i];
                let end = self.row_ptr[i + 1];

                if start == end {
                    writeln!(f, "(empty)")?;
                } else {
                    let max_elements = DEBUG_MAX_ENTRIES.min(end - start);

                    for j in start..(start + max_elements) {
                        write!(f, "({}, {:?}) ", self.col_idx[j], self.values[j])?;
                    }

                    if end - start > max_elements {
                        write!(f, "... ({} more)", end - start - max_elements)?;
                    }

                    writeln!(f)?;
                }
            }

            if self.n_rows > max_rows_to_print {
                writeln!(f, "    ... ({} more rows)", self.n_rows - max_rows_to_print)?;
            }
        }

        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_matrix() {
        let matrix = SparseMatrixCSR::new(
            3, 3,
            vec![0, 2, 3, 5],
            vec![0, 1, 1, 0, 2],
            vec![1, 2, 3, 4, 5],
        );

        assert_eq!(matrix.n_rows, 3);
        assert_eq!(matrix.n_cols, 3);
        assert_eq!(matrix.nnz(), 5);
        assert!(matrix.is_square());
    }

    #[test]
    fn test_row_iter() {
        let matrix = SparseMatrixCSR::new(
            3, 3,
            vec![0, 2, 3, 5],
            vec![0, 1, 1, 0, 2],
            vec![1, 2, 3, 4, 5],
        );

        let row0: Vec<_> = matrix.row_iter(0).collect();
        assert_eq!(row0, vec![(0, &1), (1, &2)]);

        let row1: Vec<_> = matrix.row_iter(1).collect();
        assert_eq!(row1, vec![(1, &3)]);

        let row2: Vec<_> = matrix.row_iter(2).collect();
        assert_eq!(row2, vec![(0, &4), (2, &5)]);
    }

    #[test]
    fn test_triplets_skip_empty_rows() {
        let matrix = SparseMatrixCSR::new(
            4, 4,
            vec![0, 1, 1, 1, 3],
            vec![2, 0, 3],
            vec![7.0, 8.0, 9.0],
        );

        let triplets: Vec<_> = matrix.triplets().collect();
        assert_eq!(triplets, vec![(0, 2, 7.0), (3, 0, 8.0), (3, 3, 9.0)]);
    }

    #[test]
    fn test_identity() {
        let identity = SparseMatrixCSR::<i32>::identity(3);

        assert_eq!(identity.n_rows, 3);
        assert_eq!(identity.n_cols, 3);
        assert_eq!(identity.nnz(), 3);

        assert_eq!(identity.row_ptr, vec![0, 1, 2, 3]);
        assert_eq!(identity.col_idx, vec![0, 1, 2]);
        assert_eq!(identity.values, vec![1, 1, 1]);
    }

    #[test]
    fn test_try_new_accepts_canonical() {
        let matrix = SparseMatrixCSR::try_new(
            2, 3,
            vec![0, 2, 2],
            vec![0, 2],
            vec![1.0, 2.0],
        );
        assert!(matrix.is_ok());
    }

    #[test]
    fn test_try_new_rejects_unsorted_columns() {
        let err = SparseMatrixCSR::try_new(
            2, 3,
            vec![0, 2, 2],
            vec![2, 0],
            vec![1.0, 2.0],
        )
        .unwrap_err();
        assert_eq!(err, MatrixError::ColumnsNotSorted { row: 0 });
    }

    #[test]
    fn test_try_new_rejects_duplicate_column() {
        let err = SparseMatrixCSR::try_new(
            1, 3,
            vec![0, 2],
            vec![1, 1],
            vec![1.0, 2.0],
        )
        .unwrap_err();
        assert_eq!(err, MatrixError::ColumnsNotSorted { row: 0 });
    }

    #[test]
    fn test_try_new_rejects_decreasing_row_ptr() {
        let err = SparseMatrixCSR::try_new(
            3, 3,
            vec![0, 2, 1, 2],
            vec![0, 1],
            vec![1.0, 2.0],
        )
        .unwrap_err();
        assert_eq!(err, MatrixError::RowPtrNotMonotonic { row: 1, start: 2, end: 1 });
    }

    #[test]
    fn test_try_new_rejects_out_of_bounds_column() {
        let err = SparseMatrixCSR::try_new(
            1, 2,
            vec![0, 1],
            vec![5],
            vec![1.0],
        )
        .unwrap_err();
        assert_eq!(err, MatrixError::ColumnOutOfBounds { row: 0, col: 5, n_cols: 2 });
    }

    #[test]
    fn test_try_new_rejects_nonzero_start() {
        let err = SparseMatrixCSR::try_new(
            1, 2,
            vec![1, 1],
            vec![0],
            vec![1.0],
        )
        .unwrap_err();
        assert_eq!(err, MatrixError::RowPtrStart(1));
    }

    #[test]
    #[should_panic(expected = "row_ptr.len() must be n_rows + 1")]
    fn test_invalid_row_ptr() {
        SparseMatrixCSR::new(
            3, 3,
            vec![0, 2, 3], // Missing last element
            vec![0, 1, 1, 0, 2],
            vec![1, 2, 3, 4, 5],
        );
    }

    #[test]
    #[should_panic(expected = "col_idx.len() must equal values.len()")]
    fn test_inconsistent_lengths() {
        SparseMatrixCSR::new(
            3, 3,
            vec![0, 2, 3, 5],
            vec![0, 1, 1, 0, 2],
            vec![1, 2, 3, 4], // Missing last element
        );
    }
}
