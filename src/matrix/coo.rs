//! Assembly of CSR matrices from unordered coordinate triples

use std::collections::BTreeMap;

use num_traits::Num;

use crate::error::MatrixError;
use crate::matrix::SparseMatrixCSR;
use crate::utils::exclusive_scan;

/// How repeated `(row, col)` coordinates are resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DuplicatePolicy {
    /// A later triple replaces the value of an earlier one
    #[default]
    LastWins,
    /// Values of repeated coordinates are added together
    Sum,
}

/// Collects `(row, col, value)` triples in any order and builds a canonical
/// CSR matrix from them
///
/// Entries are keyed by `(row, col)` in a `BTreeMap`, so iteration yields
/// them row-major with ascending columns, which is exactly the CSR order.
#[derive(Debug, Clone)]
pub struct TripletBuilder<T> {
    n_rows: usize,
    n_cols: usize,
    policy: DuplicatePolicy,
    entries: BTreeMap<(usize, usize), T>,
    duplicates: usize,
}

impl<T> TripletBuilder<T>
where
    T: Copy + Num,
{
    pub fn new(n_rows: usize, n_cols: usize, policy: DuplicatePolicy) -> Self {
        Self {
            n_rows,
            n_cols,
            policy,
            entries: BTreeMap::new(),
            duplicates: 0,
        }
    }

    /// Adds a 0-based triple
    ///
    /// Returns an error if the coordinate lies outside the matrix.
    pub fn push(&mut self, row: usize, col: usize, value: T) -> Result<(), MatrixError> {
        if row >= self.n_rows {
            return Err(MatrixError::RowOutOfBounds {
                row,
                n_rows: self.n_rows,
            });
        }
        if col >= self.n_cols {
            return Err(MatrixError::ColumnOutOfBounds {
                row,
                col,
                n_cols: self.n_cols,
            });
        }

        match self.entries.get_mut(&(row, col)) {
            Some(existing) => {
                self.duplicates += 1;
                *existing = match self.policy {
                    DuplicatePolicy::LastWins => value,
                    DuplicatePolicy::Sum => *existing + value,
                };
            }
            None => {
                self.entries.insert((row, col), value);
            }
        }
        Ok(())
    }

    /// Number of triples that hit an already present coordinate
    pub fn duplicates(&self) -> usize {
        self.duplicates
    }

    /// Number of distinct coordinates collected so far
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Builds the CSR arrays
    ///
    /// Nonzeros are counted for every row index, including rows that never
    /// appeared, so `row_ptr` always has `n_rows + 1` entries.
    pub fn build(self) -> Result<SparseMatrixCSR<T>, MatrixError> {
        let nnz = self.entries.len();
        let mut row_counts = vec![0usize; self.n_rows];
        let mut col_idx = Vec::with_capacity(nnz);
        let mut values = Vec::with_capacity(nnz);

        for ((row, col), value) in self.entries {
            row_counts[row] += 1;
            col_idx.push(col);
            values.push(value);
        }

        let row_ptr = exclusive_scan(&row_counts);
        SparseMatrixCSR::try_new(self.n_rows, self.n_cols, row_ptr, col_idx, values)
    }
}
