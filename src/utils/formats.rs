//! Utilities for converting between our matrix format and external libraries

use crate::matrix::SparseMatrixCSR;
use ndarray::Array2;
use num_traits::Num;
use sprs::CsMat;

/// Converts our CSR matrix format to sprs CsMat format
///
/// # Panics
///
/// Panics (inside sprs) if the matrix is not canonical.
pub fn to_sprs_csr<T>(matrix: &SparseMatrixCSR<T>) -> CsMat<T>
where
    T: Copy + Num + Default,
{
    CsMat::new(
        (matrix.n_rows, matrix.n_cols),
        matrix.row_ptr.clone(),
        matrix.col_idx.clone(),
        matrix.values.clone(),
    )
}

/// Expands a CSR matrix into a dense ndarray matrix
///
/// Only sensible for small matrices; used to cross-check kernels against
/// a dense product.
pub fn to_dense<T>(matrix: &SparseMatrixCSR<T>) -> Array2<T>
where
    T: Copy + Num,
{
    let mut dense = Array2::from_elem((matrix.n_rows, matrix.n_cols), T::zero());
    for (i, j, v) in matrix.triplets() {
        dense[[i, j]] = v;
    }
    dense
}
