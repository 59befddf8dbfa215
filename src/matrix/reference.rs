//! Reference implementation of SpMV
//!
//! This provides the ground truth for correctness testing and the baseline
//! for timing. It is deliberately simple: one thread, rows in order, columns
//! in ascending order within each row.

use num_traits::Num;

use crate::matrix::SparseMatrixCSR;

/// Computes `y = A * x` with a sequential row-by-row loop
///
/// # Panics
///
/// Panics if `x.len() != a.n_cols`.
pub fn reference_spmv<T>(a: &SparseMatrixCSR<T>, x: &[T]) -> Vec<T>
where
    T: Copy + Num,
{
    let mut y = vec![T::zero(); a.n_rows];
    reference_spmv_into(a, x, &mut y);
    y
}

/// Computes `y = A * x` into an existing output vector, overwriting it
///
/// # Panics
///
/// Panics if `x.len() != a.n_cols` or `y.len() != a.n_rows`.
pub fn reference_spmv_into<T>(a: &SparseMatrixCSR<T>, x: &[T], y: &mut [T])
where
    T: Copy + Num,
{
    assert_eq!(x.len(), a.n_cols, "x.len() must equal n_cols");
    assert_eq!(y.len(), a.n_rows, "y.len() must equal n_rows");

    for (i, out) in y.iter_mut().enumerate() {
        let mut sum = T::zero();
        for k in a.row_ptr[i]..a.row_ptr[i + 1] {
            sum = sum + a.values[k] * x[a.col_idx[k]];
        }
        *out = sum;
    }
}
