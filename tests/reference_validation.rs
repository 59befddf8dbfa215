//! Validate the reference SpMV kernel against sprs and ndarray

use ndarray::Array1;
use spmv_bench::{generate_vector, reference_spmv, to_dense, to_sprs_csr, SparseMatrixCSR};

/// Create a simple test matrix
fn create_test_matrix() -> SparseMatrixCSR<f64> {
    // [1 0 2 3]
    // [0 4 0 0]
    // [5 0 6 7]
    // [0 8 0 9]
    SparseMatrixCSR::new(
        4,
        4,
        vec![0, 3, 4, 7, 9],
        vec![0, 2, 3, 1, 0, 2, 3, 1, 3],
        vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0],
    )
}

/// Creates a tridiagonal matrix with a few empty rows
fn create_banded_matrix(n: usize) -> SparseMatrixCSR<f64> {
    let mut row_ptr = vec![0];
    let mut col_idx = Vec::new();
    let mut values = Vec::new();

    for i in 0..n {
        if i % 7 != 3 {
            for j in i.saturating_sub(1)..(i + 2).min(n) {
                col_idx.push(j);
                values.push((i * n + j) as f64 * 0.01 - 1.0);
            }
        }
        row_ptr.push(col_idx.len());
    }

    SparseMatrixCSR::new(n, n, row_ptr, col_idx, values)
}

fn assert_close(a: &[f64], b: &[f64]) {
    assert_eq!(a.len(), b.len());
    for (i, (x, y)) in a.iter().zip(b).enumerate() {
        assert!((x - y).abs() <= 1e-10 * y.abs().max(1.0), "row {}: {} vs {}", i, x, y);
    }
}

#[test]
fn test_known_example() {
    let a = create_test_matrix();
    let y = reference_spmv(&a, &[1.0, 2.0, 3.0, 4.0]);
    assert_eq!(y, vec![19.0, 8.0, 51.0, 52.0]);
}

#[test]
fn test_identity_returns_input() {
    let n = 257;
    let a = SparseMatrixCSR::<f64>::identity(n);
    let x: Vec<f64> = generate_vector(n, 11);
    assert_eq!(reference_spmv(&a, &x), x);
}

#[test]
fn test_reference_vs_sprs() {
    let a = create_banded_matrix(200);
    let x: Vec<f64> = generate_vector(200, 54321);

    let y_ref = reference_spmv(&a, &x);
    let y_sprs = &to_sprs_csr(&a) * &Array1::from(x);

    assert_close(&y_ref, y_sprs.as_slice().unwrap());
}

#[test]
fn test_reference_vs_dense() {
    let a = create_banded_matrix(64);
    let x: Vec<f64> = generate_vector(64, 3);

    let y_ref = reference_spmv(&a, &x);
    let y_dense = to_dense(&a).dot(&Array1::from(x));

    assert_close(&y_ref, y_dense.as_slice().unwrap());
}

#[test]
fn test_reference_is_idempotent() {
    let a = create_banded_matrix(100);
    let x: Vec<f64> = generate_vector(100, 99);

    let first = reference_spmv(&a, &x);
    for _ in 0..5 {
        assert_eq!(reference_spmv(&a, &x), first);
    }
}
