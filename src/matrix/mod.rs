// Matrix data structures and the reference kernel

pub mod coo;
pub mod csr;
pub mod reference;

pub use coo::{DuplicatePolicy, TripletBuilder};
pub use csr::SparseMatrixCSR;
pub use reference::{reference_spmv, reference_spmv_into};
