//! Matrix Market input and output

pub mod banner;
pub mod market;

pub use banner::{Field, Format, MatrixMarketBanner, Symmetry};
pub use market::{parse_matrix, read_matrix, write_matrix, write_matrix_file};
