//! Matrix Market coordinate file reader/writer

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use log::{debug, info, warn};
use num_traits::NumCast;

use crate::element::Element;
use crate::error::LoadError;
use crate::io::banner::{MatrixMarketBanner, Symmetry};
use crate::matrix::{DuplicatePolicy, SparseMatrixCSR, TripletBuilder};

/// Reads a square, real, coordinate-format matrix file into CSR form
///
/// Indices in the file are 1-based and converted to 0-based. Repeated
/// coordinates are resolved with `policy`.
pub fn read_matrix<T, P>(path: P, policy: DuplicatePolicy) -> Result<SparseMatrixCSR<T>, LoadError>
where
    T: Element,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    info!("Reading matrix {:?}", path);

    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    parse_matrix(BufReader::new(file), policy)
}

/// Parses a Matrix Market stream into CSR form
pub fn parse_matrix<T, R>(reader: R, policy: DuplicatePolicy) -> Result<SparseMatrixCSR<T>, LoadError>
where
    T: Element,
    R: BufRead,
{
    let mut lines = reader.lines().enumerate().map(|(i, line)| (i + 1, line));

    let banner: MatrixMarketBanner = match lines.next() {
        Some((_, line)) => line?.parse()?,
        None => return Err(LoadError::InvalidBanner("empty input".to_string())),
    };
    banner.ensure_supported()?;
    debug!("Matrix Market type: [{}]", banner);

    // Skip comments and blank lines up to the size line
    let mut size_line = None;
    for (_, line) in lines.by_ref() {
        let line = line?;
        let trimmed = line.trim();
        if !trimmed.is_empty() && !trimmed.starts_with('%') {
            size_line = Some(line);
            break;
        }
    }
    let size_line = size_line.ok_or_else(|| LoadError::InvalidSize(String::new()))?;
    let (rows, cols, declared_nnz) = parse_size_line(&size_line)?;

    // Device indices are 32-bit; anything larger cannot be staged
    let max_extent = u32::MAX as usize;
    if rows > max_extent || cols > max_extent || declared_nnz > max_extent {
        return Err(LoadError::InvalidSize(size_line));
    }

    if rows != cols {
        return Err(LoadError::NotSquare { rows, cols });
    }
    info!("Coordinate sizes: M = {}, N = {}, NZ = {}", rows, cols, declared_nnz);

    let mut builder = TripletBuilder::new(rows, cols, policy);
    let mut found = 0;

    while found < declared_nnz {
        let (line_no, line) = match lines.next() {
            Some((line_no, line)) => (line_no, line?),
            None => break,
        };
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('%') {
            continue;
        }

        let (row, col, value) = parse_entry::<T>(line_no, trimmed, rows, cols)?;
        builder.push(row, col, value)?;

        if row != col {
            match banner.symmetry {
                Symmetry::Symmetric => builder.push(col, row, value)?,
                Symmetry::SkewSymmetric => builder.push(col, row, -value)?,
                Symmetry::General | Symmetry::Hermitian => {}
            }
        }
        found += 1;
    }

    if found < declared_nnz {
        return Err(LoadError::TruncatedEntries {
            expected: declared_nnz,
            found,
        });
    }

    if builder.duplicates() > 0 {
        warn!(
            "{} duplicate coordinates resolved with policy {:?}",
            builder.duplicates(),
            policy
        );
    }

    let matrix = builder.build()?;
    info!("Matrix size: {} stored entries", matrix.nnz());
    Ok(matrix)
}

/// Writes a CSR matrix as a general real coordinate file
pub fn write_matrix<T, W>(mut writer: W, matrix: &SparseMatrixCSR<T>) -> std::io::Result<()>
where
    T: Element,
    W: Write,
{
    writeln!(writer, "%%MatrixMarket matrix coordinate real general")?;
    writeln!(writer, "{} {} {}", matrix.n_rows, matrix.n_cols, matrix.nnz())?;

    for (i, j, v) in matrix.triplets() {
        // `{:?}` keeps enough digits to read the value back exactly
        writeln!(writer, "{} {} {:?}", i + 1, j + 1, v)?;
    }

    writer.flush()
}

/// Writes a CSR matrix to a file path
pub fn write_matrix_file<T, P>(path: P, matrix: &SparseMatrixCSR<T>) -> Result<(), LoadError>
where
    T: Element,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let io_err = |source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(io_err)?;
    write_matrix(std::io::BufWriter::new(file), matrix).map_err(io_err)
}

fn parse_size_line(line: &str) -> Result<(usize, usize, usize), LoadError> {
    let parts: Vec<usize> = line
        .split_whitespace()
        .map(|tok| tok.parse::<usize>())
        .collect::<Result<_, _>>()
        .map_err(|_| LoadError::InvalidSize(line.to_string()))?;

    match parts.as_slice() {
        [rows, cols, nnz] => Ok((*rows, *cols, *nnz)),
        _ => Err(LoadError::InvalidSize(line.to_string())),
    }
}

fn parse_entry<T: Element>(
    line_no: usize,
    line: &str,
    rows: usize,
    cols: usize,
) -> Result<(usize, usize, T), LoadError> {
    let invalid = || LoadError::InvalidEntry {
        line: line_no,
        text: line.to_string(),
    };

    let mut tokens = line.split_whitespace();
    let row: i64 = tokens.next().ok_or_else(invalid)?.parse().map_err(|_| invalid())?;
    let col: i64 = tokens.next().ok_or_else(invalid)?.parse().map_err(|_| invalid())?;
    let value: f64 = tokens.next().ok_or_else(invalid)?.parse().map_err(|_| invalid())?;

    let in_range = |idx: i64, limit: usize| idx >= 1 && (idx as u64) <= limit as u64;
    if !in_range(row, rows) || !in_range(col, cols) {
        return Err(LoadError::IndexOutOfRange {
            line: line_no,
            row,
            col,
            rows,
            cols,
        });
    }

    let converted = <T as NumCast>::from(value).ok_or_else(invalid)?;
    // A finite value must stay finite in the element type
    if value.is_finite() && !converted.is_finite() {
        return Err(invalid());
    }
    let value = converted;
    Ok(((row - 1) as usize, (col - 1) as usize, value))
}
