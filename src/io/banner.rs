//! Matrix Market banner (`%%MatrixMarket ...`) parsing

use std::fmt;
use std::str::FromStr;

use crate::error::LoadError;

/// Leading token of every Matrix Market file
pub const BANNER_PREFIX: &str = "%%MatrixMarket";

/// Storage format named in the banner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Sparse `row col value` triples
    Coordinate,
    /// Dense column-major listing
    Array,
}

/// Element field named in the banner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Real,
    Double,
    Complex,
    Integer,
    Pattern,
}

/// Symmetry structure named in the banner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symmetry {
    General,
    Symmetric,
    SkewSymmetric,
    Hermitian,
}

/// The four-part type code of a Matrix Market file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatrixMarketBanner {
    pub format: Format,
    pub field: Field,
    pub symmetry: Symmetry,
}

impl MatrixMarketBanner {
    /// True for real-valued coordinate (sparse) matrices
    pub fn is_real_sparse(&self) -> bool {
        self.format == Format::Coordinate && matches!(self.field, Field::Real | Field::Double)
    }

    /// Rejects every type this harness cannot benchmark
    pub fn ensure_supported(&self) -> Result<(), LoadError> {
        if self.is_real_sparse() && self.symmetry != Symmetry::Hermitian {
            Ok(())
        } else {
            Err(LoadError::Unsupported(self.to_string()))
        }
    }
}

impl FromStr for MatrixMarketBanner {
    type Err = LoadError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut tokens = line.split_whitespace();

        if tokens.next() != Some(BANNER_PREFIX) {
            return Err(LoadError::InvalidBanner(format!(
                "missing {} prefix in {:?}",
                BANNER_PREFIX, line
            )));
        }

        let mut next = |what: &str| {
            tokens
                .next()
                .map(str::to_ascii_lowercase)
                .ok_or_else(|| LoadError::InvalidBanner(format!("missing {} in {:?}", what, line)))
        };

        let object = next("object")?;
        let format = next("format")?;
        let field = next("field")?;
        let symmetry = next("symmetry")?;

        if object != "matrix" {
            return Err(LoadError::InvalidBanner(format!("unknown object {:?}", object)));
        }

        let format = match format.as_str() {
            "coordinate" => Format::Coordinate,
            "array" => Format::Array,
            other => return Err(LoadError::InvalidBanner(format!("unknown format {:?}", other))),
        };

        let field = match field.as_str() {
            "real" => Field::Real,
            "double" => Field::Double,
            "complex" => Field::Complex,
            "integer" => Field::Integer,
            "pattern" => Field::Pattern,
            other => return Err(LoadError::InvalidBanner(format!("unknown field {:?}", other))),
        };

        let symmetry = match symmetry.as_str() {
            "general" => Symmetry::General,
            "symmetric" => Symmetry::Symmetric,
            "skew-symmetric" => Symmetry::SkewSymmetric,
            "hermitian" => Symmetry::Hermitian,
            other => {
                return Err(LoadError::InvalidBanner(format!("unknown symmetry {:?}", other)))
            }
        };

        Ok(Self {
            format,
            field,
            symmetry,
        })
    }
}

impl fmt::Display for MatrixMarketBanner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let format = match self.format {
            Format::Coordinate => "coordinate",
            Format::Array => "array",
        };
        let field = match self.field {
            Field::Real => "real",
            Field::Double => "double",
            Field::Complex => "complex",
            Field::Integer => "integer",
            Field::Pattern => "pattern",
        };
        let symmetry = match self.symmetry {
            Symmetry::General => "general",
            Symmetry::Symmetric => "symmetric",
            Symmetry::SkewSymmetric => "skew-symmetric",
            Symmetry::Hermitian => "hermitian",
        };
        write!(f, "matrix {} {} {}", format, field, symmetry)
    }
}
