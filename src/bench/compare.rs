//! Elementwise comparison of reference and accelerated results

use crate::element::Element;
use crate::error::BenchError;

/// One element outside the tolerance band
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mismatch<T> {
    pub index: usize,
    pub reference: T,
    pub accelerated: T,
    /// `|reference - accelerated|`
    pub diff: f64,
    /// Largest difference the tolerance allowed at this element
    pub allowed: f64,
}

/// Outcome of comparing two result vectors
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison<T> {
    /// Number of elements compared
    pub len: usize,
    pub tolerance: f64,
    /// Every mismatching element, in index order
    pub mismatches: Vec<Mismatch<T>>,
    /// Largest finite absolute difference seen
    pub max_abs_diff: f64,
}

impl<T> Comparison<T> {
    pub fn mismatch_count(&self) -> usize {
        self.mismatches.len()
    }

    pub fn is_match(&self) -> bool {
        self.mismatches.is_empty()
    }
}

fn check_lengths<T>(reference: &[T], accelerated: &[T]) -> Result<(), BenchError> {
    if reference.len() != accelerated.len() {
        return Err(BenchError::LengthMismatch {
            reference: reference.len(),
            accelerated: accelerated.len(),
        });
    }
    Ok(())
}

/// Compares with a relative tolerance scaled by the accelerated value
///
/// Element `i` mismatches when `|ref[i] - acc[i]| > tolerance * |acc[i]|`
/// or when the difference is NaN. Every element is checked, so the result
/// lists all mismatches rather than the first one.
///
/// An accelerated value of exactly zero leaves no tolerance band: any
/// nonzero reference value there is a mismatch.
pub fn compare_relative<T: Element>(
    reference: &[T],
    accelerated: &[T],
    tolerance: f64,
) -> Result<Comparison<T>, BenchError> {
    check_lengths(reference, accelerated)?;

    let mut mismatches = Vec::new();
    let mut max_abs_diff = 0.0f64;

    for (index, (&r, &a)) in reference.iter().zip(accelerated).enumerate() {
        let r64 = r.to_f64().unwrap_or(f64::NAN);
        let a64 = a.to_f64().unwrap_or(f64::NAN);
        let diff = (r64 - a64).abs();
        let allowed = tolerance * a64.abs();

        if diff.is_finite() {
            max_abs_diff = max_abs_diff.max(diff);
        }
        if diff.is_nan() || diff > allowed {
            mismatches.push(Mismatch {
                index,
                reference: r,
                accelerated: a,
                diff,
                allowed,
            });
        }
    }

    Ok(Comparison {
        len: reference.len(),
        tolerance,
        mismatches,
        max_abs_diff,
    })
}

/// Index of the first element that differs, or `None` when all are equal
pub fn compare_exact<T: PartialEq>(expected: &[T], actual: &[T]) -> Result<Option<usize>, BenchError> {
    if expected.len() != actual.len() {
        return Err(BenchError::LengthMismatch {
            reference: expected.len(),
            accelerated: actual.len(),
        });
    }
    Ok(expected.iter().zip(actual).position(|(e, a)| e != a))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single(reference: f64, accelerated: f64) -> Comparison<f64> {
        compare_relative(&[reference], &[accelerated], 0.02).unwrap()
    }

    #[test]
    fn test_tolerance_boundary() {
        assert!(single(1.00, 1.00).is_match());
        assert!(!single(1.03, 1.00).is_match());
        assert!(single(1.019, 1.00).is_match());
    }

    #[test]
    fn test_zero_accelerated_value() {
        assert!(!single(1e-12, 0.0).is_match());
        assert!(single(0.0, 0.0).is_match());
    }

    #[test]
    fn test_nan_is_mismatch() {
        assert!(!single(f64::NAN, 1.0).is_match());
        assert!(!single(1.0, f64::NAN).is_match());
    }

    #[test]
    fn test_reports_all_mismatches() {
        let reference = [1.0f32, 2.0, 3.0, 4.0];
        let accelerated = [1.5f32, 2.0, 3.5, 4.0];
        let cmp = compare_relative(&reference, &accelerated, 0.02).unwrap();
        assert_eq!(cmp.mismatch_count(), 2);
        assert_eq!(cmp.mismatches[0].index, 0);
        assert_eq!(cmp.mismatches[1].index, 2);
        assert_eq!(cmp.max_abs_diff, 0.5);
    }

    #[test]
    fn test_length_mismatch() {
        assert!(matches!(
            compare_relative(&[1.0f64], &[1.0, 2.0], 0.02),
            Err(BenchError::LengthMismatch { reference: 1, accelerated: 2 })
        ));
    }

    #[test]
    fn test_compare_exact() {
        assert_eq!(compare_exact(&[1.0, 2.0], &[1.0, 2.0]).unwrap(), None);
        assert_eq!(compare_exact(&[1.0, 2.0, 3.0], &[1.0, 2.5, 3.5]).unwrap(), Some(1));
        assert!(compare_exact(&[1.0], &[]).is_err());
    }
}
