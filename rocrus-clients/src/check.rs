//! Result comparison: exact/ULP, absolute tolerance and relative norm.

use crate::buffers::BatchView;
use rocrus_core::{RealScalar, Scalar};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum CheckError {
    #[error("batch {batch}, row {row}, col {col}: expected {expected}, got {actual}")]
    Mismatch {
        batch: usize,
        row: i64,
        col: i64,
        expected: String,
        actual: String,
    },
    #[error("batch {batch}: relative error {error:e} exceeds {tolerance:e}")]
    Norm {
        batch: usize,
        error: f64,
        tolerance: f64,
    },
    #[error("batch counts differ: {expected} vs {actual}")]
    BatchCount { expected: usize, actual: usize },
}

/// Units in the last place allowed when values are not integers.
pub const ULP_TOLERANCE: f64 = 4.0;

fn same_batches<T>(a: &impl BatchView<T>, b: &impl BatchView<T>) -> Result<(), CheckError> {
    if a.batch_count() != b.batch_count() {
        return Err(CheckError::BatchCount {
            expected: a.batch_count(),
            actual: b.batch_count(),
        });
    }
    Ok(())
}

fn close(e: f64, a: f64, tol: f64) -> bool {
    if e == a || (e.is_nan() && a.is_nan()) {
        return true;
    }
    (e - a).abs() <= tol * e.abs().max(1.0)
}

/// Elementwise comparison of the `m x n` matrices (stride `ld` between
/// columns) of every batch, within [`ULP_TOLERANCE`] epsilons relative to
/// the expected value. NaN matches NaN.
pub fn unit_check_general<T: Scalar>(
    m: i64,
    n: i64,
    ld: i64,
    expected: &impl BatchView<T>,
    actual: &impl BatchView<T>,
) -> Result<(), CheckError> {
    same_batches(expected, actual)?;
    let tol = ULP_TOLERANCE * <T::Real as RealScalar>::epsilon();
    for b in 0..expected.batch_count() {
        let (e, a) = (expected.batch(b), actual.batch(b));
        for j in 0..n {
            for i in 0..m {
                let idx = (i + j * ld) as usize;
                let (er, ei) = e[idx].to_f64_parts();
                let (ar, ai) = a[idx].to_f64_parts();
                if !(close(er, ar, tol) && close(ei, ai, tol)) {
                    return Err(CheckError::Mismatch {
                        batch: b,
                        row: i,
                        col: j,
                        expected: format!("{:?}", e[idx]),
                        actual: format!("{:?}", a[idx]),
                    });
                }
            }
        }
    }
    Ok(())
}

/// Like [`unit_check_general`] with an absolute tolerance.
pub fn near_check_general<T: Scalar>(
    m: i64,
    n: i64,
    ld: i64,
    expected: &impl BatchView<T>,
    actual: &impl BatchView<T>,
    abs_tol: f64,
) -> Result<(), CheckError> {
    same_batches(expected, actual)?;
    for b in 0..expected.batch_count() {
        let (e, a) = (expected.batch(b), actual.batch(b));
        for j in 0..n {
            for i in 0..m {
                let idx = (i + j * ld) as usize;
                let (er, ei) = e[idx].to_f64_parts();
                let (ar, ai) = a[idx].to_f64_parts();
                if (er - ar).abs() > abs_tol || (ei - ai).abs() > abs_tol {
                    return Err(CheckError::Mismatch {
                        batch: b,
                        row: i,
                        col: j,
                        expected: format!("{:?}", e[idx]),
                        actual: format!("{:?}", a[idx]),
                    });
                }
            }
        }
    }
    Ok(())
}

/// Relative Frobenius error `|E - A| / |E|` of each batch.
pub fn norm_error<T: Scalar>(
    m: i64,
    n: i64,
    ld: i64,
    expected: &impl BatchView<T>,
    actual: &impl BatchView<T>,
) -> Vec<f64> {
    (0..expected.batch_count().min(actual.batch_count()))
        .map(|b| {
            let (e, a) = (expected.batch(b), actual.batch(b));
            let (mut diff, mut norm) = (0.0f64, 0.0f64);
            for j in 0..n {
                for i in 0..m {
                    let idx = (i + j * ld) as usize;
                    let (er, ei) = e[idx].to_f64_parts();
                    let (ar, ai) = a[idx].to_f64_parts();
                    diff += (er - ar).powi(2) + (ei - ai).powi(2);
                    norm += er * er + ei * ei;
                }
            }
            if norm == 0.0 {
                diff.sqrt()
            } else {
                (diff / norm).sqrt()
            }
        })
        .collect()
}

/// Fails when any batch's [`norm_error`] exceeds `tolerance`; returns the
/// largest error otherwise.
pub fn norm_check_general<T: Scalar>(
    m: i64,
    n: i64,
    ld: i64,
    expected: &impl BatchView<T>,
    actual: &impl BatchView<T>,
    tolerance: f64,
) -> Result<f64, CheckError> {
    same_batches(expected, actual)?;
    let mut worst = 0.0f64;
    for (batch, error) in norm_error(m, n, ld, expected, actual).into_iter().enumerate() {
        if !(error <= tolerance) {
            return Err(CheckError::Norm {
                batch,
                error,
                tolerance,
            });
        }
        worst = worst.max(error);
    }
    Ok(worst)
}

/// Tolerance for a norm check scaled by the precision of `T`.
pub fn norm_tolerance<T: Scalar>(factor: f64) -> f64 {
    factor * <T::Real as RealScalar>::epsilon()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffers::{HostBatchVector, HostVector};

    #[test]
    fn test_unit_check_reports_position() {
        let e = HostVector::from_vec(vec![1.0f32, 2.0, 3.0, 4.0]);
        let mut a = e.clone();
        assert!(unit_check_general(2, 2, 2, &e, &a).is_ok());
        a[3] = 5.0;
        let err = unit_check_general(2, 2, 2, &e, &a).unwrap_err();
        assert!(matches!(err, CheckError::Mismatch { batch: 0, row: 1, col: 1, .. }));
        // outside the checked block
        assert!(unit_check_general(1, 2, 2, &e, &a).is_ok());
    }

    #[test]
    fn test_ulp_tolerance() {
        let e = HostVector::from_vec(vec![1.0f64]);
        let a = HostVector::from_vec(vec![1.0 + 2.0 * f64::EPSILON]);
        assert!(unit_check_general(1, 1, 1, &e, &a).is_ok());
        let a = HostVector::from_vec(vec![1.0 + 1e-10]);
        assert!(unit_check_general(1, 1, 1, &e, &a).is_err());
        assert!(near_check_general(1, 1, 1, &e, &a, 1e-9).is_ok());
    }

    #[test]
    fn test_norm_check_per_batch() {
        let mut e = HostBatchVector::<f64>::new(2, 1, 2);
        let mut a = HostBatchVector::<f64>::new(2, 1, 2);
        e[0].copy_from_slice(&[3.0, 4.0]);
        a[0].copy_from_slice(&[3.0, 4.0]);
        e[1].copy_from_slice(&[3.0, 4.0]);
        a[1].copy_from_slice(&[3.0, 9.0]);
        assert_eq!(norm_error(2, 1, 2, &e, &a), vec![0.0, 1.0]);
        let err = norm_check_general(2, 1, 2, &e, &a, 0.5).unwrap_err();
        assert!(matches!(err, CheckError::Norm { batch: 1, .. }));
    }
}
