//! NaN/Inf/zero/denormal scans of routine operands.

use crate::batch::BatchSrc;
use crate::error::Error;
use crate::handle::Handle;
use crate::scalar::{Classify, Scalar};
use crate::types::{packed_len, vector_index, CheckNumericsMode};
use rayon::prelude::*;
use std::fmt;

/// What a scan found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NumericsReport {
    pub has_nan: bool,
    pub has_inf: bool,
    pub has_zero: bool,
    pub has_denorm: bool,
}

impl NumericsReport {
    fn add(mut self, c: Classify) -> Self {
        self.has_nan |= c.nan;
        self.has_inf |= c.inf;
        self.has_zero |= c.zero;
        self.has_denorm |= c.denorm;
        self
    }

    fn merge(self, o: NumericsReport) -> Self {
        NumericsReport {
            has_nan: self.has_nan || o.has_nan,
            has_inf: self.has_inf || o.has_inf,
            has_zero: self.has_zero || o.has_zero,
            has_denorm: self.has_denorm || o.has_denorm,
        }
    }

    pub fn has_nan_or_inf(&self) -> bool {
        self.has_nan || self.has_inf
    }
}

impl fmt::Display for NumericsReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "has_NaN: {}, has_Inf: {}, has_zero: {}, has_denorm: {}",
            self.has_nan as u8, self.has_inf as u8, self.has_zero as u8, self.has_denorm as u8
        )
    }
}

/// Scans `n` elements of `x` with increment `inc` for every batch.
///
/// Null operands and null batch entries are skipped.
///
/// # Safety
/// Non-null operands must be readable for their extents.
pub unsafe fn scan_vector<T: Scalar, X: BatchSrc<T>>(
    n: i64,
    x: X,
    inc: i64,
    batch_count: i64,
) -> NumericsReport {
    if n <= 0 || batch_count <= 0 || x.is_null() {
        return NumericsReport::default();
    }
    (0..batch_count)
        .into_par_iter()
        .map(|b| {
            let p = x.batch_ptr(b);
            if p.is_null() {
                return NumericsReport::default();
            }
            (0..n).fold(NumericsReport::default(), |r, i| {
                r.add((*p.offset(vector_index(i, n, inc) as isize)).classify())
            })
        })
        .reduce(NumericsReport::default, NumericsReport::merge)
}

/// Scans an `m x n` column-major matrix with leading dimension `lda`.
///
/// # Safety
/// See [`scan_vector`].
pub unsafe fn scan_matrix<T: Scalar, A: BatchSrc<T>>(
    m: i64,
    n: i64,
    a: A,
    lda: i64,
    batch_count: i64,
) -> NumericsReport {
    if m <= 0 || n <= 0 || batch_count <= 0 || a.is_null() {
        return NumericsReport::default();
    }
    (0..batch_count)
        .into_par_iter()
        .map(|b| {
            let p = a.batch_ptr(b);
            if p.is_null() {
                return NumericsReport::default();
            }
            let mut r = NumericsReport::default();
            for j in 0..n {
                for i in 0..m {
                    r = r.add((*p.offset((i + j * lda) as isize)).classify());
                }
            }
            r
        })
        .reduce(NumericsReport::default, NumericsReport::merge)
}

/// Scans a packed triangle of order `n`.
///
/// # Safety
/// See [`scan_vector`].
pub unsafe fn scan_packed<T: Scalar, A: BatchSrc<T>>(
    n: i64,
    ap: A,
    batch_count: i64,
) -> NumericsReport {
    scan_vector(packed_len(n.max(0)), ap, 1, batch_count)
}

/// Applies the handle's check-numerics mode to a finished scan.
pub fn conclude(
    handle: &Handle,
    routine: &dyn fmt::Display,
    operand: &str,
    mut report: NumericsReport,
    is_input: bool,
) -> Result<(), Error> {
    let mode = handle.check_numerics();
    if mode.is_empty() {
        return Ok(());
    }
    if mode.contains(CheckNumericsMode::ONLY_NAN_INF) {
        report.has_zero = false;
        report.has_denorm = false;
    }
    let stage = if is_input { "input" } else { "output" };
    if mode.contains(CheckNumericsMode::INFO) {
        tracing::info!(target: "rocrus::numerics", %routine, operand, stage, %report);
    }
    if report.has_nan_or_inf() {
        if mode.contains(CheckNumericsMode::WARN) {
            tracing::warn!(target: "rocrus::numerics", %routine, operand, stage, %report);
        }
        if mode.contains(CheckNumericsMode::FAIL) {
            return Err(Error::CheckNumerics {
                routine: format!("{routine} ({operand}, {stage})"),
                report,
            });
        }
    }
    Ok(())
}

/// Scans a vector operand if numerics checking is on.
///
/// # Safety
/// See [`scan_vector`].
pub unsafe fn check_vector<T: Scalar, X: BatchSrc<T>>(
    handle: &Handle,
    routine: &dyn fmt::Display,
    operand: &str,
    n: i64,
    x: X,
    inc: i64,
    batch_count: i64,
    is_input: bool,
) -> Result<(), Error> {
    if handle.check_numerics().is_empty() {
        return Ok(());
    }
    let report = scan_vector(n, x, inc, batch_count);
    conclude(handle, routine, operand, report, is_input)
}

/// Scans a general matrix operand if numerics checking is on.
///
/// # Safety
/// See [`scan_vector`].
pub unsafe fn check_matrix<T: Scalar, A: BatchSrc<T>>(
    handle: &Handle,
    routine: &dyn fmt::Display,
    operand: &str,
    m: i64,
    n: i64,
    a: A,
    lda: i64,
    batch_count: i64,
    is_input: bool,
) -> Result<(), Error> {
    if handle.check_numerics().is_empty() {
        return Ok(());
    }
    let report = scan_matrix(m, n, a, lda, batch_count);
    conclude(handle, routine, operand, report, is_input)
}

/// Scans a packed triangle operand if numerics checking is on.
///
/// # Safety
/// See [`scan_vector`].
pub unsafe fn check_packed<T: Scalar, A: BatchSrc<T>>(
    handle: &Handle,
    routine: &dyn fmt::Display,
    operand: &str,
    n: i64,
    ap: A,
    batch_count: i64,
    is_input: bool,
) -> Result<(), Error> {
    if handle.check_numerics().is_empty() {
        return Ok(());
    }
    let report = scan_packed(n, ap, batch_count);
    conclude(handle, routine, operand, report, is_input)
}
