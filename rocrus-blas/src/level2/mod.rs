//! Level-2 routines on packed, banded and Hermitian matrices.
//!
//! None of these needs workspace: a size query answers `SizeUnchanged`.
//! The 64-bit launchers reuse the 32-bit kernels per batch chunk and reject
//! orders beyond the 32-bit range.

pub mod hbmv;
pub mod her2;
pub mod hpmv;
pub mod spr2;
pub mod tpsv;

pub use hbmv::{hbmv, hbmv_batched, hbmv_strided_batched};
pub use her2::{her2, her2_batched, her2_strided_batched};
pub use hpmv::{hpmv, hpmv_batched, hpmv_strided_batched};
pub use spr2::{spr2, spr2_batched, spr2_strided_batched};
pub use tpsv::{tpsv, tpsv_batched, tpsv_strided_batched};

use rocrus_core::int64::{batch_chunks, I32_MAX};
use rocrus_core::launch::{launch, launch_blocks};
use rocrus_core::types::vector_index;
use rocrus_core::{BatchDst, BatchSrc, Error, Fill, Handle, Scalar, ScalarArg};

/// Columns per parallel work item in column-parallel kernels.
pub(crate) const COLUMN_BLOCK: i64 = 64;

/// Rows per parallel work item in row-parallel kernels.
pub(crate) const ROW_BLOCK: i64 = 64;

pub(crate) fn check_uplo(uplo: Fill) -> Result<(), Error> {
    if uplo.is_triangle() {
        Ok(())
    } else {
        Err(Error::InvalidValue("uplo"))
    }
}

/// Drives a 32-bit launcher over the batch chunks of a 64-bit call.
///
/// `launch(n, b_base, batch_count)` runs one chunk.
pub(crate) fn for_each_batch_chunk<F>(n: i64, batch_count: i64, mut launch: F) -> Result<(), Error>
where
    F: FnMut(i32, i64, i32) -> Result<(), Error>,
{
    if n == 0 || batch_count == 0 {
        return Ok(());
    }
    if n > I32_MAX {
        return Err(Error::size(format_args!("n = {n} exceeds the 32-bit kernel range")));
    }
    for (b_base, bc) in batch_chunks(batch_count) {
        launch(n as i32, b_base, bc)?;
    }
    Ok(())
}

/// Pointer of batch `b`, or the error a kernel reports when it must touch a
/// null operand.
#[inline]
pub(crate) fn require<T>(p: *const T, what: &'static str) -> Result<*const T, Error> {
    if p.is_null() {
        Err(Error::InvalidPointer(what))
    } else {
        Ok(p)
    }
}

/// Element `(i, j)` of a Hermitian matrix of which only the `uplo` triangle
/// is stored; `stored(i, j)` reads a stored element. The diagonal is
/// taken as real.
#[inline(always)]
pub(crate) fn hermitian_elem<T: Scalar>(
    uplo: Fill,
    i: i64,
    j: i64,
    stored: impl Fn(i64, i64) -> T,
) -> T {
    let in_triangle = if uplo == Fill::Lower { i >= j } else { i <= j };
    if i == j {
        T::from_real(stored(i, i).real())
    } else if in_triangle {
        stored(i, j)
    } else {
        stored(j, i).conj()
    }
}

/// Row-parallel `y := alpha*A*x + beta*y` shared by the Hermitian
/// matrix-vector routines.
///
/// `row(b, i, x_b)` returns `sum_j A_b(i, j) * x_b[j]`. Batches whose
/// scalars make the call a no-op are skipped; `beta == 0` overwrites `y`
/// without reading it.
///
/// # Safety
/// The operands must be valid for every batch they are touched in.
pub(crate) unsafe fn hermitian_mv_launcher<T, X, Y, F>(
    handle: &Handle,
    n: i32,
    alpha: ScalarArg<T>,
    x: X,
    beta: ScalarArg<T>,
    y: Y,
    incy: i64,
    batch_count: i32,
    row: F,
) -> Result<(), Error>
where
    T: Scalar,
    X: BatchSrc<T>,
    Y: BatchDst<T>,
    F: Fn(i64, i64, *const T) -> Result<T, Error> + Sync + Send,
{
    let n = n as i64;
    let row_blocks = (n + ROW_BLOCK - 1) / ROW_BLOCK;
    launch(handle, || {
        launch_blocks(batch_count as i64, row_blocks, |b, blk| {
            let alpha = alpha.load(b);
            let beta = beta.load(b);
            if alpha.is_zero() && beta.is_one() {
                return Ok(());
            }
            let yb = require(y.batch_ptr(b), "y")? as *mut T;
            let xb = if alpha.is_zero() {
                std::ptr::null()
            } else {
                require(x.batch_ptr(b), "x")?
            };
            let i_end = (blk * ROW_BLOCK + ROW_BLOCK).min(n);
            for i in blk * ROW_BLOCK..i_end {
                let ax = if alpha.is_zero() {
                    T::zero()
                } else {
                    alpha * row(b, i, xb)?
                };
                let yi = yb.offset(vector_index(i, n, incy) as isize);
                *yi = if beta.is_zero() { ax } else { ax + beta * *yi };
            }
            Ok(())
        })
    })
}
