//! Hermitian rank-2 update: `A := alpha*x*y^H + conj(alpha)*y*x^H + A` on
//! one triangle of a full-storage matrix.

use super::{check_uplo, for_each_batch_chunk, require, COLUMN_BLOCK};
use rocrus_core::launch::{launch, launch_blocks};
use rocrus_core::logging::scalar_log;
use rocrus_core::numerics::{check_matrix, check_vector};
use rocrus_core::types::{col_major, vector_index};
use rocrus_core::{
    log_bench, log_profile, log_trace, ApiInt, ArgCheck, BatchDst, BatchSrc, Batched, BlasResult,
    Error, Fill, Handle, PointerMode, RoutineName, Scalar, ScalarArg, Status, Stride, Strided,
    Variant,
};

unsafe fn arg_check<T: Scalar, X: BatchSrc<T>, A: BatchSrc<T>>(
    handle: &Handle,
    uplo: Fill,
    n: i64,
    alpha: *const T,
    x: &X,
    incx: i64,
    y: &X,
    incy: i64,
    a: &A,
    lda: i64,
    batch_count: i64,
) -> Result<ArgCheck, Error> {
    check_uplo(uplo)?;
    if n < 0 || incx == 0 || incy == 0 || lda < n.max(1) || batch_count < 0 {
        return Err(Error::size(format_args!(
            "n = {n}, incx = {incx}, incy = {incy}, lda = {lda}, batch_count = {batch_count}"
        )));
    }
    if n == 0 || batch_count == 0 {
        return Ok(ArgCheck::QuickReturn);
    }
    if alpha.is_null() {
        return Err(Error::InvalidPointer("alpha"));
    }
    if handle.pointer_mode() == PointerMode::Host {
        if (*alpha).is_zero() {
            return Ok(ArgCheck::QuickReturn);
        }
        if x.is_null() {
            return Err(Error::InvalidPointer("x"));
        }
        if y.is_null() {
            return Err(Error::InvalidPointer("y"));
        }
        if a.is_null() {
            return Err(Error::InvalidPointer("A"));
        }
    }
    Ok(ArgCheck::Continue)
}

pub(crate) unsafe fn her2_launcher<T: Scalar, X: BatchSrc<T>, A: BatchDst<T>>(
    handle: &Handle,
    uplo: Fill,
    n: i32,
    alpha: ScalarArg<T>,
    x: X,
    incx: i64,
    y: X,
    incy: i64,
    a: A,
    lda: i64,
    batch_count: i32,
) -> Result<(), Error> {
    let n = n as i64;
    let col_blocks = (n + COLUMN_BLOCK - 1) / COLUMN_BLOCK;
    launch(handle, || {
        launch_blocks(batch_count as i64, col_blocks, |b, blk| {
            let alpha = alpha.load(b);
            if alpha.is_zero() {
                return Ok(());
            }
            let xb = require(x.batch_ptr(b), "x")?;
            let yb = require(y.batch_ptr(b), "y")?;
            let ab = require(a.batch_ptr(b), "A")? as *mut T;
            let xi = |i: i64| *xb.offset(vector_index(i, n, incx) as isize);
            let yi = |i: i64| *yb.offset(vector_index(i, n, incy) as isize);

            let j_end = (blk * COLUMN_BLOCK + COLUMN_BLOCK).min(n);
            for j in blk * COLUMN_BLOCK..j_end {
                let t1 = alpha * yi(j).conj();
                let t2 = (alpha * xi(j)).conj();
                let (lo, hi) = if uplo == Fill::Lower { (j + 1, n) } else { (0, j) };
                for i in lo..hi {
                    *ab.offset(col_major(i, j, lda) as isize) += xi(i) * t1 + yi(i) * t2;
                }
                let d = ab.offset(col_major(j, j, lda) as isize);
                *d = T::from_real((*d + xi(j) * t1 + yi(j) * t2).real());
            }
            Ok(())
        })
    })
}

pub(crate) unsafe fn her2_launcher_64<T: Scalar, X: BatchSrc<T>, A: BatchDst<T>>(
    handle: &Handle,
    uplo: Fill,
    n: i64,
    alpha: ScalarArg<T>,
    x: X,
    incx: i64,
    y: X,
    incy: i64,
    a: A,
    lda: i64,
    batch_count: i64,
) -> Result<(), Error> {
    for_each_batch_chunk(n, batch_count, |n, b_base, bc| {
        her2_launcher(
            handle,
            uplo,
            n,
            alpha.shifted(b_base),
            x.shifted(b_base),
            incx,
            y.shifted(b_base),
            incy,
            a.shifted(b_base),
            lda,
            bc,
        )
    })
}

unsafe fn her2_impl<I: ApiInt, T: Scalar, X: BatchSrc<T>, A: BatchDst<T>>(
    handle: &Handle,
    variant: Variant,
    uplo: Fill,
    n: i64,
    alpha: *const T,
    x: X,
    x_raw: *const u8,
    incx: i64,
    stridex: Stride,
    y: X,
    y_raw: *const u8,
    incy: i64,
    stridey: Stride,
    a: A,
    a_raw: *const u8,
    lda: i64,
    stride_a: Stride,
    batch_count: i64,
) -> BlasResult {
    if handle.is_device_memory_size_query() {
        return Ok(Status::SizeUnchanged);
    }
    let name = RoutineName::new::<I>(T::PREFIX, "her2", variant);

    let alpha_log = scalar_log(handle, alpha);
    log_trace!(
        handle, name, uplo, n, alpha_log, x_raw, incx, stridex, y_raw, incy, stridey, a_raw, lda,
        stride_a, batch_count
    );
    if handle.pointer_mode() == PointerMode::Host {
        if let Some(&v) = alpha.as_ref() {
            let (re, im) = v.to_f64_parts();
            log_bench!(
                handle, "-f", name.bench_function(), "-r", T::PRECISION, "--uplo", uplo, "-n", n,
                "--alpha", re, "--alphai", im, "--incx", incx, "--incy", incy, "--lda", lda,
                "--stride_x", stridex, "--stride_y", stridey, "--stride_a", stride_a,
                "--batch_count", batch_count
            );
        }
    }
    log_profile!(
        handle, name, "uplo", uplo, "N", n, "incx", incx, "stride_x", stridex, "incy", incy,
        "stride_y", stridey, "lda", lda, "stride_a", stride_a, "batch_count", batch_count
    );

    if arg_check(handle, uplo, n, alpha, &x, incx, &y, incy, &a, lda, batch_count)?
        == ArgCheck::QuickReturn
    {
        return Ok(Status::Success);
    }

    check_matrix(handle, &name, "A", n, n, a, lda, batch_count, true)?;
    check_vector(handle, &name, "x", n, x, incx, batch_count, true)?;
    check_vector(handle, &name, "y", n, y, incy, batch_count, true)?;

    let alpha = ScalarArg::from_ptr(alpha, handle.pointer_mode());
    if I::IS_64 {
        her2_launcher_64(handle, uplo, n, alpha, x, incx, y, incy, a, lda, batch_count)?;
    } else {
        her2_launcher(
            handle,
            uplo,
            n as i32,
            alpha,
            x,
            incx,
            y,
            incy,
            a,
            lda,
            batch_count as i32,
        )?;
    }

    check_matrix(handle, &name, "A", n, n, a, lda, batch_count, false)?;
    Ok(Status::Success)
}

/// Hermitian rank-2 update of the `uplo` triangle of `A`; the imaginary
/// parts of the diagonal are set to zero.
///
/// # Safety
/// `alpha` must be readable in the handle's pointer mode; `x` and `y` must
/// be valid for `n` elements at their increments and `a` for an `n x n`
/// column-major matrix with leading dimension `lda`.
pub unsafe fn her2<I: ApiInt, T: Scalar>(
    handle: &Handle,
    uplo: Fill,
    n: I,
    alpha: *const T,
    x: *const T,
    incx: I,
    y: *const T,
    incy: I,
    a: *mut T,
    lda: I,
) -> BlasResult {
    her2_impl::<I, T, _, _>(
        handle,
        Variant::Single,
        uplo,
        n.as_i64(),
        alpha,
        Strided::single(x),
        x.cast(),
        incx.as_i64(),
        0,
        Strided::single(y),
        y.cast(),
        incy.as_i64(),
        0,
        Strided::new_mut(a, 0),
        a.cast(),
        lda.as_i64(),
        0,
        1,
    )
}

/// # Safety
/// As [`her2`] for every batch of the pointer arrays.
pub unsafe fn her2_batched<I: ApiInt, T: Scalar>(
    handle: &Handle,
    uplo: Fill,
    n: I,
    alpha: *const T,
    x: *const *const T,
    incx: I,
    y: *const *const T,
    incy: I,
    a: *const *mut T,
    lda: I,
    batch_count: I,
) -> BlasResult {
    her2_impl::<I, T, _, _>(
        handle,
        Variant::Batched,
        uplo,
        n.as_i64(),
        alpha,
        Batched::new(x),
        x.cast(),
        incx.as_i64(),
        0,
        Batched::new(y),
        y.cast(),
        incy.as_i64(),
        0,
        Batched::new_mut(a),
        a.cast(),
        lda.as_i64(),
        0,
        batch_count.as_i64(),
    )
}

/// # Safety
/// As [`her2`] for every batch at the given strides.
pub unsafe fn her2_strided_batched<I: ApiInt, T: Scalar>(
    handle: &Handle,
    uplo: Fill,
    n: I,
    alpha: *const T,
    x: *const T,
    incx: I,
    stridex: Stride,
    y: *const T,
    incy: I,
    stridey: Stride,
    a: *mut T,
    lda: I,
    stride_a: Stride,
    batch_count: I,
) -> BlasResult {
    her2_impl::<I, T, _, _>(
        handle,
        Variant::StridedBatched,
        uplo,
        n.as_i64(),
        alpha,
        Strided::new(x, stridex),
        x.cast(),
        incx.as_i64(),
        stridex,
        Strided::new(y, stridey),
        y.cast(),
        incy.as_i64(),
        stridey,
        Strided::new_mut(a, stride_a),
        a.cast(),
        lda.as_i64(),
        stride_a,
        batch_count.as_i64(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex64 as C;
    use rocrus_core::RuntimeConfig;

    fn handle() -> Handle {
        Handle::with_config(&RuntimeConfig::default()).unwrap()
    }

    #[test]
    fn test_zher2_upper() {
        let h = handle();
        let x = [C::new(1.0, 1.0), C::new(0.0, 2.0)];
        let y = [C::new(2.0, 0.0), C::new(1.0, -1.0)];
        let alpha = C::new(0.0, 1.0);
        // lda 3 with a sentinel row that must stay untouched
        let mut a = vec![C::new(9.0, 9.0); 6];
        a[0] = C::new(1.0, 5.0);
        a[3] = C::new(0.0, 0.0);
        a[4] = C::new(2.0, 0.0);
        unsafe {
            her2::<i32, C>(&h, Fill::Upper, 2, &alpha, x.as_ptr(), 1, y.as_ptr(), 1, a.as_mut_ptr(), 3)
        }
        .unwrap();

        let full = |i: usize, j: usize| {
            alpha * x[i] * y[j].conj() + alpha.conj() * y[i] * x[j].conj()
        };
        assert_eq!(a[0], C::new((C::new(1.0, 5.0) + full(0, 0)).re, 0.0));
        assert_eq!(a[3], full(0, 1));
        assert_eq!(a[4], C::new((C::new(2.0, 0.0) + full(1, 1)).re, 0.0));
        // lower triangle and padding untouched
        assert_eq!(a[1], C::new(9.0, 9.0));
        assert_eq!(a[2], C::new(9.0, 9.0));
        assert_eq!(a[5], C::new(9.0, 9.0));
    }

    #[test]
    fn test_size_checks() {
        let h = handle();
        let x = [C::new(1.0, 0.0); 2];
        let mut a = [C::new(0.0, 0.0); 4];
        let alpha = C::new(1.0, 0.0);
        let s = unsafe {
            her2::<i32, C>(&h, Fill::Lower, 2, &alpha, x.as_ptr(), 1, x.as_ptr(), 1, a.as_mut_ptr(), 1)
        };
        assert_eq!(s.unwrap_err().status(), Status::InvalidSize);
        let s = unsafe {
            her2_strided_batched::<i64, C>(
                &h, Fill::Lower, 2, &alpha, x.as_ptr(), 1, 0, x.as_ptr(), 1, 0,
                a.as_mut_ptr(), 2, 4, -1,
            )
        };
        assert_eq!(s.unwrap_err().status(), Status::InvalidSize);
    }

    #[test]
    fn test_batched_lower() {
        let h = handle();
        let x0 = [C::new(1.0, 0.0), C::new(1.0, 0.0)];
        let x1 = [C::new(0.0, 1.0), C::new(0.0, 1.0)];
        let mut a0 = [C::new(0.0, 0.0); 4];
        let mut a1 = [C::new(0.0, 0.0); 4];
        let xs = [x0.as_ptr(), x1.as_ptr()];
        let as_ = [a0.as_mut_ptr(), a1.as_mut_ptr()];
        let alpha = C::new(1.0, 0.0);
        unsafe {
            her2_batched::<i32, C>(
                &h, Fill::Lower, 2, &alpha, xs.as_ptr(), 1, xs.as_ptr(), 1, as_.as_ptr(), 2, 2,
            )
        }
        .unwrap();
        // x x^H + x x^H = 2 for both batches; upper (index 2) untouched
        assert_eq!(a0, [C::new(2.0, 0.0), C::new(2.0, 0.0), C::new(0.0, 0.0), C::new(2.0, 0.0)]);
        assert_eq!(a1, a0);
    }
}
