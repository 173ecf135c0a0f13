//! Hermitian band matrix-vector product: `y := alpha*A*x + beta*y`.
//!
//! Band storage is column-major with `lda >= k + 1`. Upper: `A(i, j)` sits
//! at row `k + i - j` of column `j`; lower: at row `i - j`.

use super::{
    check_uplo, for_each_batch_chunk, hermitian_elem, hermitian_mv_launcher, require,
};
use rocrus_core::logging::scalar_log;
use rocrus_core::numerics::{check_matrix, check_vector};
use rocrus_core::types::{col_major, vector_index};
use rocrus_core::{
    log_bench, log_profile, log_trace, ApiInt, ArgCheck, BatchDst, BatchSrc, Batched, BlasResult,
    Error, Fill, Handle, PointerMode, RoutineName, Scalar, ScalarArg, Status, Stride, Strided,
    Variant,
};

unsafe fn arg_check<T: Scalar, A: BatchSrc<T>, Y: BatchSrc<T>>(
    handle: &Handle,
    uplo: Fill,
    n: i64,
    k: i64,
    alpha: *const T,
    a: &A,
    lda: i64,
    x: &A,
    incx: i64,
    beta: *const T,
    y: &Y,
    incy: i64,
    batch_count: i64,
) -> Result<ArgCheck, Error> {
    check_uplo(uplo)?;
    if n < 0 || k < 0 || lda <= k || incx == 0 || incy == 0 || batch_count < 0 {
        return Err(Error::size(format_args!(
            "n = {n}, k = {k}, lda = {lda}, incx = {incx}, incy = {incy}, batch_count = {batch_count}"
        )));
    }
    if n == 0 || batch_count == 0 {
        return Ok(ArgCheck::QuickReturn);
    }
    if alpha.is_null() {
        return Err(Error::InvalidPointer("alpha"));
    }
    if beta.is_null() {
        return Err(Error::InvalidPointer("beta"));
    }
    if handle.pointer_mode() == PointerMode::Host {
        let (alpha, beta) = (*alpha, *beta);
        if alpha.is_zero() && beta.is_one() {
            return Ok(ArgCheck::QuickReturn);
        }
        if !alpha.is_zero() {
            if a.is_null() {
                return Err(Error::InvalidPointer("A"));
            }
            if x.is_null() {
                return Err(Error::InvalidPointer("x"));
            }
        }
        if y.is_null() {
            return Err(Error::InvalidPointer("y"));
        }
    }
    Ok(ArgCheck::Continue)
}

pub(crate) unsafe fn hbmv_launcher<T: Scalar, A: BatchSrc<T>, Y: BatchDst<T>>(
    handle: &Handle,
    uplo: Fill,
    n: i32,
    k: i64,
    alpha: ScalarArg<T>,
    a: A,
    lda: i64,
    x: A,
    incx: i64,
    beta: ScalarArg<T>,
    y: Y,
    incy: i64,
    batch_count: i32,
) -> Result<(), Error> {
    let n64 = n as i64;
    hermitian_mv_launcher(handle, n, alpha, x, beta, y, incy, batch_count, |b, i, xb| {
        let ab = require(a.batch_ptr(b), "A")?;
        let band = |r: i64, c: i64| {
            let row = if uplo == Fill::Lower { r - c } else { k + r - c };
            *ab.offset(col_major(row, c, lda) as isize)
        };
        let mut sum = T::zero();
        for j in (i - k).max(0)..=(i + k).min(n64 - 1) {
            let xj = *xb.offset(vector_index(j, n64, incx) as isize);
            sum += hermitian_elem(uplo, i, j, &band) * xj;
        }
        Ok(sum)
    })
}

pub(crate) unsafe fn hbmv_launcher_64<T: Scalar, A: BatchSrc<T>, Y: BatchDst<T>>(
    handle: &Handle,
    uplo: Fill,
    n: i64,
    k: i64,
    alpha: ScalarArg<T>,
    a: A,
    lda: i64,
    x: A,
    incx: i64,
    beta: ScalarArg<T>,
    y: Y,
    incy: i64,
    batch_count: i64,
) -> Result<(), Error> {
    for_each_batch_chunk(n, batch_count, |n, b_base, bc| {
        hbmv_launcher(
            handle,
            uplo,
            n,
            k,
            alpha.shifted(b_base),
            a.shifted(b_base),
            lda,
            x.shifted(b_base),
            incx,
            beta.shifted(b_base),
            y.shifted(b_base),
            incy,
            bc,
        )
    })
}

unsafe fn hbmv_impl<I: ApiInt, T: Scalar, A: BatchSrc<T>, Y: BatchDst<T>>(
    handle: &Handle,
    variant: Variant,
    uplo: Fill,
    n: i64,
    k: i64,
    alpha: *const T,
    a: A,
    a_raw: *const u8,
    lda: i64,
    stride_a: Stride,
    x: A,
    x_raw: *const u8,
    incx: i64,
    stridex: Stride,
    beta: *const T,
    y: Y,
    y_raw: *const u8,
    incy: i64,
    stridey: Stride,
    batch_count: i64,
) -> BlasResult {
    if handle.is_device_memory_size_query() {
        return Ok(Status::SizeUnchanged);
    }
    let name = RoutineName::new::<I>(T::PREFIX, "hbmv", variant);

    let (alpha_log, beta_log) = (scalar_log(handle, alpha), scalar_log(handle, beta));
    log_trace!(
        handle, name, uplo, n, k, alpha_log, a_raw, lda, stride_a, x_raw, incx, stridex, beta_log,
        y_raw, incy, stridey, batch_count
    );
    if handle.pointer_mode() == PointerMode::Host {
        if let (Some(&al), Some(&be)) = (alpha.as_ref(), beta.as_ref()) {
            let ((ar, ai), (br, bi)) = (al.to_f64_parts(), be.to_f64_parts());
            log_bench!(
                handle, "-f", name.bench_function(), "-r", T::PRECISION, "--uplo", uplo, "-n", n,
                "-k", k, "--alpha", ar, "--alphai", ai, "--lda", lda, "--stride_a", stride_a,
                "--incx", incx, "--stride_x", stridex, "--beta", br, "--betai", bi, "--incy", incy,
                "--stride_y", stridey, "--batch_count", batch_count
            );
        }
    }
    log_profile!(
        handle, name, "uplo", uplo, "N", n, "K", k, "lda", lda, "stride_a", stride_a, "incx",
        incx, "stride_x", stridex, "incy", incy, "stride_y", stridey, "batch_count", batch_count
    );

    if arg_check(
        handle, uplo, n, k, alpha, &a, lda, &x, incx, beta, &y, incy, batch_count,
    )? == ArgCheck::QuickReturn
    {
        return Ok(Status::Success);
    }

    check_matrix(handle, &name, "A", k + 1, n, a, lda, batch_count, true)?;
    check_vector(handle, &name, "x", n, x, incx, batch_count, true)?;
    check_vector(handle, &name, "y", n, y, incy, batch_count, true)?;

    let mode = handle.pointer_mode();
    let (alpha, beta) = (ScalarArg::from_ptr(alpha, mode), ScalarArg::from_ptr(beta, mode));
    if I::IS_64 {
        hbmv_launcher_64(
            handle, uplo, n, k, alpha, a, lda, x, incx, beta, y, incy, batch_count,
        )?;
    } else {
        hbmv_launcher(
            handle,
            uplo,
            n as i32,
            k,
            alpha,
            a,
            lda,
            x,
            incx,
            beta,
            y,
            incy,
            batch_count as i32,
        )?;
    }

    check_vector(handle, &name, "y", n, y, incy, batch_count, false)?;
    Ok(Status::Success)
}

/// `y := alpha*A*x + beta*y` with `A` Hermitian band of bandwidth `k`.
///
/// # Safety
/// `alpha` and `beta` must be readable in the handle's pointer mode; `a`
/// must hold `(k+1) x n` band storage with leading dimension `lda`; `x` and
/// `y` must be valid for `n` elements at their increments.
pub unsafe fn hbmv<I: ApiInt, T: Scalar>(
    handle: &Handle,
    uplo: Fill,
    n: I,
    k: I,
    alpha: *const T,
    a: *const T,
    lda: I,
    x: *const T,
    incx: I,
    beta: *const T,
    y: *mut T,
    incy: I,
) -> BlasResult {
    hbmv_impl::<I, T, _, _>(
        handle,
        Variant::Single,
        uplo,
        n.as_i64(),
        k.as_i64(),
        alpha,
        Strided::single(a),
        a.cast(),
        lda.as_i64(),
        0,
        Strided::single(x),
        x.cast(),
        incx.as_i64(),
        0,
        beta,
        Strided::new_mut(y, 0),
        y.cast(),
        incy.as_i64(),
        0,
        1,
    )
}

/// # Safety
/// As [`hbmv`] for every batch of the pointer arrays.
pub unsafe fn hbmv_batched<I: ApiInt, T: Scalar>(
    handle: &Handle,
    uplo: Fill,
    n: I,
    k: I,
    alpha: *const T,
    a: *const *const T,
    lda: I,
    x: *const *const T,
    incx: I,
    beta: *const T,
    y: *const *mut T,
    incy: I,
    batch_count: I,
) -> BlasResult {
    hbmv_impl::<I, T, _, _>(
        handle,
        Variant::Batched,
        uplo,
        n.as_i64(),
        k.as_i64(),
        alpha,
        Batched::new(a),
        a.cast(),
        lda.as_i64(),
        0,
        Batched::new(x),
        x.cast(),
        incx.as_i64(),
        0,
        beta,
        Batched::new_mut(y),
        y.cast(),
        incy.as_i64(),
        0,
        batch_count.as_i64(),
    )
}

/// # Safety
/// As [`hbmv`] for every batch at the given strides.
pub unsafe fn hbmv_strided_batched<I: ApiInt, T: Scalar>(
    handle: &Handle,
    uplo: Fill,
    n: I,
    k: I,
    alpha: *const T,
    a: *const T,
    lda: I,
    stride_a: Stride,
    x: *const T,
    incx: I,
    stridex: Stride,
    beta: *const T,
    y: *mut T,
    incy: I,
    stridey: Stride,
    batch_count: I,
) -> BlasResult {
    hbmv_impl::<I, T, _, _>(
        handle,
        Variant::StridedBatched,
        uplo,
        n.as_i64(),
        k.as_i64(),
        alpha,
        Strided::new(a, stride_a),
        a.cast(),
        lda.as_i64(),
        stride_a,
        Strided::new(x, stridex),
        x.cast(),
        incx.as_i64(),
        stridex,
        beta,
        Strided::new_mut(y, stridey),
        y.cast(),
        incy.as_i64(),
        stridey,
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

    /// Dense Hermitian matrix of order 3, bandwidth 1.
    fn dense() -> [[C; 3]; 3] {
        let z = C::new(0.0, 0.0);
        [
            [C::new(2.0, 0.0), C::new(1.0, 1.0), z],
            [C::new(1.0, -1.0), C::new(3.0, 0.0), C::new(0.0, 2.0)],
            [z, C::new(0.0, -2.0), C::new(4.0, 0.0)],
        ]
    }

    fn band(uplo: Fill) -> Vec<C> {
        let a = dense();
        let (k, lda) = (1i64, 2i64);
        let mut out = vec![C::new(7.0, 7.0); 6];
        for j in 0..3i64 {
            for i in (j - k).max(0)..=(j + k).min(2) {
                let row = match uplo {
                    Fill::Upper if i <= j => k + i - j,
                    Fill::Lower if i >= j => i - j,
                    _ => continue,
                };
                out[col_major(row, j, lda) as usize] = a[i as usize][j as usize];
            }
        }
        out
    }

    #[test]
    fn test_zhbmv_matches_dense() {
        let h = handle();
        let a = dense();
        let x = [C::new(1.0, 0.0), C::new(0.0, 1.0), C::new(2.0, -1.0)];
        let alpha = C::new(1.0, 1.0);
        let beta = C::new(2.0, 0.0);
        for uplo in [Fill::Upper, Fill::Lower] {
            let ab = band(uplo);
            let mut y = [C::new(1.0, 0.0); 3];
            unsafe {
                hbmv::<i32, C>(
                    &h, uplo, 3, 1, &alpha, ab.as_ptr(), 2, x.as_ptr(), 1, &beta,
                    y.as_mut_ptr(), 1,
                )
            }
            .unwrap();
            for i in 0..3 {
                let ax: C = (0..3).map(|j| a[i][j] * x[j]).sum();
                assert_eq!(y[i], alpha * ax + beta * C::new(1.0, 0.0), "{uplo:?} row {i}");
            }
        }
    }

    #[test]
    fn test_beta_zero_ignores_nan_in_y() {
        let h = handle();
        let ab = band(Fill::Upper);
        let x = [C::new(1.0, 0.0); 3];
        let (alpha, beta) = (C::new(1.0, 0.0), C::new(0.0, 0.0));
        let mut y = [C::new(f64::NAN, 0.0); 3];
        unsafe {
            hbmv::<i32, C>(&h, Fill::Upper, 3, 1, &alpha, ab.as_ptr(), 2, x.as_ptr(), 1, &beta, y.as_mut_ptr(), 1)
        }
        .unwrap();
        assert!(y.iter().all(|v| !v.re.is_nan()));
    }

    #[test]
    fn test_bad_args() {
        let h = handle();
        let ab = band(Fill::Upper);
        let x = [C::new(1.0, 0.0); 3];
        let mut y = [C::new(0.0, 0.0); 3];
        let (one, zero) = (C::new(1.0, 0.0), C::new(0.0, 0.0));
        let nul = std::ptr::null::<C>();
        let nul_mut = std::ptr::null_mut::<C>();

        // lda must exceed k
        let s = unsafe { hbmv::<i32, C>(&h, Fill::Upper, 3, 1, &one, ab.as_ptr(), 1, x.as_ptr(), 1, &one, y.as_mut_ptr(), 1) };
        assert_eq!(s.unwrap_err().status(), Status::InvalidSize);
        let s = unsafe { hbmv::<i32, C>(&h, Fill::Upper, 3, 1, nul, ab.as_ptr(), 2, x.as_ptr(), 1, &one, y.as_mut_ptr(), 1) };
        assert_eq!(s, Err(Error::InvalidPointer("alpha")));
        let s = unsafe { hbmv::<i32, C>(&h, Fill::Upper, 3, 1, &one, ab.as_ptr(), 2, x.as_ptr(), 1, nul, y.as_mut_ptr(), 1) };
        assert_eq!(s, Err(Error::InvalidPointer("beta")));
        let s = unsafe { hbmv::<i32, C>(&h, Fill::Upper, 3, 1, &one, nul, 2, x.as_ptr(), 1, &one, y.as_mut_ptr(), 1) };
        assert_eq!(s, Err(Error::InvalidPointer("A")));
        // alpha == 0: A and x may be null
        let s = unsafe { hbmv::<i32, C>(&h, Fill::Upper, 3, 1, &zero, nul, 2, nul, 1, &one, y.as_mut_ptr(), 1) };
        assert_eq!(s, Ok(Status::Success));
        let s = unsafe { hbmv::<i32, C>(&h, Fill::Upper, 3, 1, &zero, nul, 2, nul, 1, &zero, nul_mut, 1) };
        assert_eq!(s, Err(Error::InvalidPointer("y")));
        // alpha == 0 and beta == 1: everything may be null
        let s = unsafe { hbmv::<i32, C>(&h, Fill::Upper, 3, 1, &zero, nul, 2, nul, 1, &one, nul_mut, 1) };
        assert_eq!(s, Ok(Status::Success));
        // n == 0: even the scalars may be null
        let s = unsafe { hbmv::<i32, C>(&h, Fill::Upper, 0, 1, nul, nul, 2, nul, 1, nul, nul_mut, 1) };
        assert_eq!(s, Ok(Status::Success));
    }
}
