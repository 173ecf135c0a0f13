//! Hermitian packed matrix-vector product: `y := alpha*A*x + beta*y`.

use super::{
    check_uplo, for_each_batch_chunk, hermitian_elem, hermitian_mv_launcher, require,
};
use rocrus_core::logging::scalar_log;
use rocrus_core::numerics::{check_packed, check_vector};
use rocrus_core::types::{packed_index, vector_index};
use rocrus_core::{
    log_bench, log_profile, log_trace, ApiInt, ArgCheck, BatchDst, BatchSrc, Batched, BlasResult,
    Error, Fill, Handle, PointerMode, RoutineName, Scalar, ScalarArg, Status, Stride, Strided,
    Variant,
};

unsafe fn arg_check<T: Scalar, A: BatchSrc<T>, Y: BatchSrc<T>>(
    handle: &Handle,
    uplo: Fill,
    n: i64,
    alpha: *const T,
    ap: &A,
    x: &A,
    incx: i64,
    beta: *const T,
    y: &Y,
    incy: i64,
    batch_count: i64,
) -> Result<ArgCheck, Error> {
    check_uplo(uplo)?;
    if n < 0 || incx == 0 || incy == 0 || batch_count < 0 {
        return Err(Error::size(format_args!(
            "n = {n}, incx = {incx}, incy = {incy}, batch_count = {batch_count}"
        )));
    }
    if n == 0 || batch_count == 0 {
        return Ok(ArgCheck::QuickReturn);
    }
    if alpha.is_null() || beta.is_null() {
        return Err(Error::InvalidPointer(if alpha.is_null() { "alpha" } else { "beta" }));
    }
    if handle.pointer_mode() == PointerMode::Host {
        let (alpha, beta) = (*alpha, *beta);
        if alpha.is_zero() && beta.is_one() {
            return Ok(ArgCheck::QuickReturn);
        }
        if !alpha.is_zero() && (ap.is_null() || x.is_null()) {
            return Err(Error::InvalidPointer(if ap.is_null() { "AP" } else { "x" }));
        }
        if y.is_null() {
            return Err(Error::InvalidPointer("y"));
        }
    }
    Ok(ArgCheck::Continue)
}

pub(crate) unsafe fn hpmv_launcher<T: Scalar, A: BatchSrc<T>, Y: BatchDst<T>>(
    handle: &Handle,
    uplo: Fill,
    n: i32,
    alpha: ScalarArg<T>,
    ap: A,
    x: A,
    incx: i64,
    beta: ScalarArg<T>,
    y: Y,
    incy: i64,
    batch_count: i32,
) -> Result<(), Error> {
    let n64 = n as i64;
    hermitian_mv_launcher(handle, n, alpha, x, beta, y, incy, batch_count, |b, i, xb| {
        let apb = require(ap.batch_ptr(b), "AP")?;
        let packed = |r: i64, c: i64| *apb.offset(packed_index(uplo, n64, r, c) as isize);
        let mut sum = T::zero();
        for j in 0..n64 {
            let xj = *xb.offset(vector_index(j, n64, incx) as isize);
            sum += hermitian_elem(uplo, i, j, &packed) * xj;
        }
        Ok(sum)
    })
}

/// Batch-chunked launcher for the `_64` API; orders beyond `i32::MAX` are
/// rejected with `InvalidSize`.
pub(crate) unsafe fn hpmv_launcher_64<T: Scalar, A: BatchSrc<T>, Y: BatchDst<T>>(
    handle: &Handle,
    uplo: Fill,
    n: i64,
    alpha: ScalarArg<T>,
    ap: A,
    x: A,
    incx: i64,
    beta: ScalarArg<T>,
    y: Y,
    incy: i64,
    batch_count: i64,
) -> Result<(), Error> {
    for_each_batch_chunk(n, batch_count, |n, b_base, bc| {
        hpmv_launcher(
            handle,
            uplo,
            n,
            alpha.shifted(b_base),
            ap.shifted(b_base),
            x.shifted(b_base),
            incx,
            beta.shifted(b_base),
            y.shifted(b_base),
            incy,
            bc,
        )
    })
}

unsafe fn hpmv_impl<I: ApiInt, T: Scalar, A: BatchSrc<T>, Y: BatchDst<T>>(
    handle: &Handle,
    variant: Variant,
    uplo: Fill,
    n: i64,
    alpha: *const T,
    ap: A,
    ap_raw: *const u8,
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
    let name = RoutineName::new::<I>(T::PREFIX, "hpmv", variant);

    let (alpha_log, beta_log) = (scalar_log(handle, alpha), scalar_log(handle, beta));
    log_trace!(
        handle, name, uplo, n, alpha_log, ap_raw, stride_a, x_raw, incx, stridex, beta_log, y_raw,
        incy, stridey, batch_count
    );
    if handle.pointer_mode() == PointerMode::Host {
        if let (Some(&al), Some(&be)) = (alpha.as_ref(), beta.as_ref()) {
            let ((ar, ai), (br, bi)) = (al.to_f64_parts(), be.to_f64_parts());
            log_bench!(
                handle, "-f", name.bench_function(), "-r", T::PRECISION, "--uplo", uplo, "-n", n,
                "--alpha", ar, "--alphai", ai, "--stride_a", stride_a, "--incx", incx,
                "--stride_x", stridex, "--beta", br, "--betai", bi, "--incy", incy,
                "--stride_y", stridey, "--batch_count", batch_count
            );
        }
    }
    log_profile!(
        handle, name, "uplo", uplo, "N", n, "stride_a", stride_a, "incx", incx, "stride_x",
        stridex, "incy", incy, "stride_y", stridey, "batch_count", batch_count
    );

    if arg_check(handle, uplo, n, alpha, &ap, &x, incx, beta, &y, incy, batch_count)?
        == ArgCheck::QuickReturn
    {
        return Ok(Status::Success);
    }

    check_packed(handle, &name, "AP", n, ap, batch_count, true)?;
    check_vector(handle, &name, "x", n, x, incx, batch_count, true)?;
    check_vector(handle, &name, "y", n, y, incy, batch_count, true)?;

    let mode = handle.pointer_mode();
    let (alpha, beta) = (ScalarArg::from_ptr(alpha, mode), ScalarArg::from_ptr(beta, mode));
    if I::IS_64 {
        hpmv_launcher_64(handle, uplo, n, alpha, ap, x, incx, beta, y, incy, batch_count)?;
    } else {
        hpmv_launcher(
            handle,
            uplo,
            n as i32,
            alpha,
            ap,
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

/// `y := alpha*A*x + beta*y` with `A` Hermitian in packed storage.
///
/// # Safety
/// `alpha` and `beta` must be readable in the handle's pointer mode; `ap`
/// must hold `n*(n+1)/2` elements; `x` and `y` must be valid for `n`
/// elements at their increments.
pub unsafe fn hpmv<I: ApiInt, T: Scalar>(
    handle: &Handle,
    uplo: Fill,
    n: I,
    alpha: *const T,
    ap: *const T,
    x: *const T,
    incx: I,
    beta: *const T,
    y: *mut T,
    incy: I,
) -> BlasResult {
    hpmv_impl::<I, T, _, _>(
        handle,
        Variant::Single,
        uplo,
        n.as_i64(),
        alpha,
        Strided::single(ap),
        ap.cast(),
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
/// As [`hpmv`] for every batch of the pointer arrays.
pub unsafe fn hpmv_batched<I: ApiInt, T: Scalar>(
    handle: &Handle,
    uplo: Fill,
    n: I,
    alpha: *const T,
    ap: *const *const T,
    x: *const *const T,
    incx: I,
    beta: *const T,
    y: *const *mut T,
    incy: I,
    batch_count: I,
) -> BlasResult {
    hpmv_impl::<I, T, _, _>(
        handle,
        Variant::Batched,
        uplo,
        n.as_i64(),
        alpha,
        Batched::new(ap),
        ap.cast(),
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
/// As [`hpmv`] for every batch at the given strides.
pub unsafe fn hpmv_strided_batched<I: ApiInt, T: Scalar>(
    handle: &Handle,
    uplo: Fill,
    n: I,
    alpha: *const T,
    ap: *const T,
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
    hpmv_impl::<I, T, _, _>(
        handle,
        Variant::StridedBatched,
        uplo,
        n.as_i64(),
        alpha,
        Strided::new(ap, stride_a),
        ap.cast(),
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
    use num_complex::Complex32 as C;
    use rocrus_core::RuntimeConfig;

    fn handle() -> Handle {
        Handle::with_config(&RuntimeConfig::default()).unwrap()
    }

    fn dense() -> [[C; 2]; 2] {
        [
            [C::new(1.0, 0.0), C::new(2.0, 3.0)],
            [C::new(2.0, -3.0), C::new(5.0, 0.0)],
        ]
    }

    fn pack(uplo: Fill) -> Vec<C> {
        match uplo {
            Fill::Lower => vec![dense()[0][0], dense()[1][0], dense()[1][1]],
            _ => vec![dense()[0][0], dense()[0][1], dense()[1][1]],
        }
    }

    #[test]
    fn test_chpmv_strided_batched() {
        let h = handle();
        let a = dense();
        let alpha = C::new(2.0, 0.0);
        let beta = C::new(0.0, 1.0);
        for uplo in [Fill::Upper, Fill::Lower] {
            let mut ap = pack(uplo);
            ap.extend(pack(uplo));
            let x = [C::new(1.0, 1.0), C::new(-1.0, 0.0), C::new(0.0, 2.0), C::new(3.0, 0.0)];
            let mut y = [C::new(1.0, 0.0); 4];
            unsafe {
                hpmv_strided_batched::<i32, C>(
                    &h, uplo, 2, &alpha, ap.as_ptr(), 3, x.as_ptr(), 1, 2, &beta,
                    y.as_mut_ptr(), 1, 2, 2,
                )
            }
            .unwrap();
            for b in 0..2 {
                for i in 0..2 {
                    let ax: C = (0..2).map(|j| a[i][j] * x[2 * b + j]).sum();
                    assert_eq!(y[2 * b + i], alpha * ax + beta, "{uplo:?} batch {b} row {i}");
                }
            }
        }
    }

    #[test]
    fn test_device_mode_reads_scalars_in_kernel() {
        let mut h = handle();
        h.set_pointer_mode(PointerMode::Device);
        let ap = pack(Fill::Upper);
        let x = [C::new(1.0, 0.0); 2];
        let (zero, one) = (C::new(0.0, 0.0), C::new(1.0, 0.0));
        let mut y = [C::new(4.0, 0.0); 2];
        // alpha == 0, beta == 1 is a no-op even with null operands
        let s = unsafe {
            hpmv::<i32, C>(&h, Fill::Upper, 2, &zero, std::ptr::null(), std::ptr::null(), 1, &one, std::ptr::null_mut(), 1)
        };
        assert_eq!(s, Ok(Status::Success));
        let s = unsafe {
            hpmv::<i32, C>(&h, Fill::Upper, 2, &one, std::ptr::null(), x.as_ptr(), 1, &zero, y.as_mut_ptr(), 1)
        };
        assert_eq!(s, Err(Error::InvalidPointer("AP")));
        unsafe {
            hpmv::<i32, C>(&h, Fill::Upper, 2, &one, ap.as_ptr(), x.as_ptr(), 1, &zero, y.as_mut_ptr(), 1)
        }
        .unwrap();
        assert_eq!(y, [C::new(3.0, 3.0), C::new(7.0, -3.0)]);
    }

    #[test]
    fn test_hpmv_64_rejects_oversized_order() {
        let h = handle();
        let one = C::new(1.0, 0.0);
        let two = C::new(2.0, 0.0);
        let x = [one];
        let mut y = [one];
        let s = unsafe {
            hpmv::<i64, C>(
                &h, Fill::Upper, i32::MAX as i64 + 1, &one, x.as_ptr(), x.as_ptr(), 1, &two,
                y.as_mut_ptr(), 1,
            )
        };
        assert_eq!(s.unwrap_err().status(), Status::InvalidSize);
    }
}
