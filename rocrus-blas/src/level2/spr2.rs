//! Symmetric packed rank-2 update: `AP := alpha*x*y^T + alpha*y*x^T + AP`.

use super::{check_uplo, for_each_batch_chunk, require, COLUMN_BLOCK};
use rocrus_core::launch::{launch, launch_blocks};
use rocrus_core::logging::scalar_log;
use rocrus_core::numerics::{check_packed, check_vector};
use rocrus_core::types::{packed_index, vector_index};
use rocrus_core::{
    log_bench, log_profile, log_trace, ApiInt, ArgCheck, BatchDst, BatchSrc, Batched, BlasResult,
    Error, Fill, Handle, PointerMode, RealScalar, RoutineName, Scalar, ScalarArg, Status, Stride,
    Strided, Variant,
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
    ap: &A,
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
        if ap.is_null() {
            return Err(Error::InvalidPointer("AP"));
        }
    }
    Ok(ArgCheck::Continue)
}

/// 32-bit launcher: one work item per block of packed columns per batch.
pub(crate) unsafe fn spr2_launcher<T: Scalar, X: BatchSrc<T>, A: BatchDst<T>>(
    handle: &Handle,
    uplo: Fill,
    n: i32,
    alpha: ScalarArg<T>,
    x: X,
    incx: i64,
    y: X,
    incy: i64,
    ap: A,
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
            let a = require(ap.batch_ptr(b), "AP")? as *mut T;
            let xi = |i: i64| *xb.offset(vector_index(i, n, incx) as isize);
            let yi = |i: i64| *yb.offset(vector_index(i, n, incy) as isize);

            let j_end = (blk * COLUMN_BLOCK + COLUMN_BLOCK).min(n);
            for j in blk * COLUMN_BLOCK..j_end {
                let ax = alpha * xi(j);
                let ay = alpha * yi(j);
                let (lo, hi) = if uplo == Fill::Lower { (j, n) } else { (0, j + 1) };
                for i in lo..hi {
                    *a.offset(packed_index(uplo, n, i, j) as isize) += xi(i) * ay + yi(i) * ax;
                }
            }
            Ok(())
        })
    })
}

pub(crate) unsafe fn spr2_launcher_64<T: Scalar, X: BatchSrc<T>, A: BatchDst<T>>(
    handle: &Handle,
    uplo: Fill,
    n: i64,
    alpha: ScalarArg<T>,
    x: X,
    incx: i64,
    y: X,
    incy: i64,
    ap: A,
    batch_count: i64,
) -> Result<(), Error> {
    for_each_batch_chunk(n, batch_count, |n, b_base, bc| {
        spr2_launcher(
            handle,
            uplo,
            n,
            alpha.shifted(b_base),
            x.shifted(b_base),
            incx,
            y.shifted(b_base),
            incy,
            ap.shifted(b_base),
            bc,
        )
    })
}

unsafe fn spr2_impl<I: ApiInt, T: RealScalar, X: BatchSrc<T>, A: BatchDst<T>>(
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
    ap: A,
    ap_raw: *const u8,
    stride_ap: Stride,
    batch_count: i64,
) -> BlasResult {
    if handle.is_device_memory_size_query() {
        return Ok(Status::SizeUnchanged);
    }
    let name = RoutineName::new::<I>(T::PREFIX, "spr2", variant);

    let alpha_log = scalar_log(handle, alpha);
    log_trace!(
        handle, name, uplo, n, alpha_log, x_raw, incx, stridex, y_raw, incy, stridey, ap_raw,
        stride_ap, batch_count
    );
    if handle.pointer_mode() == PointerMode::Host {
        if let Some(&a) = alpha.as_ref() {
            log_bench!(
                handle, "-f", name.bench_function(), "-r", T::PRECISION, "--uplo", uplo, "-n", n,
                "--alpha", a, "--incx", incx, "--incy", incy, "--stride_x", stridex,
                "--stride_y", stridey, "--stride_a", stride_ap, "--batch_count", batch_count
            );
        }
    }
    log_profile!(
        handle, name, "uplo", uplo, "N", n, "incx", incx, "stride_x", stridex, "incy", incy,
        "stride_y", stridey, "stride_a", stride_ap, "batch_count", batch_count
    );

    if arg_check(handle, uplo, n, alpha, &x, incx, &y, incy, &ap, batch_count)?
        == ArgCheck::QuickReturn
    {
        return Ok(Status::Success);
    }

    check_packed(handle, &name, "AP", n, ap, batch_count, true)?;
    check_vector(handle, &name, "x", n, x, incx, batch_count, true)?;
    check_vector(handle, &name, "y", n, y, incy, batch_count, true)?;

    let alpha = ScalarArg::from_ptr(alpha, handle.pointer_mode());
    if I::IS_64 {
        spr2_launcher_64(handle, uplo, n, alpha, x, incx, y, incy, ap, batch_count)?;
    } else {
        spr2_launcher(handle, uplo, n as i32, alpha, x, incx, y, incy, ap, batch_count as i32)?;
    }

    check_packed(handle, &name, "AP", n, ap, batch_count, false)?;
    Ok(Status::Success)
}

/// Rank-2 update of a packed symmetric matrix.
///
/// # Safety
/// `alpha` must be readable in the handle's pointer mode; `x`, `y` and `ap`
/// must be valid for `n` elements at their increments and `n*(n+1)/2`
/// packed elements.
pub unsafe fn spr2<I: ApiInt, T: RealScalar>(
    handle: &Handle,
    uplo: Fill,
    n: I,
    alpha: *const T,
    x: *const T,
    incx: I,
    y: *const T,
    incy: I,
    ap: *mut T,
) -> BlasResult {
    spr2_impl::<I, T, _, _>(
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
        Strided::new_mut(ap, 0),
        ap.cast(),
        0,
        1,
    )
}

/// # Safety
/// As [`spr2`] for every batch of the pointer arrays.
pub unsafe fn spr2_batched<I: ApiInt, T: RealScalar>(
    handle: &Handle,
    uplo: Fill,
    n: I,
    alpha: *const T,
    x: *const *const T,
    incx: I,
    y: *const *const T,
    incy: I,
    ap: *const *mut T,
    batch_count: I,
) -> BlasResult {
    spr2_impl::<I, T, _, _>(
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
        Batched::new_mut(ap),
        ap.cast(),
        0,
        batch_count.as_i64(),
    )
}

/// # Safety
/// As [`spr2`] for every batch at the given strides.
pub unsafe fn spr2_strided_batched<I: ApiInt, T: RealScalar>(
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
    ap: *mut T,
    stride_ap: Stride,
    batch_count: I,
) -> BlasResult {
    spr2_impl::<I, T, _, _>(
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
        Strided::new_mut(ap, stride_ap),
        ap.cast(),
        stride_ap,
        batch_count.as_i64(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rocrus_core::RuntimeConfig;

    fn handle() -> Handle {
        Handle::with_config(&RuntimeConfig::default()).unwrap()
    }

    /// Dense symmetric update, then packed.
    fn expected(uplo: Fill, n: usize, alpha: f64, x: &[f64], y: &[f64], ap: &[f64]) -> Vec<f64> {
        let mut out = ap.to_vec();
        for j in 0..n {
            let rows: Vec<usize> = if uplo == Fill::Lower { (j..n).collect() } else { (0..=j).collect() };
            for i in rows {
                let k = packed_index(uplo, n as i64, i as i64, j as i64) as usize;
                out[k] += alpha * (x[i] * y[j] + y[i] * x[j]);
            }
        }
        out
    }

    #[test]
    fn test_dspr2_upper_and_lower() {
        let h = handle();
        let n = 5;
        let x: Vec<f64> = (1..=5).map(f64::from).collect();
        let y: Vec<f64> = (1..=5).map(|v| f64::from(v) * -2.0).collect();
        for uplo in [Fill::Upper, Fill::Lower] {
            let mut ap: Vec<f64> = (0..15).map(f64::from).collect();
            let want = expected(uplo, n, 0.5, &x, &y, &ap);
            let alpha = 0.5f64;
            unsafe {
                spr2::<i32, f64>(&h, uplo, 5, &alpha, x.as_ptr(), 1, y.as_ptr(), 1, ap.as_mut_ptr())
            }
            .unwrap();
            assert_eq!(ap, want);
        }
    }

    #[test]
    fn test_negative_increment() {
        let h = handle();
        let x = [1.0f32, 2.0];
        let y = [3.0f32, 4.0];
        let mut ap = [0.0f32; 3];
        let alpha = 1.0f32;
        // x reversed is [2, 1]
        unsafe {
            spr2::<i64, f32>(&h, Fill::Upper, 2, &alpha, x.as_ptr(), -1, y.as_ptr(), 1, ap.as_mut_ptr())
        }
        .unwrap();
        assert_eq!(ap, [12.0, 11.0, 8.0]);
    }

    #[test]
    fn test_strided_batched() {
        let h = handle();
        let x = [1.0f64, 1.0, 2.0, 2.0];
        let mut ap = [0.0f64; 6];
        let alpha = 1.0f64;
        unsafe {
            spr2_strided_batched::<i32, f64>(
                &h, Fill::Lower, 2, &alpha, x.as_ptr(), 1, 2, x.as_ptr(), 1, 2,
                ap.as_mut_ptr(), 3, 2,
            )
        }
        .unwrap();
        assert_eq!(ap, [2.0, 2.0, 2.0, 8.0, 8.0, 8.0]);
    }

    #[test]
    fn test_arg_errors_and_quick_returns() {
        let h = handle();
        let x = [1.0f32];
        let mut ap = [5.0f32];
        let one = 1.0f32;
        let zero = 0.0f32;
        let null = std::ptr::null::<f32>();
        let s = unsafe { spr2::<i32, f32>(&h, Fill::Full, 1, &one, x.as_ptr(), 1, x.as_ptr(), 1, ap.as_mut_ptr()) };
        assert_eq!(s, Err(Error::InvalidValue("uplo")));
        let s = unsafe { spr2::<i32, f32>(&h, Fill::Upper, 1, &one, x.as_ptr(), 0, x.as_ptr(), 1, ap.as_mut_ptr()) };
        assert_eq!(s.unwrap_err().status(), Status::InvalidSize);
        let s = unsafe { spr2::<i32, f32>(&h, Fill::Upper, 0, null, null, 1, null, 1, std::ptr::null_mut()) };
        assert_eq!(s, Ok(Status::Success));
        let s = unsafe { spr2::<i32, f32>(&h, Fill::Upper, 1, null, x.as_ptr(), 1, x.as_ptr(), 1, ap.as_mut_ptr()) };
        assert_eq!(s, Err(Error::InvalidPointer("alpha")));
        let s = unsafe { spr2::<i32, f32>(&h, Fill::Upper, 1, &zero, null, 1, null, 1, std::ptr::null_mut()) };
        assert_eq!(s, Ok(Status::Success));
        let s = unsafe { spr2::<i32, f32>(&h, Fill::Upper, 1, &one, x.as_ptr(), 1, x.as_ptr(), 1, std::ptr::null_mut()) };
        assert_eq!(s, Err(Error::InvalidPointer("AP")));
        let s = unsafe { spr2::<i32, f32>(&h, Fill::Upper, 1, &one, null, 1, null, 1, ap.as_mut_ptr()) };
        assert_eq!(s, Err(Error::InvalidPointer("x")));
        let s = unsafe { spr2::<i32, f32>(&h, Fill::Upper, 1, &one, x.as_ptr(), 1, null, 1, ap.as_mut_ptr()) };
        assert_eq!(s, Err(Error::InvalidPointer("y")));
        assert_eq!(ap, [5.0]);
    }

    #[test]
    fn test_device_mode_null_operand_reports_invalid_pointer() {
        let mut h = handle();
        h.set_pointer_mode(PointerMode::Device);
        let x = [1.0f32];
        let one = 1.0f32;
        let s = unsafe {
            spr2::<i32, f32>(&h, Fill::Upper, 1, &one, x.as_ptr(), 1, x.as_ptr(), 1, std::ptr::null_mut())
        };
        assert_eq!(s, Err(Error::InvalidPointer("AP")));
    }
}
