//! Dot products: `result[b] = sum_i op(x_b[i]) * y_b[i]`, `op` conjugates
//! for `dotc`. Half types accumulate in `f32`.

use super::reduction::{workspace_size, ReductionSpace};
use rocrus_core::int64::{batch_chunks, x_chunks, GRID_X_CHUNK};
use rocrus_core::launch::launch;
use rocrus_core::numerics::check_vector;
use rocrus_core::types::vector_index;
use rocrus_core::{
    log_bench, log_profile, log_trace, Accumulate, ApiInt, ArgCheck, BatchSrc, Batched,
    BlasResult, Error, Handle, ResultPtr, RoutineName, Scalar, Status, Stride, Strided, Variant,
};

/// `dot`, `dotu` or `dotc`, from the element type and conjugation.
fn base_name<T: Scalar>(conj: bool) -> &'static str {
    match (T::IS_COMPLEX, conj) {
        (false, _) => "dot",
        (true, false) => "dotu",
        (true, true) => "dotc",
    }
}

fn bench_name<T: Scalar>(conj: bool) -> &'static str {
    if conj && T::IS_COMPLEX {
        "dotc"
    } else {
        "dot"
    }
}

unsafe fn arg_check<T: Scalar, X: BatchSrc<T>>(
    handle: &Handle,
    n: i64,
    x: &X,
    y: &X,
    batch_count: i64,
    results: ResultPtr<T>,
) -> Result<ArgCheck, Error> {
    if n <= 0 || batch_count <= 0 {
        if results.is_null() {
            return Err(Error::InvalidPointer("result"));
        }
        if batch_count > 0 {
            handle.sync_stream()?;
            for b in 0..batch_count {
                results.write(b, T::zero());
            }
        }
        return Ok(ArgCheck::QuickReturn);
    }
    if x.is_null() {
        return Err(Error::InvalidPointer("x"));
    }
    if y.is_null() {
        return Err(Error::InvalidPointer("y"));
    }
    if results.is_null() {
        return Err(Error::InvalidPointer("result"));
    }
    Ok(ArgCheck::Continue)
}

#[inline(always)]
unsafe fn product<T: Accumulate, X: BatchSrc<T>>(
    x: &X,
    y: &X,
    b: i64,
    i: i64,
    n: i64,
    incx: i64,
    incy: i64,
    conj: bool,
) -> T::Compute {
    let xv = (*x.batch_ptr(b).offset(vector_index(i, n, incx) as isize)).widen();
    let yv = (*y.batch_ptr(b).offset(vector_index(i, n, incy) as isize)).widen();
    yv.mul_maybe_conj(xv, conj)
}

/// 32-bit launcher over one chunk of batches.
pub(crate) unsafe fn dot_launcher<T: Accumulate, X: BatchSrc<T>>(
    handle: &Handle,
    conj: bool,
    n: i32,
    x: X,
    incx: i64,
    y: X,
    incy: i64,
    batch_count: i32,
    workspace: *mut T::Compute,
    results: ResultPtr<T>,
) -> Result<(), Error> {
    let n64 = n as i64;
    let space = ReductionSpace::<T::Compute>::new(workspace, n64, batch_count as i64);
    launch(handle, || {
        space.sum(n, batch_count, false, |b, i| {
            product(&x, &y, b, i, n64, incx, incy, conj)
        })?;
        for b in 0..batch_count as i64 {
            results.write(b, T::narrow(space.accum(b)));
        }
        Ok(())
    })
}

/// 64-bit launcher: batch chunks, and length chunks summed into the same
/// accumulators before narrowing.
pub(crate) unsafe fn dot_launcher_64<T: Accumulate, X: BatchSrc<T>>(
    handle: &Handle,
    conj: bool,
    n: i64,
    x: X,
    incx: i64,
    y: X,
    incy: i64,
    batch_count: i64,
    workspace: *mut T::Compute,
    results: ResultPtr<T>,
) -> Result<(), Error> {
    for (b_base, bc) in batch_chunks(batch_count) {
        let x = x.shifted(b_base);
        let y = y.shifted(b_base);
        let results = results.shifted(b_base);
        if n <= GRID_X_CHUNK {
            dot_launcher(handle, conj, n as i32, x, incx, y, incy, bc, workspace, results)?;
            continue;
        }
        let space = ReductionSpace::<T::Compute>::new(workspace, GRID_X_CHUNK, bc as i64);
        launch(handle, || {
            for (off, len) in x_chunks(n) {
                space.sum(len, bc, off > 0, |b, i| {
                    product(&x, &y, b, off + i, n, incx, incy, conj)
                })?;
            }
            for b in 0..bc as i64 {
                results.write(b, T::narrow(space.accum(b)));
            }
            Ok(())
        })?;
    }
    Ok(())
}

unsafe fn dot_impl<I: ApiInt, T: Accumulate, X: BatchSrc<T>>(
    handle: &Handle,
    variant: Variant,
    conj: bool,
    n: i64,
    x: X,
    x_raw: *const u8,
    incx: i64,
    stridex: Stride,
    y: X,
    y_raw: *const u8,
    incy: i64,
    stridey: Stride,
    batch_count: i64,
    results: *mut T,
) -> BlasResult {
    let name = RoutineName::new::<I>(T::PREFIX, base_name::<T>(conj), variant);

    let dev_bytes = workspace_size::<T::Compute>(n, batch_count, I::IS_64);
    if handle.is_device_memory_size_query() {
        if n <= 0 || batch_count <= 0 {
            return Ok(Status::SizeUnchanged);
        }
        return handle.set_optimal_device_memory_size(&[dev_bytes]);
    }

    let bench_f = format!("{}{}", bench_name::<T>(conj), variant.suffix());
    match variant {
        Variant::Single => {
            log_trace!(handle, name, n, x_raw, incx, y_raw, incy);
            log_bench!(
                handle, "-f", bench_f, "-r", T::PRECISION, "-n", n, "--incx", incx, "--incy", incy
            );
            log_profile!(handle, name, "N", n, "incx", incx, "incy", incy);
        }
        Variant::Batched => {
            log_trace!(handle, name, n, x_raw, incx, y_raw, incy, batch_count);
            log_bench!(
                handle, "-f", bench_f, "-r", T::PRECISION, "-n", n, "--incx", incx, "--incy", incy,
                "--batch_count", batch_count
            );
            log_profile!(
                handle, name, "N", n, "incx", incx, "incy", incy, "batch_count", batch_count
            );
        }
        Variant::StridedBatched => {
            log_trace!(handle, name, n, x_raw, incx, stridex, y_raw, incy, stridey, batch_count);
            log_bench!(
                handle, "-f", bench_f, "-r", T::PRECISION, "-n", n, "--incx", incx, "--incy", incy,
                "--stride_x", stridex, "--stride_y", stridey, "--batch_count", batch_count
            );
            log_profile!(
                handle, name, "N", n, "incx", incx, "stride_x", stridex, "incy", incy,
                "stride_y", stridey, "batch_count", batch_count
            );
        }
    }

    let results = ResultPtr::new(results);
    if arg_check(handle, n, &x, &y, batch_count, results)? == ArgCheck::QuickReturn {
        return Ok(Status::Success);
    }

    check_vector(handle, &name, "x", n, x, incx, batch_count, true)?;
    check_vector(handle, &name, "y", n, y, incy, batch_count, true)?;

    let w = handle.device_malloc(&[dev_bytes])?;
    let workspace = w.ptr::<T::Compute>(0);
    if I::IS_64 {
        dot_launcher_64(handle, conj, n, x, incx, y, incy, batch_count, workspace, results)?;
    } else {
        dot_launcher(
            handle,
            conj,
            n as i32,
            x,
            incx,
            y,
            incy,
            batch_count as i32,
            workspace,
            results,
        )?;
    }
    Ok(Status::Success)
}

macro_rules! dot_api {
    ($single:ident, $batched:ident, $strided:ident, $conj:expr, $what:literal) => {
        #[doc = concat!("`result = ", $what, "`.")]
        ///
        /// # Safety
        /// `x` and `y` must be valid for `n` elements at their increments;
        /// `result` must be writable.
        pub unsafe fn $single<I: ApiInt, T: Accumulate>(
            handle: &Handle,
            n: I,
            x: *const T,
            incx: I,
            y: *const T,
            incy: I,
            result: *mut T,
        ) -> BlasResult {
            dot_impl::<I, T, _>(
                handle,
                Variant::Single,
                $conj,
                n.as_i64(),
                Strided::single(x),
                x.cast(),
                incx.as_i64(),
                0,
                Strided::single(y),
                y.cast(),
                incy.as_i64(),
                0,
                1,
                result,
            )
        }

        #[doc = concat!("Batched `", $what, "` over arrays of per-batch pointers.")]
        ///
        /// # Safety
        /// As the single form for every batch; `result` holds `batch_count` slots.
        pub unsafe fn $batched<I: ApiInt, T: Accumulate>(
            handle: &Handle,
            n: I,
            x: *const *const T,
            incx: I,
            y: *const *const T,
            incy: I,
            batch_count: I,
            result: *mut T,
        ) -> BlasResult {
            dot_impl::<I, T, _>(
                handle,
                Variant::Batched,
                $conj,
                n.as_i64(),
                Batched::new(x),
                x.cast(),
                incx.as_i64(),
                0,
                Batched::new(y),
                y.cast(),
                incy.as_i64(),
                0,
                batch_count.as_i64(),
                result,
            )
        }

        #[doc = concat!("Strided-batched `", $what, "`.")]
        ///
        /// # Safety
        /// As the batched form.
        pub unsafe fn $strided<I: ApiInt, T: Accumulate>(
            handle: &Handle,
            n: I,
            x: *const T,
            incx: I,
            stridex: Stride,
            y: *const T,
            incy: I,
            stridey: Stride,
            batch_count: I,
            result: *mut T,
        ) -> BlasResult {
            dot_impl::<I, T, _>(
                handle,
                Variant::StridedBatched,
                $conj,
                n.as_i64(),
                Strided::new(x, stridex),
                x.cast(),
                incx.as_i64(),
                stridex,
                Strided::new(y, stridey),
                y.cast(),
                incy.as_i64(),
                stridey,
                batch_count.as_i64(),
                result,
            )
        }
    };
}

dot_api!(dot, dot_batched, dot_strided_batched, false, "x^T y");
dot_api!(dotc, dotc_batched, dotc_strided_batched, true, "x^H y");

#[cfg(test)]
mod tests {
    use super::*;
    use half::f16;
    use num_complex::Complex64;
    use rocrus_core::RuntimeConfig;

    fn handle() -> Handle {
        Handle::with_config(&RuntimeConfig::default()).unwrap()
    }

    #[test]
    fn test_sdot() {
        let h = handle();
        let x = [1.0f32, 2.0, 3.0, 4.0];
        let y = [5.0f32, 6.0, 7.0, 8.0];
        let mut r = 0.0f32;
        unsafe { dot::<i32, f32>(&h, 4, x.as_ptr(), 1, y.as_ptr(), 1, &mut r) }.unwrap();
        assert_eq!(r, 70.0);
    }

    #[test]
    fn test_negative_increment_reverses() {
        let h = handle();
        let x = [1.0f64, 2.0, 3.0];
        let y = [4.0f64, 5.0, 6.0];
        let mut r = 0.0f64;
        // x walked backwards: 3*4 + 2*5 + 1*6
        unsafe { dot::<i32, f64>(&h, 3, x.as_ptr(), -1, y.as_ptr(), 1, &mut r) }.unwrap();
        assert_eq!(r, 28.0);
    }

    #[test]
    fn test_zero_increment_broadcasts() {
        let h = handle();
        let x = [2.0f32];
        let y = [1.0f32, 2.0, 3.0];
        let mut r = 0.0f32;
        unsafe { dot::<i32, f32>(&h, 3, x.as_ptr(), 0, y.as_ptr(), 1, &mut r) }.unwrap();
        assert_eq!(r, 12.0);
    }

    #[test]
    fn test_zdotc_conjugates_x() {
        let h = handle();
        let x = [Complex64::new(1.0, 1.0)];
        let y = [Complex64::new(2.0, 0.0)];
        let mut u = Complex64::new(0.0, 0.0);
        let mut c = Complex64::new(0.0, 0.0);
        unsafe {
            dot::<i32, Complex64>(&h, 1, x.as_ptr(), 1, y.as_ptr(), 1, &mut u).unwrap();
            dotc::<i32, Complex64>(&h, 1, x.as_ptr(), 1, y.as_ptr(), 1, &mut c).unwrap();
        }
        assert_eq!(u, Complex64::new(2.0, 2.0));
        assert_eq!(c, Complex64::new(2.0, -2.0));
    }

    #[test]
    fn test_hdot_accumulates_in_f32() {
        let h = handle();
        // 4096 * 1 exceeds f16 precision when accumulated in f16 (2048 + 1 == 2048).
        let x = vec![f16::ONE; 4096];
        let y = vec![f16::ONE; 4096];
        let mut r = f16::ZERO;
        unsafe { dot::<i32, f16>(&h, 4096, x.as_ptr(), 1, y.as_ptr(), 1, &mut r) }.unwrap();
        assert_eq!(r, f16::from_f32(4096.0));
    }

    #[test]
    fn test_strided_batched_64() {
        let h = handle();
        let x = [1.0f32, 1.0, 2.0, 2.0];
        let y = [3.0f32, 4.0, 5.0, 6.0];
        let mut r = [0.0f32; 2];
        unsafe {
            dot_strided_batched::<i64, f32>(
                &h, 2, x.as_ptr(), 1, 2, y.as_ptr(), 1, 2, 2, r.as_mut_ptr(),
            )
        }
        .unwrap();
        assert_eq!(r, [7.0, 22.0]);
    }

    #[test]
    fn test_strided_batched_past_batch_chunk() {
        use rocrus_core::int64::GRID_YZ_CHUNK;

        let h = handle();
        let bc = GRID_YZ_CHUNK + 7;
        let x: Vec<f32> = (0..bc).map(|b| (b % 1000) as f32).collect();
        let y = [2.0f32];
        let expect: Vec<f32> = x.iter().map(|v| 2.0 * v).collect();

        let mut r = vec![-1.0f32; bc as usize];
        unsafe {
            dot_strided_batched::<i32, f32>(
                &h, 1, y.as_ptr(), 0, 0, x.as_ptr(), 1, 1, bc as i32, r.as_mut_ptr(),
            )
        }
        .unwrap();
        assert_eq!(r, expect);

        let mut r = vec![-1.0f32; bc as usize];
        unsafe {
            dot_strided_batched::<i64, f32>(
                &h, 1, y.as_ptr(), 0, 0, x.as_ptr(), 1, 1, bc, r.as_mut_ptr(),
            )
        }
        .unwrap();
        assert_eq!(r, expect);
    }

    #[test]
    fn test_quick_return_and_null_checks() {
        let h = handle();
        let mut r = 9.0f32;
        let s = unsafe {
            dot::<i32, f32>(&h, 0, std::ptr::null(), 1, std::ptr::null(), 1, &mut r)
        };
        assert_eq!(s, Ok(Status::Success));
        assert_eq!(r, 0.0);
        let s = unsafe {
            dot::<i32, f32>(&h, 0, std::ptr::null(), 1, std::ptr::null(), 1, std::ptr::null_mut())
        };
        assert_eq!(s.unwrap_err().status(), Status::InvalidPointer);
        let x = [1.0f32];
        let s = unsafe {
            dot::<i32, f32>(&h, 1, x.as_ptr(), 1, x.as_ptr(), 1, std::ptr::null_mut())
        };
        assert_eq!(s.unwrap_err().status(), Status::InvalidPointer);
        let s = unsafe { dot::<i32, f32>(&h, 1, x.as_ptr(), 1, std::ptr::null(), 1, &mut r) };
        assert_eq!(s.unwrap_err(), Error::InvalidPointer("y"));
    }
}
