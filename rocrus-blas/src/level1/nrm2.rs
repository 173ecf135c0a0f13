//! Euclidean norm: `result[b] = sqrt(sum_i |x_b[i]|^2)`.

use super::reduction::{workspace_size, ReductionSpace};
use rocrus_core::int64::{batch_chunks, x_chunks, GRID_X_CHUNK};
use rocrus_core::launch::launch;
use rocrus_core::numerics::check_vector;
use rocrus_core::types::vector_index;
use rocrus_core::{
    log_bench, log_profile, log_trace, ApiInt, ArgCheck, BatchSrc, Batched, BlasResult, Error,
    Handle, RealScalar, ResultPtr, RoutineName, Scalar, Status, Stride, Strided, Variant,
};

/// Validates arguments; on quick return the results are already zeroed.
unsafe fn arg_check<T: Scalar, R: RealScalar, X: BatchSrc<T>>(
    handle: &Handle,
    n: i64,
    x: &X,
    incx: i64,
    batch_count: i64,
    results: ResultPtr<R>,
) -> Result<ArgCheck, Error> {
    if results.is_null() {
        return Err(Error::InvalidPointer("result"));
    }
    if n <= 0 || incx <= 0 || batch_count <= 0 {
        if batch_count > 0 {
            handle.sync_stream()?;
            for b in 0..batch_count {
                results.write(b, R::zero());
            }
        }
        return Ok(ArgCheck::QuickReturn);
    }
    if x.is_null() {
        return Err(Error::InvalidPointer("x"));
    }
    Ok(ArgCheck::Continue)
}

/// 32-bit launcher over one chunk of batches.
pub(crate) unsafe fn nrm2_launcher<T: Scalar, X: BatchSrc<T>>(
    handle: &Handle,
    n: i32,
    x: X,
    incx: i64,
    batch_count: i32,
    workspace: *mut T::Real,
    results: ResultPtr<T::Real>,
) -> Result<(), Error> {
    let space = ReductionSpace::<T::Real>::new(workspace, n as i64, batch_count as i64);
    launch(handle, || {
        space.sum(n, batch_count, false, |b, i| {
            (*x.batch_ptr(b).offset((i * incx) as isize)).abs_sq()
        })?;
        for b in 0..batch_count as i64 {
            results.write(b, space.accum(b).sqrt());
        }
        Ok(())
    })
}

/// 64-bit launcher: batches in `GRID_YZ_CHUNK` groups, length in
/// `GRID_X_CHUNK` pieces whose sums of squares accumulate before the root.
pub(crate) unsafe fn nrm2_launcher_64<T: Scalar, X: BatchSrc<T>>(
    handle: &Handle,
    n: i64,
    x: X,
    incx: i64,
    batch_count: i64,
    workspace: *mut T::Real,
    results: ResultPtr<T::Real>,
) -> Result<(), Error> {
    for (b_base, bc) in batch_chunks(batch_count) {
        let x = x.shifted(b_base);
        let results = results.shifted(b_base);
        if n <= GRID_X_CHUNK {
            nrm2_launcher(handle, n as i32, x, incx, bc, workspace, results)?;
            continue;
        }
        let space = ReductionSpace::<T::Real>::new(workspace, GRID_X_CHUNK, bc as i64);
        launch(handle, || {
            for (off, len) in x_chunks(n) {
                space.sum(len, bc, off > 0, |b, i| {
                    let p = x.batch_ptr(b);
                    (*p.offset(vector_index(off + i, n, incx) as isize)).abs_sq()
                })?;
            }
            for b in 0..bc as i64 {
                results.write(b, space.accum(b).sqrt());
            }
            Ok(())
        })?;
    }
    Ok(())
}

unsafe fn nrm2_impl<I: ApiInt, T: Scalar, X: BatchSrc<T>>(
    handle: &Handle,
    variant: Variant,
    n: i64,
    x: X,
    x_raw: *const u8,
    incx: i64,
    stridex: Stride,
    batch_count: i64,
    results: *mut T::Real,
) -> BlasResult {
    let name = RoutineName::new::<I>(T::NORM_PREFIX, "nrm2", variant);

    let dev_bytes = workspace_size::<T::Real>(n, batch_count, I::IS_64);
    if handle.is_device_memory_size_query() {
        if n <= 0 || incx <= 0 || batch_count <= 0 {
            return Ok(Status::SizeUnchanged);
        }
        return handle.set_optimal_device_memory_size(&[dev_bytes]);
    }

    match variant {
        Variant::Single => {
            log_trace!(handle, name, n, x_raw, incx);
            log_bench!(handle, "-f", name.bench_function(), "-r", T::PRECISION, "-n", n, "--incx", incx);
            log_profile!(handle, name, "N", n, "incx", incx);
        }
        Variant::Batched => {
            log_trace!(handle, name, n, x_raw, incx, batch_count);
            log_bench!(
                handle, "-f", name.bench_function(), "-r", T::PRECISION, "-n", n, "--incx", incx,
                "--batch_count", batch_count
            );
            log_profile!(handle, name, "N", n, "incx", incx, "batch_count", batch_count);
        }
        Variant::StridedBatched => {
            log_trace!(handle, name, n, x_raw, incx, stridex, batch_count);
            log_bench!(
                handle, "-f", name.bench_function(), "-r", T::PRECISION, "-n", n, "--incx", incx,
                "--stride_x", stridex, "--batch_count", batch_count
            );
            log_profile!(
                handle, name, "N", n, "incx", incx, "stride_x", stridex, "batch_count", batch_count
            );
        }
    }

    let results = ResultPtr::new(results);
    if arg_check::<T, _, _>(handle, n, &x, incx, batch_count, results)? == ArgCheck::QuickReturn {
        return Ok(Status::Success);
    }

    check_vector(handle, &name, "x", n, x, incx, batch_count, true)?;

    let w = handle.device_malloc(&[dev_bytes])?;
    let workspace = w.ptr::<T::Real>(0);
    if I::IS_64 {
        nrm2_launcher_64(handle, n, x, incx, batch_count, workspace, results)?;
    } else {
        nrm2_launcher(handle, n as i32, x, incx, batch_count as i32, workspace, results)?;
    }
    Ok(Status::Success)
}

/// `result = ||x||_2`.
///
/// # Safety
/// `x` must be valid for `n` elements at increment `incx`; `result` must be
/// writable (a host pointer in host pointer mode).
pub unsafe fn nrm2<I: ApiInt, T: Scalar>(
    handle: &Handle,
    n: I,
    x: *const T,
    incx: I,
    result: *mut T::Real,
) -> BlasResult {
    nrm2_impl::<I, T, _>(
        handle,
        Variant::Single,
        n.as_i64(),
        Strided::single(x),
        x.cast(),
        incx.as_i64(),
        0,
        1,
        result,
    )
}

/// `result[b] = ||x[b]||_2` over an array of per-batch pointers.
///
/// # Safety
/// As [`nrm2`] for every batch; `result` holds `batch_count` slots.
pub unsafe fn nrm2_batched<I: ApiInt, T: Scalar>(
    handle: &Handle,
    n: I,
    x: *const *const T,
    incx: I,
    batch_count: I,
    result: *mut T::Real,
) -> BlasResult {
    nrm2_impl::<I, T, _>(
        handle,
        Variant::Batched,
        n.as_i64(),
        Batched::new(x),
        x.cast(),
        incx.as_i64(),
        0,
        batch_count.as_i64(),
        result,
    )
}

/// `result[b] = ||x + b*stridex||_2`.
///
/// # Safety
/// As [`nrm2_batched`].
pub unsafe fn nrm2_strided_batched<I: ApiInt, T: Scalar>(
    handle: &Handle,
    n: I,
    x: *const T,
    incx: I,
    stridex: Stride,
    batch_count: I,
    result: *mut T::Real,
) -> BlasResult {
    nrm2_impl::<I, T, _>(
        handle,
        Variant::StridedBatched,
        n.as_i64(),
        Strided::new(x, stridex),
        x.cast(),
        incx.as_i64(),
        stridex,
        batch_count.as_i64(),
        result,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex32;
    use rocrus_core::{PointerMode, RuntimeConfig};

    fn handle() -> Handle {
        Handle::with_config(&RuntimeConfig::default()).unwrap()
    }

    #[test]
    fn test_snrm2_contiguous() {
        let h = handle();
        let x = [3.0f32, 4.0];
        let mut r = 0.0f32;
        let s = unsafe { nrm2::<i32, f32>(&h, 2, x.as_ptr(), 1, &mut r) };
        assert_eq!(s, Ok(Status::Success));
        assert_eq!(r, 5.0);
    }

    #[test]
    fn test_snrm2_strided() {
        let h = handle();
        let x = [3.0f32, 100.0, 4.0];
        let mut r = 0.0f32;
        unsafe { nrm2::<i32, f32>(&h, 2, x.as_ptr(), 2, &mut r) }.unwrap();
        assert_eq!(r, 5.0);
    }

    #[test]
    fn test_scnrm2_is_real() {
        let h = handle();
        let x = [Complex32::new(3.0, 4.0), Complex32::new(0.0, 12.0)];
        let mut r = 0.0f32;
        unsafe { nrm2::<i32, Complex32>(&h, 2, x.as_ptr(), 1, &mut r) }.unwrap();
        assert_eq!(r, 13.0);
    }

    #[test]
    fn test_quick_return_zeroes_result_and_allows_null_x() {
        let h = handle();
        let mut r = [7.0f64; 3];
        let s = unsafe {
            nrm2_strided_batched::<i32, f64>(&h, 0, std::ptr::null(), 1, 0, 3, r.as_mut_ptr())
        };
        assert_eq!(s, Ok(Status::Success));
        assert_eq!(r, [0.0; 3]);
        let s = unsafe { nrm2::<i32, f64>(&h, 5, std::ptr::null(), -1, r.as_mut_ptr()) };
        assert_eq!(s, Ok(Status::Success));
    }

    #[test]
    fn test_null_pointers() {
        let h = handle();
        let x = [1.0f32];
        let mut r = 0.0f32;
        let s = unsafe { nrm2::<i32, f32>(&h, 1, std::ptr::null(), 1, &mut r) };
        assert_eq!(s.map_err(|e| e.status()), Err(Status::InvalidPointer));
        let s = unsafe { nrm2::<i32, f32>(&h, 1, x.as_ptr(), 1, std::ptr::null_mut()) };
        assert_eq!(s.map_err(|e| e.status()), Err(Status::InvalidPointer));
    }

    #[test]
    fn test_batched_long_vector() {
        let h = handle();
        let n = 3000usize;
        let a = vec![1.0f64; n];
        let b = vec![2.0f64; n];
        let ptrs = [a.as_ptr(), b.as_ptr()];
        let mut r = [0.0f64; 2];
        unsafe { nrm2_batched::<i64, f64>(&h, n as i64, ptrs.as_ptr(), 1, 2, r.as_mut_ptr()) }
            .unwrap();
        assert!((r[0] - (n as f64).sqrt()).abs() < 1e-12);
        assert!((r[1] - 2.0 * (n as f64).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_strided_batched_past_batch_chunk() {
        use rocrus_core::int64::GRID_YZ_CHUNK;

        let h = handle();
        let bc = GRID_YZ_CHUNK + 7;
        // |x_b| with one element per batch
        let x: Vec<f64> = (0..bc).map(|b| -((b % 1000) as f64)).collect();
        let expect: Vec<f64> = x.iter().map(|v| v.abs()).collect();

        let mut r = vec![-1.0f64; bc as usize];
        unsafe {
            nrm2_strided_batched::<i32, f64>(&h, 1, x.as_ptr(), 1, 1, bc as i32, r.as_mut_ptr())
        }
        .unwrap();
        assert_eq!(r, expect);

        let mut r = vec![-1.0f64; bc as usize];
        unsafe { nrm2_strided_batched::<i64, f64>(&h, 1, x.as_ptr(), 1, 1, bc, r.as_mut_ptr()) }
            .unwrap();
        assert_eq!(r, expect);
    }

    #[test]
    fn test_size_query() {
        let mut h = handle();
        h.set_pointer_mode(PointerMode::Device);
        h.start_device_memory_size_query().unwrap();
        let x = [1.0f32; 4];
        let mut r = 0.0f32;
        let s = unsafe { nrm2::<i32, f32>(&h, 4, x.as_ptr(), 1, &mut r) };
        assert_eq!(s, Ok(Status::SizeIncreased));
        let s = unsafe { nrm2::<i32, f32>(&h, 0, x.as_ptr(), 1, &mut r) };
        assert_eq!(s, Ok(Status::SizeUnchanged));
        assert_eq!(h.stop_device_memory_size_query(), Ok(64));
        assert_eq!(r, 0.0);
    }
}
