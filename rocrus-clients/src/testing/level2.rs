use super::{expect_status, int, pointer_modes, time_calls, CaseInt, CaseResult, Scalars};
use crate::argument_model::{ArgumentModel, Field, Timing};
use crate::arguments::Arguments;
use crate::buffers::{
    DeviceBatchVector, DeviceStridedBatchVector, HostBatchVector, HostStridedBatchVector,
};
use crate::check::{norm_check_general, norm_error, norm_tolerance, unit_check_general};
use crate::flops::*;
use crate::init::{
    init_matrix, init_vector, make_hermitian, make_symmetric, make_triangular, regular_to_packed,
    seeded_rng, NanInit,
};
use crate::reference::{ref_hbmv, ref_her2, ref_hpmv, ref_spr2, ref_tpsv};
use crate::timing::time_us_no_sync;
use rocrus_blas::level2;
use rocrus_core::types::packed_len;
use rocrus_core::{Diagonal, Fill, Handle, Operation, PointerMode, RealScalar, Scalar, Status};
use std::ptr;

const BOTH_MODES: [PointerMode; 2] = [PointerMode::Host, PointerMode::Device];

/// Records the norm error of one pointer-mode run.
fn record(timing: &mut Timing, mode: PointerMode, error: f64) {
    match mode {
        PointerMode::Host => timing.error_host = Some(error),
        PointerMode::Device => timing.error_device = Some(error),
    }
}

// ============================================================================
// spr2_batched
// ============================================================================

pub fn testing_spr2_batched_bad_arg<I: CaseInt, T: RealScalar>(_arg: &Arguments) -> CaseResult {
    let (n, inc, bc) = (100, 1, 2);
    let (n_i, inc_i, bc_i, zero_i) = (int::<I>(n)?, int::<I>(inc)?, int::<I>(bc)?, int::<I>(0)?);
    for mode in BOTH_MODES {
        let mut handle = Handle::new()?;
        handle.set_pointer_mode(mode);
        let scalars = Scalars::new(&[T::one(), T::zero()])?;
        let (alpha, zero) = (scalars.ptr(0, mode), scalars.ptr(1, mode));
        let dap = DeviceBatchVector::<T>::new(packed_len(n), 1, bc)?;
        let dx = DeviceBatchVector::<T>::new(n, inc, bc)?;
        let dy = DeviceBatchVector::<T>::new(n, inc, bc)?;
        let (x, y, ap) = (dx.ptr_on_device(), dy.ptr_on_device(), dap.ptr_on_device_mut());
        let call = |uplo, n, alpha, x, y, ap, bc| unsafe {
            level2::spr2_batched::<I, T>(&handle, uplo, n, alpha, x, inc_i, y, inc_i, ap, bc)
        };

        expect_status(call(Fill::Full, n_i, alpha, x, y, ap, bc_i), Status::InvalidValue, "uplo")?;
        expect_status(
            call(Fill::Upper, n_i, ptr::null(), x, y, ap, bc_i),
            Status::InvalidPointer,
            "null alpha",
        )?;
        if mode == PointerMode::Host {
            expect_status(call(Fill::Upper, n_i, alpha, ptr::null(), y, ap, bc_i), Status::InvalidPointer, "null x")?;
            expect_status(call(Fill::Upper, n_i, alpha, x, ptr::null(), ap, bc_i), Status::InvalidPointer, "null y")?;
            expect_status(call(Fill::Upper, n_i, alpha, x, y, ptr::null(), bc_i), Status::InvalidPointer, "null AP")?;
        }
        let (nx, ny, nap) = (ptr::null(), ptr::null(), ptr::null());
        expect_status(call(Fill::Upper, zero_i, ptr::null(), nx, ny, nap, bc_i), Status::Success, "n == 0")?;
        expect_status(call(Fill::Upper, n_i, ptr::null(), nx, ny, nap, zero_i), Status::Success, "batch_count == 0")?;
        expect_status(call(Fill::Upper, n_i, zero, nx, ny, nap, bc_i), Status::Success, "alpha == 0")?;
    }
    Ok(None)
}

pub fn testing_spr2_batched<I: CaseInt, T: RealScalar>(arg: &Arguments) -> CaseResult {
    let (n, incx, incy, bc) = (arg.n, arg.incx, arg.incy, arg.batch_count);
    let uplo = arg.uplo()?;
    let alpha = arg.get_alpha::<T>();
    let mut handle = Handle::new()?;

    let invalid = n < 0 || incx == 0 || incy == 0 || bc < 0;
    if invalid || n == 0 || bc == 0 {
        let r = unsafe {
            level2::spr2_batched::<I, T>(
                &handle,
                uplo,
                int(n)?,
                ptr::null(),
                ptr::null(),
                int(incx)?,
                ptr::null(),
                int(incy)?,
                ptr::null(),
                int(bc)?,
            )
        };
        let expected = if invalid { Status::InvalidSize } else { Status::Success };
        expect_status(r, expected, "argument check")?;
        return Ok(None);
    }

    let ap_len = packed_len(n);
    let mut rng = seeded_rng(arg.seed);
    let mut hx = HostBatchVector::<T>::new(n, incx, bc);
    let mut hy = HostBatchVector::<T>::new(n, incy, bc);
    let mut hap = HostBatchVector::<T>::new(ap_len, 1, bc);
    for b in 0..bc as usize {
        init_vector(&mut rng, hx.batch_mut(b), n, incx, NanInit::AlphaSetsNan, arg.alpha_is_nan(), false);
        init_vector(&mut rng, hy.batch_mut(b), n, incy, NanInit::AlphaSetsNan, arg.alpha_is_nan(), false);
        let mut full = vec![T::zero(); (n * n) as usize];
        init_matrix(&mut rng, &mut full, n, n, n);
        make_symmetric(&mut full, n, n);
        regular_to_packed(uplo, &full, hap.batch_mut(b), n, n);
    }
    let dx = DeviceBatchVector::new(n, incx, bc)?;
    let dy = DeviceBatchVector::new(n, incy, bc)?;
    let dap = DeviceBatchVector::new(ap_len, 1, bc)?;
    dx.transfer_from(&hx)?;
    dy.transfer_from(&hy)?;
    let scalars = Scalars::new(&[alpha])?;

    let (n_i, incx_i, incy_i, bc_i) = (int::<I>(n)?, int::<I>(incx)?, int::<I>(incy)?, int::<I>(bc)?);
    let call = |handle: &Handle, mode| unsafe {
        level2::spr2_batched::<I, T>(
            handle,
            uplo,
            n_i,
            scalars.ptr(0, mode),
            dx.ptr_on_device(),
            incx_i,
            dy.ptr_on_device(),
            incy_i,
            dap.ptr_on_device_mut(),
            bc_i,
        )
    };
    let mut timing = Timing::default();

    if arg.unit_check || arg.norm_check {
        let mut gold = hap.clone();
        let start = time_us_no_sync();
        for b in 0..bc as usize {
            ref_spr2(uplo, n, alpha, &hx[b], incx, &hy[b], incy, gold.batch_mut(b));
        }
        timing.cpu_us = time_us_no_sync() - start;

        for mode in pointer_modes(arg) {
            handle.set_pointer_mode(mode);
            dap.transfer_from(&hap)?;
            call(&handle, mode)?;
            let mut got = HostBatchVector::<T>::new(ap_len, 1, bc);
            got.transfer_from(&dap)?;
            if arg.unit_check {
                unit_check_general(1, ap_len, 1, &gold, &got)?;
            }
            if arg.norm_check {
                let e = norm_error(1, ap_len, 1, &gold, &got);
                record(&mut timing, mode, e.into_iter().fold(0.0, f64::max));
            }
        }
    }

    if !arg.timing {
        return Ok(None);
    }
    handle.set_pointer_mode(PointerMode::Device);
    timing.gpu_us = time_calls(&handle, arg, || call(&handle, PointerMode::Device))?;
    timing.gflop = spr2_gflop_count::<T>(n) * bc as f64;
    timing.gbyte = spr2_gbyte_count::<T>(n) * bc as f64;
    let model = ArgumentModel(&[
        Field::Uplo,
        Field::N,
        Field::Alpha,
        Field::Incx,
        Field::Incy,
        Field::BatchCount,
    ]);
    Ok(Some(model.log_args(arg, false, &timing)))
}

// ============================================================================
// her2_strided_batched
// ============================================================================

pub fn testing_her2_strided_batched_bad_arg<I: CaseInt, T: Scalar>(_arg: &Arguments) -> CaseResult {
    let (n, inc, lda, bc) = (100, 1, 100, 2);
    let (n_i, inc_i, lda_i, bc_i, zero_i) =
        (int::<I>(n)?, int::<I>(inc)?, int::<I>(lda)?, int::<I>(bc)?, int::<I>(0)?);
    let (sx, sa) = (n, lda * n);
    for mode in BOTH_MODES {
        let mut handle = Handle::new()?;
        handle.set_pointer_mode(mode);
        let scalars = Scalars::new(&[T::one(), T::zero()])?;
        let (alpha, zero) = (scalars.ptr(0, mode), scalars.ptr(1, mode));
        let hx = HostStridedBatchVector::<T>::new(n, inc, sx, bc);
        let ha = HostStridedBatchVector::<T>::matrix(lda, n, sa, bc);
        let dx = DeviceStridedBatchVector::like(&hx)?;
        let dy = DeviceStridedBatchVector::like(&hx)?;
        let da = DeviceStridedBatchVector::like(&ha)?;
        let call = |uplo, n, alpha, x, y, a: *mut T, lda, bc| unsafe {
            level2::her2_strided_batched::<I, T>(
                &handle, uplo, n, alpha, x, inc_i, sx, y, inc_i, sx, a, lda, sa, bc,
            )
        };
        let (x, y, a) = (dx.as_ptr(), dy.as_ptr(), da.as_mut_ptr());

        expect_status(call(Fill::Full, n_i, alpha, x, y, a, lda_i, bc_i), Status::InvalidValue, "uplo")?;
        expect_status(
            call(Fill::Upper, n_i, alpha, x, y, a, int(n - 1)?, bc_i),
            Status::InvalidSize,
            "lda < n",
        )?;
        expect_status(
            call(Fill::Upper, n_i, ptr::null(), x, y, a, lda_i, bc_i),
            Status::InvalidPointer,
            "null alpha",
        )?;
        if mode == PointerMode::Host {
            expect_status(call(Fill::Upper, n_i, alpha, ptr::null(), y, a, lda_i, bc_i), Status::InvalidPointer, "null x")?;
            expect_status(call(Fill::Upper, n_i, alpha, x, ptr::null(), a, lda_i, bc_i), Status::InvalidPointer, "null y")?;
            expect_status(call(Fill::Upper, n_i, alpha, x, y, ptr::null_mut(), lda_i, bc_i), Status::InvalidPointer, "null A")?;
        }
        let (nx, ny, na) = (ptr::null(), ptr::null(), ptr::null_mut());
        expect_status(call(Fill::Upper, zero_i, ptr::null(), nx, ny, na, lda_i, bc_i), Status::Success, "n == 0")?;
        expect_status(call(Fill::Upper, n_i, ptr::null(), nx, ny, na, lda_i, zero_i), Status::Success, "batch_count == 0")?;
        expect_status(call(Fill::Upper, n_i, zero, nx, ny, na, lda_i, bc_i), Status::Success, "alpha == 0")?;
    }
    Ok(None)
}

pub fn testing_her2_strided_batched<I: CaseInt, T: Scalar>(arg: &Arguments) -> CaseResult {
    let (n, incx, incy, lda, bc) = (arg.n, arg.incx, arg.incy, arg.lda, arg.batch_count);
    let uplo = arg.uplo()?;
    let alpha = arg.get_alpha::<T>();
    let mut handle = Handle::new()?;

    let invalid = n < 0 || incx == 0 || incy == 0 || lda < n.max(1) || bc < 0;
    if invalid || n == 0 || bc == 0 {
        let r = unsafe {
            level2::her2_strided_batched::<I, T>(
                &handle,
                uplo,
                int(n)?,
                ptr::null(),
                ptr::null(),
                int(incx)?,
                arg.stride_x,
                ptr::null(),
                int(incy)?,
                arg.stride_y,
                ptr::null_mut(),
                int(lda)?,
                arg.stride_a,
                int(bc)?,
            )
        };
        let expected = if invalid { Status::InvalidSize } else { Status::Success };
        expect_status(r, expected, "argument check")?;
        return Ok(None);
    }

    let mut rng = seeded_rng(arg.seed);
    let mut hx = HostStridedBatchVector::<T>::new(n, incx, arg.stride_x, bc);
    let mut hy = HostStridedBatchVector::<T>::new(n, incy, arg.stride_y, bc);
    let mut ha = HostStridedBatchVector::<T>::matrix(lda, n, arg.stride_a, bc);
    for b in 0..bc as usize {
        init_vector(&mut rng, hx.batch_mut(b), n, incx, NanInit::AlphaSetsNan, arg.alpha_is_nan(), false);
        init_vector(&mut rng, hy.batch_mut(b), n, incy, NanInit::AlphaSetsNan, arg.alpha_is_nan(), false);
        init_matrix(&mut rng, ha.batch_mut(b), n, n, lda);
        make_hermitian(ha.batch_mut(b), n, lda);
    }
    let dx = DeviceStridedBatchVector::like(&hx)?;
    let dy = DeviceStridedBatchVector::like(&hy)?;
    let da = DeviceStridedBatchVector::like(&ha)?;
    dx.transfer_from(&hx)?;
    dy.transfer_from(&hy)?;
    let scalars = Scalars::new(&[alpha])?;

    let (n_i, incx_i, incy_i, lda_i, bc_i) =
        (int::<I>(n)?, int::<I>(incx)?, int::<I>(incy)?, int::<I>(lda)?, int::<I>(bc)?);
    let call = |handle: &Handle, mode| unsafe {
        level2::her2_strided_batched::<I, T>(
            handle,
            uplo,
            n_i,
            scalars.ptr(0, mode),
            dx.as_ptr(),
            incx_i,
            dx.stride(),
            dy.as_ptr(),
            incy_i,
            dy.stride(),
            da.as_mut_ptr(),
            lda_i,
            da.stride(),
            bc_i,
        )
    };
    let mut timing = Timing::default();

    if arg.unit_check || arg.norm_check {
        let mut gold = ha.clone();
        let start = time_us_no_sync();
        for b in 0..bc as usize {
            ref_her2(uplo, n, alpha, &hx[b], incx, &hy[b], incy, &mut gold[b], lda);
        }
        timing.cpu_us = time_us_no_sync() - start;

        for mode in pointer_modes(arg) {
            handle.set_pointer_mode(mode);
            da.transfer_from(&ha)?;
            call(&handle, mode)?;
            let mut got = ha.clone();
            got.transfer_from(&da)?;
            if arg.unit_check {
                unit_check_general(n, n, lda, &gold, &got)?;
            }
            if arg.norm_check {
                let e = norm_error(n, n, lda, &gold, &got);
                record(&mut timing, mode, e.into_iter().fold(0.0, f64::max));
            }
        }
    }

    if !arg.timing {
        return Ok(None);
    }
    handle.set_pointer_mode(PointerMode::Device);
    timing.gpu_us = time_calls(&handle, arg, || call(&handle, PointerMode::Device))?;
    timing.gflop = her2_gflop_count::<T>(n) * bc as f64;
    timing.gbyte = her2_gbyte_count::<T>(n) * bc as f64;
    let model = ArgumentModel(&[
        Field::Uplo,
        Field::N,
        Field::Alpha,
        Field::Lda,
        Field::Incx,
        Field::Incy,
        Field::StrideX,
        Field::StrideY,
        Field::StrideA,
        Field::BatchCount,
    ]);
    Ok(Some(model.log_args(arg, true, &timing)))
}

// ============================================================================
// hbmv_batched
// ============================================================================

pub fn testing_hbmv_batched_bad_arg<I: CaseInt, T: Scalar>(_arg: &Arguments) -> CaseResult {
    let (n, k, lda, inc, bc) = (100, 5, 100, 1, 2);
    let (n_i, k_i, lda_i, inc_i, bc_i, zero_i) = (
        int::<I>(n)?,
        int::<I>(k)?,
        int::<I>(lda)?,
        int::<I>(inc)?,
        int::<I>(bc)?,
        int::<I>(0)?,
    );
    for mode in BOTH_MODES {
        let mut handle = Handle::new()?;
        handle.set_pointer_mode(mode);
        let scalars = Scalars::new(&[T::one(), T::one(), T::zero()])?;
        let (alpha, beta, zero, one) =
            (scalars.ptr(0, mode), scalars.ptr(1, mode), scalars.ptr(2, mode), scalars.ptr(1, mode));
        let da = DeviceBatchVector::<T>::matrix(lda, n, bc)?;
        let dx = DeviceBatchVector::<T>::new(n, inc, bc)?;
        let dy = DeviceBatchVector::<T>::new(n, inc, bc)?;
        let (a, x, y) = (da.ptr_on_device(), dx.ptr_on_device(), dy.ptr_on_device_mut());
        let call = |uplo, n, k, alpha, a, lda, x, beta, y, bc| unsafe {
            level2::hbmv_batched::<I, T>(&handle, uplo, n, k, alpha, a, lda, x, inc_i, beta, y, inc_i, bc)
        };
        let uplo = Fill::Upper;

        expect_status(call(Fill::Full, n_i, k_i, alpha, a, lda_i, x, beta, y, bc_i), Status::InvalidValue, "uplo")?;
        expect_status(call(uplo, n_i, k_i, alpha, a, k_i, x, beta, y, bc_i), Status::InvalidSize, "lda <= k")?;
        expect_status(call(uplo, n_i, k_i, ptr::null(), a, lda_i, x, beta, y, bc_i), Status::InvalidPointer, "null alpha")?;
        expect_status(call(uplo, n_i, k_i, alpha, a, lda_i, x, ptr::null(), y, bc_i), Status::InvalidPointer, "null beta")?;
        if mode == PointerMode::Host {
            expect_status(call(uplo, n_i, k_i, alpha, ptr::null(), lda_i, x, beta, y, bc_i), Status::InvalidPointer, "null A")?;
            expect_status(call(uplo, n_i, k_i, alpha, a, lda_i, ptr::null(), beta, y, bc_i), Status::InvalidPointer, "null x")?;
            expect_status(call(uplo, n_i, k_i, alpha, a, lda_i, x, beta, ptr::null(), bc_i), Status::InvalidPointer, "null y")?;
        }
        let (na, nx, ny) = (ptr::null(), ptr::null(), ptr::null());
        expect_status(call(uplo, zero_i, k_i, ptr::null(), na, lda_i, nx, ptr::null(), ny, bc_i), Status::Success, "n == 0")?;
        expect_status(call(uplo, n_i, k_i, ptr::null(), na, lda_i, nx, ptr::null(), ny, zero_i), Status::Success, "batch_count == 0")?;
        expect_status(call(uplo, n_i, k_i, zero, na, lda_i, nx, one, ny, bc_i), Status::Success, "alpha == 0, beta == 1")?;
    }
    Ok(None)
}

pub fn testing_hbmv_batched<I: CaseInt, T: Scalar>(arg: &Arguments) -> CaseResult {
    let (n, k, lda, incx, incy, bc) = (arg.n, arg.k, arg.lda, arg.incx, arg.incy, arg.batch_count);
    let uplo = arg.uplo()?;
    let (alpha, beta) = (arg.get_alpha::<T>(), arg.get_beta::<T>());
    let mut handle = Handle::new()?;

    let invalid = n < 0 || k < 0 || lda <= k || incx == 0 || incy == 0 || bc < 0;
    if invalid || n == 0 || bc == 0 {
        let r = unsafe {
            level2::hbmv_batched::<I, T>(
                &handle,
                uplo,
                int(n)?,
                int(k)?,
                ptr::null(),
                ptr::null(),
                int(lda)?,
                ptr::null(),
                int(incx)?,
                ptr::null(),
                ptr::null(),
                int(incy)?,
                int(bc)?,
            )
        };
        let expected = if invalid { Status::InvalidSize } else { Status::Success };
        expect_status(r, expected, "argument check")?;
        return Ok(None);
    }

    let mut rng = seeded_rng(arg.seed);
    let mut ha = HostBatchVector::<T>::matrix(lda, n, bc);
    let mut hx = HostBatchVector::<T>::new(n, incx, bc);
    let mut hy = HostBatchVector::<T>::new(n, incy, bc);
    for b in 0..bc as usize {
        // only rows 0..=k of the band storage are read
        init_matrix(&mut rng, ha.batch_mut(b), lda, n, lda);
        init_vector(&mut rng, hx.batch_mut(b), n, incx, NanInit::AlphaSetsNan, arg.alpha_is_nan(), false);
        init_vector(&mut rng, hy.batch_mut(b), n, incy, NanInit::BetaSetsNan, false, arg.beta_is_nan());
    }
    let da = DeviceBatchVector::matrix(lda, n, bc)?;
    let dx = DeviceBatchVector::new(n, incx, bc)?;
    let dy = DeviceBatchVector::new(n, incy, bc)?;
    da.transfer_from(&ha)?;
    dx.transfer_from(&hx)?;
    let scalars = Scalars::new(&[alpha, beta])?;

    let (n_i, k_i, lda_i, incx_i, incy_i, bc_i) = (
        int::<I>(n)?,
        int::<I>(k)?,
        int::<I>(lda)?,
        int::<I>(incx)?,
        int::<I>(incy)?,
        int::<I>(bc)?,
    );
    let call = |handle: &Handle, mode| unsafe {
        level2::hbmv_batched::<I, T>(
            handle,
            uplo,
            n_i,
            k_i,
            scalars.ptr(0, mode),
            da.ptr_on_device(),
            lda_i,
            dx.ptr_on_device(),
            incx_i,
            scalars.ptr(1, mode),
            dy.ptr_on_device_mut(),
            incy_i,
            bc_i,
        )
    };
    let abs_incy = incy.abs();
    let mut timing = Timing::default();

    if arg.unit_check || arg.norm_check {
        let mut gold = hy.clone();
        let start = time_us_no_sync();
        for b in 0..bc as usize {
            ref_hbmv(uplo, n, k, alpha, &ha[b], lda, &hx[b], incx, beta, &mut gold[b], incy);
        }
        timing.cpu_us = time_us_no_sync() - start;

        for mode in pointer_modes(arg) {
            handle.set_pointer_mode(mode);
            dy.transfer_from(&hy)?;
            call(&handle, mode)?;
            let mut got = HostBatchVector::<T>::new(n, incy, bc);
            got.transfer_from(&dy)?;
            if arg.unit_check {
                unit_check_general(1, n, abs_incy, &gold, &got)?;
            }
            if arg.norm_check {
                let e = norm_error(1, n, abs_incy, &gold, &got);
                record(&mut timing, mode, e.into_iter().fold(0.0, f64::max));
            }
        }
    }

    if !arg.timing {
        return Ok(None);
    }
    handle.set_pointer_mode(PointerMode::Device);
    timing.gpu_us = time_calls(&handle, arg, || call(&handle, PointerMode::Device))?;
    timing.gflop = hbmv_gflop_count::<T>(n, k) * bc as f64;
    timing.gbyte = hbmv_gbyte_count::<T>(n, k) * bc as f64;
    let model = ArgumentModel(&[
        Field::Uplo,
        Field::N,
        Field::K,
        Field::Alpha,
        Field::Lda,
        Field::Incx,
        Field::Beta,
        Field::Incy,
        Field::BatchCount,
    ]);
    Ok(Some(model.log_args(arg, true, &timing)))
}

// ============================================================================
// hpmv_strided_batched
// ============================================================================

pub fn testing_hpmv_strided_batched_bad_arg<I: CaseInt, T: Scalar>(_arg: &Arguments) -> CaseResult {
    let (n, inc, bc) = (100, 1, 2);
    let (n_i, inc_i, bc_i, zero_i) = (int::<I>(n)?, int::<I>(inc)?, int::<I>(bc)?, int::<I>(0)?);
    let (sa, sx) = (packed_len(n), n);
    for mode in BOTH_MODES {
        let mut handle = Handle::new()?;
        handle.set_pointer_mode(mode);
        let scalars = Scalars::new(&[T::one(), T::zero()])?;
        let (one, zero) = (scalars.ptr(0, mode), scalars.ptr(1, mode));
        let hap = HostStridedBatchVector::<T>::new(packed_len(n), 1, sa, bc);
        let hx = HostStridedBatchVector::<T>::new(n, inc, sx, bc);
        let dap = DeviceStridedBatchVector::like(&hap)?;
        let dx = DeviceStridedBatchVector::like(&hx)?;
        let dy = DeviceStridedBatchVector::like(&hx)?;
        let (ap, x, y) = (dap.as_ptr(), dx.as_ptr(), dy.as_mut_ptr());
        let call = |uplo, n, alpha, ap, x, beta, y: *mut T, bc| unsafe {
            level2::hpmv_strided_batched::<I, T>(
                &handle, uplo, n, alpha, ap, sa, x, inc_i, sx, beta, y, inc_i, sx, bc,
            )
        };
        let uplo = Fill::Lower;

        expect_status(call(Fill::Full, n_i, one, ap, x, one, y, bc_i), Status::InvalidValue, "uplo")?;
        expect_status(call(uplo, n_i, ptr::null(), ap, x, one, y, bc_i), Status::InvalidPointer, "null alpha")?;
        expect_status(call(uplo, n_i, one, ap, x, ptr::null(), y, bc_i), Status::InvalidPointer, "null beta")?;
        if mode == PointerMode::Host {
            expect_status(call(uplo, n_i, one, ptr::null(), x, one, y, bc_i), Status::InvalidPointer, "null AP")?;
            expect_status(call(uplo, n_i, one, ap, ptr::null(), one, y, bc_i), Status::InvalidPointer, "null x")?;
            expect_status(call(uplo, n_i, one, ap, x, one, ptr::null_mut(), bc_i), Status::InvalidPointer, "null y")?;
        }
        let (nap, nx, ny) = (ptr::null(), ptr::null(), ptr::null_mut());
        expect_status(call(uplo, zero_i, ptr::null(), nap, nx, ptr::null(), ny, bc_i), Status::Success, "n == 0")?;
        expect_status(call(uplo, n_i, ptr::null(), nap, nx, ptr::null(), ny, zero_i), Status::Success, "batch_count == 0")?;
        expect_status(call(uplo, n_i, zero, nap, nx, one, ny, bc_i), Status::Success, "alpha == 0, beta == 1")?;
    }
    Ok(None)
}

pub fn testing_hpmv_strided_batched<I: CaseInt, T: Scalar>(arg: &Arguments) -> CaseResult {
    let (n, incx, incy, bc) = (arg.n, arg.incx, arg.incy, arg.batch_count);
    let uplo = arg.uplo()?;
    let (alpha, beta) = (arg.get_alpha::<T>(), arg.get_beta::<T>());
    let mut handle = Handle::new()?;

    let invalid = n < 0 || incx == 0 || incy == 0 || bc < 0;
    if invalid || n == 0 || bc == 0 {
        let r = unsafe {
            level2::hpmv_strided_batched::<I, T>(
                &handle,
                uplo,
                int(n)?,
                ptr::null(),
                ptr::null(),
                arg.stride_a,
                ptr::null(),
                int(incx)?,
                arg.stride_x,
                ptr::null(),
                ptr::null_mut(),
                int(incy)?,
                arg.stride_y,
                int(bc)?,
            )
        };
        let expected = if invalid { Status::InvalidSize } else { Status::Success };
        expect_status(r, expected, "argument check")?;
        return Ok(None);
    }

    let ap_len = packed_len(n);
    let mut rng = seeded_rng(arg.seed);
    let mut hap = HostStridedBatchVector::<T>::new(ap_len, 1, arg.stride_a, bc);
    let mut hx = HostStridedBatchVector::<T>::new(n, incx, arg.stride_x, bc);
    let mut hy = HostStridedBatchVector::<T>::new(n, incy, arg.stride_y, bc);
    let mut full = vec![T::zero(); (n * n) as usize];
    for b in 0..bc as usize {
        init_matrix(&mut rng, &mut full, n, n, n);
        make_hermitian(&mut full, n, n);
        regular_to_packed(uplo, &full, hap.batch_mut(b), n, n);
        init_vector(&mut rng, hx.batch_mut(b), n, incx, NanInit::AlphaSetsNan, arg.alpha_is_nan(), false);
        init_vector(&mut rng, hy.batch_mut(b), n, incy, NanInit::BetaSetsNan, false, arg.beta_is_nan());
    }
    let dap = DeviceStridedBatchVector::like(&hap)?;
    let dx = DeviceStridedBatchVector::like(&hx)?;
    let dy = DeviceStridedBatchVector::like(&hy)?;
    dap.transfer_from(&hap)?;
    dx.transfer_from(&hx)?;
    let scalars = Scalars::new(&[alpha, beta])?;

    let (n_i, incx_i, incy_i, bc_i) = (int::<I>(n)?, int::<I>(incx)?, int::<I>(incy)?, int::<I>(bc)?);
    let call = |handle: &Handle, mode| unsafe {
        level2::hpmv_strided_batched::<I, T>(
            handle,
            uplo,
            n_i,
            scalars.ptr(0, mode),
            dap.as_ptr(),
            dap.stride(),
            dx.as_ptr(),
            incx_i,
            dx.stride(),
            scalars.ptr(1, mode),
            dy.as_mut_ptr(),
            incy_i,
            dy.stride(),
            bc_i,
        )
    };
    let abs_incy = incy.abs();
    let mut timing = Timing::default();

    if arg.unit_check || arg.norm_check {
        let mut gold = hy.clone();
        let start = time_us_no_sync();
        for b in 0..bc as usize {
            ref_hpmv(uplo, n, alpha, &hap[b], &hx[b], incx, beta, &mut gold[b], incy);
        }
        timing.cpu_us = time_us_no_sync() - start;

        for mode in pointer_modes(arg) {
            handle.set_pointer_mode(mode);
            dy.transfer_from(&hy)?;
            call(&handle, mode)?;
            let mut got = hy.clone();
            got.transfer_from(&dy)?;
            if arg.unit_check {
                unit_check_general(1, n, abs_incy, &gold, &got)?;
            }
            if arg.norm_check {
                let e = norm_error(1, n, abs_incy, &gold, &got);
                record(&mut timing, mode, e.into_iter().fold(0.0, f64::max));
            }
        }
    }

    if !arg.timing {
        return Ok(None);
    }
    handle.set_pointer_mode(PointerMode::Device);
    timing.gpu_us = time_calls(&handle, arg, || call(&handle, PointerMode::Device))?;
    timing.gflop = hpmv_gflop_count::<T>(n) * bc as f64;
    timing.gbyte = hpmv_gbyte_count::<T>(n) * bc as f64;
    let model = ArgumentModel(&[
        Field::Uplo,
        Field::N,
        Field::Alpha,
        Field::StrideA,
        Field::Incx,
        Field::StrideX,
        Field::Beta,
        Field::Incy,
        Field::StrideY,
        Field::BatchCount,
    ]);
    Ok(Some(model.log_args(arg, true, &timing)))
}

// ============================================================================
// tpsv_batched
// ============================================================================

pub fn testing_tpsv_batched_bad_arg<I: CaseInt, T: Scalar>(_arg: &Arguments) -> CaseResult {
    let (n, inc, bc) = (100, 1, 2);
    let (n_i, inc_i, bc_i, zero_i) = (int::<I>(n)?, int::<I>(inc)?, int::<I>(bc)?, int::<I>(0)?);
    let handle = Handle::new()?;
    let dap = DeviceBatchVector::<T>::new(packed_len(n), 1, bc)?;
    let dx = DeviceBatchVector::<T>::new(n, inc, bc)?;
    let (ap, x) = (dap.ptr_on_device(), dx.ptr_on_device_mut());
    let call = |uplo, n, ap, x, inc, bc| unsafe {
        level2::tpsv_batched::<I, T>(&handle, uplo, Operation::None, Diagonal::NonUnit, n, ap, x, inc, bc)
    };

    expect_status(call(Fill::Full, n_i, ap, x, inc_i, bc_i), Status::InvalidValue, "uplo")?;
    expect_status(call(Fill::Lower, n_i, ap, x, zero_i, bc_i), Status::InvalidSize, "incx == 0")?;
    expect_status(call(Fill::Lower, n_i, ap, x, inc_i, int(-1)?), Status::InvalidSize, "batch_count < 0")?;
    expect_status(call(Fill::Lower, n_i, ptr::null(), x, inc_i, bc_i), Status::InvalidPointer, "null AP")?;
    expect_status(call(Fill::Lower, n_i, ap, ptr::null(), inc_i, bc_i), Status::InvalidPointer, "null x")?;
    expect_status(call(Fill::Lower, zero_i, ptr::null(), ptr::null(), inc_i, bc_i), Status::Success, "n == 0")?;
    expect_status(call(Fill::Lower, n_i, ptr::null(), ptr::null(), inc_i, zero_i), Status::Success, "batch_count == 0")?;
    Ok(None)
}

pub fn testing_tpsv_batched<I: CaseInt, T: Scalar>(arg: &Arguments) -> CaseResult {
    let (n, incx, bc) = (arg.n, arg.incx, arg.batch_count);
    let (uplo, trans, diag) = (arg.uplo()?, arg.trans_a()?, arg.diag()?);
    let handle = Handle::new()?;

    let invalid = n < 0 || incx == 0 || bc < 0;
    if invalid || n == 0 || bc == 0 {
        let r = unsafe {
            level2::tpsv_batched::<I, T>(
                &handle,
                uplo,
                trans,
                diag,
                int(n)?,
                ptr::null(),
                ptr::null(),
                int(incx)?,
                int(bc)?,
            )
        };
        let expected = if invalid { Status::InvalidSize } else { Status::Success };
        expect_status(r, expected, "argument check")?;
        return Ok(None);
    }

    let ap_len = packed_len(n);
    let mut rng = seeded_rng(arg.seed);
    let mut hap = HostBatchVector::<T>::new(ap_len, 1, bc);
    let mut hx = HostBatchVector::<T>::new(n, incx, bc);
    let mut full = vec![T::zero(); (n * n) as usize];
    for b in 0..bc as usize {
        init_matrix(&mut rng, &mut full, n, n, n);
        make_triangular(uplo, &mut full, n, n);
        regular_to_packed(uplo, &full, hap.batch_mut(b), n, n);
        init_vector(&mut rng, hx.batch_mut(b), n, incx, NanInit::Never, false, false);
    }
    let dap = DeviceBatchVector::new(ap_len, 1, bc)?;
    let dx = DeviceBatchVector::new(n, incx, bc)?;
    dap.transfer_from(&hap)?;

    let (n_i, incx_i, bc_i) = (int::<I>(n)?, int::<I>(incx)?, int::<I>(bc)?);
    let call = || unsafe {
        level2::tpsv_batched::<I, T>(
            &handle,
            uplo,
            trans,
            diag,
            n_i,
            dap.ptr_on_device(),
            dx.ptr_on_device_mut(),
            incx_i,
            bc_i,
        )
    };
    let abs_incx = incx.abs();
    let tolerance = norm_tolerance::<T>(10.0 * n as f64);
    let mut timing = Timing::default();

    // no scalars: one run covers both pointer modes
    if arg.unit_check || arg.norm_check {
        let mut gold = hx.clone();
        let start = time_us_no_sync();
        for b in 0..bc as usize {
            ref_tpsv(uplo, trans, diag, n, &hap[b], &mut gold[b], incx);
        }
        timing.cpu_us = time_us_no_sync() - start;

        dx.transfer_from(&hx)?;
        call()?;
        let mut got = HostBatchVector::<T>::new(n, incx, bc);
        got.transfer_from(&dx)?;
        if arg.unit_check {
            norm_check_general(1, n, abs_incx, &gold, &got, tolerance)?;
        }
        if arg.norm_check {
            let e = norm_error(1, n, abs_incx, &gold, &got);
            timing.error_host = Some(e.into_iter().fold(0.0, f64::max));
        }
    }

    if !arg.timing {
        return Ok(None);
    }
    dx.transfer_from(&hx)?;
    timing.gpu_us = time_calls(&handle, arg, call)?;
    timing.gflop = tpsv_gflop_count::<T>(n) * bc as f64;
    timing.gbyte = tpsv_gbyte_count::<T>(n) * bc as f64;
    let model = ArgumentModel(&[
        Field::Uplo,
        Field::TransA,
        Field::Diag,
        Field::N,
        Field::Incx,
        Field::BatchCount,
    ]);
    Ok(Some(model.log_args(arg, T::IS_COMPLEX, &timing)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffers::vector_len;

    #[test]
    fn test_vector_len_matches_device_layout() {
        // gold and result buffers must agree for negative increments
        let h = HostBatchVector::<f32>::new(3, -2, 1);
        assert_eq!(h[0].len(), vector_len(3, -2));
    }
}
