use super::{expect_status, int, pointer_modes, time_calls, CaseInt, CaseResult};
use crate::argument_model::{ArgumentModel, Field, Timing};
use crate::arguments::Arguments;
use crate::buffers::{DeviceVector, HostVector};
use crate::check::{near_check_general, norm_error, unit_check_general};
use crate::flops::{dot_gbyte_count, dot_gflop_count, nrm2_gbyte_count, nrm2_gflop_count};
use crate::init::{init_vector, seeded_rng, NanInit};
use crate::reference::{ref_dot, ref_dotc, ref_nrm2};
use crate::timing::time_us_no_sync;
use anyhow::ensure;
use rocrus_blas::level1;
use rocrus_core::{Accumulate, BlasResult, Handle, PointerMode, RealScalar, Scalar, Status};
use std::ptr;

// ============================================================================
// nrm2
// ============================================================================

pub fn testing_nrm2_bad_arg<I: CaseInt, T: Scalar>(_arg: &Arguments) -> CaseResult {
    let (n, incx) = (int::<I>(100)?, int::<I>(1)?);
    let mut handle = Handle::new()?;
    handle.set_pointer_mode(PointerMode::Device);
    let dx = DeviceVector::<T>::new(100)?;
    let dres = DeviceVector::<T::Real>::new(1)?;
    unsafe {
        expect_status(
            level1::nrm2::<I, T>(&handle, n, ptr::null(), incx, dres.as_mut_ptr()),
            Status::InvalidPointer,
            "null x",
        )?;
        expect_status(
            level1::nrm2::<I, T>(&handle, n, dx.as_ptr(), incx, ptr::null_mut()),
            Status::InvalidPointer,
            "null result",
        )?;
    }
    Ok(None)
}

pub fn testing_nrm2<I: CaseInt, T: Scalar>(arg: &Arguments) -> CaseResult {
    let (n, incx) = (arg.n, arg.incx);
    let mut handle = Handle::new()?;

    if n <= 0 || incx <= 0 {
        handle.set_pointer_mode(PointerMode::Host);
        let mut res = <T::Real as Scalar>::one();
        unsafe { level1::nrm2::<I, T>(&handle, int(n)?, ptr::null(), int(incx)?, &mut res)? };
        ensure!(res.is_zero(), "nrm2 of an empty vector must be 0, got {res:?}");
        return Ok(None);
    }

    let mut rng = seeded_rng(arg.seed);
    let mut hx = HostVector::<T>::new(n, incx);
    init_vector(&mut rng, &mut hx, n, incx, NanInit::Never, false, false);
    let dx = DeviceVector::new(hx.len())?;
    dx.transfer_from(&hx)?;
    let dres = DeviceVector::<T::Real>::new(1)?;

    let (n_i, incx_i) = (int::<I>(n)?, int::<I>(incx)?);
    let mut timing = Timing::default();

    if arg.unit_check || arg.norm_check {
        let start = time_us_no_sync();
        let cpu = ref_nrm2(n, &hx, incx);
        timing.cpu_us = time_us_no_sync() - start;

        // the sum of squares carries full precision, its root about half
        let digits = <T::Real as RealScalar>::DIGITS10 as f64;
        let abs_error = 2.0 * 10f64.powf(-digits / 2.0) * cpu;
        let expected = HostVector::from_vec(vec![<T::Real as Scalar>::from_f64(cpu)]);

        for mode in pointer_modes(arg) {
            handle.set_pointer_mode(mode);
            let mut got = HostVector::<T::Real>::new(1, 1);
            unsafe {
                match mode {
                    PointerMode::Host => {
                        level1::nrm2::<I, T>(&handle, n_i, dx.as_ptr(), incx_i, got.as_mut_ptr())?;
                    }
                    PointerMode::Device => {
                        level1::nrm2::<I, T>(&handle, n_i, dx.as_ptr(), incx_i, dres.as_mut_ptr())?;
                        got.transfer_from(&dres)?;
                    }
                }
            }
            if arg.unit_check {
                near_check_general(1, 1, 1, &expected, &got, abs_error)?;
            }
            if arg.norm_check {
                let e = ((cpu - got[0].to_f64()) / cpu).abs();
                match mode {
                    PointerMode::Host => timing.error_host = Some(e),
                    PointerMode::Device => timing.error_device = Some(e),
                }
            }
        }
    }

    if !arg.timing {
        return Ok(None);
    }
    handle.set_pointer_mode(PointerMode::Device);
    timing.gpu_us = time_calls(&handle, arg, || unsafe {
        level1::nrm2::<I, T>(&handle, n_i, dx.as_ptr(), incx_i, dres.as_mut_ptr())
    })?;
    timing.gflop = nrm2_gflop_count::<T>(n);
    timing.gbyte = nrm2_gbyte_count::<T>(n);
    Ok(Some(ArgumentModel(&[Field::N, Field::Incx]).log_args(arg, T::IS_COMPLEX, &timing)))
}

// ============================================================================
// dot / dotc
// ============================================================================

type DotFn<I, T> = unsafe fn(&Handle, I, *const T, I, *const T, I, *mut T) -> BlasResult;

fn dot_fn<I: CaseInt, T: Accumulate>(conj: bool) -> DotFn<I, T> {
    if conj {
        level1::dotc::<I, T>
    } else {
        level1::dot::<I, T>
    }
}

fn dot_bad_arg<I: CaseInt, T: Accumulate>(conj: bool) -> CaseResult {
    let f = dot_fn::<I, T>(conj);
    let (n, inc) = (int::<I>(100)?, int::<I>(1)?);
    let mut handle = Handle::new()?;
    handle.set_pointer_mode(PointerMode::Device);
    let dx = DeviceVector::<T>::new(100)?;
    let dy = DeviceVector::<T>::new(100)?;
    let dres = DeviceVector::<T>::new(1)?;
    unsafe {
        expect_status(
            f(&handle, n, ptr::null(), inc, dy.as_ptr(), inc, dres.as_mut_ptr()),
            Status::InvalidPointer,
            "null x",
        )?;
        expect_status(
            f(&handle, n, dx.as_ptr(), inc, ptr::null(), inc, dres.as_mut_ptr()),
            Status::InvalidPointer,
            "null y",
        )?;
        expect_status(
            f(&handle, n, dx.as_ptr(), inc, dy.as_ptr(), inc, ptr::null_mut()),
            Status::InvalidPointer,
            "null result",
        )?;
    }
    Ok(None)
}

fn dot_template<I: CaseInt, T: Accumulate>(arg: &Arguments, conj: bool) -> CaseResult {
    let f = dot_fn::<I, T>(conj);
    let (n, incx, incy) = (arg.n, arg.incx, arg.incy);
    let mut handle = Handle::new()?;

    if n <= 0 {
        handle.set_pointer_mode(PointerMode::Host);
        let mut res = T::one();
        unsafe { f(&handle, int(n)?, ptr::null(), int(incx)?, ptr::null(), int(incy)?, &mut res)? };
        ensure!(res.is_zero(), "dot of empty vectors must be 0, got {res:?}");
        return Ok(None);
    }

    let mut rng = seeded_rng(arg.seed);
    let mut hx = HostVector::<T>::new(n, incx);
    let mut hy = HostVector::<T>::new(n, incy);
    init_vector(&mut rng, &mut hx, n, incx, NanInit::Never, false, false);
    init_vector(&mut rng, &mut hy, n, incy, NanInit::Never, false, false);
    let dx = DeviceVector::new(hx.len())?;
    let dy = DeviceVector::new(hy.len())?;
    dx.transfer_from(&hx)?;
    dy.transfer_from(&hy)?;
    let dres = DeviceVector::<T>::new(1)?;

    let (n_i, incx_i, incy_i) = (int::<I>(n)?, int::<I>(incx)?, int::<I>(incy)?);
    let mut timing = Timing::default();

    if arg.unit_check || arg.norm_check {
        let start = time_us_no_sync();
        let cpu = if conj {
            ref_dotc(n, &hx, incx, &hy, incy)
        } else {
            ref_dot(n, &hx, incx, &hy, incy)
        };
        timing.cpu_us = time_us_no_sync() - start;
        let expected = HostVector::from_vec(vec![cpu]);
        // half types round the wide accumulator once at the end
        let half = matches!(T::PRECISION, "f16_r" | "bf16_r");
        let tol = n as f64 * <T::Real as RealScalar>::epsilon() * cpu.abs().to_f64().max(1.0);

        for mode in pointer_modes(arg) {
            handle.set_pointer_mode(mode);
            let mut got = HostVector::<T>::new(1, 1);
            unsafe {
                match mode {
                    PointerMode::Host => {
                        f(&handle, n_i, dx.as_ptr(), incx_i, dy.as_ptr(), incy_i, got.as_mut_ptr())?;
                    }
                    PointerMode::Device => {
                        f(&handle, n_i, dx.as_ptr(), incx_i, dy.as_ptr(), incy_i, dres.as_mut_ptr())?;
                        got.transfer_from(&dres)?;
                    }
                }
            }
            if arg.unit_check {
                if half {
                    near_check_general(1, 1, 1, &expected, &got, tol)?;
                } else {
                    unit_check_general(1, 1, 1, &expected, &got)?;
                }
            }
            if arg.norm_check {
                let e = norm_error(1, 1, 1, &expected, &got)[0];
                match mode {
                    PointerMode::Host => timing.error_host = Some(e),
                    PointerMode::Device => timing.error_device = Some(e),
                }
            }
        }
    }

    if !arg.timing {
        return Ok(None);
    }
    handle.set_pointer_mode(PointerMode::Device);
    timing.gpu_us = time_calls(&handle, arg, || unsafe {
        f(&handle, n_i, dx.as_ptr(), incx_i, dy.as_ptr(), incy_i, dres.as_mut_ptr())
    })?;
    timing.gflop = dot_gflop_count::<T>(conj, n);
    timing.gbyte = dot_gbyte_count::<T>(n);
    Ok(Some(
        ArgumentModel(&[Field::N, Field::Incx, Field::Incy]).log_args(arg, T::IS_COMPLEX, &timing),
    ))
}

pub fn testing_dot_bad_arg<I: CaseInt, T: Accumulate>(_arg: &Arguments) -> CaseResult {
    dot_bad_arg::<I, T>(false)
}

pub fn testing_dotc_bad_arg<I: CaseInt, T: Accumulate>(_arg: &Arguments) -> CaseResult {
    dot_bad_arg::<I, T>(true)
}

pub fn testing_dot<I: CaseInt, T: Accumulate>(arg: &Arguments) -> CaseResult {
    dot_template::<I, T>(arg, false)
}

pub fn testing_dotc<I: CaseInt, T: Accumulate>(arg: &Arguments) -> CaseResult {
    dot_template::<I, T>(arg, true)
}

