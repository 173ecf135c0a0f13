use super::{expect_status, time_calls, CaseResult};
use crate::argument_model::{ArgumentModel, Field, Timing};
use crate::arguments::Arguments;
use crate::buffers::{
    BatchView, DeviceBatchVector, DeviceStridedBatchVector, HostBatchVector, HostStridedBatchVector,
};
use crate::check::{norm_check_general, norm_error, norm_tolerance};
use crate::flops::{trtri_gbyte_count, trtri_gflop_count};
use crate::init::{init_matrix, make_triangular, seeded_rng};
use crate::reference::ref_trtri;
use crate::timing::time_us_no_sync;
use anyhow::{ensure, Result};
use rocrus_blas::level3::{self, trtri_temp_size};
use rocrus_core::{Diagonal, Fill, Handle, Scalar, Status};
use std::mem::size_of;
use std::ptr;

const TRTRI_FIELDS: &[Field] = &[Field::Uplo, Field::Diag, Field::N, Field::Lda, Field::BatchCount];
const TRTRI_STRIDED_FIELDS: &[Field] = &[
    Field::Uplo,
    Field::Diag,
    Field::N,
    Field::Lda,
    Field::StrideA,
    Field::BatchCount,
];

/// The `n x n` inverses in `got` match the host reference built from `ha`.
fn check_inverses<T: Scalar>(
    arg: &Arguments,
    uplo: Fill,
    diag: Diagonal,
    ha: &impl BatchView<T>,
    got: &impl BatchView<T>,
    gold: &mut [Vec<T>],
    timing: &mut Timing,
) -> Result<()> {
    let (n, lda) = (arg.n, arg.lda);
    let start = time_us_no_sync();
    for (b, inv) in gold.iter_mut().enumerate() {
        ref_trtri(uplo, diag, n, ha.batch(b), lda, inv, lda);
    }
    timing.cpu_us = time_us_no_sync() - start;

    let gold = GoldView(gold);
    if arg.unit_check {
        norm_check_general(n, n, lda, &gold, got, norm_tolerance::<T>(10.0 * n as f64))?;
    }
    if arg.norm_check {
        let e = norm_error(n, n, lda, &gold, got);
        timing.error_host = Some(e.into_iter().fold(0.0, f64::max));
    }
    Ok(())
}

struct GoldView<'a, T>(&'a [Vec<T>]);

impl<T> BatchView<T> for GoldView<'_, T> {
    fn batch_count(&self) -> usize {
        self.0.len()
    }
    fn batch(&self, b: usize) -> &[T] {
        &self.0[b]
    }
}

fn trtri_args(arg: &Arguments) -> Result<(Fill, Diagonal, i64, i64, i64, bool)> {
    let (n, lda, bc) = (arg.n, arg.lda, arg.batch_count);
    let invalid = n < 0 || lda < n || lda < 1 || bc < 0;
    Ok((arg.uplo()?, arg.diag()?, n, lda, bc, invalid))
}

fn as_i32(v: i64) -> Result<i32> {
    i32::try_from(v).map_err(|_| anyhow::anyhow!("{v} does not fit the 32-bit API"))
}

/// Workspace a size query reports for order `n`: zero for a single
/// diagonal block, else the temp buffer plus, for pointer arrays, the
/// per-batch temp pointers.
fn expected_query_bytes<T>(n: i64, bc: i64, pointer_array: bool) -> usize {
    let temp = trtri_temp_size(n, bc) * size_of::<T>();
    if temp == 0 {
        return 0;
    }
    let round = |b: usize| (b + 63) / 64 * 64;
    let ptrs = if pointer_array {
        round(bc as usize * size_of::<*mut T>())
    } else {
        0
    };
    round(temp) + ptrs
}

// ============================================================================
// trtri_batched
// ============================================================================

pub fn testing_trtri_batched_bad_arg<T: Scalar>(_arg: &Arguments) -> CaseResult {
    let (n, lda, bc) = (100, 100, 2);
    let handle = Handle::new()?;
    let da = DeviceBatchVector::<T>::matrix(lda, n, bc)?;
    let dinv = DeviceBatchVector::<T>::matrix(lda, n, bc)?;
    let (a, inv) = (da.ptr_on_device(), dinv.ptr_on_device_mut());
    let call = |uplo, n, a, lda, inv, bc| unsafe {
        level3::trtri_batched::<T>(&handle, uplo, Diagonal::NonUnit, n, a, lda, inv, lda, bc)
    };
    let (n, lda, bc) = (n as i32, lda as i32, bc as i32);

    expect_status(call(Fill::Full, n, a, lda, inv, bc), Status::InvalidValue, "uplo")?;
    expect_status(call(Fill::Upper, -1, a, lda, inv, bc), Status::InvalidSize, "n < 0")?;
    expect_status(call(Fill::Upper, n, a, n - 1, inv, bc), Status::InvalidSize, "lda < n")?;
    expect_status(call(Fill::Upper, n, a, lda, inv, -1), Status::InvalidSize, "batch_count < 0")?;
    expect_status(call(Fill::Upper, n, ptr::null(), lda, inv, bc), Status::InvalidPointer, "null A")?;
    expect_status(call(Fill::Upper, n, a, lda, ptr::null(), bc), Status::InvalidPointer, "null invA")?;
    expect_status(call(Fill::Upper, 0, ptr::null(), lda, ptr::null(), bc), Status::Success, "n == 0")?;
    expect_status(call(Fill::Upper, n, ptr::null(), lda, ptr::null(), 0), Status::Success, "batch_count == 0")?;

    // workspace query
    handle.start_device_memory_size_query()?;
    expect_status(call(Fill::Upper, n, a, lda, inv, bc), Status::SizeIncreased, "size query")?;
    let size = handle.stop_device_memory_size_query()?;
    let expected = expected_query_bytes::<T>(100, 2, true);
    ensure!(size == expected, "size query reported {size} bytes, expected {expected}");
    Ok(None)
}

pub fn testing_trtri_batched<T: Scalar>(arg: &Arguments) -> CaseResult {
    let (uplo, diag, n, lda, bc, invalid) = trtri_args(arg)?;
    let handle = Handle::new()?;

    if invalid || n == 0 || bc == 0 {
        let r = unsafe {
            level3::trtri_batched::<T>(
                &handle,
                uplo,
                diag,
                as_i32(n)?,
                ptr::null(),
                as_i32(lda)?,
                ptr::null(),
                as_i32(lda)?,
                as_i32(bc)?,
            )
        };
        let expected = if invalid { Status::InvalidSize } else { Status::Success };
        expect_status(r, expected, "argument check")?;
        return Ok(None);
    }

    let mut rng = seeded_rng(arg.seed);
    let mut ha = HostBatchVector::<T>::matrix(lda, n, bc);
    for b in 0..bc as usize {
        init_matrix(&mut rng, ha.batch_mut(b), n, n, lda);
        make_triangular(uplo, ha.batch_mut(b), n, lda);
    }
    let da = DeviceBatchVector::matrix(lda, n, bc)?;
    let dinv = DeviceBatchVector::matrix(lda, n, bc)?;
    da.transfer_from(&ha)?;
    let zeros = HostBatchVector::<T>::matrix(lda, n, bc);
    dinv.transfer_from(&zeros)?;

    let (n_i, lda_i, bc_i) = (as_i32(n)?, as_i32(lda)?, as_i32(bc)?);
    let call = || unsafe {
        level3::trtri_batched::<T>(
            &handle,
            uplo,
            diag,
            n_i,
            da.ptr_on_device(),
            lda_i,
            dinv.ptr_on_device_mut(),
            lda_i,
            bc_i,
        )
    };
    let mut timing = Timing::default();

    if arg.unit_check || arg.norm_check {
        call()?;
        let mut got = HostBatchVector::<T>::matrix(lda, n, bc);
        got.transfer_from(&dinv)?;
        let mut gold = vec![vec![T::zero(); ha[0].len()]; bc as usize];
        check_inverses(arg, uplo, diag, &ha, &got, &mut gold, &mut timing)?;
    }

    if !arg.timing {
        return Ok(None);
    }
    timing.gpu_us = time_calls(&handle, arg, call)?;
    timing.gflop = trtri_gflop_count::<T>(n) * bc as f64;
    timing.gbyte = trtri_gbyte_count::<T>(n) * bc as f64;
    Ok(Some(ArgumentModel(TRTRI_FIELDS).log_args(arg, T::IS_COMPLEX, &timing)))
}

// ============================================================================
// trtri_strided_batched
// ============================================================================

pub fn testing_trtri_strided_batched_bad_arg<T: Scalar>(_arg: &Arguments) -> CaseResult {
    let (n, lda, bc) = (100i64, 100i64, 2i64);
    let handle = Handle::new()?;
    let ha = HostStridedBatchVector::<T>::matrix(lda, n, 0, bc);
    let da = DeviceStridedBatchVector::like(&ha)?;
    let dinv = DeviceStridedBatchVector::like(&ha)?;
    let stride = da.stride();
    let call = |uplo, n, a, lda, inv, bc| unsafe {
        level3::trtri_strided_batched::<T>(
            &handle,
            uplo,
            Diagonal::Unit,
            n,
            a,
            lda,
            stride,
            inv,
            lda,
            stride,
            bc,
        )
    };
    let (a, inv) = (da.as_ptr(), dinv.as_mut_ptr());
    let (n, lda, bc) = (n as i32, lda as i32, bc as i32);

    expect_status(call(Fill::Full, n, a, lda, inv, bc), Status::InvalidValue, "uplo")?;
    expect_status(call(Fill::Lower, n, a, n - 1, inv, bc), Status::InvalidSize, "lda < n")?;
    expect_status(call(Fill::Lower, n, ptr::null(), lda, inv, bc), Status::InvalidPointer, "null A")?;
    expect_status(call(Fill::Lower, n, a, lda, ptr::null_mut(), bc), Status::InvalidPointer, "null invA")?;
    expect_status(call(Fill::Lower, 0, ptr::null(), lda, ptr::null_mut(), bc), Status::Success, "n == 0")?;

    handle.start_device_memory_size_query()?;
    expect_status(call(Fill::Lower, n, a, lda, inv, bc), Status::SizeIncreased, "size query")?;
    let size = handle.stop_device_memory_size_query()?;
    let expected = expected_query_bytes::<T>(100, 2, false);
    ensure!(size == expected, "size query reported {size} bytes, expected {expected}");
    Ok(None)
}

pub fn testing_trtri_strided_batched<T: Scalar>(arg: &Arguments) -> CaseResult {
    let (uplo, diag, n, lda, bc, invalid) = trtri_args(arg)?;
    let handle = Handle::new()?;

    if invalid || n == 0 || bc == 0 {
        let r = unsafe {
            level3::trtri_strided_batched::<T>(
                &handle,
                uplo,
                diag,
                as_i32(n)?,
                ptr::null(),
                as_i32(lda)?,
                arg.stride_a,
                ptr::null_mut(),
                as_i32(lda)?,
                arg.stride_a,
                as_i32(bc)?,
            )
        };
        let expected = if invalid { Status::InvalidSize } else { Status::Success };
        expect_status(r, expected, "argument check")?;
        return Ok(None);
    }

    let mut rng = seeded_rng(arg.seed);
    let mut ha = HostStridedBatchVector::<T>::matrix(lda, n, arg.stride_a, bc);
    for b in 0..bc as usize {
        init_matrix(&mut rng, ha.batch_mut(b), n, n, lda);
        make_triangular(uplo, ha.batch_mut(b), n, lda);
    }
    let da = DeviceStridedBatchVector::like(&ha)?;
    let dinv = DeviceStridedBatchVector::like(&ha)?;
    da.transfer_from(&ha)?;
    let zeros = HostStridedBatchVector::<T>::matrix(lda, n, arg.stride_a, bc);
    dinv.transfer_from(&zeros)?;

    let (n_i, lda_i, bc_i) = (as_i32(n)?, as_i32(lda)?, as_i32(bc)?);
    let call = || unsafe {
        level3::trtri_strided_batched::<T>(
            &handle,
            uplo,
            diag,
            n_i,
            da.as_ptr(),
            lda_i,
            da.stride(),
            dinv.as_mut_ptr(),
            lda_i,
            dinv.stride(),
            bc_i,
        )
    };
    let mut timing = Timing::default();

    if arg.unit_check || arg.norm_check {
        call()?;
        let mut got = zeros.clone();
        got.transfer_from(&dinv)?;
        let mut gold = vec![vec![T::zero(); ha[0].len()]; bc as usize];
        check_inverses(arg, uplo, diag, &ha, &got, &mut gold, &mut timing)?;
    }

    if !arg.timing {
        return Ok(None);
    }
    timing.gpu_us = time_calls(&handle, arg, call)?;
    timing.gflop = trtri_gflop_count::<T>(n) * bc as f64;
    timing.gbyte = trtri_gbyte_count::<T>(n) * bc as f64;
    Ok(Some(ArgumentModel(TRTRI_STRIDED_FIELDS).log_args(arg, T::IS_COMPLEX, &timing)))
}
