//! Packed triangular solve: `op(A) x = b`, `x` overwritten with the solution.

use super::{check_uplo, for_each_batch_chunk, require};
use rocrus_core::launch::{launch, launch_batches};
use rocrus_core::numerics::{check_packed, check_vector};
use rocrus_core::types::{packed_index, vector_index};
use rocrus_core::{
    log_bench, log_profile, log_trace, ApiInt, ArgCheck, BatchDst, BatchSrc, Batched, BlasResult,
    Diagonal, Error, Fill, Handle, Operation, PointerMode, RoutineName, Scalar, Status, Stride,
    Strided, Variant,
};

fn arg_check<T, A: BatchSrc<T>, X: BatchSrc<T>>(
    uplo: Fill,
    n: i64,
    ap: &A,
    x: &X,
    incx: i64,
    batch_count: i64,
) -> Result<ArgCheck, Error> {
    check_uplo(uplo)?;
    if n < 0 || incx == 0 || batch_count < 0 {
        return Err(Error::size(format_args!(
            "n = {n}, incx = {incx}, batch_count = {batch_count}"
        )));
    }
    if n == 0 || batch_count == 0 {
        return Ok(ArgCheck::QuickReturn);
    }
    if ap.is_null() {
        return Err(Error::InvalidPointer("AP"));
    }
    if x.is_null() {
        return Err(Error::InvalidPointer("x"));
    }
    Ok(ArgCheck::Continue)
}

/// One batch per work item; substitution within a batch is sequential.
pub(crate) unsafe fn tpsv_launcher<T: Scalar, A: BatchSrc<T>, X: BatchDst<T>>(
    handle: &Handle,
    uplo: Fill,
    trans: Operation,
    diag: Diagonal,
    n: i32,
    ap: A,
    x: X,
    incx: i64,
    batch_count: i32,
) -> Result<(), Error> {
    let n = n as i64;
    // op(A) is upper triangular iff exactly one of "stored upper" and
    // "transposed" holds.
    let solve_upper = (uplo == Fill::Upper) != (trans != Operation::None);
    launch(handle, || {
        launch_batches(batch_count as i64, |b| {
            let a = require(ap.batch_ptr(b), "AP")?;
            let xb = require(x.batch_ptr(b), "x")? as *mut T;
            let op_a = |i: i64, j: i64| match trans {
                Operation::None => *a.offset(packed_index(uplo, n, i, j) as isize),
                Operation::Transpose => *a.offset(packed_index(uplo, n, j, i) as isize),
                Operation::ConjugateTranspose => {
                    (*a.offset(packed_index(uplo, n, j, i) as isize)).conj()
                }
            };
            let xi = |i: i64| xb.offset(vector_index(i, n, incx) as isize);

            let step = |i: i64, others: std::ops::Range<i64>| {
                let mut s = *xi(i);
                for j in others {
                    s -= op_a(i, j) * *xi(j);
                }
                *xi(i) = if diag == Diagonal::Unit { s } else { s / op_a(i, i) };
            };
            if solve_upper {
                for i in (0..n).rev() {
                    step(i, i + 1..n);
                }
            } else {
                for i in 0..n {
                    step(i, 0..i);
                }
            }
            Ok(())
        })
    })
}

pub(crate) unsafe fn tpsv_launcher_64<T: Scalar, A: BatchSrc<T>, X: BatchDst<T>>(
    handle: &Handle,
    uplo: Fill,
    trans: Operation,
    diag: Diagonal,
    n: i64,
    ap: A,
    x: X,
    incx: i64,
    batch_count: i64,
) -> Result<(), Error> {
    for_each_batch_chunk(n, batch_count, |n, b_base, bc| {
        tpsv_launcher(
            handle,
            uplo,
            trans,
            diag,
            n,
            ap.shifted(b_base),
            x.shifted(b_base),
            incx,
            bc,
        )
    })
}

unsafe fn tpsv_impl<I: ApiInt, T: Scalar, A: BatchSrc<T>, X: BatchDst<T>>(
    handle: &Handle,
    variant: Variant,
    uplo: Fill,
    trans: Operation,
    diag: Diagonal,
    n: i64,
    ap: A,
    ap_raw: *const u8,
    stride_a: Stride,
    x: X,
    x_raw: *const u8,
    incx: i64,
    stridex: Stride,
    batch_count: i64,
) -> BlasResult {
    if handle.is_device_memory_size_query() {
        return Ok(Status::SizeUnchanged);
    }
    let name = RoutineName::new::<I>(T::PREFIX, "tpsv", variant);

    match variant {
        Variant::StridedBatched => {
            log_trace!(
                handle, name, uplo, trans, diag, n, ap_raw, stride_a, x_raw, incx, stridex,
                batch_count
            );
            if handle.pointer_mode() == PointerMode::Host {
                log_bench!(
                    handle, "-f", name.bench_function(), "-r", T::PRECISION, "--uplo", uplo,
                    "--transposeA", trans, "--diag", diag, "-n", n, "--stride_a", stride_a,
                    "--incx", incx, "--stride_x", stridex, "--batch_count", batch_count
                );
            }
            log_profile!(
                handle, name, "uplo", uplo, "transA", trans, "diag", diag, "N", n, "stride_a",
                stride_a, "incx", incx, "stride_x", stridex, "batch_count", batch_count
            );
        }
        _ => {
            log_trace!(handle, name, uplo, trans, diag, n, ap_raw, x_raw, incx, batch_count);
            if handle.pointer_mode() == PointerMode::Host {
                log_bench!(
                    handle, "-f", name.bench_function(), "-r", T::PRECISION, "--uplo", uplo,
                    "--transposeA", trans, "--diag", diag, "-n", n, "--incx", incx,
                    "--batch_count", batch_count
                );
            }
            log_profile!(
                handle, name, "uplo", uplo, "transA", trans, "diag", diag, "N", n, "incx", incx,
                "batch_count", batch_count
            );
        }
    }

    if arg_check::<T, _, _>(uplo, n, &ap, &x, incx, batch_count)? == ArgCheck::QuickReturn {
        return Ok(Status::Success);
    }

    check_packed(handle, &name, "AP", n, ap, batch_count, true)?;
    check_vector(handle, &name, "x", n, x, incx, batch_count, true)?;

    if I::IS_64 {
        tpsv_launcher_64(handle, uplo, trans, diag, n, ap, x, incx, batch_count)?;
    } else {
        tpsv_launcher(handle, uplo, trans, diag, n as i32, ap, x, incx, batch_count as i32)?;
    }

    check_vector(handle, &name, "x", n, x, incx, batch_count, false)?;
    Ok(Status::Success)
}

/// Solves `op(A) x = b` for packed triangular `A`; `x` holds `b` on entry.
///
/// # Safety
/// `ap` must hold `n*(n+1)/2` elements and `x` must be valid for `n`
/// elements at increment `incx`.
pub unsafe fn tpsv<I: ApiInt, T: Scalar>(
    handle: &Handle,
    uplo: Fill,
    trans: Operation,
    diag: Diagonal,
    n: I,
    ap: *const T,
    x: *mut T,
    incx: I,
) -> BlasResult {
    tpsv_impl::<I, T, _, _>(
        handle,
        Variant::Single,
        uplo,
        trans,
        diag,
        n.as_i64(),
        Strided::single(ap),
        ap.cast(),
        0,
        Strided::new_mut(x, 0),
        x.cast(),
        incx.as_i64(),
        0,
        1,
    )
}

/// # Safety
/// As [`tpsv`] for every batch of the pointer arrays.
pub unsafe fn tpsv_batched<I: ApiInt, T: Scalar>(
    handle: &Handle,
    uplo: Fill,
    trans: Operation,
    diag: Diagonal,
    n: I,
    ap: *const *const T,
    x: *const *mut T,
    incx: I,
    batch_count: I,
) -> BlasResult {
    tpsv_impl::<I, T, _, _>(
        handle,
        Variant::Batched,
        uplo,
        trans,
        diag,
        n.as_i64(),
        Batched::new(ap),
        ap.cast(),
        0,
        Batched::new_mut(x),
        x.cast(),
        incx.as_i64(),
        0,
        batch_count.as_i64(),
    )
}

/// # Safety
/// As [`tpsv`] for every batch at the given strides.
pub unsafe fn tpsv_strided_batched<I: ApiInt, T: Scalar>(
    handle: &Handle,
    uplo: Fill,
    trans: Operation,
    diag: Diagonal,
    n: I,
    ap: *const T,
    stride_a: Stride,
    x: *mut T,
    incx: I,
    stridex: Stride,
    batch_count: I,
) -> BlasResult {
    tpsv_impl::<I, T, _, _>(
        handle,
        Variant::StridedBatched,
        uplo,
        trans,
        diag,
        n.as_i64(),
        Strided::new(ap, stride_a),
        ap.cast(),
        stride_a,
        Strided::new_mut(x, stridex),
        x.cast(),
        incx.as_i64(),
        stridex,
        batch_count.as_i64(),
    )
}
