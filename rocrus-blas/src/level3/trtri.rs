//! Triangular matrix inverse: `invA = inv(A)`.
//!
//! Orders up to [`NB`] use a column-wise substitution kernel. Larger orders
//! split `A` into `[[A11, A12], [0, A22]]` (upper) or `[[A11, 0], [A21, A22]]`
//! (lower), invert the diagonal blocks recursively, then form the
//! off-diagonal block with two triangular multiplies through a temp buffer:
//!
//! - upper: `C = A12 * inv(A22)`, `invA12 = -inv(A11) * C`
//! - lower: `C = A21 * inv(A11)`, `invA21 = -inv(A22) * C`
//!
//! The triangle of `invA` opposite to `uplo` is written with zeros.

use rocrus_core::launch::{launch, launch_batches, parallel_for_chunks};
use rocrus_core::types::col_major;
use rocrus_core::{
    log_profile, log_trace, ArgCheck, BatchDst, BatchSrc, Batched, BlasResult, Diagonal, Error,
    Fill, Handle, RoutineName, Scalar, Status, Stride, Strided, Variant,
};

/// Diagonal block order handled by the substitution kernel.
pub const NB: i64 = 16;

/// Order of the leading diagonal block when splitting an order `n > NB`:
/// half of `n`, rounded up to a multiple of `NB`.
#[inline]
pub fn split(n: i64) -> i64 {
    ((n + 1) / 2 + NB - 1) / NB * NB
}

fn temp_elems(n: i64) -> i64 {
    if n <= NB {
        return 0;
    }
    let n1 = split(n);
    (n1 * (n - n1)).max(temp_elems(n1)).max(temp_elems(n - n1))
}

/// Temp elements needed to invert `batch_count` matrices of order `n`.
pub fn trtri_temp_size(n: i64, batch_count: i64) -> usize {
    if n <= NB || batch_count <= 0 {
        return 0;
    }
    (temp_elems(n) * batch_count) as usize
}

// ============================================================================
// Kernels
// ============================================================================

/// Column-major view of one batch's matrix.
///
/// Safety: a bundle of addresses; the kernels give each thread disjoint
/// columns to write.
struct Mat<T> {
    ptr: *mut T,
    ld: i64,
}

impl<T> Clone for Mat<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T> Copy for Mat<T> {}
unsafe impl<T> Send for Mat<T> {}
unsafe impl<T> Sync for Mat<T> {}

impl<T: Copy> Mat<T> {
    #[inline(always)]
    unsafe fn at(self, i: i64, j: i64) -> *mut T {
        self.ptr.offset(col_major(i, j, self.ld) as isize)
    }

    #[inline(always)]
    unsafe fn get(self, i: i64, j: i64) -> T {
        *self.at(i, j)
    }

    #[inline(always)]
    unsafe fn set(self, i: i64, j: i64, v: T) {
        *self.at(i, j) = v;
    }

    fn sub(self, i: i64, j: i64) -> Self {
        Mat {
            ptr: self.ptr.wrapping_offset(col_major(i, j, self.ld) as isize),
            ld: self.ld,
        }
    }
}

/// Substitution kernel for one diagonal block of order `n <= NB`.
unsafe fn trtri_small<T: Scalar>(uplo: Fill, diag: Diagonal, n: i64, a: Mat<T>, inv: Mat<T>) {
    let unit = diag == Diagonal::Unit;
    let d = |i: i64| if unit { T::one() } else { a.get(i, i) };
    for j in 0..n {
        inv.set(j, j, T::one() / d(j));
        if uplo == Fill::Lower {
            for i in 0..j {
                inv.set(i, j, T::zero());
            }
            for i in j + 1..n {
                let mut s = T::zero();
                for k in j..i {
                    s += a.get(i, k) * inv.get(k, j);
                }
                inv.set(i, j, -s / d(i));
            }
        } else {
            for i in j + 1..n {
                inv.set(i, j, T::zero());
            }
            for i in (0..j).rev() {
                let mut s = T::zero();
                for k in i + 1..=j {
                    s += a.get(i, k) * inv.get(k, j);
                }
                inv.set(i, j, -s / d(i));
            }
        }
        if unit {
            inv.set(j, j, T::one());
        }
    }
}

/// Fills the `m x n` block `c` with `elem(i, j)`, columns in parallel.
unsafe fn product_columns<T: Scalar, F>(n: i64, m: i64, c: Mat<T>, elem: F)
where
    F: Fn(i64, i64) -> T + Sync + Send,
{
    parallel_for_chunks(0, n, m * m, |j0, j1| {
        for j in j0..j1 {
            for i in 0..m {
                c.set(i, j, elem(i, j));
            }
        }
    });
}

/// Recursive blocked inverse of order `n > NB`.
unsafe fn trtri_large<T: Scalar>(
    uplo: Fill,
    diag: Diagonal,
    n: i64,
    a: Mat<T>,
    inv: Mat<T>,
    temp: *mut T,
) {
    if n <= NB {
        trtri_small(uplo, diag, n, a, inv);
        return;
    }
    let n1 = split(n);
    let n2 = n - n1;
    trtri_large(uplo, diag, n1, a, inv, temp);
    trtri_large(uplo, diag, n2, a.sub(n1, n1), inv.sub(n1, n1), temp);

    let (inv11, inv22) = (inv, inv.sub(n1, n1));
    if uplo == Fill::Lower {
        let a21 = a.sub(n1, 0);
        let c = Mat { ptr: temp, ld: n2 };
        product_columns(n1, n2, c, |i, j| {
            let mut s = T::zero();
            for k in j..n1 {
                s += a21.get(i, k) * inv11.get(k, j);
            }
            s
        });
        let inv21 = inv.sub(n1, 0);
        product_columns(n1, n2, inv21, |i, j| {
            let mut s = T::zero();
            for k in 0..=i {
                s += inv22.get(i, k) * c.get(k, j);
            }
            -s
        });
        product_columns(n2, n1, inv.sub(0, n1), |_, _| T::zero());
    } else {
        let a12 = a.sub(0, n1);
        let c = Mat { ptr: temp, ld: n1 };
        product_columns(n2, n1, c, |i, j| {
            let mut s = T::zero();
            for k in 0..=j {
                s += a12.get(i, k) * inv22.get(k, j);
            }
            s
        });
        let inv12 = inv.sub(0, n1);
        product_columns(n2, n1, inv12, |i, j| {
            let mut s = T::zero();
            for k in i..n1 {
                s += inv11.get(i, k) * c.get(k, j);
            }
            -s
        });
        product_columns(n1, n2, inv.sub(n1, 0), |_, _| T::zero());
    }
}

/// Runs the substitution kernel on every batch.
pub(crate) unsafe fn trtri_small_launcher<T: Scalar, A: BatchSrc<T>, V: BatchDst<T>>(
    handle: &Handle,
    uplo: Fill,
    diag: Diagonal,
    n: i32,
    a: A,
    lda: i64,
    inv_a: V,
    ld_inv_a: i64,
    batch_count: i32,
) -> Result<(), Error> {
    launch(handle, || {
        launch_batches(batch_count as i64, |b| {
            let ab = Mat { ptr: a.batch_ptr(b) as *mut T, ld: lda };
            let vb = Mat { ptr: inv_a.batch_ptr_mut(b), ld: ld_inv_a };
            if ab.ptr.is_null() || vb.ptr.is_null() {
                return Err(Error::InvalidPointer(if ab.ptr.is_null() { "A" } else { "invA" }));
            }
            trtri_small(uplo, diag, n as i64, ab, vb);
            Ok(())
        })
    })
}

/// Runs the recursive kernel on every batch; `temp` holds one
/// [`trtri_temp_size`] slice per batch.
pub(crate) unsafe fn trtri_large_launcher<T: Scalar, A: BatchSrc<T>, V: BatchDst<T>, W: BatchDst<T>>(
    handle: &Handle,
    uplo: Fill,
    diag: Diagonal,
    n: i32,
    a: A,
    lda: i64,
    inv_a: V,
    ld_inv_a: i64,
    batch_count: i32,
    temp: W,
) -> Result<(), Error> {
    launch(handle, || {
        launch_batches(batch_count as i64, |b| {
            let ab = Mat { ptr: a.batch_ptr(b) as *mut T, ld: lda };
            let vb = Mat { ptr: inv_a.batch_ptr_mut(b), ld: ld_inv_a };
            if ab.ptr.is_null() || vb.ptr.is_null() {
                return Err(Error::InvalidPointer(if ab.ptr.is_null() { "A" } else { "invA" }));
            }
            trtri_large(uplo, diag, n as i64, ab, vb, temp.batch_ptr_mut(b));
            Ok(())
        })
    })
}

// ============================================================================
// API
// ============================================================================

fn arg_check<T, A: BatchSrc<T>, V: BatchSrc<T>>(
    uplo: Fill,
    n: i64,
    a: &A,
    lda: i64,
    inv_a: &V,
    ld_inv_a: i64,
    batch_count: i64,
) -> Result<ArgCheck, Error> {
    if !uplo.is_triangle() {
        return Err(Error::InvalidValue("uplo"));
    }
    if n < 0 || lda < n || lda < 1 || ld_inv_a < n || ld_inv_a < 1 || batch_count < 0 {
        return Err(Error::size(format_args!(
            "n = {n}, lda = {lda}, ldinvA = {ld_inv_a}, batch_count = {batch_count}"
        )));
    }
    if n == 0 || batch_count == 0 {
        return Ok(ArgCheck::QuickReturn);
    }
    if a.is_null() {
        return Err(Error::InvalidPointer("A"));
    }
    if inv_a.is_null() {
        return Err(Error::InvalidPointer("invA"));
    }
    Ok(ArgCheck::Continue)
}

/// Inverts a triangular matrix.
///
/// # Safety
/// `a` must hold an `n x n` matrix with leading dimension `lda` and
/// `inv_a` a writable, non-overlapping one with leading dimension
/// `ld_inv_a`.
pub unsafe fn trtri<T: Scalar>(
    handle: &Handle,
    uplo: Fill,
    diag: Diagonal,
    n: i32,
    a: *const T,
    lda: i32,
    inv_a: *mut T,
    ld_inv_a: i32,
) -> BlasResult {
    trtri_strided_impl(
        handle,
        Variant::Single,
        uplo,
        diag,
        n,
        a,
        lda,
        0,
        inv_a,
        ld_inv_a,
        0,
        1,
    )
}

/// Inverts `batch_count` triangular matrices `stride_a` / `stride_inv_a`
/// elements apart.
///
/// # Safety
/// As [`trtri`] for every batch.
pub unsafe fn trtri_strided_batched<T: Scalar>(
    handle: &Handle,
    uplo: Fill,
    diag: Diagonal,
    n: i32,
    a: *const T,
    lda: i32,
    stride_a: Stride,
    inv_a: *mut T,
    ld_inv_a: i32,
    stride_inv_a: Stride,
    batch_count: i32,
) -> BlasResult {
    trtri_strided_impl(
        handle,
        Variant::StridedBatched,
        uplo,
        diag,
        n,
        a,
        lda,
        stride_a,
        inv_a,
        ld_inv_a,
        stride_inv_a,
        batch_count,
    )
}

unsafe fn trtri_strided_impl<T: Scalar>(
    handle: &Handle,
    variant: Variant,
    uplo: Fill,
    diag: Diagonal,
    n: i32,
    a: *const T,
    lda: i32,
    stride_a: Stride,
    inv_a: *mut T,
    ld_inv_a: i32,
    stride_inv_a: Stride,
    batch_count: i32,
) -> BlasResult {
    let (n64, bc) = (n as i64, batch_count as i64);
    let size = trtri_temp_size(n64, bc) * std::mem::size_of::<T>();
    if handle.is_device_memory_size_query() {
        if n64 <= NB || bc == 0 {
            return Ok(Status::SizeUnchanged);
        }
        return handle.set_optimal_device_memory_size(&[size]);
    }

    let name = RoutineName::new::<i32>(T::PREFIX, "trtri", variant);
    if variant == Variant::Single {
        log_trace!(handle, name, uplo, diag, n, a, lda, inv_a, ld_inv_a);
        log_profile!(handle, name, "uplo", uplo, "diag", diag, "N", n, "lda", lda, "ldinvA", ld_inv_a);
    } else {
        log_trace!(
            handle, name, uplo, diag, n, a, lda, stride_a, inv_a, ld_inv_a, stride_inv_a,
            batch_count
        );
        log_profile!(
            handle, name, "uplo", uplo, "diag", diag, "N", n, "lda", lda, "bsa", stride_a,
            "ldinvA", ld_inv_a, "bsinvA", stride_inv_a, "batch_count", batch_count
        );
    }

    let (a, inv) = (Strided::new(a, stride_a), Strided::new_mut(inv_a, stride_inv_a));
    let (lda, ldv) = (lda as i64, ld_inv_a as i64);
    if arg_check::<T, _, _>(uplo, n64, &a, lda, &inv, ldv, bc)? == ArgCheck::QuickReturn {
        return Ok(Status::Success);
    }

    if n64 <= NB {
        trtri_small_launcher(handle, uplo, diag, n, a, lda, inv, ldv, batch_count)?;
    } else {
        let w = handle.device_malloc(&[size])?;
        let temp = Strided::new_mut(w.ptr::<T>(0), temp_elems(n64));
        trtri_large_launcher(handle, uplo, diag, n, a, lda, inv, ldv, batch_count, temp)?;
    }
    Ok(Status::Success)
}

/// Inverts triangular matrices given as arrays of per-batch pointers.
///
/// The workspace has a second segment holding the per-batch temp pointers.
///
/// # Safety
/// As [`trtri`] for every batch.
pub unsafe fn trtri_batched<T: Scalar>(
    handle: &Handle,
    uplo: Fill,
    diag: Diagonal,
    n: i32,
    a: *const *const T,
    lda: i32,
    inv_a: *const *mut T,
    ld_inv_a: i32,
    batch_count: i32,
) -> BlasResult {
    let (n64, bc) = (n as i64, batch_count as i64);
    let els = trtri_temp_size(n64, 1);
    let size = els * bc.max(0) as usize * std::mem::size_of::<T>();
    let sizep = bc.max(0) as usize * std::mem::size_of::<*mut T>();
    if handle.is_device_memory_size_query() {
        if n64 <= NB || bc == 0 {
            return Ok(Status::SizeUnchanged);
        }
        return handle.set_optimal_device_memory_size(&[size, sizep]);
    }

    let name = RoutineName::new::<i32>(T::PREFIX, "trtri", Variant::Batched);
    log_trace!(handle, name, uplo, diag, n, a, lda, inv_a, ld_inv_a, batch_count);
    log_profile!(
        handle, name, "uplo", uplo, "diag", diag, "N", n, "lda", lda, "ldinvA", ld_inv_a,
        "batch_count", batch_count
    );

    let (a, inv) = (Batched::new(a), Batched::new_mut(inv_a));
    let (lda, ldv) = (lda as i64, ld_inv_a as i64);
    if arg_check::<T, _, _>(uplo, n64, &a, lda, &inv, ldv, bc)? == ArgCheck::QuickReturn {
        return Ok(Status::Success);
    }

    if n64 <= NB {
        trtri_small_launcher(handle, uplo, diag, n, a, lda, inv, ldv, batch_count)?;
    } else {
        let w = handle.device_malloc(&[size, sizep])?;
        let (base, array) = (w.ptr::<T>(0), w.ptr::<*mut T>(1));
        for b in 0..bc as usize {
            *array.add(b) = base.add(b * els);
        }
        let temp = Batched::new_mut(array.cast_const());
        trtri_large_launcher(handle, uplo, diag, n, a, lda, inv, ldv, batch_count, temp)?;
    }
    Ok(Status::Success)
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex64;
    use rocrus_core::RuntimeConfig;

    fn handle() -> Handle {
        Handle::with_config(&RuntimeConfig::default()).unwrap()
    }

    /// Well-conditioned triangular test matrix: diagonal 2, 1 elsewhere in
    /// the `uplo` triangle, NaN in the other one.
    fn matrix(uplo: Fill, n: usize, ld: usize) -> Vec<f64> {
        let mut a = vec![f64::NAN; ld * n];
        for j in 0..n {
            for i in 0..n {
                let inside = if uplo == Fill::Lower { i >= j } else { i <= j };
                if inside {
                    a[i + j * ld] = if i == j { 2.0 } else { 1.0 / (1 + i + j) as f64 };
                }
            }
        }
        a
    }

    /// `max |A * invA - I|` over the full matrix, with A's unreferenced
    /// triangle read as zero.
    fn residual(uplo: Fill, diag: Diagonal, n: usize, a: &[f64], lda: usize, inv: &[f64], ldv: usize) -> f64 {
        let at = |i: usize, j: usize| {
            let inside = if uplo == Fill::Lower { i >= j } else { i <= j };
            match (inside, i == j, diag) {
                (true, true, Diagonal::Unit) => 1.0,
                (true, _, _) => a[i + j * lda],
                (false, _, _) => 0.0,
            }
        };
        let mut worst = 0.0f64;
        for i in 0..n {
            for j in 0..n {
                let s: f64 = (0..n).map(|k| at(i, k) * inv[k + j * ldv]).sum();
                let want = if i == j { 1.0 } else { 0.0 };
                worst = worst.max((s - want).abs());
            }
        }
        worst
    }

    #[test]
    fn test_split_and_temp_size() {
        assert_eq!(split(17), 16);
        assert_eq!(split(32), 16);
        assert_eq!(split(33), 32);
        assert_eq!(split(100), 64);
        assert_eq!(trtri_temp_size(16, 4), 0);
        assert_eq!(trtri_temp_size(17, 1), 16);
        // the order-32 sub-block needs more than the top split of 33
        assert_eq!(trtri_temp_size(33, 2), 2 * 256);
    }

    #[test]
    fn test_small_and_large_orders() {
        let h = handle();
        for uplo in [Fill::Upper, Fill::Lower] {
            for diag in [Diagonal::NonUnit, Diagonal::Unit] {
                for n in [1usize, 5, 16, 17, 40, 70] {
                    let lda = n + 3;
                    let a = matrix(uplo, n, lda);
                    let mut inv = vec![f64::NAN; n * n];
                    unsafe {
                        trtri::<f64>(&h, uplo, diag, n as i32, a.as_ptr(), lda as i32, inv.as_mut_ptr(), n as i32)
                    }
                    .unwrap();
                    let r = residual(uplo, diag, n, &a, lda, &inv, n);
                    assert!(r < 1e-12, "{uplo:?} {diag:?} n={n}: residual {r}");
                    for j in 0..n {
                        for i in 0..n {
                            let outside = if uplo == Fill::Lower { i < j } else { i > j };
                            if outside {
                                assert_eq!(inv[i + j * n], 0.0);
                            }
                            if i == j && diag == Diagonal::Unit {
                                assert_eq!(inv[i + j * n], 1.0);
                            }
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn test_batched_and_strided_agree() {
        let h = handle();
        let n = 20usize;
        let a0 = matrix(Fill::Upper, n, n);
        let a1: Vec<f64> = a0.iter().map(|v| v * 0.5).collect();
        let mut strided_a = a0.clone();
        strided_a.extend(&a1);
        let mut strided_inv = vec![0.0; 2 * n * n];
        unsafe {
            trtri_strided_batched::<f64>(
                &h, Fill::Upper, Diagonal::NonUnit, n as i32, strided_a.as_ptr(), n as i32,
                (n * n) as i64, strided_inv.as_mut_ptr(), n as i32, (n * n) as i64, 2,
            )
        }
        .unwrap();

        let mut inv0 = vec![0.0; n * n];
        let mut inv1 = vec![0.0; n * n];
        let a_ptrs = [a0.as_ptr(), a1.as_ptr()];
        let inv_ptrs = [inv0.as_mut_ptr(), inv1.as_mut_ptr()];
        unsafe {
            trtri_batched::<f64>(
                &h, Fill::Upper, Diagonal::NonUnit, n as i32, a_ptrs.as_ptr(), n as i32,
                inv_ptrs.as_ptr(), n as i32, 2,
            )
        }
        .unwrap();
        assert_eq!(&strided_inv[..n * n], &inv0[..]);
        assert_eq!(&strided_inv[n * n..], &inv1[..]);
    }

    #[test]
    fn test_complex_lower() {
        let h = handle();
        let n = 18usize;
        let mut a = vec![Complex64::new(0.0, 0.0); n * n];
        for j in 0..n {
            a[j + j * n] = Complex64::new(1.0, 1.0);
            for i in j + 1..n {
                a[i + j * n] = Complex64::new(0.0, 1.0 / (1 + i) as f64);
            }
        }
        let mut inv = vec![Complex64::new(7.0, 7.0); n * n];
        unsafe {
            trtri::<Complex64>(&h, Fill::Lower, Diagonal::NonUnit, n as i32, a.as_ptr(), n as i32, inv.as_mut_ptr(), n as i32)
        }
        .unwrap();
        for i in 0..n {
            for j in 0..n {
                let s: Complex64 = (0..n).map(|k| a[i + k * n] * inv[k + j * n]).sum();
                let want = if i == j { 1.0 } else { 0.0 };
                assert!((s - Complex64::new(want, 0.0)).norm() < 1e-12);
            }
        }
    }

    #[test]
    fn test_arg_checks_and_size_query() {
        let h = handle();
        let a = [1.0f32; 4];
        let mut inv = [0.0f32; 4];
        let s = unsafe { trtri::<f32>(&h, Fill::Full, Diagonal::Unit, 2, a.as_ptr(), 2, inv.as_mut_ptr(), 2) };
        assert_eq!(s, Err(Error::InvalidValue("uplo")));
        let s = unsafe { trtri::<f32>(&h, Fill::Upper, Diagonal::Unit, 2, a.as_ptr(), 1, inv.as_mut_ptr(), 2) };
        assert_eq!(s.unwrap_err().status(), Status::InvalidSize);
        let s = unsafe { trtri::<f32>(&h, Fill::Upper, Diagonal::Unit, 2, a.as_ptr(), 2, std::ptr::null_mut(), 2) };
        assert_eq!(s, Err(Error::InvalidPointer("invA")));
        let s = unsafe {
            trtri_batched::<f32>(&h, Fill::Upper, Diagonal::Unit, 2, std::ptr::null(), 2, std::ptr::null(), 2, 0)
        };
        assert_eq!(s, Ok(Status::Success));

        h.start_device_memory_size_query().unwrap();
        let s = unsafe { trtri::<f32>(&h, Fill::Upper, Diagonal::Unit, 16, a.as_ptr(), 16, inv.as_mut_ptr(), 16) };
        assert_eq!(s, Ok(Status::SizeUnchanged));
        let s = unsafe {
            trtri_batched::<f32>(&h, Fill::Upper, Diagonal::Unit, 17, std::ptr::null(), 17, std::ptr::null(), 17, 3)
        };
        assert_eq!(s, Ok(Status::SizeIncreased));
        // 16 * 3 * 4 = 192 bytes of temp, then 24 bytes of pointers rounded to 64
        assert_eq!(h.stop_device_memory_size_query(), Ok(192 + 64));
    }
}
