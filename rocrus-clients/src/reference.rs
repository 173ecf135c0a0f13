//! Straightforward host implementations the library results are checked
//! against. Each works on one batch.

use rocrus_core::types::{packed_index, vector_index};
use rocrus_core::{Accumulate, Diagonal, Fill, Operation, RealScalar, Scalar};

#[inline]
fn at(i: i64, n: i64, inc: i64) -> usize {
    vector_index(i, n, inc) as usize
}

/// `sqrt(sum |x_i|^2)`, accumulated in `f64`.
pub fn ref_nrm2<T: Scalar>(n: i64, x: &[T], incx: i64) -> f64 {
    if n <= 0 || incx <= 0 {
        return 0.0;
    }
    (0..n)
        .map(|i| {
            let (re, im) = x[(i * incx) as usize].to_f64_parts();
            re * re + im * im
        })
        .sum::<f64>()
        .sqrt()
}

fn ref_dot_impl<T: Accumulate>(n: i64, x: &[T], incx: i64, y: &[T], incy: i64, conj: bool) -> T {
    let mut s = T::Compute::zero();
    for i in 0..n.max(0) {
        let xi = x[at(i, n, incx)].widen();
        let yi = y[at(i, n, incy)].widen();
        s += yi.mul_maybe_conj(xi, conj);
    }
    T::narrow(s)
}

/// `sum x_i * y_i`.
pub fn ref_dot<T: Accumulate>(n: i64, x: &[T], incx: i64, y: &[T], incy: i64) -> T {
    ref_dot_impl(n, x, incx, y, incy, false)
}

/// `sum conj(x_i) * y_i`.
pub fn ref_dotc<T: Accumulate>(n: i64, x: &[T], incx: i64, y: &[T], incy: i64) -> T {
    ref_dot_impl(n, x, incx, y, incy, true)
}

/// `A := alpha*x*y' + alpha*y*x' + A` on a packed symmetric matrix.
pub fn ref_spr2<T: RealScalar>(
    uplo: Fill,
    n: i64,
    alpha: T,
    x: &[T],
    incx: i64,
    y: &[T],
    incy: i64,
    ap: &mut [T],
) {
    for j in 0..n {
        let (lo, hi) = if uplo == Fill::Lower { (j, n) } else { (0, j + 1) };
        for i in lo..hi {
            let xi = x[at(i, n, incx)];
            let xj = x[at(j, n, incx)];
            let yi = y[at(i, n, incy)];
            let yj = y[at(j, n, incy)];
            ap[packed_index(uplo, n, i, j) as usize] += alpha * (xi * yj + yi * xj);
        }
    }
}

/// `A := alpha*x*y^H + conj(alpha)*y*x^H + A` on the `uplo` triangle of a
/// full Hermitian matrix. Diagonal imaginary parts are cleared.
pub fn ref_her2<T: Scalar>(
    uplo: Fill,
    n: i64,
    alpha: T,
    x: &[T],
    incx: i64,
    y: &[T],
    incy: i64,
    a: &mut [T],
    lda: i64,
) {
    for j in 0..n {
        let (lo, hi) = if uplo == Fill::Lower { (j, n) } else { (0, j + 1) };
        let xj = x[at(j, n, incx)];
        let yj = y[at(j, n, incy)];
        for i in lo..hi {
            let xi = x[at(i, n, incx)];
            let yi = y[at(i, n, incy)];
            let e = &mut a[(i + j * lda) as usize];
            *e += alpha * xi * yj.conj() + alpha.conj() * yi * xj.conj();
            if i == j {
                *e = T::from_real(e.real());
            }
        }
    }
}

/// Shared Hermitian matrix-vector update given an element accessor.
fn hermitian_mv<T: Scalar>(
    uplo: Fill,
    n: i64,
    alpha: T,
    elem: impl Fn(i64, i64) -> T,
    x: &[T],
    incx: i64,
    beta: T,
    y: &mut [T],
    incy: i64,
) {
    let full = |i: i64, j: i64| {
        let stored = if uplo == Fill::Lower { i >= j } else { i <= j };
        if i == j {
            T::from_real(elem(i, i).real())
        } else if stored {
            elem(i, j)
        } else {
            elem(j, i).conj()
        }
    };
    for i in 0..n {
        let mut s = T::zero();
        for j in 0..n {
            s += full(i, j) * x[at(j, n, incx)];
        }
        let yi = &mut y[at(i, n, incy)];
        *yi = if beta.is_zero() {
            alpha * s
        } else {
            alpha * s + beta * *yi
        };
    }
}

/// `y := alpha*A*x + beta*y` with `A` Hermitian banded, `k` off-diagonals.
pub fn ref_hbmv<T: Scalar>(
    uplo: Fill,
    n: i64,
    k: i64,
    alpha: T,
    a: &[T],
    lda: i64,
    x: &[T],
    incx: i64,
    beta: T,
    y: &mut [T],
    incy: i64,
) {
    let elem = |i: i64, j: i64| {
        let (row, inside) = match uplo {
            Fill::Lower => (i - j, i - j <= k),
            _ => (k + i - j, j - i <= k),
        };
        if inside {
            a[(row + j * lda) as usize]
        } else {
            T::zero()
        }
    };
    hermitian_mv(uplo, n, alpha, elem, x, incx, beta, y, incy);
}

/// `y := alpha*A*x + beta*y` with `A` Hermitian packed.
pub fn ref_hpmv<T: Scalar>(
    uplo: Fill,
    n: i64,
    alpha: T,
    ap: &[T],
    x: &[T],
    incx: i64,
    beta: T,
    y: &mut [T],
    incy: i64,
) {
    let elem = |i: i64, j: i64| ap[packed_index(uplo, n, i, j) as usize];
    hermitian_mv(uplo, n, alpha, elem, x, incx, beta, y, incy);
}

/// Solves `op(A)*x = b` in place with `A` packed triangular.
pub fn ref_tpsv<T: Scalar>(
    uplo: Fill,
    trans: Operation,
    diag: Diagonal,
    n: i64,
    ap: &[T],
    x: &mut [T],
    incx: i64,
) {
    let conj = trans == Operation::ConjugateTranspose;
    let a = |i: i64, j: i64| {
        let v = ap[packed_index(uplo, n, i, j) as usize];
        if conj {
            v.conj()
        } else {
            v
        }
    };
    // op(A)(i, j) for (i, j) in the effective triangle
    let op = |i: i64, j: i64| if trans == Operation::None { a(i, j) } else { a(j, i) };
    let lower = (uplo == Fill::Lower) == (trans == Operation::None);
    let order: Box<dyn Iterator<Item = i64>> = if lower {
        Box::new(0..n)
    } else {
        Box::new((0..n).rev())
    };
    for i in order {
        let mut s = x[at(i, n, incx)];
        let js: Box<dyn Iterator<Item = i64>> = if lower {
            Box::new(0..i)
        } else {
            Box::new(i + 1..n)
        };
        for j in js {
            s -= op(i, j) * x[at(j, n, incx)];
        }
        if diag == Diagonal::NonUnit {
            s = s / op(i, i);
        }
        x[at(i, n, incx)] = s;
    }
}

/// Inverse of the `uplo` triangle of `a`, written to that triangle of
/// `inv`; the other triangle of `inv` is left untouched.
pub fn ref_trtri<T: Scalar>(
    uplo: Fill,
    diag: Diagonal,
    n: i64,
    a: &[T],
    lda: i64,
    inv: &mut [T],
    ldinv: i64,
) {
    let unit = diag == Diagonal::Unit;
    let ga = |i: i64, j: i64| a[(i + j * lda) as usize];
    let d = |i: i64| if unit { T::one() } else { ga(i, i) };
    for j in 0..n {
        let mut col = vec![T::zero(); n as usize];
        col[j as usize] = T::one() / d(j);
        if uplo == Fill::Lower {
            for i in j + 1..n {
                let mut s = T::zero();
                for k in j..i {
                    s += ga(i, k) * col[k as usize];
                }
                col[i as usize] = -s / d(i);
            }
        } else {
            for i in (0..j).rev() {
                let mut s = T::zero();
                for k in i + 1..=j {
                    s += ga(i, k) * col[k as usize];
                }
                col[i as usize] = -s / d(i);
            }
        }
        let (lo, hi) = if uplo == Fill::Lower { (j, n) } else { (0, j + 1) };
        for i in lo..hi {
            inv[(i + j * ldinv) as usize] = col[i as usize];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex64;

    #[test]
    fn test_dot_variants() {
        let x = [Complex64::new(1.0, 1.0), Complex64::new(0.0, 2.0)];
        let y = [Complex64::new(2.0, 0.0), Complex64::new(1.0, 0.0)];
        assert_eq!(ref_dot(2, &x, 1, &y, 1), Complex64::new(2.0, 4.0));
        assert_eq!(ref_dotc(2, &x, 1, &y, 1), Complex64::new(2.0, -4.0));
        // negative increment reverses y
        assert_eq!(ref_dot(2, &[1.0f64, 2.0], 1, &[3.0, 4.0], -1), 1.0 * 4.0 + 2.0 * 3.0);
    }

    #[test]
    fn test_nrm2_ignores_bad_incx() {
        assert_eq!(ref_nrm2(2, &[3.0f32, 4.0], 1), 5.0);
        assert_eq!(ref_nrm2(2, &[3.0f32, 4.0], 0), 0.0);
    }

    #[test]
    fn test_tpsv_undoes_multiply() {
        // upper packed [[2, 1], [0, 4]] -> [2, 1, 4]
        let ap = [2.0f64, 1.0, 4.0];
        let mut x = [4.0f64, 8.0];
        ref_tpsv(Fill::Upper, Operation::None, Diagonal::NonUnit, 2, &ap, &mut x, 1);
        assert_eq!(x, [1.0, 2.0]);
        let mut x = [2.0f64, 9.0];
        ref_tpsv(Fill::Upper, Operation::Transpose, Diagonal::NonUnit, 2, &ap, &mut x, 1);
        assert_eq!(x, [1.0, 2.0]);
    }

    #[test]
    fn test_trtri_lower() {
        let a = [2.0f64, 1.0, 0.0, 4.0];
        let mut inv = [9.0f64; 4];
        ref_trtri(Fill::Lower, Diagonal::NonUnit, 2, &a, 2, &mut inv, 2);
        assert_eq!(inv, [0.5, -0.125, 9.0, 0.25]);
    }

    #[test]
    fn test_spr2_and_hpmv() {
        let mut ap = [0.0f64; 3];
        ref_spr2(Fill::Upper, 2, 1.0, &[1.0, 2.0], 1, &[1.0, 1.0], 1, &mut ap);
        // A = x*y' + y*x' = [[2, 3], [3, 4]]
        assert_eq!(ap, [2.0, 3.0, 4.0]);
        let mut y = [1.0f64, 1.0];
        ref_hpmv(Fill::Upper, 2, 1.0, &ap, &[1.0, 0.0], 1, 2.0, &mut y, 1);
        assert_eq!(y, [4.0, 5.0]);
    }
}
