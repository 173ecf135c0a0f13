//! Seeded test data and structured matrix generators.
//!
//! Random values are small integers so sums of products stay exact in
//! single precision at harness sizes.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rocrus_core::types::{packed_index, packed_len};
use rocrus_core::{Fill, Scalar};

/// Whether a NaN scalar argument poisons the buffer being initialised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NanInit {
    Never,
    /// Fill with NaN when alpha is NaN.
    AlphaSetsNan,
    /// Fill with NaN when beta is NaN.
    BetaSetsNan,
}

pub fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Integer in `[1, 10]`, in both parts for complex types.
pub fn random_value<T: Scalar>(rng: &mut StdRng) -> T {
    let re = rng.gen_range(1..=10) as f64;
    let im = if T::IS_COMPLEX {
        rng.gen_range(1..=10) as f64
    } else {
        0.0
    };
    T::from_parts(re, im)
}

/// Fills `n` elements at increment `inc` of `v`, or poisons them with NaN.
pub fn init_vector<T: Scalar>(
    rng: &mut StdRng,
    v: &mut [T],
    n: i64,
    inc: i64,
    nan: NanInit,
    alpha_is_nan: bool,
    beta_is_nan: bool,
) {
    let poison = match nan {
        NanInit::Never => false,
        NanInit::AlphaSetsNan => alpha_is_nan,
        NanInit::BetaSetsNan => beta_is_nan,
    };
    let step = inc.unsigned_abs().max(1) as usize;
    for i in 0..n.max(0) as usize {
        v[i * step] = if poison {
            T::from_parts(f64::NAN, f64::NAN)
        } else {
            random_value(rng)
        };
    }
}

/// Random `rows x cols` matrix with leading dimension `ld`.
pub fn init_matrix<T: Scalar>(rng: &mut StdRng, a: &mut [T], rows: i64, cols: i64, ld: i64) {
    for j in 0..cols as usize {
        for i in 0..rows as usize {
            a[i + j * ld as usize] = random_value(rng);
        }
    }
}

/// Mirrors the upper triangle into the lower one.
pub fn make_symmetric<T: Scalar>(a: &mut [T], n: i64, ld: i64) {
    let (n, ld) = (n as usize, ld as usize);
    for j in 0..n {
        for i in j + 1..n {
            a[i + j * ld] = a[j + i * ld];
        }
    }
}

/// Mirrors the conjugated upper triangle into the lower one and makes the
/// diagonal real.
pub fn make_hermitian<T: Scalar>(a: &mut [T], n: i64, ld: i64) {
    let (n, ld) = (n as usize, ld as usize);
    for j in 0..n {
        a[j + j * ld] = T::from_real(a[j + j * ld].real());
        for i in j + 1..n {
            a[i + j * ld] = a[j + i * ld].conj();
        }
    }
}

/// Keeps the `uplo` triangle, scaled so the matrix is well conditioned:
/// off-diagonal entries are divided by `n * 10` and the diagonal is kept
/// at its random value in `[1, 10]`. The other triangle is zeroed.
pub fn make_triangular<T: Scalar>(uplo: Fill, a: &mut [T], n: i64, ld: i64) {
    let (n, ld) = (n as usize, ld as usize);
    let scale = T::from_f64(1.0 / (10 * n.max(1)) as f64);
    for j in 0..n {
        for i in 0..n {
            let inside = if uplo == Fill::Lower { i >= j } else { i <= j };
            let e = &mut a[i + j * ld];
            if !inside {
                *e = T::zero();
            } else if i != j {
                *e = *e * scale;
            }
        }
    }
}

/// Packs the `uplo` triangle of `a` column by column.
pub fn regular_to_packed<T: Scalar>(uplo: Fill, a: &[T], ap: &mut [T], n: i64, ld: i64) {
    debug_assert!(ap.len() >= packed_len(n) as usize);
    for j in 0..n {
        for i in 0..n {
            let inside = if uplo == Fill::Lower { i >= j } else { i <= j };
            if inside {
                ap[packed_index(uplo, n, i, j) as usize] = a[(i + j * ld) as usize];
            }
        }
    }
}

/// Band storage of the `uplo` triangle with `k` super/sub-diagonals:
/// upper element `(i, j)` lands in row `k + i - j`, lower in row `i - j`.
pub fn regular_to_banded<T: Scalar>(
    uplo: Fill,
    a: &[T],
    lda: i64,
    ab: &mut [T],
    ldab: i64,
    n: i64,
    k: i64,
) {
    for j in 0..n {
        for i in 0..n {
            let row = match uplo {
                Fill::Lower if i >= j && i - j <= k => i - j,
                Fill::Upper if i <= j && j - i <= k => k + i - j,
                _ => continue,
            };
            ab[(row + j * ldab) as usize] = a[(i + j * lda) as usize];
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex32;

    #[test]
    fn test_same_seed_same_data() {
        let mut a = vec![0.0f32; 6];
        let mut b = vec![0.0f32; 6];
        init_vector(&mut seeded_rng(1), &mut a, 3, 2, NanInit::Never, false, false);
        init_vector(&mut seeded_rng(1), &mut b, 3, -2, NanInit::Never, false, false);
        assert_eq!(a, b);
        assert!(a.iter().step_by(2).all(|v| (1.0..=10.0).contains(v) && v.fract() == 0.0));
        assert!(a.iter().skip(1).step_by(2).all(|&v| v == 0.0));
    }

    #[test]
    fn test_nan_poisoning() {
        let mut y = vec![0.0f64; 3];
        init_vector(&mut seeded_rng(2), &mut y, 3, 1, NanInit::BetaSetsNan, true, true);
        assert!(y.iter().all(|v| v.is_nan()));
        init_vector(&mut seeded_rng(2), &mut y, 3, 1, NanInit::BetaSetsNan, true, false);
        assert!(y.iter().all(|v| !v.is_nan()));
    }

    #[test]
    fn test_hermitian_and_packing() {
        let mut rng = seeded_rng(3);
        let mut a = vec![Complex32::new(0.0, 0.0); 9];
        init_matrix(&mut rng, &mut a, 3, 3, 3);
        make_hermitian(&mut a, 3, 3);
        assert_eq!(a[1], a[3].conj());
        assert_eq!(a[4].im, 0.0);
        let mut ap = vec![Complex32::new(0.0, 0.0); 6];
        regular_to_packed(Fill::Lower, &a, &mut ap, 3, 3);
        assert_eq!(&ap[..3], &a[..3]);
        assert_eq!(ap[5], a[8]);
    }

    #[test]
    fn test_banded_layout() {
        // 3 x 3 upper with k = 1: rows (k + i - j)
        let a: Vec<f64> = (0..9).map(f64::from).collect();
        let mut ab = vec![-1.0; 6];
        regular_to_banded(Fill::Upper, &a, 3, &mut ab, 2, 3, 1);
        assert_eq!(ab, vec![-1.0, 0.0, 3.0, 4.0, 7.0, 8.0]);
    }

    proptest::proptest! {
        #[test]
        fn hermitian_packing_keeps_the_stored_triangle(
            n in 1i64..24,
            lower in proptest::bool::ANY,
            seed in 0u64..1000,
        ) {
            let uplo = if lower { Fill::Lower } else { Fill::Upper };
            let mut a = vec![Complex32::new(0.0, 0.0); (n * n) as usize];
            init_matrix(&mut seeded_rng(seed), &mut a, n, n, n);
            make_hermitian(&mut a, n, n);
            let mut ap = vec![Complex32::new(0.0, 0.0); packed_len(n) as usize];
            regular_to_packed(uplo, &a, &mut ap, n, n);
            for j in 0..n {
                for i in 0..n {
                    let stored = if lower { i >= j } else { i <= j };
                    if stored {
                        let k = packed_index(uplo, n, i, j) as usize;
                        proptest::prop_assert_eq!(ap[k], a[(i + j * n) as usize]);
                    }
                    proptest::prop_assert_eq!(a[(i + j * n) as usize], a[(j + i * n) as usize].conj());
                }
            }
        }
    }
}
