//! Operation and traffic counts, in billions, for the timing report.

use rocrus_core::Scalar;
use std::mem::size_of;

/// Flops of one multiply-add in `T`.
fn fma<T: Scalar>() -> f64 {
    if T::IS_COMPLEX {
        8.0
    } else {
        2.0
    }
}

fn gb<T>(elements: f64) -> f64 {
    elements * size_of::<T>() as f64 / 1e9
}

pub fn nrm2_gflop_count<T: Scalar>(n: i64) -> f64 {
    // |x|^2 costs 2 flops real, 4 complex; plus the accumulate
    let per = if T::IS_COMPLEX { 4.0 } else { 2.0 };
    per * n as f64 / 1e9
}

pub fn nrm2_gbyte_count<T: Scalar>(n: i64) -> f64 {
    gb::<T>(n as f64)
}

pub fn dot_gflop_count<T: Scalar>(conj: bool, n: i64) -> f64 {
    let conj_cost = if conj && T::IS_COMPLEX { 1.0 } else { 0.0 };
    (fma::<T>() + conj_cost) * n as f64 / 1e9
}

pub fn dot_gbyte_count<T: Scalar>(n: i64) -> f64 {
    gb::<T>(2.0 * n as f64)
}

pub fn spr2_gflop_count<T: Scalar>(n: i64) -> f64 {
    let n = n as f64;
    // two rank-1 updates of the packed triangle, alpha folded into x
    (2.0 * fma::<T>() * n * (n + 1.0) / 2.0 + n) / 1e9
}

pub fn spr2_gbyte_count<T: Scalar>(n: i64) -> f64 {
    let n = n as f64;
    gb::<T>(2.0 * n + n * (n + 1.0))
}

pub fn her2_gflop_count<T: Scalar>(n: i64) -> f64 {
    let n = n as f64;
    (2.0 * fma::<T>() * n * (n + 1.0) / 2.0 + 6.0 * n) / 1e9
}

pub fn her2_gbyte_count<T: Scalar>(n: i64) -> f64 {
    let n = n as f64;
    gb::<T>(2.0 * n + n * (n + 1.0))
}

pub fn hbmv_gflop_count<T: Scalar>(n: i64, k: i64) -> f64 {
    let (n, k) = (n as f64, k as f64);
    // band of width 2k+1 per row, clipped at the corners
    let band = n * (2.0 * k + 1.0) - k * (k + 1.0);
    (fma::<T>() * band + 2.0 * fma::<T>() * n) / 1e9
}

pub fn hbmv_gbyte_count<T: Scalar>(n: i64, k: i64) -> f64 {
    let (n, k) = (n as f64, k as f64);
    gb::<T>(n * (k + 1.0) - k * (k + 1.0) / 2.0 + 3.0 * n)
}

pub fn hpmv_gflop_count<T: Scalar>(n: i64) -> f64 {
    let n = n as f64;
    (fma::<T>() * n * n + 2.0 * fma::<T>() * n) / 1e9
}

pub fn hpmv_gbyte_count<T: Scalar>(n: i64) -> f64 {
    let n = n as f64;
    gb::<T>(n * (n + 1.0) / 2.0 + 3.0 * n)
}

pub fn tpsv_gflop_count<T: Scalar>(n: i64) -> f64 {
    let n = n as f64;
    fma::<T>() * n * n / 2.0 / 1e9
}

pub fn tpsv_gbyte_count<T: Scalar>(n: i64) -> f64 {
    let n = n as f64;
    gb::<T>(n * (n + 1.0) / 2.0 + 2.0 * n)
}

pub fn trtri_gflop_count<T: Scalar>(n: i64) -> f64 {
    let n = n as f64;
    fma::<T>() * n * n * n / 6.0 / 1e9
}

pub fn trtri_gbyte_count<T: Scalar>(n: i64) -> f64 {
    let n = n as f64;
    gb::<T>(n * (n + 1.0))
}

/// One host-to-device plus one device-to-host copy of the matrix.
pub fn set_get_matrix_gbyte_count(rows: i64, cols: i64, elem_size: i64) -> f64 {
    2.0 * (rows * cols * elem_size) as f64 / 1e9
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex32;

    #[test]
    fn test_counts() {
        assert_eq!(dot_gflop_count::<f32>(true, 1_000_000_000), 2.0);
        assert_eq!(dot_gflop_count::<Complex32>(true, 1_000_000_000), 9.0);
        assert_eq!(dot_gbyte_count::<f64>(125_000_000), 2.0);
        assert_eq!(set_get_matrix_gbyte_count(1000, 1000, 500), 1.0);
        // k = 0 reduces to the diagonal
        assert_eq!(
            hbmv_gflop_count::<Complex32>(10, 0),
            (8.0 * 10.0 + 16.0 * 10.0) / 1e9
        );
    }
}
