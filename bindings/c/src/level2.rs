//! Level-2 exports: `spr2`, `her2`, `hbmv`, `hpmv`, `tpsv`.

use crate::{guard, handle_ref, rocrus_handle, rocrus_stride, triangle};
use rocrus_blas::level2;
use rocrus_core::{Complex32, Complex64, Fill, Status};

/// `uplo` of a routine without `trans` or `diag`; see [`triangle`].
fn fill(raw: u32) -> Fill {
    Fill::try_from(raw).unwrap_or(Fill::Full)
}

macro_rules! spr2_exports {
    ($t:ty, $int:ty, $single:ident, $batched:ident, $strided:ident) => {
        #[no_mangle]
        pub unsafe extern "C" fn $single(
            handle: rocrus_handle,
            uplo: u32,
            n: $int,
            alpha: *const $t,
            x: *const $t,
            incx: $int,
            y: *const $t,
            incy: $int,
            ap: *mut $t,
        ) -> Status {
            guard(|| {
                let h = handle_ref(handle)?;
                level2::spr2::<$int, $t>(h, fill(uplo), n, alpha, x, incx, y, incy, ap)
            })
        }

        #[no_mangle]
        pub unsafe extern "C" fn $batched(
            handle: rocrus_handle,
            uplo: u32,
            n: $int,
            alpha: *const $t,
            x: *const *const $t,
            incx: $int,
            y: *const *const $t,
            incy: $int,
            ap: *const *mut $t,
            batch_count: $int,
        ) -> Status {
            guard(|| {
                let h = handle_ref(handle)?;
                level2::spr2_batched::<$int, $t>(
                    h, fill(uplo), n, alpha, x, incx, y, incy, ap, batch_count,
                )
            })
        }

        #[no_mangle]
        pub unsafe extern "C" fn $strided(
            handle: rocrus_handle,
            uplo: u32,
            n: $int,
            alpha: *const $t,
            x: *const $t,
            incx: $int,
            stridex: rocrus_stride,
            y: *const $t,
            incy: $int,
            stridey: rocrus_stride,
            ap: *mut $t,
            stride_ap: rocrus_stride,
            batch_count: $int,
        ) -> Status {
            guard(|| {
                let h = handle_ref(handle)?;
                level2::spr2_strided_batched::<$int, $t>(
                    h,
                    fill(uplo),
                    n,
                    alpha,
                    x,
                    incx,
                    stridex,
                    y,
                    incy,
                    stridey,
                    ap,
                    stride_ap,
                    batch_count,
                )
            })
        }
    };
}

spr2_exports!(f32, i32, rocrus_sspr2, rocrus_sspr2_batched, rocrus_sspr2_strided_batched);
spr2_exports!(f64, i32, rocrus_dspr2, rocrus_dspr2_batched, rocrus_dspr2_strided_batched);
spr2_exports!(f32, i64, rocrus_sspr2_64, rocrus_sspr2_batched_64, rocrus_sspr2_strided_batched_64);
spr2_exports!(f64, i64, rocrus_dspr2_64, rocrus_dspr2_batched_64, rocrus_dspr2_strided_batched_64);

macro_rules! her2_exports {
    ($t:ty, $int:ty, $single:ident, $batched:ident, $strided:ident) => {
        #[no_mangle]
        pub unsafe extern "C" fn $single(
            handle: rocrus_handle,
            uplo: u32,
            n: $int,
            alpha: *const $t,
            x: *const $t,
            incx: $int,
            y: *const $t,
            incy: $int,
            a: *mut $t,
            lda: $int,
        ) -> Status {
            guard(|| {
                let h = handle_ref(handle)?;
                level2::her2::<$int, $t>(h, fill(uplo), n, alpha, x, incx, y, incy, a, lda)
            })
        }

        #[no_mangle]
        pub unsafe extern "C" fn $batched(
            handle: rocrus_handle,
            uplo: u32,
            n: $int,
            alpha: *const $t,
            x: *const *const $t,
            incx: $int,
            y: *const *const $t,
            incy: $int,
            a: *const *mut $t,
            lda: $int,
            batch_count: $int,
        ) -> Status {
            guard(|| {
                let h = handle_ref(handle)?;
                level2::her2_batched::<$int, $t>(
                    h, fill(uplo), n, alpha, x, incx, y, incy, a, lda, batch_count,
                )
            })
        }

        #[no_mangle]
        pub unsafe extern "C" fn $strided(
            handle: rocrus_handle,
            uplo: u32,
            n: $int,
            alpha: *const $t,
            x: *const $t,
            incx: $int,
            stridex: rocrus_stride,
            y: *const $t,
            incy: $int,
            stridey: rocrus_stride,
            a: *mut $t,
            lda: $int,
            stride_a: rocrus_stride,
            batch_count: $int,
        ) -> Status {
            guard(|| {
                let h = handle_ref(handle)?;
                level2::her2_strided_batched::<$int, $t>(
                    h,
                    fill(uplo),
                    n,
                    alpha,
                    x,
                    incx,
                    stridex,
                    y,
                    incy,
                    stridey,
                    a,
                    lda,
                    stride_a,
                    batch_count,
                )
            })
        }
    };
}

her2_exports!(Complex32, i32, rocrus_cher2, rocrus_cher2_batched, rocrus_cher2_strided_batched);
her2_exports!(Complex64, i32, rocrus_zher2, rocrus_zher2_batched, rocrus_zher2_strided_batched);
her2_exports!(Complex32, i64, rocrus_cher2_64, rocrus_cher2_batched_64, rocrus_cher2_strided_batched_64);
her2_exports!(Complex64, i64, rocrus_zher2_64, rocrus_zher2_batched_64, rocrus_zher2_strided_batched_64);

macro_rules! hbmv_exports {
    ($t:ty, $int:ty, $single:ident, $batched:ident, $strided:ident) => {
        #[no_mangle]
        pub unsafe extern "C" fn $single(
            handle: rocrus_handle,
            uplo: u32,
            n: $int,
            k: $int,
            alpha: *const $t,
            a: *const $t,
            lda: $int,
            x: *const $t,
            incx: $int,
            beta: *const $t,
            y: *mut $t,
            incy: $int,
        ) -> Status {
            guard(|| {
                let h = handle_ref(handle)?;
                level2::hbmv::<$int, $t>(
                    h, fill(uplo), n, k, alpha, a, lda, x, incx, beta, y, incy,
                )
            })
        }

        #[no_mangle]
        pub unsafe extern "C" fn $batched(
            handle: rocrus_handle,
            uplo: u32,
            n: $int,
            k: $int,
            alpha: *const $t,
            a: *const *const $t,
            lda: $int,
            x: *const *const $t,
            incx: $int,
            beta: *const $t,
            y: *const *mut $t,
            incy: $int,
            batch_count: $int,
        ) -> Status {
            guard(|| {
                let h = handle_ref(handle)?;
                level2::hbmv_batched::<$int, $t>(
                    h,
                    fill(uplo),
                    n,
                    k,
                    alpha,
                    a,
                    lda,
                    x,
                    incx,
                    beta,
                    y,
                    incy,
                    batch_count,
                )
            })
        }

        #[no_mangle]
        pub unsafe extern "C" fn $strided(
            handle: rocrus_handle,
            uplo: u32,
            n: $int,
            k: $int,
            alpha: *const $t,
            a: *const $t,
            lda: $int,
            stride_a: rocrus_stride,
            x: *const $t,
            incx: $int,
            stridex: rocrus_stride,
            beta: *const $t,
            y: *mut $t,
            incy: $int,
            stridey: rocrus_stride,
            batch_count: $int,
        ) -> Status {
            guard(|| {
                let h = handle_ref(handle)?;
                level2::hbmv_strided_batched::<$int, $t>(
                    h,
                    fill(uplo),
                    n,
                    k,
                    alpha,
                    a,
                    lda,
                    stride_a,
                    x,
                    incx,
                    stridex,
                    beta,
                    y,
                    incy,
                    stridey,
                    batch_count,
                )
            })
        }
    };
}

hbmv_exports!(Complex32, i32, rocrus_chbmv, rocrus_chbmv_batched, rocrus_chbmv_strided_batched);
hbmv_exports!(Complex64, i32, rocrus_zhbmv, rocrus_zhbmv_batched, rocrus_zhbmv_strided_batched);
hbmv_exports!(Complex32, i64, rocrus_chbmv_64, rocrus_chbmv_batched_64, rocrus_chbmv_strided_batched_64);
hbmv_exports!(Complex64, i64, rocrus_zhbmv_64, rocrus_zhbmv_batched_64, rocrus_zhbmv_strided_batched_64);

macro_rules! hpmv_exports {
    ($t:ty, $int:ty, $single:ident, $batched:ident, $strided:ident) => {
        #[no_mangle]
        pub unsafe extern "C" fn $single(
            handle: rocrus_handle,
            uplo: u32,
            n: $int,
            alpha: *const $t,
            ap: *const $t,
            x: *const $t,
            incx: $int,
            beta: *const $t,
            y: *mut $t,
            incy: $int,
        ) -> Status {
            guard(|| {
                let h = handle_ref(handle)?;
                level2::hpmv::<$int, $t>(h, fill(uplo), n, alpha, ap, x, incx, beta, y, incy)
            })
        }

        #[no_mangle]
        pub unsafe extern "C" fn $batched(
            handle: rocrus_handle,
            uplo: u32,
            n: $int,
            alpha: *const $t,
            ap: *const *const $t,
            x: *const *const $t,
            incx: $int,
            beta: *const $t,
            y: *const *mut $t,
            incy: $int,
            batch_count: $int,
        ) -> Status {
            guard(|| {
                let h = handle_ref(handle)?;
                level2::hpmv_batched::<$int, $t>(
                    h, fill(uplo), n, alpha, ap, x, incx, beta, y, incy, batch_count,
                )
            })
        }

        #[no_mangle]
        pub unsafe extern "C" fn $strided(
            handle: rocrus_handle,
            uplo: u32,
            n: $int,
            alpha: *const $t,
            ap: *const $t,
            stride_a: rocrus_stride,
            x: *const $t,
            incx: $int,
            stridex: rocrus_stride,
            beta: *const $t,
            y: *mut $t,
            incy: $int,
            stridey: rocrus_stride,
            batch_count: $int,
        ) -> Status {
            guard(|| {
                let h = handle_ref(handle)?;
                level2::hpmv_strided_batched::<$int, $t>(
                    h,
                    fill(uplo),
                    n,
                    alpha,
                    ap,
                    stride_a,
                    x,
                    incx,
                    stridex,
                    beta,
                    y,
                    incy,
                    stridey,
                    batch_count,
                )
            })
        }
    };
}

hpmv_exports!(Complex32, i32, rocrus_chpmv, rocrus_chpmv_batched, rocrus_chpmv_strided_batched);
hpmv_exports!(Complex64, i32, rocrus_zhpmv, rocrus_zhpmv_batched, rocrus_zhpmv_strided_batched);
hpmv_exports!(Complex32, i64, rocrus_chpmv_64, rocrus_chpmv_batched_64, rocrus_chpmv_strided_batched_64);
hpmv_exports!(Complex64, i64, rocrus_zhpmv_64, rocrus_zhpmv_batched_64, rocrus_zhpmv_strided_batched_64);

macro_rules! tpsv_exports {
    ($t:ty, $int:ty, $single:ident, $batched:ident, $strided:ident) => {
        #[no_mangle]
        pub unsafe extern "C" fn $single(
            handle: rocrus_handle,
            uplo: u32,
            trans: u32,
            diag: u32,
            n: $int,
            ap: *const $t,
            x: *mut $t,
            incx: $int,
        ) -> Status {
            guard(|| {
                let h = handle_ref(handle)?;
                let (uplo, trans, diag) = triangle(uplo, trans, diag);
                level2::tpsv::<$int, $t>(h, uplo, trans, diag, n, ap, x, incx)
            })
        }

        #[no_mangle]
        pub unsafe extern "C" fn $batched(
            handle: rocrus_handle,
            uplo: u32,
            trans: u32,
            diag: u32,
            n: $int,
            ap: *const *const $t,
            x: *const *mut $t,
            incx: $int,
            batch_count: $int,
        ) -> Status {
            guard(|| {
                let h = handle_ref(handle)?;
                let (uplo, trans, diag) = triangle(uplo, trans, diag);
                level2::tpsv_batched::<$int, $t>(h, uplo, trans, diag, n, ap, x, incx, batch_count)
            })
        }

        #[no_mangle]
        pub unsafe extern "C" fn $strided(
            handle: rocrus_handle,
            uplo: u32,
            trans: u32,
            diag: u32,
            n: $int,
            ap: *const $t,
            stride_a: rocrus_stride,
            x: *mut $t,
            incx: $int,
            stridex: rocrus_stride,
            batch_count: $int,
        ) -> Status {
            guard(|| {
                let h = handle_ref(handle)?;
                let (uplo, trans, diag) = triangle(uplo, trans, diag);
                level2::tpsv_strided_batched::<$int, $t>(
                    h,
                    uplo,
                    trans,
                    diag,
                    n,
                    ap,
                    stride_a,
                    x,
                    incx,
                    stridex,
                    batch_count,
                )
            })
        }
    };
}

tpsv_exports!(f32, i32, rocrus_stpsv, rocrus_stpsv_batched, rocrus_stpsv_strided_batched);
tpsv_exports!(f64, i32, rocrus_dtpsv, rocrus_dtpsv_batched, rocrus_dtpsv_strided_batched);
tpsv_exports!(Complex32, i32, rocrus_ctpsv, rocrus_ctpsv_batched, rocrus_ctpsv_strided_batched);
tpsv_exports!(Complex64, i32, rocrus_ztpsv, rocrus_ztpsv_batched, rocrus_ztpsv_strided_batched);
tpsv_exports!(f32, i64, rocrus_stpsv_64, rocrus_stpsv_batched_64, rocrus_stpsv_strided_batched_64);
tpsv_exports!(f64, i64, rocrus_dtpsv_64, rocrus_dtpsv_batched_64, rocrus_dtpsv_strided_batched_64);
tpsv_exports!(Complex32, i64, rocrus_ctpsv_64, rocrus_ctpsv_batched_64, rocrus_ctpsv_strided_batched_64);
tpsv_exports!(Complex64, i64, rocrus_ztpsv_64, rocrus_ztpsv_batched_64, rocrus_ztpsv_strided_batched_64);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rocrus_destroy_handle;
    use crate::tests::create;

    #[test]
    fn test_enum_values_are_validated() {
        let h = create();
        let ap = [2.0f64];
        let mut x = [4.0f64];
        unsafe {
            assert_eq!(rocrus_dtpsv(h, 121, 111, 131, 1, ap.as_ptr(), x.as_mut_ptr(), 1), Status::Success);
            assert_eq!(x, [2.0]);
            assert_eq!(rocrus_dtpsv(h, 120, 111, 131, 1, ap.as_ptr(), x.as_mut_ptr(), 1), Status::InvalidValue);
            assert_eq!(rocrus_dtpsv(h, 121, 114, 131, 1, ap.as_ptr(), x.as_mut_ptr(), 1), Status::InvalidValue);
            assert_eq!(rocrus_dtpsv(h, 121, 111, 133, 1, ap.as_ptr(), x.as_mut_ptr(), 1), Status::InvalidValue);
            // Full passes conversion and is rejected by the routine
            assert_eq!(rocrus_dtpsv(h, 123, 111, 131, 1, ap.as_ptr(), x.as_mut_ptr(), 1), Status::InvalidValue);
            rocrus_destroy_handle(h);
        }
    }

    #[test]
    fn test_invalid_enums_answer_size_query_first() {
        let h = create();
        let alpha = 1.0f32;
        let x = [1.0f32];
        let mut ap = [0.0f32];
        let apd = [2.0f64];
        let mut xd = [4.0f64];
        let mut size = 0usize;
        unsafe {
            assert_eq!(crate::rocrus_start_device_memory_size_query(h), Status::Success);
            let s = rocrus_sspr2(h, 999, 1, &alpha, x.as_ptr(), 1, x.as_ptr(), 1, ap.as_mut_ptr());
            assert_eq!(s, Status::SizeUnchanged);
            let s = rocrus_dtpsv(h, 121, 114, 131, 1, apd.as_ptr(), xd.as_mut_ptr(), 1);
            assert_eq!(s, Status::SizeUnchanged);
            assert_eq!(crate::rocrus_stop_device_memory_size_query(h, &mut size), Status::Success);

            let s = rocrus_sspr2(h, 999, 1, &alpha, x.as_ptr(), 1, x.as_ptr(), 1, ap.as_mut_ptr());
            assert_eq!(s, Status::InvalidValue);
            rocrus_destroy_handle(h);
        }
        assert_eq!(size, 0);
        assert_eq!(ap, [0.0]);
        assert_eq!(xd, [4.0]);
    }

    #[test]
    fn test_sspr2_64() {
        let h = create();
        let alpha = 1.0f32;
        let x = [1.0f32, 2.0];
        let y = [1.0f32, 1.0];
        let mut ap = [0.0f32; 3];
        unsafe {
            let s = rocrus_sspr2_64(h, 121, 2, &alpha, x.as_ptr(), 1, y.as_ptr(), 1, ap.as_mut_ptr());
            assert_eq!(s, Status::Success);
            rocrus_destroy_handle(h);
        }
        // upper packed: (0,0), (0,1), (1,1)
        assert_eq!(ap, [2.0, 3.0, 4.0]);
    }
}
